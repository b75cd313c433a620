use ethers::contract::abigen;

// `createPool` takes its parameters as a struct; the field order and widths
// must match the deployed factory exactly.
abigen!(
    GammaPoolFactory,
    r#"[
        struct CreatePoolParams { address cfmm; uint24 protocolId; address[] tokens; }
        function owner() external view returns (address)
        function feeTo() external view returns (address)
        function addProtocol(address implementation) external
        function removeProtocol(uint24 protocolId) external
        function getProtocol(uint24 protocolId) external view returns (address)
        function isProtocolRestricted(uint24 protocolId) external view returns (bool)
        function createPool(CreatePoolParams params) external returns (address pool)
        function getPool(bytes32 key) external view returns (address)
        function allPoolsLength() external view returns (uint256)
        event PoolCreated(address indexed pool, address indexed cfmm, uint24 indexed protocolId, address implementation, uint256 count)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

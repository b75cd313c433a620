use ethers::contract::abigen;

// The parameter structs are part of the position manager's ABI and must keep
// their field order and widths.
abigen!(
    PositionManager,
    r#"[
        struct DepositReservesParams { address cfmm; uint256[] amountsDesired; uint256[] amountsMin; address to; uint24 protocolId; uint256 deadline; }
        struct WithdrawReservesParams { address cfmm; uint256 amount; uint256[] amountsMin; address to; uint24 protocolId; uint256 deadline; }
        struct DepositWithdrawParams { address cfmm; uint256 lpTokens; address to; uint24 protocolId; uint256 deadline; }
        function factory() external view returns (address)
        function WETH() external view returns (address)
        function depositReserves(DepositReservesParams params) external returns (uint256[] reserves, uint256 shares)
        function withdrawReserves(WithdrawReservesParams params) external returns (uint256[] reserves, uint256 assets)
        function depositNoPull(DepositWithdrawParams params) external returns (uint256 shares)
        function withdrawNoPull(DepositWithdrawParams params) external returns (uint256 assets)
        event DepositReserve(address indexed pool, uint256 reservesLen, uint256 shares)
        event WithdrawReserve(address indexed pool, uint256 reservesLen, uint256 assets)
        event DepositNoPull(address indexed pool, uint256 shares)
        event WithdrawNoPull(address indexed pool, uint256 assets)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

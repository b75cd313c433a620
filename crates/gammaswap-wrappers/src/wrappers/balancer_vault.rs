use ethers::contract::abigen;

abigen!(
    BalancerVault,
    r#"[
        function getPool(bytes32 poolId) external view returns (address pool, uint8 specialization)
        function getPoolTokens(bytes32 poolId) external view returns (address[] tokens, uint256[] balances, uint256 lastChangeBlock)
    ]"#,
);

use ethers::contract::abigen;

abigen!(
    WeightedPool,
    r#"[
        function getVault() external view returns (address)
        function getPoolId() external view returns (bytes32)
        function getNormalizedWeights() external view returns (uint256[])
        function getSwapFeePercentage() external view returns (uint256)
        function decimals() external view returns (uint8)
    ]"#,
);

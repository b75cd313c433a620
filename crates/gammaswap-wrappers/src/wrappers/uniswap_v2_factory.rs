use ethers::contract::abigen;

abigen!(
    UniswapV2Factory,
    r#"[
        function feeToSetter() external view returns (address)
        function getPair(address tokenA, address tokenB) external view returns (address pair)
        function allPairsLength() external view returns (uint256)
        function createPair(address tokenA, address tokenB) external returns (address pair)
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 count)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

use ethers::contract::abigen;

abigen!(
    UniswapV2Pair,
    r#"[
        function factory() external view returns (address)
        function token0() external view returns (address)
        function token1() external view returns (address)
        function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        function totalSupply() external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
        function transfer(address to, uint256 amount) external returns (bool)
        function mint(address to) external returns (uint256 liquidity)
        function sync() external
        event Mint(address indexed sender, uint256 amount0, uint256 amount1)
        event Sync(uint112 reserve0, uint112 reserve1)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

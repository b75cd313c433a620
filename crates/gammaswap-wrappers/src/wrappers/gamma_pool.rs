use ethers::contract::abigen;

abigen!(
    GammaPool,
    r#"[
        function cfmm() external view returns (address)
        function protocolId() external view returns (uint24)
        function factory() external view returns (address)
        function tokens() external view returns (address[])
        function getPoolBalances() external view returns (uint256[] tokenBalances, uint256 lpTokenBalance, uint256 lpTokenBorrowed, uint256 lpTokenBorrowedPlusInterest, uint256 borrowedInvariant, uint256 lpInvariant)
        function totalSupply() external view returns (uint256)
        function balanceOf(address account) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
        function transfer(address to, uint256 amount) external returns (bool)
    ]"#,
    event_derives(serde::Deserialize, serde::Serialize)
);

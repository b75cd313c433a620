pub mod balancer_vault;
pub mod erc20;
pub mod gamma_pool;
pub mod gamma_pool_factory;
pub mod position_manager;
pub mod uniswap_v2_factory;
pub mod uniswap_v2_pair;
pub mod weighted_pool;

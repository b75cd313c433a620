use ethers::types::{H256, U256};
use eyre::Result;
use gammaswap_create2::{minimal_proxy_init_code_hash, pair_address, pool_address, TokenPair};
use gammaswap_validation::{CfmmProtocol, CfmmValidator, RpcReader, ValidationError};
use gammaswap_wrappers::wrappers::{
    gamma_pool::GammaPool, gamma_pool_factory::GammaPoolFactory,
    uniswap_v2_factory::UniswapV2Factory,
};
use test_utils::chain::{DeployConfig, TestChain};

// These tests need compiled GammaSwap and Uniswap V2 artifacts under
// `GAMMASWAP_ARTIFACTS_DIR`.

#[ignore]
#[tokio::test]
async fn test_full_deploy() -> Result<()> {
    let _ = tracing_subscriber::fmt::try_init();

    let config = DeployConfig::default();
    let chain = TestChain::deploy(1, config.clone()).await?;
    let client = chain.client(chain.owner().clone()).await?;
    let addresses = chain.addresses();

    // Three tokens give three pairs, each with a pool.
    assert_eq!(addresses.tokens.len(), 3);
    assert_eq!(addresses.cfmms.len(), 3);
    assert_eq!(addresses.pools.len(), 3);

    let cfmm_factory = UniswapV2Factory::new(addresses.cfmm_factory, client.clone());
    assert_eq!(cfmm_factory.all_pairs_length().call().await?, U256::from(3));

    let pool_factory = GammaPoolFactory::new(addresses.pool_factory, client.clone());
    assert_eq!(
        pool_factory.get_protocol(config.protocol_id).call().await?,
        addresses.pool_implementation
    );
    for record in &addresses.pools {
        assert_eq!(pool_factory.get_pool(record.key.0).call().await?, record.pool);
        let pool = GammaPool::new(record.pool, client.clone());
        assert_eq!(pool.cfmm().call().await?, record.cfmm);
        assert_eq!(pool.protocol_id().call().await?, config.protocol_id);
    }

    Ok(())
}

#[ignore]
#[tokio::test]
async fn test_addresses_round_trip() -> Result<()> {
    let config = DeployConfig::default();
    let chain = TestChain::deploy(1, config.clone()).await?;
    let addresses = chain.addresses();

    for (i, token_a) in addresses.tokens.iter().enumerate() {
        for token_b in &addresses.tokens[i + 1..] {
            let pair = TokenPair::new(*token_a, *token_b)?;
            let cfmm = pair_address(
                addresses.cfmm_factory,
                &pair,
                addresses.cfmm_init_code_hash,
            );
            assert!(addresses.cfmms.contains(&cfmm));
        }
    }

    let pool_init_code_hash = config
        .pool_init_code_hash
        .unwrap_or_else(|| minimal_proxy_init_code_hash(addresses.pool_implementation));
    for record in &addresses.pools {
        assert_eq!(
            pool_address(
                addresses.pool_factory,
                record.cfmm,
                record.protocol_id,
                pool_init_code_hash
            )?,
            record.pool
        );
    }

    Ok(())
}

#[ignore]
#[tokio::test]
async fn test_validate_deployed_pairs() -> Result<()> {
    let config = DeployConfig::default();
    let chain = TestChain::deploy(1, config.clone()).await?;
    let client = chain.client(chain.owner().clone()).await?;
    let addresses = chain.addresses();
    let [token_a, token_b, token_c] = [
        addresses.tokens[0],
        addresses.tokens[1],
        addresses.tokens[2],
    ];
    let cfmm = pair_address(
        addresses.cfmm_factory,
        &TokenPair::new(token_a, token_b)?,
        addresses.cfmm_init_code_hash,
    );

    // The deployed pair validates and its tokens come back ordered.
    let protocol = CfmmProtocol::new(
        config.protocol_id,
        addresses.cfmm_factory,
        addresses.cfmm_init_code_hash,
    );
    let validator = CfmmValidator::new(RpcReader::new(client.clone()), protocol.clone());
    let validated = validator.validate(&[token_b, token_a], cfmm).await?;
    assert!(validated.tokens.token0() < validated.tokens.token1());
    assert_eq!(validated.decimals, [18, 18]);

    // The wrong token set is rejected.
    assert_eq!(
        validator.validate(&[token_a, token_c], cfmm).await,
        Err(ValidationError::BadProtocol(cfmm))
    );

    // So is the right pair under a different init code hash.
    let mut wrong_hash = addresses.cfmm_init_code_hash;
    wrong_hash.0[31] ^= 1;
    let validator = CfmmValidator::new(
        RpcReader::new(client),
        CfmmProtocol {
            init_code_hash: wrong_hash,
            ..protocol
        },
    );
    assert_ne!(wrong_hash, H256::zero());
    assert_eq!(
        validator.validate(&[token_a, token_b], cfmm).await,
        Err(ValidationError::BadProtocol(cfmm))
    );

    Ok(())
}

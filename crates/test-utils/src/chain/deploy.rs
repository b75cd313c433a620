/// This module contains implementations on the `Chain` struct that make it easy
/// to deploy the AMM, the GammaSwap protocol and pools on top of it.
use std::{collections::BTreeMap, sync::Arc, time::Duration};

use ethers::{
    contract::ContractFactory,
    providers::Middleware,
    signers::Signer,
    types::{Address, H256, U256},
};
use eyre::{eyre, Result};
use gammaswap_addresses::Addresses;
use gammaswap_create2::{minimal_proxy_init_code_hash, pool_address, TokenPair};
use gammaswap_validation::{CfmmProtocol, CfmmValidator, RpcReader};
use gammaswap_wrappers::wrappers::{erc20::ERC20, gamma_pool_factory::GammaPoolFactory};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::time::timeout;
use tracing::{error, info, warn};

use super::{
    artifacts::ArtifactStore,
    plan::{
        token_label, DeploymentPlan, CFMM_FACTORY, LIQUIDATION_STRATEGY, LONG_STRATEGY,
        POOL_FACTORY, POOL_IMPLEMENTATION, POSITION_MANAGER, SHORT_STRATEGY,
    },
    tx::{ensure_success, revert_reason, send_and_confirm},
    Chain,
};
use crate::agent::Agent;

fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let dec_string: String = Deserialize::deserialize(deserializer)?;
    let u256 = U256::from_dec_str(&dec_string).map_err(serde::de::Error::custom)?;
    Ok(u256)
}

fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

/// A configuration for a deployment that specifies the test tokens, the
/// strategy parameters of the protocol and the amounts used to exercise each
/// pool after it's created.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    // token configuration
    pub token_names: Vec<String>,
    pub token_symbols: Vec<String>,
    #[serde(deserialize_with = "deserialize_u256")]
    pub token_mint_amount: U256,
    // cfmm configuration
    pub cfmm_init_code_hash: Option<H256>,
    #[serde(deserialize_with = "deserialize_u256")]
    pub seed_amount: U256,
    // protocol configuration
    pub protocol_id: u32,
    pub pool_init_code_hash: Option<H256>,
    pub origination_fee: u16,
    pub trading_fee1: u16,
    pub trading_fee2: u16,
    pub liquidation_fee: u16,
    #[serde(deserialize_with = "deserialize_u256")]
    pub base_rate: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub factor: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub max_apy: U256,
    pub weth: Address,
    // pool exercise configuration
    #[serde(deserialize_with = "deserialize_u256")]
    pub reserves_deposit: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub lp_deposit: U256,
    pub continue_on_lp_deposit_failure: bool,
    // transaction configuration
    pub deadline_secs: u64,
    pub receipt_timeout_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            // token configuration
            token_names: vec!["Token A".into(), "Token B".into(), "Token C".into()],
            token_symbols: vec!["TKA".into(), "TKB".into(), "TKC".into()],
            token_mint_amount: ether(1_000_000),
            // cfmm configuration
            cfmm_init_code_hash: None,
            seed_amount: ether(1_000),
            // protocol configuration
            protocol_id: 1,
            pool_init_code_hash: None,
            origination_fee: 2,
            trading_fee1: 997,
            trading_fee2: 1000,
            liquidation_fee: 250,
            base_rate: U256::exp10(16),
            factor: U256::from(4) * U256::exp10(17),
            max_apy: U256::from(75) * U256::exp10(16),
            weth: Address::zero(),
            // pool exercise configuration
            reserves_deposit: ether(100),
            lp_deposit: ether(10),
            continue_on_lp_deposit_failure: true,
            // transaction configuration
            deadline_secs: 60 * 60,
            receipt_timeout_secs: 120,
        }
    }
}

impl DeployConfig {
    pub const ENV_PREFIX: &'static str = "GAMMASWAP_";

    /// Loads the configuration from `GAMMASWAP_` prefixed environment
    /// variables. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let config = envy::prefixed(Self::ENV_PREFIX).from_env::<Self>()?;
        config.check()?;
        Ok(config)
    }

    pub fn from_vars<I: IntoIterator<Item = (String, String)>>(vars: I) -> Result<Self> {
        let config = envy::prefixed(Self::ENV_PREFIX).from_iter::<_, Self>(vars)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        if self.token_names.len() != self.token_symbols.len() {
            return Err(eyre!(
                "got {} token names but {} token symbols",
                self.token_names.len(),
                self.token_symbols.len()
            ));
        }
        if self.token_symbols.len() < 2 {
            return Err(eyre!("at least two tokens are needed to create a pair"));
        }
        if self.protocol_id == 0 || self.protocol_id > gammaswap_create2::MAX_PROTOCOL_ID {
            return Err(eyre!("protocol id {} is out of range", self.protocol_id));
        }
        Ok(())
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }

    /// Every combination of two distinct configured tokens.
    pub fn token_pairs(tokens: &[Address]) -> Result<Vec<TokenPair>> {
        let mut pairs = Vec::new();
        for (i, token_a) in tokens.iter().enumerate() {
            for token_b in &tokens[i + 1..] {
                pairs.push(TokenPair::new(*token_a, *token_b)?);
            }
        }
        Ok(pairs)
    }
}

/// The addresses deployed by a plan, keyed by step label.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeployedContracts(BTreeMap<String, Address>);

impl DeployedContracts {
    pub fn get(&self, label: &str) -> Result<Address> {
        self.0
            .get(label)
            .copied()
            .ok_or_else(|| eyre!("nothing was deployed for {}", label))
    }
}

/// Deploys each step of the plan in order, waiting for every deployment to
/// be mined before starting the next.
pub async fn execute_plan<M: Middleware + 'static>(
    client: Arc<M>,
    artifacts: &ArtifactStore,
    plan: &DeploymentPlan,
    wait: Duration,
) -> Result<DeployedContracts> {
    let mut outputs = BTreeMap::new();
    for step in plan.steps() {
        let artifact = artifacts.load(&step.contract)?;
        let args = DeploymentPlan::resolve(step, &outputs)?;
        let deployer = ContractFactory::new(artifact.abi, artifact.bytecode, client.clone())
            .deploy_tokens(args)
            .map_err(|e| eyre!("couldn't encode the constructor of {}: {}", step.contract, e))?;
        let (contract, receipt) = timeout(wait, deployer.send_with_receipt())
            .await
            .map_err(|_| eyre!("deploying {} timed out after {:?}", step.label, wait))?
            .map_err(|e| eyre!("deploying {} reverted: {}", step.label, revert_reason(&e)))?;
        ensure_success(&step.label, &receipt)?;
        let code = client
            .get_code(contract.address(), None)
            .await
            .map_err(|e| eyre!("couldn't read the code of {}: {}", step.label, e))?;
        if code.is_empty() {
            error!(step = %step.label, address = ?contract.address(), "deployment left no code");
            return Err(eyre!(
                "deploying {} left no code at {:?}",
                step.label,
                contract.address()
            ));
        }
        info!(
            step = %step.label,
            contract = %step.contract,
            address = ?contract.address(),
            gas_used = ?receipt.gas_used,
            "deployed contract"
        );
        outputs.insert(step.label.clone(), contract.address());
    }
    Ok(DeployedContracts(outputs))
}

impl Chain {
    /// Deploys the AMM and the GammaSwap protocol, creates a pool for every
    /// pair of test tokens and exercises each pool's deposit and withdrawal
    /// paths.
    pub async fn full_deploy<S: Signer + 'static>(
        &self,
        signer: S,
        config: DeployConfig,
        artifacts: &ArtifactStore,
    ) -> Result<Addresses> {
        config.check()?;

        // Set up a client.
        let owner = signer.address();
        let client = self.client(signer).await?;
        let wait = config.receipt_timeout();
        let agent = Agent::new(client.clone(), owner, config.deadline_secs, wait);

        // Deploy the test tokens and the AMM factory, then mint the tokens
        // that seed the pairs.
        let amm = execute_plan(
            client.clone(),
            artifacts,
            &DeploymentPlan::amm(&config, owner)?,
            wait,
        )
        .await?;
        let tokens = (0..config.token_symbols.len())
            .map(|i| amm.get(&token_label(i)))
            .collect::<Result<Vec<_>>>()?;
        for token in &tokens {
            send_and_confirm(
                "mint tokens",
                ERC20::new(*token, client.clone()).mint(owner, config.token_mint_amount),
                wait,
            )
            .await?;
        }
        let cfmm_factory = amm.get(CFMM_FACTORY)?;
        let cfmm_init_code_hash = match config.cfmm_init_code_hash {
            Some(hash) => hash,
            None => artifacts.load("UniswapV2Pair")?.init_code_hash(),
        };
        info!(?cfmm_factory, ?cfmm_init_code_hash, "deployed amm");

        // Create and seed a pair for every combination of tokens. The pairs
        // are validated against the factory before anything is built on top
        // of them, which catches a wrong init code hash early.
        let validator = CfmmValidator::new(
            RpcReader::new(client.clone()),
            CfmmProtocol::new(config.protocol_id, cfmm_factory, cfmm_init_code_hash),
        );
        let pairs = DeployConfig::token_pairs(&tokens)?;
        let mut cfmms = Vec::with_capacity(pairs.len());
        for pair in &pairs {
            let cfmm = agent.create_pair(cfmm_factory, pair).await?;
            validator.validate(&pair.to_vec(), cfmm).await?;
            agent
                .seed_reserves(cfmm, pair, [config.seed_amount, config.seed_amount])
                .await?;
            cfmms.push(cfmm);
        }

        // Deploy the protocol and register the pool implementation with the
        // pool factory.
        let protocol = execute_plan(
            client.clone(),
            artifacts,
            &DeploymentPlan::protocol(&config, owner, cfmm_factory, cfmm_init_code_hash)?,
            wait,
        )
        .await?;
        let pool_factory = protocol.get(POOL_FACTORY)?;
        let pool_implementation = protocol.get(POOL_IMPLEMENTATION)?;
        send_and_confirm(
            "add protocol",
            GammaPoolFactory::new(pool_factory, client.clone()).add_protocol(pool_implementation),
            wait,
        )
        .await?;
        let position_manager = execute_plan(
            client.clone(),
            artifacts,
            &DeploymentPlan::position_manager(&config, pool_factory)?,
            wait,
        )
        .await?
        .get(POSITION_MANAGER)?;

        // Create a pool for every pair and run it through the position
        // manager.
        let pool_init_code_hash = config
            .pool_init_code_hash
            .unwrap_or_else(|| minimal_proxy_init_code_hash(pool_implementation));
        let mut pools = Vec::with_capacity(cfmms.len());
        for (cfmm, pair) in cfmms.iter().zip(&pairs) {
            let record = agent
                .create_pool(pool_factory, config.protocol_id, *cfmm, pair)
                .await?;
            let expected = pool_address(pool_factory, *cfmm, config.protocol_id, pool_init_code_hash)?;
            if expected != record.pool {
                warn!(
                    cfmm = ?cfmm,
                    pool = ?record.pool,
                    ?expected,
                    "created pool doesn't match its derived address"
                );
            }

            let shares = agent
                .deposit_reserves(
                    position_manager,
                    *cfmm,
                    pair,
                    config.protocol_id,
                    [config.reserves_deposit, config.reserves_deposit],
                )
                .await?;
            agent
                .withdraw_reserves(
                    position_manager,
                    record.pool,
                    *cfmm,
                    config.protocol_id,
                    shares / U256::from(2),
                )
                .await?;

            match agent
                .deposit_lp_tokens(
                    position_manager,
                    record.pool,
                    *cfmm,
                    config.protocol_id,
                    config.lp_deposit,
                )
                .await
            {
                Ok(shares) => {
                    agent
                        .withdraw_lp_tokens(
                            position_manager,
                            record.pool,
                            *cfmm,
                            config.protocol_id,
                            shares,
                        )
                        .await?;
                }
                Err(error) if config.continue_on_lp_deposit_failure => {
                    warn!(cfmm = ?cfmm, %error, "lp token deposit failed; continuing");
                }
                Err(error) => return Err(error),
            }

            pools.push(record);
        }

        Ok(Addresses {
            tokens,
            cfmm_factory,
            cfmm_init_code_hash,
            cfmms,
            pool_factory,
            long_strategy: protocol.get(LONG_STRATEGY)?,
            short_strategy: protocol.get(SHORT_STRATEGY)?,
            liquidation_strategy: protocol.get(LIQUIDATION_STRATEGY)?,
            pool_implementation,
            position_manager,
            pools,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;
    use crate::chain::TestChain;

    #[test]
    fn test_config_from_json() -> Result<()> {
        let config: DeployConfig = serde_json::from_str(
            r#"{
                "token_symbols": ["WETH", "USDC"],
                "token_names": ["Wrapped Ether", "USD Coin"],
                "seed_amount": "5000000000000000000",
                "protocol_id": 2,
                "continue_on_lp_deposit_failure": false
            }"#,
        )?;
        config.check()?;
        assert_eq!(config.token_symbols, vec!["WETH", "USDC"]);
        assert_eq!(config.seed_amount, U256::from(5) * U256::exp10(18));
        assert_eq!(config.protocol_id, 2);
        assert!(!config.continue_on_lp_deposit_failure);
        // Everything else keeps its default.
        assert_eq!(config.receipt_timeout_secs, 120);
        assert_eq!(config.cfmm_init_code_hash, None);
        Ok(())
    }

    #[test]
    fn test_config_from_vars() -> Result<()> {
        let config = DeployConfig::from_vars(vec![
            ("GAMMASWAP_PROTOCOL_ID".to_string(), "3".to_string()),
            ("GAMMASWAP_TOKEN_NAMES".to_string(), "A,B".to_string()),
            ("GAMMASWAP_TOKEN_SYMBOLS".to_string(), "AAA,BBB".to_string()),
            ("GAMMASWAP_LP_DEPOSIT".to_string(), "42".to_string()),
            (
                "GAMMASWAP_CFMM_INIT_CODE_HASH".to_string(),
                "0x96e8ac4277198ff8b6f785478aa9a39f403cb768dd02cbee326c3e7da348845f".to_string(),
            ),
            ("GAMMASWAP_ETHEREUM_URL".to_string(), "http://localhost:8545".to_string()),
            ("UNRELATED".to_string(), "ignored".to_string()),
        ])?;
        assert_eq!(config.protocol_id, 3);
        assert_eq!(config.token_symbols, vec!["AAA", "BBB"]);
        assert_eq!(config.lp_deposit, U256::from(42));
        assert_eq!(
            config.cfmm_init_code_hash,
            Some(gammaswap_create2::UNISWAP_V2_INIT_CODE_HASH)
        );
        Ok(())
    }

    #[test]
    fn test_config_check() {
        let mut config = DeployConfig::default();
        assert!(config.check().is_ok());

        config.token_names.pop();
        assert!(config.check().is_err());

        let config = DeployConfig {
            token_names: vec!["A".into()],
            token_symbols: vec!["A".into()],
            ..Default::default()
        };
        assert!(config.check().is_err());

        let config = DeployConfig {
            protocol_id: 1 << 24,
            ..Default::default()
        };
        assert!(config.check().is_err());
    }

    #[test]
    fn test_token_pairs_covers_every_combination() -> Result<()> {
        let tokens = (1..=4).map(Address::from_low_u64_be).collect::<Vec<_>>();
        let pairs = DeployConfig::token_pairs(&tokens)?;
        assert_eq!(pairs.len(), 6);
        assert!(pairs.iter().all(|pair| pair.token0() < pair.token1()));
        Ok(())
    }

    /// Writes artifacts with raw creation code. `Stub` leaves a single
    /// `INVALID` opcode behind, `Hollow` stops without returning code and
    /// `Reverting` reverts in its constructor.
    fn raw_artifacts(tag: &str) -> Result<ArtifactStore> {
        let root = env::temp_dir().join(format!("gammaswap-raw-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&root)?;
        for (name, bytecode) in [
            ("Stub", "0x60fe60005360016000f3"),
            ("Hollow", "0x00"),
            ("Reverting", "0x60006000fd"),
        ] {
            fs::write(
                root.join(format!("{}.json", name)),
                format!(r#"{{"abi":[],"bytecode":"{}"}}"#, bytecode),
            )?;
        }
        Ok(ArtifactStore::new(root))
    }

    #[tokio::test]
    async fn test_execute_plan_rejects_deployments_without_code() -> Result<()> {
        let test_chain = TestChain::connect(1).await?;
        let client = test_chain.client(test_chain.owner().clone()).await?;
        let artifacts = raw_artifacts("code")?;
        let wait = Duration::from_secs(30);

        let mut plan = DeploymentPlan::default();
        plan.push("stub", "Stub", vec![])?;
        let deployed = execute_plan(client.clone(), &artifacts, &plan, wait).await?;
        let stub = deployed.get("stub")?;
        assert_eq!(client.get_code(stub, None).await?.to_vec(), vec![0xfe]);

        plan.push("hollow", "Hollow", vec![])?;
        let error = execute_plan(client.clone(), &artifacts, &plan, wait)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("hollow left no code"), "{}", error);

        let mut plan = DeploymentPlan::default();
        plan.push("reverting", "Reverting", vec![])?;
        let error = execute_plan(client, &artifacts, &plan, wait)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("reverting"), "{}", error);

        Ok(())
    }
}

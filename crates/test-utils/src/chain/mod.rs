mod artifacts;
mod deploy;
mod plan;
mod test_chain;
mod tx;

use std::{sync::Arc, time::Duration};

pub use artifacts::{Artifact, ArtifactStore};
use async_trait::async_trait;
pub use deploy::{execute_plan, DeployConfig, DeployedContracts};
use ethers::{
    core::utils::Anvil,
    middleware::{
        gas_escalator::{Frequency, GeometricGasPrice},
        nonce_manager::NonceManagerError,
        GasEscalatorMiddleware, MiddlewareError, NonceManagerMiddleware, SignerMiddleware,
    },
    providers::{
        Http, HttpClientError, HttpRateLimitRetryPolicy, Middleware, PendingTransaction, Provider,
        RetryClient, RetryClientBuilder, RetryPolicy,
    },
    signers::Signer,
    types::{transaction::eip2718::TypedTransaction, Address, BlockId, U256},
    utils::AnvilInstance,
};
use eyre::{eyre, Result};
pub use plan::{DeploymentPlan, PlanError, Step, StepArg};
pub use test_chain::{TestChain, MNEMONIC};
use tracing::info;
pub use tx::{decode_revert_reason, ensure_success, find_event, revert_reason, send_and_confirm};

/// Retries rate limit errors and timeouts, plus "intrinsic gas too high"
/// which public testnet nodes return transiently while the gas escalator
/// catches up.
#[derive(Debug, Default)]
struct ChainRetryPolicy(HttpRateLimitRetryPolicy);

impl RetryPolicy<HttpClientError> for ChainRetryPolicy {
    fn should_retry(&self, error: &HttpClientError) -> bool {
        self.0.should_retry(error) || error.to_string().contains("intrinsic gas too high")
    }

    fn backoff_hint(&self, error: &HttpClientError) -> Option<Duration> {
        self.0.backoff_hint(error).or_else(|| {
            error
                .to_string()
                .contains("intrinsic gas too high")
                .then(|| Duration::from_millis(1))
        })
    }
}

/// Transport settings for [`ChainClient`].
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub rate_limit_retries: u32,
    pub timeout_retries: u32,
    pub initial_backoff: Duration,
    pub poll_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            rate_limit_retries: 10,
            timeout_retries: 3,
            initial_backoff: Duration::from_millis(100),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl ClientOptions {
    /// Local nodes mine instantly, so poll aggressively.
    pub fn local() -> Self {
        Self {
            initial_backoff: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        }
    }
}

type ChainClientProvider = Arc<RetryClient<Http>>;

type ChainClientInner<S> =
    NonceManagerMiddleware<SignerMiddleware<GasEscalatorMiddleware<Provider<ChainClientProvider>>, S>>;

/// A signing client whose provider stack retries transient transport errors,
/// escalates gas prices of stuck transactions and manages nonces locally.
#[derive(Debug)]
pub struct ChainClient<S: Signer + 'static> {
    inner: ChainClientInner<S>,
    address: Address,
}

impl<S: Signer + 'static> ChainClient<S> {
    pub async fn new(provider: Provider<Http>, signer: S, options: &ClientOptions) -> Result<Self> {
        let provider = RetryClientBuilder::default()
            .rate_limit_retries(options.rate_limit_retries)
            .timeout_retries(options.timeout_retries)
            .initial_backoff(options.initial_backoff)
            .build(
                provider.as_ref().clone(),
                Box::<ChainRetryPolicy>::default(),
            );
        let provider = Provider::new(Arc::new(provider)).interval(options.poll_interval);

        let inner = GasEscalatorMiddleware::new(
            provider,
            GeometricGasPrice::new(1.125, 10u64, None::<u64>),
            Frequency::PerBlock,
        );
        let inner = SignerMiddleware::new_with_provider_chain(inner, signer).await?;
        let address = inner.address();
        let inner = NonceManagerMiddleware::new(inner, address);

        Ok(Self { inner, address })
    }

    /// The address transactions are sent from.
    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl<S: Signer + 'static> Middleware for ChainClient<S> {
    // NOTE: This is a pass-through middleware, so the error is the one from
    // the top of the stack.
    type Error = NonceManagerError<Self::Inner>;

    type Provider = ChainClientProvider;
    type Inner = ChainClientInner<S>;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn send_transaction<T: Into<TypedTransaction> + Send + Sync>(
        &self,
        tx: T,
        block: Option<BlockId>,
    ) -> Result<PendingTransaction<'_, Self::Provider>, Self::Error> {
        Ok(self
            .inner
            .send_transaction(tx, block)
            .await
            .map_err(MiddlewareError::from_err)?)
    }
}

/// A connection to an Ethereum node. Connecting without an RPC URL spawns a
/// local anvil node that lives as long as the `Chain`.
pub struct Chain {
    provider: Provider<Http>,
    client_version: String,
    options: ClientOptions,
    _maybe_anvil: Option<AnvilInstance>,
}

impl Chain {
    pub async fn connect(maybe_rpc_url: Option<String>) -> Result<Self> {
        match maybe_rpc_url {
            Some(rpc_url) => Self::connect_with(rpc_url, ClientOptions::default(), None).await,
            None => {
                let anvil = Anvil::new().spawn();
                Self::connect_with(anvil.endpoint(), ClientOptions::local(), Some(anvil)).await
            }
        }
    }

    async fn connect_with(
        rpc_url: String,
        options: ClientOptions,
        maybe_anvil: Option<AnvilInstance>,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url.as_str())?.interval(options.poll_interval);
        let client_version = provider.client_version().await?;
        let chain_id = provider.get_chainid().await?;
        info!(%client_version, %chain_id, "connected to chain");
        Ok(Self {
            provider,
            client_version,
            options,
            _maybe_anvil: maybe_anvil,
        })
    }

    /// A provider that can access the chain.
    pub fn provider(&self) -> Provider<Http> {
        self.provider.clone()
    }

    /// A signing client that can access the chain.
    pub async fn client<S: Signer + 'static>(&self, signer: S) -> Result<Arc<ChainClient<S>>> {
        Ok(Arc::new(
            ChainClient::new(self.provider(), signer, &self.options).await?,
        ))
    }

    /// Adds ether to an address. This only works on anvil chains.
    pub async fn deal<U: Into<U256>>(&self, address: Address, amount: U) -> Result<()> {
        if !self.is_anvil() {
            return Err(eyre!("can't deal ether on a non-anvil chain"));
        }
        let balance = self.provider.get_balance(address, None).await?;
        self.provider
            .request::<(Address, U256), ()>("anvil_setBalance", (address, balance + amount.into()))
            .await?;
        Ok(())
    }

    /// Checks to see if the underlying chain is an anvil chain.
    pub fn is_anvil(&self) -> bool {
        self.client_version.contains("anvil")
    }
}

use ethers::{
    providers::Middleware,
    types::{Address, Bytes, TransactionRequest, H256, U64},
};
use eyre::{eyre, Result};
use gammaswap_create2::{calc_address, checksum, init_code_hash};
use rand::{thread_rng, Rng};
use test_utils::{chain::TestChain, constants::FUZZ_RUNS};

/// The deterministic deployment proxy anvil ships with. It deploys
/// `calldata[32..]` with CREATE2 using `calldata[..32]` as the salt.
const CREATE2_DEPLOYER: &str = "0x4e59b44847b379578588920cA78FbF26c0B4956C";

/// Returns the trailing `INVALID` opcode as the runtime code.
const INIT_CODE: [u8; 13] = [
    0x60, 0x01, 0x60, 0x0c, 0x60, 0x00, 0x39, 0x60, 0x01, 0x60, 0x00, 0xf3, 0xfe,
];

#[tokio::test]
async fn test_derived_addresses_match_create2_deployments() -> Result<()> {
    let chain = TestChain::connect(1).await?;
    let client = chain.client(chain.owner().clone()).await?;
    let deployer = CREATE2_DEPLOYER.parse::<Address>()?;
    if client.get_code(deployer, None).await?.is_empty() {
        return Err(eyre!(
            "no deterministic deployment proxy at {}",
            CREATE2_DEPLOYER
        ));
    }

    let hash = init_code_hash(&INIT_CODE);
    let mut rng = thread_rng();
    for _ in 0..*FUZZ_RUNS {
        let salt = H256::from(rng.gen::<[u8; 32]>());
        let expected = calc_address(deployer, salt, hash);
        assert!(client.get_code(expected, None).await?.is_empty());

        let tx = TransactionRequest::new()
            .to(deployer)
            .data([salt.as_bytes(), &INIT_CODE[..]].concat());
        let receipt = client
            .send_transaction(tx, None)
            .await?
            .await?
            .ok_or_else(|| eyre!("the deployment was dropped"))?;
        assert_eq!(receipt.status, Some(U64::one()));
        assert_eq!(
            client.get_code(expected, None).await?,
            Bytes::from(vec![0xfe]),
            "nothing deployed at {}",
            checksum(expected)
        );
    }

    Ok(())
}

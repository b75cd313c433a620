use std::env;

lazy_static! {
    // The Ethereum URL the tests should connect to. If None, then the tests
    // will spawn an anvil node.
    pub static ref MAYBE_ETHEREUM_URL: Option<String> = env::var("GAMMASWAP_ETHEREUM_URL").ok();

    // The directory holding the compiled contract artifacts.
    pub static ref ARTIFACTS_DIR: String = env::var("GAMMASWAP_ARTIFACTS_DIR").unwrap_or_else(|_| "./artifacts".to_string());

    // The amount of fuzz runs that chain fuzz tests will use. Pure fuzz tests
    // run their own, larger loops.
    pub static ref FUZZ_RUNS: u64 = env::var("GAMMASWAP_FUZZ_RUNS").ok().and_then(|s| s.parse().ok()).unwrap_or(10);
}

mod create2_tests;
mod deploy_tests;

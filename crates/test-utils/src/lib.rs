#[macro_use]
extern crate lazy_static;

pub mod agent;
pub mod chain;
pub mod constants;
pub mod infra;

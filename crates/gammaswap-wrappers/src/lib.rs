//! Typed bindings for the contracts the deployment scripts and validators
//! talk to. Bytecode isn't embedded; deployments load it from compiled
//! artifacts at runtime.

pub mod wrappers;

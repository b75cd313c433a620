//! Counterfactual address derivation for CFMM pairs and GammaSwap pools.
//!
//! Everything here is pure: no chain access, no hidden state.

mod constants;
mod derive;
mod error;
mod pair;
mod salt;

pub use constants::*;
pub use derive::*;
pub use error::{Create2Error, Result};
pub use pair::*;
pub use salt::*;

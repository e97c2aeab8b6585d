//! # API Route Modules
//!
//! - `ping`: the protected liveness route behind the bearer-token filter.

pub mod ping;

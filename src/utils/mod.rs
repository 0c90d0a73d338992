//! Helper functions shared by the models
//!
//! - `random`: charset-driven random strings over an injected RNG
//! - `crypto`: one-way digests used for password storage

pub mod crypto;
pub mod random;

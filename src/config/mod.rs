//! Configuration loading and merging
//!
//! Loads config files, environment variables and flags into one store with
//! fixed precedence (flag > env > file > caller default), then binds the
//! result onto a typed object.

pub mod engine;
pub mod materialize;
pub mod normalize;
pub mod store;

pub use engine::{FlagDefaults, MergeEngine};
pub use normalize::normalize;
pub use store::KeyStore;

/// Name of the string-list flag that carries config file paths.
pub const CONFIG_FLAG: &str = "config";

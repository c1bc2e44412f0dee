//! Value sources (files, environment, flags)
//!
//! Each source is a capability the engine is handed, so callers and tests
//! can swap in their own without touching the merge logic.

pub mod clap_flags;
pub mod env;
pub mod file;
pub mod flags;

pub use clap_flags::{config_arg, ClapFlags};
pub use env::{EnvProvider, ProcessEnv, StaticEnv};
pub use file::{FileFormat, Format};
pub use flags::{FlagEntry, FlagError, FlagSet, FlagSource, FlagValue};

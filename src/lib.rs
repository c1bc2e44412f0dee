//! layercfg: merge config files, environment variables and flags into one
//! typed configuration.
//!
//! Values are loaded, in order, from
//! - the config files named by the `config` flag, in the order given,
//! - environment variables starting with the engine's prefix,
//! - flags.
//!
//! When several sources provide the same key the last one wins, so flags
//! beat environment variables, which beat files. Anything no source
//! provides keeps the value the target held before the load.
//!
//! Keys are matched against serde field names. With prefix `APP_` and
//! delimiter `.`, the field `nested.val` is filled by
//!
//! ```text
//! $ cat app.yaml
//! nested:
//!   val: 7
//! $ export APP_NESTED_VAL=7
//! $ prog --nested.val=7
//! ```
//!
//! Environment names always use `_` between levels; the engine lower-cases
//! them and swaps `_` for the delimiter.

pub mod cli;
pub mod config;
pub mod error;
pub mod sources;

pub use config::{FlagDefaults, KeyStore, MergeEngine, CONFIG_FLAG};
pub use config::materialize::MaterializeError;
pub use error::{LoadError, Phase};
pub use sources::{
    config_arg, ClapFlags, EnvProvider, FileFormat, FlagEntry, FlagError, FlagSet, FlagSource, FlagValue,
    Format, ProcessEnv, StaticEnv,
};

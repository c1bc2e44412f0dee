//! The merge-precedence engine

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use super::materialize::materialize;
use super::normalize::{fold_key, normalize, strip_prefix_ignore_case};
use super::store::KeyStore;
use super::CONFIG_FLAG;
use crate::error::LoadError;
use crate::sources::{EnvProvider, FileFormat, FlagSource, FlagValue, Format, ProcessEnv};

/// How flags that were not passed, but carry a default, are overlaid.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum FlagDefaults {
    /// Defaults overwrite file and environment values like explicit flags do.
    ///
    /// Boolean clap flags always carry a `false` default, so they replace
    /// any file or environment value unless passed.
    #[default]
    Override,
    /// Defaults only fill keys no file or environment variable provided.
    FillMissing,
}

/// Loads configuration from files, environment variables and flags.
///
/// Sources are applied in the order file < environment < flag; a later
/// source replaces scalar values from an earlier one and nested maps are
/// merged key by key.
///
/// ```no_run
/// use layercfg::{FlagSet, MergeEngine};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct Nested {
///     val: i32,
/// }
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct Config {
///     value: i32,
///     nested: Nested,
/// }
///
/// let engine = MergeEngine::new("APP_", ".")?;
/// let flags = FlagSet::new().define_list("config");
/// let mut cfg = Config::default();
/// engine.load(&flags, &mut cfg)?;
/// # Ok::<(), layercfg::LoadError>(())
/// ```
#[derive(Clone)]
pub struct MergeEngine {
    prefix: String,
    delimiter: char,
    format: Arc<dyn FileFormat>,
    flag_defaults: FlagDefaults,
}

impl fmt::Debug for MergeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeEngine")
            .field("prefix", &self.prefix)
            .field("delimiter", &self.delimiter)
            .field("format", &self.format.name())
            .field("flag_defaults", &self.flag_defaults)
            .finish()
    }
}

impl MergeEngine {
    /// Create an engine filtering environment variables on `prefix` and
    /// joining nested keys with `delimiter`.
    ///
    /// `delimiter` must be exactly one character.
    pub fn new(prefix: impl Into<String>, delimiter: &str) -> Result<Self, LoadError> {
        let mut chars = delimiter.chars();
        let delimiter = match (chars.next(), chars.next()) {
            (Some(c), None) => c,
            _ => return Err(LoadError::InvalidDelimiter(delimiter.to_string())),
        };
        Ok(Self {
            prefix: prefix.into(),
            delimiter,
            format: Arc::new(Format::default()),
            flag_defaults: FlagDefaults::default(),
        })
    }

    /// Decode config files with `format` instead of YAML.
    pub fn with_format(mut self, format: impl FileFormat + 'static) -> Self {
        self.format = Arc::new(format);
        self
    }

    pub fn with_flag_defaults(mut self, policy: FlagDefaults) -> Self {
        self.flag_defaults = policy;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Normalize an environment variable name into a store key.
    pub fn normalize(&self, raw: &str) -> String {
        normalize(&self.prefix, self.delimiter, raw)
    }

    /// Load `target` from the files named by the `config` flag, the process
    /// environment and `flags`.
    ///
    /// On error `target` must be considered invalid.
    pub fn load<T>(&self, flags: &dyn FlagSource, target: &mut T) -> Result<(), LoadError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.load_with_env(flags, &ProcessEnv, target)
    }

    /// Like [`MergeEngine::load`], reading variables from `env`.
    pub fn load_with_env<T>(
        &self,
        flags: &dyn FlagSource,
        env: &dyn EnvProvider,
        target: &mut T,
    ) -> Result<(), LoadError>
    where
        T: Serialize + DeserializeOwned,
    {
        let store = self.merge(flags, env)?;
        materialize(store.into_value(), target, self.delimiter)?;
        Ok(())
    }

    /// Run the file, environment and flag phases and return the merged store.
    pub fn merge(&self, flags: &dyn FlagSource, env: &dyn EnvProvider) -> Result<KeyStore, LoadError> {
        let mut store = KeyStore::new(self.delimiter);
        self.load_files(flags, &mut store)?;
        self.load_env(env, &mut store);
        let before_flags = (self.flag_defaults == FlagDefaults::FillMissing).then(|| store.clone());
        self.load_flags(flags, &mut store, before_flags.as_ref())?;
        tracing::debug!("Merged {} configuration keys", store.keys().len());
        Ok(store)
    }

    fn load_files(&self, flags: &dyn FlagSource, store: &mut KeyStore) -> Result<(), LoadError> {
        let lookup = flags
            .lookup(CONFIG_FLAG)
            .map_err(|e| LoadError::FlagRead { name: e.name, message: e.message })?;
        let paths = match lookup {
            None => {
                tracing::debug!("No `{}` flag defined; skipping config files", CONFIG_FLAG);
                return Ok(());
            }
            Some(FlagValue::List(paths)) => paths,
            Some(other) => {
                return Err(LoadError::OptionType { name: CONFIG_FLAG.to_string(), found: other.kind() })
            }
        };

        for path in paths.into_iter().map(PathBuf::from) {
            let content = fs::read_to_string(&path)
                .map_err(|source| LoadError::FileRead { path: path.clone(), source })?;
            let decode_err = |source| LoadError::FileDecode { path: path.clone(), format: self.format.name(), source };
            match self.format.parse(&content).map_err(decode_err)? {
                Value::Null => tracing::debug!("Config file {} is empty", path.display()),
                Value::Object(tree) => {
                    tracing::debug!("Loaded {} keys from {}", tree.len(), path.display());
                    store.merge(tree);
                }
                other => {
                    return Err(decode_err(
                        format!("expected a mapping at the top level, found {}", json_kind(&other)).into(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn load_env(&self, env: &dyn EnvProvider, store: &mut KeyStore) {
        let mut eligible = 0usize;
        for (name, value) in env.vars() {
            let Some(rest) = strip_prefix_ignore_case(&self.prefix, &name) else {
                continue;
            };
            if rest.is_empty() {
                continue;
            }
            let key = fold_key(self.delimiter, rest);
            tracing::trace!("Environment {} -> {}", name, key);
            store.set(&key, Value::String(value));
            eligible += 1;
        }
        tracing::debug!("Loaded {} environment variables with prefix {:?}", eligible, self.prefix);
    }

    /// `before_flags` is the store as files and environment left it; when set,
    /// defaulted flags never replace a key it already holds.
    fn load_flags(
        &self,
        flags: &dyn FlagSource,
        store: &mut KeyStore,
        before_flags: Option<&KeyStore>,
    ) -> Result<(), LoadError> {
        let entries = flags.flags().map_err(|e| LoadError::FlagRead { name: e.name, message: e.message })?;
        let mut written = 0usize;
        for entry in entries {
            if entry.name == CONFIG_FLAG {
                continue;
            }
            if !entry.explicit && before_flags.is_some_and(|before| before.contains(&entry.name)) {
                tracing::trace!("Keeping existing value for defaulted flag {}", entry.name);
                continue;
            }
            store.set(&entry.name, entry.value.into_value());
            written += 1;
        }
        tracing::debug!("Applied {} flags", written);
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

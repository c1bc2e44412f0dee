//! Environment snapshots

use std::collections::BTreeMap;

/// Supplies the environment variables visible to a load.
pub trait EnvProvider {
    /// All `(name, value)` pairs, sorted by name.
    ///
    /// Names that fold to the same key (`APP_PORT`, `app_port`) are applied
    /// in this order, so the last one wins.
    fn vars(&self) -> Vec<(String, String)>;
}

/// The real process environment.
///
/// Entries that are not valid UTF-8 are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn vars(&self) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
                (Ok(name), Ok(value)) => Some((name, value)),
                (name, _) => {
                    tracing::debug!("Skipping non UTF-8 environment entry {:?}", name);
                    None
                }
            })
            .collect();
        vars.sort();
        vars
    }
}

/// A fixed set of variables, independent of the process environment.
#[derive(Debug, Default, Clone)]
pub struct StaticEnv {
    vars: BTreeMap<String, String>,
}

impl StaticEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl EnvProvider for StaticEnv {
    fn vars(&self) -> Vec<(String, String)> {
        self.vars.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_env_lists_its_vars() {
        let env: StaticEnv = [("B", "2"), ("A", "1")].into_iter().collect();
        let expected = vec![("A".to_string(), "1".to_string()), ("B".to_string(), "2".to_string())];
        assert_eq!(env.vars(), expected);
    }

    #[test]
    fn process_env_sees_path_like_vars() {
        // Every test runner exports at least one variable.
        assert!(!ProcessEnv.vars().is_empty());
    }

    #[test]
    fn process_env_is_sorted_by_name() {
        let vars = ProcessEnv.vars();
        assert!(vars.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}

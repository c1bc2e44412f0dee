//! Flag sources
//!
//! [`FlagSource`] is what the engine needs from a flag parser: the flags that
//! currently hold a value, and a typed lookup of a single option. [`FlagSet`]
//! is an in-memory implementation; [`ClapFlags`](super::ClapFlags) adapts clap.

use serde_json::{Number, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// A flag's current value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl FlagValue {
    /// Name of the value's type, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            FlagValue::Bool(_) => "bool",
            FlagValue::Int(_) => "int",
            FlagValue::Float(_) => "float",
            FlagValue::Str(_) => "string",
            FlagValue::List(_) => "string list",
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            FlagValue::Bool(b) => Value::Bool(b),
            FlagValue::Int(i) => Value::Number(i.into()),
            FlagValue::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
            FlagValue::Str(s) => Value::String(s),
            FlagValue::List(items) => Value::Array(items.into_iter().map(Value::String).collect()),
        }
    }

    fn same_kind(&self, other: &FlagValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        FlagValue::Bool(b)
    }
}

impl From<i64> for FlagValue {
    fn from(i: i64) -> Self {
        FlagValue::Int(i)
    }
}

impl From<f64> for FlagValue {
    fn from(f: f64) -> Self {
        FlagValue::Float(f)
    }
}

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        FlagValue::Str(s.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(s: String) -> Self {
        FlagValue::Str(s)
    }
}

impl From<Vec<String>> for FlagValue {
    fn from(items: Vec<String>) -> Self {
        FlagValue::List(items)
    }
}

/// One flag holding a value.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagEntry {
    pub name: String,
    pub value: FlagValue,
    /// `true` when the value came from the command line rather than a default.
    pub explicit: bool,
}

/// A flag parser reported something the engine cannot use.
#[derive(Debug, Error)]
#[error("flag `{name}`: {message}")]
pub struct FlagError {
    pub name: String,
    pub message: String,
}

impl FlagError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), message: message.into() }
    }
}

/// What the merge engine needs from a flag parser.
pub trait FlagSource {
    /// Every flag that was set or carries a default.
    fn flags(&self) -> Result<Vec<FlagEntry>, FlagError>;

    /// The value of a defined flag, or `None` when no flag named `name` exists.
    ///
    /// A defined flag that holds no value yet still reports its type, with an
    /// empty value (`List(vec![])`, `Str("")`, ...).
    fn lookup(&self, name: &str) -> Result<Option<FlagValue>, FlagError>;
}

#[derive(Debug, Clone)]
struct Slot {
    default: FlagValue,
    value: Option<FlagValue>,
}

/// In-memory flag set.
///
/// Flags are defined with a default that fixes their type; [`FlagSet::set`]
/// records a value as if it had been passed on the command line.
#[derive(Debug, Default, Clone)]
pub struct FlagSet {
    flags: BTreeMap<String, Slot>,
}

impl FlagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` with a default value.
    pub fn define(mut self, name: impl Into<String>, default: impl Into<FlagValue>) -> Self {
        self.flags.insert(name.into(), Slot { default: default.into(), value: None });
        self
    }

    /// Define an empty string-list flag.
    pub fn define_list(self, name: impl Into<String>) -> Self {
        self.define(name, FlagValue::List(Vec::new()))
    }

    /// Set a defined flag. The value must have the type of the default.
    ///
    /// String-list flags append, splitting `Str` values on commas.
    pub fn set(&mut self, name: &str, value: impl Into<FlagValue>) -> Result<(), FlagError> {
        let value = value.into();
        let slot = self
            .flags
            .get_mut(name)
            .ok_or_else(|| FlagError::new(name, "flag provided but not defined"))?;

        if let FlagValue::List(_) = slot.default {
            let items: Vec<String> = match value {
                FlagValue::List(items) => items,
                FlagValue::Str(s) => s.split(',').map(str::to_string).collect(),
                other => {
                    return Err(FlagError::new(name, format!("expected string list, got {}", other.kind())))
                }
            };
            match slot.value.get_or_insert_with(|| FlagValue::List(Vec::new())) {
                FlagValue::List(existing) => existing.extend(items),
                _ => unreachable!("list flags only hold lists"),
            }
            return Ok(());
        }

        if !slot.default.same_kind(&value) {
            return Err(FlagError::new(
                name,
                format!("expected {}, got {}", slot.default.kind(), value.kind()),
            ));
        }
        slot.value = Some(value);
        Ok(())
    }

    /// Whether `name` was set explicitly.
    pub fn is_set(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(|slot| slot.value.is_some())
    }
}

impl FlagSource for FlagSet {
    fn flags(&self) -> Result<Vec<FlagEntry>, FlagError> {
        Ok(self
            .flags
            .iter()
            .map(|(name, slot)| FlagEntry {
                name: name.clone(),
                value: slot.value.clone().unwrap_or_else(|| slot.default.clone()),
                explicit: slot.value.is_some(),
            })
            .collect())
    }

    fn lookup(&self, name: &str) -> Result<Option<FlagValue>, FlagError> {
        Ok(self.flags.get(name).map(|slot| slot.value.clone().unwrap_or_else(|| slot.default.clone())))
    }
}

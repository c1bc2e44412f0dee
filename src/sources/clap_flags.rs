//! clap adapter

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use super::flags::{FlagEntry, FlagError, FlagSource, FlagValue};
use crate::config::CONFIG_FLAG;

/// The reserved `--config` argument: repeatable and comma-separated.
pub fn config_arg() -> Arg {
    Arg::new(CONFIG_FLAG)
        .long(CONFIG_FLAG)
        .value_name("FILE")
        .action(ArgAction::Append)
        .value_delimiter(',')
        .help("Configuration file to load (repeatable, comma-separated)")
}

/// How an argument's values map onto a [`FlagValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Count,
    Str,
    List,
}

fn kind_of(arg: &Arg) -> Option<Kind> {
    match arg.get_action() {
        ArgAction::SetTrue | ArgAction::SetFalse => Some(Kind::Bool),
        ArgAction::Count => Some(Kind::Count),
        ArgAction::Append => Some(Kind::List),
        ArgAction::Set => {
            let multiple = arg.get_num_args().is_some_and(|range| range.max_values() > 1)
                || arg.get_value_delimiter().is_some();
            Some(if multiple { Kind::List } else { Kind::Str })
        }
        _ => None,
    }
}

/// Exposes parsed clap arguments as a [`FlagSource`].
///
/// Argument ids are used as flag names, so `Arg::new("nested.val")` fills the
/// `nested.val` key.
///
/// clap gives every `SetTrue`/`SetFalse` and `Count` argument an implicit
/// default, so those flags always hold a value. Under the default
/// [`FlagDefaults::Override`](crate::FlagDefaults::Override) an unset `--debug`
/// writes `false` over `APP_DEBUG=true`; use
/// [`FlagDefaults::FillMissing`](crate::FlagDefaults::FillMissing) to let files
/// and the environment win over defaults.
pub struct ClapFlags<'a> {
    command: &'a Command,
    matches: &'a ArgMatches,
}

impl<'a> ClapFlags<'a> {
    pub fn new(command: &'a Command, matches: &'a ArgMatches) -> Self {
        Self { command, matches }
    }

    fn read(&self, id: &str, kind: Kind) -> Result<FlagValue, FlagError> {
        let err = |e: clap::parser::MatchesError| FlagError::new(id, e.to_string());
        match kind {
            Kind::Bool => {
                let value = self.matches.try_get_one::<bool>(id).map_err(err)?;
                Ok(FlagValue::Bool(value.copied().unwrap_or(false)))
            }
            Kind::Count => {
                let value = self.matches.try_get_one::<u8>(id).map_err(err)?;
                Ok(FlagValue::Int(value.copied().map(i64::from).unwrap_or(0)))
            }
            Kind::Str | Kind::List => {
                let mut values = Vec::new();
                if let Some(raw) = self.matches.try_get_raw(id).map_err(err)? {
                    for value in raw {
                        let value = value
                            .to_str()
                            .ok_or_else(|| FlagError::new(id, format!("value {value:?} is not valid UTF-8")))?;
                        values.push(value.to_string());
                    }
                }
                if kind == Kind::List {
                    Ok(FlagValue::List(values))
                } else {
                    Ok(FlagValue::Str(values.pop().unwrap_or_default()))
                }
            }
        }
    }
}

impl FlagSource for ClapFlags<'_> {
    fn flags(&self) -> Result<Vec<FlagEntry>, FlagError> {
        let mut entries = Vec::new();
        for arg in self.command.get_arguments() {
            let Some(kind) = kind_of(arg) else {
                continue;
            };
            let id = arg.get_id().as_str();
            let explicit = match self.matches.value_source(id) {
                None => continue,
                Some(ValueSource::DefaultValue) => false,
                Some(_) => true,
            };
            entries.push(FlagEntry { name: id.to_string(), value: self.read(id, kind)?, explicit });
        }
        Ok(entries)
    }

    fn lookup(&self, name: &str) -> Result<Option<FlagValue>, FlagError> {
        let Some(arg) = self.command.get_arguments().find(|arg| arg.get_id() == name) else {
            return Ok(None);
        };
        let kind = kind_of(arg).ok_or_else(|| FlagError::new(name, "argument does not hold a value"))?;
        self.read(name, kind).map(Some)
    }
}

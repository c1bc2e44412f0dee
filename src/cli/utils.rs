//! Shared CLI utilities.

use crate::config::CONFIG_FLAG;

/// Parse a `KEY=VALUE` pair. The value may be empty and may contain `=`.
///
/// The reserved `config` key is rejected; config files go through `--config`.
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected KEY=VALUE, got {s:?}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in {s:?}"));
    }
    if key == CONFIG_FLAG {
        return Err(format!("`{CONFIG_FLAG}` is reserved, use --{CONFIG_FLAG} to load files"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_assignment;

    #[test]
    fn splits_on_first_equals() {
        assert_eq!(parse_assignment("a.b=x=y"), Ok(("a.b".to_string(), "x=y".to_string())));
        assert_eq!(parse_assignment("a="), Ok(("a".to_string(), String::new())));
    }

    #[test]
    fn rejects_missing_key_or_equals() {
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=value").is_err());
    }

    #[test]
    fn rejects_reserved_config_key() {
        let err = parse_assignment("config=app.yaml").expect_err("reserved");
        assert!(err.contains("--config"), "{err}");
        assert!(parse_assignment("config.path=x").is_ok());
    }
}

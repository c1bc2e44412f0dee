//! Environment variable name normalization
//!
//! Maps `PREFIX_NESTED_VAL` style names onto store keys such as `nested.val`.

/// Normalize a raw environment variable name into a store key.
///
/// The prefix is stripped only when it matches byte-for-byte; the remainder
/// is lower-cased and every `_` becomes `delimiter`.
pub fn normalize(prefix: &str, delimiter: char, raw: &str) -> String {
    let rest = raw.strip_prefix(prefix).unwrap_or(raw);
    fold_key(delimiter, rest)
}

/// Strip `prefix` from `name` when it starts with it, ignoring ASCII case.
///
/// Returns `None` for names that are not eligible. An empty prefix makes
/// every name eligible.
pub fn strip_prefix_ignore_case<'a>(prefix: &str, name: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(name);
    }
    let head = name.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&name[prefix.len()..])
    } else {
        None
    }
}

/// Lower-case `name` and substitute `_` with `delimiter`.
pub(crate) fn fold_key(delimiter: char, name: &str) -> String {
    name.to_lowercase().chars().map(|c| if c == '_' { delimiter } else { c }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "TEST_";

    #[test]
    fn normalize_cases() {
        let cases = [
            ("", ""),
            ("testenv", "testenv"),
            ("TESTENV", "testenv"),
            ("testenv_testenv", "testenv.testenv"),
            ("TESTENV_TESTENV", "testenv.testenv"),
            ("testenv_testenv_", "testenv.testenv."),
            ("a__b", "a..b"),
            ("TEST_VALUE", "value"),
            ("TEST_NESTED_VAL", "nested.val"),
        ];
        for (raw, want) in cases {
            assert_eq!(normalize(PREFIX, '.', raw), want, "raw={raw:?}");
        }
    }

    #[test]
    fn normalize_strip_is_case_sensitive() {
        assert_eq!(normalize(PREFIX, '.', "test_value"), "test.value");
    }

    #[test]
    fn normalize_uses_configured_delimiter() {
        assert_eq!(normalize("APP_", '/', "APP_DB_HOST"), "db/host");
        assert_eq!(normalize("", '→', "DB_HOST"), "db→host");
    }

    #[test]
    fn normalize_is_idempotent_on_normalized_keys() {
        for key in ["value", "nested.val", "a.b.c", ""] {
            let once = normalize(PREFIX, '.', key);
            assert_eq!(once, key);
            assert_eq!(normalize(PREFIX, '.', &once), once);
        }
    }

    #[test]
    fn strip_prefix_ignores_ascii_case() {
        assert_eq!(strip_prefix_ignore_case(PREFIX, "TEST_VALUE"), Some("VALUE"));
        assert_eq!(strip_prefix_ignore_case(PREFIX, "test_value"), Some("value"));
        assert_eq!(strip_prefix_ignore_case(PREFIX, "OTHER_VALUE"), None);
        assert_eq!(strip_prefix_ignore_case(PREFIX, "TES"), None);
        assert_eq!(strip_prefix_ignore_case("", "ANY"), Some("ANY"));
    }

    #[test]
    fn strip_prefix_handles_multibyte_names() {
        // Prefix length lands inside a multi-byte char: not eligible, no panic.
        assert_eq!(strip_prefix_ignore_case("AB", "Aé"), None);
    }
}

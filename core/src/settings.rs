//! Settings resolution: command-line value, then environment variable, then default.

use anyhow::{anyhow, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Read an environment variable, treating unset and blank the same way.
pub fn env_value(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a raw setting, falling back to `default` when the value is absent.
///
/// `name` only appears in the error message.
pub fn parse_setting<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("invalid value {raw:?} for {name}: {e}")),
        None => Ok(default),
    }
}

/// Like [`parse_setting`] but for settings without a default.
pub fn parse_optional<T>(name: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    raw.map(|raw| {
        raw.parse::<T>()
            .map_err(|e| anyhow!("invalid value {raw:?} for {name}: {e}"))
    })
    .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_value_uses_default() {
        let trials: u32 = parse_setting("PARTS_TRIALS", None, 100).unwrap();
        assert_eq!(trials, 100);
    }

    #[test]
    fn present_value_is_parsed() {
        let trials: u32 = parse_setting("PARTS_TRIALS", Some("25".into()), 100).unwrap();
        assert_eq!(trials, 25);
    }

    #[test]
    fn bad_value_names_the_setting() {
        let err = parse_setting::<u32>("PARTS_TRIALS", Some("many".into()), 100).unwrap_err();
        assert!(err.to_string().contains("PARTS_TRIALS"));
        assert!(err.to_string().contains("many"));
    }

    #[test]
    fn optional_setting() {
        assert_eq!(parse_optional::<u64>("PARTS_SEED", None).unwrap(), None);
        assert_eq!(
            parse_optional::<u64>("PARTS_SEED", Some("7".into())).unwrap(),
            Some(7)
        );
        assert!(parse_optional::<u64>("PARTS_SEED", Some("-1".into())).is_err());
    }
}

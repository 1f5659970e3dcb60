//! Duration parsing for configuration files.
//!
//! Supports two formats:
//! - `humantime`: `10s`, `1m 30s`, `500ms`
//! - ISO 8601: `PT10S`, `PT1M30S`

use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Parse a duration string.
///
/// Tries humantime first, then ISO 8601.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    if let Ok(d) = humantime::parse_duration(s) {
        return Ok(d);
    }

    if let Ok(d) = iso8601_duration::Duration::parse(s) {
        if let Some(std_duration) = d.to_std() {
            return Ok(std_duration);
        }
    }

    Err(format!(
        "invalid duration '{}': expected humantime (10s) or ISO 8601 (PT10S)",
        s
    ))
}

/// Deserialize an optional duration from a string.
pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    match opt {
        Some(s) => parse_duration(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

//! # Runtime Configuration Module
//!
//! Environment-driven settings for the dispatcher.
//!
//! ## Environment Variables
//!
//! ### `BRRTC_MAX_BODY_BYTES`
//!
//! Largest request body the dispatcher will parse. Accepts decimal
//! (`1048576`) or hexadecimal (`0x100000`). Larger bodies are rejected with
//! `413 Payload Too Large` before any JSON parsing happens.
//!
//! Default: `0x100000` (1 MiB)
//!
//! ### `BRRTC_COERCE_QUERY_NUMBERS`
//!
//! When `true`, query values that look like plain decimal numbers
//! (`10`, `-3`, `0.5`) are handed to the query schema as JSON numbers
//! rather than strings. Set to `false` if your query schemas declare
//! numeric-looking identifiers as strings.
//!
//! Default: `true`
//!
//! ## Usage
//!
//! ```rust
//! use brrtcontract::runtime_config::DispatcherConfig;
//!
//! let config = DispatcherConfig::from_env();
//! println!("Max body: {} bytes", config.max_body_bytes);
//! ```

use std::env;

/// Default body limit: 1 MiB.
pub const DEFAULT_MAX_BODY_BYTES: usize = 0x10_0000;

/// Dispatcher settings loaded at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    pub max_body_bytes: usize,
    pub coerce_query_numbers: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            coerce_query_numbers: true,
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    if let Some(hex) = val.strip_prefix("0x") {
        usize::from_str_radix(hex, 16).ok()
    } else {
        val.parse().ok()
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_body_bytes = lookup("BRRTC_MAX_BODY_BYTES")
            .and_then(|v| parse_size(&v))
            .unwrap_or(defaults.max_body_bytes);
        let coerce_query_numbers = lookup("BRRTC_COERCE_QUERY_NUMBERS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(defaults.coerce_query_numbers);
        DispatcherConfig {
            max_body_bytes,
            coerce_query_numbers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        assert_eq!(DispatcherConfig::from_lookup(lookup(&[])), DispatcherConfig::default());
    }

    #[test]
    fn test_decimal_and_hex_sizes() {
        let cfg = DispatcherConfig::from_lookup(lookup(&[("BRRTC_MAX_BODY_BYTES", "2048")]));
        assert_eq!(cfg.max_body_bytes, 2048);
        let cfg = DispatcherConfig::from_lookup(lookup(&[("BRRTC_MAX_BODY_BYTES", "0x800")]));
        assert_eq!(cfg.max_body_bytes, 2048);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = DispatcherConfig::from_lookup(lookup(&[
            ("BRRTC_MAX_BODY_BYTES", "lots"),
            ("BRRTC_COERCE_QUERY_NUMBERS", "maybe"),
        ]));
        assert_eq!(cfg, DispatcherConfig::default());
    }

    #[test]
    fn test_disable_coercion() {
        let cfg = DispatcherConfig::from_lookup(lookup(&[("BRRTC_COERCE_QUERY_NUMBERS", "false")]));
        assert!(!cfg.coerce_query_numbers);
    }
}

//! Typed lookups into a JSON override object.
//!
//! Each helper returns `default` when the key is missing or holds the wrong
//! JSON type, so a partial override object always yields a usable value.

use serde_json::Value;

/// `params[name]` as f64; integers are accepted.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// `params[name]` as usize; only non-negative integers are accepted.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// `params[name]` as u64.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

/// `params[name]` as an owned string.
pub fn param_string(params: &Value, name: &str, default: &str) -> String {
    params
        .get(name)
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| default.to_owned())
}

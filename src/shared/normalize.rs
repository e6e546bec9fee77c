//! Defensive numeric coercion for upstream JSON fields.
//!
//! Upstream APIs report the same field as a number, a numeric string, or a
//! nested object keyed by chain (Beefy TVL does all three). Every input maps
//! to a finite float; nothing here errors or panics.

use serde_json::Value;

/// Nested keys tried first when a numeric field arrives as an object.
/// `tvl` always leads; the rest are chain-specific and supplied by the caller.
pub const AVALANCHE_NESTED_KEYS: &[&str] = &["tvl", "avax", "avalanche"];

/// Coerce a raw JSON value into a float.
///
/// Numbers pass through (non-finite becomes 0). Strings are parsed, with
/// parse failure mapping to 0. Objects are probed with `nested_keys` in
/// order, then the first numeric or numeric-parseable value in iteration
/// order. Anything else (null, missing, bool, array) is 0.
pub fn coerce_number(raw: &Value, nested_keys: &[&str]) -> f64 {
    match raw {
        Value::Number(n) => finite_or_zero(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => finite_or_zero(s.trim().parse::<f64>().unwrap_or(0.0)),
        Value::Object(map) => {
            for key in nested_keys {
                if let Some(inner) = map.get(*key) {
                    let parsed = coerce_scalar(inner);
                    if parsed != 0.0 {
                        return parsed;
                    }
                }
            }
            map.values().map(coerce_scalar).find(|v| *v != 0.0).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}

/// Coerce a value that is expected to be a plain scalar (no object probing).
pub fn coerce_scalar(raw: &Value) -> f64 {
    match raw {
        Value::Number(n) => finite_or_zero(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => finite_or_zero(s.trim().parse::<f64>().unwrap_or(0.0)),
        _ => 0.0,
    }
}

/// Convert a 0-1 fraction (Aave/DeFiLlama utilization convention) to percent.
pub fn fraction_to_percent(fraction: f64) -> f64 {
    finite_or_zero(fraction * 100.0)
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_plain_number() {
        assert_eq!(coerce_number(&json!(1234.5), AVALANCHE_NESTED_KEYS), 1234.5);
        assert_eq!(coerce_number(&json!(0), AVALANCHE_NESTED_KEYS), 0.0);
    }

    #[test]
    fn test_coerce_numeric_string() {
        assert_eq!(coerce_number(&json!("987.25"), AVALANCHE_NESTED_KEYS), 987.25);
        assert_eq!(coerce_number(&json!(" 42 "), AVALANCHE_NESTED_KEYS), 42.0);
        assert_eq!(coerce_number(&json!("not a number"), AVALANCHE_NESTED_KEYS), 0.0);
    }

    #[test]
    fn test_coerce_nested_object_priority() {
        // `tvl` wins over chain keys
        let v = json!({"avax": 10.0, "tvl": 20.0});
        assert_eq!(coerce_number(&v, AVALANCHE_NESTED_KEYS), 20.0);

        let v = json!({"avalanche": "15000.5"});
        assert_eq!(coerce_number(&v, AVALANCHE_NESTED_KEYS), 15000.5);
    }

    #[test]
    fn test_coerce_object_first_numeric_fallback() {
        let v = json!({"someChain": "not numeric", "otherChain": 77.0});
        assert_eq!(coerce_number(&v, AVALANCHE_NESTED_KEYS), 77.0);

        let v = json!({"a": "x", "b": "y"});
        assert_eq!(coerce_number(&v, AVALANCHE_NESTED_KEYS), 0.0);
    }

    #[test]
    fn test_coerce_null_and_other_shapes() {
        assert_eq!(coerce_number(&Value::Null, AVALANCHE_NESTED_KEYS), 0.0);
        assert_eq!(coerce_number(&json!(true), AVALANCHE_NESTED_KEYS), 0.0);
        assert_eq!(coerce_number(&json!([1, 2]), AVALANCHE_NESTED_KEYS), 0.0);
    }

    #[test]
    fn test_fraction_to_percent() {
        assert_eq!(fraction_to_percent(0.8), 80.0);
        assert_eq!(fraction_to_percent(0.0), 0.0);
    }
}

//! Helpers for JSON cell values

use serde_json::Value;

/// Canonical string form of a row identifier.
///
/// Strings are taken verbatim and integral numbers lose any fraction
/// (`12.0` and `12` are the same id). Null, booleans and containers are not
/// identifiers.
pub fn id_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some(format!("{}", f as i64))
                } else {
                    Some(n.to_string())
                }
            }
        }
        _ => None,
    }
}

/// Key used to count occurrences of a categorical value.
///
/// Same rules as [`id_key`], plus booleans; null and containers are skipped.
pub fn category_key(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(b.to_string()),
        other => id_key(other),
    }
}

/// Exact equality of two scalar cells, with numbers compared by value.
pub fn scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_key() {
        assert_eq!(id_key(&json!(12)), Some("12".to_string()));
        assert_eq!(id_key(&json!(12.0)), Some("12".to_string()));
        assert_eq!(id_key(&json!(1.5)), Some("1.5".to_string()));
        assert_eq!(id_key(&json!("T-1")), Some("T-1".to_string()));
        assert_eq!(id_key(&json!(null)), None);
        assert_eq!(id_key(&json!(true)), None);
    }

    #[test]
    fn test_scalars_equal() {
        assert!(scalars_equal(&json!(1), &json!(1.0)));
        assert!(!scalars_equal(&json!(1), &json!("1")));
        assert!(scalars_equal(&json!("Sec"), &json!("Sec")));
    }
}

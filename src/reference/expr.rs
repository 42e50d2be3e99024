//! `@key.path` parsing and evaluation

use serde_json::{Map, Value};
use std::fmt;
use crate::plugins::CHAIN_PLUGIN;
use super::context::ChainContext;
use super::error::ReferenceError;

/// A parsed `@root.path.to.value` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub root: String,
    pub path: Vec<String>,
}

impl Reference {
    /// Parse a string value.
    ///
    /// Returns `Ok(None)` for plain strings (including `@@` escapes).
    pub fn parse(text: &str) -> Result<Option<Self>, ReferenceError> {
        let Some(body) = text.strip_prefix('@') else {
            return Ok(None);
        };
        if body.starts_with('@') {
            return Ok(None);
        }

        let mut segments = body.split('.').map(|segment| {
            let valid = !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if valid {
                Ok(segment.to_string())
            } else {
                Err(ReferenceError::Malformed(text.to_string()))
            }
        });

        let root = segments
            .next()
            .ok_or_else(|| ReferenceError::Malformed(text.to_string()))??;
        let path = segments.collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Self { root, path }))
    }

    /// Evaluate against a chain context
    pub fn evaluate(&self, context: &ChainContext) -> Result<Value, ReferenceError> {
        let mut current = context.get(&self.root).ok_or_else(|| ReferenceError::Unresolved {
            reference: self.to_string(),
            key: self.root.clone(),
        })?;

        for segment in &self.path {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            current = next.ok_or_else(|| ReferenceError::MissingPath {
                reference: self.to_string(),
                segment: segment.clone(),
            })?;
        }
        Ok(current.clone())
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.root)?;
        for segment in &self.path {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

/// Resolve a single `@key.path` expression
pub fn resolve(expr: &str, context: &ChainContext) -> Result<Value, ReferenceError> {
    match Reference::parse(expr)? {
        Some(reference) => reference.evaluate(context),
        None => Err(ReferenceError::Malformed(expr.to_string())),
    }
}

/// Replace every reference inside `params` with its value.
///
/// Walks arrays and objects. The `params` of a nested `transform_chain` step
/// are left untouched: that chain resolves against its own context.
pub fn substitute(params: &Value, context: &ChainContext) -> Result<Value, ReferenceError> {
    match params {
        Value::String(text) => match Reference::parse(text)? {
            Some(reference) => reference.evaluate(context),
            None => Ok(match text.strip_prefix("@@") {
                Some(rest) => Value::String(format!("@{}", rest)),
                None => params.clone(),
            }),
        },
        Value::Array(items) => items
            .iter()
            .map(|item| substitute(item, context))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => substitute_object(map, context).map(Value::Object),
        other => Ok(other.clone()),
    }
}

/// Object form of [`substitute`]
pub(crate) fn substitute_object(
    map: &Map<String, Value>,
    context: &ChainContext,
) -> Result<Map<String, Value>, ReferenceError> {
    let nested_chain = map.get("plugin").and_then(Value::as_str) == Some(CHAIN_PLUGIN);
    map.iter()
        .map(|(key, value)| -> Result<(String, Value), ReferenceError> {
            let value = if nested_chain && key == "params" {
                value.clone()
            } else {
                substitute(value, context)?
            };
            Ok((key.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ChainContext {
        let mut ctx = ChainContext::new();
        ctx.insert("A", json!({"x": [1, 2, 3], "nested": {"y": "deep"}}));
        ctx
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            Reference::parse("@A.x").unwrap(),
            Some(Reference { root: "A".into(), path: vec!["x".into()] })
        );
        assert_eq!(Reference::parse("plain").unwrap(), None);
        assert_eq!(Reference::parse("@@A").unwrap(), None);
        assert!(Reference::parse("@").is_err());
        assert!(Reference::parse("@A..x").is_err());
        assert!(Reference::parse("@A.x y").is_err());
    }

    #[test]
    fn test_resolve_path() {
        let ctx = context();
        assert_eq!(resolve("@A.x", &ctx).unwrap(), json!([1, 2, 3]));
        assert_eq!(resolve("@A.x.1", &ctx).unwrap(), json!(2));
        assert_eq!(resolve("@A.nested.y", &ctx).unwrap(), json!("deep"));
    }

    #[test]
    fn test_unresolved_root_and_path() {
        let ctx = context();
        assert!(matches!(
            resolve("@B.x", &ctx),
            Err(ReferenceError::Unresolved { key, .. }) if key == "B"
        ));
        assert!(matches!(
            resolve("@A.z", &ctx),
            Err(ReferenceError::MissingPath { segment, .. }) if segment == "z"
        ));
    }

    #[test]
    fn test_substitute_walks_params() {
        let ctx = context();
        let params = json!({
            "values": "@A.x",
            "label": "@@literal",
            "list": ["@A.nested.y", 4],
            "step": {"plugin": "transform_chain", "params": {"steps": "@C"}}
        });
        let out = substitute(&params, &ctx).unwrap();
        assert_eq!(out["values"], json!([1, 2, 3]));
        assert_eq!(out["label"], json!("@literal"));
        assert_eq!(out["list"], json!(["deep", 4]));
        assert_eq!(out["step"]["params"]["steps"], json!("@C"));
    }
}

//! Built-in resolver for `"@@="` strings: property accessors.
//!
//! - `"@@=-"` resolves to the identity accessor, returning the datum itself.
//! - `"@@=a.b.0"` resolves to an accessor reading that path out of the datum.
//!   Object fields are looked up by name, array elements by index. A missing
//!   step yields `Converted::Null`.
//!
//! Anything else is rejected. Accessors are compiled once per expression and
//! shared afterwards.

use crate::configuration::Configuration;
use crate::error::ConvertError;
use crate::tag::FUNCTION_IDENTIFIER;
use crate::value::{Callable, Converted};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Expression of the identity accessor.
pub const IDENTITY_ACCESSOR: &str = "-";

/// Returns a `convert_function` resolving accessor expressions.
///
/// Each distinct expression is compiled once and kept for the lifetime of
/// the resolver; entries are never evicted. Memory grows with the number of
/// distinct expressions seen, which for document-driven use is bounded by
/// the documents themselves. Build a fresh resolver to drop the cache.
///
/// ```
/// use json_converter::{accessor::accessor_resolver, convert_json, Configuration, Converted};
/// use serde_json::json;
///
/// let configuration = Configuration::new().with_convert_function(accessor_resolver());
/// let converted = convert_json(&json!({"getPosition": "@@=coords.0"}), &configuration).unwrap();
/// let accessor = converted.get("getPosition").unwrap().as_function().unwrap();
///
/// let datum = Converted::from(json!({"coords": [7, 8]}));
/// assert_eq!(accessor.call(&datum).unwrap().as_i64(), Some(7));
/// ```
pub fn accessor_resolver() -> impl Fn(&str, &str, &Configuration) -> Result<Converted, ConvertError> + Send + Sync + 'static {
    let cache: Mutex<HashMap<String, Callable>> = Mutex::new(HashMap::new());
    move |expression: &str, key: &str, _configuration: &Configuration| -> Result<Converted, ConvertError> {
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(accessor) = cache.get(expression) {
            return Ok(Converted::Function(accessor.clone()));
        }
        let accessor = compile_accessor(expression).ok_or_else(|| {
            ConvertError::factory(
                format!("{}{}", FUNCTION_IDENTIFIER, expression),
                format!("unsupported accessor expression for \"{}\"", key),
            )
        })?;
        cache.insert(expression.to_string(), accessor.clone());
        Ok(Converted::Function(accessor))
    }
}

/// Compiles an accessor expression. `None` if it is not `-` or a dotted path
/// of identifier-like segments.
pub fn compile_accessor(expression: &str) -> Option<Callable> {
    if expression == IDENTITY_ACCESSOR {
        return Some(Callable::new(expression, |datum| Ok(datum.clone())));
    }
    let path: Vec<String> = expression.split('.').map(str::to_string).collect();
    if !path.iter().all(|segment| is_path_segment(segment)) {
        return None;
    }
    let path = Arc::new(path);
    Some(Callable::new(expression, move |datum| {
        Ok(get(datum, path.as_slice()).cloned().unwrap_or_default())
    }))
}

fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Follows `path` into `container`.
pub fn get<'a, S: AsRef<str>>(container: &'a Converted, path: &[S]) -> Option<&'a Converted> {
    path.iter().try_fold(container, |node, step| {
        let step = step.as_ref();
        match node {
            Converted::Object(props) => props.get(step),
            Converted::Array(items) => step.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(expression: &str) -> Result<Converted, ConvertError> {
        let resolver = accessor_resolver();
        resolver(expression, "accessor", &Configuration::new())
    }

    #[test]
    fn test_identity() {
        let f = compile_accessor("-").unwrap();
        let datum = Converted::from(json!({"a": 1}));
        assert_eq!(f.call(&datum).unwrap(), datum);
    }

    #[test]
    fn test_property_path() {
        let f = compile_accessor("position.1").unwrap();
        let datum = Converted::from(json!({"position": [10, 20]}));
        assert_eq!(f.call(&datum).unwrap().as_i64(), Some(20));
        assert_eq!(f.name(), "position.1");
    }

    #[test]
    fn test_missing_path_is_null() {
        let f = compile_accessor("a.b").unwrap();
        assert!(f.call(&Converted::from(json!({"a": {}}))).unwrap().is_null());
        assert!(f.call(&Converted::from(json!(3))).unwrap().is_null());
        assert!(f.call(&Converted::from(json!({"a": [1]}))).unwrap().is_null());
    }

    #[test]
    fn test_rejects_expressions() {
        assert!(compile_accessor("").is_none());
        assert!(compile_accessor("a..b").is_none());
        assert!(compile_accessor("x * 2").is_none());
        let err = resolve("d => d.x").unwrap_err();
        assert!(matches!(err, ConvertError::Factory { ref type_name, .. } if type_name == "@@=d => d.x"));
        assert!(err.to_string().contains("\"accessor\""), "got: {}", err);
    }

    #[test]
    fn test_resolver_caches_per_expression() {
        let resolver = accessor_resolver();
        let configuration = Configuration::new();
        let a = resolver("name", "k", &configuration).unwrap();
        let b = resolver("name", "other", &configuration).unwrap();
        let c = resolver("size", "k", &configuration).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let fresh = accessor_resolver();
        assert_ne!(fresh("name", "k", &configuration).unwrap(), a);
    }

    #[test]
    fn test_get() {
        let tree = Converted::from(json!({"a": [{"b": true}]}));
        assert_eq!(get(&tree, &["a", "0", "b"]), Some(&Converted::Bool(true)));
        assert_eq!(get(&tree, &[] as &[&str]), Some(&tree));
        assert_eq!(get(&tree, &["a", "x"]), None);
    }
}

//! Tag grammar: reserved string prefixes and descriptor keys.
//!
//! Strings in a document may carry references instead of text:
//!
//! - `"@@=<expr>"` refers to a function, resolved by the configured
//!   `convert_function`.
//! - `"@@#<NAME>"` refers to a constant, or to an enumeration member when
//!   written as `"@@#<Enum>.<Member>"`.
//!
//! Objects are marked as class descriptors by the type key (`"@@type"` by
//! default) and as function descriptors by the function key (`"@@function"`).

use serde_json::Value;

/// Prefix marking a string as a function reference.
pub const FUNCTION_IDENTIFIER: &str = "@@=";

/// Prefix marking a string as a constant or enumeration reference.
pub const CONSTANT_IDENTIFIER: &str = "@@#";

/// Default field name marking an object as a class-instance descriptor.
pub const DEFAULT_TYPE_KEY: &str = "@@type";

/// Default field name marking an object as a function descriptor.
pub const DEFAULT_FUNCTION_KEY: &str = "@@function";

/// A parsed document string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringTag<'a> {
    /// No reserved prefix.
    Plain(&'a str),
    /// `@@=` prefix, carrying the text after it.
    Function(&'a str),
    /// `@@#` prefix.
    Constant(ConstantRef<'a>),
}

/// The name part of a `@@#` reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantRef<'a> {
    /// Everything after the prefix; looked up verbatim in the constants first.
    pub name: &'a str,
    /// `(enum, member)` when the name contains a `.`, split at the first one.
    pub enum_member: Option<(&'a str, &'a str)>,
}

/// Splits a string into its tag, without consulting any configuration.
pub fn parse_tag(s: &str) -> StringTag<'_> {
    if let Some(rest) = s.strip_prefix(FUNCTION_IDENTIFIER) {
        return StringTag::Function(rest);
    }
    if let Some(name) = s.strip_prefix(CONSTANT_IDENTIFIER) {
        return StringTag::Constant(ConstantRef {
            name,
            enum_member: name.split_once('.'),
        });
    }
    StringTag::Plain(s)
}

/// Truthiness of a descriptor tag value.
///
/// `null`, `false`, `0`, `NaN` and `""` are falsy. Arrays and objects are
/// truthy even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Name carried by a truthy tag value. Strings are taken as-is, anything
/// else by its JSON text.
pub fn tag_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_strings() {
        assert_eq!(parse_tag("hello"), StringTag::Plain("hello"));
        assert_eq!(parse_tag(""), StringTag::Plain(""));
        assert_eq!(parse_tag("@@"), StringTag::Plain("@@"));
        assert_eq!(parse_tag("x@@=y"), StringTag::Plain("x@@=y"));
    }

    #[test]
    fn test_function_tag() {
        assert_eq!(parse_tag("@@=foo"), StringTag::Function("foo"));
        assert_eq!(parse_tag("@@="), StringTag::Function(""));
        // Only the leading prefix is stripped.
        assert_eq!(parse_tag("@@=@@=x"), StringTag::Function("@@=x"));
    }

    #[test]
    fn test_constant_tag() {
        assert_eq!(
            parse_tag("@@#PI"),
            StringTag::Constant(ConstantRef { name: "PI", enum_member: None })
        );
        assert_eq!(
            parse_tag("@@#Color.RED"),
            StringTag::Constant(ConstantRef {
                name: "Color.RED",
                enum_member: Some(("Color", "RED")),
            })
        );
        assert_eq!(
            parse_tag("@@#a.b.c"),
            StringTag::Constant(ConstantRef {
                name: "a.b.c",
                enum_member: Some(("a", "b.c")),
            })
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("Point")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!(-0.5)));
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_tag_name() {
        assert_eq!(tag_name(&json!("Point")), "Point");
        assert_eq!(tag_name(&json!(1)), "1");
        assert_eq!(tag_name(&json!(true)), "true");
    }
}

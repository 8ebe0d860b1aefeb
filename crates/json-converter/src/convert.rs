//! The recursive converter.
//!
//! Walks a document depth-first and builds the converted tree. Dispatch is
//! on shape, first match wins:
//!
//! 1. arrays, element by element, with the index as key;
//! 2. class descriptors (truthy type key), handed to [`instantiate_class`];
//! 3. function descriptors (function key present, whatever its value),
//!    handed to [`invoke_function`];
//! 4. any other object, field by field;
//! 5. strings, through the tag grammar;
//! 6. numbers, booleans and null, unchanged.
//!
//! The input is only ever borrowed. Recursion depth follows the document's
//! nesting depth.

use crate::configuration::Configuration;
use crate::error::ConvertError;
use crate::instantiate::{instantiate_class, invoke_function};
use crate::tag::{is_truthy, parse_tag, tag_name, ConstantRef, StringTag};
use crate::value::{Converted, Props};
use serde_json::{Map, Value};

/// Converts a whole document, starting with an empty root key.
pub fn convert_json(json: &Value, configuration: &Configuration) -> Result<Converted, ConvertError> {
    convert_value(json, "", configuration)
}

/// Converts one node. `key` is the field name (or stringified index) the
/// node was found under; it is only passed on to the function resolver.
pub fn convert_value(json: &Value, key: &str, configuration: &Configuration) -> Result<Converted, ConvertError> {
    match json {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| convert_value(item, &index.to_string(), configuration))
            .collect::<Result<Vec<_>, _>>()
            .map(Converted::Array),
        Value::Object(map) if is_class_instance(map, configuration) => convert_class_instance(map, configuration),
        Value::Object(map) if is_function_object(map, configuration) => convert_function_object(map, configuration),
        Value::Object(map) => convert_plain_object(map, configuration).map(Converted::Object),
        Value::String(s) => convert_string(s, key, configuration),
        Value::Number(n) => Ok(Converted::Number(n.clone())),
        Value::Bool(b) => Ok(Converted::Bool(*b)),
        Value::Null => Ok(Converted::Null),
    }
}

pub fn is_class_instance(map: &Map<String, Value>, configuration: &Configuration) -> bool {
    map.get(&configuration.type_key).is_some_and(is_truthy)
}

/// Unlike the type key, the function key marks a descriptor by presence
/// alone.
pub fn is_function_object(map: &Map<String, Value>, configuration: &Configuration) -> bool {
    map.contains_key(&configuration.function_key)
}

/// Converts every field of an object, keeping key order.
pub fn convert_plain_object(map: &Map<String, Value>, configuration: &Configuration) -> Result<Props, ConvertError> {
    convert_fields(map, None, configuration)
}

fn convert_fields(
    map: &Map<String, Value>,
    skip: Option<&str>,
    configuration: &Configuration,
) -> Result<Props, ConvertError> {
    map.iter()
        .filter(|(key, _)| Some(key.as_str()) != skip)
        .map(|(key, value)| Ok::<_, ConvertError>((key.clone(), convert_value(value, key, configuration)?)))
        .collect()
}

fn convert_class_instance(map: &Map<String, Value>, configuration: &Configuration) -> Result<Converted, ConvertError> {
    let type_key = configuration.type_key.as_str();
    let type_name = map.get(type_key).map(tag_name).unwrap_or_default();
    // Nested descriptors are converted first, so factories only ever see
    // converted props.
    let props = convert_fields(map, Some(type_key), configuration)?;
    instantiate_class(&type_name, props, configuration)
}

fn convert_function_object(map: &Map<String, Value>, configuration: &Configuration) -> Result<Converted, ConvertError> {
    let function_key = configuration.function_key.as_str();
    let name = map.get(function_key).map(tag_name).unwrap_or_default();
    let props = convert_fields(map, Some(function_key), configuration)?;
    invoke_function(&name, &props, configuration)
}

/// Resolves a string through the tag grammar.
///
/// A `"@@="` string without a configured resolver is returned as-is,
/// prefix included.
pub fn convert_string(s: &str, key: &str, configuration: &Configuration) -> Result<Converted, ConvertError> {
    match parse_tag(s) {
        StringTag::Function(expression) => match &configuration.convert_function {
            Some(convert_function) => convert_function(expression, key, configuration),
            None => Ok(Converted::String(s.to_string())),
        },
        StringTag::Constant(reference) => resolve_constant(reference, configuration),
        StringTag::Plain(_) => Ok(Converted::String(s.to_string())),
    }
}

/// Looks a `"@@#"` name up in the constants, then as `Enum.Member`.
pub fn resolve_constant(reference: ConstantRef<'_>, configuration: &Configuration) -> Result<Converted, ConvertError> {
    if let Some(value) = configuration.constants.get(reference.name) {
        return Ok(value.clone());
    }
    reference
        .enum_member
        .and_then(|(enumeration, member)| configuration.enumerations.get(enumeration)?.get(member))
        .cloned()
        .ok_or_else(|| ConvertError::UnresolvedReference(reference.name.to_string()))
}

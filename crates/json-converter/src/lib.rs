//! JSON converter: turns declarative JSON documents into live values.
//!
//! # Overview
//!
//! A document is plain JSON. While converting it, three kinds of references
//! are resolved against a [`Configuration`]:
//!
//! - objects carrying the type key (`"@@type"` by default) become instances
//!   of registered classes;
//! - strings starting with `"@@="` become functions, through the configured
//!   `convert_function`;
//! - strings starting with `"@@#"` become registered constants or
//!   enumeration members (`"@@#Enum.Member"`).
//!
//! [`JsonConverter`] wraps the conversion with a single-slot cache keyed on
//! input identity.
//!
//! # Example
//!
//! ```
//! use json_converter::{Configuration, Converted, JsonConverter, Props};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct Point { x: f64, y: f64 }
//!
//! let configuration = Configuration::new()
//!     .with_type_key("type")
//!     .with_constant("ORIGIN_X", 0.5)
//!     .register_class("Point", |props: &Props| {
//!         Ok(Point {
//!             x: props.get("x").and_then(Converted::as_f64).unwrap_or_default(),
//!             y: props.get("y").and_then(Converted::as_f64).unwrap_or_default(),
//!         })
//!     });
//!
//! let mut converter = JsonConverter::with_configuration(configuration);
//! let document = Arc::new(json!({"type": "Point", "x": "@@#ORIGIN_X", "y": 2}));
//! let converted = converter.convert(&document).unwrap().unwrap();
//!
//! let point = converted.downcast_ref::<Point>().unwrap();
//! assert_eq!((point.x, point.y), (0.5, 2.0));
//! ```

pub mod accessor;
pub mod cli;
pub mod configuration;
pub mod convert;
pub mod converter;
pub mod error;
pub mod instantiate;
pub mod tag;
pub mod value;

// Re-export the core public API
pub use configuration::{
    ClassFactory, Configuration, ConvertFunction, ConverterOptions, FunctionFactory, PostProcessClass,
    PostProcessConvertedJson, PreProcessClass, UnregisteredClassPolicy,
};
pub use convert::{convert_json, convert_value};
pub use converter::{parse_json, ConfigurationInput, ConverterProps, Document, JsonConverter, OnJsonChange};
pub use error::ConvertError;
pub use instantiate::{instantiate_class, invoke_function};
pub use tag::{CONSTANT_IDENTIFIER, DEFAULT_FUNCTION_KEY, DEFAULT_TYPE_KEY, FUNCTION_IDENTIFIER};
pub use value::{Callable, Converted, Instance, Props, WithTypeKey};

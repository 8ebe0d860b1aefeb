//! Property tests over generated documents without tags.

use json_converter::{convert_json, Configuration, JsonConverter};
use proptest::prelude::*;
use serde_json::{Map, Value};
use std::sync::Arc;

/// No `@`, so never a tag prefix.
fn plain_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.#=-]{0,12}"
}

fn document() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        plain_string().prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..6)
                .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #[test]
    fn untagged_documents_convert_to_themselves(doc in document()) {
        let converted = convert_json(&doc, &Configuration::new()).unwrap();
        prop_assert_eq!(converted.to_json(), Some(doc));
    }

    #[test]
    fn conversion_does_not_mutate_input(doc in document()) {
        let before = doc.clone();
        let configuration = Configuration::new().with_constant("X", 1i64);
        let _ = convert_json(&doc, &configuration);
        prop_assert_eq!(doc, before);
    }

    #[test]
    fn repeated_input_hits_cache(doc in document()) {
        prop_assume!(!doc.is_null());
        let mut converter = JsonConverter::with_configuration(Configuration::new());
        let doc = Arc::new(doc);
        let first = converter.convert(&doc).unwrap().unwrap();
        let second = converter.convert(&doc).unwrap().unwrap();
        prop_assert!(Arc::ptr_eq(&first, &second));
    }
}

//! The registry consulted during conversion.

use crate::error::ConvertError;
use crate::tag::{DEFAULT_FUNCTION_KEY, DEFAULT_TYPE_KEY};
use crate::value::{Converted, Instance, Props};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub type ClassFactory = dyn Fn(&Props) -> Result<Arc<dyn Any + Send + Sync>, ConvertError> + Send + Sync;
pub type FunctionFactory = dyn Fn(&Props) -> Result<Converted, ConvertError> + Send + Sync;
/// Resolves the text after a `"@@="` prefix. Receives the text, the key of
/// the field being converted and the active configuration.
pub type ConvertFunction = dyn Fn(&str, &str, &Configuration) -> Result<Converted, ConvertError> + Send + Sync;
pub type PreProcessClass = dyn Fn(&str, Props) -> Props + Send + Sync;
pub type PostProcessClass = dyn Fn(Instance, &Props) -> Instance + Send + Sync;
pub type PostProcessConvertedJson = dyn Fn(Converted) -> Converted + Send + Sync;

/// What to do with a class descriptor whose type is not registered.
///
/// Anything other than `Reject` is an explicit opt-in: permitted types log a
/// warning and convert to `Converted::Null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnregisteredClassPolicy {
    #[default]
    Reject,
    Permit,
    Allowlist(BTreeSet<String>),
}

impl UnregisteredClassPolicy {
    pub fn permits(&self, type_name: &str) -> bool {
        match self {
            UnregisteredClassPolicy::Reject => false,
            UnregisteredClassPolicy::Permit => true,
            UnregisteredClassPolicy::Allowlist(names) => names.contains(type_name),
        }
    }
}

/// Declarative configuration, e.g. loaded from a JSON file.
///
/// Only data can be expressed here; classes, functions and hooks are
/// registered on the [`Configuration`] built from it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConverterOptions {
    pub type_key: Option<String>,
    pub function_key: Option<String>,
    pub constants: Map<String, Value>,
    pub enumerations: IndexMap<String, Map<String, Value>>,
    pub unregistered_classes: UnregisteredClassPolicy,
}

/// Registry of classes, functions, constants and enumerations, plus the
/// hooks applied around conversion.
///
/// Every field holds a usable value from construction on: empty registries,
/// no function resolver and identity hooks.
#[derive(Clone)]
pub struct Configuration {
    /// Field marking an object as a class-instance descriptor.
    pub type_key: String,
    /// Field marking an object as a function descriptor.
    pub function_key: String,
    pub classes: IndexMap<String, Arc<ClassFactory>>,
    pub functions: IndexMap<String, Arc<FunctionFactory>>,
    pub constants: IndexMap<String, Converted>,
    pub enumerations: IndexMap<String, IndexMap<String, Converted>>,
    /// Without a resolver, `"@@="` strings are left untouched.
    pub convert_function: Option<Arc<ConvertFunction>>,
    pub pre_process_class: Arc<PreProcessClass>,
    pub post_process_class: Arc<PostProcessClass>,
    pub post_process_converted_json: Arc<PostProcessConvertedJson>,
    pub unregistered_classes: UnregisteredClassPolicy,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            type_key: DEFAULT_TYPE_KEY.to_string(),
            function_key: DEFAULT_FUNCTION_KEY.to_string(),
            classes: IndexMap::new(),
            functions: IndexMap::new(),
            constants: IndexMap::new(),
            enumerations: IndexMap::new(),
            convert_function: None,
            pre_process_class: Arc::new(|_: &str, props: Props| props),
            post_process_class: Arc::new(|instance: Instance, _: &Props| instance),
            post_process_converted_json: Arc::new(|converted: Converted| converted),
            unregistered_classes: UnregisteredClassPolicy::Reject,
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes declarative options into a configuration.
    pub fn from_options(options: ConverterOptions) -> Result<Self, ConvertError> {
        let mut configuration = Configuration::new();
        if let Some(type_key) = options.type_key {
            configuration.type_key = type_key;
        }
        if let Some(function_key) = options.function_key {
            configuration.function_key = function_key;
        }
        configuration.constants = options
            .constants
            .into_iter()
            .map(|(name, value)| (name, Converted::from(value)))
            .collect();
        configuration.enumerations = options
            .enumerations
            .into_iter()
            .map(|(name, members)| {
                let members: IndexMap<String, Converted> = members
                    .into_iter()
                    .map(|(member, value)| (member, Converted::from(value)))
                    .collect();
                (name, members)
            })
            .collect();
        configuration.unregistered_classes = options.unregistered_classes;
        configuration.validate()?;
        Ok(configuration)
    }

    /// Checks the invariants the converter relies on.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.type_key.is_empty() {
            return Err(ConvertError::InvalidConfiguration("type key must not be empty".to_string()));
        }
        if self.function_key.is_empty() {
            return Err(ConvertError::InvalidConfiguration(
                "function key must not be empty".to_string(),
            ));
        }
        if self.type_key == self.function_key {
            return Err(ConvertError::InvalidConfiguration(format!(
                "type key and function key are both \"{}\"",
                self.type_key
            )));
        }
        Ok(())
    }

    /// Extends this configuration with the registries of `other`.
    ///
    /// Classes, functions, constants and enumerations are unioned, entries in
    /// `other` winning; enumerations are merged member by member. A function
    /// resolver in `other` replaces this one. Keys, hooks and the
    /// unregistered-class policy of `self` are kept.
    pub fn merge(&mut self, other: Configuration) {
        self.classes.extend(other.classes);
        self.functions.extend(other.functions);
        self.constants.extend(other.constants);
        for (name, members) in other.enumerations {
            self.enumerations.entry(name).or_default().extend(members);
        }
        if other.convert_function.is_some() {
            self.convert_function = other.convert_function;
        }
    }

    pub fn with_type_key(mut self, type_key: impl Into<String>) -> Self {
        self.type_key = type_key.into();
        self
    }

    pub fn with_function_key(mut self, function_key: impl Into<String>) -> Self {
        self.function_key = function_key.into();
        self
    }

    /// Registers a class factory. The produced value is type-erased into an
    /// [`Instance`] carrying `name`.
    pub fn register_class<T, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Props) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        let factory: Arc<ClassFactory> = Arc::new(move |props: &Props| {
            factory(props).map(|object| Arc::new(object) as Arc<dyn Any + Send + Sync>)
        });
        self.classes.insert(name.into(), factory);
        self
    }

    /// Registers a function invoked by `{"@@function": name, ...}` descriptors.
    pub fn register_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&Props) -> Result<Converted, ConvertError> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
        self
    }

    pub fn with_constant(mut self, name: impl Into<String>, value: impl Into<Converted>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    pub fn with_enumeration<K, V>(mut self, name: impl Into<String>, members: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Converted>,
    {
        let members = members.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.enumerations.insert(name.into(), members);
        self
    }

    pub fn with_convert_function<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str, &Configuration) -> Result<Converted, ConvertError> + Send + Sync + 'static,
    {
        let f: Arc<ConvertFunction> = Arc::new(f);
        self.convert_function = Some(f);
        self
    }

    pub fn with_pre_process_class<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, Props) -> Props + Send + Sync + 'static,
    {
        self.pre_process_class = Arc::new(f);
        self
    }

    pub fn with_post_process_class<F>(mut self, f: F) -> Self
    where
        F: Fn(Instance, &Props) -> Instance + Send + Sync + 'static,
    {
        self.post_process_class = Arc::new(f);
        self
    }

    pub fn with_post_process_converted_json<F>(mut self, f: F) -> Self
    where
        F: Fn(Converted) -> Converted + Send + Sync + 'static,
    {
        self.post_process_converted_json = Arc::new(f);
        self
    }

    pub fn with_unregistered_classes(mut self, policy: UnregisteredClassPolicy) -> Self {
        self.unregistered_classes = policy;
        self
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("type_key", &self.type_key)
            .field("function_key", &self.function_key)
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("constants", &self.constants)
            .field("enumerations", &self.enumerations)
            .field("convert_function", &self.convert_function.is_some())
            .field("unregistered_classes", &self.unregistered_classes)
            .finish()
    }
}

impl TryFrom<ConverterOptions> for Configuration {
    type Error = ConvertError;

    fn try_from(options: ConverterOptions) -> Result<Self, Self::Error> {
        Configuration::from_options(options)
    }
}

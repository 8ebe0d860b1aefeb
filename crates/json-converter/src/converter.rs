//! The stateful converter facade.
//!
//! [`JsonConverter`] owns a configuration and remembers the last document it
//! converted together with the result. Converting the same document again
//! returns the remembered result without walking the document.

use crate::configuration::{Configuration, ConverterOptions};
use crate::convert::convert_json;
use crate::error::ConvertError;
use crate::value::Converted;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, dispatcher, Dispatch};

/// Parses JSON text into a document.
pub fn parse_json(text: &str) -> Result<Value, ConvertError> {
    Ok(serde_json::from_str(text)?)
}

/// Input to [`JsonConverter::convert`].
///
/// Parsed documents are compared by identity (`Arc::ptr_eq`), so pass the
/// same `Arc` to hit the cache. Text is compared by content.
#[derive(Debug, Clone, Default)]
pub enum Document {
    /// No new input: the cached result is returned.
    #[default]
    Empty,
    Parsed(Arc<Value>),
    Text(Arc<str>),
}

impl Document {
    /// Absent input, empty text and a `null` document all count as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Document::Empty => true,
            Document::Parsed(value) => value.is_null(),
            Document::Text(text) => text.is_empty(),
        }
    }

    /// Whether `self` is the very same input as `other`.
    pub fn is_same(&self, other: &Document) -> bool {
        match (self, other) {
            (Document::Parsed(a), Document::Parsed(b)) => Arc::ptr_eq(a, b),
            (Document::Text(a), Document::Text(b)) => a == b,
            _ => false,
        }
    }

    fn to_value(&self) -> Result<Cow<'_, Value>, ConvertError> {
        match self {
            Document::Empty => Ok(Cow::Owned(Value::Null)),
            Document::Parsed(value) => Ok(Cow::Borrowed(value.as_ref())),
            Document::Text(text) => parse_json(text).map(Cow::Owned),
        }
    }
}

impl From<Value> for Document {
    fn from(value: Value) -> Self {
        Document::Parsed(Arc::new(value))
    }
}

impl From<Arc<Value>> for Document {
    fn from(value: Arc<Value>) -> Self {
        Document::Parsed(value)
    }
}

impl From<&Arc<Value>> for Document {
    fn from(value: &Arc<Value>) -> Self {
        Document::Parsed(Arc::clone(value))
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Document::Text(text.into())
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Document::Text(text.into())
    }
}

impl<T: Into<Document>> From<Option<T>> for Document {
    fn from(input: Option<T>) -> Self {
        input.map_or(Document::Empty, Into::into)
    }
}

/// Callback stored for the host to call when its document changes. The
/// converter never calls it.
pub type OnJsonChange = dyn Fn(&Value) + Send + Sync;

/// A configuration as accepted by [`JsonConverter::set_props`]: either
/// built already or still in declarative form.
pub enum ConfigurationInput {
    Built(Arc<Configuration>),
    Options(ConverterOptions),
}

impl ConfigurationInput {
    fn into_configuration(self) -> Result<Arc<Configuration>, ConvertError> {
        match self {
            ConfigurationInput::Built(configuration) => {
                configuration.validate()?;
                Ok(configuration)
            }
            ConfigurationInput::Options(options) => Configuration::from_options(options).map(Arc::new),
        }
    }
}

impl From<Configuration> for ConfigurationInput {
    fn from(configuration: Configuration) -> Self {
        ConfigurationInput::Built(Arc::new(configuration))
    }
}

impl From<Arc<Configuration>> for ConfigurationInput {
    fn from(configuration: Arc<Configuration>) -> Self {
        ConfigurationInput::Built(configuration)
    }
}

impl From<ConverterOptions> for ConfigurationInput {
    fn from(options: ConverterOptions) -> Self {
        ConfigurationInput::Options(options)
    }
}

/// Options recognized by [`JsonConverter::set_props`]. Unset fields leave the
/// current value alone.
#[derive(Default)]
pub struct ConverterProps {
    pub configuration: Option<ConfigurationInput>,
    pub on_json_change: Option<Arc<OnJsonChange>>,
}

impl ConverterProps {
    pub fn with_configuration(mut self, configuration: impl Into<ConfigurationInput>) -> Self {
        self.configuration = Some(configuration.into());
        self
    }

    pub fn with_on_json_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let f: Arc<OnJsonChange> = Arc::new(f);
        self.on_json_change = Some(f);
        self
    }
}

/// Converts documents against a held configuration, caching the last result.
///
/// `convert` takes `&mut self`; callers sharing a converter across threads
/// must serialize access themselves.
pub struct JsonConverter {
    configuration: Arc<Configuration>,
    on_json_change: Option<Arc<OnJsonChange>>,
    logger: Option<Dispatch>,
    json: Document,
    converted_json: Option<Arc<Converted>>,
}

impl JsonConverter {
    pub fn new(props: ConverterProps) -> Result<Self, ConvertError> {
        let mut converter = JsonConverter::with_configuration(Configuration::new());
        converter.set_props(props)?;
        Ok(converter)
    }

    pub fn with_configuration(configuration: impl Into<Arc<Configuration>>) -> Self {
        JsonConverter {
            configuration: configuration.into(),
            on_json_change: None,
            logger: None,
            json: Document::Empty,
            converted_json: None,
        }
    }

    /// Routes this converter's log output to `dispatch` instead of the
    /// global subscriber.
    pub fn with_logger(mut self, dispatch: Dispatch) -> Self {
        self.logger = Some(dispatch);
        self
    }

    /// Merges recognized props. A declarative configuration is normalized
    /// (and validated) first; on error nothing is changed.
    pub fn set_props(&mut self, props: ConverterProps) -> Result<(), ConvertError> {
        if let Some(configuration) = props.configuration {
            self.configuration = configuration.into_configuration()?;
        }
        if let Some(on_json_change) = props.on_json_change {
            self.on_json_change = Some(on_json_change);
        }
        Ok(())
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn on_json_change(&self) -> Option<&Arc<OnJsonChange>> {
        self.on_json_change.as_ref()
    }

    /// The last successfully converted result, if any.
    pub fn converted_json(&self) -> Option<&Arc<Converted>> {
        self.converted_json.as_ref()
    }

    /// Converts `json`, or returns the cached result when `json` is empty or
    /// the same input as last time.
    ///
    /// Returns `None` only when nothing has been converted yet. On error the
    /// cache is left as it was.
    pub fn convert(&mut self, json: impl Into<Document>) -> Result<Option<Arc<Converted>>, ConvertError> {
        let json = json.into();
        let converted = match &self.logger {
            Some(dispatch) => dispatcher::with_default(dispatch, || self.convert_uncached(&json)),
            None => self.convert_uncached(&json),
        }?;
        if let Some(converted) = converted {
            self.json = json;
            self.converted_json = Some(converted);
        }
        Ok(self.converted_json.clone())
    }

    fn convert_uncached(&self, json: &Document) -> Result<Option<Arc<Converted>>, ConvertError> {
        if json.is_empty() || json.is_same(&self.json) {
            debug!(cached = self.converted_json.is_some(), "reusing previous conversion");
            return Ok(None);
        }
        let document = json.to_value()?;
        debug!(type_key = %self.configuration.type_key, "converting document");
        let converted = convert_json(&document, &self.configuration)?;
        let converted = (self.configuration.post_process_converted_json)(converted);
        Ok(Some(Arc::new(converted)))
    }
}

impl fmt::Debug for JsonConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonConverter")
            .field("configuration", &self.configuration)
            .field("json", &self.json)
            .field("converted_json", &self.converted_json)
            .finish()
    }
}

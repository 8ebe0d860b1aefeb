use crate::error::ConvertError;
use crate::tag::{DEFAULT_TYPE_KEY, FUNCTION_IDENTIFIER};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Converted fields of an object, in document order. Also the argument set
/// handed to class factories and registered functions.
pub type Props = IndexMap<String, Converted>;

/// Signature of a resolved function reference.
pub type CallFn = dyn Fn(&Converted) -> Result<Converted, ConvertError> + Send + Sync;

/// A function produced while converting, e.g. from a `"@@=..."` string.
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    f: Arc<CallFn>,
}

impl Callable {
    pub fn new<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&Converted) -> Result<Converted, ConvertError> + Send + Sync + 'static,
    {
        Callable {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// The expression or registry name this function was resolved from.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, arg: &Converted) -> Result<Converted, ConvertError> {
        (self.f)(arg)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name)
    }
}

/// Two callables are equal only if they share the same closure.
impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.f, &other.f)
    }
}

/// An object built by a registered class factory.
///
/// The concrete type is erased; callers recover it with [`Instance::downcast_ref`].
#[derive(Clone)]
pub struct Instance {
    type_name: Arc<str>,
    object: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, object: T) -> Self {
        Instance::from_arc(type_name, Arc::new(object))
    }

    pub fn from_arc(type_name: impl Into<Arc<str>>, object: Arc<dyn Any + Send + Sync>) -> Self {
        Instance {
            type_name: type_name.into(),
            object,
        }
    }

    /// The type name the instance was registered under.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.object.is::<T>()
    }

    /// Shared handle to the underlying object.
    pub fn object(&self) -> &Arc<dyn Any + Send + Sync> {
        &self.object
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.type_name)
    }
}

/// Instances compare by identity.
impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}

/// The output of a conversion.
///
/// Mirrors the shape of [`serde_json::Value`], extended with the two kinds
/// of live values a document can resolve to.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Converted {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Converted>),
    Object(Props),
    /// A resolved function reference.
    Function(Callable),
    /// An object produced by a class factory.
    Instance(Instance),
}

impl Converted {
    pub fn is_null(&self) -> bool {
        matches!(self, Converted::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Converted::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Converted::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Converted::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Converted::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Converted>> {
        match self {
            Converted::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Props> {
        match self {
            Converted::Object(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Callable> {
        match self {
            Converted::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Converted::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Field lookup on an object; `None` for anything else.
    pub fn get(&self, key: &str) -> Option<&Converted> {
        self.as_object().and_then(|props| props.get(key))
    }

    /// Downcasts an instance to its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_instance().and_then(Instance::downcast_ref::<T>)
    }

    /// Converts back to a plain JSON value. Returns `None` if the tree holds
    /// a function or an instance anywhere.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Converted::Null => Some(Value::Null),
            Converted::Bool(b) => Some(Value::Bool(*b)),
            Converted::Number(n) => Some(Value::Number(n.clone())),
            Converted::String(s) => Some(Value::String(s.clone())),
            Converted::Array(items) => items
                .iter()
                .map(Converted::to_json)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Converted::Object(props) => props
                .iter()
                .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                .collect::<Option<serde_json::Map<_, _>>>()
                .map(Value::Object),
            Converted::Function(_) | Converted::Instance(_) => None,
        }
    }
}

/// Plain structural conversion; no tags are interpreted.
impl From<Value> for Converted {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Converted::Null,
            Value::Bool(b) => Converted::Bool(b),
            Value::Number(n) => Converted::Number(n),
            Value::String(s) => Converted::String(s),
            Value::Array(items) => Converted::Array(items.into_iter().map(Converted::from).collect()),
            Value::Object(map) => Converted::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Converted::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Converted {
    fn from(b: bool) -> Self {
        Converted::Bool(b)
    }
}

/// Non-finite floats become `Null`, as in JSON.
impl From<f64> for Converted {
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Converted::Null, Converted::Number)
    }
}

impl From<i64> for Converted {
    fn from(n: i64) -> Self {
        Converted::Number(Number::from(n))
    }
}

impl From<String> for Converted {
    fn from(s: String) -> Self {
        Converted::String(s)
    }
}

impl From<&str> for Converted {
    fn from(s: &str) -> Self {
        Converted::String(s.to_string())
    }
}

impl From<Vec<Converted>> for Converted {
    fn from(items: Vec<Converted>) -> Self {
        Converted::Array(items)
    }
}

impl From<Props> for Converted {
    fn from(props: Props) -> Self {
        Converted::Object(props)
    }
}

impl From<Callable> for Converted {
    fn from(f: Callable) -> Self {
        Converted::Function(f)
    }
}

impl From<Instance> for Converted {
    fn from(i: Instance) -> Self {
        Converted::Instance(i)
    }
}

/// Functions serialize as their tagged source string and instances as a
/// descriptor stub carrying only the type name under `"@@type"`. Use
/// [`Converted::with_type_key`] to write instances under a configured key.
impl Serialize for Converted {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with_type_key(DEFAULT_TYPE_KEY).serialize(serializer)
    }
}

impl Converted {
    /// Serializable view writing instance stubs under `type_key`.
    ///
    /// ```
    /// use json_converter::{Converted, Instance};
    /// use serde_json::json;
    ///
    /// let point = Converted::Instance(Instance::new("Point", ()));
    /// let out = serde_json::to_value(point.with_type_key("type")).unwrap();
    /// assert_eq!(out, json!({"type": "Point"}));
    /// ```
    pub fn with_type_key<'a>(&'a self, type_key: &'a str) -> WithTypeKey<'a> {
        WithTypeKey { value: self, type_key }
    }
}

/// See [`Converted::with_type_key`].
#[derive(Debug, Clone, Copy)]
pub struct WithTypeKey<'a> {
    value: &'a Converted,
    type_key: &'a str,
}

impl Serialize for WithTypeKey<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Converted::Null => serializer.serialize_unit(),
            Converted::Bool(b) => serializer.serialize_bool(*b),
            Converted::Number(n) => n.serialize(serializer),
            Converted::String(s) => serializer.serialize_str(s),
            Converted::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&item.with_type_key(self.type_key))?;
                }
                seq.end()
            }
            Converted::Object(props) => {
                let mut map = serializer.serialize_map(Some(props.len()))?;
                for (k, v) in props {
                    map.serialize_entry(k, &v.with_type_key(self.type_key))?;
                }
                map.end()
            }
            Converted::Function(f) => serializer.serialize_str(&format!("{}{}", FUNCTION_IDENTIFIER, f.name())),
            Converted::Instance(i) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(self.type_key, i.type_name())?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Marker(u8);

    #[test]
    fn test_from_value_keeps_order() {
        let v = json!({"z": 1, "a": [true, null, "s"], "m": {"k": 2.5}});
        let c = Converted::from(v.clone());
        let keys: Vec<_> = c.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
        assert_eq!(c.to_json(), Some(v));
    }

    #[test]
    fn test_to_json_rejects_live_values() {
        let f = Callable::new("id", |x| Ok(x.clone()));
        let tree = Converted::Array(vec![Converted::from(1i64), Converted::Function(f)]);
        assert_eq!(tree.to_json(), None);

        let inst = Converted::Instance(Instance::new("Marker", Marker(1)));
        assert_eq!(inst.to_json(), None);
    }

    #[test]
    fn test_instance_downcast_and_identity() {
        let a = Instance::new("Marker", Marker(7));
        let b = a.clone();
        let c = Instance::new("Marker", Marker(7));
        assert_eq!(a.downcast_ref::<Marker>(), Some(&Marker(7)));
        assert!(a.downcast_ref::<String>().is_none());
        assert!(a.is::<Marker>());
        assert_eq!(a.type_name(), "Marker");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_callable_call() {
        let double = Callable::new("double", |x| {
            Ok(Converted::from(x.as_f64().unwrap_or(0.0) * 2.0))
        });
        assert_eq!(double.call(&Converted::from(21i64)).unwrap().as_f64(), Some(42.0));
        assert_eq!(double.name(), "double");
        assert_eq!(double, double.clone());
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(Converted::from(f64::NAN).is_null());
        assert!(Converted::from(f64::INFINITY).is_null());
    }

    #[test]
    fn test_serialize() {
        let mut props = Props::new();
        props.insert("n".to_string(), Converted::from(1i64));
        props.insert("f".to_string(), Converted::Function(Callable::new("x.y", |x| Ok(x.clone()))));
        props.insert("i".to_string(), Converted::Instance(Instance::new("Marker", Marker(0))));
        let out = serde_json::to_value(Converted::Object(props)).unwrap();
        assert_eq!(out, json!({"n": 1, "f": "@@=x.y", "i": {"@@type": "Marker"}}));
    }

    #[test]
    fn test_serialize_with_type_key() {
        let mut props = Props::new();
        props.insert("inner".to_string(), Converted::Instance(Instance::new("Marker", Marker(2))));
        let tree = Converted::Array(vec![
            Converted::Instance(Instance::new("Marker", Marker(1))),
            Converted::from(json!({"nested": null})),
            Converted::Object(props),
        ]);
        let out = serde_json::to_value(tree.with_type_key("type")).unwrap();
        assert_eq!(out, json!([{"type": "Marker"}, {"nested": null}, {"inner": {"type": "Marker"}}]));
    }
}

// used for the sorted map variant
use std::collections::BTreeMap;
// used to print out readable forms of a value
use std::fmt;
// callables are shared between the template and every instance built from it
use std::sync::Arc;

// used to expose data values to serde based formats
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as Json;

// our own stuff that we need
use crate::error::{BuilderError, Result};
use crate::instance::{Instance, Receiver};

type Body = dyn Fn(&Receiver, &[Value]) -> Result<Value> + Send + Sync;

// ------------- Callable -------------
/// A callable member. The receiver it gets at invocation time is the only
/// way it can reach the state of the instance it runs on.
#[derive(Clone)]
pub struct Callable(Arc<Body>);

impl Callable {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(body))
    }
    /// Does nothing and returns `Undefined`. This is the default initializer.
    pub fn noop() -> Self {
        Self::new(|_, _| Ok(Value::Undefined))
    }
    pub(crate) fn invoke(&self, receiver: &Receiver, args: &[Value]) -> Result<Value> {
        (self.0)(receiver, args)
    }
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

// ------------- Value -------------
/// A member value. Data variants are copied when cloned, while `Function`
/// and `Object` are references and clones point at the same callable or
/// instance.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Function(Callable),
    /// A shared handle to another instance. Storing an instance inside itself
    /// keeps it alive until the slot is cleared.
    Object(Instance),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
        }
    }
    pub fn function<F>(body: F) -> Self
    where
        F: Fn(&Receiver, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Value::Function(Callable::new(body))
    }
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_))
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
    /// Integers widen to floats here, the reverse never happens implicitly.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }
    // The expect_* family is meant for use inside callables, where a wrong
    // kind should surface as an error through `?`.
    pub fn expect_bool(&self) -> Result<bool> {
        self.as_bool().ok_or_else(|| self.mismatch("bool"))
    }
    pub fn expect_int(&self) -> Result<i64> {
        self.as_i64().ok_or_else(|| self.mismatch("int"))
    }
    pub fn expect_float(&self) -> Result<f64> {
        self.as_f64().ok_or_else(|| self.mismatch("float"))
    }
    pub fn expect_str(&self) -> Result<&str> {
        self.as_str().ok_or_else(|| self.mismatch("string"))
    }
    pub fn expect_instance(&self) -> Result<&Instance> {
        self.as_instance().ok_or_else(|| self.mismatch("object"))
    }
    fn mismatch(&self, expected: &'static str) -> BuilderError {
        BuilderError::Type {
            expected,
            found: self.type_name(),
        }
    }
    /// Converts into JSON. Functions have no JSON form and are rejected.
    pub fn to_json(&self) -> Result<Json> {
        serde_json::to_value(self).map_err(|e| BuilderError::Execution(e.to_string()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(l) => {
                let items: Vec<String> = l.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Map(m) => {
                let entries: Vec<String> = m.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", entries.join(", "))
            }
            Value::Function(_) => write!(f, "<function>"),
            Value::Object(o) => write!(f, "<object {}>", o.factory_id()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Undefined | Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) => serializer.serialize_f64(*x),
            Value::Str(s) => serializer.serialize_str(s),
            Value::List(l) => {
                let mut seq = serializer.serialize_seq(Some(l.len()))?;
                for item in l {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Function(_) => Err(S::Error::custom("functions cannot be serialized")),
            Value::Object(o) => o.serialize(serializer),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(a) => Value::List(a.into_iter().map(Value::from).collect()),
            Json::Object(o) => Value::Map(o.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self { Value::Bool(b) }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self { Value::Int(i) }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self { Value::Int(i64::from(i)) }
}
impl From<u32> for Value {
    fn from(i: u32) -> Self { Value::Int(i64::from(i)) }
}
impl From<f64> for Value {
    fn from(x: f64) -> Self { Value::Float(x) }
}
impl From<&str> for Value {
    fn from(s: &str) -> Self { Value::Str(s.to_owned()) }
}
impl From<String> for Value {
    fn from(s: String) -> Self { Value::Str(s) }
}
impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self { Value::List(l) }
}
impl From<BTreeMap<String, Value>> for Value {
    fn from(m: BTreeMap<String, Value>) -> Self { Value::Map(m) }
}
impl From<Callable> for Value {
    fn from(f: Callable) -> Self { Value::Function(f) }
}
impl From<Instance> for Value {
    fn from(o: Instance) -> Self { Value::Object(o) }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(o: Option<T>) -> Self {
        o.map_or(Value::Null, Into::into)
    }
}

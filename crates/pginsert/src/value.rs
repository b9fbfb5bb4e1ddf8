//! Field values and SQL fragments.
//!
//! A record field is handed to the compiler as a [`Value`] plus a zero flag (see
//! [`ToValue::is_zero`]). The zero flag drives the `DEFAULT` policy; the value drives the
//! rendered literal.

use std::borrow::Cow;

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

/// A typed field value, ready to be rendered as a SQL literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Exact numeric rendered unquoted (e.g. from `rust_decimal`).
    Numeric(String),
    Text(String),
    Bytes(Bytes),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    NaiveTimestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(serde_json::Value),
    Array(Vec<Value>),
    /// A value rendered by a formatter registered under `kind`.
    ///
    /// Used for literal types the core does not know about (geometry, vectors, ...).
    Custom {
        kind: Cow<'static, str>,
        inner: Box<Value>,
    },
    /// Caller-supplied SQL text, rendered as-is (after placeholder substitution).
    Fragment(Fragment),
}

impl Value {
    /// Create a custom value rendered by the formatter registered under `kind`.
    pub fn custom(kind: impl Into<Cow<'static, str>>, inner: impl ToValue) -> Self {
        Value::Custom {
            kind: kind.into(),
            inner: Box::new(inner.to_value()),
        }
    }

    /// Whether this value equals the zero value of its type.
    ///
    /// Custom values and fragments are never zero.
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(v) => !v,
            Value::Int(v) => *v == 0,
            Value::UInt(v) => *v == 0,
            Value::Float(v) => *v == 0.0,
            Value::Numeric(v) => v
                .trim_start_matches(['-', '+'])
                .chars()
                .all(|c| c == '0' || c == '.'),
            Value::Text(v) => v.is_empty(),
            Value::Bytes(v) => v.is_empty(),
            Value::Uuid(v) => v.is_nil(),
            Value::Timestamp(v) => *v == DateTime::<Utc>::default(),
            Value::NaiveTimestamp(v) => *v == NaiveDateTime::default(),
            Value::Date(v) => *v == NaiveDate::default(),
            Value::Time(v) => *v == NaiveTime::default(),
            Value::Json(v) => v.is_null(),
            Value::Array(v) => v.is_empty(),
            Value::Custom { .. } | Value::Fragment(_) => false,
        }
    }

    /// Short name of the value's variant, for error messages.
    pub fn kind(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Numeric(_) => "numeric",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Timestamp(_) => "timestamptz",
            Value::NaiveTimestamp(_) => "timestamp",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Json(_) => "json",
            Value::Array(_) => "array",
            Value::Custom { kind, .. } => kind.as_ref(),
            Value::Fragment(_) => "fragment",
        }
    }
}

/// A piece of caller-supplied SQL text with optional bound values.
///
/// Each `?` outside a single-quoted literal is replaced by the next bound value, rendered
/// as a SQL literal. Placeholders without a bound value stay as `?`.
///
/// # Example
/// ```ignore
/// use pginsert::Fragment;
///
/// let f = Fragment::new("my_func(?)").bind("param");
/// // renders as: my_func('param')
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    sql: String,
    args: Vec<Value>,
}

impl Fragment {
    /// Create a fragment from a template.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
        }
    }

    /// Create a fragment that is rendered verbatim.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql)
    }

    /// Bind the value for the next `?` placeholder.
    pub fn bind(mut self, value: impl ToValue) -> Self {
        self.args.push(value.to_value());
        self
    }

    /// The template text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The bound values, in placeholder order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

impl From<&str> for Fragment {
    fn from(sql: &str) -> Self {
        Fragment::new(sql)
    }
}

impl From<String> for Fragment {
    fn from(sql: String) -> Self {
        Fragment::new(sql)
    }
}

impl From<&String> for Fragment {
    fn from(sql: &String) -> Self {
        Fragment::new(sql.as_str())
    }
}

/// Conversion of a Rust field into a [`Value`].
///
/// `is_zero` decides whether the field may be rendered as `DEFAULT`: a field is zero when
/// it equals its type's `Default`. `Option<T>` is zero only when `None`.
pub trait ToValue {
    fn to_value(&self) -> Value;

    fn is_zero(&self) -> bool {
        self.to_value().is_zero()
    }

    /// Convert a `Vec<Self>`; an array literal unless overridden (`u8` yields bytes).
    #[doc(hidden)]
    fn vec_to_value(items: &[Self]) -> Value
    where
        Self: Sized,
    {
        Value::Array(items.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }

    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        T::vec_to_value(self)
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for Fragment {
    fn to_value(&self) -> Value {
        Value::Fragment(self.clone())
    }

    fn is_zero(&self) -> bool {
        false
    }
}

macro_rules! impl_to_value {
    ($($ty:ty => |$v:ident| $body:expr;)*) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    let $v = self;
                    $body
                }
            }
        )*
    };
}

impl_to_value! {
    bool => |v| Value::Bool(*v);
    i8 => |v| Value::Int(i64::from(*v));
    i16 => |v| Value::Int(i64::from(*v));
    i32 => |v| Value::Int(i64::from(*v));
    i64 => |v| Value::Int(*v);
    u16 => |v| Value::UInt(u64::from(*v));
    u32 => |v| Value::UInt(u64::from(*v));
    u64 => |v| Value::UInt(*v);
    usize => |v| Value::UInt(*v as u64);
    f32 => |v| Value::Float(widen_f32(*v));
    f64 => |v| Value::Float(*v);
    str => |v| Value::Text(v.to_string());
    String => |v| Value::Text(v.clone());
    Bytes => |v| Value::Bytes(v.clone());
    Uuid => |v| Value::Uuid(*v);
    DateTime<Utc> => |v| Value::Timestamp(*v);
    NaiveDateTime => |v| Value::NaiveTimestamp(*v);
    NaiveDate => |v| Value::Date(*v);
    NaiveTime => |v| Value::Time(*v);
    serde_json::Value => |v| Value::Json(v.clone());
}

impl ToValue for u8 {
    fn to_value(&self) -> Value {
        Value::UInt(u64::from(*self))
    }

    fn vec_to_value(items: &[Self]) -> Value {
        Value::Bytes(Bytes::copy_from_slice(items))
    }
}

/// Widen through the shortest `f32` decimal so `0.1f32` renders as `0.1`.
fn widen_f32(v: f32) -> f64 {
    if v.is_finite() {
        v.to_string().parse().unwrap_or(f64::from(v))
    } else {
        f64::from(v)
    }
}

#[cfg(feature = "rust_decimal")]
impl ToValue for rust_decimal::Decimal {
    fn to_value(&self) -> Value {
        Value::Numeric(self.to_string())
    }

    fn is_zero(&self) -> bool {
        rust_decimal::Decimal::is_zero(self)
    }
}

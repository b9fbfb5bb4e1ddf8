//! Value formatting: field values to SQL literal text.
//!
//! [`Formatter`] renders every [`Value`] variant the core knows about and delegates
//! [`Value::Custom`] values to formatters registered by kind. It also decides, per column,
//! whether a zero field becomes the `DEFAULT` keyword.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{OrmError, OrmResult};
use crate::record::FieldValue;
use crate::schema::Column;
use crate::value::{Fragment, Value};

/// The reserved keyword emitted for columns left to the server default.
pub const DEFAULT_KEYWORD: &str = "DEFAULT";

/// A literal builder for one [`Value::Custom`] kind.
///
/// Implemented for closures `Fn(&Value, &mut String) -> Result<(), String>`; the error
/// string becomes the message of an `UnsupportedValue` error.
pub trait LiteralFormat: Send + Sync {
    /// Append the literal for the custom value's inner value.
    fn append_literal(&self, inner: &Value, out: &mut String) -> Result<(), String>;
}

impl<F> LiteralFormat for F
where
    F: Fn(&Value, &mut String) -> Result<(), String> + Send + Sync,
{
    fn append_literal(&self, inner: &Value, out: &mut String) -> Result<(), String> {
        self(inner, out)
    }
}

/// pgvector literal: an array of numbers rendered as `'[1,2,3]'`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorLiteral;

impl LiteralFormat for VectorLiteral {
    fn append_literal(&self, inner: &Value, out: &mut String) -> Result<(), String> {
        let Value::Array(items) = inner else {
            return Err(format!("vector expects an array, got {}", inner.kind()));
        };
        out.push_str("'[");
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match item {
                Value::Int(v) => write_display(out, v),
                Value::UInt(v) => write_display(out, v),
                Value::Float(v) if v.is_finite() => write_display(out, v),
                other => return Err(format!("vector element must be a finite number, got {}", other.kind())),
            }
        }
        out.push_str("]'");
        Ok(())
    }
}

/// A rendered column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    /// Literal text, or `DEFAULT`.
    pub sql: String,
    /// `false` when the column was left to the server default.
    pub explicit: bool,
}

impl Formatted {
    fn default_keyword() -> Self {
        Self {
            sql: DEFAULT_KEYWORD.to_string(),
            explicit: false,
        }
    }
}

/// Renders values as PostgreSQL literals.
///
/// Clone-friendly: custom formatters are shared behind `Arc`.
#[derive(Clone)]
pub struct Formatter {
    custom: HashMap<String, Arc<dyn LiteralFormat>>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.custom.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("Formatter").field("custom", &kinds).finish()
    }
}

impl Formatter {
    /// Create a formatter with the built-in custom kinds (`vector`).
    pub fn new() -> Self {
        Self::empty().register("vector", VectorLiteral)
    }

    /// Create a formatter with no custom kinds.
    pub fn empty() -> Self {
        Self {
            custom: HashMap::new(),
        }
    }

    /// Register a literal builder for a custom kind, replacing any previous one.
    pub fn register(mut self, kind: impl Into<String>, format: impl LiteralFormat + 'static) -> Self {
        self.custom.insert(kind.into(), Arc::new(format));
        self
    }

    /// Check if a custom kind has a registered literal builder.
    pub fn has_kind(&self, kind: &str) -> bool {
        self.custom.contains_key(kind)
    }

    /// Render a field for `column`: a literal, or `DEFAULT` for a zero field in a column
    /// that allows it.
    ///
    /// Custom values and fragments always render their own text.
    pub fn format(&self, field: &FieldValue, column: &Column) -> OrmResult<Formatted> {
        let appendable = matches!(field.value, Value::Custom { .. } | Value::Fragment(_));
        if !appendable && field.zero && column.skippable_default {
            return Ok(Formatted::default_keyword());
        }

        let mut sql = String::new();
        self.append_value(&mut sql, &field.value)
            .map_err(|message| OrmError::unsupported_value(&column.name, message))?;
        Ok(Formatted {
            sql,
            explicit: true,
        })
    }

    /// Append a caller-supplied fragment, substituting bound values for `?` placeholders.
    ///
    /// `clause` names the fragment in error messages.
    pub fn append_fragment(&self, out: &mut String, fragment: &Fragment, clause: &str) -> OrmResult<()> {
        self.append_fragment_inner(out, fragment)
            .map_err(|message| OrmError::unsupported_value(clause, message))
    }

    /// Render a single value as a SQL literal.
    pub fn literal(&self, value: &Value) -> Result<String, String> {
        let mut out = String::new();
        self.append_value(&mut out, value)?;
        Ok(out)
    }

    fn append_fragment_inner(&self, out: &mut String, fragment: &Fragment) -> Result<(), String> {
        let mut args = fragment.args().iter();
        let mut in_quote = false;
        for ch in fragment.sql().chars() {
            match ch {
                '\'' => {
                    in_quote = !in_quote;
                    out.push(ch);
                }
                '?' if !in_quote => match args.next() {
                    Some(arg) => self.append_value(out, arg)?,
                    None => out.push('?'),
                },
                _ => out.push(ch),
            }
        }
        Ok(())
    }

    fn append_value(&self, out: &mut String, value: &Value) -> Result<(), String> {
        match value {
            Value::Null => out.push_str("NULL"),
            Value::Bool(v) => out.push_str(if *v { "TRUE" } else { "FALSE" }),
            Value::Int(v) => write_display(out, v),
            Value::UInt(v) => write_display(out, v),
            Value::Float(v) => append_float(out, *v),
            Value::Numeric(v) => {
                if !is_numeric_text(v) {
                    return Err(format!("invalid numeric literal {v:?}"));
                }
                out.push_str(v);
            }
            Value::Array(items) => {
                let mut text = String::new();
                append_array(&mut text, items)?;
                append_text(out, &text)?;
            }
            Value::Custom { kind, inner } => {
                let Some(format) = self.custom.get(&**kind) else {
                    return Err(format!("no formatter registered for kind '{kind}'"));
                };
                format.append_literal(inner, out)?;
            }
            Value::Fragment(fragment) => self.append_fragment_inner(out, fragment)?,
            scalar => {
                let text = scalar_text(scalar)?;
                append_text(out, &text)?;
            }
        }
        Ok(())
    }
}

fn write_display(out: &mut String, v: impl std::fmt::Display) {
    let _ = write!(out, "{v}");
}

fn append_float(out: &mut String, v: f64) {
    if v.is_nan() {
        out.push_str("'NaN'");
    } else if v.is_infinite() {
        out.push_str(if v > 0.0 { "'Infinity'" } else { "'-Infinity'" });
    } else {
        write_display(out, v);
    }
}

fn is_numeric_text(s: &str) -> bool {
    let digits = s.trim_start_matches(['-', '+']);
    !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|c| *c == '.').count() <= 1
}

/// Append a single-quoted string literal, doubling embedded quotes.
fn append_text(out: &mut String, text: &str) -> Result<(), String> {
    if text.contains('\0') {
        return Err("text cannot contain NUL character".to_string());
    }
    out.reserve(text.len() + 2);
    out.push('\'');
    for ch in text.chars() {
        if ch == '\'' {
            out.push_str("''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    Ok(())
}

/// Textual form of a scalar that is rendered inside quotes.
fn scalar_text(value: &Value) -> Result<String, String> {
    let text = match value {
        Value::Text(v) => v.clone(),
        Value::Bytes(v) => {
            let mut s = String::with_capacity(2 + v.len() * 2);
            s.push_str("\\x");
            for b in v.iter() {
                let _ = write!(s, "{b:02x}");
            }
            s
        }
        Value::Uuid(v) => v.to_string(),
        Value::Timestamp(v) => v.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string(),
        Value::NaiveTimestamp(v) => v.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        Value::Date(v) => v.format("%Y-%m-%d").to_string(),
        Value::Time(v) => v.format("%H:%M:%S%.f").to_string(),
        Value::Json(v) => v.to_string(),
        other => return Err(format!("{} has no text form", other.kind())),
    };
    Ok(text)
}

/// Append the body of a PostgreSQL array literal (`{...}`), unquoted.
fn append_array(out: &mut String, items: &[Value]) -> Result<(), String> {
    out.push('{');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match item {
            Value::Null => out.push_str("NULL"),
            Value::Bool(v) => out.push(if *v { 't' } else { 'f' }),
            Value::Int(v) => write_display(out, v),
            Value::UInt(v) => write_display(out, v),
            Value::Float(v) if v.is_nan() => out.push_str("NaN"),
            Value::Float(v) if v.is_infinite() => {
                out.push_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Float(v) => write_display(out, v),
            Value::Numeric(v) => out.push_str(v),
            Value::Array(nested) => append_array(out, nested)?,
            Value::Custom { .. } | Value::Fragment(_) => {
                return Err(format!("{} cannot be an array element", item.kind()));
            }
            scalar => {
                let text = scalar_text(scalar)?;
                out.push('"');
                for ch in text.chars() {
                    if ch == '"' || ch == '\\' {
                        out.push('\\');
                    }
                    out.push(ch);
                }
                out.push('"');
            }
        }
    }
    out.push('}');
    Ok(())
}

//! Record model shared by every persisted entity.
//!
//! A [`Record`] carries a static [`Schema`] describing its table, its SQL
//! statements and its columns in canonical order. The generic store and the
//! update compiler only ever talk to records through this trait, so adding a
//! new entity means writing one `impl Record` and nothing else.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::FromRow;
use sqlx::postgres::PgRow;

use crate::domain::errors::DecodeError;

/// Type discriminator of a record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    User,
    Link,
    ShortLink,
}

impl RecordKind {
    /// Stable string tag of the variant.
    pub const fn tag(self) -> &'static str {
        match self {
            RecordKind::User => "user",
            RecordKind::Link => "link",
            RecordKind::ShortLink => "shortlink",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Returned when a tag does not name any known record variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record kind `{0}`")]
pub struct UnknownRecordKind(pub String);

impl FromStr for RecordKind {
    type Err = UnknownRecordKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(RecordKind::User),
            "link" => Ok(RecordKind::Link),
            "shortlink" => Ok(RecordKind::ShortLink),
            other => Err(UnknownRecordKind(other.to_string())),
        }
    }
}

/// A single typed column value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Converts a JSON scalar into a field value.
    ///
    /// Floats are accepted only when they carry no fractional part and fit
    /// in an `i64`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(FieldValue::Null),
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral_f64))
                .map(FieldValue::Int),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn integral_f64(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Text(v) => f.write_str(v),
            FieldValue::Bool(true) => f.write_str("true"),
            FieldValue::Bool(false) => f.write_str("false"),
            FieldValue::Null => f.write_str("NULL"),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(v: Option<i64>) -> Self {
        v.map_or(FieldValue::Null, FieldValue::Int)
    }
}

/// All fields of a record keyed by column name, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot(Vec<(&'static str, FieldValue)>);

impl Snapshot {
    pub fn new(fields: Vec<(&'static str, FieldValue)>) -> Self {
        Self(fields)
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.0.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.0.iter().map(|(c, v)| (*c, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Static description of how a record variant maps onto its table.
///
/// Every statement uses positional parameters; `insert` binds the values of
/// [`Record::create_values`] in order, `read` and `delete` bind the id and
/// `check` binds the values of [`Record::credentials`].
#[derive(Debug)]
pub struct Schema {
    pub kind: RecordKind,
    pub table: &'static str,
    pub id_column: &'static str,
    /// Every column, identity first, in canonical order.
    pub columns: &'static [&'static str],
    /// Columns accepted by `search`.
    pub searchable: &'static [&'static str],
    pub insert: &'static str,
    pub read: &'static str,
    pub list: &'static str,
    pub delete: &'static str,
    pub check: Option<&'static str>,
    /// Column-specific write expressions; `{}` stands for the bound parameter.
    pub write_exprs: &'static [(&'static str, &'static str)],
}

impl Schema {
    /// Looks up a searchable column, returning the schema's own `'static` name.
    pub fn searchable_column(&self, column: &str) -> Option<&'static str> {
        self.searchable.iter().copied().find(|c| *c == column)
    }

    /// Renders the value expression written into `column` for `placeholder`.
    pub fn write_expr(&self, column: &str, placeholder: &str) -> String {
        self.write_exprs
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, expr)| expr.replace("{}", placeholder))
            .unwrap_or_else(|| placeholder.to_string())
    }

    /// `SELECT` over all columns filtered by `column = $1`, ordered by id.
    /// `SELECT` matching `column` against `needle`. A null needle becomes
    /// `IS NULL` and binds no parameter.
    pub fn search_sql(&self, column: &'static str, needle: &FieldValue) -> String {
        let condition = match needle {
            FieldValue::Null => format!("{column} IS NULL"),
            _ => format!("{column} = $1"),
        };
        format!(
            "SELECT {} FROM {} WHERE {} ORDER BY {}",
            self.columns.join(", "),
            self.table,
            condition,
            self.id_column
        )
    }
}

/// A persisted entity that the generic store knows how to handle.
pub trait Record:
    Clone + fmt::Debug + Send + Sync + Unpin + 'static + for<'r> FromRow<'r, PgRow>
{
    const SCHEMA: &'static Schema;

    fn id(&self) -> i64;

    fn set_id(&mut self, id: i64);

    /// Values bound to the `insert` statement, in parameter order.
    fn create_values(&self) -> Vec<FieldValue>;

    /// Every field keyed by column name, identity included.
    fn snapshot(&self) -> Snapshot;

    /// Merges a sparse keyed update into the record.
    ///
    /// Unknown keys are ignored. If any supplied value has the wrong type the
    /// record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] naming the first field whose value does not fit.
    fn apply(&mut self, patch: &Map<String, Value>) -> Result<(), DecodeError>;

    /// Values bound to the `check` statement, if the variant supports it.
    fn credentials(&self) -> Option<Vec<FieldValue>> {
        None
    }

    fn kind(&self) -> RecordKind {
        Self::SCHEMA.kind
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(key: &str, expected: &str, found: &Value) -> DecodeError {
    DecodeError::new(
        key,
        format!("expected {expected}, found {}", json_type(found)),
    )
}

pub(crate) fn patch_text(
    patch: &Map<String, Value>,
    key: &str,
    target: &mut String,
) -> Result<(), DecodeError> {
    match patch.get(key) {
        None => Ok(()),
        Some(Value::String(s)) => {
            target.clone_from(s);
            Ok(())
        }
        Some(other) => Err(mismatch(key, "string", other)),
    }
}

pub(crate) fn patch_bool(
    patch: &Map<String, Value>,
    key: &str,
    target: &mut bool,
) -> Result<(), DecodeError> {
    match patch.get(key) {
        None => Ok(()),
        Some(Value::Bool(b)) => {
            *target = *b;
            Ok(())
        }
        Some(other) => Err(mismatch(key, "boolean", other)),
    }
}

pub(crate) fn patch_int(
    patch: &Map<String, Value>,
    key: &str,
    target: &mut i64,
) -> Result<(), DecodeError> {
    match patch.get(key) {
        None => Ok(()),
        Some(value) => match FieldValue::from_json(value) {
            Some(FieldValue::Int(v)) => {
                *target = v;
                Ok(())
            }
            _ => Err(mismatch(key, "integer", value)),
        },
    }
}

pub(crate) fn patch_opt_int(
    patch: &Map<String, Value>,
    key: &str,
    target: &mut Option<i64>,
) -> Result<(), DecodeError> {
    match patch.get(key) {
        None => Ok(()),
        Some(value) => match FieldValue::from_json(value) {
            Some(FieldValue::Int(v)) => {
                *target = Some(v);
                Ok(())
            }
            Some(FieldValue::Null) => {
                *target = None;
                Ok(())
            }
            _ => Err(mismatch(key, "integer or null", value)),
        },
    }
}

//! Raw values and data rows.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use geo_types::Geometry;
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde_json::Value;

/// The closed set of primitive values flowing through channels
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Null,
    Number(f64),
    Date(DateTime<Utc>),
    Bool(bool),
    String(String),
    /// Marker shape identity, e.g. "circle"
    Symbol(String),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// Neither null nor NaN
    pub fn is_defined(&self) -> bool {
        match self {
            RawValue::Null => false,
            RawValue::Number(n) => !n.is_nan(),
            _ => true,
        }
    }

    /// Numeric coercion. Dates become epoch milliseconds, numeric strings are
    /// parsed, anything else is NaN.
    pub fn to_f64(&self) -> f64 {
        match self {
            RawValue::Number(n) => *n,
            RawValue::Date(d) => d.timestamp_millis() as f64,
            RawValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            RawValue::String(s) => parse_number(s).unwrap_or(f64::NAN),
            RawValue::Null | RawValue::Symbol(_) => f64::NAN,
        }
    }

    /// Date coercion, accepting ISO 8601 strings
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            RawValue::Date(d) => Some(*d),
            RawValue::String(s) => parse_iso_date(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::String(s) | RawValue::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            RawValue::Null => false,
            RawValue::Number(n) => *n != 0.0 && !n.is_nan(),
            RawValue::Bool(b) => *b,
            RawValue::String(s) => !s.is_empty(),
            RawValue::Date(_) | RawValue::Symbol(_) => true,
        }
    }

    pub fn from_ms(ms: f64) -> RawValue {
        match avenger_scales::time::from_ms(ms) {
            Some(d) => RawValue::Date(d),
            None => RawValue::Null,
        }
    }

    /// A value of the same temporal kind as `self` holding `n`: dates stay
    /// dates, everything else becomes a number
    pub fn with_number(&self, n: f64) -> RawValue {
        if n.is_nan() {
            return RawValue::Null;
        }
        match self {
            RawValue::Date(_) => RawValue::from_ms(n),
            _ => RawValue::Number(n),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            RawValue::Number(_) => 0,
            RawValue::Date(_) => 1,
            RawValue::Bool(_) => 2,
            RawValue::String(_) => 3,
            RawValue::Symbol(_) => 4,
            RawValue::Null => 5,
        }
    }
}

/// Ascending order with undefined values (null, NaN) last
pub fn compare_defined(a: &RawValue, b: &RawValue) -> Ordering {
    match (a.is_defined(), b.is_defined()) {
        (false, false) => Ordering::Equal,
        (false, true) => Ordering::Greater,
        (true, false) => Ordering::Less,
        (true, true) => match (a, b) {
            (RawValue::Number(x), RawValue::Number(y)) => x.total_cmp(y),
            (RawValue::Date(x), RawValue::Date(y)) => x.cmp(y),
            (RawValue::Bool(x), RawValue::Bool(y)) => x.cmp(y),
            (RawValue::String(x), RawValue::String(y))
            | (RawValue::Symbol(x), RawValue::Symbol(y)) => x.cmp(y),
            _ => a.type_rank().cmp(&b.type_rank()),
        },
    }
}

/// Descending order, still with undefined values last
pub fn compare_defined_desc(a: &RawValue, b: &RawValue) -> Ordering {
    if a.is_defined() && b.is_defined() {
        compare_defined(b, a)
    } else {
        compare_defined(a, b)
    }
}

pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse RFC 3339 timestamps and plain `YYYY-MM-DD` dates as UTC
pub fn parse_iso_date(s: &str) -> Option<DateTime<Utc>> {
    let t = s.trim();
    if let Ok(d) = DateTime::parse_from_rfc3339(t) {
        return Some(d.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(d) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(d.and_utc());
        }
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}

impl Display for RawValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::String(s) | RawValue::Symbol(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<f32> for RawValue {
    fn from(value: f32) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<usize> for RawValue {
    fn from(value: usize) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::String(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::String(value)
    }
}

impl From<DateTime<Utc>> for RawValue {
    fn from(value: DateTime<Utc>) -> Self {
        RawValue::Date(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl From<&Value> for RawValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Bool(b) => RawValue::Bool(*b),
            Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or_default(),
            Value::String(s) => RawValue::String(s.clone()),
            Value::Null | Value::Array(_) | Value::Object(_) => RawValue::Null,
        }
    }
}

/// Hashable, totally ordered form of a RawValue used for grouping and
/// discrete domains. NaN collapses into Null.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Number(OrderedFloat<f64>),
    Date(i64),
    Bool(bool),
    String(String),
    Symbol(String),
    Null,
}

impl From<&RawValue> for GroupKey {
    fn from(value: &RawValue) -> Self {
        match value {
            RawValue::Number(n) if n.is_nan() => GroupKey::Null,
            RawValue::Number(n) => GroupKey::Number(OrderedFloat(*n)),
            RawValue::Date(d) => GroupKey::Date(d.timestamp_millis()),
            RawValue::Bool(b) => GroupKey::Bool(*b),
            RawValue::String(s) => GroupKey::String(s.clone()),
            RawValue::Symbol(s) => GroupKey::Symbol(s.clone()),
            RawValue::Null => GroupKey::Null,
        }
    }
}

impl From<&GroupKey> for RawValue {
    fn from(key: &GroupKey) -> Self {
        match key {
            GroupKey::Number(n) => RawValue::Number(n.0),
            GroupKey::Date(ms) => RawValue::from_ms(*ms as f64),
            GroupKey::Bool(b) => RawValue::Bool(*b),
            GroupKey::String(s) => RawValue::String(s.clone()),
            GroupKey::Symbol(s) => RawValue::Symbol(s.clone()),
            GroupKey::Null => RawValue::Null,
        }
    }
}

/// A record-shaped data row. Rows wrapped from bare scalars or tuples keep
/// the original datum so accessor functions see the unwrapped value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataRecord {
    fields: IndexMap<String, RawValue>,
    original: Option<Box<Datum>>,
    geometry: Option<Arc<Geometry<f64>>>,
}

impl DataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn fields(&self) -> &IndexMap<String, RawValue> {
        &self.fields
    }

    pub fn original(&self) -> Option<&Datum> {
        self.original.as_deref()
    }

    pub fn with_original(mut self, original: Datum) -> Self {
        self.original = Some(Box::new(original));
        self
    }

    pub fn geometry(&self) -> Option<&Geometry<f64>> {
        self.geometry.as_deref()
    }

    pub fn with_geometry(mut self, geometry: impl Into<Arc<Geometry<f64>>>) -> Self {
        self.geometry = Some(geometry.into());
        self
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for DataRecord {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            original: None,
            geometry: None,
        }
    }
}

/// One data row: a record, a bare tuple such as `[x, y]`, or a bare value
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Record(DataRecord),
    Tuple(Vec<RawValue>),
    Value(RawValue),
}

impl Datum {
    pub fn field(&self, name: &str) -> Option<&RawValue> {
        match self {
            Datum::Record(r) => r.get(name),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&DataRecord> {
        match self {
            Datum::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, Datum::Record(_))
    }

    /// The datum accessor functions receive: the original value for
    /// auto-wrapped rows, otherwise the row itself
    pub fn original(&self) -> &Datum {
        match self {
            Datum::Record(r) => r.original().unwrap_or(self),
            _ => self,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry<f64>> {
        match self {
            Datum::Record(r) => r
                .geometry()
                .or_else(|| r.original().and_then(|o| o.geometry())),
            _ => None,
        }
    }

    /// Attach a field, wrapping non-record rows into a record that keeps
    /// the original datum
    pub fn with_field(self, key: impl Into<String>, value: impl Into<RawValue>) -> Datum {
        match self {
            Datum::Record(r) => Datum::Record(r.with(key, value)),
            other => Datum::Record(DataRecord::new().with_original(other).with(key, value)),
        }
    }
}

impl From<DataRecord> for Datum {
    fn from(record: DataRecord) -> Self {
        Datum::Record(record)
    }
}

impl From<RawValue> for Datum {
    fn from(value: RawValue) -> Self {
        Datum::Value(value)
    }
}

impl From<&Value> for Datum {
    fn from(value: &Value) -> Self {
        match value {
            Value::Object(map) => Datum::Record(
                map.iter()
                    .map(|(k, v)| (k.clone(), RawValue::from(v)))
                    .collect(),
            ),
            Value::Array(items) => Datum::Tuple(items.iter().map(RawValue::from).collect()),
            scalar => Datum::Value(RawValue::from(scalar)),
        }
    }
}

/// Rows from a JSON array (a single non-array value becomes one row)
pub fn data_from_json(value: &Value) -> Vec<Datum> {
    match value {
        Value::Array(rows) => rows.iter().map(Datum::from).collect(),
        other => vec![Datum::from(other)],
    }
}

/// Build a record row from `key => value` pairs
#[macro_export]
macro_rules! record {
    ($($key:expr => $value:expr),* $(,)?) => {
        $crate::value::Datum::Record(
            $crate::value::DataRecord::new()$(.with($key, $value))*
        )
    };
}

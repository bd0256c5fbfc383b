use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Placeholder label used for null or missing grouping values
pub const NULL_LABEL: &str = "-";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("Input data must be a JSON array of objects")]
    NotAnArray,

    #[error("Items in array must be objects (item {0})")]
    NotAnObject(usize),

    #[error("Unsupported value type for field '{0}'")]
    UnsupportedValue(String),

    #[error("Query results must be a JSON object keyed by query name")]
    NotAResultMap,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A scalar field value of an aggregate row
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    Text(String),
    Number(f64),
    #[default]
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric reading of the value. Text is parsed when it looks like a number.
    /// Infinite and NaN readings count as non-numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let n = match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            Value::Null => None,
        };
        n.filter(|n| n.is_finite())
    }

    /// Display label for a grouping value, null becomes [`NULL_LABEL`]
    pub fn to_label(&self) -> String {
        match self {
            Value::Null => NULL_LABEL.to_string(),
            other => other.to_string(),
        }
    }

    fn from_json(field: &str, value: &JsonValue) -> Result<Self, DataError> {
        match value {
            JsonValue::String(s) => Ok(Value::Text(s.clone())),
            JsonValue::Number(n) => n
                .as_f64()
                .map(Value::Number)
                .ok_or_else(|| DataError::UnsupportedValue(field.to_string())),
            JsonValue::Bool(b) => Ok(Value::Text(b.to_string())),
            JsonValue::Null => Ok(Value::Null),
            _ => Err(DataError::UnsupportedValue(field.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            // f64 Display already prints 3.0 as "3"
            Value::Number(n) => write!(f, "{}", n),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One aggregated record, e.g. `{Status: "New", CaseCount: 4}`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Look up a field, exact name first, then ignoring ASCII case.
    /// Among several case-insensitive matches the smallest key wins.
    /// Missing fields read as null.
    pub fn get(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.lookup(field).unwrap_or(&NULL)
    }

    /// Whether the field is present at all, even if null
    pub fn contains(&self, field: &str) -> bool {
        self.lookup(field).is_some()
    }

    fn lookup(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).or_else(|| {
            self.fields
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case(field))
                .min_by(|a, b| a.0.cmp(b.0))
                .map(|(_, v)| v)
        })
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// A sequence of aggregate rows as returned by one backend query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowSet {
    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Create a RowSet from a JSON Array of Objects.
    /// An empty array is a valid (empty) result.
    pub fn from_json(value: &JsonValue) -> Result<Self, DataError> {
        let array = value.as_array().ok_or(DataError::NotAnArray)?;

        let mut rows = Vec::with_capacity(array.len());
        for (idx, item) in array.iter().enumerate() {
            let obj = item.as_object().ok_or(DataError::NotAnObject(idx))?;
            let mut row = Row::new();
            for (field, value) in obj {
                row.insert(field.clone(), Value::from_json(field, value)?);
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn from_json_str(input: &str) -> Result<Self, DataError> {
        let value: JsonValue = serde_json::from_str(input)?;
        Self::from_json(&value)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Parse a JSON object of `{ "<query name>": [rows...] }`
pub fn results_from_json_str(input: &str) -> Result<HashMap<String, RowSet>, DataError> {
    let value: JsonValue = serde_json::from_str(input)?;
    let obj = value.as_object().ok_or(DataError::NotAResultMap)?;

    let mut results = HashMap::with_capacity(obj.len());
    for (name, rows) in obj {
        results.insert(name.clone(), RowSet::from_json(rows)?);
    }
    Ok(results)
}

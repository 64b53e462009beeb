// src/models/table.rs - Lightweight typed table used between the warehouse, the cleaners and the linker
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Declared type of a table column. Decides which comparison a compare rule uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Int,
    Float,
    Bool,
    Category,
    DateTime,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Category => "category",
            ColumnType::DateTime => "datetime",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Key used for blocking and sorted-neighbour ranking. Nulls and NaN have no key.
    pub fn index_key(&self) -> Option<IndexKey> {
        match self {
            Value::Null => None,
            Value::Float(f) if f.is_nan() => None,
            other => Some(IndexKey(other.clone())),
        }
    }

    /// Coerce into `target`. Values that cannot be represented become `Null`.
    pub fn coerce(&self, target: ColumnType) -> Value {
        match (target, self) {
            (_, Value::Null) => Value::Null,
            (ColumnType::Text | ColumnType::Category, v) => Value::Text(v.to_string()),
            (ColumnType::Int, Value::Int(i)) => Value::Int(*i),
            (ColumnType::Int, Value::Float(f)) if f.is_finite() => Value::Int(f.trunc() as i64),
            (ColumnType::Int, Value::Bool(b)) => Value::Int(i64::from(*b)),
            (ColumnType::Int, Value::Text(s)) => parse_int(s).map_or(Value::Null, Value::Int),
            (ColumnType::Float, Value::Float(f)) => Value::Float(*f),
            (ColumnType::Float, Value::Int(i)) => Value::Float(*i as f64),
            (ColumnType::Float, Value::Bool(b)) => Value::Float(if *b { 1.0 } else { 0.0 }),
            (ColumnType::Float, Value::Text(s)) => {
                s.trim().parse::<f64>().map_or(Value::Null, Value::Float)
            }
            (ColumnType::Bool, Value::Bool(b)) => Value::Bool(*b),
            (ColumnType::Bool, Value::Int(i)) => Value::Bool(*i != 0),
            (ColumnType::Bool, Value::Text(s)) => match s.trim().to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Value::Bool(true),
                "false" | "f" | "no" | "n" | "0" => Value::Bool(false),
                _ => Value::Null,
            },
            (ColumnType::DateTime, Value::DateTime(dt)) => Value::DateTime(*dt),
            (ColumnType::DateTime, Value::Text(s)) => {
                parse_datetime(s).map_or(Value::Null, Value::DateTime)
            }
            _ => Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(x) if x.is_finite() => serializer.serialize_f64(*x),
            Value::Float(_) => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::DateTime(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
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

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// A non-null value ordered by its own type: numbers numerically (`Int` and `Float`
/// compare with each other), datetimes chronologically, text lexically. Values of
/// different kinds never compare equal.
#[derive(Debug, Clone)]
pub struct IndexKey(Value);

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_labels(&self.0, &other.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub col_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, col_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            col_type,
        }
    }
}

/// Named row labels. Plays the role of the business key when tables are joined.
#[derive(Debug, Clone, PartialEq)]
pub struct TableIndex {
    pub name: String,
    pub labels: Vec<Value>,
}

/// Column lists used to coerce a freshly queried table into its declared shape.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeManifest {
    pub str_cols: Vec<&'static str>,
    pub int_cols: Vec<&'static str>,
    pub float_cols: Vec<&'static str>,
    pub category_cols: Vec<&'static str>,
    pub datetime_cols: Vec<&'static str>,
}

impl ColumnTypeManifest {
    fn entries(&self) -> impl Iterator<Item = (&'static str, ColumnType)> + '_ {
        self.str_cols
            .iter()
            .map(|c| (*c, ColumnType::Text))
            .chain(self.int_cols.iter().map(|c| (*c, ColumnType::Int)))
            .chain(self.float_cols.iter().map(|c| (*c, ColumnType::Float)))
            .chain(self.category_cols.iter().map(|c| (*c, ColumnType::Category)))
            .chain(self.datetime_cols.iter().map(|c| (*c, ColumnType::DateTime)))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    index: Option<TableIndex>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            index: None,
        }
    }

    /// Build a table from `(name, type)` pairs and rows. Short rows are padded with nulls.
    pub fn from_rows(columns: &[(&str, ColumnType)], rows: Vec<Vec<Value>>) -> Self {
        let mut table = Self::new(
            columns
                .iter()
                .map(|(name, col_type)| Column::new(*name, *col_type))
                .collect(),
        );
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        if let Some(index) = self.index.as_mut() {
            index.labels.push(Value::Null);
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn index(&self) -> Option<&TableIndex> {
        self.index.as_ref()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_position(name).is_some()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_position(name).map(|pos| self.columns[pos].col_type)
    }

    /// Values of a column in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let pos = self.column_position(name)?;
        Some(self.rows.iter().map(|row| &row[pos]).collect())
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        let pos = self.column_position(name)?;
        self.rows.get(row).map(|r| &r[pos])
    }

    /// Append a column, or replace it in place when the name already exists.
    pub fn set_column(&mut self, name: &str, col_type: ColumnType, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_position(name) {
            Some(pos) => {
                self.columns[pos].col_type = col_type;
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[pos] = value;
                }
            }
            None => {
                self.columns.push(Column::new(name, col_type));
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// Prefix every column name (and the index name) with a dataset tag.
    pub fn add_prefix(&mut self, prefix: &str) {
        for column in &mut self.columns {
            column.name = format!("{}{}", prefix, column.name);
        }
        if let Some(index) = self.index.as_mut() {
            index.name = format!("{}{}", prefix, index.name);
        }
    }

    /// Copy `column` into a named index. The source column stays in the table.
    pub fn set_index(&mut self, column: &str, index_name: &str) -> anyhow::Result<()> {
        let pos = self
            .column_position(column)
            .ok_or_else(|| anyhow::anyhow!("Cannot index on missing column '{}'", column))?;
        let labels = self.rows.iter().map(|row| row[pos].clone()).collect();
        self.index = Some(TableIndex {
            name: index_name.to_string(),
            labels,
        });
        Ok(())
    }

    /// Stable sort of rows by index label. Null labels sort last.
    pub fn sort_index(&mut self) {
        let Some(index) = self.index.take() else {
            return;
        };
        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| compare_labels(&index.labels[a], &index.labels[b]));

        let mut rows: Vec<Option<Vec<Value>>> =
            std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        let mut labels: Vec<Option<Value>> = index.labels.into_iter().map(Some).collect();
        self.rows = order.iter().filter_map(|&i| rows[i].take()).collect();
        self.index = Some(TableIndex {
            name: index.name,
            labels: order.iter().filter_map(|&i| labels[i].take()).collect(),
        });
    }

    /// Coerce columns to the manifest's declared types. Unknown names are logged and skipped.
    pub fn convert_column_types(&mut self, manifest: &ColumnTypeManifest) {
        for (name, target) in manifest.entries() {
            let Some(pos) = self.column_position(name) else {
                debug!("Type manifest column '{}' not present, skipping", name);
                continue;
            };
            let mut nulled = 0usize;
            for row in &mut self.rows {
                let coerced = row[pos].coerce(target);
                if coerced.is_null() && !row[pos].is_null() {
                    nulled += 1;
                }
                row[pos] = coerced;
            }
            self.columns[pos].col_type = target;
            if nulled > 0 {
                warn!(
                    "⚠️  {} value(s) in column '{}' could not be coerced to {} and were nulled",
                    nulled,
                    name,
                    target.as_str()
                );
            }
        }
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Int(_) | Value::Float(_) => 0,
        Value::DateTime(_) => 1,
        Value::Bool(_) => 2,
        Value::Text(_) => 3,
        Value::Null => 4,
    }
}

/// Total order over values. Nulls sort last.
fn compare_labels(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => x.total_cmp(y),
        (Value::Int(x), Value::Float(y)) => (*x as f64).total_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.total_cmp(&(*y as f64)),
        (Value::DateTime(x), Value::DateTime(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (x, y) => kind_rank(x).cmp(&kind_rank(y)),
    }
}

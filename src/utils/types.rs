use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// Storage classes a generated column may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Text,
    Real,
    Blob,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "INTEGER"),
            ColumnType::Text => write!(f, "TEXT"),
            ColumnType::Real => write!(f, "REAL"),
            ColumnType::Blob => write!(f, "BLOB"),
        }
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INTEGER" => Ok(ColumnType::Integer),
            "TEXT" => Ok(ColumnType::Text),
            "REAL" => Ok(ColumnType::Real),
            "BLOB" => Ok(ColumnType::Blob),
            other => Err(format!("unrecognized column type: {}", other)),
        }
    }
}

/// A resolved column in a generated table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Opaque SQL fragment appended to the column declaration, may be empty
    #[serde(default)]
    pub constraints: String,
    #[serde(default)]
    pub description: String,
}

impl ColumnDef {
    /// Create a column with empty constraints and description
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            constraints: String::new(),
            description: String::new(),
        }
    }

    /// Attach a constraints fragment
    pub fn with_constraints(mut self, constraints: &str) -> Self {
        self.constraints = constraints.to_string();
        self
    }

    /// Attach a description
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Render the column as a DDL fragment, e.g. `id INTEGER PRIMARY KEY`
    pub fn ddl_fragment(&self) -> String {
        if self.constraints.is_empty() {
            format!("{} {}", self.name, self.column_type)
        } else {
            format!("{} {} {}", self.name, self.column_type, self.constraints)
        }
    }
}

/// Engine-facing scalar produced by coercing a stored value against its
/// declared column type
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl CellValue {
    /// Check whether the value is the SQL null
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

/// One generated row: loosely typed values keyed by column name. Keys are a
/// subset of the declared columns; an absent key reads as null.
pub type Row = Map<String, JsonValue>;

/// Immutable materialized rows for one table, shared read-only by every
/// cursor opened against it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    /// Create a row set from generated rows
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the row set is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get a row by position
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Borrow all rows
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}

/// Pushdown constraint offered by the host engine during scan planning
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConstraint {
    pub column: usize,
    pub op: ConstraintOp,
}

/// Constraint operators the host engine may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Like,
}

/// Ordering term offered by the host engine during scan planning
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub column: usize,
    pub descending: bool,
}

/// Answer to scan planning: which offered constraints the table will honor
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPlan {
    /// One entry per offered constraint; true means the table applies it
    pub constraint_usage: Vec<bool>,
    pub estimated_cost: f64,
    /// True if the scan already satisfies the requested ordering
    pub ordered: bool,
}

impl ScanPlan {
    /// Plan that honors nothing: every constraint is left to the host
    /// engine's post-filtering, at full-scan cost
    pub fn full_scan(constraint_count: usize) -> Self {
        Self {
            constraint_usage: vec![false; constraint_count],
            estimated_cost: 1_000_000.0,
            ordered: false,
        }
    }
}

/// Generator backend kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeneratorKind {
    OpenAi,
    Mock,
    Custom(String),
}

//! Metadata types describing introspected external schemas.

use serde::{Deserialize, Serialize};

/// Coarse column type classification.
///
/// External engines report vendor-specific type names; the planner only
/// cares whether a column is numeric (aggregation defaults) or temporal
/// (date bucketing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Decimal,
    Boolean,
    #[default]
    Text,
    Date,
    Timestamp,
    Other,
}

impl ColumnType {
    /// Whether SUM/AVG make sense on this column.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Float | ColumnType::Decimal
        )
    }

    /// Whether date bucketing makes sense on this column.
    pub fn is_temporal(&self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Timestamp)
    }

    /// Classify a vendor type name (e.g. `VARCHAR(255)`, `numeric(18,2)`,
    /// `TIMESTAMP WITH TIME ZONE`). Matching is substring-based and
    /// case-insensitive; unrecognized names map to `Other`.
    pub fn from_sql_type(raw: &str) -> Self {
        let t = raw.trim().to_lowercase();

        if t.contains("bool") {
            ColumnType::Boolean
        } else if t.contains("timestamp") || t.contains("datetime") {
            ColumnType::Timestamp
        } else if t.contains("date") {
            ColumnType::Date
        } else if t.contains("int") || t.contains("serial") {
            ColumnType::Integer
        } else if t.contains("decimal") || t.contains("numeric") || t.contains("money") {
            ColumnType::Decimal
        } else if t.contains("float") || t.contains("double") || t.contains("real") {
            ColumnType::Float
        } else if t.contains("char") || t.contains("text") || t.contains("string") {
            ColumnType::Text
        } else {
            ColumnType::Other
        }
    }
}

/// A single column as reported by introspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: ColumnType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnInfo {
    pub fn new(name: &str, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
        }
    }

    pub fn primary(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
}

/// A foreign key constraint on one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub column: String,
    pub referred_table: String,
    pub referred_column: String,
}

/// Complete metadata for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKeyInfo>,
}

impl TableMetadata {
    /// Look up a column by name, case-insensitively.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Whether the table has a column with this exact (case-insensitive) name.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

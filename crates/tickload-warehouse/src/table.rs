//! Destination table descriptors and the fixed price schema.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::WarehouseError;

const MAX_IDENTIFIER_LEN: usize = 63;

/// Validated, optionally schema-qualified table name.
///
/// Identifiers cannot be bound as statement parameters, so only
/// `[A-Za-z_][A-Za-z0-9_]*` parts are accepted and every part is quoted when
/// rendered into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    /// # Errors
    /// Returns [`WarehouseError::InvalidTableName`] for empty names, more than
    /// one qualifier, or parts with characters outside the identifier set.
    pub fn parse(input: &str) -> Result<Self, WarehouseError> {
        let trimmed = input.trim();
        let mut parts = trimmed.split('.');
        let first = parts.next().unwrap_or_default();
        let second = parts.next();
        if parts.next().is_some() {
            return Err(invalid(trimmed, "at most one schema qualifier is allowed"));
        }

        let (schema, table) = match second {
            Some(table) => (Some(first), table),
            None => (None, first),
        };

        if let Some(schema) = schema {
            validate_identifier(trimmed, schema)?;
        }
        validate_identifier(trimmed, table)?;

        Ok(Self {
            schema: schema.map(str::to_owned),
            table: table.to_owned(),
        })
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or("main")
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Double-quoted form for SQL text.
    pub fn quoted(&self) -> String {
        match &self.schema {
            Some(schema) => format!("\"{schema}\".\"{}\"", self.table),
            None => format!("\"{}\"", self.table),
        }
    }
}

impl Display for TableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{schema}.{}", self.table),
            None => f.write_str(&self.table),
        }
    }
}

fn validate_identifier(full: &str, part: &str) -> Result<(), WarehouseError> {
    if part.is_empty() {
        return Err(invalid(full, "identifier parts must not be empty"));
    }
    if part.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid(full, "identifier parts are limited to 63 characters"));
    }
    let mut chars = part.chars();
    if !chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
    {
        return Err(invalid(full, "identifiers must start with a letter or '_'"));
    }
    if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(invalid(
            full,
            "identifiers may contain only ASCII letters, digits and '_'",
        ));
    }
    Ok(())
}

fn invalid(name: &str, reason: &'static str) -> WarehouseError {
    WarehouseError::InvalidTableName {
        name: name.to_owned(),
        reason,
    }
}

/// Shape of the `date` column.
///
/// `Timestamp` allows the same date to appear more than once (two instruments
/// share trading days). `PrimaryKey` makes `date` unique across the whole
/// table, so any repeated date in a batch aborts the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateKey {
    #[default]
    Timestamp,
    PrimaryKey,
}

impl DateKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timestamp => "timestamp",
            Self::PrimaryKey => "primary-key",
        }
    }

    const fn column_type(self) -> &'static str {
        match self {
            Self::Timestamp => "TIMESTAMP",
            Self::PrimaryKey => "DATE",
        }
    }

    const fn column_constraint(self) -> &'static str {
        match self {
            Self::Timestamp => "NOT NULL",
            Self::PrimaryKey => "PRIMARY KEY",
        }
    }
}

impl Display for DateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination of a full-refresh load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetTable {
    name: TableName,
    date_key: DateKey,
}

impl TargetTable {
    pub fn new(name: TableName, date_key: DateKey) -> Self {
        Self { name, date_key }
    }

    pub fn name(&self) -> &TableName {
        &self.name
    }

    pub const fn date_key(&self) -> DateKey {
        self.date_key
    }

    pub(crate) fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name.quoted())
    }

    pub(crate) fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE {} (\
             instrument VARCHAR NOT NULL, \
             open DOUBLE NOT NULL, \
             high DOUBLE NOT NULL, \
             low DOUBLE NOT NULL, \
             close DOUBLE NOT NULL, \
             volume BIGINT NOT NULL, \
             date {} {})",
            self.name.quoted(),
            self.date_key.column_type(),
            self.date_key.column_constraint(),
        )
    }

    pub(crate) fn insert_sql(&self) -> String {
        format!(
            "INSERT INTO {} (instrument, open, high, low, close, volume, date) \
             VALUES (?, ?, ?, ?, ?, ?, CAST(? AS {}))",
            self.name.quoted(),
            self.date_key.column_type(),
        )
    }
}

/// Statement that reads a price table back in insertion order.
pub(crate) fn select_sql(name: &TableName) -> String {
    format!(
        "SELECT instrument, open, high, low, close, volume, \
         CAST(CAST(date AS DATE) AS VARCHAR) \
         FROM {} ORDER BY rowid",
        name.quoted()
    )
}

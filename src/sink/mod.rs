// Dialect sinks: everything that varies between database products
pub mod ansi;
pub mod mysql;
pub mod postgres;
pub mod registry;
pub mod snowflake;
pub mod sqlite;

pub use registry::SinkRegistry;

use crate::catalog::CatalogColumn;
use crate::error::{Error, Result};
use crate::executor::RelationalConnection;
use crate::models::{DataType, Dataset, Field, FieldType, Operation, Schema, ShowKind};
use crate::transformer::{TransformOptions, Transformer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upsert statement form a dialect supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertForm {
    None,
    Merge,
    OnConflict,
    OnDuplicateKey,
}

/// How a dialect takes an exclusive table lock inside a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTableIdiom {
    None,
    LockInExclusiveMode,
    LockTablesWrite,
}

/// Static capability record of a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkCapabilities {
    pub name: &'static str,
    pub identifier_quote: char,
    pub supports_show: bool,
    pub supports_temp_tables: bool,
    pub upsert: UpsertForm,
    pub lock_table: LockTableIdiom,
    /// `SELECT ... WHERE` without a table needs `FROM DUAL`
    pub requires_dual: bool,
}

/// How one logical type is declared in, and reported back by, a dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub ddl_name: &'static str,
    pub catalog_name: &'static str,
    pub generic_code: i32,
    pub length: Option<u32>,
    pub scale: Option<u32>,
}

impl TypeSpec {
    pub const fn plain(ddl_name: &'static str, catalog_name: &'static str, generic_code: i32) -> Self {
        Self {
            ddl_name,
            catalog_name,
            generic_code,
            length: None,
            scale: None,
        }
    }

    pub const fn sized(
        ddl_name: &'static str,
        catalog_name: &'static str,
        generic_code: i32,
        length: u32,
    ) -> Self {
        Self {
            length: Some(length),
            ..Self::plain(ddl_name, catalog_name, generic_code)
        }
    }

    pub const fn scaled(
        ddl_name: &'static str,
        catalog_name: &'static str,
        generic_code: i32,
        length: u32,
        scale: u32,
    ) -> Self {
        Self {
            length: Some(length),
            scale: Some(scale),
            ..Self::plain(ddl_name, catalog_name, generic_code)
        }
    }
}

/// A database dialect.
///
/// The transformer and executor only ever talk to a `Sink` through the
/// methods below, so adding a dialect means adding a variant and its module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sink {
    Ansi,
    Postgres,
    Snowflake,
    MySql,
    Sqlite,
}

impl Sink {
    pub const ALL: [Sink; 5] = [
        Sink::Ansi,
        Sink::Postgres,
        Sink::Snowflake,
        Sink::MySql,
        Sink::Sqlite,
    ];

    pub fn capabilities(&self) -> &'static SinkCapabilities {
        match self {
            Sink::Ansi => &ansi::CAPABILITIES,
            Sink::Postgres => &postgres::CAPABILITIES,
            Sink::Snowflake => &snowflake::CAPABILITIES,
            Sink::MySql => &mysql::CAPABILITIES,
            Sink::Sqlite => &sqlite::CAPABILITIES,
        }
    }

    pub fn name(&self) -> &'static str {
        self.capabilities().name
    }

    /// Type table entry, or `None` when the dialect cannot represent the type
    pub fn type_spec(&self, data_type: DataType) -> Option<TypeSpec> {
        match self {
            Sink::Ansi => ansi::type_spec(data_type),
            Sink::Postgres => postgres::type_spec(data_type),
            Sink::Snowflake => snowflake::type_spec(data_type),
            Sink::MySql => mysql::type_spec(data_type),
            Sink::Sqlite => sqlite::type_spec(data_type),
        }
    }

    fn require_spec(&self, data_type: DataType) -> Result<TypeSpec> {
        self.type_spec(data_type).ok_or(Error::UnsupportedType {
            dialect: self.name(),
            data_type,
        })
    }

    pub fn default_length(&self, data_type: DataType) -> Result<Option<u32>> {
        Ok(self.require_spec(data_type)?.length)
    }

    pub fn default_scale(&self, data_type: DataType) -> Result<Option<u32>> {
        Ok(self.require_spec(data_type)?.scale)
    }

    /// `FieldType` carrying this dialect's default length and scale
    pub fn field_type(&self, data_type: DataType) -> Result<FieldType> {
        let spec = self.require_spec(data_type)?;
        Ok(FieldType::new(data_type, spec.length, spec.scale))
    }

    /// `field_type` with missing length and scale filled from the dialect
    /// defaults, and sizes on unsized types dropped
    pub fn normalize_field_type(&self, field_type: &FieldType) -> Result<FieldType> {
        let spec = self.require_spec(field_type.data_type)?;
        Ok(FieldType::new(
            field_type.data_type,
            spec.length.map(|default| field_type.length.unwrap_or(default)),
            spec.scale.map(|default| field_type.scale.unwrap_or(default)),
        ))
    }

    /// Column type as written in a `CREATE TABLE` column definition
    pub fn render_type(&self, field_type: &FieldType) -> Result<String> {
        let spec = self.require_spec(field_type.data_type)?;
        let length = spec.length.map(|default| field_type.length.unwrap_or(default));
        let scale = spec.scale.map(|default| field_type.scale.unwrap_or(default));
        Ok(match (length, scale) {
            (Some(length), Some(scale)) => format!("{}({},{})", spec.ddl_name, length, scale),
            (Some(length), None) => format!("{}({})", spec.ddl_name, length),
            _ => spec.ddl_name.to_string(),
        })
    }

    /// Map catalog metadata for one column back into the logical model
    pub fn map_catalog_column(
        &self,
        type_name: &str,
        generic_code: i32,
        column_size: Option<u32>,
        decimal_digits: Option<u32>,
    ) -> Result<FieldType> {
        let name = type_name.trim().to_uppercase();
        let data_type = match self {
            Sink::Ansi => ansi::catalog_data_type(&name, generic_code),
            Sink::Postgres => postgres::catalog_data_type(&name, generic_code),
            Sink::Snowflake => snowflake::catalog_data_type(&name, generic_code),
            Sink::MySql => mysql::catalog_data_type(&name, generic_code),
            Sink::Sqlite => sqlite::catalog_data_type(&name, generic_code),
        }
        .ok_or_else(|| Error::UnrecognizedCatalogType {
            dialect: self.name(),
            type_name: type_name.to_string(),
            generic_code,
        })?;

        let spec = self.require_spec(data_type)?;
        Ok(FieldType::new(
            data_type,
            spec.length.map(|default| column_size.unwrap_or(default)),
            spec.scale.map(|default| decimal_digits.unwrap_or(default)),
        ))
    }

    /// The catalog tuple this dialect reports for a column it created
    pub fn describe_catalog_column(&self, name: &str, field_type: &FieldType) -> Result<CatalogColumn> {
        let spec = self.require_spec(field_type.data_type)?;
        Ok(CatalogColumn::new(
            name,
            spec.catalog_name,
            spec.generic_code,
            spec.length.and(field_type.length.or(spec.length)),
            spec.scale.and(field_type.scale.or(spec.scale)),
        ))
    }

    pub fn quote_identifier(&self, identifier: &str) -> String {
        let quote = self.capabilities().identifier_quote;
        let escaped = identifier.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Quoted, dot-joined name with absent levels omitted
    pub fn qualified_name(&self, dataset: &Dataset) -> String {
        dataset
            .qualified_parts()
            .iter()
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Literal for the batch start timestamp
    pub fn timestamp_literal(&self, timestamp: &DateTime<Utc>) -> String {
        let formatted = timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
        match self {
            Sink::Ansi | Sink::Postgres => format!("TIMESTAMP '{}'", formatted),
            Sink::Snowflake => format!("'{}'::TIMESTAMP_NTZ", formatted),
            Sink::MySql | Sink::Sqlite => format!("'{}'", formatted),
        }
    }

    /// Statement taking an exclusive lock on `dataset`, for callers that
    /// bracket a read-then-write on a shared table
    pub fn lock_table_statement(&self, dataset: &Dataset) -> Option<String> {
        match self.capabilities().lock_table {
            LockTableIdiom::None => None,
            LockTableIdiom::LockInExclusiveMode => Some(format!(
                "LOCK TABLE {} IN EXCLUSIVE MODE",
                self.qualified_name(dataset)
            )),
            LockTableIdiom::LockTablesWrite => {
                Some(format!("LOCK TABLES {} WRITE", self.qualified_name(dataset)))
            }
        }
    }

    /// Whether `dataset` exists on the live connection
    pub fn dataset_exists(
        &self,
        connection: &mut dyn RelationalConnection,
        dataset: &Dataset,
    ) -> Result<bool> {
        let sql = match self {
            Sink::Postgres => postgres::exists_query(dataset),
            Sink::Sqlite => sqlite::exists_query(dataset),
            Sink::Ansi | Sink::Snowflake | Sink::MySql => {
                let show = Operation::Show {
                    kind: ShowKind::Tables,
                    dataset: dataset.clone(),
                };
                let plan = Transformer::new(*self, TransformOptions::default())
                    .generate_physical_plan(&show.into())?;
                plan.statements()
                    .first()
                    .cloned()
                    .ok_or_else(|| Error::InvalidOperation("empty SHOW TABLES plan".to_string()))?
            }
        };
        tracing::debug!("Checking existence of {} with: {}", dataset, sql);
        Ok(connection.query(&sql)?.row_count > 0)
    }

    /// Rebuild `dataset` with the schema the live catalog reports
    pub fn construct_dataset_from_database(
        &self,
        connection: &mut dyn RelationalConnection,
        dataset: &Dataset,
    ) -> Result<Dataset> {
        let columns = connection.catalog_columns(dataset)?;
        if columns.is_empty() {
            return Err(Error::SchemaMismatch {
                dataset: dataset.to_string(),
                detail: "table not found in catalog".to_string(),
            });
        }

        let fields = columns
            .iter()
            .map(|column| {
                let field_type = self.map_catalog_column(
                    &column.type_name,
                    column.generic_code,
                    column.column_size,
                    column.decimal_digits,
                )?;
                Ok(Field {
                    name: column.name.clone(),
                    field_type,
                    nullable: column.nullable,
                    primary_key: column.primary_key,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(dataset.clone().with_schema(Schema::new(fields)))
    }

    /// Check that the live table matches the expected schema: same column
    /// names and field types, in the same order. Expected types are compared
    /// after filling in dialect defaults.
    pub fn validate_main_dataset_schema(
        &self,
        connection: &mut dyn RelationalConnection,
        dataset: &Dataset,
    ) -> Result<()> {
        let actual = self.construct_dataset_from_database(connection, dataset)?;
        let expected = &dataset.schema.fields;
        let found = &actual.schema.fields;

        let mismatch = |detail: String| Error::SchemaMismatch {
            dataset: dataset.to_string(),
            detail,
        };

        if expected.len() != found.len() {
            return Err(mismatch(format!(
                "expected {} columns, found {}",
                expected.len(),
                found.len()
            )));
        }

        for (position, (want, got)) in expected.iter().zip(found.iter()).enumerate() {
            if want.name != got.name {
                return Err(mismatch(format!(
                    "column {} is '{}', expected '{}'",
                    position, got.name, want.name
                )));
            }
            let want_type = self.normalize_field_type(&want.field_type)?;
            if want_type != got.field_type {
                return Err(mismatch(format!(
                    "column '{}' has type {:?}, expected {:?}",
                    want.name, got.field_type, want_type
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Single-quoted SQL string literal
pub(crate) fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

use crate::models::{DataType, FieldType};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub primary_key: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            nullable: true,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Mark as part of the primary key (implies NOT NULL)
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
}

/// Ordered columns of a dataset. Order matches the physical column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn primary_keys(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.primary_key)
    }
}

/// A table addressed by `(database?, group?, name)`.
///
/// Missing levels are omitted when a dialect renders the qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub database: Option<String>,
    pub group: Option<String>,
    pub name: String,
    pub schema: Schema,
}

impl Dataset {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            database: None,
            group: None,
            name: name.into(),
            schema,
        }
    }

    /// A schema-less reference, enough for DML and catalog lookups
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, Schema::default())
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Present naming levels, outermost first
    pub fn qualified_parts(&self) -> Vec<&str> {
        self.database
            .iter()
            .chain(self.group.iter())
            .map(String::as_str)
            .chain(std::iter::once(self.name.as_str()))
            .collect()
    }

    /// Present container levels (database, group), outermost first
    pub fn container_parts(&self) -> Vec<&str> {
        self.database
            .iter()
            .chain(self.group.iter())
            .map(String::as_str)
            .collect()
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_parts().join("."))
    }
}

pub const INSERT_TS_FIELD: &str = "insert_ts_utc";
pub const BATCH_ID_FIELD: &str = "batch_id";
pub const LAST_USED_TS_FIELD: &str = "last_used_ts_utc";

/// The metadata table used to coordinate batch ingestion runs.
///
/// Columns are fixed: `insert_ts_utc`, optionally `batch_id`, and
/// `last_used_ts_utc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockInfoDataset {
    pub database: Option<String>,
    pub group: Option<String>,
    pub name: String,
    pub with_batch_id: bool,
}

impl LockInfoDataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            database: None,
            group: None,
            name: name.into(),
            with_batch_id: false,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Include the `batch_id` column used by multi-ingest runs
    pub fn with_batch_id(mut self) -> Self {
        self.with_batch_id = true;
        self
    }

    pub fn insert_ts_field(&self) -> &'static str {
        INSERT_TS_FIELD
    }

    pub fn batch_id_field(&self) -> &'static str {
        BATCH_ID_FIELD
    }

    pub fn last_used_ts_field(&self) -> &'static str {
        LAST_USED_TS_FIELD
    }

    pub fn schema(&self) -> Schema {
        let mut fields = vec![Field::new(INSERT_TS_FIELD, DataType::Timestamp)];
        if self.with_batch_id {
            fields.push(Field::new(BATCH_ID_FIELD, DataType::Int));
        }
        fields.push(Field::new(LAST_USED_TS_FIELD, DataType::Timestamp));
        Schema::new(fields)
    }

    pub fn dataset(&self) -> Dataset {
        Dataset {
            database: self.database.clone(),
            group: self.group.clone(),
            name: self.name.clone(),
            schema: self.schema(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_parts_omit_missing_levels() {
        let bare = Dataset::reference("trips");
        assert_eq!(bare.qualified_parts(), vec!["trips"]);

        let grouped = Dataset::reference("trips").with_group("public");
        assert_eq!(grouped.qualified_parts(), vec!["public", "trips"]);
        assert_eq!(grouped.container_parts(), vec!["public"]);

        let full = grouped.with_database("CITIBIKE");
        assert_eq!(full.to_string(), "CITIBIKE.public.trips");
    }

    #[test]
    fn test_database_without_group() {
        let dataset = Dataset::reference("trips").with_database("CITIBIKE");
        assert_eq!(dataset.qualified_parts(), vec!["CITIBIKE", "trips"]);
    }

    #[test]
    fn test_primary_key_implies_not_null() {
        let field = Field::new("id", DataType::Int).primary_key();
        assert!(field.primary_key);
        assert!(!field.nullable);
    }

    #[test]
    fn test_lock_info_columns_are_fixed() {
        let names = |lock: &LockInfoDataset| {
            lock.schema()
                .fields
                .iter()
                .map(|f| f.name.clone())
                .collect::<Vec<_>>()
        };

        let single = LockInfoDataset::new("batch_lock");
        assert_eq!(names(&single), vec!["insert_ts_utc", "last_used_ts_utc"]);

        let multi = LockInfoDataset::new("batch_lock").with_batch_id();
        assert_eq!(
            names(&multi),
            vec!["insert_ts_utc", "batch_id", "last_used_ts_utc"]
        );
        assert_eq!(
            multi.dataset().schema.field("batch_id").unwrap().field_type,
            FieldType::of(DataType::Int)
        );
    }
}

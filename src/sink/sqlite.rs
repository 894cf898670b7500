// SQLite dialect. Declared types are stored verbatim, so the catalog
// reports back exactly what the DDL said.
use super::{quote_literal, LockTableIdiom, SinkCapabilities, TypeSpec, UpsertForm};
use crate::catalog::codes;
use crate::models::{DataType, Dataset};

pub const CAPABILITIES: SinkCapabilities = SinkCapabilities {
    name: "sqlite",
    identifier_quote: '"',
    supports_show: false,
    supports_temp_tables: true,
    upsert: UpsertForm::OnConflict,
    lock_table: LockTableIdiom::None,
    requires_dual: false,
};

pub fn type_spec(data_type: DataType) -> Option<TypeSpec> {
    let spec = match data_type {
        DataType::TinyInt => TypeSpec::plain("TINYINT", "TINYINT", codes::TINYINT),
        DataType::SmallInt => TypeSpec::plain("SMALLINT", "SMALLINT", codes::SMALLINT),
        DataType::Int => TypeSpec::plain("INTEGER", "INTEGER", codes::INTEGER),
        DataType::BigInt => TypeSpec::plain("BIGINT", "BIGINT", codes::BIGINT),
        DataType::Real => TypeSpec::plain("REAL", "REAL", codes::REAL),
        DataType::Double => TypeSpec::plain("DOUBLE", "DOUBLE", codes::DOUBLE),
        DataType::Decimal => TypeSpec::scaled("DECIMAL", "DECIMAL", codes::DECIMAL, 38, 10),
        DataType::Boolean => TypeSpec::plain("BOOLEAN", "BOOLEAN", codes::BOOLEAN),
        DataType::Char => TypeSpec::sized("CHAR", "CHAR", codes::CHAR, 1),
        DataType::Varchar => TypeSpec::sized("VARCHAR", "VARCHAR", codes::VARCHAR, 256),
        DataType::Text => TypeSpec::plain("TEXT", "TEXT", codes::LONGVARCHAR),
        DataType::Binary => TypeSpec::sized("BINARY", "BINARY", codes::BINARY, 255),
        DataType::Varbinary => TypeSpec::plain("BLOB", "BLOB", codes::BLOB),
        DataType::Date => TypeSpec::plain("DATE", "DATE", codes::DATE),
        DataType::Time => TypeSpec::plain("TIME", "TIME", codes::TIME),
        DataType::Timestamp => TypeSpec::plain("TIMESTAMP", "TIMESTAMP", codes::TIMESTAMP),
        DataType::TimestampTz => TypeSpec::plain(
            "TIMESTAMPTZ",
            "TIMESTAMPTZ",
            codes::TIMESTAMP_WITH_TIMEZONE,
        ),
        DataType::Json => TypeSpec::plain("JSON", "JSON", codes::OTHER),
        DataType::Variant | DataType::Array | DataType::Map => return None,
    };
    Some(spec)
}

/// `name` is upper-cased by the caller
pub fn catalog_data_type(name: &str, _generic_code: i32) -> Option<DataType> {
    let data_type = match name {
        "TINYINT" => DataType::TinyInt,
        "SMALLINT" => DataType::SmallInt,
        "INT" | "INTEGER" => DataType::Int,
        "BIGINT" => DataType::BigInt,
        "REAL" | "FLOAT" => DataType::Real,
        "DOUBLE" => DataType::Double,
        "DECIMAL" | "NUMERIC" => DataType::Decimal,
        "BOOLEAN" => DataType::Boolean,
        "CHAR" => DataType::Char,
        "VARCHAR" => DataType::Varchar,
        "TEXT" => DataType::Text,
        "BINARY" => DataType::Binary,
        "BLOB" => DataType::Varbinary,
        "DATE" => DataType::Date,
        "TIME" => DataType::Time,
        "TIMESTAMP" | "DATETIME" => DataType::Timestamp,
        "TIMESTAMPTZ" => DataType::TimestampTz,
        "JSON" => DataType::Json,
        _ => return None,
    };
    Some(data_type)
}

pub fn exists_query(dataset: &Dataset) -> String {
    // The group level maps onto an attached schema ("main", "temp", ...)
    let master = match &dataset.group {
        Some(group) => format!("\"{}\".sqlite_master", group.replace('"', "\"\"")),
        None => "sqlite_master".to_string(),
    };
    format!(
        "SELECT name FROM {} WHERE type = 'table' AND name = {}",
        master,
        quote_literal(&dataset.name)
    )
}

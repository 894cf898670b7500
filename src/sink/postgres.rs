// PostgreSQL dialect
use super::{quote_literal, LockTableIdiom, SinkCapabilities, TypeSpec, UpsertForm};
use crate::catalog::codes;
use crate::models::{DataType, Dataset};

pub const CAPABILITIES: SinkCapabilities = SinkCapabilities {
    name: "postgres",
    identifier_quote: '"',
    supports_show: false,
    supports_temp_tables: true,
    upsert: UpsertForm::OnConflict,
    lock_table: LockTableIdiom::LockInExclusiveMode,
    requires_dual: false,
};

// Catalog names are the pg_type names the driver reports (int4, bpchar, ...)
pub fn type_spec(data_type: DataType) -> Option<TypeSpec> {
    let spec = match data_type {
        DataType::SmallInt => TypeSpec::plain("SMALLINT", "int2", codes::SMALLINT),
        DataType::Int => TypeSpec::plain("INTEGER", "int4", codes::INTEGER),
        DataType::BigInt => TypeSpec::plain("BIGINT", "int8", codes::BIGINT),
        DataType::Real => TypeSpec::plain("REAL", "float4", codes::REAL),
        DataType::Double => TypeSpec::plain("DOUBLE PRECISION", "float8", codes::DOUBLE),
        DataType::Decimal => TypeSpec::scaled("NUMERIC", "numeric", codes::NUMERIC, 38, 10),
        DataType::Boolean => TypeSpec::plain("BOOLEAN", "bool", codes::BIT),
        DataType::Char => TypeSpec::sized("CHAR", "bpchar", codes::CHAR, 1),
        DataType::Varchar => TypeSpec::sized("VARCHAR", "varchar", codes::VARCHAR, 256),
        DataType::Text => TypeSpec::plain("TEXT", "text", codes::VARCHAR),
        DataType::Varbinary => TypeSpec::plain("BYTEA", "bytea", codes::BINARY),
        DataType::Date => TypeSpec::plain("DATE", "date", codes::DATE),
        DataType::Time => TypeSpec::plain("TIME", "time", codes::TIME),
        DataType::Timestamp => TypeSpec::plain("TIMESTAMP", "timestamp", codes::TIMESTAMP),
        DataType::TimestampTz => TypeSpec::plain("TIMESTAMPTZ", "timestamptz", codes::TIMESTAMP),
        DataType::Json => TypeSpec::plain("JSON", "json", codes::OTHER),
        DataType::Variant => TypeSpec::plain("JSONB", "jsonb", codes::OTHER),
        // No one-byte integer, a single binary type, and no untyped array/map
        DataType::TinyInt | DataType::Binary | DataType::Array | DataType::Map => return None,
    };
    Some(spec)
}

/// `name` is upper-cased by the caller
pub fn catalog_data_type(name: &str, _generic_code: i32) -> Option<DataType> {
    let data_type = match name {
        "INT2" | "SMALLINT" => DataType::SmallInt,
        "INT4" | "INT" | "INTEGER" | "SERIAL" => DataType::Int,
        "INT8" | "BIGINT" | "BIGSERIAL" => DataType::BigInt,
        "FLOAT4" | "REAL" => DataType::Real,
        "FLOAT8" | "DOUBLE PRECISION" => DataType::Double,
        "NUMERIC" | "DECIMAL" => DataType::Decimal,
        "BOOL" | "BOOLEAN" => DataType::Boolean,
        "BPCHAR" | "CHAR" | "CHARACTER" => DataType::Char,
        "VARCHAR" | "CHARACTER VARYING" => DataType::Varchar,
        "TEXT" => DataType::Text,
        "BYTEA" => DataType::Varbinary,
        "DATE" => DataType::Date,
        "TIME" | "TIME WITHOUT TIME ZONE" => DataType::Time,
        "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => DataType::Timestamp,
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => DataType::TimestampTz,
        "JSON" => DataType::Json,
        "JSONB" => DataType::Variant,
        _ => return None,
    };
    Some(data_type)
}

pub fn exists_query(dataset: &Dataset) -> String {
    let mut sql = format!(
        "SELECT table_name FROM information_schema.tables WHERE table_name = {}",
        quote_literal(&dataset.name)
    );
    if let Some(group) = &dataset.group {
        sql.push_str(&format!(" AND table_schema = {}", quote_literal(group)));
    }
    if let Some(database) = &dataset.database {
        sql.push_str(&format!(" AND table_catalog = {}", quote_literal(database)));
    }
    sql
}

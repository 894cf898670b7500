// ANSI SQL dialect, the baseline the other dialects deviate from
use super::{LockTableIdiom, SinkCapabilities, TypeSpec, UpsertForm};
use crate::catalog::codes;
use crate::models::DataType;

pub const CAPABILITIES: SinkCapabilities = SinkCapabilities {
    name: "ansi",
    identifier_quote: '"',
    supports_show: true,
    supports_temp_tables: true,
    upsert: UpsertForm::Merge,
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
        DataType::Text => TypeSpec::plain("CLOB", "CLOB", codes::CLOB),
        DataType::Binary => TypeSpec::sized("BINARY", "BINARY", codes::BINARY, 255),
        DataType::Varbinary => TypeSpec::sized("VARBINARY", "VARBINARY", codes::VARBINARY, 255),
        DataType::Date => TypeSpec::plain("DATE", "DATE", codes::DATE),
        DataType::Time => TypeSpec::plain("TIME", "TIME", codes::TIME),
        DataType::Timestamp => TypeSpec::plain("TIMESTAMP", "TIMESTAMP", codes::TIMESTAMP),
        DataType::TimestampTz => TypeSpec::plain(
            "TIMESTAMP WITH TIME ZONE",
            "TIMESTAMP WITH TIME ZONE",
            codes::TIMESTAMP_WITH_TIMEZONE,
        ),
        DataType::Json | DataType::Variant | DataType::Array | DataType::Map => return None,
    };
    Some(spec)
}

/// `name` is upper-cased by the caller
pub fn catalog_data_type(name: &str, generic_code: i32) -> Option<DataType> {
    let data_type = match name {
        "TINYINT" => DataType::TinyInt,
        "SMALLINT" => DataType::SmallInt,
        "INT" | "INTEGER" => DataType::Int,
        "BIGINT" => DataType::BigInt,
        "REAL" => DataType::Real,
        "DOUBLE" | "DOUBLE PRECISION" => DataType::Double,
        "FLOAT" if generic_code == codes::DOUBLE => DataType::Double,
        "FLOAT" => DataType::Real,
        "DECIMAL" | "NUMERIC" => DataType::Decimal,
        "BOOLEAN" => DataType::Boolean,
        "CHAR" | "CHARACTER" => DataType::Char,
        "VARCHAR" | "CHARACTER VARYING" => DataType::Varchar,
        "CLOB" => DataType::Text,
        "BINARY" => DataType::Binary,
        "VARBINARY" => DataType::Varbinary,
        "DATE" => DataType::Date,
        "TIME" => DataType::Time,
        "TIMESTAMP" => DataType::Timestamp,
        "TIMESTAMP WITH TIME ZONE" => DataType::TimestampTz,
        _ => return None,
    };
    Some(data_type)
}

// MySQL / MariaDB dialect
use super::{LockTableIdiom, SinkCapabilities, TypeSpec, UpsertForm};
use crate::catalog::codes;
use crate::models::DataType;

pub const CAPABILITIES: SinkCapabilities = SinkCapabilities {
    name: "mysql",
    identifier_quote: '`',
    supports_show: true,
    supports_temp_tables: true,
    upsert: UpsertForm::OnDuplicateKey,
    lock_table: LockTableIdiom::LockTablesWrite,
    requires_dual: true,
};

pub fn type_spec(data_type: DataType) -> Option<TypeSpec> {
    let spec = match data_type {
        DataType::TinyInt => TypeSpec::plain("TINYINT", "TINYINT", codes::TINYINT),
        DataType::SmallInt => TypeSpec::plain("SMALLINT", "SMALLINT", codes::SMALLINT),
        DataType::Int => TypeSpec::plain("INT", "INT", codes::INTEGER),
        DataType::BigInt => TypeSpec::plain("BIGINT", "BIGINT", codes::BIGINT),
        DataType::Real => TypeSpec::plain("FLOAT", "FLOAT", codes::REAL),
        DataType::Double => TypeSpec::plain("DOUBLE", "DOUBLE", codes::DOUBLE),
        DataType::Decimal => TypeSpec::scaled("DECIMAL", "DECIMAL", codes::DECIMAL, 38, 10),
        // BOOLEAN is TINYINT(1), which the driver reports as BIT
        DataType::Boolean => TypeSpec::plain("BOOLEAN", "BIT", codes::BIT),
        DataType::Char => TypeSpec::sized("CHAR", "CHAR", codes::CHAR, 1),
        DataType::Varchar => TypeSpec::sized("VARCHAR", "VARCHAR", codes::VARCHAR, 256),
        DataType::Text => TypeSpec::plain("TEXT", "TEXT", codes::LONGVARCHAR),
        DataType::Binary => TypeSpec::sized("BINARY", "BINARY", codes::BINARY, 255),
        DataType::Varbinary => TypeSpec::sized("VARBINARY", "VARBINARY", codes::VARBINARY, 255),
        DataType::Date => TypeSpec::plain("DATE", "DATE", codes::DATE),
        DataType::Time => TypeSpec::plain("TIME", "TIME", codes::TIME),
        DataType::Timestamp => TypeSpec::plain("DATETIME", "DATETIME", codes::TIMESTAMP),
        // TIMESTAMP columns are stored in UTC and converted per session
        DataType::TimestampTz => TypeSpec::plain("TIMESTAMP", "TIMESTAMP", codes::TIMESTAMP),
        DataType::Json => TypeSpec::plain("JSON", "JSON", codes::LONGVARCHAR),
        DataType::Variant | DataType::Array | DataType::Map => return None,
    };
    Some(spec)
}

/// `name` is upper-cased by the caller
pub fn catalog_data_type(name: &str, generic_code: i32) -> Option<DataType> {
    let data_type = match name {
        "TINYINT" if generic_code == codes::BIT => DataType::Boolean,
        "TINYINT" => DataType::TinyInt,
        "BIT" | "BOOL" | "BOOLEAN" => DataType::Boolean,
        "SMALLINT" => DataType::SmallInt,
        "INT" | "INTEGER" | "MEDIUMINT" => DataType::Int,
        "BIGINT" => DataType::BigInt,
        "FLOAT" => DataType::Real,
        "DOUBLE" | "DOUBLE PRECISION" => DataType::Double,
        "DECIMAL" | "NUMERIC" => DataType::Decimal,
        "CHAR" => DataType::Char,
        "VARCHAR" => DataType::Varchar,
        "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => DataType::Text,
        "BINARY" => DataType::Binary,
        "VARBINARY" => DataType::Varbinary,
        "DATE" => DataType::Date,
        "TIME" => DataType::Time,
        "DATETIME" => DataType::Timestamp,
        "TIMESTAMP" => DataType::TimestampTz,
        "JSON" => DataType::Json,
        _ => return None,
    };
    Some(data_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiny_int_one_is_boolean() {
        assert_eq!(catalog_data_type("TINYINT", codes::BIT), Some(DataType::Boolean));
        assert_eq!(catalog_data_type("TINYINT", codes::TINYINT), Some(DataType::TinyInt));
    }

    #[test]
    fn test_requires_dual() {
        assert!(CAPABILITIES.requires_dual);
        assert_eq!(CAPABILITIES.identifier_quote, '`');
    }
}

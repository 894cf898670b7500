// Snowflake dialect
use super::{LockTableIdiom, SinkCapabilities, TypeSpec, UpsertForm};
use crate::catalog::codes;
use crate::models::DataType;

pub const CAPABILITIES: SinkCapabilities = SinkCapabilities {
    name: "snowflake",
    identifier_quote: '"',
    supports_show: true,
    supports_temp_tables: true,
    upsert: UpsertForm::Merge,
    lock_table: LockTableIdiom::None,
    requires_dual: false,
};

// Snowflake folds every integer width into NUMBER(38,0), every float into
// DOUBLE and every character type into VARCHAR, so only one member of each
// family survives a catalog round trip.
pub fn type_spec(data_type: DataType) -> Option<TypeSpec> {
    let spec = match data_type {
        DataType::Int => TypeSpec::plain("INTEGER", "NUMBER", codes::BIGINT),
        DataType::Double => TypeSpec::plain("DOUBLE", "DOUBLE", codes::DOUBLE),
        DataType::Decimal => TypeSpec::scaled("NUMBER", "NUMBER", codes::DECIMAL, 38, 10),
        DataType::Boolean => TypeSpec::plain("BOOLEAN", "BOOLEAN", codes::BOOLEAN),
        DataType::Varchar => TypeSpec::sized("VARCHAR", "VARCHAR", codes::VARCHAR, 16_777_216),
        DataType::Binary => TypeSpec::sized("BINARY", "BINARY", codes::BINARY, 8_388_608),
        DataType::Date => TypeSpec::plain("DATE", "DATE", codes::DATE),
        DataType::Time => TypeSpec::plain("TIME", "TIME", codes::TIME),
        DataType::Timestamp => TypeSpec::plain("TIMESTAMP_NTZ", "TIMESTAMPNTZ", codes::TIMESTAMP),
        DataType::TimestampTz => TypeSpec::plain(
            "TIMESTAMP_TZ",
            "TIMESTAMPTZ",
            codes::TIMESTAMP_WITH_TIMEZONE,
        ),
        DataType::Variant => TypeSpec::plain("VARIANT", "VARIANT", codes::VARCHAR),
        DataType::Array => TypeSpec::plain("ARRAY", "ARRAY", codes::VARCHAR),
        DataType::Map => TypeSpec::plain("OBJECT", "OBJECT", codes::VARCHAR),
        DataType::TinyInt
        | DataType::SmallInt
        | DataType::BigInt
        | DataType::Real
        | DataType::Char
        | DataType::Text
        | DataType::Varbinary
        | DataType::Json => return None,
    };
    Some(spec)
}

/// `name` is upper-cased by the caller
pub fn catalog_data_type(name: &str, generic_code: i32) -> Option<DataType> {
    let data_type = match name {
        "NUMBER" | "DECIMAL" | "NUMERIC"
            if matches!(
                generic_code,
                codes::BIGINT | codes::INTEGER | codes::SMALLINT | codes::TINYINT
            ) =>
        {
            DataType::Int
        }
        "NUMBER" | "DECIMAL" | "NUMERIC" => DataType::Decimal,
        "INT" | "INTEGER" | "BIGINT" => DataType::Int,
        "DOUBLE" | "FLOAT" | "REAL" => DataType::Double,
        "BOOLEAN" => DataType::Boolean,
        "VARCHAR" | "TEXT" | "STRING" => DataType::Varchar,
        "BINARY" | "VARBINARY" => DataType::Binary,
        "DATE" => DataType::Date,
        "TIME" => DataType::Time,
        "TIMESTAMPNTZ" | "TIMESTAMP_NTZ" | "TIMESTAMP" => DataType::Timestamp,
        "TIMESTAMPTZ" | "TIMESTAMP_TZ" => DataType::TimestampTz,
        "VARIANT" => DataType::Variant,
        "ARRAY" => DataType::Array,
        "OBJECT" => DataType::Map,
        _ => return None,
    };
    Some(data_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_split_by_generic_code() {
        assert_eq!(catalog_data_type("NUMBER", codes::BIGINT), Some(DataType::Int));
        assert_eq!(catalog_data_type("NUMBER", codes::DECIMAL), Some(DataType::Decimal));
    }

    #[test]
    fn test_collapsed_widths_are_unsupported() {
        assert!(type_spec(DataType::BigInt).is_none());
        assert!(type_spec(DataType::Text).is_none());
    }
}

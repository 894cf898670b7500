// Catalog introspection tuple and generic type codes
use serde::{Deserialize, Serialize};

/// Generic type codes reported by metadata catalogs (java.sql.Types numbering)
pub mod codes {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const BIGINT: i32 = -5;
    pub const LONGVARBINARY: i32 = -4;
    pub const VARBINARY: i32 = -3;
    pub const BINARY: i32 = -2;
    pub const LONGVARCHAR: i32 = -1;
    pub const CHAR: i32 = 1;
    pub const NUMERIC: i32 = 2;
    pub const DECIMAL: i32 = 3;
    pub const INTEGER: i32 = 4;
    pub const SMALLINT: i32 = 5;
    pub const FLOAT: i32 = 6;
    pub const REAL: i32 = 7;
    pub const DOUBLE: i32 = 8;
    pub const VARCHAR: i32 = 12;
    pub const BOOLEAN: i32 = 16;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const OTHER: i32 = 1111;
    pub const STRUCT: i32 = 2002;
    pub const ARRAY: i32 = 2003;
    pub const BLOB: i32 = 2004;
    pub const CLOB: i32 = 2005;
    pub const TIMESTAMP_WITH_TIMEZONE: i32 = 2014;
}

/// One column as described by a live database's metadata catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    pub type_name: String,
    pub generic_code: i32,
    pub column_size: Option<u32>,
    pub decimal_digits: Option<u32>,
    pub nullable: bool,
    pub primary_key: bool,
}

impl CatalogColumn {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        generic_code: i32,
        column_size: Option<u32>,
        decimal_digits: Option<u32>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            generic_code,
            column_size,
            decimal_digits,
            nullable: true,
            primary_key: false,
        }
    }
}

/// Split a declared column type such as `DECIMAL(38,10)` into its base
/// name and size parameters. The name is upper-cased.
pub fn parse_declared_type(declared: &str) -> (String, Option<u32>, Option<u32>) {
    let declared = declared.trim();
    let Some(open) = declared.find('(') else {
        return (declared.to_uppercase(), None, None);
    };

    let name = declared[..open].trim().to_uppercase();
    let args = declared[open + 1..].trim_end().trim_end_matches(')');
    let mut parts = args.split(',').map(|p| p.trim().parse::<u32>().ok());
    let size = parts.next().flatten();
    let digits = parts.next().flatten();
    (name, size, digits)
}

/// Generic code a catalog reports for a declared base type name.
/// Unknown names report `OTHER`.
pub fn generic_code_for(type_name: &str) -> i32 {
    match type_name.to_uppercase().as_str() {
        "BIT" => codes::BIT,
        "TINYINT" => codes::TINYINT,
        "SMALLINT" | "INT2" => codes::SMALLINT,
        "INT" | "INTEGER" | "INT4" => codes::INTEGER,
        "BIGINT" | "INT8" => codes::BIGINT,
        "REAL" | "FLOAT4" => codes::REAL,
        "FLOAT" => codes::FLOAT,
        "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => codes::DOUBLE,
        "NUMERIC" | "NUMBER" => codes::NUMERIC,
        "DECIMAL" => codes::DECIMAL,
        "BOOLEAN" | "BOOL" => codes::BOOLEAN,
        "CHAR" | "CHARACTER" => codes::CHAR,
        "VARCHAR" | "CHARACTER VARYING" => codes::VARCHAR,
        "TEXT" => codes::LONGVARCHAR,
        "CLOB" => codes::CLOB,
        "BINARY" => codes::BINARY,
        "VARBINARY" => codes::VARBINARY,
        "BLOB" => codes::BLOB,
        "DATE" => codes::DATE,
        "TIME" => codes::TIME,
        "TIMESTAMP" | "DATETIME" => codes::TIMESTAMP,
        "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => codes::TIMESTAMP_WITH_TIMEZONE,
        "ARRAY" => codes::ARRAY,
        _ => codes::OTHER,
    }
}

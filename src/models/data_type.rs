// Logical column types shared by every dialect
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical column type, independent of any database product.
///
/// Every dialect maps this enum with an exhaustive `match`, so adding a
/// variant forces each sink to decide how (or whether) it can represent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    // Integer family
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    // Floating family
    Real,
    Double,
    // Fixed-point
    Decimal,
    Boolean,
    // Character family
    Char,
    Varchar,
    Text,
    // Binary family
    Binary,
    Varbinary,
    // Temporal family
    Date,
    Time,
    Timestamp,
    TimestampTz,
    // Semi-structured
    Json,
    Variant,
    Array,
    Map,
}

impl DataType {
    pub const ALL: [DataType; 21] = [
        DataType::TinyInt,
        DataType::SmallInt,
        DataType::Int,
        DataType::BigInt,
        DataType::Real,
        DataType::Double,
        DataType::Decimal,
        DataType::Boolean,
        DataType::Char,
        DataType::Varchar,
        DataType::Text,
        DataType::Binary,
        DataType::Varbinary,
        DataType::Date,
        DataType::Time,
        DataType::Timestamp,
        DataType::TimestampTz,
        DataType::Json,
        DataType::Variant,
        DataType::Array,
        DataType::Map,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::TinyInt => "tiny_int",
            DataType::SmallInt => "small_int",
            DataType::Int => "int",
            DataType::BigInt => "big_int",
            DataType::Real => "real",
            DataType::Double => "double",
            DataType::Decimal => "decimal",
            DataType::Boolean => "boolean",
            DataType::Char => "char",
            DataType::Varchar => "varchar",
            DataType::Text => "text",
            DataType::Binary => "binary",
            DataType::Varbinary => "varbinary",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::TimestampTz => "timestamp_tz",
            DataType::Json => "json",
            DataType::Variant => "variant",
            DataType::Array => "array",
            DataType::Map => "map",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column type together with its size parameters.
///
/// `length` and `scale` are `None` exactly when the dialect's default-size
/// table says the type carries none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldType {
    pub data_type: DataType,
    pub length: Option<u32>,
    pub scale: Option<u32>,
}

impl FieldType {
    pub fn new(data_type: DataType, length: Option<u32>, scale: Option<u32>) -> Self {
        Self {
            data_type,
            length,
            scale,
        }
    }

    /// A type without size parameters (boolean, date, integers, ...)
    pub fn of(data_type: DataType) -> Self {
        Self::new(data_type, None, None)
    }
}

impl From<DataType> for FieldType {
    fn from(data_type: DataType) -> Self {
        Self::of(data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_lists_each_variant_once() {
        let unique: HashSet<_> = DataType::ALL.iter().collect();
        assert_eq!(unique.len(), DataType::ALL.len());
    }

    #[test]
    fn test_data_type_serde_name_matches_display() {
        for data_type in DataType::ALL {
            let json = serde_json::to_string(&data_type).unwrap();
            assert_eq!(json, format!("\"{}\"", data_type));
        }
    }

    #[test]
    fn test_field_type_of_has_no_size() {
        let field_type = FieldType::of(DataType::Date);
        assert_eq!(field_type.length, None);
        assert_eq!(field_type.scale, None);
        assert_eq!(FieldType::from(DataType::Date), field_type);
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// JDBC type codes, as carried on every column/formula slot.
pub mod sql_types {
    pub const BIT: i32 = -7;
    pub const TINYINT: i32 = -6;
    pub const SMALLINT: i32 = 5;
    pub const INTEGER: i32 = 4;
    pub const BIGINT: i32 = -5;
    pub const REAL: i32 = 7;
    pub const FLOAT: i32 = 6;
    pub const DOUBLE: i32 = 8;
    pub const NUMERIC: i32 = 2;
    pub const DECIMAL: i32 = 3;
    pub const CHAR: i32 = 1;
    pub const VARCHAR: i32 = 12;
    pub const NVARCHAR: i32 = -9;
    pub const DATE: i32 = 91;
    pub const TIME: i32 = 92;
    pub const TIMESTAMP: i32 = 93;
    pub const VARBINARY: i32 = -3;
    pub const BOOLEAN: i32 = 16;
}

/// How an enum value is stored in its column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumStorage {
    Ordinal,
    String { nationalized: bool },
}

/// Domain-side value kinds backing basic attributes and literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JavaType {
    String,
    Character,
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Date,
    Time,
    Timestamp,
    Binary,
    Enum { name: String, storage: EnumStorage },
}

impl JavaType {
    /// Recommended JDBC type for this java type.
    ///
    /// Enums follow their storage: STRING storage maps to VARCHAR (NVARCHAR
    /// when nationalized), ordinal storage to INTEGER.
    pub fn recommended_sql_type(&self) -> i32 {
        match self {
            JavaType::String => sql_types::VARCHAR,
            JavaType::Character => sql_types::CHAR,
            JavaType::Boolean => sql_types::BOOLEAN,
            JavaType::Byte => sql_types::TINYINT,
            JavaType::Short => sql_types::SMALLINT,
            JavaType::Integer => sql_types::INTEGER,
            JavaType::Long => sql_types::BIGINT,
            JavaType::Float => sql_types::FLOAT,
            JavaType::Double => sql_types::DOUBLE,
            JavaType::BigInteger => sql_types::NUMERIC,
            JavaType::BigDecimal => sql_types::NUMERIC,
            JavaType::Date => sql_types::DATE,
            JavaType::Time => sql_types::TIME,
            JavaType::Timestamp => sql_types::TIMESTAMP,
            JavaType::Binary => sql_types::VARBINARY,
            JavaType::Enum { storage, .. } => match storage {
                EnumStorage::String { nationalized: true } => sql_types::NVARCHAR,
                EnumStorage::String { nationalized: false } => sql_types::VARCHAR,
                EnumStorage::Ordinal => sql_types::INTEGER,
            },
        }
    }

    /// Rank used for arithmetic promotion; `None` for non-numeric types.
    fn numeric_rank(&self) -> Option<u8> {
        match self {
            JavaType::Byte => Some(1),
            JavaType::Short => Some(2),
            JavaType::Integer => Some(3),
            JavaType::Long => Some(4),
            JavaType::BigInteger => Some(5),
            JavaType::Float => Some(6),
            JavaType::Double => Some(7),
            JavaType::BigDecimal => Some(8),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Parse the type names accepted in metamodel definitions.
    pub fn from_type_name(name: &str) -> Option<JavaType> {
        let java_type = match name.to_ascii_lowercase().as_str() {
            "string" | "text" => JavaType::String,
            "character" | "char" => JavaType::Character,
            "boolean" | "bool" => JavaType::Boolean,
            "byte" => JavaType::Byte,
            "short" => JavaType::Short,
            "integer" | "int" => JavaType::Integer,
            "long" => JavaType::Long,
            "float" => JavaType::Float,
            "double" => JavaType::Double,
            "big_integer" | "biginteger" => JavaType::BigInteger,
            "big_decimal" | "bigdecimal" => JavaType::BigDecimal,
            "date" => JavaType::Date,
            "time" => JavaType::Time,
            "timestamp" => JavaType::Timestamp,
            "binary" | "bytes" => JavaType::Binary,
            _ => return None,
        };
        Some(java_type)
    }

    pub fn type_name(&self) -> String {
        match self {
            JavaType::Enum { name, .. } => name.clone(),
            other => format!("{:?}", other).to_ascii_lowercase(),
        }
    }
}

/// A basic (single-valued, non-association) type.
///
/// Two basic types are the same type only when java type, SQL type code and
/// converter all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BasicType {
    pub java_type: JavaType,
    pub sql_type_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
}

impl BasicType {
    /// Basic type using the java type's recommended SQL type and no converter.
    pub fn standard(java_type: JavaType) -> Self {
        let sql_type_code = java_type.recommended_sql_type();
        BasicType {
            java_type,
            sql_type_code,
            converter: None,
        }
    }

    pub fn with_sql_type(java_type: JavaType, sql_type_code: i32) -> Self {
        BasicType {
            java_type,
            sql_type_code,
            converter: None,
        }
    }

    pub fn string() -> Self {
        Self::standard(JavaType::String)
    }

    pub fn integer() -> Self {
        Self::standard(JavaType::Integer)
    }

    pub fn long() -> Self {
        Self::standard(JavaType::Long)
    }

    pub fn double() -> Self {
        Self::standard(JavaType::Double)
    }

    pub fn boolean() -> Self {
        Self::standard(JavaType::Boolean)
    }

    /// Result type of a binary arithmetic operation over `lhs` and `rhs`.
    ///
    /// Returns the higher-ranked numeric operand type. Non-numeric operands
    /// (e.g. temporal arithmetic) leave the left type in place.
    pub fn promote(lhs: &BasicType, rhs: &BasicType) -> BasicType {
        match (lhs.java_type.numeric_rank(), rhs.java_type.numeric_rank()) {
            (Some(l), Some(r)) if r > l => BasicType::standard(rhs.java_type.clone()),
            (Some(_), Some(_)) => BasicType::standard(lhs.java_type.clone()),
            (None, Some(_)) => rhs.clone(),
            _ => lhs.clone(),
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.java_type.type_name(), self.sql_type_code)
    }
}

/// Polymorphic "any" association: a discriminator plus an identifier value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnyType {
    pub discriminator_type: BasicType,
    pub identifier_type: BasicType,
}

/// Resolved semantic type of an attribute, collection element/index or expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    Basic(BasicType),
    Entity(String),
    Embeddable(String),
    Any(AnyType),
    /// Plural attribute, identified by its collection role
    Collection(String),
}

impl DomainType {
    pub fn as_basic(&self) -> Option<&BasicType> {
        match self {
            DomainType::Basic(basic) => Some(basic),
            _ => None,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            DomainType::Basic(basic) => basic.java_type.type_name(),
            DomainType::Entity(name) | DomainType::Embeddable(name) => name.clone(),
            DomainType::Any(_) => "any".to_string(),
            DomainType::Collection(role) => role.clone(),
        }
    }
}

impl From<BasicType> for DomainType {
    fn from(basic: BasicType) -> Self {
        DomainType::Basic(basic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_sql_type_follows_storage() {
        let ordinal = JavaType::Enum {
            name: "Gender".to_string(),
            storage: EnumStorage::Ordinal,
        };
        let string = JavaType::Enum {
            name: "Gender".to_string(),
            storage: EnumStorage::String {
                nationalized: false,
            },
        };
        let nstring = JavaType::Enum {
            name: "Gender".to_string(),
            storage: EnumStorage::String { nationalized: true },
        };
        assert_eq!(ordinal.recommended_sql_type(), sql_types::INTEGER);
        assert_eq!(string.recommended_sql_type(), sql_types::VARCHAR);
        assert_eq!(nstring.recommended_sql_type(), sql_types::NVARCHAR);
    }

    #[test]
    fn test_basic_type_identity_includes_converter() {
        let plain = BasicType::string();
        let mut converted = BasicType::string();
        converted.converter = Some("YesNoConverter".to_string());
        assert_ne!(plain, converted);
        assert_eq!(plain, BasicType::with_sql_type(JavaType::String, sql_types::VARCHAR));
        assert_ne!(plain, BasicType::with_sql_type(JavaType::String, sql_types::NVARCHAR));
    }

    #[test]
    fn test_promotion_picks_wider_numeric() {
        let promoted = BasicType::promote(&BasicType::integer(), &BasicType::double());
        assert_eq!(promoted.java_type, JavaType::Double);

        let promoted = BasicType::promote(&BasicType::long(), &BasicType::integer());
        assert_eq!(promoted.java_type, JavaType::Long);

        let big = BasicType::standard(JavaType::BigDecimal);
        let promoted = BasicType::promote(&BasicType::standard(JavaType::Float), &big);
        assert_eq!(promoted.java_type, JavaType::BigDecimal);
    }

    #[test]
    fn test_type_name_parsing() {
        assert_eq!(JavaType::from_type_name("Integer"), Some(JavaType::Integer));
        assert_eq!(JavaType::from_type_name("big_decimal"), Some(JavaType::BigDecimal));
        assert_eq!(JavaType::from_type_name("uuid"), None);
        assert_eq!(JavaType::BigInteger.type_name(), "biginteger");
    }
}

//! Wire-level constants and the typed parameter/value model (spec §3).

/// Maximum UTF-8 byte length of a STRING or VARBINARY value.
pub const MAX_VALUE_LENGTH: usize = 1_048_576;

/// Maximum frame payload, in bytes (excludes the 5-byte frame header).
pub const MAX_FRAME_PAYLOAD: usize = 20_971_520;

/// The only protocol version this client speaks.
pub const PROTOCOL_VERSION: u8 = 0;

/// Synthetic type tag that precedes an array parameter's element-type tag.
pub const ARRAY_TAG: i8 = -99;

pub const NULL_TINYINT: i8 = -128;
pub const NULL_SMALLINT: i16 = -32_768;
pub const NULL_INTEGER: i32 = i32::MIN;
pub const NULL_BIGINT: i64 = i64::MIN;
pub const NULL_FLOAT: f64 = -1.7e308;
pub const NULL_FLOAT_BITS: u64 = NULL_FLOAT.to_bits();
pub const NULL_DECIMAL: [u8; 16] = {
    let mut bytes = [0u8; 16];
    bytes[0] = 0x80;
    bytes
};

/// One-byte scalar type tag, as it appears on the wire (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Float,
    Stringv,
    Timestamp,
    Decimal,
    VarBinary,
}

impl TypeTag {
    #[must_use]
    pub fn to_i8(self) -> i8 {
        match self {
            Self::TinyInt => 3,
            Self::SmallInt => 4,
            Self::Integer => 5,
            Self::BigInt => 6,
            Self::Float => 8,
            Self::Stringv => 9,
            Self::Timestamp => 11,
            Self::Decimal => 22,
            Self::VarBinary => 25,
        }
    }

    #[must_use]
    pub fn from_i8(b: i8) -> Option<Self> {
        match b {
            3 => Some(Self::TinyInt),
            4 => Some(Self::SmallInt),
            5 => Some(Self::Integer),
            6 => Some(Self::BigInt),
            8 => Some(Self::Float),
            9 => Some(Self::Stringv),
            11 => Some(Self::Timestamp),
            22 => Some(Self::Decimal),
            25 => Some(Self::VarBinary),
            _ => None,
        }
    }
}

/// A single typed, nullable stored-procedure parameter.
///
/// `None` in any variant encodes as that type's null sentinel (spec §3),
/// so callers can send e.g. `Value::Stringv(None)` to pass an explicitly
/// typed STRING null without ambiguity.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    TinyInt(Option<i8>),
    SmallInt(Option<i16>),
    Integer(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Stringv(Option<String>),
    /// Signed microseconds since the Unix epoch; `None` is the TIMESTAMP null.
    Timestamp(Option<i64>),
    /// Raw 16-byte big-endian decimal payload (spec §1: decimal may be exposed raw).
    Decimal(Option<[u8; 16]>),
    VarBinary(Option<Vec<u8>>),
    /// A homogeneous array of scalars of the given element type.
    Array(TypeTag, Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            Self::TinyInt(_) => Some(TypeTag::TinyInt),
            Self::SmallInt(_) => Some(TypeTag::SmallInt),
            Self::Integer(_) => Some(TypeTag::Integer),
            Self::BigInt(_) => Some(TypeTag::BigInt),
            Self::Float(_) => Some(TypeTag::Float),
            Self::Stringv(_) => Some(TypeTag::Stringv),
            Self::Timestamp(_) => Some(TypeTag::Timestamp),
            Self::Decimal(_) => Some(TypeTag::Decimal),
            Self::VarBinary(_) => Some(TypeTag::VarBinary),
            Self::Array(_, _) => None,
        }
    }
}

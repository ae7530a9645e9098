//! Decoded table/row/single-value representations (spec §4.E).

use crate::error::{VoltError, VoltResult};
use crate::value::TypeTag;
use byteorder::{BigEndian, ByteOrder};
use std::cell::OnceCell;

/// One column's worth of decoded values, stored contiguously rather than
/// boxed per cell. The wire is row-major; [`crate::de::read_table`] builds
/// this columnar layout while decoding row by row.
#[derive(Debug, Clone)]
pub enum Column {
    TinyInt(Vec<Option<i8>>),
    SmallInt(Vec<Option<i16>>),
    Integer(Vec<Option<i32>>),
    BigInt(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Stringv(Vec<Option<String>>),
    Timestamp(Vec<Option<i64>>),
    Decimal(Vec<Option<[u8; 16]>>),
    VarBinary(Vec<Option<Vec<u8>>>),
}

impl Column {
    pub(crate) fn empty_for(tag: &TypeTag) -> Self {
        match tag {
            TypeTag::TinyInt => Self::TinyInt(Vec::new()),
            TypeTag::SmallInt => Self::SmallInt(Vec::new()),
            TypeTag::Integer => Self::Integer(Vec::new()),
            TypeTag::BigInt => Self::BigInt(Vec::new()),
            TypeTag::Float => Self::Float(Vec::new()),
            TypeTag::Stringv => Self::Stringv(Vec::new()),
            TypeTag::Timestamp => Self::Timestamp(Vec::new()),
            TypeTag::Decimal => Self::Decimal(Vec::new()),
            TypeTag::VarBinary => Self::VarBinary(Vec::new()),
        }
    }
}

/// A decoded result table: column types and (lazily-decoded) names, plus
/// columnar storage.
#[derive(Debug, Clone)]
pub struct Table {
    column_types: Vec<TypeTag>,
    raw_names: Vec<u8>,
    names: OnceCell<Vec<String>>,
    columns: Vec<Column>,
    row_count: usize,
    custom_status: i8,
}

impl Table {
    pub(crate) fn new(
        column_types: Vec<TypeTag>,
        raw_names: Vec<u8>,
        columns: Vec<Column>,
        row_count: usize,
        custom_status: i8,
    ) -> Self {
        Self { column_types, raw_names, names: OnceCell::new(), columns, row_count, custom_status }
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_types.len()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[must_use]
    pub fn custom_status(&self) -> i8 {
        self.custom_status
    }

    #[must_use]
    pub fn column_type(&self, col: usize) -> TypeTag {
        self.column_types[col]
    }

    /// Decodes column names from the retained raw metadata slice on first
    /// access; subsequent calls reuse the cached `Vec<String>` (spec §9:
    /// "preserve the laziness").
    pub fn column_names(&self) -> VoltResult<&[String]> {
        if let Some(names) = self.names.get() {
            return Ok(names);
        }
        let decoded = decode_column_names(&self.raw_names, self.column_count())?;
        // OnceCell::set can only lose the race against itself, which cannot
        // happen behind `&self` without interior mutation elsewhere.
        let _ = self.names.set(decoded);
        Ok(self.names.get().expect("just set"))
    }

    fn expect_type(&self, col: usize, expected: TypeTag) -> VoltResult<()> {
        let actual = self.column_types[col];
        if actual != expected {
            return Err(VoltError::InvalidCast { col, wire_type: actual, requested: expected });
        }
        Ok(())
    }

    fn check_shape(&self, single_value: bool) -> VoltResult<()> {
        if self.column_count() != 1 {
            return Err(VoltError::ColumnCountMismatch { expected: 1, actual: self.column_count() });
        }
        if single_value && self.row_count() > 1 {
            return Err(VoltError::InvalidRowCount(self.row_count()));
        }
        Ok(())
    }
}

macro_rules! column_accessor {
    ($name:ident, $variant:ident, $t:ty) => {
        impl Table {
            pub fn $name(&self, row: usize, col: usize) -> VoltResult<Option<$t>> {
                self.expect_type(col, TypeTag::$variant)?;
                match &self.columns[col] {
                    Column::$variant(v) => Ok(v[row].clone()),
                    _ => unreachable!("column storage must match its declared type tag"),
                }
            }
        }
    };
}

column_accessor!(get_tinyint, TinyInt, i8);
column_accessor!(get_smallint, SmallInt, i16);
column_accessor!(get_integer, Integer, i32);
column_accessor!(get_bigint, BigInt, i64);
column_accessor!(get_float, Float, f64);
column_accessor!(get_string, Stringv, String);
column_accessor!(get_timestamp, Timestamp, i64);
column_accessor!(get_decimal, Decimal, [u8; 16]);
column_accessor!(get_varbinary, VarBinary, Vec<u8>);

macro_rules! single_value_accessor {
    ($name:ident, $getter:ident, $t:ty) => {
        impl Table {
            /// Validates `column_count == 1` and `row_count <= 1`, then
            /// returns the lone row's value (or `None` for an empty table).
            pub fn $name(&self) -> VoltResult<Option<$t>> {
                self.check_shape(true)?;
                if self.row_count() == 0 {
                    return Ok(None);
                }
                self.$getter(0, 0)
            }
        }
    };
}

single_value_accessor!(single_tinyint, get_tinyint, i8);
single_value_accessor!(single_smallint, get_smallint, i16);
single_value_accessor!(single_integer, get_integer, i32);
single_value_accessor!(single_bigint, get_bigint, i64);
single_value_accessor!(single_float, get_float, f64);
single_value_accessor!(single_string, get_string, String);
single_value_accessor!(single_timestamp, get_timestamp, i64);
single_value_accessor!(single_decimal, get_decimal, [u8; 16]);
single_value_accessor!(single_varbinary, get_varbinary, Vec<u8>);

fn decode_column_names(raw: &[u8], count: usize) -> VoltResult<Vec<String>> {
    let mut names = Vec::with_capacity(count);
    let mut pos = 0usize;
    for _ in 0..count {
        if raw.len() < pos + 4 {
            return Err(VoltError::UnexpectedEof);
        }
        let len = BigEndian::read_i32(&raw[pos..pos + 4]);
        pos += 4;
        if len < 0 || raw.len() < pos + len as usize {
            return Err(VoltError::InvalidLength { len, max: crate::value::MAX_VALUE_LENGTH });
        }
        let bytes = &raw[pos..pos + len as usize];
        pos += len as usize;
        names.push(String::from_utf8(bytes.to_vec()).map_err(VoltError::InvalidColumnName)?);
    }
    Ok(names)
}

/// A table known to hold at most one row (spec §4.E).
#[derive(Debug, Clone)]
pub struct SingleRowTable(Table);

impl SingleRowTable {
    pub(crate) fn from_table(table: Table) -> VoltResult<Self> {
        if table.row_count() > 1 {
            return Err(VoltError::InvalidRowCount(table.row_count()));
        }
        Ok(Self(table))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.row_count() == 0
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.0.column_count()
    }

    #[must_use]
    pub fn table(&self) -> &Table {
        &self.0
    }
}

macro_rules! single_row_accessor {
    ($name:ident, $getter:ident, $t:ty) => {
        impl SingleRowTable {
            pub fn $name(&self, col: usize) -> VoltResult<Option<$t>> {
                if self.is_empty() {
                    return Ok(None);
                }
                self.0.$getter(0, col)
            }
        }
    };
}

single_row_accessor!(get_tinyint, get_tinyint, i8);
single_row_accessor!(get_smallint, get_smallint, i16);
single_row_accessor!(get_integer, get_integer, i32);
single_row_accessor!(get_bigint, get_bigint, i64);
single_row_accessor!(get_float, get_float, f64);
single_row_accessor!(get_string, get_string, String);
single_row_accessor!(get_timestamp, get_timestamp, i64);
single_row_accessor!(get_decimal, get_decimal, [u8; 16]);
single_row_accessor!(get_varbinary, get_varbinary, Vec<u8>);

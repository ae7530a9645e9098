//! Inbound message body parsing: response header, result tables (spec §4.D).

use crate::codec::Reader;
use crate::error::{VoltError, VoltResult};
use crate::response::Reply;
use crate::result::{Column, SingleRowTable, Table};
use crate::status::ServerStatus;
use crate::value::{
    TypeTag, MAX_VALUE_LENGTH, NULL_BIGINT, NULL_DECIMAL, NULL_FLOAT_BITS, NULL_INTEGER, NULL_SMALLINT,
    NULL_TINYINT,
};

const FLAG_STATUS_STRING: u8 = 0x20;
const FLAG_EXCEPTION: u8 = 0x40;
const FLAG_APP_STATUS_STRING: u8 = 0x80;

/// Parses a full response payload into a [`Reply`] (spec §3's "Response payload").
pub fn decode_reply(payload: &[u8]) -> VoltResult<Reply> {
    let mut r = Reader::new(payload);
    let call_id = r.read_i64()? as u64;
    let flags = r.read_u8()?;
    let server_status = ServerStatus::from_i8(r.read_i8()?)?;
    let server_status_string =
        if flags & FLAG_STATUS_STRING != 0 { Some(r.read_string()?) } else { None };
    let application_status = r.read_i8()?;
    let application_status_string =
        if flags & FLAG_APP_STATUS_STRING != 0 { Some(r.read_string()?) } else { None };
    let execution_duration_ms = r.read_i32()?;
    let exception = if flags & FLAG_EXCEPTION != 0 { Some(read_blob(&mut r)?) } else { None };
    let tables = read_table_array(&mut r)?;

    Ok(Reply {
        call_id,
        server_status,
        server_status_string,
        application_status,
        application_status_string,
        execution_duration_ms,
        exception,
        tables,
    })
}

fn read_blob(r: &mut Reader) -> VoltResult<Vec<u8>> {
    let len = r.read_i32()?;
    if len < 0 || len as usize > MAX_VALUE_LENGTH {
        return Err(VoltError::InvalidLength { len, max: MAX_VALUE_LENGTH });
    }
    Ok(r.read_slice(len as usize)?.to_vec())
}

/// Advances past a length-prefixed string without materializing it.
pub fn skip_string(r: &mut Reader) -> VoltResult<()> {
    let len = r.read_i32()?;
    if len < 0 {
        return Ok(());
    }
    r.read_slice(len as usize)?;
    Ok(())
}

fn read_nullable_string(r: &mut Reader) -> VoltResult<Option<String>> {
    let len = r.read_i32()?;
    if len == -1 {
        return Ok(None);
    }
    if len < 0 || len as usize > MAX_VALUE_LENGTH {
        return Err(VoltError::InvalidLength { len, max: MAX_VALUE_LENGTH });
    }
    let bytes = r.read_slice(len as usize)?;
    Ok(Some(String::from_utf8(bytes.to_vec()).map_err(VoltError::InvalidUtf8)?))
}

fn read_nullable_bytes(r: &mut Reader) -> VoltResult<Option<Vec<u8>>> {
    let len = r.read_i32()?;
    if len == -1 {
        return Ok(None);
    }
    if len < 0 || len as usize > MAX_VALUE_LENGTH {
        return Err(VoltError::InvalidLength { len, max: MAX_VALUE_LENGTH });
    }
    Ok(Some(r.read_slice(len as usize)?.to_vec()))
}

fn read_nullable_into_column(r: &mut Reader, tag: TypeTag, col: &mut Column) -> VoltResult<()> {
    match (tag, col) {
        (TypeTag::TinyInt, Column::TinyInt(v)) => {
            let raw = r.read_i8()?;
            v.push((raw != NULL_TINYINT).then_some(raw));
        }
        (TypeTag::SmallInt, Column::SmallInt(v)) => {
            let raw = r.read_i16()?;
            v.push((raw != NULL_SMALLINT).then_some(raw));
        }
        (TypeTag::Integer, Column::Integer(v)) => {
            let raw = r.read_i32()?;
            v.push((raw != NULL_INTEGER).then_some(raw));
        }
        (TypeTag::BigInt, Column::BigInt(v)) => {
            let raw = r.read_i64()?;
            v.push((raw != NULL_BIGINT).then_some(raw));
        }
        (TypeTag::Float, Column::Float(v)) => {
            let bits = r.read_f64_bits()?;
            v.push((bits != NULL_FLOAT_BITS).then(|| f64::from_bits(bits)));
        }
        (TypeTag::Stringv, Column::Stringv(v)) => v.push(read_nullable_string(r)?),
        (TypeTag::Timestamp, Column::Timestamp(v)) => {
            let raw = r.read_i64()?;
            v.push((raw != NULL_BIGINT).then_some(raw));
        }
        (TypeTag::Decimal, Column::Decimal(v)) => {
            let bytes = r.read_slice(16)?;
            let arr: [u8; 16] = bytes.try_into().expect("read_slice(16) returns 16 bytes");
            v.push((arr != NULL_DECIMAL).then_some(arr));
        }
        (TypeTag::VarBinary, Column::VarBinary(v)) => v.push(read_nullable_bytes(r)?),
        _ => unreachable!("column storage must match its declared type tag"),
    }
    Ok(())
}

/// Parses one result table (spec §3's "Result table").
pub fn read_table(r: &mut Reader) -> VoltResult<Table> {
    let _total_len = r.read_i32()?;
    let meta_len = r.read_i32()?;
    let meta_start = r.position();
    let custom_status = r.read_i8()?;
    let column_count = r.read_i16()? as usize;

    let mut column_types = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        let tag_byte = r.read_i8()?;
        column_types.push(TypeTag::from_i8(tag_byte).ok_or(VoltError::UnknownTypeTag(tag_byte))?);
    }

    let meta_end = meta_start + meta_len as usize;
    if meta_end < r.position() {
        return Err(VoltError::UnexpectedEof);
    }
    let raw_names = r.read_slice(meta_end - r.position())?.to_vec();

    let row_count = r.read_i32()? as usize;
    let mut columns: Vec<Column> = column_types.iter().map(Column::empty_for).collect();
    for _ in 0..row_count {
        let _row_len = r.read_i32()?;
        for (col_idx, tag) in column_types.iter().enumerate() {
            read_nullable_into_column(r, *tag, &mut columns[col_idx])?;
        }
    }

    Ok(Table::new(column_types, raw_names, columns, row_count, custom_status))
}

/// Parses a table and validates it has at most one row (spec §4.D, §4.E).
pub fn read_single_row_table(r: &mut Reader) -> VoltResult<SingleRowTable> {
    SingleRowTable::from_table(read_table(r)?)
}

/// Parses tables until the reader is exhausted (spec's "result body (zero or more tables)").
pub fn read_table_array(r: &mut Reader) -> VoltResult<Vec<Table>> {
    let mut tables = Vec::new();
    while r.remaining() > 0 {
        tables.push(read_table(r)?);
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Writer;

    fn build_single_integer_table(value: Option<i32>) -> Vec<u8> {
        let mut body = Writer::with_capacity(64);
        body.write_i8(0).unwrap(); // custom_status
        body.write_i16(1).unwrap(); // column_count
        body.write_i8(TypeTag::Integer.to_i8()).unwrap();
        body.write_i32(3).unwrap(); // name length
        body.write_bytes(b"col").unwrap();
        let meta_len = body.len() as i32;
        let mut row_section = Writer::with_capacity(16);
        row_section.write_i32(4).unwrap(); // row length (value only)
        row_section.write_i32(value.unwrap_or(NULL_INTEGER)).unwrap();

        let mut table = Writer::with_capacity(64);
        let total_len_placeholder = 0i32;
        table.write_i32(total_len_placeholder).unwrap();
        table.write_i32(meta_len).unwrap();
        table.write_bytes(&body.into_vec()).unwrap();
        table.write_i32(1).unwrap(); // row_count
        table.write_bytes(&row_section.into_vec()).unwrap();
        table.into_vec()
    }

    #[test]
    fn decodes_single_row_integer_table() {
        let bytes = build_single_integer_table(Some(42));
        let mut r = Reader::new(&bytes);
        let table = read_table(&mut r).unwrap();
        assert_eq!(table.column_count(), 1);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.get_integer(0, 0).unwrap(), Some(42));
        assert_eq!(table.column_names().unwrap(), &["col".to_string()]);
    }

    #[test]
    fn null_integer_round_trips_as_none() {
        let bytes = build_single_integer_table(None);
        let mut r = Reader::new(&bytes);
        let table = read_table(&mut r).unwrap();
        assert_eq!(table.get_integer(0, 0).unwrap(), None);
    }

    #[test]
    fn single_row_table_rejects_multiple_rows() {
        let mut body = Writer::with_capacity(64);
        body.write_i8(0).unwrap();
        body.write_i16(1).unwrap();
        body.write_i8(TypeTag::Integer.to_i8()).unwrap();
        body.write_i32(1).unwrap();
        body.write_bytes(b"c").unwrap();
        let meta_len = body.len() as i32;

        let mut table = Writer::with_capacity(64);
        table.write_i32(0).unwrap();
        table.write_i32(meta_len).unwrap();
        table.write_bytes(&body.into_vec()).unwrap();
        table.write_i32(2).unwrap(); // row_count = 2
        for v in [1i32, 2i32] {
            table.write_i32(4).unwrap();
            table.write_i32(v).unwrap();
        }
        let bytes = table.into_vec();
        let mut r = Reader::new(&bytes);
        let err = read_single_row_table(&mut r).unwrap_err();
        assert!(matches!(err, VoltError::InvalidRowCount(2)));
    }
}

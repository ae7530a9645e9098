//! Outbound message body construction: procedure name, call id, parameters (spec §4.C).

use crate::codec::Writer;
use crate::error::{VoltError, VoltResult};
use crate::value::{
    TypeTag, Value, ARRAY_TAG, MAX_VALUE_LENGTH, NULL_BIGINT, NULL_DECIMAL, NULL_FLOAT_BITS, NULL_INTEGER,
    NULL_SMALLINT, NULL_TINYINT,
};

/// Builds a full stored-procedure call payload: name, call id, parameter list.
pub fn encode_call(procedure: &str, call_id: u64, params: &[Value]) -> VoltResult<Vec<u8>> {
    let mut w = Writer::with_capacity(32 + procedure.len() + params.len() * 16);
    w.write_string(procedure)?;
    w.write_i64(call_id as i64)?;
    write_parameters(&mut w, params)?;
    Ok(w.into_vec())
}

/// Writes a 2-byte count followed by each parameter's tag and encoded value.
pub fn write_parameters(w: &mut Writer, params: &[Value]) -> VoltResult<()> {
    if params.len() > i16::MAX as usize {
        return Err(VoltError::UnsupportedParameterType("parameter list too long"));
    }
    w.write_i16(params.len() as i16)?;
    for p in params {
        write_value(w, p)?;
    }
    Ok(())
}

fn write_value(w: &mut Writer, v: &Value) -> VoltResult<()> {
    match v {
        Value::Array(elem_tag, elems) => {
            w.write_i8(ARRAY_TAG)?;
            w.write_i8(elem_tag.to_i8())?;
            if elems.len() > i16::MAX as usize {
                return Err(VoltError::UnsupportedParameterType("array too long"));
            }
            w.write_i16(elems.len() as i16)?;
            for e in elems {
                write_scalar_body(w, e)?;
            }
            Ok(())
        }
        other => {
            let tag = other.type_tag().expect("non-array values carry a type tag");
            w.write_i8(tag.to_i8())?;
            write_scalar_body(w, other)
        }
    }
}

/// Writes a value's body without its leading type tag, so array elements
/// (which share one tag for the whole array) can reuse it.
fn write_scalar_body(w: &mut Writer, v: &Value) -> VoltResult<()> {
    match v {
        Value::TinyInt(opt) => w.write_i8(opt.unwrap_or(NULL_TINYINT)),
        Value::SmallInt(opt) => w.write_i16(opt.unwrap_or(NULL_SMALLINT)),
        Value::Integer(opt) => w.write_i32(opt.unwrap_or(NULL_INTEGER)),
        Value::BigInt(opt) => w.write_i64(opt.unwrap_or(NULL_BIGINT)),
        Value::Float(opt) => w.write_f64_bits(opt.map(f64::to_bits).unwrap_or(NULL_FLOAT_BITS)),
        Value::Stringv(opt) => write_nullable_string(w, opt.as_deref()),
        Value::Timestamp(opt) => w.write_i64(opt.unwrap_or(NULL_BIGINT)),
        Value::Decimal(opt) => w.write_bytes(&opt.unwrap_or(NULL_DECIMAL)),
        Value::VarBinary(opt) => write_nullable_bytes(w, opt.as_deref()),
        Value::Array(..) => Err(VoltError::UnsupportedParameterType("nested array")),
    }
}

fn write_nullable_string(w: &mut Writer, s: Option<&str>) -> VoltResult<()> {
    match s {
        None => w.write_i32(-1),
        Some(s) => {
            if s.len() > MAX_VALUE_LENGTH {
                return Err(VoltError::StringTooLong { len: s.len(), max: MAX_VALUE_LENGTH });
            }
            w.write_i32(s.len() as i32)?;
            w.write_bytes(s.as_bytes())
        }
    }
}

fn write_nullable_bytes(w: &mut Writer, b: Option<&[u8]>) -> VoltResult<()> {
    match b {
        None => w.write_i32(-1),
        Some(b) => {
            if b.len() > MAX_VALUE_LENGTH {
                return Err(VoltError::StringTooLong { len: b.len(), max: MAX_VALUE_LENGTH });
            }
            w.write_i32(b.len() as i32)?;
            w.write_bytes(b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_parameter_matches_wire_shape() {
        let payload = encode_call("Echo", 100, &[Value::Integer(Some(1))]).unwrap();
        // "Echo" with 4-byte len prefix, 8-byte call id, 2-byte count, tag, 4-byte value.
        let expected_len = 4 + 4 + 8 + 2 + 1 + 4;
        assert_eq!(payload.len(), expected_len);
        assert_eq!(&payload[0..4], &4i32.to_be_bytes());
        assert_eq!(&payload[4..8], b"Echo");
        assert_eq!(&payload[8..16], &100i64.to_be_bytes());
        assert_eq!(&payload[16..18], &1i16.to_be_bytes());
        assert_eq!(payload[18], TypeTag::Integer.to_i8() as u8);
        assert_eq!(&payload[19..23], &1i32.to_be_bytes());
    }

    #[test]
    fn null_timestamp_encodes_bigint_sentinel() {
        let mut w = Writer::with_capacity(16);
        write_value(&mut w, &Value::Timestamp(None)).unwrap();
        let buf = w.into_vec();
        assert_eq!(buf[0], TypeTag::Timestamp.to_i8() as u8);
        assert_eq!(&buf[1..9], &NULL_BIGINT.to_be_bytes());
    }

    #[test]
    fn oversize_string_fails_synchronously() {
        let s = "a".repeat(MAX_VALUE_LENGTH + 1);
        let err = encode_call("S", 1, &[Value::Stringv(Some(s))]).unwrap_err();
        match err {
            VoltError::StringTooLong { len, max } => {
                assert_eq!(len, MAX_VALUE_LENGTH + 1);
                assert_eq!(max, MAX_VALUE_LENGTH);
            }
            other => panic!("expected StringTooLong, got {other:?}"),
        }
    }

    #[test]
    fn array_elements_have_no_per_element_tag() {
        let mut w = Writer::with_capacity(16);
        write_value(&mut w, &Value::Array(TypeTag::Integer, vec![Value::Integer(Some(1)), Value::Integer(Some(2))]))
            .unwrap();
        let buf = w.into_vec();
        assert_eq!(buf[0], crate::value::ARRAY_TAG as u8);
        assert_eq!(buf[1], TypeTag::Integer.to_i8() as u8);
        assert_eq!(&buf[2..4], &2i16.to_be_bytes());
        assert_eq!(&buf[4..8], &1i32.to_be_bytes());
        assert_eq!(&buf[8..12], &2i32.to_be_bytes());
    }

    #[test]
    fn parameter_count_prefix_matches_list_length() {
        let mut w = Writer::with_capacity(16);
        write_parameters(&mut w, &[Value::TinyInt(Some(1)), Value::TinyInt(Some(2)), Value::TinyInt(Some(3))])
            .unwrap();
        let buf = w.into_vec();
        assert_eq!(&buf[0..2], &3i16.to_be_bytes());
    }
}

//! The built-in scalar set and its acceptance/serialization hooks.

use crate::{
    ast::InputValue,
    executor::FieldError,
    schema::meta::{MetaType, ScalarMeta},
    value::Value,
};

macro_rules! int_scalar {
    ($parse:ident, $serialize:ident, $name:literal, $min:expr, $max:expr) => {
        fn $parse(v: &InputValue) -> Result<(), FieldError> {
            match v {
                InputValue::Int(i) if ($min..=$max).contains(i) => Ok(()),
                InputValue::Int(i) => Err(FieldError::from(format!(
                    "{} cannot represent {i}: out of range",
                    $name,
                ))),
                _ => Err(FieldError::from(format!(
                    "{} cannot represent non-integer value",
                    $name,
                ))),
            }
        }

        fn $serialize(v: &Value) -> Result<Value, FieldError> {
            match v {
                Value::Int(i) if ($min..=$max).contains(i) => Ok(Value::Int(*i)),
                v => Err(FieldError::from(format!(
                    "cannot serialize {v} as {}",
                    $name,
                ))),
            }
        }
    };
}

int_scalar!(parse_int, serialize_int, "Int", i64::MIN, i64::MAX);
int_scalar!(parse_int8, serialize_int8, "Int8", i8::MIN as i64, i8::MAX as i64);
int_scalar!(parse_int16, serialize_int16, "Int16", i16::MIN as i64, i16::MAX as i64);
int_scalar!(parse_int32, serialize_int32, "Int32", i32::MIN as i64, i32::MAX as i64);
int_scalar!(parse_int64, serialize_int64, "Int64", i64::MIN, i64::MAX);
int_scalar!(parse_uint, serialize_uint, "Uint", 0, i64::MAX);
int_scalar!(parse_uint8, serialize_uint8, "Uint8", 0, u8::MAX as i64);
int_scalar!(parse_uint16, serialize_uint16, "Uint16", 0, u16::MAX as i64);
int_scalar!(parse_uint32, serialize_uint32, "Uint32", 0, u32::MAX as i64);
int_scalar!(parse_uint64, serialize_uint64, "Uint64", 0, i64::MAX);

fn parse_float(v: &InputValue) -> Result<(), FieldError> {
    match v {
        InputValue::Int(..) | InputValue::Float(..) => Ok(()),
        _ => Err("Float cannot represent non-numeric value".into()),
    }
}

fn serialize_float(v: &Value) -> Result<Value, FieldError> {
    v.as_float_value()
        .map(Value::Float)
        .ok_or_else(|| format!("cannot serialize {v} as Float").into())
}

fn parse_string(v: &InputValue) -> Result<(), FieldError> {
    match v {
        InputValue::String(..) => Ok(()),
        _ => Err("String cannot represent non-string value".into()),
    }
}

fn serialize_string(v: &Value) -> Result<Value, FieldError> {
    match v {
        Value::String(s) => Ok(Value::String(s.clone())),
        v => Err(format!("cannot serialize {v} as String").into()),
    }
}

fn parse_boolean(v: &InputValue) -> Result<(), FieldError> {
    match v {
        InputValue::Boolean(..) => Ok(()),
        _ => Err("Boolean cannot represent non-boolean value".into()),
    }
}

fn serialize_boolean(v: &Value) -> Result<Value, FieldError> {
    match v {
        Value::Boolean(b) => Ok(Value::Boolean(*b)),
        v => Err(format!("cannot serialize {v} as Boolean").into()),
    }
}

// IDs travel as strings but accept integer literals for convenience.
fn parse_id(v: &InputValue) -> Result<(), FieldError> {
    match v {
        InputValue::String(..) | InputValue::Int(..) => Ok(()),
        _ => Err("ID cannot represent value other than string or integer".into()),
    }
}

fn serialize_id(v: &Value) -> Result<Value, FieldError> {
    match v {
        Value::String(s) => Ok(Value::String(s.clone())),
        Value::Int(i) => Ok(Value::String(i.to_string())),
        v => Err(format!("cannot serialize {v} as ID").into()),
    }
}

fn parse_map(v: &InputValue) -> Result<(), FieldError> {
    match v {
        InputValue::Object(..) | InputValue::String(..) => Ok(()),
        _ => Err("Map cannot represent value other than object or string".into()),
    }
}

fn serialize_map(v: &Value) -> Result<Value, FieldError> {
    match v {
        Value::Object(..) => Ok(v.clone()),
        v => Err(format!("cannot serialize {v} as Map").into()),
    }
}

fn parse_time(v: &InputValue) -> Result<(), FieldError> {
    match v {
        InputValue::String(..) => Ok(()),
        _ => Err("Time cannot represent non-string value".into()),
    }
}

fn serialize_time(v: &Value) -> Result<Value, FieldError> {
    match v {
        Value::String(s) => Ok(Value::String(s.clone())),
        v => Err(format!("cannot serialize {v} as Time").into()),
    }
}

fn parse_bytes(v: &InputValue) -> Result<(), FieldError> {
    match v {
        InputValue::String(..) => Ok(()),
        _ => Err("Bytes cannot represent non-string value".into()),
    }
}

fn serialize_bytes(v: &Value) -> Result<Value, FieldError> {
    match v {
        Value::String(s) => Ok(Value::String(s.clone())),
        v => Err(format!("cannot serialize {v} as Bytes").into()),
    }
}

/// The scalar metas every schema starts out with.
pub(crate) fn builtins() -> Vec<MetaType> {
    vec![
        ScalarMeta::new("Int", parse_int, serialize_int).into_meta(),
        ScalarMeta::new("Int8", parse_int8, serialize_int8).into_meta(),
        ScalarMeta::new("Int16", parse_int16, serialize_int16).into_meta(),
        ScalarMeta::new("Int32", parse_int32, serialize_int32).into_meta(),
        ScalarMeta::new("Int64", parse_int64, serialize_int64).into_meta(),
        ScalarMeta::new("Uint", parse_uint, serialize_uint).into_meta(),
        ScalarMeta::new("Uint8", parse_uint8, serialize_uint8).into_meta(),
        ScalarMeta::new("Uint16", parse_uint16, serialize_uint16).into_meta(),
        ScalarMeta::new("Uint32", parse_uint32, serialize_uint32).into_meta(),
        ScalarMeta::new("Uint64", parse_uint64, serialize_uint64).into_meta(),
        ScalarMeta::new("Float", parse_float, serialize_float).into_meta(),
        ScalarMeta::new("Float64", parse_float, serialize_float).into_meta(),
        ScalarMeta::new("String", parse_string, serialize_string).into_meta(),
        ScalarMeta::new("Boolean", parse_boolean, serialize_boolean).into_meta(),
        ScalarMeta::new("ID", parse_id, serialize_id).into_meta(),
        ScalarMeta::new("Map", parse_map, serialize_map).into_meta(),
        ScalarMeta::new("Time", parse_time, serialize_time).into_meta(),
        ScalarMeta::new("Bytes", parse_bytes, serialize_bytes).into_meta(),
    ]
}

#[cfg(test)]
mod tests {
    use crate::{ast::InputValue, value::Value};

    use super::{parse_boolean, parse_id, parse_int32, parse_uint8, serialize_id, serialize_int32};

    #[test]
    fn int32_width_is_enforced() {
        assert!(parse_int32(&InputValue::int(i32::MAX as i64)).is_ok());
        assert!(parse_int32(&InputValue::int(i32::MIN as i64)).is_ok());
        assert!(parse_int32(&InputValue::int(i32::MAX as i64 + 1)).is_err());
        assert!(parse_int32(&InputValue::float(1.0)).is_err());

        assert!(serialize_int32(&Value::Int(12)).is_ok());
        assert!(serialize_int32(&Value::Int(i32::MAX as i64 + 1)).is_err());
    }

    #[test]
    fn uint_widths_reject_negatives() {
        assert!(parse_uint8(&InputValue::int(255)).is_ok());
        assert!(parse_uint8(&InputValue::int(256)).is_err());
        assert!(parse_uint8(&InputValue::int(-1)).is_err());
    }

    #[test]
    fn boolean_accepts_only_booleans() {
        assert!(parse_boolean(&InputValue::boolean(true)).is_ok());
        assert!(parse_boolean(&InputValue::int(1)).is_err());
        assert!(parse_boolean(&InputValue::string("true")).is_err());
    }

    #[test]
    fn id_accepts_strings_and_integers() {
        assert!(parse_id(&InputValue::string("abc")).is_ok());
        assert!(parse_id(&InputValue::int(42)).is_ok());
        assert!(parse_id(&InputValue::boolean(false)).is_err());

        assert_eq!(
            serialize_id(&Value::Int(42)).unwrap(),
            Value::String("42".into()),
        );
    }
}

//! Wire format of the remote API.
//!
//! Requests are CBOR maps `{func, args, uuid, ver, lang}`. Replies are CBOR
//! maps carrying either `ret` (array of return values) or `err`. Older
//! servers answer `{success: false, error}` on failure instead.

use ciborium::Value;
use nalgebra::Vector3;
use quadcap_core::SimError;

pub const PROTOCOL_VERSION: i64 = 2;
pub const LANG: &str = "rust";

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn field<'a>(entries: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    entries
        .iter()
        .find(|(k, _)| k.as_text() == Some(key))
        .map(|(_, v)| v)
}

fn describe(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => format!("{other:?}"),
    }
}

fn unexpected(func: &str, detail: impl Into<String>) -> SimError {
    SimError::UnexpectedReply {
        func: func.to_string(),
        detail: detail.into(),
    }
}

/// Encode one function call.
pub fn encode_request(func: &str, args: Vec<Value>, uuid: &str) -> Result<Vec<u8>, SimError> {
    let request = Value::Map(vec![
        (text("func"), text(func)),
        (text("args"), Value::Array(args)),
        (text("uuid"), text(uuid)),
        (text("ver"), Value::Integer(PROTOCOL_VERSION.into())),
        (text("lang"), text(LANG)),
    ]);

    let mut buf = Vec::new();
    ciborium::into_writer(&request, &mut buf).map_err(|e| SimError::Codec(e.to_string()))?;
    Ok(buf)
}

/// Decode the reply to `func` into its return values.
pub fn decode_reply(func: &str, bytes: &[u8]) -> Result<Vec<Value>, SimError> {
    let reply: Value = ciborium::from_reader(bytes).map_err(|e| SimError::Codec(e.to_string()))?;
    let Value::Map(entries) = reply else {
        return Err(unexpected(func, "reply is not a map"));
    };

    if let Some(err) = field(&entries, "err") {
        return Err(SimError::Remote {
            func: func.to_string(),
            message: describe(err),
        });
    }

    if let Some(Value::Bool(false)) = field(&entries, "success") {
        let message = field(&entries, "error")
            .map(describe)
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(SimError::Remote {
            func: func.to_string(),
            message,
        });
    }

    match field(&entries, "ret") {
        Some(Value::Array(values)) => Ok(values.clone()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => Ok(vec![other.clone()]),
    }
}

pub fn int_arg(value: i64) -> Value {
    Value::Integer(value.into())
}

pub fn vector_arg(v: &Vector3<f64>) -> Value {
    Value::Array(v.iter().map(|c| Value::Float(*c)).collect())
}

pub fn as_f64(func: &str, value: &Value) -> Result<f64, SimError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(i128::from(*i) as f64),
        other => Err(unexpected(func, format!("expected a number, got {other:?}"))),
    }
}

pub fn as_i64(func: &str, value: &Value) -> Result<i64, SimError> {
    match value {
        Value::Integer(i) => i64::try_from(*i).map_err(|_| unexpected(func, "integer out of range")),
        other => Err(unexpected(func, format!("expected an integer, got {other:?}"))),
    }
}

pub fn as_vector3(func: &str, value: &Value) -> Result<Vector3<f64>, SimError> {
    match value {
        Value::Array(items) if items.len() == 3 => Ok(Vector3::new(
            as_f64(func, &items[0])?,
            as_f64(func, &items[1])?,
            as_f64(func, &items[2])?,
        )),
        other => Err(unexpected(func, format!("expected 3 numbers, got {other:?}"))),
    }
}

/// Image buffers arrive as a byte string; some servers send an array of ints.
pub fn as_bytes(func: &str, value: &Value) -> Result<Vec<u8>, SimError> {
    match value {
        Value::Bytes(bytes) => Ok(bytes.clone()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                let v = as_i64(func, item)?;
                u8::try_from(v).map_err(|_| unexpected(func, format!("byte out of range: {v}")))
            })
            .collect(),
        other => Err(unexpected(func, format!("expected a byte buffer, got {other:?}"))),
    }
}

/// First return value, or an error naming the call.
pub fn first<'a>(func: &str, values: &'a [Value]) -> Result<&'a Value, SimError> {
    values.first().ok_or_else(|| unexpected(func, "no return value"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(value: &Value) -> Vec<u8> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).unwrap();
        buf
    }

    fn reply(entries: Vec<(&str, Value)>) -> Vec<u8> {
        encode(&Value::Map(entries.into_iter().map(|(k, v)| (text(k), v)).collect()))
    }

    #[test]
    fn test_request_fields() {
        let bytes = encode_request("sim.getObject", vec![text("/target")], "abc-123").unwrap();
        let Value::Map(entries) = ciborium::from_reader::<Value, _>(bytes.as_slice()).unwrap() else {
            panic!("request is not a map");
        };

        assert_eq!(field(&entries, "func").and_then(Value::as_text), Some("sim.getObject"));
        assert_eq!(field(&entries, "uuid").and_then(Value::as_text), Some("abc-123"));
        assert_eq!(field(&entries, "lang").and_then(Value::as_text), Some("rust"));
        assert_eq!(field(&entries, "ver"), Some(&int_arg(2)));
        assert_eq!(field(&entries, "args"), Some(&Value::Array(vec![text("/target")])));
    }

    #[test]
    fn test_ret_values_returned() {
        let bytes = reply(vec![("ret", Value::Array(vec![int_arg(42)]))]);
        let values = decode_reply("sim.getObject", &bytes).unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(as_i64("sim.getObject", &values[0]).unwrap(), 42);
    }

    #[test]
    fn test_missing_ret_is_empty() {
        let bytes = reply(vec![]);
        assert!(decode_reply("sim.step", &bytes).unwrap().is_empty());
    }

    #[test]
    fn test_err_becomes_remote_error() {
        let bytes = reply(vec![("err", text("object does not exist"))]);
        let err = decode_reply("sim.getObject", &bytes).unwrap_err();

        match err {
            SimError::Remote { func, message } => {
                assert_eq!(func, "sim.getObject");
                assert_eq!(message, "object does not exist");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_legacy_failure_reply() {
        let bytes = reply(vec![("success", Value::Bool(false)), ("error", text("bad handle"))]);
        let err = decode_reply("sim.getObjectPosition", &bytes).unwrap_err();
        assert!(matches!(err, SimError::Remote { message, .. } if message == "bad handle"));
    }

    #[test]
    fn test_non_map_reply_rejected() {
        let bytes = encode(&int_arg(7));
        let err = decode_reply("sim.step", &bytes).unwrap_err();
        assert!(matches!(err, SimError::UnexpectedReply { .. }));
    }

    #[test]
    fn test_garbage_is_codec_error() {
        let err = decode_reply("sim.step", &[0xff, 0x00]).unwrap_err();
        assert!(matches!(err, SimError::Codec(_)));
    }

    #[test]
    fn test_vector_conversion_accepts_integers() {
        let value = Value::Array(vec![Value::Float(0.5), int_arg(2), Value::Float(-1.0)]);
        assert_eq!(as_vector3("f", &value).unwrap(), Vector3::new(0.5, 2.0, -1.0));

        let short = Value::Array(vec![Value::Float(0.5)]);
        assert!(as_vector3("f", &short).is_err());
    }

    #[test]
    fn test_byte_buffers() {
        assert_eq!(as_bytes("f", &Value::Bytes(vec![1, 2, 3])).unwrap(), vec![1, 2, 3]);
        assert_eq!(as_bytes("f", &Value::Array(vec![int_arg(9), int_arg(255)])).unwrap(), vec![9, 255]);
        assert!(as_bytes("f", &Value::Array(vec![int_arg(256)])).is_err());
    }
}

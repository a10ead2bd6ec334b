use bytes::{Buf, BufMut};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Size of the per-field header: 1 byte tag + 2 bytes payload length.
pub const FIELD_HEADER_SIZE: usize = 3;

/// Data types supported by the engine
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int32 = 0,
    Float32 = 1,
    Text = 2,
}

impl DataType {
    pub fn from_u8(value: u8) -> Result<Self, ValueError> {
        match value {
            0 => Ok(DataType::Int32),
            1 => Ok(DataType::Float32),
            2 => Ok(DataType::Text),
            _ => Err(ValueError::Decode(format!("unknown data type tag {}", value))),
        }
    }
}

/// Errors raised when values are combined, compared, encoded or decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("Type mismatch: cannot combine {left:?} with {right:?}")]
    TypeMismatch { left: DataType, right: DataType },

    #[error("{operation} is not supported for {data_type:?}")]
    Unsupported {
        operation: &'static str,
        data_type: DataType,
    },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// A single typed field value. Values are immutable once built and are
/// cloned, never shared, when they cross operator boundaries.
#[derive(Debug, Clone)]
pub enum Value {
    Int32(i32),
    Float32(f32),
    Text(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int32(_) => DataType::Int32,
            Value::Float32(_) => DataType::Float32,
            Value::Text(_) => DataType::Text,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Compare two values of the same type.
    ///
    /// Floats are ordered with IEEE 754 `totalOrder`, so NaN sorts above
    /// every other value instead of being incomparable.
    pub fn compare(&self, other: &Value) -> Result<Ordering, ValueError> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Ok(a.cmp(b)),
            (Value::Float32(a), Value::Float32(b)) => Ok(a.total_cmp(b)),
            (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
            _ => Err(self.mismatch(other)),
        }
    }

    /// Add two values of the same numeric type. Integer addition wraps.
    pub fn add(&self, other: &Value) -> Result<Value, ValueError> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(a.wrapping_add(*b))),
            (Value::Float32(a), Value::Float32(b)) => Ok(Value::Float32(a + b)),
            (Value::Text(_), Value::Text(_)) => Err(ValueError::Unsupported {
                operation: "addition",
                data_type: DataType::Text,
            }),
            _ => Err(self.mismatch(other)),
        }
    }

    fn mismatch(&self, other: &Value) -> ValueError {
        ValueError::TypeMismatch {
            left: self.data_type(),
            right: other.data_type(),
        }
    }

    /// Number of bytes `encode` writes for this value.
    pub fn encoded_size(&self) -> usize {
        FIELD_HEADER_SIZE + self.payload_len()
    }

    fn payload_len(&self) -> usize {
        match self {
            Value::Int32(_) | Value::Float32(_) => 4,
            Value::Text(s) => s.len(),
        }
    }

    /// Append `tag, length, payload` to `buf`.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> Result<(), ValueError> {
        let len = self.payload_len();
        let len = u16::try_from(len)
            .map_err(|_| ValueError::Encode(format!("field payload of {} bytes is too long", len)))?;
        buf.put_u8(self.data_type() as u8);
        buf.put_u16_le(len);
        match self {
            Value::Int32(v) => buf.put_i32_le(*v),
            Value::Float32(v) => buf.put_f32_le(*v),
            Value::Text(s) => buf.put_slice(s.as_bytes()),
        }
        Ok(())
    }

    /// Read one field from the front of `buf`, advancing it.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Value, ValueError> {
        if buf.remaining() < FIELD_HEADER_SIZE {
            return Err(ValueError::Decode("truncated field header".to_string()));
        }
        let data_type = DataType::from_u8(buf.get_u8())?;
        let len = buf.get_u16_le() as usize;
        if buf.remaining() < len {
            return Err(ValueError::Decode(format!(
                "field needs {} bytes, only {} left",
                len,
                buf.remaining()
            )));
        }

        match data_type {
            DataType::Int32 | DataType::Float32 if len != 4 => Err(ValueError::Decode(format!(
                "{:?} field has width {}",
                data_type, len
            ))),
            DataType::Int32 => Ok(Value::Int32(buf.get_i32_le())),
            DataType::Float32 => Ok(Value::Float32(buf.get_f32_le())),
            DataType::Text => {
                let mut bytes = vec![0u8; len];
                buf.copy_to_slice(&mut bytes);
                String::from_utf8(bytes)
                    .map(Value::Text)
                    .map_err(|e| ValueError::Decode(e.to_string()))
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Float32(a), Value::Float32(b)) => a.to_bits() == b.to_bits(),
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data_type().hash(state);
        match self {
            Value::Int32(v) => v.hash(state),
            Value::Float32(v) => v.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float32(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn round_trip(value: &Value) -> Result<Value> {
        let mut buf = Vec::new();
        value.encode(&mut buf)?;
        assert_eq!(buf.len(), value.encoded_size());
        Ok(Value::decode(&mut buf.as_slice())?)
    }

    #[test]
    fn test_data_type_conversion() -> Result<()> {
        assert_eq!(DataType::from_u8(0)?, DataType::Int32);
        assert_eq!(DataType::from_u8(1)?, DataType::Float32);
        assert_eq!(DataType::from_u8(2)?, DataType::Text);
        assert!(DataType::from_u8(99).is_err());
        Ok(())
    }

    #[test]
    fn test_encode_decode() -> Result<()> {
        for value in [
            Value::Int32(-42),
            Value::Float32(132.04),
            Value::Text("hello world".to_string()),
            Value::Text(String::new()),
        ] {
            assert_eq!(round_trip(&value)?, value);
        }
        Ok(())
    }

    #[test]
    fn test_text_with_embedded_nul() -> Result<()> {
        let value = Value::Text("a\0b c".to_string());
        assert_eq!(round_trip(&value)?, value);
        Ok(())
    }

    #[test]
    fn test_compare_same_type() -> Result<()> {
        assert_eq!(Value::Int32(1).compare(&Value::Int32(2))?, Ordering::Less);
        assert_eq!(
            Value::Float32(2.5).compare(&Value::Float32(2.5))?,
            Ordering::Equal
        );
        assert_eq!(
            Value::from("b").compare(&Value::from("a"))?,
            Ordering::Greater
        );
        Ok(())
    }

    #[test]
    fn test_compare_type_mismatch() {
        let err = Value::Int32(1).compare(&Value::Float32(1.0)).unwrap_err();
        assert_eq!(
            err,
            ValueError::TypeMismatch {
                left: DataType::Int32,
                right: DataType::Float32
            }
        );
    }

    #[test]
    fn test_add() -> Result<()> {
        assert_eq!(Value::Int32(10).add(&Value::Int32(20))?, Value::Int32(30));
        assert_eq!(
            Value::Float32(1.5).add(&Value::Float32(1.0))?,
            Value::Float32(2.5)
        );
        assert!(Value::from("a").add(&Value::from("b")).is_err());
        assert!(Value::Int32(1).add(&Value::Float32(1.0)).is_err());
        Ok(())
    }

    #[test]
    fn test_decode_rejects_bad_width() {
        // Int32 tag with a 2-byte payload
        let bytes = [0u8, 2, 0, 1, 2];
        assert!(Value::decode(&mut &bytes[..]).is_err());
    }

    #[test]
    fn test_encode_rejects_oversized_text() {
        let value = Value::Text("x".repeat(70_000));
        let mut buf = Vec::new();
        assert!(matches!(value.encode(&mut buf), Err(ValueError::Encode(_))));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        let bytes = [2u8, 10, 0, b'a'];
        assert!(Value::decode(&mut &bytes[..]).is_err());
    }
}

//! Property values and their byte encoding.
//!
//! [`Value`] is the dynamic type that holds any property value a query can
//! mention. [`DataType`] names the four storable kinds and drives parsing
//! and deserialization.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::utils::error::{Error, Result};

/// The possible data types of stored property values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 32-bit signed integer.
    Int,
    /// 64-bit IEEE-754 floating point.
    Double,
    /// True or false.
    Boolean,
    /// UTF-8 string.
    String,
}

impl DataType {
    /// Maps a type name to a [`DataType`], ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a validation error for names outside the four supported kinds.
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "INT" => Ok(DataType::Int),
            "DOUBLE" => Ok(DataType::Double),
            "BOOLEAN" => Ok(DataType::Boolean),
            "STRING" => Ok(DataType::String),
            _ => Err(Error::Validation {
                message: format!("the data type {name} is not supported"),
            }),
        }
    }

    /// Parses literal text into a [`Value`] of this type.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the text cannot be cast to this type.
    pub fn parse_value(self, text: &str) -> Result<Value> {
        let cast_error = || Error::Validation {
            message: format!("the value {text} cannot be parsed as {self}"),
        };
        match self {
            DataType::Int => text
                .parse::<i32>()
                .map(Value::Int)
                .map_err(|_| cast_error()),
            DataType::Double => text
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| cast_error()),
            DataType::Boolean => match text.to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(cast_error()),
            },
            DataType::String => Ok(Value::String(ArcStr::from(text))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int => "INT",
            DataType::Double => "DOUBLE",
            DataType::Boolean => "BOOLEAN",
            DataType::String => "STRING",
        };
        write!(f, "{name}")
    }
}

/// A dynamically-typed property value.
///
/// Vertices and edges carry properties of these kinds. `Null` only appears
/// transiently in query output for unresolved properties; it is not storable
/// and has no byte encoding.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Missing value in query output.
    Null,
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit floating point.
    Double(f64),
    /// Boolean value.
    Boolean(bool),
    /// UTF-8 string (ArcStr for cheap cloning).
    String(ArcStr),
}

impl Value {
    /// Returns the integer value if this is an Int, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float value if this is a Double, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the boolean value if this is a Boolean, otherwise None.
    #[inline]
    #[must_use]
    pub const fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string value if this is a String, otherwise None.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the [`DataType`] of this value, or None for `Null`.
    #[must_use]
    pub const fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(DataType::Int),
            Value::Double(_) => Some(DataType::Double),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::String(_) => Some(DataType::String),
        }
    }

    /// Compares two values numerically or lexicographically.
    ///
    /// Int and Double compare through f64. Incomparable kinds return None.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Double(b)) => f64::from(*a).partial_cmp(b),
            (Value::Double(a), Value::Int(b)) => a.partial_cmp(&f64::from(*b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Serializes this value to its byte encoding.
    ///
    /// INT is 4 bytes little-endian; DOUBLE is the IEEE-754 bit pattern in
    /// big-endian byte order; BOOLEAN is a single 0/1 byte; STRING is a
    /// 4-byte big-endian length prefix followed by the UTF-8 bytes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for `Null`, which has no encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Value::Null => Err(Error::Validation {
                message: "a null value cannot be serialized".to_string(),
            }),
            Value::Int(i) => Ok(i.to_le_bytes().to_vec()),
            Value::Double(d) => Ok(d.to_bits().to_be_bytes().to_vec()),
            Value::Boolean(b) => Ok(vec![u8::from(*b)]),
            Value::String(s) => {
                let utf8 = s.as_bytes();
                let mut bytes = Vec::with_capacity(4 + utf8.len());
                bytes.extend_from_slice(&(utf8.len() as u32).to_be_bytes());
                bytes.extend_from_slice(utf8);
                Ok(bytes)
            }
        }
    }

    /// Deserializes a value of the given type from its byte encoding.
    ///
    /// # Errors
    ///
    /// Returns a validation error on truncated input or invalid UTF-8.
    pub fn from_bytes(data_type: DataType, bytes: &[u8]) -> Result<Value> {
        let truncated = || Error::Validation {
            message: format!("truncated {data_type} encoding of {} bytes", bytes.len()),
        };
        match data_type {
            DataType::Int => {
                let raw: [u8; 4] = bytes.try_into().map_err(|_| truncated())?;
                Ok(Value::Int(i32::from_le_bytes(raw)))
            }
            DataType::Double => {
                let raw: [u8; 8] = bytes.try_into().map_err(|_| truncated())?;
                Ok(Value::Double(f64::from_bits(u64::from_be_bytes(raw))))
            }
            DataType::Boolean => match bytes {
                [b] => Ok(Value::Boolean(*b == 1)),
                _ => Err(truncated()),
            },
            DataType::String => {
                if bytes.len() < 4 {
                    return Err(truncated());
                }
                let (prefix, rest) = bytes.split_at(4);
                let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
                if rest.len() != len {
                    return Err(truncated());
                }
                let text = std::str::from_utf8(rest).map_err(|_| Error::Validation {
                    message: "STRING encoding is not valid UTF-8".to_string(),
                })?;
                Ok(Value::String(ArcStr::from(text)))
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Double(d) => write!(f, "Double({d})"),
            Value::Boolean(b) => write!(f, "Boolean({b})"),
            Value::String(s) => write!(f, "String({s:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(ArcStr::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_round_trip() {
        for i in [0, 1, -1, i32::MAX, i32::MIN, 123_456] {
            let value = Value::Int(i);
            let bytes = value.to_bytes().unwrap();
            assert_eq!(bytes.len(), 4);
            assert_eq!(Value::from_bytes(DataType::Int, &bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_int_is_little_endian() {
        let bytes = Value::Int(1).to_bytes().unwrap();
        assert_eq!(bytes, vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_double_round_trip() {
        for d in [0.0, -1.5, 3.141_592_653_589_793, f64::MAX] {
            let value = Value::Double(d);
            let bytes = value.to_bytes().unwrap();
            assert_eq!(bytes.len(), 8);
            assert_eq!(Value::from_bytes(DataType::Double, &bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_double_is_big_endian_bit_pattern() {
        let bytes = Value::Double(1.0).to_bytes().unwrap();
        assert_eq!(bytes, 1.0f64.to_bits().to_be_bytes().to_vec());
        assert_eq!(bytes[0], 0x3F);
    }

    #[test]
    fn test_boolean_round_trip() {
        for b in [true, false] {
            let value = Value::Boolean(b);
            let bytes = value.to_bytes().unwrap();
            assert_eq!(bytes.len(), 1);
            assert_eq!(Value::from_bytes(DataType::Boolean, &bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_string_round_trip() {
        for s in ["", "alice", "naïve strings survive"] {
            let value = Value::from(s);
            let bytes = value.to_bytes().unwrap();
            assert_eq!(Value::from_bytes(DataType::String, &bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_string_length_prefix_is_big_endian() {
        let bytes = Value::from("ab").to_bytes().unwrap();
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        assert_eq!(&bytes[4..], b"ab");
    }

    #[test]
    fn test_null_has_no_encoding() {
        assert!(Value::Null.to_bytes().is_err());
    }

    #[test]
    fn test_truncated_input_is_rejected() {
        assert!(Value::from_bytes(DataType::Int, &[1, 2]).is_err());
        assert!(Value::from_bytes(DataType::Double, &[0; 7]).is_err());
        assert!(Value::from_bytes(DataType::String, &[0, 0, 0, 5, b'a']).is_err());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(
            DataType::Int.parse_value("17").unwrap(),
            Value::Int(17)
        );
        assert_eq!(
            DataType::Boolean.parse_value("TRUE").unwrap(),
            Value::Boolean(true)
        );
        assert!(DataType::Int.parse_value("seventeen").is_err());
        assert!(DataType::Boolean.parse_value("yes").is_err());
    }

    #[test]
    fn test_compare_coerces_int_and_double() {
        assert_eq!(
            Value::Int(2).compare(&Value::Double(2.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            Value::Int(2).compare(&Value::from("two")),
            None
        );
    }
}

use std::{
    fmt::{self, Display},
    mem,
};
use time::PrimitiveDateTime;
use uuid::Uuid;

/// Dynamically typed value moved between native fields, query arguments and result rows.
///
/// Every scalar variant carries an `Option`: `None` is a typed NULL that still remembers
/// the shape of the data, `Value::Null` is the untyped absence of a value.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Char(Option<char>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int8(l), Self::Int8(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::UInt8(l), Self::UInt8(r)) => l == r,
            (Self::UInt16(l), Self::UInt16(r)) => l == r,
            (Self::UInt32(l), Self::UInt32(r)) => l == r,
            (Self::UInt64(l), Self::UInt64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Char(l), Self::Char(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            _ => mem::discriminant(self) == mem::discriminant(other),
        }
    }

    /// True for `Value::Null` and for every typed NULL.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Char(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(..))
    }

    /// Any non null integer reinterpreted as `i64` (unsigned values wrap).
    pub fn as_signed(&self) -> Option<i64> {
        Some(match *self {
            Value::Int8(Some(v)) => v as i64,
            Value::Int16(Some(v)) => v as i64,
            Value::Int32(Some(v)) => v as i64,
            Value::Int64(Some(v)) => v,
            Value::UInt8(Some(v)) => v as i64,
            Value::UInt16(Some(v)) => v as i64,
            Value::UInt32(Some(v)) => v as i64,
            Value::UInt64(Some(v)) => v as i64,
            _ => return None,
        })
    }

    /// Any non null integer reinterpreted as `u64` (negative values wrap).
    pub fn as_unsigned(&self) -> Option<u64> {
        Some(match *self {
            Value::Int8(Some(v)) => v as u64,
            Value::Int16(Some(v)) => v as u64,
            Value::Int32(Some(v)) => v as u64,
            Value::Int64(Some(v)) => v as u64,
            Value::UInt8(Some(v)) => v as u64,
            Value::UInt16(Some(v)) => v as u64,
            Value::UInt32(Some(v)) => v as u64,
            Value::UInt64(Some(v)) => v,
            _ => return None,
        })
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Float32(Some(v)) => Some(v as f64),
            Value::Float64(Some(v)) => Some(v),
            _ => None,
        }
    }

    /// Signed integer of the given width, narrowing the same way an `as` cast does.
    pub fn signed(bits: u8, value: i64) -> Value {
        match bits {
            8 => Value::Int8(Some(value as i8)),
            16 => Value::Int16(Some(value as i16)),
            32 => Value::Int32(Some(value as i32)),
            _ => Value::Int64(Some(value)),
        }
    }

    pub fn unsigned(bits: u8, value: u64) -> Value {
        match bits {
            8 => Value::UInt8(Some(value as u8)),
            16 => Value::UInt16(Some(value as u16)),
            32 => Value::UInt32(Some(value as u32)),
            _ => Value::UInt64(Some(value)),
        }
    }

    pub fn float(bits: u8, value: f64) -> Value {
        match bits {
            32 => Value::Float32(Some(value as f32)),
            _ => Value::Float64(Some(value)),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        macro_rules! write_option {
            ($v:expr) => {
                match $v {
                    Some(v) => write!(f, "{v}"),
                    None => f.write_str("NULL"),
                }
            };
        }
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(v) => write_option!(v),
            Value::Int8(v) => write_option!(v),
            Value::Int16(v) => write_option!(v),
            Value::Int32(v) => write_option!(v),
            Value::Int64(v) => write_option!(v),
            Value::UInt8(v) => write_option!(v),
            Value::UInt16(v) => write_option!(v),
            Value::UInt32(v) => write_option!(v),
            Value::UInt64(v) => write_option!(v),
            Value::Float32(v) => write_option!(v),
            Value::Float64(v) => write_option!(v),
            Value::Char(Some(v)) => write!(f, "'{v}'"),
            Value::Varchar(Some(v)) => write!(f, "'{v}'"),
            Value::Blob(Some(v)) => write!(f, "<{} bytes>", v.len()),
            Value::Timestamp(v) => write_option!(v),
            Value::Uuid(v) => write_option!(v),
            Value::List(Some(v), ..) => {
                f.write_str("[")?;
                for (i, item) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Char(None) | Value::Varchar(None) | Value::Blob(None) | Value::List(None, ..) => {
                f.write_str("NULL")
            }
        }
    }
}

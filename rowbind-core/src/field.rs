use crate::{AsValue, Result, Value};
use std::{
    fmt::{self, Display},
    ops::{BitOr, BitOrAssign},
};

/// Scalar family of a leaf field, resolved once when the metadata is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Int(u8),
    UInt(u8),
    Float(u8),
    String,
    Bool,
    Other,
}

impl FieldKind {
    /// Kind of the value shape (the zero value of a field decides its kind).
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Int8(..) => FieldKind::Int(8),
            Value::Int16(..) => FieldKind::Int(16),
            Value::Int32(..) => FieldKind::Int(32),
            Value::Int64(..) => FieldKind::Int(64),
            Value::UInt8(..) => FieldKind::UInt(8),
            Value::UInt16(..) => FieldKind::UInt(16),
            Value::UInt32(..) => FieldKind::UInt(32),
            Value::UInt64(..) => FieldKind::UInt(64),
            Value::Float32(..) => FieldKind::Float(32),
            Value::Float64(..) => FieldKind::Float(64),
            Value::Varchar(..) => FieldKind::String,
            Value::Boolean(..) => FieldKind::Bool,
            _ => FieldKind::Other,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FieldKind::Int(..) | FieldKind::UInt(..))
    }

    /// Reshape an incoming value into the representation this kind stores.
    ///
    /// Inputs that do not match one of the accepted shapes are returned unchanged,
    /// the field's own conversion decides later whether they fit.
    pub fn coerce(self, value: Value) -> Value {
        match self {
            FieldKind::Int(bits) => match value.as_signed() {
                Some(v) => Value::signed(bits, v),
                None => value,
            },
            FieldKind::UInt(bits) => match value.as_unsigned() {
                Some(v) => Value::unsigned(bits, v),
                None => value,
            },
            FieldKind::Float(bits) => match value.as_float() {
                Some(v) => Value::float(bits, v),
                None => value,
            },
            FieldKind::String => match value {
                Value::Char(Some(v)) => Value::Varchar(Some(v.into())),
                Value::Blob(Some(v)) => Value::Varchar(Some(String::from_utf8_lossy(&v).into_owned())),
                Value::List(Some(items), shape) => match text_from_list(&items, &shape) {
                    Some(v) => Value::Varchar(Some(v)),
                    None => Value::List(Some(items), shape),
                },
                _ => value,
            },
            FieldKind::Bool | FieldKind::Other => value,
        }
    }
}

/// Text carried by a list of chars or a list of bytes.
fn text_from_list(items: &[Value], shape: &Value) -> Option<String> {
    match shape {
        Value::Char(..) => items
            .iter()
            .map(|v| match v {
                Value::Char(Some(c)) => Some(*c),
                _ => None,
            })
            .collect(),
        Value::UInt8(..) => items
            .iter()
            .map(|v| match v {
                Value::UInt8(Some(b)) => Some(*b),
                _ => None,
            })
            .collect::<Option<Vec<u8>>>()
            .map(|v| String::from_utf8_lossy(&v).into_owned()),
        _ => None,
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Int(bits) => write!(f, "i{bits}"),
            FieldKind::UInt(bits) => write!(f, "u{bits}"),
            FieldKind::Float(bits) => write!(f, "f{bits}"),
            FieldKind::String => f.write_str("string"),
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Other => f.write_str("other"),
        }
    }
}

/// Column markers parsed from a tag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attributes(u8);

impl Attributes {
    pub const NONE: Attributes = Attributes(0);
    pub const PRIMARY_KEY: Attributes = Attributes(1);
    pub const AUTOINCREMENT: Attributes = Attributes(1 << 1);
    pub const VERSION: Attributes = Attributes(1 << 2);

    pub const fn contains(self, other: Attributes) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
    pub fn insert(&mut self, other: Attributes) {
        self.0 |= other.0;
    }
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Attributes {
    type Output = Attributes;
    fn bitor(self, rhs: Self) -> Self::Output {
        Attributes(self.0 | rhs.0)
    }
}

impl BitOrAssign for Attributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

pub const TAG_PRIMARY_KEY: &str = "primary";
pub const TAG_AUTOINCREMENT: &str = "autoincrement";
pub const TAG_VERSION: &str = "version";

/// Default tag grammar: `"name,marker,marker"`.
///
/// The first token is the column name, the following ones are matched after trimming.
/// Unknown markers are ignored.
pub fn parse_tag(tag: &str) -> (String, Attributes) {
    let mut parts = tag.split(',');
    let name = parts.next().unwrap_or_default().trim().to_owned();
    let mut attributes = Attributes::NONE;
    for part in parts {
        match part.trim() {
            TAG_PRIMARY_KEY => attributes |= Attributes::PRIMARY_KEY,
            TAG_AUTOINCREMENT => attributes |= Attributes::AUTOINCREMENT,
            TAG_VERSION => attributes |= Attributes::VERSION,
            _ => {}
        }
    }
    (name, attributes)
}

/// Static description of the native type behind a leaf field.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredType {
    pub kind: FieldKind,
    /// The field is `Option<_>`: a NULL column is a legitimate value.
    pub nullable: bool,
    /// Value of `Default::default()` for the field type.
    pub zero: Value,
}

impl DeclaredType {
    pub fn new(zero: Value, nullable: bool) -> Self {
        Self {
            kind: FieldKind::of(&zero),
            nullable,
            zero,
        }
    }
}

/// One tagged leaf field of an entity, located by its index path from the root.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMeta<A = Attributes> {
    /// Column name taken from the tag.
    pub name: String,
    pub attributes: A,
    /// Field indices from the root type down to the leaf, crossing embedded fields.
    pub path: Box<[usize]>,
    pub declared: DeclaredType,
    /// Rust identifier of the leaf field.
    pub ident: &'static str,
}

impl<A> FieldMeta<A> {
    pub fn kind(&self) -> FieldKind {
        self.declared.kind
    }
}

impl FieldMeta<Attributes> {
    pub fn is_primary_key(&self) -> bool {
        self.attributes.contains(Attributes::PRIMARY_KEY)
    }
    pub fn is_autoincrement(&self) -> bool {
        self.attributes.contains(Attributes::AUTOINCREMENT)
    }
    pub fn is_version(&self) -> bool {
        self.attributes.contains(Attributes::VERSION)
    }
}

/// Type erased access to one native leaf field.
pub trait Field {
    /// Current content as a value.
    fn value(&self) -> Value;
    /// Replace the content, the value must already be in a convertible shape.
    fn assign(&mut self, value: Value) -> Result<()>;
    /// Back to `Default::default()`.
    fn reset(&mut self);
}

impl<T: AsValue + Clone + Default> Field for T {
    fn value(&self) -> Value {
        self.clone().as_value()
    }
    fn assign(&mut self, value: Value) -> Result<()> {
        *self = T::try_from_value(value)?;
        Ok(())
    }
    fn reset(&mut self) {
        *self = T::default();
    }
}

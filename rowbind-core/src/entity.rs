use crate::{AsValue, Field, Value};
use std::{any::TypeId, fmt};

/// Static shape of an entity type, emitted by `#[derive(Entity)]`.
///
/// The descriptor is what the registry walks: it lists every declared field in
/// declaration order, how it is tagged and whether it leads to another entity.
pub struct EntityDescriptor {
    pub name: &'static str,
    pub type_id: fn() -> TypeId,
    pub fields: &'static [FieldDescriptor],
}

impl EntityDescriptor {
    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }
}

impl fmt::Debug for EntityDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// One declared field of an entity.
pub struct FieldDescriptor {
    pub ident: &'static str,
    /// Declared `pub` or `pub(crate)`.
    pub exported: bool,
    /// Every `key = "value"` pair of the field attribute.
    pub tags: &'static [(&'static str, &'static str)],
    pub shape: FieldShape,
}

impl FieldDescriptor {
    /// Value of the tag `key`, trimmed. Empty values count as absent.
    pub fn tag(&self, key: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("ident", &self.ident)
            .field("exported", &self.exported)
            .field("tags", &self.tags)
            .field("shape", &self.shape)
            .finish()
    }
}

pub enum FieldShape {
    /// Scalar field convertible through `AsValue`.
    Leaf { zero: fn() -> Value, nullable: bool },
    /// Another entity, possibly behind `Box` or `Option`.
    Embedded {
        descriptor: fn() -> &'static EntityDescriptor,
    },
    /// Neither tagged nor embedded, never bound.
    Opaque,
}

impl fmt::Debug for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldShape::Leaf { zero, nullable } => f
                .debug_struct("Leaf")
                .field("zero", &zero())
                .field("nullable", nullable)
                .finish(),
            // Name only, a self embedding type would recurse forever.
            FieldShape::Embedded { descriptor } => f
                .debug_struct("Embedded")
                .field("descriptor", &descriptor().name)
                .finish(),
            FieldShape::Opaque => f.write_str("Opaque"),
        }
    }
}

/// Shared view of one field, returned by [`Reflect::field_ref`].
pub enum FieldRef<'a> {
    Leaf(&'a dyn Field),
    /// `None` when the embedded entity is behind an absent `Option`.
    Embedded(Option<&'a dyn Reflect>),
}

/// Exclusive view of one field, returned by [`Reflect::field_mut`].
pub enum FieldMut<'a> {
    Leaf(&'a mut dyn Field),
    /// Absent optional entities are materialized before being returned.
    Embedded(&'a mut dyn Reflect),
}

/// Index based access to the fields of a live instance.
///
/// Indices are the positions in [`EntityDescriptor::fields`]. Opaque and unknown
/// indices return `None`.
pub trait Reflect {
    fn field_ref(&self, index: usize) -> Option<FieldRef<'_>>;
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_>>;
}

/// A struct that maps to rows, usually derived.
///
/// ```ignore
/// #[derive(Default, Entity)]
/// pub struct User {
///     #[rowbind(orm = "id,primary,autoincrement")]
///     pub id: i64,
///     #[rowbind(orm = "name")]
///     pub name: String,
/// }
/// ```
pub trait Entity: Reflect + 'static {
    fn descriptor() -> &'static EntityDescriptor;
}

/// A field type that leads to another entity: the entity itself, `Box<E>` or `Option<E>`.
pub trait Embed {
    fn embedded_descriptor() -> &'static EntityDescriptor;
    fn embedded(&self) -> Option<&dyn Reflect>;
    fn embedded_mut(&mut self) -> &mut dyn Reflect;
}

impl<T: Embed> Embed for Box<T> {
    fn embedded_descriptor() -> &'static EntityDescriptor {
        T::embedded_descriptor()
    }
    fn embedded(&self) -> Option<&dyn Reflect> {
        self.as_ref().embedded()
    }
    fn embedded_mut(&mut self) -> &mut dyn Reflect {
        self.as_mut().embedded_mut()
    }
}

impl<T: Embed + Default> Embed for Option<T> {
    fn embedded_descriptor() -> &'static EntityDescriptor {
        T::embedded_descriptor()
    }
    fn embedded(&self) -> Option<&dyn Reflect> {
        self.as_ref().and_then(Embed::embedded)
    }
    fn embedded_mut(&mut self) -> &mut dyn Reflect {
        self.get_or_insert_with(T::default).embedded_mut()
    }
}

/// Zero value of a leaf field type, used by generated descriptors.
pub fn zero_value<T: AsValue + Default>() -> Value {
    T::default().as_value()
}

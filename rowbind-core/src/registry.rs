use crate::{
    Attributes, DeclaredType, Entity, EntityDescriptor, FieldMeta, FieldShape, parse_tag,
};
use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    sync::{Arc, LazyLock, PoisonError, RwLock},
};

/// Resolved tagged fields of one type under one tag key, in walk order.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMetadata<A = Attributes> {
    pub type_name: &'static str,
    fields: Vec<FieldMeta<A>>,
    index: HashMap<String, usize>,
}

impl<A> TypeMetadata<A> {
    pub fn len(&self) -> usize {
        self.fields.len()
    }
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
    pub fn get(&self, name: &str) -> Option<&FieldMeta<A>> {
        self.index.get(name).map(|&i| &self.fields[i])
    }
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
    pub fn iter(&self) -> impl ExactSizeIterator<Item = &FieldMeta<A>> {
        self.fields.iter()
    }
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|v| v.name.as_str())
    }
}

impl<'a, A> IntoIterator for &'a TypeMetadata<A> {
    type Item = &'a FieldMeta<A>;
    type IntoIter = std::slice::Iter<'a, FieldMeta<A>>;
    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Parses a non empty tag value into the column name and its attributes.
pub type ParseFn<A> = fn(&str) -> (String, A);

type CacheKey = (TypeId, String);

/// Cache of [`TypeMetadata`] keyed by type and tag key.
///
/// Each pair is walked once; later lookups are a read lock and a clone of the `Arc`.
/// Concurrent first lookups may both walk, the first stored result is the one every
/// caller gets back.
pub struct Registry<A = Attributes> {
    parse: ParseFn<A>,
    cache: RwLock<HashMap<CacheKey, Arc<TypeMetadata<A>>>>,
}

static SHARED: LazyLock<Arc<Registry>> = LazyLock::new(|| Arc::new(Registry::default()));

impl Registry {
    /// Process wide registry using the default tag grammar.
    pub fn shared() -> Arc<Registry> {
        SHARED.clone()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new(parse_tag)
    }
}

impl<A> Registry<A> {
    pub fn new(parse: ParseFn<A>) -> Self {
        Self {
            parse,
            cache: Default::default(),
        }
    }

    pub fn resolve<E: Entity>(&self, tag_key: &str) -> Arc<TypeMetadata<A>> {
        self.resolve_descriptor(E::descriptor(), tag_key)
    }

    pub fn resolve_descriptor(
        &self,
        descriptor: &'static EntityDescriptor,
        tag_key: &str,
    ) -> Arc<TypeMetadata<A>> {
        let key = (descriptor.type_id(), tag_key.to_owned());
        if let Some(found) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return found.clone();
        }
        let computed = Arc::new(self.walk(descriptor, tag_key));
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(computed)
            .clone()
    }

    /// Number of cached (type, tag key) pairs.
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn walk(&self, descriptor: &'static EntityDescriptor, tag_key: &str) -> TypeMetadata<A> {
        let mut result = TypeMetadata {
            type_name: descriptor.name,
            fields: Vec::new(),
            index: HashMap::new(),
        };
        let mut stack = Vec::new();
        let mut path = Vec::new();
        self.walk_level(descriptor, tag_key, &mut path, &mut stack, &mut result);
        log::debug!(
            "Resolved {} field(s) of `{}` under tag `{}`",
            result.fields.len(),
            descriptor.name,
            tag_key
        );
        result
    }

    fn walk_level(
        &self,
        descriptor: &'static EntityDescriptor,
        tag_key: &str,
        path: &mut Vec<usize>,
        stack: &mut Vec<TypeId>,
        result: &mut TypeMetadata<A>,
    ) {
        let type_id = descriptor.type_id();
        if stack.contains(&type_id) {
            return;
        }
        stack.push(type_id);
        // Leaves of this level first, an outer tag must win over any embedded one.
        for (i, field) in descriptor.fields.iter().enumerate() {
            if !field.exported {
                continue;
            }
            let FieldShape::Leaf { zero, nullable } = field.shape else {
                continue;
            };
            let Some(tag) = field.tag(tag_key) else {
                continue;
            };
            let (name, attributes) = (self.parse)(tag);
            if result.index.contains_key(&name) {
                continue;
            }
            let mut field_path = path.clone();
            field_path.push(i);
            result.index.insert(name.clone(), result.fields.len());
            result.fields.push(FieldMeta {
                name,
                attributes,
                path: field_path.into(),
                declared: DeclaredType::new(zero(), nullable),
                ident: field.ident,
            });
        }
        for (i, field) in descriptor.fields.iter().enumerate() {
            if !field.exported {
                continue;
            }
            if let FieldShape::Embedded { descriptor, .. } = field.shape {
                path.push(i);
                self.walk_level(descriptor(), tag_key, path, stack, result);
                path.pop();
            }
        }
        stack.pop();
    }
}

impl<A> fmt::Debug for Registry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .cache
            .read()
            .map(|v| v.len())
            .unwrap_or_else(|e| e.into_inner().len());
        f.debug_struct("Registry").field("cached", &cached).finish()
    }
}

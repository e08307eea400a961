use crate::{
    Field, FieldMeta, FieldMut, FieldRef, MappingError, Reflect, Result, TypeMetadata, Value,
};

impl<A> FieldMeta<A> {
    /// Current value of this field on `root`.
    ///
    /// An absent optional branch on the way reads as the zero value of the leaf, nothing
    /// is allocated.
    pub fn get(&self, root: &dyn Reflect) -> Value {
        self.resolve(root)
            .map(|field| field.value())
            .unwrap_or_else(|| self.declared.zero.clone())
    }

    /// Assign `value` to this field on `root`, materializing absent optional branches.
    pub fn set(&self, root: &mut dyn Reflect, value: Value) -> Result<()> {
        let field = self.address_of(root)?;
        self.store(field, value)
    }

    /// Writable handle to the leaf, materializing absent optional branches.
    pub fn address_of<'r>(&self, root: &'r mut dyn Reflect) -> Result<&'r mut dyn Field> {
        self.resolve_mut(root).ok_or_else(|| {
            MappingError::UnresolvedPath {
                field: self.name.clone(),
                path: self.path.clone(),
            }
            .into()
        })
    }

    /// Bind this field to one live instance.
    pub fn bind<'r>(&'r self, root: &'r mut dyn Reflect) -> BoundValue<'r, A> {
        BoundValue { meta: self, root }
    }

    fn resolve<'r>(&self, root: &'r dyn Reflect) -> Option<&'r dyn Field> {
        let (leaf, parents) = self.path.split_last()?;
        let mut current = root;
        for &i in parents {
            current = match current.field_ref(i)? {
                FieldRef::Embedded(Some(next)) => next,
                FieldRef::Embedded(None) | FieldRef::Leaf(..) => return None,
            };
        }
        match current.field_ref(*leaf)? {
            FieldRef::Leaf(field) => Some(field),
            FieldRef::Embedded(..) => None,
        }
    }

    fn resolve_mut<'r>(&self, root: &'r mut dyn Reflect) -> Option<&'r mut dyn Field> {
        let (leaf, parents) = self.path.split_last()?;
        let mut current = root;
        for &i in parents {
            current = match current.field_mut(i)? {
                FieldMut::Embedded(next) => next,
                FieldMut::Leaf(..) => return None,
            };
        }
        match current.field_mut(*leaf)? {
            FieldMut::Leaf(field) => Some(field),
            FieldMut::Embedded(..) => None,
        }
    }

    fn store(&self, field: &mut dyn Field, value: Value) -> Result<()> {
        let value = self.declared.kind.coerce(value);
        if value.is_null() {
            field.reset();
            return Ok(());
        }
        field.assign(value).map_err(|e| {
            MappingError::BindingMismatch {
                field: self.name.clone(),
                kind: self.declared.kind.to_string(),
                reason: format!("{e:#}"),
            }
            .into()
        })
    }
}

/// A field on one particular instance.
pub struct BoundValue<'r, A> {
    meta: &'r FieldMeta<A>,
    root: &'r mut dyn Reflect,
}

impl<'r, A> BoundValue<'r, A> {
    pub fn meta(&self) -> &FieldMeta<A> {
        self.meta
    }
    pub fn get(&self) -> Value {
        self.meta.get(&*self.root)
    }
    pub fn address_of(&mut self) -> Result<&mut dyn Field> {
        self.meta.address_of(&mut *self.root)
    }
    pub fn set(&mut self, value: Value) -> Result<()> {
        self.meta.set(&mut *self.root, value)
    }
}

/// Where a result column goes.
#[derive(Debug)]
pub enum Destination<'m, A> {
    Field(&'m FieldMeta<A>),
    /// No tagged field has this name, the value is dropped.
    Discard,
}

/// Column to field assignment for one result set, built once and used for every row.
#[derive(Debug)]
pub struct RowBinding<'m, A> {
    destinations: Vec<Destination<'m, A>>,
}

impl<'m, A> RowBinding<'m, A> {
    pub fn new<S: AsRef<str>>(metadata: &'m TypeMetadata<A>, columns: &[S]) -> Self {
        let destinations = columns
            .iter()
            .map(|column| match metadata.get(column.as_ref()) {
                Some(meta) => Destination::Field(meta),
                None => {
                    log::trace!(
                        "Column `{}` has no field in `{}`, discarding it",
                        column.as_ref(),
                        metadata.type_name
                    );
                    Destination::Discard
                }
            })
            .collect();
        Self { destinations }
    }

    pub fn destinations(&self) -> &[Destination<'m, A>] {
        &self.destinations
    }

    /// Write one row into `root`, values are positional.
    pub fn scan(
        &self,
        root: &mut dyn Reflect,
        values: impl IntoIterator<Item = Value, IntoIter: ExactSizeIterator>,
    ) -> Result<()> {
        let values = values.into_iter();
        if values.len() != self.destinations.len() {
            return Err(MappingError::ColumnCountMismatch {
                expected: self.destinations.len(),
                actual: values.len(),
            }
            .into());
        }
        for (destination, value) in self.destinations.iter().zip(values) {
            if let Destination::Field(meta) = destination {
                meta.set(root, value)?;
            }
        }
        Ok(())
    }
}

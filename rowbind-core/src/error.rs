use crate::Error;
use thiserror::Error;

/// Named conditions raised by the mapping layer.
///
/// Operations return `anyhow::Error`; these variants travel inside it and are
/// recovered with `downcast_ref::<MappingError>()`. Transport errors are never
/// wrapped into this type.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The versioned update matched no row: someone else modified it first.
    #[error("Concurrent update detected on `{table}`: the row version changed since it was read")]
    ConcurrencyUpdate { table: String },

    #[error("Cannot assign to field `{field}` of kind {kind}: {reason}")]
    BindingMismatch {
        field: String,
        kind: String,
        reason: String,
    },

    #[error("Path {path:?} of field `{field}` does not lead to a value")]
    UnresolvedPath { field: String, path: Box<[usize]> },

    #[error("Row has {actual} values but {expected} columns were bound")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("Insert into `{table}` did not report a generated key for `{field}`")]
    MissingGeneratedKey { table: String, field: String },
}

/// True when `error` is (or wraps) a [`MappingError::ConcurrencyUpdate`].
pub fn is_concurrency_update(error: &Error) -> bool {
    matches!(
        error.downcast_ref::<MappingError>(),
        Some(MappingError::ConcurrencyUpdate { .. })
    )
}

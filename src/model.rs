use crate::Entity;
use time::PrimitiveDateTime;

/// Common bookkeeping columns, embed it with `#[rowbind(embed)]`.
#[derive(Default, Debug, Clone, PartialEq, Entity)]
pub struct Model {
    #[rowbind(orm = "id")]
    pub id: i64,
    #[rowbind(orm = "create_at")]
    pub create_at: Option<PrimitiveDateTime>,
    #[rowbind(orm = "update_at")]
    pub update_at: Option<PrimitiveDateTime>,
    #[rowbind(orm = "delete_at")]
    pub delete_at: Option<PrimitiveDateTime>,
}

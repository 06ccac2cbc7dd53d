use sea_orm::EntityTrait;

use crate::filter::FieldMap;

/// Entity that can be served by a [`Repository`](crate::Repository).
///
/// Every entity declares its queryable fields and its conventional columns
/// explicitly. There are no implicit defaults: an entity without a soft-delete
/// flag or audit timestamps returns `None` for them.
///
/// The record representation comes from `EntityTrait::Model`, so an entity
/// without one cannot implement this trait.
///
/// # Example
/// ```rust,ignore
/// impl BaseEntity for user::Entity {
///     fn fields() -> FieldMap<Self> {
///         FieldMap::new()
///             .insert("id", user::Column::Id, FieldKind::I64)
///             .insert("email", user::Column::Email, FieldKind::String)
///             .insert("deleted", user::Column::Deleted, FieldKind::Bool)
///             .insert("created_at", user::Column::CreatedAt, FieldKind::DateTimeUtc)
///             .insert("updated_at", user::Column::UpdatedAt, FieldKind::DateTimeUtc)
///     }
///     fn id_col() -> Self::Column {
///         user::Column::Id
///     }
///     fn soft_delete_col() -> Option<Self::Column> {
///         Some(user::Column::Deleted)
///     }
///     fn created_at_col() -> Option<Self::Column> {
///         Some(user::Column::CreatedAt)
///     }
///     fn updated_at_col() -> Option<Self::Column> {
///         Some(user::Column::UpdatedAt)
///     }
/// }
/// ```
pub trait BaseEntity: EntityTrait {
    /// Declared fields, keyed by the names callers use in filters and data.
    fn fields() -> FieldMap<Self>;

    /// Server-assigned integer identity. Immutable once created.
    fn id_col() -> Self::Column;

    /// Boolean flag hiding rows from default reads.
    fn soft_delete_col() -> Option<Self::Column>;

    fn created_at_col() -> Option<Self::Column>;

    /// Refreshed on every update.
    fn updated_at_col() -> Option<Self::Column>;

    /// Table name, used in errors and logs.
    #[must_use]
    fn name() -> String {
        Self::default().table_name().to_owned()
    }
}

//! Generic data access over [`BaseEntity`] types.
//!
//! [`Repository`] holds only the session factory and the entity's field
//! descriptors. Each convenience method opens a session, runs one operation
//! and releases the session on every path. To compose several operations in
//! one unit of work, borrow a caller-owned session with [`Repository::on`].

mod bound;
mod options;

use std::fmt;
use std::sync::Arc;

use sea_orm::{ActiveModelTrait, IdenStatic, IntoActiveModel};

pub use bound::SessionRepo;
pub use options::WriteOptions;

use crate::entity::BaseEntity;
use crate::error::{RepoError, Result};
use crate::filter::{FieldKind, FieldMap, Filters, OrderBy, Values};
use crate::session::{Session, SessionManager};

pub struct Repository<E: BaseEntity> {
    sessions: SessionManager,
    fields: Arc<FieldMap<E>>,
    include_deleted: bool,
}

impl<E: BaseEntity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            fields: Arc::clone(&self.fields),
            include_deleted: self.include_deleted,
        }
    }
}

impl<E: BaseEntity> fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("entity", &E::name())
            .field("fields", &self.fields.len())
            .field("include_deleted", &self.include_deleted)
            .finish()
    }
}

impl<E: BaseEntity> Repository<E> {
    /// Build a repository, checking the entity's descriptor once.
    ///
    /// # Errors
    /// `InvalidDescriptor` when the declared conventional columns are missing
    /// from the field map or have the wrong kind.
    pub fn new(sessions: SessionManager) -> Result<Self> {
        let fields = E::fields();
        validate_descriptor::<E>(&fields)?;
        Ok(Self {
            sessions,
            fields: Arc::new(fields),
            include_deleted: false,
        })
    }

    /// A view that also returns soft-deleted rows.
    #[must_use]
    pub fn including_deleted(&self) -> Self {
        Self {
            include_deleted: true,
            ..self.clone()
        }
    }

    pub fn fields(&self) -> &FieldMap<E> {
        &self.fields
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Bind to a caller-owned session.
    pub fn on<'s>(&'s self, session: &'s mut Session) -> SessionRepo<'s, E> {
        SessionRepo::new(self, session)
    }
}

fn validate_descriptor<E: BaseEntity>(fields: &FieldMap<E>) -> Result<()> {
    let invalid = |reason: String| RepoError::InvalidDescriptor {
        entity: E::name(),
        reason,
    };
    if fields.is_empty() {
        return Err(invalid("no fields declared".to_owned()));
    }

    let expect = |col: E::Column, role: &str, ok: fn(FieldKind) -> bool| -> Result<()> {
        match fields.by_column(col) {
            None => Err(invalid(format!("{role} column '{}' is not declared", col.as_str()))),
            Some((name, field)) if !ok(field.kind) => Err(invalid(format!(
                "{role} field '{name}' cannot be {}",
                field.kind
            ))),
            Some(_) => Ok(()),
        }
    };

    expect(E::id_col(), "id", FieldKind::is_integer)?;
    if let Some(col) = E::soft_delete_col() {
        expect(col, "soft-delete", |k| k == FieldKind::Bool)?;
    }
    for col in [E::created_at_col(), E::updated_at_col()].into_iter().flatten() {
        expect(col, "timestamp", |k| k == FieldKind::DateTimeUtc)?;
    }
    Ok(())
}

impl<E> Repository<E>
where
    E: BaseEntity,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
{
    /// See [`SessionRepo::create`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn create(&self, data: &Values, opts: WriteOptions) -> Result<E::Model> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).create(data, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::get`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn get(&self, filters: &Filters) -> Result<E::Model> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).get(filters).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::get_or_create`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn get_or_create(
        &self,
        filters: &Filters,
        defaults: &Values,
        opts: WriteOptions,
    ) -> Result<(E::Model, bool)> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).get_or_create(filters, defaults, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::filter`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn filter(&self, filters: &Filters, order: &[OrderBy]) -> Result<Vec<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).filter(filters, order).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::find`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn find(&self, filters: &Filters) -> Result<Vec<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).find(filters).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::delete`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn delete(&self, filters: &Filters, opts: WriteOptions) -> Result<E::Model> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).delete(filters, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::soft_delete`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn soft_delete(&self, filters: &Filters, opts: WriteOptions) -> Result<E::Model> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).soft_delete(filters, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::update`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn update(&self, filters: &Filters, data: &Values, opts: WriteOptions) -> Result<E::Model> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).update(filters, data, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::update_instance`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn update_instance(
        &self,
        instance: E::Model,
        data: &Values,
        opts: WriteOptions,
    ) -> Result<E::Model> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).update_instance(instance, data, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::update_or_create`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn update_or_create(
        &self,
        filters: &Filters,
        data: &Values,
        defaults: &Values,
        opts: WriteOptions,
    ) -> Result<(E::Model, bool)> {
        let mut s = self.sessions.acquire();
        let res = self
            .on(&mut s)
            .update_or_create(filters, data, defaults, opts)
            .await;
        s.finish(res).await
    }

    /// See [`SessionRepo::count`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn count(&self, filters: &Filters) -> Result<u64> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).count(filters).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::exists`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn exists(&self, filters: &Filters) -> Result<bool> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).exists(filters).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::bulk_create`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn bulk_create(&self, items: &[Values], opts: WriteOptions) -> Result<Vec<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).bulk_create(items, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::bulk_insert`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn bulk_insert(
        &self,
        models: Vec<E::ActiveModel>,
        opts: WriteOptions,
    ) -> Result<Vec<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).bulk_insert(models, opts).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::get_all`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn get_all(&self) -> Result<Vec<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).get_all().await;
        s.finish(res).await
    }

    /// See [`SessionRepo::paginate`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn paginate(&self, limit: u64, offset: u64, filters: &Filters) -> Result<Vec<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).paginate(limit, offset, filters).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::get_ordered`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn get_ordered(
        &self,
        field: &str,
        descending: bool,
        filters: &Filters,
    ) -> Result<Vec<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).get_ordered(field, descending, filters).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::first`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn first(&self, filters: &Filters) -> Result<Option<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).first(filters).await;
        s.finish(res).await
    }

    /// See [`SessionRepo::last`].
    ///
    /// # Errors
    /// As the session-bound operation.
    pub async fn last(&self, filters: &Filters) -> Result<Option<E::Model>> {
        let mut s = self.sessions.acquire();
        let res = self.on(&mut s).last(filters).await;
        s.finish(res).await
    }
}

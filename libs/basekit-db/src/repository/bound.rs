use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, Condition, EntityTrait, IdenStatic, IntoActiveModel, ModelTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Value,
};
use tracing::debug;

use super::Repository;
use super::options::WriteOptions;
use crate::entity::BaseEntity;
use crate::error::{RepoError, Result};
use crate::filter::{FieldMap, Filters, OrderBy, Values, and_all, compile, compile_exact};
use crate::session::Session;

/// Pending column assignments, validated before any store access.
type Patch<E> = Vec<(<E as EntityTrait>::Column, Value)>;

/// Largest limit or offset the store binds as a signed 64-bit integer.
const MAX_WINDOW: u64 = i64::MAX.unsigned_abs();

/// A repository borrowed together with a caller-owned [`Session`].
///
/// Every call runs in that session; nothing is released here. Writes commit
/// only when their [`WriteOptions::commit`] flag is set, so several calls
/// (across entity types) can form one unit of work.
///
/// Filters and input data are validated before the session is touched:
/// an unknown field never reaches the store.
pub struct SessionRepo<'s, E: BaseEntity> {
    repo: &'s Repository<E>,
    session: &'s mut Session,
}

impl<'s, E: BaseEntity> SessionRepo<'s, E> {
    pub(super) fn new(repo: &'s Repository<E>, session: &'s mut Session) -> Self {
        Self { repo, session }
    }
}

impl<E> SessionRepo<'_, E>
where
    E: BaseEntity,
    E::ActiveModel: ActiveModelTrait<Entity = E> + Send,
    E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
{
    /// Insert one row built from `data`.
    ///
    /// # Errors
    /// `InvalidField`/`InvalidValue` for bad input, `Constraint` when the
    /// store rejects the row.
    pub async fn create(&mut self, data: &Values, opts: WriteOptions) -> Result<E::Model> {
        let am = self.new_active(data)?;
        let model = self.insert(am).await?;
        self.finalize(model, opts).await
    }

    /// Exactly one row matching `filters` (bare field names only).
    ///
    /// # Errors
    /// `NotFound` on no match, `MultipleResults` on more than one.
    pub async fn get(&mut self, filters: &Filters) -> Result<E::Model> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        self.fetch_one(cond, filters).await
    }

    /// Return the row matching `filters`, creating it from `filters` merged
    /// with `defaults` when absent. The flag tells whether it was created.
    ///
    /// A soft-deleted match is restored with `defaults` applied and counts
    /// as created.
    ///
    /// # Errors
    /// Validation errors, `MultipleResults`, `Constraint`.
    pub async fn get_or_create(
        &mut self,
        filters: &Filters,
        defaults: &Values,
        opts: WriteOptions,
    ) -> Result<(E::Model, bool)> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let am = self.new_active(&filters.clone().merged(defaults))?;

        if let Some(found) = self.fetch_unique(cond.clone(), filters).await? {
            return Ok((found, false));
        }
        let model = match self.restore(cond, filters, defaults).await? {
            Some(restored) => restored,
            None => self.insert(am).await?,
        };
        Ok((self.finalize(model, opts).await?, true))
    }

    /// Rows matching a `field__op` specification.
    ///
    /// Ordered by `order` with ties broken by id ascending, or by id
    /// descending when `order` is empty.
    ///
    /// # Errors
    /// `InvalidField`, `UnsupportedOperator`, `InvalidValue`.
    pub async fn filter(&mut self, filters: &Filters, order: &[OrderBy]) -> Result<Vec<E::Model>> {
        let cond = and_all(compile(self.fields(), filters)?);
        let orders = order
            .iter()
            .map(|o| o.resolve(self.fields()))
            .collect::<Result<Vec<_>>>()?;

        let mut q = self.select().filter(cond);
        if orders.is_empty() {
            return self.all(q.order_by(E::id_col(), Order::Desc)).await;
        }
        for (col, ord) in orders {
            q = q.order_by(col, ord);
        }
        self.all(q.order_by(E::id_col(), Order::Asc)).await
    }

    /// Rows whose fields equal `filters`, by id ascending.
    ///
    /// # Errors
    /// `InvalidField`, `InvalidValue`.
    pub async fn find(&mut self, filters: &Filters) -> Result<Vec<E::Model>> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let q = self.select().filter(cond).order_by(E::id_col(), Order::Asc);
        self.all(q).await
    }

    /// Remove the single row matching `filters` and return it.
    ///
    /// Always a hard delete; see [`soft_delete`](Self::soft_delete).
    ///
    /// # Errors
    /// `NotFound`, `MultipleResults`, `Constraint` (e.g. referenced rows).
    pub async fn delete(&mut self, filters: &Filters, opts: WriteOptions) -> Result<E::Model> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let found = self.fetch_one(cond, filters).await?;

        let txn = self.session.txn().await?;
        E::delete_many().filter(by_id::<E>(&found)).exec(txn).await?;
        debug!(entity = %E::name(), session_id = %self.session.id(), "row deleted");

        if opts.commit {
            self.session.commit().await?;
        }
        Ok(found)
    }

    /// Flag the single row matching `filters` as deleted.
    ///
    /// # Errors
    /// `SoftDeleteUnsupported` when the entity has no flag, then as `delete`.
    pub async fn soft_delete(&mut self, filters: &Filters, opts: WriteOptions) -> Result<E::Model> {
        let col = E::soft_delete_col().ok_or_else(|| RepoError::SoftDeleteUnsupported(E::name()))?;
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let patch = touch::<E>(vec![(col, Value::Bool(Some(true)))]);

        let found = self.fetch_one(cond, filters).await?;
        let model = self.write(found, patch).await?;
        self.finalize(model, opts).await
    }

    /// Apply `data` to the single row matching a `field__op` specification.
    ///
    /// # Errors
    /// `NotFound`, `MultipleResults`, `ImmutableField`, validation errors.
    pub async fn update(
        &mut self,
        filters: &Filters,
        data: &Values,
        opts: WriteOptions,
    ) -> Result<E::Model> {
        let cond = and_all(compile(self.fields(), filters)?);
        let patch = self.patch(data)?;

        let found = self.fetch_one(cond, filters).await?;
        let model = self.write(found, patch).await?;
        self.finalize(model, opts).await
    }

    /// Apply `data` to an already loaded row.
    ///
    /// # Errors
    /// `ImmutableField`, validation errors, store errors.
    pub async fn update_instance(
        &mut self,
        instance: E::Model,
        data: &Values,
        opts: WriteOptions,
    ) -> Result<E::Model> {
        let patch = self.patch(data)?;
        let model = self.write(instance, patch).await?;
        self.finalize(model, opts).await
    }

    /// Update the row matching `filters` with `defaults`, or create it.
    ///
    /// A new row is built from `data`, then `defaults`, then `filters`, so a
    /// repeated call finds the row this one created. A soft-deleted match is
    /// restored with `data` and `defaults` applied and counts as created.
    ///
    /// # Errors
    /// Validation errors, `MultipleResults`, `Constraint`.
    pub async fn update_or_create(
        &mut self,
        filters: &Filters,
        data: &Values,
        defaults: &Values,
        opts: WriteOptions,
    ) -> Result<(E::Model, bool)> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let patch = self.patch(defaults)?;
        let am = self.new_active(&data.clone().merged(defaults).merged(filters))?;

        if let Some(found) = self.fetch_unique(cond.clone(), filters).await? {
            let model = self.write(found, patch).await?;
            return Ok((self.finalize(model, opts).await?, false));
        }
        let revived = data.clone().merged(defaults);
        let model = match self.restore(cond, filters, &revived).await? {
            Some(restored) => restored,
            None => self.insert(am).await?,
        };
        Ok((self.finalize(model, opts).await?, true))
    }

    /// Number of rows whose fields equal `filters`.
    ///
    /// # Errors
    /// `InvalidField`, `InvalidValue`.
    pub async fn count(&mut self, filters: &Filters) -> Result<u64> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let q = self.select().filter(cond);
        let txn = self.session.txn().await?;
        Ok(q.count(txn).await?)
    }

    /// Whether any row matches a `field__op` specification.
    ///
    /// # Errors
    /// `InvalidField`, `UnsupportedOperator`, `InvalidValue`.
    pub async fn exists(&mut self, filters: &Filters) -> Result<bool> {
        let cond = and_all(compile(self.fields(), filters)?);
        let q = self.select().filter(cond);
        Ok(self.one(q).await?.is_some())
    }

    /// Insert every record or none of them.
    ///
    /// # Errors
    /// Validation errors (before any insert) or the first store failure.
    pub async fn bulk_create(&mut self, items: &[Values], opts: WriteOptions) -> Result<Vec<E::Model>> {
        let models = items
            .iter()
            .map(|data| self.new_active(data))
            .collect::<Result<Vec<_>>>()?;
        self.bulk_insert(models, opts).await
    }

    /// Insert pre-built active models in one unit of work.
    ///
    /// Audit timestamps left unset are filled in.
    ///
    /// # Errors
    /// The first store failure; earlier inserts stay uncommitted.
    pub async fn bulk_insert(
        &mut self,
        models: Vec<E::ActiveModel>,
        opts: WriteOptions,
    ) -> Result<Vec<E::Model>> {
        let mut inserted = Vec::with_capacity(models.len());
        for mut am in models {
            stamp_new::<E>(&mut am);
            inserted.push(self.insert(am).await?);
        }
        if opts.commit {
            self.session.commit().await?;
        }
        if !opts.refresh {
            return Ok(inserted);
        }
        let mut refreshed = Vec::with_capacity(inserted.len());
        for model in &inserted {
            refreshed.push(self.reload(model).await?);
        }
        Ok(refreshed)
    }

    /// Every row, by id ascending.
    ///
    /// # Errors
    /// Store errors only.
    pub async fn get_all(&mut self) -> Result<Vec<E::Model>> {
        let q = self.select().order_by(E::id_col(), Order::Asc);
        self.all(q).await
    }

    /// A window of rows whose fields equal `filters`, by id ascending.
    ///
    /// `limit` and `offset` saturate at `i64::MAX`.
    ///
    /// # Errors
    /// `InvalidField`, `InvalidValue`.
    pub async fn paginate(&mut self, limit: u64, offset: u64, filters: &Filters) -> Result<Vec<E::Model>> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let q = self
            .select()
            .filter(cond)
            .order_by(E::id_col(), Order::Asc)
            .limit(limit.min(MAX_WINDOW))
            .offset(offset.min(MAX_WINDOW));
        self.all(q).await
    }

    /// Rows whose fields equal `filters`, ordered by `field` (ties by id).
    ///
    /// # Errors
    /// `InvalidField` when `field` is not declared.
    pub async fn get_ordered(
        &mut self,
        field: &str,
        descending: bool,
        filters: &Filters,
    ) -> Result<Vec<E::Model>> {
        let order = OrderBy {
            field: field.to_owned(),
            descending,
        };
        let (col, ord) = order.resolve(self.fields())?;
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let q = self
            .select()
            .filter(cond)
            .order_by(col, ord)
            .order_by(E::id_col(), Order::Asc);
        self.all(q).await
    }

    /// Lowest-id row matching a `field__op` specification, if any.
    ///
    /// # Errors
    /// `InvalidField`, `UnsupportedOperator`, `InvalidValue`.
    pub async fn first(&mut self, filters: &Filters) -> Result<Option<E::Model>> {
        let cond = and_all(compile(self.fields(), filters)?);
        let q = self.select().filter(cond).order_by(E::id_col(), Order::Asc);
        self.one(q).await
    }

    /// Highest-id row whose fields equal `filters`, if any.
    ///
    /// # Errors
    /// `InvalidField`, `InvalidValue`.
    pub async fn last(&mut self, filters: &Filters) -> Result<Option<E::Model>> {
        let cond = and_all(compile_exact(self.fields(), filters)?);
        let q = self.select().filter(cond).order_by(E::id_col(), Order::Desc);
        self.one(q).await
    }

    fn fields(&self) -> &FieldMap<E> {
        &self.repo.fields
    }

    /// Base query, hiding soft-deleted rows unless the repository opts out.
    fn select(&self) -> Select<E> {
        let q = E::find();
        match E::soft_delete_col() {
            Some(col) if !self.repo.include_deleted => q.filter(not_deleted::<E>(col)),
            _ => q,
        }
    }

    async fn all(&mut self, q: Select<E>) -> Result<Vec<E::Model>> {
        let txn = self.session.txn().await?;
        Ok(q.all(txn).await?)
    }

    async fn one(&mut self, q: Select<E>) -> Result<Option<E::Model>> {
        let txn = self.session.txn().await?;
        Ok(q.one(txn).await?)
    }

    async fn fetch_unique(&mut self, cond: Condition, filters: &Filters) -> Result<Option<E::Model>> {
        let q = self.select().filter(cond);
        self.unique(q, filters).await
    }

    async fn unique(&mut self, q: Select<E>, filters: &Filters) -> Result<Option<E::Model>> {
        let q = q.limit(2_u64);
        let mut rows = self.all(q).await?.into_iter();
        match (rows.next(), rows.next()) {
            (None, _) => Ok(None),
            (Some(model), None) => Ok(Some(model)),
            (Some(_), Some(_)) => Err(RepoError::MultipleResults {
                entity: E::name(),
                filters: filters.to_string(),
            }),
        }
    }

    async fn fetch_one(&mut self, cond: Condition, filters: &Filters) -> Result<E::Model> {
        self.fetch_unique(cond, filters)
            .await?
            .ok_or_else(|| not_found::<E>(filters.to_string()))
    }

    /// Clear the soft-delete flag on the single flagged row matching `cond`
    /// and apply `data` to it. `None` when there is no such row.
    async fn restore(
        &mut self,
        cond: Condition,
        filters: &Filters,
        data: &Values,
    ) -> Result<Option<E::Model>> {
        let Some(col) = E::soft_delete_col() else {
            return Ok(None);
        };
        if self.repo.include_deleted {
            return Ok(None);
        }
        let q = E::find()
            .filter(Expr::col((E::default(), col)).eq(true))
            .filter(cond);
        let Some(found) = self.unique(q, filters).await? else {
            return Ok(None);
        };

        let mut patch = self.patch(data)?;
        patch.push((col, Value::Bool(Some(false))));
        let model = self.write(found, patch).await?;
        debug!(entity = %E::name(), session_id = %self.session.id(), "soft-deleted row restored");
        Ok(Some(model))
    }

    async fn reload(&mut self, model: &E::Model) -> Result<E::Model> {
        let q = E::find().filter(by_id::<E>(model));
        self.one(q)
            .await?
            .ok_or_else(|| not_found::<E>(format!("{{id={}}}", id_repr(&model.get(E::id_col())))))
    }

    async fn insert(&mut self, am: E::ActiveModel) -> Result<E::Model> {
        let txn = self.session.txn().await?;
        let model = am.insert(txn).await?;
        debug!(entity = %E::name(), session_id = %self.session.id(), "row inserted");
        Ok(model)
    }

    async fn write(&mut self, model: E::Model, patch: Patch<E>) -> Result<E::Model> {
        let mut am = model.into_active_model();
        for (col, value) in patch {
            am.set(col, value);
        }
        let txn = self.session.txn().await?;
        let model = am.update(txn).await?;
        debug!(entity = %E::name(), session_id = %self.session.id(), "row updated");
        Ok(model)
    }

    async fn finalize(&mut self, model: E::Model, opts: WriteOptions) -> Result<E::Model> {
        if opts.commit {
            self.session.commit().await?;
        }
        if opts.refresh {
            self.reload(&model).await
        } else {
            Ok(model)
        }
    }

    /// Active model for a new row; audit timestamps default to now.
    fn new_active(&self, data: &Values) -> Result<E::ActiveModel> {
        let mut am = <E::ActiveModel as ActiveModelTrait>::default();
        for (name, value) in data.iter() {
            let field = self.fields().resolve(name)?;
            am.set(field.col, field.value(name, value)?);
        }
        stamp_new::<E>(&mut am);
        Ok(am)
    }

    /// Column assignments for an update; the id may not change.
    fn patch(&self, data: &Values) -> Result<Patch<E>> {
        let id = E::id_col();
        let patch = data
            .iter()
            .map(|(name, value)| {
                let field = self.fields().resolve(name)?;
                if field.col.as_str() == id.as_str() {
                    return Err(RepoError::ImmutableField(name.to_owned()));
                }
                Ok((field.col, field.value(name, value)?))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(touch::<E>(patch))
    }
}

fn now() -> Value {
    Value::ChronoDateTimeUtc(Some(Box::new(basekit_utils::utc_now())))
}

fn stamp_new<E>(am: &mut E::ActiveModel)
where
    E: BaseEntity,
    E::ActiveModel: ActiveModelTrait<Entity = E>,
{
    let stamp = now();
    for col in [E::created_at_col(), E::updated_at_col()].into_iter().flatten() {
        if am.is_not_set(col) {
            am.set(col, stamp.clone());
        }
    }
}

/// Set `updated_at` unless the caller assigns it explicitly.
fn touch<E: BaseEntity>(mut patch: Patch<E>) -> Patch<E> {
    if let Some(col) = E::updated_at_col()
        && !patch.iter().any(|(c, _)| c.as_str() == col.as_str())
    {
        patch.push((col, now()));
    }
    patch
}

fn not_deleted<E: EntityTrait>(col: E::Column) -> Condition {
    Condition::any()
        .add(Expr::col((E::default(), col)).eq(false))
        .add(Expr::col((E::default(), col)).is_null())
}

fn by_id<E: BaseEntity>(model: &E::Model) -> SimpleExpr {
    Expr::col((E::default(), E::id_col())).eq(model.get(E::id_col()))
}

fn id_repr(v: &Value) -> String {
    match v {
        Value::BigInt(Some(i)) => i.to_string(),
        Value::Int(Some(i)) => i.to_string(),
        other => format!("{other:?}"),
    }
}

fn not_found<E: BaseEntity>(filters: String) -> RepoError {
    RepoError::NotFound {
        entity: E::name(),
        filters,
    }
}

//! Explicit entity-to-repository binding.
//!
//! Repositories are registered once at startup and looked up by entity type.
//! Nothing is discovered implicitly: looking up an entity that was never
//! registered is an error.

use std::any::{Any, TypeId, type_name};
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use crate::entity::BaseEntity;
use crate::error::{RepoError, Result};
use crate::repository::Repository;
use crate::session::SessionManager;

static GLOBAL: LazyLock<RepositoryRegistry> = LazyLock::new(RepositoryRegistry::default);

/// Type-keyed table of repositories.
#[derive(Default)]
pub struct RepositoryRegistry {
    repos: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for RepositoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryRegistry")
            .field("len", &self.repos.len())
            .finish()
    }
}

impl RepositoryRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry used by [`register`] and [`repo`].
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Bind `repo` to its entity type.
    ///
    /// # Errors
    /// `AlreadyRegistered` if the entity already has a repository.
    pub fn register<E: BaseEntity>(&self, repo: Repository<E>) -> Result<()> {
        match self.repos.entry(TypeId::of::<E>()) {
            Entry::Occupied(_) => Err(RepoError::AlreadyRegistered(type_name::<E>())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(repo));
                info!(entity = %E::name(), "repository registered");
                Ok(())
            }
        }
    }

    /// The repository bound to `E`.
    ///
    /// # Errors
    /// `NotRegistered` if `E` was never registered.
    pub fn get<E: BaseEntity>(&self) -> Result<Repository<E>> {
        self.repos
            .get(&TypeId::of::<E>())
            .and_then(|entry| entry.value().downcast_ref::<Repository<E>>().cloned())
            .ok_or(RepoError::NotRegistered(type_name::<E>()))
    }

    #[must_use]
    pub fn contains<E: BaseEntity>(&self) -> bool {
        self.repos.contains_key(&TypeId::of::<E>())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.repos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// Build and register a repository for `E` in the global registry.
///
/// # Errors
/// `InvalidDescriptor` or `AlreadyRegistered`.
pub fn register<E: BaseEntity>(sessions: SessionManager) -> Result<Repository<E>> {
    let repo = Repository::<E>::new(sessions)?;
    RepositoryRegistry::global().register(repo.clone())?;
    Ok(repo)
}

/// The globally registered repository for `E`.
///
/// # Errors
/// `NotRegistered`.
pub fn repo<E: BaseEntity>() -> Result<Repository<E>> {
    RepositoryRegistry::global().get::<E>()
}

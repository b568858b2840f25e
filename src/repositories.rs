use crate::models::Entity;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The store rejected the operation: constraint violation, lost connection, failed commit.
    #[error(transparent)]
    Persistence(anyhow::Error),
    /// The store answered but the answer could not be understood.
    #[error(transparent)]
    Unexpected(anyhow::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// A mutation staged for the next [`Repository::save`].
#[derive(Debug, Clone)]
pub enum Change<E> {
    Insert(E),
    /// Full-row replace keyed by the entity's id.
    Replace(E),
    Remove(i32),
}

/// Outcome of one committed transaction.
#[derive(Debug)]
pub struct Commit<E> {
    rows_affected: u64,
    inserted: Vec<E>,
}

impl<E> Default for Commit<E> {
    fn default() -> Self {
        Self {
            rows_affected: 0,
            inserted: Vec::new(),
        }
    }
}

impl<E> Commit<E> {
    pub fn record_rows(&mut self, rows: u64) {
        self.rows_affected += rows;
    }

    pub fn record_insert(&mut self, entity: E) {
        self.rows_affected += 1;
        self.inserted.push(entity);
    }

    pub const fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub const fn is_saved(&self) -> bool {
        self.rows_affected > 0
    }

    /// Rows written by `Change::Insert`, in staging order, with their assigned ids.
    pub fn into_inserted(self) -> Vec<E> {
        self.inserted
    }
}

#[async_trait]
pub trait Repository<E: Entity>: Send + Sync + 'static {
    async fn find_all(&self) -> RepositoryResult<Vec<E>>;

    /// `Ok(None)` when no row has this id.
    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<E>>;

    async fn exists(&self, id: i32) -> RepositoryResult<bool>;

    /// Commits every staged change in a single transaction. Nothing is written if any change fails.
    async fn save(&self, changes: Vec<Change<E>>) -> RepositoryResult<Commit<E>>;

    /// Inserts `entity` ignoring its id. Returns the stored row, or `None` if nothing was written.
    async fn create(&self, entity: E) -> RepositoryResult<Option<E>> {
        let commit = self.save(vec![Change::Insert(entity)]).await?;
        if !commit.is_saved() {
            return Ok(None);
        }
        Ok(commit.into_inserted().into_iter().next())
    }

    /// Replaces the row with `entity.id()`. `false` means no such row.
    async fn update(&self, entity: E) -> RepositoryResult<bool> {
        let commit = self.save(vec![Change::Replace(entity)]).await?;
        Ok(commit.is_saved())
    }

    /// Removes the row with `entity.id()`. `false` means no such row.
    async fn delete(&self, entity: &E) -> RepositoryResult<bool> {
        let commit = self.save(vec![Change::Remove(entity.id())]).await?;
        Ok(commit.is_saved())
    }
}

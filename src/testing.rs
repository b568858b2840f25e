use crate::logger::Logger;
use crate::models::{Author, Book, Entity};
use crate::repositories::{Change, Commit, Repository, RepositoryError, RepositoryResult};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Assigns keys the way a store does on insert.
pub trait WithId: Entity {
    #[must_use]
    fn with_id(self, id: i32) -> Self;
}

impl WithId for Author {
    fn with_id(self, id: i32) -> Self {
        Self { id, ..self }
    }
}

impl WithId for Book {
    fn with_id(self, id: i32) -> Self {
        Self { id, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Every call fails as if the store were unreachable.
    Failing,
    /// Reads work; commits succeed but touch no rows.
    Inert,
}

/// Map-backed repository that counts how it is used.
#[derive(Debug)]
pub struct MemoryRepository<E> {
    rows: RwLock<BTreeMap<i32, E>>,
    next_id: AtomicI32,
    calls: AtomicUsize,
    saves: AtomicUsize,
    mode: Mode,
}

impl<E: WithId> MemoryRepository<E> {
    pub fn new() -> Self {
        Self::with_mode(Mode::Normal, Vec::new())
    }

    pub fn with_data(rows: Vec<E>) -> Self {
        Self::with_mode(Mode::Normal, rows)
    }

    pub fn failing() -> Self {
        Self::with_mode(Mode::Failing, Vec::new())
    }

    pub fn inert(rows: Vec<E>) -> Self {
        Self::with_mode(Mode::Inert, rows)
    }

    fn with_mode(mode: Mode, rows: Vec<E>) -> Self {
        let next_id = rows.iter().map(Entity::id).max().unwrap_or(0) + 1;
        Self {
            rows: RwLock::new(rows.into_iter().map(|row| (row.id(), row)).collect()),
            next_id: AtomicI32::new(next_id),
            calls: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            mode,
        }
    }

    /// Every trait call, reads included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<E> {
        self.rows.read().await.values().cloned().collect()
    }

    fn enter(&self) -> RepositoryResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.mode == Mode::Failing {
            return Err(RepositoryError::Persistence(
                anyhow!("connection refused").context(format!("Failed to reach {} store", E::KIND)),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<E: WithId> Repository<E> for MemoryRepository<E> {
    async fn find_all(&self) -> RepositoryResult<Vec<E>> {
        self.enter()?;
        Ok(self.snapshot().await)
    }

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<E>> {
        self.enter()?;
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn exists(&self, id: i32) -> RepositoryResult<bool> {
        self.enter()?;
        Ok(self.rows.read().await.contains_key(&id))
    }

    async fn save(&self, changes: Vec<Change<E>>) -> RepositoryResult<Commit<E>> {
        self.enter()?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        let mut commit = Commit::default();
        if self.mode == Mode::Inert {
            return Ok(commit);
        }

        let mut rows = self.rows.write().await;
        let mut staged = rows.clone();
        for change in changes {
            match change {
                Change::Insert(entity) => {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst);
                    let entity = entity.with_id(id);
                    staged.insert(id, entity.clone());
                    commit.record_insert(entity);
                }
                Change::Replace(entity) => {
                    if let Some(row) = staged.get_mut(&entity.id()) {
                        *row = entity;
                        commit.record_rows(1);
                    }
                }
                Change::Remove(id) => {
                    if staged.remove(&id).is_some() {
                        commit.record_rows(1);
                    }
                }
            }
        }
        *rows = staged;

        Ok(commit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    fn record(&self, level: Level, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}

impl Logger for RecordingLogger {
    fn info(&self, message: &str) {
        self.record(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message);
    }
}

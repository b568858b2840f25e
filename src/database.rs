use crate::models::{Author, Book, Entity};
use crate::repositories::{Change, Commit, Repository, RepositoryError, RepositoryResult};
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::query::{Query, QueryAs};
use sqlx::sqlite::{
    SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
    SqliteRow,
};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::str::FromStr;

static MIGRATOR: Migrator = sqlx::migrate!();

// Stays well below SQLite's bound-parameter limit.
const RELATION_CHUNK: usize = 500;

/// Opens the pool and applies the catalog schema.
///
/// In-memory databases live only as long as their connection, so they get a
/// single connection that is never recycled.
pub async fn establish_pool(url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let in_memory = is_in_memory(url);
    let mut opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database url {url}"))?
        .create_if_missing(true)
        .foreign_keys(true);
    if !in_memory {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
    }

    let pool_opts = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };
    let pool = pool_opts
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database at {url}"))?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to apply catalog schema")?;

    Ok(pool)
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// SQL and bindings for one entity's table.
#[async_trait]
pub trait Table: Entity + for<'r> FromRow<'r, SqliteRow> + Unpin {
    const SELECT: &'static str;
    /// Must end in a `RETURNING` clause yielding every column `SELECT` does.
    const INSERT: &'static str;
    /// Binds every column from `bind_replace`, then the id last.
    const REPLACE: &'static str;
    const DELETE: &'static str;
    const EXISTS: &'static str;

    fn bind_insert<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, Self, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, Self, SqliteArguments<'q>>;

    fn bind_replace<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>>;

    /// Fills derived collections on freshly read rows.
    async fn load_relations(
        _conn: &mut SqliteConnection,
        _rows: &mut [Self],
    ) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

#[derive(Debug)]
pub struct SqliteRepository<E> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> SqliteRepository<E> {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }
}

impl<E> Clone for SqliteRepository<E> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[async_trait]
impl<E: Table> Repository<E> for SqliteRepository<E> {
    async fn find_all(&self) -> RepositoryResult<Vec<E>> {
        let context = || format!("Failed to retrieve all {} records", E::KIND);
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|err| store_error(err, context()))?;

        let mut rows = sqlx::query_as::<_, E>(E::SELECT)
            .fetch_all(&mut *conn)
            .await
            .map_err(|err| store_error(err, context()))?;
        E::load_relations(&mut conn, &mut rows)
            .await
            .map_err(|err| store_error(err, context()))?;

        Ok(rows)
    }

    async fn find_by_id(&self, id: i32) -> RepositoryResult<Option<E>> {
        let context = || format!(r#"Failed to retrieve {} with id "{id}""#, E::KIND);
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|err| store_error(err, context()))?;

        let sql = format!("{} WHERE id = ?", E::SELECT);
        let row = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|err| store_error(err, context()))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut rows = vec![row];
        E::load_relations(&mut conn, &mut rows)
            .await
            .map_err(|err| store_error(err, context()))?;

        Ok(rows.pop())
    }

    async fn exists(&self, id: i32) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>(E::EXISTS)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                store_error(
                    err,
                    format!(r#"Failed to check existence of {} with id "{id}""#, E::KIND),
                )
            })
    }

    async fn save(&self, changes: Vec<Change<E>>) -> RepositoryResult<Commit<E>> {
        let mut tx = self.pool.begin().await.map_err(|err| {
            store_error(err, format!("Failed to begin {} transaction", E::KIND))
        })?;
        let mut commit = Commit::default();

        for change in &changes {
            match change {
                Change::Insert(entity) => {
                    let row = entity
                        .bind_insert(sqlx::query_as(E::INSERT))
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(|err| {
                            store_error(err, format!("Failed to create {}", E::KIND))
                        })?;
                    if let Some(row) = row {
                        commit.record_insert(row);
                    }
                }
                Change::Replace(entity) => {
                    let result = entity
                        .bind_replace(sqlx::query(E::REPLACE))
                        .bind(entity.id())
                        .execute(&mut *tx)
                        .await
                        .map_err(|err| {
                            store_error(
                                err,
                                format!(
                                    r#"Failed to update {} with id "{}""#,
                                    E::KIND,
                                    entity.id()
                                ),
                            )
                        })?;
                    commit.record_rows(result.rows_affected());
                }
                Change::Remove(id) => {
                    let result = sqlx::query(E::DELETE)
                        .bind(*id)
                        .execute(&mut *tx)
                        .await
                        .map_err(|err| {
                            store_error(
                                err,
                                format!(r#"Failed to delete {} with id "{id}""#, E::KIND),
                            )
                        })?;
                    commit.record_rows(result.rows_affected());
                }
            }
        }

        tx.commit().await.map_err(|err| {
            store_error(err, format!("Failed to commit {} transaction", E::KIND))
        })?;

        Ok(commit)
    }
}

fn store_error(err: sqlx::Error, context: String) -> RepositoryError {
    let unreadable = matches!(
        err,
        sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::TypeNotFound { .. }
    );
    let context = if is_constraint_violation(&err) {
        format!("{context}: constraint violated")
    } else {
        context
    };

    let err = anyhow!(err).context(context);
    if unreadable {
        RepositoryError::Unexpected(err)
    } else {
        RepositoryError::Persistence(err)
    }
}

fn is_constraint_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.is_foreign_key_violation()
            || db_err.is_unique_violation()
            || db_err.is_check_violation();
    }

    false
}

impl<'r> FromRow<'r, SqliteRow> for Author {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            bio: row.try_get("bio")?,
            books: Vec::new(),
        })
    }
}

#[async_trait]
impl Table for Author {
    const SELECT: &'static str = "SELECT id, first_name, last_name, bio FROM author";
    const INSERT: &'static str = "INSERT INTO author (first_name, last_name, bio) VALUES (?, ?, ?) \
         RETURNING id, first_name, last_name, bio";
    const REPLACE: &'static str =
        "UPDATE author SET first_name = ?, last_name = ?, bio = ? WHERE id = ?";
    const DELETE: &'static str = "DELETE FROM author WHERE id = ?";
    const EXISTS: &'static str = "SELECT EXISTS(SELECT 1 FROM author WHERE id = ?)";

    fn bind_insert<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, Self, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, Self, SqliteArguments<'q>> {
        query
            .bind(self.first_name.as_str())
            .bind(self.last_name.as_str())
            .bind(self.bio.as_deref())
    }

    fn bind_replace<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.first_name.as_str())
            .bind(self.last_name.as_str())
            .bind(self.bio.as_deref())
    }

    async fn load_relations(
        conn: &mut SqliteConnection,
        authors: &mut [Self],
    ) -> Result<(), sqlx::Error> {
        if authors.is_empty() {
            return Ok(());
        }

        let mut by_author: HashMap<i32, Vec<Book>> = HashMap::new();
        for chunk in authors.chunks(RELATION_CHUNK) {
            let mut builder = QueryBuilder::<Sqlite>::new(Book::SELECT);
            builder.push(" WHERE author_id IN (");
            let mut ids = builder.separated(", ");
            for author in chunk {
                ids.push_bind(author.id);
            }
            ids.push_unseparated(") ORDER BY id");

            let books: Vec<Book> = builder.build_query_as().fetch_all(&mut *conn).await?;
            for book in books {
                if let Some(author_id) = book.author_id {
                    by_author.entry(author_id).or_default().push(book);
                }
            }
        }

        for author in authors.iter_mut() {
            author.books = by_author.remove(&author.id).unwrap_or_default();
        }

        Ok(())
    }
}

impl<'r> FromRow<'r, SqliteRow> for Book {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            year: row.try_get("year")?,
            isbn: row.try_get("isbn")?,
            summary: row.try_get("summary")?,
            image: row.try_get("image")?,
            price: row.try_get("price")?,
            author_id: row.try_get("author_id")?,
        })
    }
}

#[async_trait]
impl Table for Book {
    const SELECT: &'static str =
        "SELECT id, title, year, isbn, summary, image, price, author_id FROM book";
    const INSERT: &'static str = "INSERT INTO book (title, year, isbn, summary, image, price, author_id) \
         VALUES (?, ?, ?, ?, ?, ?, ?) \
         RETURNING id, title, year, isbn, summary, image, price, author_id";
    const REPLACE: &'static str = "UPDATE book SET title = ?, year = ?, isbn = ?, summary = ?, \
         image = ?, price = ?, author_id = ? WHERE id = ?";
    const DELETE: &'static str = "DELETE FROM book WHERE id = ?";
    const EXISTS: &'static str = "SELECT EXISTS(SELECT 1 FROM book WHERE id = ?)";

    fn bind_insert<'q>(
        &'q self,
        query: QueryAs<'q, Sqlite, Self, SqliteArguments<'q>>,
    ) -> QueryAs<'q, Sqlite, Self, SqliteArguments<'q>> {
        query
            .bind(self.title.as_str())
            .bind(self.year)
            .bind(self.isbn.as_str())
            .bind(self.summary.as_deref())
            .bind(self.image.as_deref())
            .bind(self.price)
            .bind(self.author_id)
    }

    fn bind_replace<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        query
            .bind(self.title.as_str())
            .bind(self.year)
            .bind(self.isbn.as_str())
            .bind(self.summary.as_deref())
            .bind(self.image.as_deref())
            .bind(self.price)
            .bind(self.author_id)
    }
}

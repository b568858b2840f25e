use crate::dto::{AuthorCreate, AuthorUpdate, AuthorView, BookCreate, BookUpdate, BookView};
use crate::error::ApiError;
use crate::logger::Logger;
use crate::models::{Author, Book, Entity};
use crate::repositories::Repository;
use crate::validation::Validate;
use anyhow::anyhow;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Binds an entity to its wire shapes.
pub trait Resource: Send + Sync + 'static {
    /// Collection name, used as the route segment and log label prefix.
    const NAME: &'static str;

    type Entity: Entity;
    type View: Serialize + From<Self::Entity> + Send;
    type Create: DeserializeOwned + Validate + Into<Self::Entity> + Send;
    type Update: DeserializeOwned + Validate + Into<Self::Entity> + Send;

    /// The id a client put in an update body.
    fn update_id(body: &Self::Update) -> Option<i32>;
}

#[derive(Debug, Clone, Copy)]
pub struct Authors;

impl Resource for Authors {
    const NAME: &'static str = "authors";

    type Entity = Author;
    type View = AuthorView;
    type Create = AuthorCreate;
    type Update = AuthorUpdate;

    fn update_id(body: &AuthorUpdate) -> Option<i32> {
        body.id
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Books;

impl Resource for Books {
    const NAME: &'static str = "books";

    type Entity = Book;
    type View = BookView;
    type Create = BookCreate;
    type Update = BookUpdate;

    fn update_id(body: &BookUpdate) -> Option<i32> {
        body.id
    }
}

/// A request body as it arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<T> {
    /// Empty, whitespace only or JSON `null`.
    Missing,
    Malformed(String),
    Present(T),
}

impl<T: DeserializeOwned> Payload<T> {
    pub fn from_json(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Missing;
        }
        match serde_json::from_slice::<Option<T>>(bytes) {
            Ok(Some(body)) => Self::Present(body),
            Ok(None) => Self::Missing,
            Err(err) => Self::Malformed(err.to_string()),
        }
    }
}

impl<T> Payload<T> {
    fn require(self) -> Result<T, ApiError> {
        match self {
            Self::Present(body) => Ok(body),
            Self::Missing => Err(ApiError::invalid("body", "request body is required")),
            Self::Malformed(reason) => Err(ApiError::invalid("body", reason)),
        }
    }
}

impl<T> From<T> for Payload<T> {
    fn from(body: T) -> Self {
        Self::Present(body)
    }
}

#[derive(Debug)]
pub struct Created<V> {
    pub id: i32,
    pub view: V,
}

pub struct EntityEndpoint<R: Resource> {
    repository: Arc<dyn Repository<R::Entity>>,
    logger: Arc<dyn Logger>,
}

impl<R: Resource> Clone for EntityEndpoint<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            logger: Arc::clone(&self.logger),
        }
    }
}

impl<R: Resource> EntityEndpoint<R> {
    pub fn new(repository: Arc<dyn Repository<R::Entity>>, logger: Arc<dyn Logger>) -> Self {
        Self { repository, logger }
    }

    pub async fn list(&self) -> Result<Vec<R::View>, ApiError> {
        let location = Self::location("list");
        self.logger.info(&format!("{location}: attempted call"));

        let result = self.repository.find_all().await.map_err(ApiError::from);
        let rows = self.conclude(&location, result, |rows| {
            format!("returned {} records", rows.len())
        })?;

        Ok(rows.into_iter().map(R::View::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<R::View, ApiError> {
        let location = Self::location("get");
        self.logger
            .info(&format!("{location}: attempted call for id {id}"));

        let result = self
            .repository
            .find_by_id(id)
            .await
            .map_err(ApiError::from)
            .and_then(|row| row.ok_or(ApiError::NotFound { id }));
        let row = self.conclude(&location, result, |_| format!("retrieved record with id {id}"))?;

        Ok(row.into())
    }

    pub async fn create(&self, payload: Payload<R::Create>) -> Result<Created<R::View>, ApiError> {
        let location = Self::location("create");
        self.logger.info(&format!("{location}: create attempted"));

        let result = self.try_create(payload).await;
        let stored = self.conclude(&location, result, |row| {
            format!("created record with id {}", row.id())
        })?;

        Ok(Created {
            id: stored.id(),
            view: stored.into(),
        })
    }

    pub async fn update(&self, id: i32, payload: Payload<R::Update>) -> Result<(), ApiError> {
        let location = Self::location("update");
        self.logger
            .info(&format!("{location}: update attempted for id {id}"));

        let result = self.try_update(id, payload).await;
        self.conclude(&location, result, |_| format!("updated record with id {id}"))
    }

    pub async fn delete(&self, id: i32) -> Result<(), ApiError> {
        let location = Self::location("delete");
        self.logger
            .info(&format!("{location}: delete attempted for id {id}"));

        let result = self.try_delete(id).await;
        self.conclude(&location, result, |_| format!("deleted record with id {id}"))
    }

    /// Logs a request refused before `operation` could start, under the operation's label.
    pub fn reject<T>(&self, operation: &str, err: ApiError) -> Result<T, ApiError> {
        let location = Self::location(operation);
        self.conclude(&location, Err(err), |_: &T| String::new())
    }

    async fn try_create(&self, payload: Payload<R::Create>) -> Result<R::Entity, ApiError> {
        let body = payload.require()?;
        body.validate()?;

        self.repository
            .create(body.into())
            .await?
            .ok_or_else(|| ApiError::Persistence(anyhow!("insert into {} affected no rows", R::NAME)))
    }

    async fn try_update(&self, id: i32, payload: Payload<R::Update>) -> Result<(), ApiError> {
        check_id(id)?;
        let body = payload.require()?;
        match R::update_id(&body) {
            Some(body_id) if body_id == id => {}
            Some(body_id) => {
                return Err(ApiError::invalid(
                    "id",
                    format!("body id {body_id} does not match path id {id}"),
                ));
            }
            None => return Err(ApiError::invalid("id", "id is required")),
        }

        if !self.repository.exists(id).await? {
            return Err(ApiError::NotFound { id });
        }
        body.validate()?;

        // Zero rows means the record went away after the existence check.
        if !self.repository.update(body.into()).await? {
            return Err(ApiError::NotFound { id });
        }
        Ok(())
    }

    async fn try_delete(&self, id: i32) -> Result<(), ApiError> {
        check_id(id)?;
        if !self.repository.exists(id).await? {
            return Err(ApiError::NotFound { id });
        }

        let Some(row) = self.repository.find_by_id(id).await? else {
            return Err(ApiError::NotFound { id });
        };
        if !self.repository.delete(&row).await? {
            return Err(ApiError::NotFound { id });
        }
        Ok(())
    }

    /// Logs the outcome of one operation at the level its result calls for.
    fn conclude<T>(
        &self,
        location: &str,
        result: Result<T, ApiError>,
        success: impl FnOnce(&T) -> String,
    ) -> Result<T, ApiError> {
        match &result {
            Ok(value) => self
                .logger
                .info(&format!("{location}: {}", success(value))),
            Err(err) if err.is_rejection() => self.logger.warn(&format!("{location}: {err}")),
            Err(err) => self.logger.error(&format!("{location}: {err}")),
        }
        result
    }

    fn location(operation: &str) -> String {
        format!("{}-{operation}", R::NAME)
    }
}

fn check_id(id: i32) -> Result<(), ApiError> {
    if id < 1 {
        return Err(ApiError::invalid(
            "id",
            format!("id must be a positive integer, got {id}"),
        ));
    }
    Ok(())
}

use std::fmt::Debug;

/// A persisted record with a store-assigned surrogate key.
pub trait Entity: Debug + Clone + Send + Sync + 'static {
    /// Singular name used in log and error messages.
    const KIND: &'static str;

    fn id(&self) -> i32;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    /// Derived on read from `Book::author_id`; never written back.
    pub books: Vec<Book>,
}

impl Author {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            id: 0,
            first_name: first_name.into(),
            last_name: last_name.into(),
            bio: None,
            books: Vec::new(),
        }
    }
}

impl Entity for Author {
    const KIND: &'static str = "author";

    fn id(&self) -> i32 {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub year: Option<i32>,
    pub isbn: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub author_id: Option<i32>,
}

impl Book {
    pub fn new(title: &str, isbn: &str) -> Self {
        Self {
            id: 0,
            title: title.into(),
            year: None,
            isbn: isbn.into(),
            summary: None,
            image: None,
            price: None,
            author_id: None,
        }
    }
}

impl Entity for Book {
    const KIND: &'static str = "book";

    fn id(&self) -> i32 {
        self.id
    }
}

use crate::validation::{Validate, Violations};
use serde::{Deserialize, Serialize};

pub const NAME_MAX_LEN: usize = 50;
pub const BIO_MAX_LEN: usize = 250;
pub const TITLE_MAX_LEN: usize = 200;
pub const SUMMARY_MAX_LEN: usize = 500;
pub const IMAGE_MAX_LEN: usize = 500;
pub const YEAR_RANGE: (i32, i32) = (1, 9999);
pub const PRICE_RANGE: (f64, f64) = (0.0, 1_000_000.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorView {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub books: Vec<BookView>,
}

// Required fields stay optional so validation, not parsing, reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCreate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorUpdate {
    pub id: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: i32,
    pub title: String,
    pub year: Option<i32>,
    pub isbn: String,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    pub author_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCreate {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    #[serde(alias = "authorID")]
    pub author_id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
    pub id: Option<i32>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    pub summary: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
    #[serde(alias = "authorID")]
    pub author_id: Option<i32>,
}

fn check_author(
    first_name: Option<&str>,
    last_name: Option<&str>,
    bio: Option<&str>,
) -> Result<(), Violations> {
    let mut violations = Violations::new();
    violations
        .required("firstName", first_name)
        .max_length("firstName", first_name, NAME_MAX_LEN)
        .required("lastName", last_name)
        .max_length("lastName", last_name, NAME_MAX_LEN)
        .max_length("bio", bio, BIO_MAX_LEN);
    violations.into_result()
}

impl Validate for AuthorCreate {
    fn validate(&self) -> Result<(), Violations> {
        check_author(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.bio.as_deref(),
        )
    }
}

impl Validate for AuthorUpdate {
    fn validate(&self) -> Result<(), Violations> {
        check_author(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.bio.as_deref(),
        )
    }
}

struct BookFields<'a> {
    title: Option<&'a str>,
    year: Option<i32>,
    isbn: Option<&'a str>,
    summary: Option<&'a str>,
    image: Option<&'a str>,
    price: Option<f64>,
}

impl BookFields<'_> {
    fn check(&self) -> Result<(), Violations> {
        let mut violations = Violations::new();
        violations
            .required("title", self.title)
            .max_length("title", self.title, TITLE_MAX_LEN)
            .range_i32("year", self.year, YEAR_RANGE.0, YEAR_RANGE.1)
            .required("isbn", self.isbn)
            .isbn("isbn", self.isbn)
            .max_length("summary", self.summary, SUMMARY_MAX_LEN)
            .max_length("image", self.image, IMAGE_MAX_LEN)
            .range_f64("price", self.price, PRICE_RANGE.0, PRICE_RANGE.1);
        violations.into_result()
    }
}

impl Validate for BookCreate {
    fn validate(&self) -> Result<(), Violations> {
        BookFields {
            title: self.title.as_deref(),
            year: self.year,
            isbn: self.isbn.as_deref(),
            summary: self.summary.as_deref(),
            image: self.image.as_deref(),
            price: self.price,
        }
        .check()
    }
}

impl Validate for BookUpdate {
    fn validate(&self) -> Result<(), Violations> {
        BookFields {
            title: self.title.as_deref(),
            year: self.year,
            isbn: self.isbn.as_deref(),
            summary: self.summary.as_deref(),
            image: self.image.as_deref(),
            price: self.price,
        }
        .check()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(violations: &Violations) -> Vec<&str> {
        violations
            .as_slice()
            .iter()
            .map(|v| v.field.as_str())
            .collect()
    }

    #[test]
    fn empty_book_lists_title_and_isbn() {
        let body: BookCreate = serde_json::from_str("{}").unwrap();
        let err = body.validate().unwrap_err();
        assert_eq!(fields(&err), ["title", "isbn"]);
    }

    #[test]
    fn author_needs_both_names() {
        let body = AuthorCreate {
            first_name: Some("Jane".into()),
            ..AuthorCreate::default()
        };
        let err = body.validate().unwrap_err();
        assert_eq!(fields(&err), ["lastName"]);

        let body = AuthorCreate {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            bio: None,
        };
        assert!(body.validate().is_ok());
    }

    #[test]
    fn author_lengths_are_bounded() {
        let body = AuthorCreate {
            first_name: Some("x".repeat(NAME_MAX_LEN + 1)),
            last_name: Some("y".repeat(NAME_MAX_LEN)),
            bio: Some("z".repeat(BIO_MAX_LEN + 1)),
        };
        let err = body.validate().unwrap_err();
        assert_eq!(fields(&err), ["firstName", "bio"]);

        let body = AuthorUpdate {
            id: Some(1),
            first_name: Some("é".repeat(NAME_MAX_LEN)),
            last_name: Some("Doe".into()),
            bio: Some("z".repeat(BIO_MAX_LEN)),
        };
        assert!(body.validate().is_ok());
    }

    #[test]
    fn book_bounds_are_enforced() {
        let body = BookUpdate {
            id: Some(1),
            title: Some("Dune".into()),
            isbn: Some("978-0441013593".into()),
            summary: Some("x".repeat(SUMMARY_MAX_LEN + 1)),
            year: Some(0),
            price: Some(-1.0),
            ..BookUpdate::default()
        };
        let err = body.validate().unwrap_err();
        assert_eq!(fields(&err), ["year", "summary", "price"]);
    }

    #[test]
    fn wire_names_are_camel_case() {
        let body: BookCreate = serde_json::from_str(
            r#"{"title":"Dune","isbn":"0441013597","authorId":3,"price":9.99}"#,
        )
        .unwrap();
        assert_eq!(body.author_id, Some(3));
        assert_eq!(body.price, Some(9.99));

        let legacy: BookCreate =
            serde_json::from_str(r#"{"title":"Dune","isbn":"0441013597","authorID":3}"#).unwrap();
        assert_eq!(legacy.author_id, Some(3));

        let view = AuthorView {
            id: 1,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            bio: None,
            books: Vec::new(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["lastName"], "Doe");
    }
}

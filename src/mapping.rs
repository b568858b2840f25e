use crate::dto::{AuthorCreate, AuthorUpdate, AuthorView, BookCreate, BookUpdate, BookView};
use crate::models::{Author, Book};

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            bio: author.bio,
            books: author.books.into_iter().map(BookView::from).collect(),
        }
    }
}

impl From<AuthorView> for Author {
    fn from(view: AuthorView) -> Self {
        Self {
            id: view.id,
            first_name: view.first_name,
            last_name: view.last_name,
            bio: view.bio,
            books: view.books.into_iter().map(Book::from).collect(),
        }
    }
}

impl From<AuthorCreate> for Author {
    fn from(body: AuthorCreate) -> Self {
        Self {
            id: 0,
            first_name: body.first_name.unwrap_or_default(),
            last_name: body.last_name.unwrap_or_default(),
            bio: body.bio,
            books: Vec::new(),
        }
    }
}

impl From<Author> for AuthorCreate {
    fn from(author: Author) -> Self {
        Self {
            first_name: Some(author.first_name),
            last_name: Some(author.last_name),
            bio: author.bio,
        }
    }
}

impl From<AuthorUpdate> for Author {
    fn from(body: AuthorUpdate) -> Self {
        Self {
            id: body.id.unwrap_or_default(),
            first_name: body.first_name.unwrap_or_default(),
            last_name: body.last_name.unwrap_or_default(),
            bio: body.bio,
            books: Vec::new(),
        }
    }
}

impl From<Author> for AuthorUpdate {
    fn from(author: Author) -> Self {
        Self {
            id: Some(author.id),
            first_name: Some(author.first_name),
            last_name: Some(author.last_name),
            bio: author.bio,
        }
    }
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            year: book.year,
            isbn: book.isbn,
            summary: book.summary,
            image: book.image,
            price: book.price,
            author_id: book.author_id,
        }
    }
}

impl From<BookView> for Book {
    fn from(view: BookView) -> Self {
        Self {
            id: view.id,
            title: view.title,
            year: view.year,
            isbn: view.isbn,
            summary: view.summary,
            image: view.image,
            price: view.price,
            author_id: view.author_id,
        }
    }
}

impl From<BookCreate> for Book {
    fn from(body: BookCreate) -> Self {
        Self {
            id: 0,
            title: body.title.unwrap_or_default(),
            year: body.year,
            isbn: body.isbn.unwrap_or_default(),
            summary: body.summary,
            image: body.image,
            price: body.price,
            author_id: body.author_id,
        }
    }
}

impl From<Book> for BookCreate {
    fn from(book: Book) -> Self {
        Self {
            title: Some(book.title),
            year: book.year,
            isbn: Some(book.isbn),
            summary: book.summary,
            image: book.image,
            price: book.price,
            author_id: book.author_id,
        }
    }
}

impl From<BookUpdate> for Book {
    fn from(body: BookUpdate) -> Self {
        Self {
            id: body.id.unwrap_or_default(),
            title: body.title.unwrap_or_default(),
            year: body.year,
            isbn: body.isbn.unwrap_or_default(),
            summary: body.summary,
            image: body.image,
            price: body.price,
            author_id: body.author_id,
        }
    }
}

impl From<Book> for BookUpdate {
    fn from(book: Book) -> Self {
        Self {
            id: Some(book.id),
            title: Some(book.title),
            year: book.year,
            isbn: Some(book.isbn),
            summary: book.summary,
            image: book.image,
            price: book.price,
            author_id: book.author_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_book_update() -> BookUpdate {
        BookUpdate {
            id: Some(5),
            title: Some("Dune".into()),
            year: Some(1965),
            isbn: Some("978-0441013593".into()),
            summary: Some("Desert planet".into()),
            image: Some("dune.png".into()),
            price: Some(9.99),
            author_id: Some(2),
        }
    }

    #[test]
    fn book_bodies_survive_the_round_trip() {
        let update = full_book_update();
        assert_eq!(BookUpdate::from(Book::from(update.clone())), update);

        let create = BookCreate {
            title: Some("Dune".into()),
            isbn: Some("0441013597".into()),
            ..BookCreate::default()
        };
        assert_eq!(BookCreate::from(Book::from(create.clone())), create);
    }

    #[test]
    fn author_bodies_survive_the_round_trip() {
        let create = AuthorCreate {
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            bio: Some("Writes things".into()),
        };
        assert_eq!(AuthorCreate::from(Author::from(create.clone())), create);

        let update = AuthorUpdate {
            id: Some(7),
            first_name: Some("Jane".into()),
            last_name: Some("Doe".into()),
            bio: None,
        };
        assert_eq!(AuthorUpdate::from(Author::from(update.clone())), update);
    }

    #[test]
    fn views_survive_the_round_trip() {
        let book = Book::from(full_book_update());
        let view = AuthorView {
            id: 2,
            first_name: "Frank".into(),
            last_name: "Herbert".into(),
            bio: None,
            books: vec![BookView::from(book)],
        };
        assert_eq!(AuthorView::from(Author::from(view.clone())), view);
    }

    #[test]
    fn create_bodies_never_carry_an_id() {
        let book = Book::from(BookCreate {
            title: Some("Dune".into()),
            isbn: Some("0441013597".into()),
            ..BookCreate::default()
        });
        assert_eq!(book.id, 0);
        assert!(Author::from(AuthorCreate::default()).books.is_empty());
    }
}

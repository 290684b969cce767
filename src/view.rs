use serde_json::{json, Value};

use crate::forms::FieldError;
use crate::models::{
    Author, AuthorInput, Book, BookInput, BookInstance, BookSummary, Genre, GenreInput,
    InstanceInput, LoanStatus, RecordId,
};

/// A view-model handed to the rendering layer: template name, page title,
/// and the named fields that template consumes. Workflow outcomes are
/// mapped here and nowhere else; the constructors below only select and
/// arrange fields.
#[derive(Debug)]
pub struct Page {
    pub template: &'static str,
    pub title: String,
    pub model: Value,
}

impl Page {
    fn new(template: &'static str, title: impl Into<String>, model: Value) -> Self {
        Page { template, title: title.into(), model }
    }
}

// ----- entity field maps -----

pub fn author_view(author: &Author) -> Value {
    json!({
        "id": author.id().as_i64(),
        "first_name": author.first_name,
        "family_name": author.family_name,
        "name": author.name(),
        "date_of_birth": author.date_of_birth.map(|d| d.to_string()),
        "date_of_death": author.date_of_death.map(|d| d.to_string()),
        "date_of_birth_formatted": author.date_of_birth_formatted(),
        "date_of_death_formatted": author.date_of_death_formatted(),
        "lifespan_formatted": author.lifespan_formatted(),
        "url": author.url(),
    })
}

fn author_input_view(input: &AuthorInput) -> Value {
    json!({
        "first_name": input.first_name,
        "family_name": input.family_name,
        "date_of_birth": input.date_of_birth.map(|d| d.to_string()),
        "date_of_death": input.date_of_death.map(|d| d.to_string()),
    })
}

pub fn genre_view(genre: &Genre) -> Value {
    json!({
        "id": genre.id().as_i64(),
        "name": genre.name,
        "url": genre.url(),
    })
}

pub fn book_view(book: &Book) -> Value {
    json!({
        "id": book.id().as_i64(),
        "title": book.title,
        "author_id": book.author_id.as_i64(),
        "summary": book.summary,
        "isbn": book.isbn,
        "url": book.url(),
    })
}

fn summary_view(book: &BookSummary) -> Value {
    json!({
        "id": book.id().as_i64(),
        "title": book.title,
        "summary": book.summary,
        "author_name": book.author_name,
        "url": book.url(),
    })
}

pub fn instance_view(instance: &BookInstance) -> Value {
    json!({
        "id": instance.id().as_i64(),
        "book_id": instance.book_id.as_i64(),
        "imprint": instance.imprint,
        "status": instance.status.as_str(),
        "due_back": instance.due_back.map(|d| d.to_string()),
        "due_back_formatted": instance.due_back_formatted(),
        "url": instance.url(),
    })
}

fn errors_view(errors: &[FieldError]) -> Value {
    Value::Array(
        errors
            .iter()
            .map(|e| json!({ "field": e.field, "message": e.message }))
            .collect(),
    )
}

/// Genre choices for the book form, each flagged when it is part of the
/// current selection so redisplay preserves checked boxes.
fn genre_choices(genres: &[Genre], selected: &[RecordId]) -> Value {
    Value::Array(
        genres
            .iter()
            .map(|g| {
                json!({
                    "id": g.id().as_i64(),
                    "name": g.name,
                    "checked": selected.contains(&g.id()),
                })
            })
            .collect(),
    )
}

fn author_choices(authors: &[Author], selected: Option<RecordId>) -> Value {
    Value::Array(
        authors
            .iter()
            .map(|a| {
                json!({
                    "id": a.id().as_i64(),
                    "name": a.name(),
                    "selected": selected == Some(a.id()),
                })
            })
            .collect(),
    )
}

// ----- pages -----

pub struct HomeCounts {
    pub books: i64,
    pub instances: i64,
    pub instances_available: i64,
    pub authors: i64,
    pub genres: i64,
}

pub fn index(counts: HomeCounts) -> Page {
    Page::new(
        "index",
        "Local Library",
        json!({
            "book_count": counts.books,
            "book_instance_count": counts.instances,
            "book_instance_available_count": counts.instances_available,
            "author_count": counts.authors,
            "genre_count": counts.genres,
        }),
    )
}

pub fn author_list(authors: &[Author]) -> Page {
    Page::new(
        "author_list",
        "All Authors",
        json!({ "author_list": authors.iter().map(author_view).collect::<Vec<_>>() }),
    )
}

pub fn author_detail(author: &Author, books: &[BookSummary]) -> Page {
    Page::new(
        "author_detail",
        "Author Detail",
        json!({
            "author": author_view(author),
            "books_by_author": books.iter().map(summary_view).collect::<Vec<_>>(),
        }),
    )
}

pub fn author_create_form() -> Page {
    Page::new("author_form", "Add a new Author", json!({}))
}

pub fn author_form_rejected(title: &str, input: &AuthorInput, errors: &[FieldError]) -> Page {
    Page::new(
        "author_form",
        title.to_string(),
        json!({
            "author": author_input_view(input),
            "errors": errors_view(errors),
        }),
    )
}

pub fn author_update_form(author: &Author) -> Page {
    Page::new(
        "author_form",
        "Update Author",
        json!({ "author": author_view(author) }),
    )
}

pub fn author_delete(author: &Author, books: &[BookSummary]) -> Page {
    Page::new(
        "author_delete",
        "Delete Author",
        json!({
            "author": author_view(author),
            "author_books": books.iter().map(summary_view).collect::<Vec<_>>(),
        }),
    )
}

pub fn genre_list(genres: &[Genre]) -> Page {
    Page::new(
        "genre_list",
        "All Genres",
        json!({ "genre_list": genres.iter().map(genre_view).collect::<Vec<_>>() }),
    )
}

pub fn genre_detail(genre: &Genre, books: &[BookSummary]) -> Page {
    Page::new(
        "genre_detail",
        "Genre Detail",
        json!({
            "genre": genre_view(genre),
            "books_in_genre": books.iter().map(summary_view).collect::<Vec<_>>(),
        }),
    )
}

pub fn genre_create_form() -> Page {
    Page::new("genre_form", "Create Genre", json!({}))
}

pub fn genre_form_rejected(title: &str, input: &GenreInput, errors: &[FieldError]) -> Page {
    Page::new(
        "genre_form",
        title.to_string(),
        json!({
            "genre": { "name": input.name },
            "errors": errors_view(errors),
        }),
    )
}

pub fn genre_update_form(genre: &Genre) -> Page {
    Page::new(
        "genre_form",
        "Update Genre",
        json!({ "genre": genre_view(genre) }),
    )
}

pub fn genre_delete(genre: &Genre, books: &[BookSummary]) -> Page {
    Page::new(
        "genre_delete",
        "Delete Genre",
        json!({
            "genre": genre_view(genre),
            "genre_books": books.iter().map(summary_view).collect::<Vec<_>>(),
        }),
    )
}

pub fn book_list(books: &[BookSummary]) -> Page {
    Page::new(
        "book_list",
        "Book List",
        json!({ "book_list": books.iter().map(summary_view).collect::<Vec<_>>() }),
    )
}

pub fn book_detail(
    book: &Book,
    author: &Author,
    genres: &[Genre],
    instances: &[BookInstance],
) -> Page {
    Page::new(
        "book_detail",
        book.title.clone(),
        json!({
            "book": book_view(book),
            "author": author_view(author),
            "genres": genres.iter().map(genre_view).collect::<Vec<_>>(),
            "book_instances": instances.iter().map(instance_view).collect::<Vec<_>>(),
        }),
    )
}

/// Book form: shown blank for create, pre-filled for update, and
/// redisplayed with errors and preserved selections after a rejection.
pub fn book_form(
    title: &str,
    authors: &[Author],
    genres: &[Genre],
    input: Option<&BookInput>,
    errors: &[FieldError],
) -> Page {
    let (selected_author, selected_genres, book) = match input {
        Some(input) => (
            input.author_id,
            input.genre_ids.as_slice(),
            json!({
                "title": input.title,
                "summary": input.summary,
                "isbn": input.isbn,
            }),
        ),
        None => (None, &[] as &[RecordId], Value::Null),
    };

    Page::new(
        "book_form",
        title.to_string(),
        json!({
            "book": book,
            "authors": author_choices(authors, selected_author),
            "genres": genre_choices(genres, selected_genres),
            "errors": errors_view(errors),
        }),
    )
}

pub fn book_delete(book: &Book, instances: &[BookInstance]) -> Page {
    Page::new(
        "book_delete",
        "Delete Book",
        json!({
            "book": book_view(book),
            "book_instances": instances.iter().map(instance_view).collect::<Vec<_>>(),
        }),
    )
}

pub fn instance_list(instances: &[(BookInstance, String)]) -> Page {
    let items: Vec<Value> = instances
        .iter()
        .map(|(instance, book_title)| {
            let mut view = instance_view(instance);
            view["book_title"] = json!(book_title);
            view
        })
        .collect();

    Page::new("bookinstance_list", "Book Inventory", json!({ "bookinstance_list": items }))
}

pub fn instance_detail(instance: &BookInstance, book: &Book) -> Page {
    Page::new(
        "bookinstance_detail",
        format!("Copy: {}", book.title),
        json!({
            "book_instance": instance_view(instance),
            "book": book_view(book),
        }),
    )
}

/// BookInstance form; `book_list` is the select of all books, flagged with
/// the current selection, and the status select covers every loan state.
pub fn instance_form(
    title: &str,
    books: &[BookSummary],
    input: Option<&InstanceInput>,
    errors: &[FieldError],
) -> Page {
    let (selected_book, instance) = match input {
        Some(input) => (
            input.book_id,
            json!({
                "imprint": input.imprint,
                "status": input.status.as_str(),
                "due_back": input.due_back.map(|d| d.to_string()),
            }),
        ),
        None => (None, Value::Null),
    };

    let book_choices: Vec<Value> = books
        .iter()
        .map(|b| {
            json!({
                "id": b.id().as_i64(),
                "title": b.title,
                "selected": selected_book == Some(b.id()),
            })
        })
        .collect();

    let statuses: Vec<Value> = LoanStatus::all()
        .iter()
        .map(|s| json!(s.as_str()))
        .collect();

    Page::new(
        "bookinstance_form",
        title.to_string(),
        json!({
            "book_list": book_choices,
            "bookinstance": instance,
            "statuses": statuses,
            "errors": errors_view(errors),
        }),
    )
}

pub fn instance_delete(instance: &BookInstance) -> Page {
    Page::new(
        "bookinstance_delete",
        "Delete this Book Instance",
        json!({ "book_instance": instance_view(instance) }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_form_preserves_checked_genres_on_redisplay() {
        let genres = vec![
            Genre::new(RecordId::new(1), "Fantasy".into()),
            Genre::new(RecordId::new(2), "Science Fiction".into()),
        ];
        let input = BookInput {
            title: "Dune".into(),
            author_id: None,
            summary: "".into(),
            isbn: "i".into(),
            genre_ids: vec![RecordId::new(2)],
        };

        let page = book_form("Create Book", &[], &genres, Some(&input), &[]);
        let choices = page.model["genres"].as_array().unwrap();
        assert_eq!(choices[0]["checked"], json!(false));
        assert_eq!(choices[1]["checked"], json!(true));
    }

    #[test]
    fn rejected_form_model_carries_field_errors() {
        let input = AuthorInput::default();
        let errors = vec![FieldError { field: "first_name", message: "required" }];
        let page = author_form_rejected("Create Author", &input, &errors);
        assert_eq!(page.template, "author_form");
        assert_eq!(page.model["errors"][0]["field"], json!("first_name"));
    }
}

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{
    AuthorInput, BookInput, GenreInput, InstanceInput, LoanStatus, RecordId,
};

static ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Za-z0-9]+$").unwrap());

/// Raw form submission as an ordered field multimap.
///
/// A field submitted zero, one, or many times always reads back as a list
/// through `values`, so multi-valued fields (the book's genre checkboxes)
/// have one shape regardless of submission cardinality.
#[derive(Debug, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    /// Decodes a urlencoded body. An undecodable body reads as an empty
    /// form and falls out of the workflow as missing-field validation
    /// errors rather than a transport error.
    pub fn parse(raw: &[u8]) -> Self {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(raw)
            .unwrap_or_default();
        FormData { pairs }
    }

    /// First submitted value for a field, or "" when absent.
    pub fn value(&self, name: &str) -> &str {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn values(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: &'static str, message: &'static str) -> Self {
        FieldError { field, message }
    }
}

/// Entity-escapes the HTML-significant characters: `& < > " ' /`.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(ch),
        }
    }
    out
}

fn sanitize_text(raw: &str) -> String {
    escape_html(raw.trim())
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn parse_id(raw: &str) -> Option<RecordId> {
    raw.trim().parse::<i64>().ok().map(RecordId::new)
}

/// Identity submitted in a form body. The delete workflows read the id
/// from the posted body, not the URL path.
pub fn body_id(form: &FormData, field: &str) -> Option<RecordId> {
    parse_id(form.value(field))
}

/// Optional date field with the falsy exemption: empty input is simply
/// absent, only a non-empty unparseable value is a validation error.
fn optional_date(
    form: &FormData,
    field: &'static str,
    message: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<NaiveDate> {
    let raw = form.value(field).trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_iso_date(raw);
    if parsed.is_none() {
        errors.push(FieldError::new(field, message));
    }
    parsed
}

fn person_name(
    form: &FormData,
    field: &'static str,
    required_message: &'static str,
    charset_message: &'static str,
    length_message: &'static str,
    errors: &mut Vec<FieldError>,
) -> String {
    let trimmed = form.value(field).trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, required_message));
    } else if !ALPHANUMERIC.is_match(trimmed) {
        errors.push(FieldError::new(field, charset_message));
    }
    if trimmed.chars().count() > 100 {
        errors.push(FieldError::new(field, length_message));
    }
    escape_html(trimmed)
}

/// Author form extraction. Sanitization and validation both run to
/// completion: the returned payload is always the best-effort normalized
/// record, usable for redisplay even when errors are present.
pub fn author_input(form: &FormData) -> (AuthorInput, Vec<FieldError>) {
    let mut errors = Vec::new();

    let first_name = person_name(
        form,
        "first_name",
        "Author's First Name is required.",
        "Please remove any non-alphanumeric characters from the First Name.",
        "First Name must be 100 characters or fewer.",
        &mut errors,
    );
    let family_name = person_name(
        form,
        "family_name",
        "Author's Family Name is required.",
        "Please remove any non-alphanumeric characters from the Family Name.",
        "Family Name must be 100 characters or fewer.",
        &mut errors,
    );
    let date_of_birth = optional_date(form, "date_of_birth", "Invalid date of birth", &mut errors);
    let date_of_death = optional_date(form, "date_of_death", "Invalid date of death", &mut errors);

    (
        AuthorInput { first_name, family_name, date_of_birth, date_of_death },
        errors,
    )
}

pub fn genre_input(form: &FormData) -> (GenreInput, Vec<FieldError>) {
    let mut errors = Vec::new();

    let trimmed = form.value("name").trim();
    if trimmed.is_empty() {
        errors.push(FieldError::new("name", "Please enter a genre name."));
    } else if trimmed.chars().count() < 3 {
        errors.push(FieldError::new("name", "Genre name must be at least three characters."));
    }

    (GenreInput { name: escape_html(trimmed) }, errors)
}

pub fn book_input(form: &FormData) -> (BookInput, Vec<FieldError>) {
    let mut errors = Vec::new();

    let title = sanitize_text(form.value("title"));
    if title.is_empty() {
        errors.push(FieldError::new("title", "Title must not be empty"));
    }

    let author_raw = form.value("author").trim();
    let author_id = parse_id(author_raw);
    if author_id.is_none() {
        errors.push(FieldError::new("author", "Please select an author"));
    }

    let summary = sanitize_text(form.value("summary"));
    if summary.is_empty() {
        errors.push(FieldError::new("summary", "Don't forget to add a summary!"));
    }

    let isbn = sanitize_text(form.value("isbn"));
    if isbn.is_empty() {
        errors.push(FieldError::new("isbn", "Please enter an ISBN"));
    }

    // Zero checkboxes, one checkbox, many checkboxes: always a list.
    let mut genre_ids = Vec::new();
    let mut genre_error = false;
    for raw in form.values("genre") {
        match parse_id(raw) {
            Some(id) => genre_ids.push(id),
            None => genre_error = true,
        }
    }
    if genre_error {
        errors.push(FieldError::new("genre", "Invalid genre selection"));
    }

    (
        BookInput { title, author_id, summary, isbn, genre_ids },
        errors,
    )
}

pub fn instance_input(form: &FormData) -> (InstanceInput, Vec<FieldError>) {
    let mut errors = Vec::new();

    let book_raw = form.value("book").trim();
    let book_id = parse_id(book_raw);
    if book_id.is_none() {
        errors.push(FieldError::new("book", "Book must be specified"));
    }

    let imprint = sanitize_text(form.value("imprint"));
    if imprint.is_empty() {
        errors.push(FieldError::new("imprint", "Imprint must be specified"));
    }

    let status_raw = form.value("status").trim();
    let status = if status_raw.is_empty() {
        LoanStatus::default()
    } else {
        match LoanStatus::parse(status_raw) {
            Some(status) => status,
            None => {
                errors.push(FieldError::new("status", "Invalid status"));
                LoanStatus::default()
            }
        }
    };

    let due_back = optional_date(form, "due_back", "Invalid date", &mut errors);

    (
        InstanceInput { book_id, imprint, status, due_back },
        errors,
    )
}

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Immutable record identity. Constructor-only: once a record carries an
/// id there is no way to point it at a different one, so full-record
/// replacement on update can never reassign identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(i64);

impl RecordId {
    pub fn new(raw: i64) -> Self {
        RecordId(raw)
    }

    pub fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Author {
    id: RecordId,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    pub fn new(
        id: RecordId,
        first_name: String,
        family_name: String,
        date_of_birth: Option<NaiveDate>,
        date_of_death: Option<NaiveDate>,
    ) -> Self {
        Self { id, first_name, family_name, date_of_birth, date_of_death }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Display name, "family, first". Computed at read time, never stored.
    pub fn name(&self) -> String {
        format!("{}, {}", self.family_name, self.first_name)
    }

    /// Lifespan in whole years; requires both dates.
    pub fn lifespan(&self) -> Option<i32> {
        match (self.date_of_birth, self.date_of_death) {
            (Some(born), Some(died)) => Some(died.year() - born.year()),
            _ => None,
        }
    }

    pub fn date_of_birth_formatted(&self) -> String {
        self.date_of_birth.map(format_date).unwrap_or_default()
    }

    pub fn date_of_death_formatted(&self) -> String {
        self.date_of_death.map(format_date).unwrap_or_default()
    }

    pub fn lifespan_formatted(&self) -> String {
        if self.date_of_birth.is_none() && self.date_of_death.is_none() {
            return String::new();
        }
        format!("{} - {}", self.date_of_birth_formatted(), self.date_of_death_formatted())
    }

    pub fn url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }
}

/// New-record payload for an Author. Input payloads deliberately carry no
/// identity field: identity is assigned by the store on insert and pinned
/// by the caller on replace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorInput {
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Genre {
    id: RecordId,
    pub name: String,
}

impl Genre {
    pub fn new(id: RecordId, name: String) -> Self {
        Self { id, name }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    id: RecordId,
    pub title: String,
    pub author_id: RecordId,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<RecordId>,
}

impl Book {
    pub fn new(
        id: RecordId,
        title: String,
        author_id: RecordId,
        summary: String,
        isbn: String,
        genre_ids: Vec<RecordId>,
    ) -> Self {
        Self { id, title, author_id, summary, isbn, genre_ids }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookInput {
    pub title: String,
    pub author_id: Option<RecordId>,
    pub summary: String,
    pub isbn: String,
    pub genre_ids: Vec<RecordId>,
}

/// Reduced projection for list pages and dependent listings, carrying
/// only the fields those pages show.
#[derive(Debug, Clone, PartialEq)]
pub struct BookSummary {
    id: RecordId,
    pub title: String,
    pub summary: String,
    pub author_name: Option<String>,
}

impl BookSummary {
    pub fn new(id: RecordId, title: String, summary: String, author_name: Option<String>) -> Self {
        Self { id, title, summary, author_name }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }
}

/// Loan state of a physical copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl LoanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Available => "Available",
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::Loaned => "Loaned",
            LoanStatus::Reserved => "Reserved",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Available" => Some(LoanStatus::Available),
            "Maintenance" => Some(LoanStatus::Maintenance),
            "Loaned" => Some(LoanStatus::Loaned),
            "Reserved" => Some(LoanStatus::Reserved),
            _ => None,
        }
    }

    pub fn all() -> [LoanStatus; 4] {
        [
            LoanStatus::Available,
            LoanStatus::Maintenance,
            LoanStatus::Loaned,
            LoanStatus::Reserved,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceInput {
    pub book_id: Option<RecordId>,
    pub imprint: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookInstance {
    id: RecordId,
    pub book_id: RecordId,
    pub imprint: String,
    pub status: LoanStatus,
    pub due_back: Option<NaiveDate>,
}

impl BookInstance {
    pub fn new(
        id: RecordId,
        book_id: RecordId,
        imprint: String,
        status: LoanStatus,
        due_back: Option<NaiveDate>,
    ) -> Self {
        Self { id, book_id, imprint, status, due_back }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn due_back_formatted(&self) -> String {
        self.due_back.map(format_date).unwrap_or_default()
    }

    pub fn url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn author_display_name_is_family_comma_first() {
        let author = Author::new(
            RecordId::new(1),
            "Frank".into(),
            "Herbert".into(),
            None,
            None,
        );
        assert_eq!(author.name(), "Herbert, Frank");
        assert_eq!(author.url(), "/catalog/author/1");
    }

    #[test]
    fn lifespan_requires_both_dates() {
        let mut author = Author::new(
            RecordId::new(2),
            "Ursula".into(),
            "LeGuin".into(),
            Some(date(1929, 10, 21)),
            None,
        );
        assert_eq!(author.lifespan(), None);

        author.date_of_death = Some(date(2018, 1, 22));
        assert_eq!(author.lifespan(), Some(89));
        assert_eq!(author.lifespan_formatted(), "October 21, 1929 - January 22, 2018");
    }

    #[test]
    fn lifespan_formatted_empty_without_dates() {
        let author = Author::new(RecordId::new(3), "A".into(), "B".into(), None, None);
        assert_eq!(author.lifespan_formatted(), "");
    }

    #[test]
    fn loan_status_defaults_to_maintenance() {
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);
        assert_eq!(LoanStatus::parse("Loaned"), Some(LoanStatus::Loaned));
        assert_eq!(LoanStatus::parse("loaned"), None);
        assert_eq!(LoanStatus::Available.as_str(), "Available");
    }

    #[test]
    fn entity_urls_use_catalog_prefix() {
        let genre = Genre::new(RecordId::new(7), "Fantasy".into());
        assert_eq!(genre.url(), "/catalog/genre/7");

        let book = Book::new(
            RecordId::new(9),
            "Dune".into(),
            RecordId::new(1),
            "Desert planet".into(),
            "9780441013593".into(),
            vec![],
        );
        assert_eq!(book.url(), "/catalog/book/9");

        let copy = BookInstance::new(
            RecordId::new(4),
            book.id(),
            "Ace, 1990".into(),
            LoanStatus::default(),
            None,
        );
        assert_eq!(copy.url(), "/catalog/bookinstance/4");
        assert_eq!(copy.due_back_formatted(), "");
    }
}

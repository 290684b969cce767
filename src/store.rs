use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use crate::models::{
    Author, AuthorInput, Book, BookInput, BookInstance, BookSummary, Genre, GenreInput,
    InstanceInput, LoanStatus, RecordId,
};

/// Async catalog store over a SQLx connection pool.
///
/// Holds no state besides the pool; every operation round-trips to the
/// database. Referential integrity is checked only on delete, through the
/// conditional `delete_*_if_*` statements.
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(CatalogStore { pool })
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS authors (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                family_name TEXT NOT NULL,
                date_of_birth TEXT,
                date_of_death TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        // UNIQUE backstops the pre-insert existence check in the genre
        // create workflow; concurrent duplicate inserts fail here instead
        // of slipping through.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS genres (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS books (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                author_id INTEGER NOT NULL,
                summary TEXT NOT NULL,
                isbn TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS book_genres (
                book_id INTEGER NOT NULL,
                genre_id INTEGER NOT NULL,
                PRIMARY KEY (book_id, genre_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS book_instances (
                id INTEGER PRIMARY KEY,
                book_id INTEGER NOT NULL,
                imprint TEXT NOT NULL,
                status TEXT NOT NULL,
                due_back TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_author ON books(author_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_book_genres_genre ON book_genres(genre_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_instances_book ON book_instances(book_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_instances_status ON book_instances(status)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // ----- authors -----

    pub async fn insert_author(&self, input: &AuthorInput) -> Result<Author> {
        let result = sqlx::query(
            "INSERT INTO authors (first_name, family_name, date_of_birth, date_of_death)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&input.first_name)
        .bind(&input.family_name)
        .bind(input.date_of_birth)
        .bind(input.date_of_death)
        .execute(&self.pool)
        .await?;

        let id = RecordId::new(result.last_insert_rowid());
        tracing::debug!("author {} created", id);

        Ok(Author::new(
            id,
            input.first_name.clone(),
            input.family_name.clone(),
            input.date_of_birth,
            input.date_of_death,
        ))
    }

    pub async fn find_author(&self, id: RecordId) -> Result<Option<Author>> {
        let row = sqlx::query(
            "SELECT id, first_name, family_name, date_of_birth, date_of_death
             FROM authors WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(author_from_row))
    }

    pub async fn list_authors(&self) -> Result<Vec<Author>> {
        let rows = sqlx::query(
            "SELECT id, first_name, family_name, date_of_birth, date_of_death
             FROM authors ORDER BY family_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(author_from_row).collect())
    }

    /// Full-record replacement; the id comes from the caller, never from
    /// the input payload. Returns false when no such record exists.
    pub async fn replace_author(&self, id: RecordId, input: &AuthorInput) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE authors
             SET first_name = ?, family_name = ?, date_of_birth = ?, date_of_death = ?
             WHERE id = ?",
        )
        .bind(&input.first_name)
        .bind(&input.family_name)
        .bind(input.date_of_birth)
        .bind(input.date_of_death)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes only while no book references the author; the check and the
    /// delete are one statement, so a book created between the workflow's
    /// guard pass and this call still blocks the removal.
    pub async fn delete_author_if_unreferenced(&self, id: RecordId) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM authors
             WHERE id = ?1
               AND NOT EXISTS (SELECT 1 FROM books WHERE author_id = ?1)",
        )
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_authors(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    // ----- genres -----

    pub async fn insert_genre(&self, input: &GenreInput) -> Result<Genre> {
        let result = sqlx::query("INSERT INTO genres (name) VALUES (?)")
            .bind(&input.name)
            .execute(&self.pool)
            .await?;

        let id = RecordId::new(result.last_insert_rowid());
        tracing::debug!("genre {} created", id);

        Ok(Genre::new(id, input.name.clone()))
    }

    pub async fn find_genre(&self, id: RecordId) -> Result<Option<Genre>> {
        let row = sqlx::query("SELECT id, name FROM genres WHERE id = ?")
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(genre_from_row))
    }

    /// Exact-match lookup (SQLite BINARY collation, so case-sensitive),
    /// backing the silent-merge check in genre create.
    pub async fn find_genre_by_name(&self, name: &str) -> Result<Option<Genre>> {
        let row = sqlx::query("SELECT id, name FROM genres WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(genre_from_row))
    }

    pub async fn list_genres(&self) -> Result<Vec<Genre>> {
        let rows = sqlx::query("SELECT id, name FROM genres")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(genre_from_row).collect())
    }

    pub async fn replace_genre(&self, id: RecordId, input: &GenreInput) -> Result<bool> {
        let result = sqlx::query("UPDATE genres SET name = ? WHERE id = ?")
            .bind(&input.name)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_genre_if_unreferenced(&self, id: RecordId) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM genres
             WHERE id = ?1
               AND NOT EXISTS (SELECT 1 FROM book_genres WHERE genre_id = ?1)",
        )
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_genres(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    // ----- books -----

    pub async fn insert_book(&self, input: &BookInput) -> Result<Book> {
        let author_id = input
            .author_id
            .ok_or_else(|| anyhow!("book input has no author id"))?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO books (title, author_id, summary, isbn) VALUES (?, ?, ?, ?)",
        )
        .bind(&input.title)
        .bind(author_id.as_i64())
        .bind(&input.summary)
        .bind(&input.isbn)
        .execute(&mut *tx)
        .await?;

        let id = RecordId::new(result.last_insert_rowid());

        for genre_id in &input.genre_ids {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?)")
                .bind(id.as_i64())
                .bind(genre_id.as_i64())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!("book {} created", id);

        Ok(Book::new(
            id,
            input.title.clone(),
            author_id,
            input.summary.clone(),
            input.isbn.clone(),
            input.genre_ids.clone(),
        ))
    }

    pub async fn find_book(&self, id: RecordId) -> Result<Option<Book>> {
        let row = sqlx::query(
            "SELECT id, title, author_id, summary, isbn FROM books WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let genre_rows = sqlx::query("SELECT genre_id FROM book_genres WHERE book_id = ?")
            .bind(id.as_i64())
            .fetch_all(&self.pool)
            .await?;

        let genre_ids = genre_rows
            .into_iter()
            .map(|r| RecordId::new(r.get::<i64, _>("genre_id")))
            .collect();

        Ok(Some(Book::new(
            RecordId::new(row.get("id")),
            row.get("title"),
            RecordId::new(row.get("author_id")),
            row.get("summary"),
            row.get("isbn"),
            genre_ids,
        )))
    }

    /// Book list projection, title ascending, joined with each book's
    /// author for display.
    pub async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(
            "SELECT b.id, b.title, b.summary, a.family_name, a.first_name
             FROM books b JOIN authors a ON a.id = b.author_id
             ORDER BY b.title ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let author = format!(
                    "{}, {}",
                    row.get::<String, _>("family_name"),
                    row.get::<String, _>("first_name")
                );
                BookSummary::new(
                    RecordId::new(row.get("id")),
                    row.get("title"),
                    row.get("summary"),
                    Some(author),
                )
            })
            .collect())
    }

    pub async fn books_by_author(&self, author_id: RecordId) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(
            "SELECT id, title, summary FROM books WHERE author_id = ?",
        )
        .bind(author_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(summary_from_row).collect())
    }

    pub async fn books_by_genre(&self, genre_id: RecordId) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(
            "SELECT b.id, b.title, b.summary
             FROM books b JOIN book_genres bg ON bg.book_id = b.id
             WHERE bg.genre_id = ?",
        )
        .bind(genre_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(summary_from_row).collect())
    }

    pub async fn genres_of_book(&self, book_id: RecordId) -> Result<Vec<Genre>> {
        let rows = sqlx::query(
            "SELECT g.id, g.name
             FROM genres g JOIN book_genres bg ON bg.genre_id = g.id
             WHERE bg.book_id = ?",
        )
        .bind(book_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(genre_from_row).collect())
    }

    /// Full replacement including the genre link set.
    pub async fn replace_book(&self, id: RecordId, input: &BookInput) -> Result<bool> {
        let author_id = input
            .author_id
            .ok_or_else(|| anyhow!("book input has no author id"))?;

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE books SET title = ?, author_id = ?, summary = ?, isbn = ? WHERE id = ?",
        )
        .bind(&input.title)
        .bind(author_id.as_i64())
        .bind(&input.summary)
        .bind(&input.isbn)
        .bind(id.as_i64())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM book_genres WHERE book_id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        for genre_id in &input.genre_ids {
            sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES (?, ?)")
                .bind(id.as_i64())
                .bind(genre_id.as_i64())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    pub async fn delete_book_if_uninstanced(&self, id: RecordId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "DELETE FROM books
             WHERE id = ?1
               AND NOT EXISTS (SELECT 1 FROM book_instances WHERE book_id = ?1)",
        )
        .bind(id.as_i64())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("DELETE FROM book_genres WHERE book_id = ?")
            .bind(id.as_i64())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn count_books(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    // ----- book instances -----

    pub async fn insert_instance(&self, input: &InstanceInput) -> Result<BookInstance> {
        let book_id = input
            .book_id
            .ok_or_else(|| anyhow!("instance input has no book id"))?;

        let result = sqlx::query(
            "INSERT INTO book_instances (book_id, imprint, status, due_back)
             VALUES (?, ?, ?, ?)",
        )
        .bind(book_id.as_i64())
        .bind(&input.imprint)
        .bind(input.status.as_str())
        .bind(input.due_back)
        .execute(&self.pool)
        .await?;

        let id = RecordId::new(result.last_insert_rowid());
        tracing::debug!("book instance {} created", id);

        Ok(BookInstance::new(
            id,
            book_id,
            input.imprint.clone(),
            input.status,
            input.due_back,
        ))
    }

    pub async fn find_instance(&self, id: RecordId) -> Result<Option<BookInstance>> {
        let row = sqlx::query(
            "SELECT id, book_id, imprint, status, due_back FROM book_instances WHERE id = ?",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(instance_from_row).transpose()
    }

    /// Inventory listing joined with each copy's book title.
    pub async fn list_instances(&self) -> Result<Vec<(BookInstance, String)>> {
        let rows = sqlx::query(
            "SELECT i.id, i.book_id, i.imprint, i.status, i.due_back, b.title
             FROM book_instances i JOIN books b ON b.id = i.book_id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let title: String = row.get("title");
                Ok((instance_from_row(row)?, title))
            })
            .collect()
    }

    pub async fn instances_of_book(&self, book_id: RecordId) -> Result<Vec<BookInstance>> {
        let rows = sqlx::query(
            "SELECT id, book_id, imprint, status, due_back
             FROM book_instances WHERE book_id = ?",
        )
        .bind(book_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(instance_from_row).collect()
    }

    /// Instances have no dependents, so deletion is unconditional.
    pub async fn delete_instance(&self, id: RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_instances(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }

    pub async fn count_instances_by_status(&self, status: LoanStatus) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM book_instances WHERE status = ?")
            .bind(status.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }
}

fn author_from_row(row: SqliteRow) -> Author {
    Author::new(
        RecordId::new(row.get("id")),
        row.get("first_name"),
        row.get("family_name"),
        row.get::<Option<NaiveDate>, _>("date_of_birth"),
        row.get::<Option<NaiveDate>, _>("date_of_death"),
    )
}

fn genre_from_row(row: SqliteRow) -> Genre {
    Genre::new(RecordId::new(row.get("id")), row.get("name"))
}

fn summary_from_row(row: SqliteRow) -> BookSummary {
    BookSummary::new(
        RecordId::new(row.get("id")),
        row.get("title"),
        row.get("summary"),
        None,
    )
}

fn instance_from_row(row: SqliteRow) -> Result<BookInstance> {
    let status_raw: String = row.get("status");
    let status = LoanStatus::parse(&status_raw)
        .ok_or_else(|| anyhow!("unknown loan status in store: {}", status_raw))?;

    Ok(BookInstance::new(
        RecordId::new(row.get("id")),
        RecordId::new(row.get("book_id")),
        row.get("imprint"),
        status,
        row.get::<Option<NaiveDate>, _>("due_back"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_store(dir: &TempDir) -> CatalogStore {
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("catalog.db").display()
        );
        let store = CatalogStore::new(&url).await.unwrap();
        store.init().await.unwrap();
        store
    }

    fn author_input(first: &str, family: &str) -> AuthorInput {
        AuthorInput {
            first_name: first.to_string(),
            family_name: family.to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    async fn seed_book(store: &CatalogStore, title: &str, author: RecordId) -> Book {
        store
            .insert_book(&BookInput {
                title: title.to_string(),
                author_id: Some(author),
                summary: "summary".to_string(),
                isbn: "123".to_string(),
                genre_ids: vec![],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reads_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let author = store.insert_author(&author_input("Frank", "Herbert")).await.unwrap();
        let first = store.find_author(author.id()).await.unwrap().unwrap();
        let second = store.find_author(author.id()).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.name(), "Herbert, Frank");
    }

    #[tokio::test]
    async fn conditional_author_delete_respects_dependents() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let author = store.insert_author(&author_input("Frank", "Herbert")).await.unwrap();
        let book = seed_book(&store, "Dune", author.id()).await;

        assert!(!store.delete_author_if_unreferenced(author.id()).await.unwrap());
        assert!(store.find_author(author.id()).await.unwrap().is_some());

        assert!(store.delete_book_if_uninstanced(book.id()).await.unwrap());
        assert!(store.delete_author_if_unreferenced(author.id()).await.unwrap());
        assert!(store.find_author(author.id()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_genre_names_are_rejected_by_the_schema() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let input = GenreInput { name: "Fantasy".to_string() };
        store.insert_genre(&input).await.unwrap();
        assert!(store.insert_genre(&input).await.is_err());
    }

    #[tokio::test]
    async fn replace_book_keeps_identity_and_swaps_genre_links() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let author = store.insert_author(&author_input("Frank", "Herbert")).await.unwrap();
        let fantasy = store.insert_genre(&GenreInput { name: "Fantasy".into() }).await.unwrap();
        let scifi = store.insert_genre(&GenreInput { name: "Science Fiction".into() }).await.unwrap();

        let book = store
            .insert_book(&BookInput {
                title: "Dune".into(),
                author_id: Some(author.id()),
                summary: "Desert planet".into(),
                isbn: "9780441013593".into(),
                genre_ids: vec![fantasy.id()],
            })
            .await
            .unwrap();

        let replaced = store
            .replace_book(
                book.id(),
                &BookInput {
                    title: "Dune Messiah".into(),
                    author_id: Some(author.id()),
                    summary: "Sequel".into(),
                    isbn: "9780441172696".into(),
                    genre_ids: vec![scifi.id()],
                },
            )
            .await
            .unwrap();
        assert!(replaced);

        let stored = store.find_book(book.id()).await.unwrap().unwrap();
        assert_eq!(stored.id(), book.id());
        assert_eq!(stored.title, "Dune Messiah");
        assert_eq!(stored.genre_ids, vec![scifi.id()]);

        let missing = RecordId::new(9999);
        assert!(!store.replace_book(missing, &BookInput {
            title: "x".into(),
            author_id: Some(author.id()),
            summary: "x".into(),
            isbn: "x".into(),
            genre_ids: vec![],
        }).await.unwrap());
    }

    #[tokio::test]
    async fn book_list_is_title_sorted_with_author_names() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let author = store.insert_author(&author_input("Frank", "Herbert")).await.unwrap();
        seed_book(&store, "Whipping Star", author.id()).await;
        seed_book(&store, "Dune", author.id()).await;

        let list = store.list_books().await.unwrap();
        let titles: Vec<_> = list.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Whipping Star"]);
        assert_eq!(list[0].author_name.as_deref(), Some("Herbert, Frank"));
    }

    #[tokio::test]
    async fn instance_counts_by_status() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let author = store.insert_author(&author_input("Frank", "Herbert")).await.unwrap();
        let book = seed_book(&store, "Dune", author.id()).await;

        for status in [LoanStatus::Available, LoanStatus::Available, LoanStatus::Loaned] {
            store
                .insert_instance(&InstanceInput {
                    book_id: Some(book.id()),
                    imprint: "Ace, 1990".into(),
                    status,
                    due_back: None,
                })
                .await
                .unwrap();
        }

        assert_eq!(store.count_instances().await.unwrap(), 3);
        assert_eq!(
            store.count_instances_by_status(LoanStatus::Available).await.unwrap(),
            2
        );
        assert!(!store.delete_book_if_uninstanced(book.id()).await.unwrap());
    }
}


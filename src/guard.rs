use anyhow::Result;

use crate::models::{BookInstance, BookSummary, RecordId};
use crate::store::CatalogStore;

/// Outcome of the pre-delete dependency check. `Blocked` carries the
/// dependent records so the confirm page can list them for the user to
/// resolve; there is no cascading delete.
#[derive(Debug)]
pub enum DeleteDecision<T> {
    Allowed,
    Blocked(Vec<T>),
}

impl<T> DeleteDecision<T> {
    pub fn from_dependents(dependents: Vec<T>) -> Self {
        if dependents.is_empty() {
            DeleteDecision::Allowed
        } else {
            DeleteDecision::Blocked(dependents)
        }
    }
}

/// An author's dependents are the books referencing it.
pub async fn check_author(
    store: &CatalogStore,
    id: RecordId,
) -> Result<DeleteDecision<BookSummary>> {
    Ok(DeleteDecision::from_dependents(store.books_by_author(id).await?))
}

/// A genre's dependents are the books tagged with it.
pub async fn check_genre(
    store: &CatalogStore,
    id: RecordId,
) -> Result<DeleteDecision<BookSummary>> {
    Ok(DeleteDecision::from_dependents(store.books_by_genre(id).await?))
}

/// A book's dependents are its physical copies. BookInstance itself has
/// no dependents and needs no check.
pub async fn check_book(
    store: &CatalogStore,
    id: RecordId,
) -> Result<DeleteDecision<BookInstance>> {
    Ok(DeleteDecision::from_dependents(store.instances_of_book(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuthorInput, BookInput, InstanceInput, LoanStatus};
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

    #[tokio::test]
    async fn author_with_books_is_blocked() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let author = store
            .insert_author(&AuthorInput {
                first_name: "Frank".into(),
                family_name: "Herbert".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(matches!(
            check_author(&store, author.id()).await.unwrap(),
            DeleteDecision::Allowed
        ));

        store
            .insert_book(&BookInput {
                title: "Dune".into(),
                author_id: Some(author.id()),
                summary: "s".into(),
                isbn: "i".into(),
                genre_ids: vec![],
            })
            .await
            .unwrap();

        match check_author(&store, author.id()).await.unwrap() {
            DeleteDecision::Blocked(books) => {
                assert_eq!(books.len(), 1);
                assert_eq!(books[0].title, "Dune");
            }
            DeleteDecision::Allowed => panic!("expected blocked"),
        }
    }

    #[tokio::test]
    async fn book_with_instances_is_blocked() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        let author = store
            .insert_author(&AuthorInput {
                first_name: "Frank".into(),
                family_name: "Herbert".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        let book = store
            .insert_book(&BookInput {
                title: "Dune".into(),
                author_id: Some(author.id()),
                summary: "s".into(),
                isbn: "i".into(),
                genre_ids: vec![],
            })
            .await
            .unwrap();

        store
            .insert_instance(&InstanceInput {
                book_id: Some(book.id()),
                imprint: "Ace, 1990".into(),
                status: LoanStatus::Available,
                due_back: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            check_book(&store, book.id()).await.unwrap(),
            DeleteDecision::Blocked(_)
        ));
    }
}

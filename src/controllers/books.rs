use axum::extract::{Path, RawForm, State};
use axum::response::{IntoResponse, Redirect, Response};
use futures::try_join;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::forms::{self, FormData};
use crate::guard::{self, DeleteDecision};
use crate::models::{BookInput, LoanStatus, RecordId};
use crate::view::{self, HomeCounts, Page};

/// Site home page: five catalog counts fetched as one fan-out group.
pub async fn index(State(state): State<AppState>) -> AppResult<Page> {
    let (books, instances, instances_available, authors, genres) = try_join!(
        state.store.count_books(),
        state.store.count_instances(),
        state.store.count_instances_by_status(LoanStatus::Available),
        state.store.count_authors(),
        state.store.count_genres(),
    )?;

    Ok(view::index(HomeCounts {
        books,
        instances,
        instances_available,
        authors,
        genres,
    }))
}

pub async fn list(State(state): State<AppState>) -> AppResult<Page> {
    let books = state.store.list_books().await?;
    Ok(view::book_list(&books))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Page> {
    let id = RecordId::new(id);
    let (book, instances) = try_join!(
        state.store.find_book(id),
        state.store.instances_of_book(id),
    )?;

    let book = book.ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

    let (author, genres) = try_join!(
        state.store.find_author(book.author_id),
        state.store.genres_of_book(id),
    )?;
    let author = author.ok_or_else(|| AppError::NotFound("Author not found".to_string()))?;

    Ok(view::book_detail(&book, &author, &genres, &instances))
}

pub async fn create_get(State(state): State<AppState>) -> AppResult<Page> {
    let (authors, genres) = try_join!(
        state.store.list_authors(),
        state.store.list_genres(),
    )?;

    Ok(view::book_form("Create Book", &authors, &genres, None, &[]))
}

pub async fn create_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let (input, errors) = forms::book_input(&form);

    if !errors.is_empty() {
        // Redisplay needs the selection lists again, with the submitted
        // author and genre choices preserved.
        let (authors, genres) = try_join!(
            state.store.list_authors(),
            state.store.list_genres(),
        )?;
        return Ok(
            view::book_form("Create Book", &authors, &genres, Some(&input), &errors)
                .into_response(),
        );
    }

    let book = state.store.insert_book(&input).await?;
    tracing::debug!("book {} created", book.id());
    Ok(Redirect::to(&book.url()).into_response())
}

pub async fn delete_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let id = RecordId::new(id);
    let (book, decision) = try_join!(
        state.store.find_book(id),
        guard::check_book(&state.store, id),
    )?;

    let Some(book) = book else {
        return Ok(Redirect::to("/catalog/books").into_response());
    };

    let instances = match decision {
        DeleteDecision::Blocked(instances) => instances,
        DeleteDecision::Allowed => Vec::new(),
    };
    Ok(view::book_delete(&book, &instances).into_response())
}

pub async fn delete_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let Some(id) = forms::body_id(&form, "bookid") else {
        return Err(AppError::BadRequest("Invalid book id".to_string()));
    };

    let (book, decision) = try_join!(
        state.store.find_book(id),
        guard::check_book(&state.store, id),
    )?;

    let Some(book) = book else {
        return Ok(Redirect::to("/catalog/books").into_response());
    };

    if let DeleteDecision::Blocked(instances) = decision {
        tracing::debug!("book {} has instances, delete blocked", id);
        return Ok(view::book_delete(&book, &instances).into_response());
    }

    if !state.store.delete_book_if_uninstanced(id).await? {
        if let DeleteDecision::Blocked(instances) = guard::check_book(&state.store, id).await? {
            return Ok(view::book_delete(&book, &instances).into_response());
        }
    }

    tracing::debug!("book {} deleted", id);
    Ok(Redirect::to("/catalog/books").into_response())
}

pub async fn update_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Page> {
    let id = RecordId::new(id);
    let (book, authors, genres) = try_join!(
        state.store.find_book(id),
        state.store.list_authors(),
        state.store.list_genres(),
    )?;

    let book = book.ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;
    let input = BookInput {
        title: book.title.clone(),
        author_id: Some(book.author_id),
        summary: book.summary.clone(),
        isbn: book.isbn.clone(),
        genre_ids: book.genre_ids.clone(),
    };

    Ok(view::book_form("Update Book", &authors, &genres, Some(&input), &[]))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let id = RecordId::new(id);
    let form = FormData::parse(&body);
    let (input, errors) = forms::book_input(&form);

    if !errors.is_empty() {
        let (authors, genres) = try_join!(
            state.store.list_authors(),
            state.store.list_genres(),
        )?;
        return Ok(
            view::book_form("Update Book", &authors, &genres, Some(&input), &errors)
                .into_response(),
        );
    }

    if !state.store.replace_book(id, &input).await? {
        return Err(AppError::NotFound("Book not found".to_string()));
    }

    Ok(Redirect::to(&format!("/catalog/book/{}", id)).into_response())
}

use axum::extract::{Path, RawForm, State};
use axum::response::{IntoResponse, Redirect, Response};
use futures::try_join;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::forms::{self, FormData};
use crate::guard::{self, DeleteDecision};
use crate::models::RecordId;
use crate::view::{self, Page};

pub async fn list(State(state): State<AppState>) -> AppResult<Page> {
    let authors = state.store.list_authors().await?;
    Ok(view::author_list(&authors))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Page> {
    let id = RecordId::new(id);
    let (author, books) = try_join!(
        state.store.find_author(id),
        state.store.books_by_author(id),
    )?;

    let author = author.ok_or_else(|| AppError::NotFound("No author found.".to_string()))?;
    Ok(view::author_detail(&author, &books))
}

pub async fn create_get() -> Page {
    view::author_create_form()
}

pub async fn create_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let (input, errors) = forms::author_input(&form);

    if !errors.is_empty() {
        return Ok(view::author_form_rejected("Create Author", &input, &errors).into_response());
    }

    let author = state.store.insert_author(&input).await?;
    Ok(Redirect::to(&author.url()).into_response())
}

pub async fn delete_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let id = RecordId::new(id);
    let (author, decision) = try_join!(
        state.store.find_author(id),
        guard::check_author(&state.store, id),
    )?;

    // Missing record on the confirm page redirects to the list, unlike
    // the detail page's 404.
    let Some(author) = author else {
        return Ok(Redirect::to("/catalog/authors").into_response());
    };

    let books = match decision {
        DeleteDecision::Blocked(books) => books,
        DeleteDecision::Allowed => Vec::new(),
    };
    Ok(view::author_delete(&author, &books).into_response())
}

pub async fn delete_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let Some(id) = forms::body_id(&form, "authorid") else {
        return Err(AppError::BadRequest("Invalid author id".to_string()));
    };

    let (author, decision) = try_join!(
        state.store.find_author(id),
        guard::check_author(&state.store, id),
    )?;

    let Some(author) = author else {
        return Ok(Redirect::to("/catalog/authors").into_response());
    };

    if let DeleteDecision::Blocked(books) = decision {
        return Ok(view::author_delete(&author, &books).into_response());
    }

    // The conditional delete re-checks the dependency atomically; losing
    // the race means a book appeared since the guard ran.
    if !state.store.delete_author_if_unreferenced(id).await? {
        if let DeleteDecision::Blocked(books) = guard::check_author(&state.store, id).await? {
            return Ok(view::author_delete(&author, &books).into_response());
        }
    }

    tracing::debug!("author {} deleted", id);
    Ok(Redirect::to("/catalog/authors").into_response())
}

pub async fn update_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Page> {
    let author = state
        .store
        .find_author(RecordId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("No author found.".to_string()))?;

    Ok(view::author_update_form(&author))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let id = RecordId::new(id);
    let form = FormData::parse(&body);
    let (input, errors) = forms::author_input(&form);

    if !errors.is_empty() {
        return Ok(view::author_form_rejected("Update Author", &input, &errors).into_response());
    }

    if !state.store.replace_author(id, &input).await? {
        return Err(AppError::NotFound("No author found.".to_string()));
    }

    Ok(Redirect::to(&format!("/catalog/author/{}", id)).into_response())
}

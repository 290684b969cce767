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
    let genres = state.store.list_genres().await?;
    Ok(view::genre_list(&genres))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Page> {
    let id = RecordId::new(id);
    let (genre, books) = try_join!(
        state.store.find_genre(id),
        state.store.books_by_genre(id),
    )?;

    let genre = genre.ok_or_else(|| AppError::NotFound("Genre not found".to_string()))?;
    Ok(view::genre_detail(&genre, &books))
}

pub async fn create_get() -> Page {
    view::genre_create_form()
}

/// Create with the silent merge: a name that already exists redirects to
/// the existing record instead of creating a duplicate, with no error
/// shown. The store's UNIQUE constraint backstops concurrent creates.
pub async fn create_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let (input, errors) = forms::genre_input(&form);

    if !errors.is_empty() {
        return Ok(view::genre_form_rejected("Create Genre", &input, &errors).into_response());
    }

    if let Some(existing) = state.store.find_genre_by_name(&input.name).await? {
        return Ok(Redirect::to(&existing.url()).into_response());
    }

    let genre = state.store.insert_genre(&input).await?;
    Ok(Redirect::to(&genre.url()).into_response())
}

pub async fn delete_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let id = RecordId::new(id);
    let (genre, decision) = try_join!(
        state.store.find_genre(id),
        guard::check_genre(&state.store, id),
    )?;

    let Some(genre) = genre else {
        return Ok(Redirect::to("/catalog/genres").into_response());
    };

    let books = match decision {
        DeleteDecision::Blocked(books) => books,
        DeleteDecision::Allowed => Vec::new(),
    };
    Ok(view::genre_delete(&genre, &books).into_response())
}

pub async fn delete_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let Some(id) = forms::body_id(&form, "genreid") else {
        return Err(AppError::BadRequest("Invalid genre id".to_string()));
    };

    let (genre, decision) = try_join!(
        state.store.find_genre(id),
        guard::check_genre(&state.store, id),
    )?;

    let Some(genre) = genre else {
        return Ok(Redirect::to("/catalog/genres").into_response());
    };

    if let DeleteDecision::Blocked(books) = decision {
        return Ok(view::genre_delete(&genre, &books).into_response());
    }

    if !state.store.delete_genre_if_unreferenced(id).await? {
        if let DeleteDecision::Blocked(books) = guard::check_genre(&state.store, id).await? {
            return Ok(view::genre_delete(&genre, &books).into_response());
        }
    }

    tracing::debug!("genre {} deleted", id);
    Ok(Redirect::to("/catalog/genres").into_response())
}

pub async fn update_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Page> {
    let genre = state
        .store
        .find_genre(RecordId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Genre not found".to_string()))?;

    Ok(view::genre_update_form(&genre))
}

/// Update does not re-run the uniqueness check; renaming onto an existing
/// name surfaces as a store failure through the UNIQUE constraint.
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let id = RecordId::new(id);
    let form = FormData::parse(&body);
    let (input, errors) = forms::genre_input(&form);

    if !errors.is_empty() {
        return Ok(view::genre_form_rejected("Update Genre", &input, &errors).into_response());
    }

    if !state.store.replace_genre(id, &input).await? {
        return Err(AppError::NotFound("Genre not found".to_string()));
    }

    Ok(Redirect::to(&format!("/catalog/genre/{}", id)).into_response())
}

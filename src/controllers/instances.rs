//! BookInstance workflows. The route family is reduced: there is no
//! update flow, and deletion is unguarded because instances have no
//! dependents.

use axum::extract::{Path, RawForm, State};
use axum::response::{IntoResponse, Redirect, Response};

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::forms::{self, FormData};
use crate::models::RecordId;
use crate::view::{self, Page};

pub async fn list(State(state): State<AppState>) -> AppResult<Page> {
    let instances = state.store.list_instances().await?;
    Ok(view::instance_list(&instances))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Page> {
    let instance = state
        .store
        .find_instance(RecordId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Book instance not found".to_string()))?;

    let book = state
        .store
        .find_book(instance.book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

    Ok(view::instance_detail(&instance, &book))
}

pub async fn create_get(State(state): State<AppState>) -> AppResult<Page> {
    let books = state.store.list_books().await?;
    Ok(view::instance_form("Create Book Instance", &books, None, &[]))
}

pub async fn create_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let (input, errors) = forms::instance_input(&form);

    if !errors.is_empty() {
        let books = state.store.list_books().await?;
        return Ok(
            view::instance_form("Create Book Instance", &books, Some(&input), &errors)
                .into_response(),
        );
    }

    let instance = state.store.insert_instance(&input).await?;
    Ok(Redirect::to(&instance.url()).into_response())
}

pub async fn delete_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let instance = state.store.find_instance(RecordId::new(id)).await?;

    let Some(instance) = instance else {
        return Ok(Redirect::to("/catalog/bookinstances").into_response());
    };

    Ok(view::instance_delete(&instance).into_response())
}

pub async fn delete_post(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> AppResult<Response> {
    let form = FormData::parse(&body);
    let Some(id) = forms::body_id(&form, "bookinstanceid") else {
        return Err(AppError::BadRequest("Invalid book instance id".to_string()));
    };

    state.store.delete_instance(id).await?;
    tracing::debug!("book instance {} deleted", id);
    Ok(Redirect::to("/catalog/bookinstances").into_response())
}

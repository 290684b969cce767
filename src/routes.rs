use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::controllers::{authors, books, genres, instances};

/// Catalog route table. Each literal `/create` route is registered ahead
/// of the `{id}` matcher so "create" is never read as an identity.
pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index))
        // book
        .route("/book/create", get(books::create_get).post(books::create_post))
        .route("/book/{id}/delete", get(books::delete_get).post(books::delete_post))
        .route("/book/{id}/update", get(books::update_get).post(books::update_post))
        .route("/book/{id}", get(books::detail))
        .route("/books", get(books::list))
        // author
        .route("/author/create", get(authors::create_get).post(authors::create_post))
        .route("/author/{id}/delete", get(authors::delete_get).post(authors::delete_post))
        .route("/author/{id}/update", get(authors::update_get).post(authors::update_post))
        .route("/author/{id}", get(authors::detail))
        .route("/authors", get(authors::list))
        // genre
        .route("/genre/create", get(genres::create_get).post(genres::create_post))
        .route("/genre/{id}/delete", get(genres::delete_get).post(genres::delete_post))
        .route("/genre/{id}/update", get(genres::update_get).post(genres::update_post))
        .route("/genre/{id}", get(genres::detail))
        .route("/genres", get(genres::list))
        // bookinstance (no update flow)
        .route("/bookinstance/create", get(instances::create_get).post(instances::create_post))
        .route(
            "/bookinstance/{id}/delete",
            get(instances::delete_get).post(instances::delete_post),
        )
        .route("/bookinstance/{id}", get(instances::detail))
        .route("/bookinstances", get(instances::list))
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to("/catalog") }))
        .nest("/catalog", catalog_router())
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

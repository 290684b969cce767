//! HTTP-level workflow tests: the router is driven end to end with
//! `tower::ServiceExt::oneshot` against a temp-file SQLite store.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use local_library::app_state::AppState;
use local_library::config::{Config, DatabaseConfig, ServerConfig};
use local_library::models::{AuthorInput, BookInput, LoanStatus, RecordId};
use local_library::routes;

async fn test_app() -> (TempDir, Router, AppState) {
    let dir = TempDir::new().unwrap();
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("catalog.db").display()
    );
    let config = Config {
        database: DatabaseConfig { url },
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0 },
    };
    let state = AppState::new(config).await.unwrap();
    let app = routes::build_app(state.clone());
    (dir, app, state)
}

async fn get(app: &Router, path: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::get(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Posts a urlencoded form; returns (status, redirect location, body).
async fn post_form(app: &Router, path: &str, form: &str) -> (StatusCode, Option<String>, String) {
    let request = Request::post(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, location, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn seed_author(state: &AppState, first: &str, family: &str) -> RecordId {
    state
        .store
        .insert_author(&AuthorInput {
            first_name: first.to_string(),
            family_name: family.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id()
}

async fn seed_book(state: &AppState, title: &str, author: RecordId) -> RecordId {
    state
        .store
        .insert_book(&BookInput {
            title: title.to_string(),
            author_id: Some(author),
            summary: "A book".to_string(),
            isbn: "123".to_string(),
            genre_ids: vec![],
        })
        .await
        .unwrap()
        .id()
}

#[tokio::test]
async fn create_book_then_fetch_detail() {
    let (_dir, app, state) = test_app().await;
    let author = seed_author(&state, "Frank", "Herbert").await;

    let form = format!(
        "title=Dune&author={}&summary=Desert+planet+epic&isbn=9780441013593",
        author
    );
    let (status, location, _) = post_form(&app, "/catalog/book/create", &form).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let location = location.unwrap();
    assert!(location.starts_with("/catalog/book/"));

    let (status, body) = get(&app, &location).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Dune"));
    assert!(body.contains("9780441013593"));

    // Empty genre submission stored as an empty list.
    let id: i64 = location.rsplit('/').next().unwrap().parse().unwrap();
    let book = state.store.find_book(RecordId::new(id)).await.unwrap().unwrap();
    assert!(book.genre_ids.is_empty());
}

#[tokio::test]
async fn missing_required_field_rejects_and_persists_nothing() {
    let (_dir, app, state) = test_app().await;
    let author = seed_author(&state, "Frank", "Herbert").await;

    let form = format!("title=&author={}&summary=s&isbn=i", author);
    let (status, location, body) = post_form(&app, "/catalog/book/create", &form).await;

    assert_eq!(status, StatusCode::OK);
    assert!(location.is_none());
    assert!(body.contains("Title must not be empty"));
    assert_eq!(state.store.count_books().await.unwrap(), 0);
}

#[tokio::test]
async fn rejected_form_redisplays_escaped_input() {
    let (_dir, app, state) = test_app().await;

    let (status, _, body) = post_form(
        &app,
        "/catalog/author/create",
        "first_name=%3Cscript%3E&family_name=Herbert",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("&lt;script&gt;"));
    assert!(!body.contains("<script>"));
    assert_eq!(state.store.count_authors().await.unwrap(), 0);
}

#[tokio::test]
async fn author_delete_blocked_while_books_reference_it() {
    let (_dir, app, state) = test_app().await;
    let author = seed_author(&state, "Frank", "Herbert").await;
    let book = seed_book(&state, "Dune", author).await;

    let path = format!("/catalog/author/{}/delete", author);
    let form = format!("authorid={}", author);

    // Blocked: the confirm page returns with the dependent list.
    let (status, location, body) = post_form(&app, &path, &form).await;
    assert_eq!(status, StatusCode::OK);
    assert!(location.is_none());
    assert!(body.contains("Dune"));
    assert!(state.store.find_author(author).await.unwrap().is_some());

    // Allowed once the dependent is gone.
    state.store.delete_book_if_uninstanced(book).await.unwrap();
    let (status, location, _) = post_form(&app, &path, &form).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/catalog/authors"));
    assert!(state.store.find_author(author).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_genre_create_redirects_to_existing_record() {
    let (_dir, app, state) = test_app().await;

    let (status, first_location, _) =
        post_form(&app, "/catalog/genre/create", "name=Fantasy").await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let (status, second_location, _) =
        post_form(&app, "/catalog/genre/create", "name=Fantasy").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(first_location, second_location);
    assert_eq!(state.store.count_genres().await.unwrap(), 1);
}

#[tokio::test]
async fn update_replaces_fields_but_not_identity() {
    let (_dir, app, state) = test_app().await;
    let author = seed_author(&state, "Frank", "Herbert").await;

    let path = format!("/catalog/author/{}/update", author);
    let (status, location, _) =
        post_form(&app, &path, "first_name=Brian&family_name=Herbert").await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some(format!("/catalog/author/{}", author).as_str()));

    let stored = state.store.find_author(author).await.unwrap().unwrap();
    assert_eq!(stored.id(), author);
    assert_eq!(stored.first_name, "Brian");
    assert_eq!(state.store.count_authors().await.unwrap(), 1);
}

#[tokio::test]
async fn instance_created_without_status_defaults_to_maintenance() {
    let (_dir, app, state) = test_app().await;
    let author = seed_author(&state, "Frank", "Herbert").await;
    let book = seed_book(&state, "Dune", author).await;

    let form = format!("book={}&imprint=Ace%2C+1990", book);
    let (status, location, _) = post_form(&app, "/catalog/bookinstance/create", &form).await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let id: i64 = location
        .unwrap()
        .rsplit('/')
        .next()
        .unwrap()
        .parse()
        .unwrap();
    let instance = state
        .store
        .find_instance(RecordId::new(id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(instance.status, LoanStatus::Maintenance);
}

#[tokio::test]
async fn detail_of_missing_record_is_404_but_delete_confirm_redirects() {
    let (_dir, app, _state) = test_app().await;

    let (status, _) = get(&app, "/catalog/author/42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The confirm page redirects to the list instead of returning 404.
    let response = app
        .clone()
        .oneshot(
            Request::get("/catalog/author/42/delete")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn create_route_is_not_parsed_as_an_identity() {
    let (_dir, app, _state) = test_app().await;

    let (status, body) = get(&app, "/catalog/book/create").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Create Book"));
}

#[tokio::test]
async fn book_form_redisplay_preserves_genre_selection() {
    let (_dir, app, state) = test_app().await;
    let author = seed_author(&state, "Frank", "Herbert").await;
    let genre = state
        .store
        .insert_genre(&local_library::models::GenreInput { name: "Fantasy".to_string() })
        .await
        .unwrap();

    // Missing title forces a redisplay; the chosen genre stays checked.
    let form = format!("title=&author={}&summary=s&isbn=i&genre={}", author, genre.id());
    let (status, _, body) = post_form(&app, "/catalog/book/create", &form).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("checked"));
    assert!(body.contains("Fantasy"));
}

#[tokio::test]
async fn home_page_reports_catalog_counts() {
    let (_dir, app, state) = test_app().await;
    let author = seed_author(&state, "Frank", "Herbert").await;
    seed_book(&state, "Dune", author).await;

    let (status, body) = get(&app, "/catalog").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Books: 1"));
    assert!(body.contains("Authors: 1"));
    assert!(body.contains("Genres: 0"));
}

// Local Library catalog server

use std::net::SocketAddr;
use tokio::net::TcpListener;

use local_library::{app_state::AppState, config::Config, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state (pool + schema)
    let app_state = AppState::new(config.clone()).await?;

    // Build application router
    let app = routes::build_app(app_state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    println!("🚀 Local Library starting on http://{}", addr);
    println!("📋 Catalog routes (book shown; author/genre/bookinstance follow the same shape):");
    println!("  GET  /catalog                       - Home page");
    println!("  GET  /catalog/books                 - Book list");
    println!("  GET  /catalog/book/create           - Create form");
    println!("  POST /catalog/book/create           - Create submit");
    println!("  GET  /catalog/book/{{id}}             - Detail");
    println!("  GET  /catalog/book/{{id}}/delete      - Delete confirm");
    println!("  POST /catalog/book/{{id}}/delete      - Delete submit");
    println!("  GET  /catalog/book/{{id}}/update      - Update form");
    println!("  POST /catalog/book/{{id}}/update      - Update submit");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

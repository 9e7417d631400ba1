use hireboard_api::{app, config, database};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = config::config();
    tracing::info!("Starting Hireboard API in {:?} mode", config.environment);

    let pool = match database::connect().await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let app = app(pool);

    // Allow tests or deployments to override port via env
    let port = std::env::var("HIREBOARD_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Hireboard API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

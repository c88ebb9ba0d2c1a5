use thunder_mock_server::MockState;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let api_key = std::env::var("THUNDER_API_KEY").unwrap_or_else(|_| "key".to_string());
    let api_secret = std::env::var("THUNDER_API_SECRET").unwrap_or_else(|_| "secret".to_string());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %api_key, "thunder mock server listening");
    thunder_mock_server::run(listener, MockState::new(&api_key, &api_secret)).await
}

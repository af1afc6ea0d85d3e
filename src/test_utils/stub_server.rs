//! Throwaway HTTP servers standing in for third-party APIs.

use axum::Router;
use url::Url;

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn spawn_stub_server(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub server");
    let addr = listener.local_addr().expect("stub server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server crashed");
    });
    Url::parse(&format!("http://{addr}/")).expect("stub server url")
}

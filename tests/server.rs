use stayhub::server::{ServerHandle, ServerOptions};
use stayhub::AppConfig;

#[tokio::test]
async fn server_starts_serves_and_shuts_down() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.server.api_host = "127.0.0.1".into();
    config.server.api_port = 0;
    config.server.shutdown_timeout = 2;
    config.database.url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("stayhub.db").display()
    );

    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: true,
    })
    .await
    .unwrap();
    assert!(handle.is_running());

    let url = format!("http://{}/health", handle.local_addr);
    let response = reqwest::get(&url).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["database"]["status"], "ok");

    let spec = reqwest::get(format!("http://{}/api-doc/openapi.json", handle.local_addr))
        .await
        .unwrap();
    assert_eq!(spec.status(), reqwest::StatusCode::OK);

    tokio::time::timeout(std::time::Duration::from_secs(5), handle.shutdown())
        .await
        .expect("shutdown within the drain timeout");
}

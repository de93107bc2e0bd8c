use axum::extract::State;
use storefront_api::{config::AppConfig, routes::health::health_check, state::AppState};

#[tokio::test]
async fn health_check_returns_ok() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state = AppState::open(AppConfig::for_data_dir(dir.path(), "test-secret")).await?;

    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert!(data.unreadable.is_empty());
    Ok(())
}

#[tokio::test]
async fn health_check_reports_malformed_collection() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let state = AppState::open(AppConfig::for_data_dir(dir.path(), "test-secret")).await?;
    std::fs::write(dir.path().join("orders.json"), "{ not json")?;

    let response = health_check(State(state)).await;
    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "degraded");
    assert_eq!(data.unreadable, vec!["orders".to_string()]);
    Ok(())
}

use scout_browser::{BrowserActions, BrowserEngine, Surface};
use scout_core::{BrowserConfig, RetryConfig};
use std::time::Duration;

async fn engine() -> BrowserEngine {
    let config = BrowserConfig {
        min_view_interval_ms: 0,
        ..BrowserConfig::default()
    };
    BrowserEngine::launch(&config, &RetryConfig::default())
        .await
        .expect("launch browser")
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_browser_engine_launch() {
    let config = BrowserConfig::default();
    let engine = BrowserEngine::launch(&config, &RetryConfig::default()).await;
    tokio_test::assert_ok!(engine, "Failed to launch browser engine");
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_open_view_and_read() {
    let engine = engine().await;
    let view = engine
        .open_view("https://example.com")
        .await
        .expect("open view");

    assert!(view
        .is_visible("h1", Duration::from_secs(5))
        .await
        .expect("visibility probe"));
    let heading = view.read_text("//h1").await.expect("read heading");
    assert_eq!(heading.as_deref(), Some("Example Domain"));

    let paragraphs = view.locate_all("p").await.expect("locate paragraphs");
    assert!(!paragraphs.is_empty());

    tokio_test::assert_ok!(view.close().await);
}

#[tokio::test]
#[ignore] // Requires Chrome/Chromium installed
async fn test_missing_selector_is_not_visible() {
    let engine = engine().await;
    let view = engine
        .open_view("https://example.com")
        .await
        .expect("open view");

    let visible = view
        .is_visible("#does-not-exist", Duration::from_millis(300))
        .await
        .expect("visibility probe");
    assert!(!visible);
    assert!(view.read_all_text("#does-not-exist").await.unwrap().is_empty());

    tokio_test::assert_ok!(view.close().await);
}

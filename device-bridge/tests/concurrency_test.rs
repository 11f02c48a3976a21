mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{dispatcher, MockDriver};
use tempfile::TempDir;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_device_calls_never_overlap() {
    let scratch = TempDir::new().unwrap();
    let driver = Arc::new(MockDriver {
        action_delay: Duration::from_millis(20),
        ..Default::default()
    });
    let commands = Arc::new(dispatcher(driver.clone(), scratch.path(), Duration::from_secs(60)));

    let mut requests = JoinSet::new();
    for i in 0..8 {
        let commands = commands.clone();
        requests.spawn(async move {
            if i % 2 == 0 {
                commands.click(i, i).await
            } else {
                commands.press_key_code(i, 0).await
            }
        });
    }

    while let Some(result) = requests.join_next().await {
        assert!(result.unwrap().unwrap().is_ok());
    }

    assert_eq!(driver.calls(), 8);
    assert_eq!(driver.completed(), 8);
    assert_eq!(driver.max_in_flight(), 1);
}

#[tokio::test]
async fn test_abandoned_request_still_completes() {
    let scratch = TempDir::new().unwrap();
    let driver = Arc::new(MockDriver {
        action_delay: Duration::from_millis(50),
        ..Default::default()
    });
    let commands = dispatcher(driver.clone(), scratch.path(), Duration::from_secs(60));

    let abandoned = tokio::time::timeout(Duration::from_millis(5), commands.click(1, 1)).await;
    assert!(abandoned.is_err());

    // The next caller queues behind the abandoned click
    let response = commands.click(2, 2).await.unwrap();
    assert!(response.is_ok());
    assert_eq!(driver.completed(), 2);
    assert_eq!(driver.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bounded_wait_releases_the_device() {
    let scratch = TempDir::new().unwrap();
    let driver = Arc::new(MockDriver {
        idle_delay: Duration::from_secs(3600),
        ..Default::default()
    });
    let commands = dispatcher(driver.clone(), scratch.path(), Duration::from_secs(60));

    assert!(commands.wait_for_idle(100).await.unwrap().is_ok());
    tokio_test::assert_ok!(commands.click(5, 5).await);
    assert_eq!(driver.calls(), 2);
}

use crate::support::{
    create_test_config, mount_archive, mount_detail, mount_listing, WhitespaceSegmenter,
    LISTING_PATH,
};
use aozora_collector::crawler::Coordinator;
use aozora_collector::output::{format_outcome_line, format_summary_line};
use aozora_collector::storage::{RunStatus, SqliteStorage, Storage};
use aozora_collector::{CollectorError, EntryState};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_coordinator(server: &MockServer, dir: &TempDir, workers: u32) -> Coordinator {
    let db_path = dir.path().join("database.sqlite");
    let config = create_test_config(server, &db_path, workers);
    let storage = SqliteStorage::new(&db_path).expect("Failed to open DB");
    Coordinator::with_storage(config, storage, Arc::new(WhitespaceSegmenter), "test-hash")
        .expect("Failed to create coordinator")
}

#[tokio::test]
async fn test_listing_with_one_unpublished_work() {
    let server = MockServer::start().await;
    mount_listing(
        &server,
        "1",
        &[("10", "春の海"), ("20", "準備中の作品"), ("30", "秋の山")],
    )
    .await;
    mount_detail(&server, "1", "10", "作者一", Some("./files/10.zip")).await;
    mount_detail(&server, "1", "20", "作者一", None).await;
    mount_detail(&server, "1", "30", "作者一", Some("./files/30.zip")).await;
    mount_archive(&server, "1", "10", "春 の 海 ひねもす").await;
    mount_archive(&server, "1", "30", "秋 の 山 もみじ").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&server, &dir, 4);
    let summary = coordinator
        .run(CancellationToken::new())
        .await
        .expect("Collection failed");

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.indexed(), 2);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.failed(), 0);
    assert!(!summary.interrupted);
    assert_eq!(
        format_summary_line(&summary),
        "discovered 3, indexed 2, skipped 1, failed 0"
    );

    let skipped: Vec<String> = summary
        .outcomes
        .iter()
        .filter_map(format_outcome_line)
        .collect();
    assert_eq!(
        skipped,
        vec!["skipped 1/20 \"準備中の作品\": no archive link on detail page".to_string()]
    );

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_contents().unwrap(), 2);
    assert_eq!(storage.count_search_entries().unwrap(), 2);
    assert!(storage.get_content("1", "20").unwrap().is_none());

    let author = storage.get_author("1").unwrap().unwrap();
    assert_eq!(author.author, "作者一");

    let hits = storage.search("の").unwrap();
    let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
    assert_eq!(titles, vec!["春の海", "秋の山"]);

    let hits = storage.search("海 AND ひねもす").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title_id, "10");

    let run = storage.get_run(summary.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.counts, summary.counts());
    assert_eq!(storage.get_outcomes(summary.run_id).unwrap().len(), 3);
}

#[tokio::test]
async fn test_entry_failures_do_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &[("10", "壊れた作品"), ("20", "消えた作品"), ("30", "無事な作品")])
        .await;
    mount_detail(&server, "1", "10", "作者", Some("./files/10.zip")).await;
    // No detail page for 20: the mock server answers 404
    mount_detail(&server, "1", "30", "作者", Some("./files/30.zip")).await;
    Mock::given(method("GET"))
        .and(path("/cards/1/files/10.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not a zip".to_vec()))
        .mount(&server)
        .await;
    mount_archive(&server, "1", "30", "無事 に 届いた").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&server, &dir, 2);
    let summary = coordinator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(summary.indexed(), 1);
    assert_eq!(summary.failed(), 2);

    let mut reasons: Vec<(String, String)> = summary
        .outcomes
        .iter()
        .filter(|o| o.state == EntryState::Failed)
        .map(|o| (o.entry.title_id.clone(), o.reason.clone().unwrap_or_default()))
        .collect();
    reasons.sort();
    assert!(reasons[0].1.starts_with("archive:"), "{:?}", reasons);
    assert!(reasons[1].1.contains("HTTP 404"), "{:?}", reasons);

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_contents().unwrap(), 1);
    assert_eq!(
        storage.get_run(summary.run_id).unwrap().status,
        RunStatus::Completed
    );
}

#[tokio::test]
async fn test_listing_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&server, &dir, 4);
    let result = coordinator.run(CancellationToken::new()).await;

    assert!(matches!(
        result,
        Err(CollectorError::FetchFailed {
            status: Some(500),
            ..
        })
    ));

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(storage.count_contents().unwrap(), 0);
}

#[tokio::test]
async fn test_recollecting_replaces_indexed_text() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &[("10", "春の海")]).await;
    mount_detail(&server, "1", "10", "作者", Some("./files/10.zip")).await;
    mount_archive(&server, "1", "10", "古い 本文").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&server, &dir, 4);
    let first = coordinator.run(CancellationToken::new()).await.unwrap();
    assert_eq!(first.indexed(), 1);

    server.reset().await;
    mount_listing(&server, "1", &[("10", "春の海")]).await;
    mount_detail(&server, "1", "10", "改名した作者", Some("./files/10.zip")).await;
    mount_archive(&server, "1", "10", "新しい 本文").await;

    let second = coordinator.run(CancellationToken::new()).await.unwrap();
    assert_eq!(second.indexed(), 1);
    assert_eq!(
        first.outcomes[0].document_id,
        second.outcomes[0].document_id
    );

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_contents().unwrap(), 1);
    assert_eq!(storage.count_search_entries().unwrap(), 1);
    assert_eq!(storage.count_orphaned_search_entries().unwrap(), 0);
    assert!(storage.search("古い").unwrap().is_empty());
    assert_eq!(storage.search("新しい").unwrap().len(), 1);
    assert_eq!(storage.search("本文").unwrap()[0].author, "改名した作者");
}

#[tokio::test]
async fn test_cancelled_run_dispatches_nothing() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &[("10", "一"), ("20", "二"), ("30", "三")]).await;
    Mock::given(method("GET"))
        .and(path("/cards/1/card10.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&server, &dir, 1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = coordinator.run(cancel).await.unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.not_dispatched, 3);
    assert!(summary.outcomes.is_empty());

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(
        storage.get_run(summary.run_id).unwrap().status,
        RunStatus::Interrupted
    );
}

#[tokio::test]
async fn test_single_worker_keeps_last_author_name() {
    let server = MockServer::start().await;
    mount_listing(&server, "1", &[("10", "前編"), ("20", "後編")]).await;
    mount_detail(&server, "1", "10", "旧名", Some("./files/10.zip")).await;
    mount_detail(&server, "1", "20", "新名", Some("./files/20.zip")).await;
    mount_archive(&server, "1", "10", "前編 の 本文").await;
    mount_archive(&server, "1", "20", "後編 の 本文").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(&server, &dir, 1);
    let summary = coordinator.run(CancellationToken::new()).await.unwrap();
    assert_eq!(summary.indexed(), 2);

    let storage = coordinator.storage();
    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_authors().unwrap(), 1);
    assert_eq!(storage.get_author("1").unwrap().unwrap().author, "新名");
}

#[tokio::test]
async fn test_coordinator_opens_configured_database() {
    let server = MockServer::start().await;
    mount_listing(&server, "2", &[("5", "題")]).await;
    mount_detail(&server, "2", "5", "作者", Some("./files/5.zip")).await;
    mount_archive(&server, "2", "5", "本文").await;

    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("database.sqlite");
    let config = create_test_config(&server, &db_path, 2);

    let coordinator = Coordinator::new(config, "hash", Arc::new(WhitespaceSegmenter)).unwrap();
    let summary = coordinator.run(CancellationToken::new()).await.unwrap();
    assert_eq!(summary.indexed(), 1);
    drop(coordinator);

    let storage = SqliteStorage::new(&db_path).unwrap();
    assert_eq!(storage.search("本文").unwrap().len(), 1);
}

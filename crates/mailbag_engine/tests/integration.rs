//! End-to-end tests for the collection and delivery pipeline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mailbag_engine::{
    md5_hex, Collector, CollectorConfig, ConfigOverlay, DispatchReport, Dispatcher,
    MemoryDeliverer, MemoryFetcher, PayloadEncoding, Recipient,
};
use mailbag_session::{Item, LinkMode, Session};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn date(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn keys(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| (*k).to_string()).collect()
}

fn recipient() -> Recipient {
    "ghost@example.com".parse().unwrap()
}

/// A sendable PDF attachment whose declared digest matches `bytes`.
fn pdf_attachment(key: &str, parent: &str, added: &str, bytes: &[u8]) -> Item {
    Item::attachment(key)
        .with_parent(parent)
        .with_link_mode(LinkMode::ImportedFile)
        .with_content_type("application/pdf")
        .with_filename(format!("{key}.pdf"))
        .with_md5(md5_hex(bytes))
        .with_date_added(date(added))
}

#[tokio::test]
async fn newest_of_several_candidates_is_sent() {
    init_tracing();

    let older = pdf_attachment("ATTACH01", "PARENT01", "2020-01-01T00:00:00Z", b"alpha");
    let newer = pdf_attachment("ATTACH02", "PARENT01", "2021-01-01T00:00:00Z", b"beta");
    let parent =
        Item::new("PARENT01", "book").with_children(vec![older.clone(), newer.clone()]);
    let session = Session::new("session-1")
        .with_item(parent)
        .with_item(older)
        .with_item(newer);

    let fetcher = MemoryFetcher::new();
    fetcher.insert("ATTACH01", b"alpha".to_vec());
    fetcher.insert("ATTACH02", b"beta".to_vec());

    let collector = Collector::new(CollectorConfig::default(), session, fetcher);
    let payloads = collector.collect(&keys(&["PARENT01"])).await;

    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].filename, "ATTACH02.pdf");
    assert_eq!(payloads[0].content_type, "application/pdf");
    assert_eq!(payloads[0].content, PayloadEncoding::Base64.encode(b"beta"));
    assert_eq!(payloads[0].encoding, PayloadEncoding::Base64);
}

#[tokio::test]
async fn child_and_parent_keys_yield_one_payload_and_one_fetch() {
    init_tracing();

    let child = pdf_attachment("ATTACH01", "PARENT01", "2020-01-01T00:00:00Z", b"alpha");
    let parent = Item::new("PARENT01", "book").with_children(vec![child.clone()]);
    let session = Arc::new(
        Session::new("session-1")
            .with_item(parent)
            .with_item(child),
    );

    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert("ATTACH01", b"alpha".to_vec());

    let collector = Collector::from_shared(
        CollectorConfig::default(),
        Arc::clone(&session),
        Arc::clone(&fetcher),
    );
    let payloads = collector.collect(&keys(&["ATTACH01", "PARENT01"])).await;

    assert_eq!(payloads.len(), 1);
    assert_eq!(fetcher.fetch_count("ATTACH01"), 1);
}

#[tokio::test]
async fn corrupt_content_yields_no_payload_but_the_batch_completes() {
    init_tracing();

    // The declared digest belongs to different bytes than the store holds.
    let corrupt = pdf_attachment("ATTACH01", "PARENT01", "2020-01-01T00:00:00Z", b"original");
    let parent_a = Item::new("PARENT01", "book").with_children(vec![corrupt]);
    let good = pdf_attachment("ATTACH02", "PARENT02", "2020-01-01T00:00:00Z", b"intact");
    let parent_b = Item::new("PARENT02", "book").with_children(vec![good]);

    let session = Session::new("session-1")
        .with_item(parent_a)
        .with_item(parent_b);

    let fetcher = MemoryFetcher::new();
    fetcher.insert("ATTACH01", b"tampered".to_vec());
    fetcher.insert("ATTACH02", b"intact".to_vec());

    let collector = Collector::new(CollectorConfig::default(), session, fetcher);
    let payloads = collector.collect(&keys(&["PARENT01", "PARENT02"])).await;

    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].filename, "ATTACH02.pdf");

    let stats = collector.stats();
    assert_eq!(stats.failed, 1);
    assert!(stats
        .last_error
        .as_deref()
        .unwrap()
        .starts_with("checksum mismatch for attachment ATTACH01"));
}

#[tokio::test]
async fn item_without_children_yields_no_payload() {
    init_tracing();

    let session = Session::new("session-1").with_item(Item::new("PARENT01", "book"));
    let collector = Collector::new(CollectorConfig::default(), session, MemoryFetcher::new());

    let payloads = collector.collect(&keys(&["PARENT01"])).await;

    assert!(payloads.is_empty());
    assert_eq!(collector.stats().skipped_no_children, 1);
}

#[tokio::test]
async fn payload_order_follows_input_order() {
    let mut session = Session::new("session-1");
    let fetcher = MemoryFetcher::new();
    for (n, bytes) in [b"aa".as_slice(), b"bb".as_slice(), b"cc".as_slice()]
        .into_iter()
        .enumerate()
    {
        let parent_key = format!("PARENT0{n}");
        let child_key = format!("ATTACH0{n}");
        let child = pdf_attachment(&child_key, &parent_key, "2020-01-01T00:00:00Z", bytes);
        session.insert(Item::new(parent_key, "book").with_children(vec![child]));
        fetcher.insert(child_key, bytes.to_vec());
    }

    let collector = Collector::new(CollectorConfig::default(), session, fetcher);
    let payloads = collector
        .collect(&keys(&["PARENT02", "PARENT00", "PARENT01"]))
        .await;

    let filenames: Vec<&str> = payloads.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(filenames, ["ATTACH02.pdf", "ATTACH00.pdf", "ATTACH01.pdf"]);
}

#[tokio::test]
async fn one_failed_key_leaves_the_others_standing() {
    init_tracing();

    let good_a = pdf_attachment("ATTACHA1", "PARENTA1", "2020-01-01T00:00:00Z", b"alpha");
    let parent_a = Item::new("PARENTA1", "book").with_children(vec![good_a]);
    let bad = pdf_attachment("ATTACHB1", "PARENTB1", "2020-01-01T00:00:00Z", b"beta");
    let parent_b = Item::new("PARENTB1", "book").with_children(vec![bad]);
    let good_c = pdf_attachment("ATTACHC1", "PARENTC1", "2020-01-01T00:00:00Z", b"gamma");
    let parent_c = Item::new("PARENTC1", "book").with_children(vec![good_c]);

    let session = Session::new("session-1")
        .with_item(parent_a)
        .with_item(parent_b)
        .with_item(parent_c);

    let fetcher = MemoryFetcher::new();
    fetcher.insert("ATTACHA1", b"alpha".to_vec());
    fetcher.fail_with("ATTACHB1", "store offline");
    fetcher.insert("ATTACHC1", b"gamma".to_vec());

    let collector = Collector::new(CollectorConfig::default(), session, fetcher);
    let payloads = collector
        .collect(&keys(&["PARENTA1", "PARENTB1", "PARENTC1"]))
        .await;

    let filenames: Vec<&str> = payloads.iter().map(|p| p.filename.as_str()).collect();
    assert_eq!(filenames, ["ATTACHA1.pdf", "ATTACHC1.pdf"]);
}

#[tokio::test]
async fn parent_cycles_never_hang_a_batch() {
    let session = Session::new("session-1")
        .with_item(Item::new("AAAA0001", "note").with_parent("BBBB0001"))
        .with_item(Item::new("BBBB0001", "note").with_parent("AAAA0001"));

    let collector = Collector::new(CollectorConfig::default(), session, MemoryFetcher::new());
    let payloads = collector.collect(&keys(&["AAAA0001", "BBBB0001"])).await;

    assert!(payloads.is_empty());
    assert_eq!(collector.stats().skipped_missing, 2);
}

#[tokio::test]
async fn separate_batches_share_no_duplicate_state() {
    let child = pdf_attachment("ATTACH01", "PARENT01", "2020-01-01T00:00:00Z", b"alpha");
    let parent = Item::new("PARENT01", "book").with_children(vec![child]);
    let session = Arc::new(Session::new("session-1").with_item(parent));

    let fetcher = Arc::new(MemoryFetcher::new());
    fetcher.insert("ATTACH01", b"alpha".to_vec());

    let collector = Collector::from_shared(
        CollectorConfig::default(),
        session,
        Arc::clone(&fetcher),
    );

    assert_eq!(collector.collect(&keys(&["PARENT01"])).await.len(), 1);
    assert_eq!(collector.collect(&keys(&["PARENT01"])).await.len(), 1);
    assert_eq!(fetcher.fetch_count("ATTACH01"), 2);
}

#[tokio::test]
async fn layered_config_widens_selection() {
    let epub = Item::attachment("EPUB0001")
        .with_parent("PARENT01")
        .with_link_mode(LinkMode::ImportedFile)
        .with_content_type("application/epub+zip")
        .with_filename("novel.epub")
        .with_md5(md5_hex(b"epub bytes"))
        .with_date_added(date("2020-01-01T00:00:00Z"));
    let parent = Item::new("PARENT01", "book").with_children(vec![epub]);
    let session = Session::new("session-1").with_item(parent);

    let fetcher = MemoryFetcher::new();
    fetcher.insert("EPUB0001", b"epub bytes".to_vec());

    let overlay: ConfigOverlay = serde_json::from_str(
        r#"{"mimetypes": ["application/pdf", "application/epub+zip"]}"#,
    )
    .unwrap();
    let config = CollectorConfig::layered(Some(overlay), None);

    let collector = Collector::new(config, session, fetcher);
    let payloads = collector.collect(&keys(&["PARENT01"])).await;

    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].filename, "novel.epub");
}

#[tokio::test]
async fn dispatcher_sends_everything_the_session_changed() {
    init_tracing();

    let child_a = pdf_attachment("ATTACHA1", "PARENTA1", "2020-01-01T00:00:00Z", b"alpha");
    let parent_a = Item::new("PARENTA1", "book").with_children(vec![child_a.clone()]);
    let child_b = pdf_attachment("ATTACHB1", "PARENTB1", "2020-01-01T00:00:00Z", b"beta");
    let parent_b = Item::new("PARENTB1", "book").with_children(vec![child_b]);

    let mut session = Session::new("session-1")
        .with_item(parent_a)
        .with_item(child_a)
        .with_item(parent_b);
    // The created child resolves to the first parent; the updated keys
    // repeat it, which dedup absorbs.
    session.mark_created("ATTACHA1");
    session.mark_updated("PARENTA1");
    session.mark_updated("PARENTB1");

    let fetcher = MemoryFetcher::new();
    fetcher.insert("ATTACHA1", b"alpha".to_vec());
    fetcher.insert("ATTACHB1", b"beta".to_vec());

    let deliverer = Arc::new(MemoryDeliverer::new());
    let dispatcher = Dispatcher::from_shared(
        CollectorConfig::default(),
        recipient(),
        Arc::new(session),
        Arc::new(fetcher),
        Arc::clone(&deliverer),
    );

    let report = dispatcher.process().await.unwrap();

    assert_eq!(report, DispatchReport { collected: 2, delivered: 2 });
    let sent = deliverer.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].0, "ghost@example.com");
    assert_eq!(sent[0].1.filename, "ATTACHA1.pdf");
    assert_eq!(sent[1].1.filename, "ATTACHB1.pdf");
}

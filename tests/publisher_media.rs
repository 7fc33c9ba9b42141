// tests/publisher_media.rs
mod common;

use common::*;
use headline_bot::publish::{dry_run::DryRunPoster, x::XClient, Publisher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::test]
async fn upload_then_post_with_media_id() {
    let poster = FakePoster::ok();
    let publisher = Publisher::new(poster.clone(), 5);

    let res = publisher.publish("Storm update", Some(&png())).await;

    assert!(res.success);
    assert!(res.media_attached);
    assert_eq!(res.post_id.as_deref(), Some("post-1"));
    assert_eq!(
        poster.sent(),
        vec![SentPost {
            text: "Storm update".into(),
            media_id: Some("media-1".into())
        }]
    );
}

#[tokio::test]
async fn upload_failure_degrades_to_text_only() {
    let poster = Arc::new(FakePoster {
        fail_upload: true,
        ..Default::default()
    });
    let publisher = Publisher::new(poster.clone(), 5);

    let res = publisher.publish("Storm update", Some(&png())).await;

    assert!(res.success);
    assert!(!res.media_attached);
    assert_eq!(poster.uploads.load(Ordering::SeqCst), 1);
    assert_eq!(poster.sent()[0].media_id, None);
}

#[tokio::test]
async fn rejected_post_reports_reason() {
    let poster = Arc::new(FakePoster {
        fail_submit: true,
        ..Default::default()
    });
    let publisher = Publisher::new(poster.clone(), 5);

    let res = publisher.publish("Storm update", None).await;

    assert!(!res.success);
    assert!(res.post_id.is_none());
    let reason = res.error_reason.unwrap();
    assert!(reason.contains("403"), "{reason}");
    assert!(poster.sent().is_empty());
}

#[tokio::test]
async fn dry_run_poster_always_succeeds() {
    let publisher = Publisher::new(Arc::new(DryRunPoster::new()), 5);
    assert_eq!(publisher.client_name(), "dry-run");

    let res = publisher.publish("hello", Some(&png())).await;
    assert!(res.success);
    assert!(res.media_attached);
    assert!(res.post_id.unwrap().starts_with("dry-post-"));
}

#[tokio::test]
async fn x_client_runs_every_retry_inside_the_publish_bound() {
    // accepts connections and never answers, so every attempt times out
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(sock);
        }
    });

    let x = XClient::new("token".into())
        .with_base_url(format!("http://{addr}"))
        .with_timeout(1)
        .with_retries(3);
    let deadline = x.deadline_secs();
    let publisher = Publisher::new(Arc::new(x), deadline);

    let res = publisher.publish("hello", None).await;

    assert!(!res.success);
    assert_eq!(accepted.load(Ordering::SeqCst), 3, "all configured attempts ran");
    let reason = res.error_reason.unwrap();
    assert!(reason.contains("request failed"), "{reason}");
    assert!(!reason.contains("timed out after"), "outer bound fired: {reason}");
}

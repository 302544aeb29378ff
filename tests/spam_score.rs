//! Spam score probe tests against a mock report page

mod common;

use common::*;
use mail_health_exporter::{
    executor::{RoundTripProbe, Scheduler, SpamScoreProbe},
    models::{Counter, Gauge},
    store::MetricsStore,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REPORT_PAGE: &str = r#"<html><body>
    <div id="total"><h2>Your lovely total: <span>7.5</span>/10</h2></div>
</body></html>"#;

async fn report_server(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-abc"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

fn probe(report_url: &str, mail: Arc<InMemoryMail>, store: Arc<MetricsStore>) -> SpamScoreProbe {
    let config = config_with(PASSWORD, PASSWORD, report_url);
    SpamScoreProbe::new(&config, mail, store).unwrap()
}

#[tokio::test]
async fn test_score_recorded_from_report() {
    let server = report_server(200, REPORT_PAGE).await;
    let mail = Arc::new(InMemoryMail::new());
    let store = Arc::new(MetricsStore::with_start_time(1.0));
    let probe = probe(&format!("{}/test-abc", server.uri()), mail.clone(), store.clone());

    let score = probe.run().await;

    assert_eq!(score, 7);
    assert_eq!(mail.stored(INTAKE_ADDRESS), 1);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.gauge(Gauge::SpamScore), 7.0);
    assert!(snapshot.gauge(Gauge::LastSpamScoreCheckTimestamp) > 1.0);
    assert_eq!(snapshot.counter(Counter::SendInternalToExternalSuccess), 1);
}

#[tokio::test]
async fn test_missing_phrase_scores_zero() {
    let server = report_server(200, "<html><body>Waiting for your email...</body></html>").await;
    let store = Arc::new(MetricsStore::new());
    let probe = probe(&format!("{}/test-abc", server.uri()), Arc::new(InMemoryMail::new()), store.clone());

    store.record_spam_score(9, 1.0);
    assert_eq!(probe.run().await, 0);
    assert_eq!(store.snapshot().gauge(Gauge::SpamScore), 0.0);
}

#[tokio::test]
async fn test_server_error_scores_zero() {
    let server = report_server(500, REPORT_PAGE).await;
    let probe = probe(
        &format!("{}/test-abc", server.uri()),
        Arc::new(InMemoryMail::new()),
        Arc::new(MetricsStore::new()),
    );

    assert_eq!(probe.extract_score(&format!("{}/test-abc", server.uri())).await, 0);
}

#[tokio::test]
async fn test_unreachable_report_scores_zero() {
    let probe = probe("http://127.0.0.1:9/test-abc", Arc::new(InMemoryMail::new()), Arc::new(MetricsStore::new()));
    assert_eq!(probe.extract_score("http://127.0.0.1:9/test-abc").await, 0);
}

#[tokio::test]
async fn test_spam_check_rate_limited_to_six_hours() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test-abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(REPORT_PAGE))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_with(PASSWORD, PASSWORD, &format!("{}/test-abc", server.uri()));
    let mail = Arc::new(InMemoryMail::new());
    let store = Arc::new(MetricsStore::new());
    let roundtrip = RoundTripProbe::new(&config, mail.clone(), store.clone());
    let spam_score = SpamScoreProbe::new(&config, mail.clone(), store.clone()).unwrap();
    let mut scheduler = Scheduler::new(roundtrip, spam_score, config.check_interval());

    let start = Instant::now();
    assert_eq!(scheduler.spam_check_at(start).await, Some(7));
    assert_eq!(scheduler.spam_check_at(start + Duration::from_secs(60 * 60)).await, None);
    assert_eq!(mail.stored(INTAKE_ADDRESS), 1);

    let after_window = start + Duration::from_secs(6 * 60 * 60);
    assert_eq!(scheduler.spam_check_at(after_window).await, Some(7));
    assert_eq!(mail.stored(INTAKE_ADDRESS), 2);
    assert_eq!(mail.submits(), 2);
    // MockServer verifies the two expected fetches on drop
}

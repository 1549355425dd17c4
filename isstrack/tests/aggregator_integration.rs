//! Integration tests for the tracking pipeline.
//!
//! These tests drive the HTTP-backed sources end to end:
//! - provider JSON → Aggregator → Snapshot
//! - Snapshot → ViewSync → camera instructions
//! - stop() voiding in-flight responses
//!
//! Time is paused, so the 5s poll cadence runs instantly.
//!
//! Run with: `cargo test --test aggregator_integration`

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use isstrack::aggregator::{Aggregator, AggregatorConfig, Sources};
use isstrack::config::EndpointConfig;
use isstrack::coord::Coordinate;
use isstrack::provider::{AsyncHttpClient, BoxFuture, SourceError};
use isstrack::snapshot::{FaultSeverity, PassStatus, PositionStatus, Snapshot, SourceKind};
use isstrack::view_sync::{CameraDriver, CameraInstruction, ViewSync, ViewSyncConfig};

// ============================================================================
// Helper Functions
// ============================================================================

const POSITION_BASE: &str = "http://position.test/v1/satellites";
const GEOCODE_BASE: &str = "http://geocode.test/reverse";
const PASS_BASE: &str = "http://pass.test/json/";

/// One scripted HTTP reply.
#[derive(Clone)]
struct Reply {
    delay: Duration,
    body: Result<String, SourceError>,
}

impl Reply {
    fn ok(body: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            body: Ok(body.to_string()),
        }
    }

    fn after(delay: Duration, body: &str) -> Self {
        Self {
            delay,
            body: Ok(body.to_string()),
        }
    }

    fn unavailable() -> Self {
        Self {
            delay: Duration::ZERO,
            body: Err(SourceError::UpstreamUnavailable("HTTP 503".to_string())),
        }
    }
}

/// Routes requests by URL prefix to a queue of replies; the last reply repeats.
#[derive(Default)]
struct RoutingHttp {
    routes: Mutex<HashMap<&'static str, Vec<Reply>>>,
    requests: Mutex<Vec<String>>,
}

impl RoutingHttp {
    fn route(self, prefix: &'static str, replies: Vec<Reply>) -> Self {
        self.routes.lock().insert(prefix, replies);
        self
    }

    fn requests_to(&self, prefix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|url| url.starts_with(prefix))
            .count()
    }
}

impl AsyncHttpClient for RoutingHttp {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, SourceError>> {
        self.requests.lock().push(url.to_string());
        let reply = {
            let mut routes = self.routes.lock();
            routes
                .iter_mut()
                .find(|(prefix, _)| url.starts_with(**prefix))
                .map(|(_, replies)| {
                    if replies.len() > 1 {
                        replies.remove(0)
                    } else {
                        replies[0].clone()
                    }
                })
        };

        Box::pin(async move {
            let reply = reply
                .ok_or_else(|| SourceError::UpstreamUnavailable(format!("no route for {}", url)))?;
            tokio::time::sleep(reply.delay).await;
            reply.body.map(String::into_bytes)
        })
    }
}

fn position_body(lat: f64, lng: f64) -> String {
    format!(
        r#"{{"name":"iss","id":25544,"latitude":{},"longitude":{},"timestamp":1700000000}}"#,
        lat, lng
    )
}

const NEW_YORK_BODY: &str =
    r#"{"address": {"city": "New York", "state": "NY", "country": "USA"}}"#;
const ONE_PASS_BODY: &str = r#"{"message":"success","response":[{"risetime":1700000000,"duration":300}]}"#;
const NO_PASS_BODY: &str = r#"{"message":"success","response":[]}"#;

fn endpoints() -> EndpointConfig {
    EndpointConfig {
        position_url: POSITION_BASE.to_string(),
        satellite_id: 25544,
        geocode_url: GEOCODE_BASE.to_string(),
        pass_url: PASS_BASE.to_string(),
    }
}

fn new_york() -> Coordinate {
    Coordinate::new(40.7128, -74.0060).unwrap()
}

#[derive(Default)]
struct RecordingCamera {
    instructions: Mutex<Vec<CameraInstruction>>,
}

impl CameraDriver for RecordingCamera {
    fn fly_to(&self, instruction: CameraInstruction) {
        self.instructions.lock().push(instruction);
    }
}

struct Pipeline {
    http: Arc<RoutingHttp>,
    camera: Arc<RecordingCamera>,
    published: Arc<Mutex<Vec<Arc<Snapshot>>>>,
    aggregator: Aggregator,
}

fn pipeline(http: RoutingHttp) -> Pipeline {
    let http = Arc::new(http);
    let camera = Arc::new(RecordingCamera::default());
    let published = Arc::new(Mutex::new(Vec::new()));

    let view = Arc::new(ViewSync::new(camera.clone(), ViewSyncConfig::default()));
    let log = Arc::clone(&published);
    let aggregator = Aggregator::new(
        Sources::from_endpoints(http.clone(), &endpoints()),
        AggregatorConfig::default(),
    )
    .with_sink(view)
    .with_sink(Arc::new(move |snapshot: Arc<Snapshot>| log.lock().push(snapshot)));

    Pipeline {
        http,
        camera,
        published,
        aggregator,
    }
}

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_full_pipeline_merges_all_sources() {
    let http = RoutingHttp::default()
        .route(POSITION_BASE, vec![Reply::ok(&position_body(51.5, -0.12))])
        .route(GEOCODE_BASE, vec![Reply::ok(NEW_YORK_BODY)])
        .route(PASS_BASE, vec![Reply::ok(ONE_PASS_BODY)]);
    let p = pipeline(http);

    p.aggregator.start(new_york()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = p.aggregator.snapshot();
    let position = snapshot.position.unwrap();
    assert_eq!(position.coordinate, Coordinate::new(51.5, -0.12).unwrap());
    assert_eq!(position.observed_at.timestamp(), 1_700_000_000);
    assert_eq!(snapshot.place.text, "New York, NY, USA");

    let pass = snapshot.pass.unwrap();
    assert_eq!(pass.rise_time.timestamp(), 1_700_000_000);
    assert_eq!(pass.duration_seconds, 300);
    assert_eq!(snapshot.pass_status, PassStatus::Scheduled);
    assert_eq!(snapshot.observer, Some(new_york()));

    assert_eq!(p.http.requests_to(POSITION_BASE), 1);
    assert!(p
        .http
        .requests
        .lock()
        .iter()
        .any(|url| url.starts_with(PASS_BASE) && url.contains("lat=40.7128")));
}

#[tokio::test(start_paused = true)]
async fn test_camera_follows_each_new_position() {
    let http = RoutingHttp::default()
        .route(
            POSITION_BASE,
            vec![
                Reply::ok(&position_body(10.0, 10.0)),
                Reply::ok(&position_body(10.0, 10.0)),
                Reply::ok(&position_body(11.0, 12.0)),
            ],
        )
        .route(GEOCODE_BASE, vec![Reply::ok(NEW_YORK_BODY)])
        .route(PASS_BASE, vec![Reply::ok(ONE_PASS_BODY)]);
    let p = pipeline(http);

    p.aggregator.start(new_york()).unwrap();
    tokio::time::sleep(Duration::from_millis(10_100)).await;

    // The repeated 10,10 sample does not re-issue a move.
    let instructions = p.camera.instructions.lock();
    assert_eq!(instructions.len(), 2);
    assert_eq!(instructions[1].target, Coordinate::new(11.0, 12.0).unwrap());
    assert!(!instructions[0].is_current());
    assert!(instructions[1].is_current());
    assert!(instructions
        .iter()
        .all(|i| i.duration == Duration::from_secs(2) && i.zoom == 3));
}

#[tokio::test(start_paused = true)]
async fn test_out_of_order_response_never_applied() {
    let http = RoutingHttp::default()
        .route(
            POSITION_BASE,
            vec![
                Reply::after(Duration::from_secs(7), &position_body(1.0, 1.0)),
                Reply::after(Duration::from_secs(1), &position_body(2.0, 2.0)),
                Reply::after(Duration::from_secs(60), &position_body(3.0, 3.0)),
            ],
        )
        .route(GEOCODE_BASE, vec![Reply::ok(NEW_YORK_BODY)])
        .route(PASS_BASE, vec![Reply::ok(ONE_PASS_BODY)]);
    let p = pipeline(http);

    p.aggregator.start(new_york()).unwrap();
    tokio::time::sleep(Duration::from_secs(9)).await;

    let stale = Coordinate::new(1.0, 1.0).unwrap();
    assert_eq!(
        p.aggregator.snapshot().position.unwrap().coordinate,
        Coordinate::new(2.0, 2.0).unwrap()
    );
    assert!(p
        .published
        .lock()
        .iter()
        .all(|s| s.position.map(|sample| sample.coordinate) != Some(stale)));
    assert!(p
        .camera
        .instructions
        .lock()
        .iter()
        .all(|i| i.target != stale));
}

#[tokio::test(start_paused = true)]
async fn test_outage_degrades_then_recovers() {
    let http = RoutingHttp::default()
        .route(
            POSITION_BASE,
            vec![
                Reply::ok(&position_body(5.0, 5.0)),
                Reply::unavailable(),
                Reply::unavailable(),
                Reply::unavailable(),
                Reply::ok(&position_body(6.0, 6.0)),
            ],
        )
        .route(GEOCODE_BASE, vec![Reply::ok(NEW_YORK_BODY)])
        .route(PASS_BASE, vec![Reply::ok(ONE_PASS_BODY)]);
    let p = pipeline(http);

    p.aggregator.start(new_york()).unwrap();

    tokio::time::sleep(Duration::from_millis(5_100)).await;
    let snapshot = p.aggregator.snapshot();
    assert_eq!(snapshot.position_status(), PositionStatus::Degraded);
    assert_eq!(
        snapshot.position.unwrap().coordinate,
        Coordinate::new(5.0, 5.0).unwrap()
    );

    tokio::time::sleep(Duration::from_secs(10)).await;
    let snapshot = p.aggregator.snapshot();
    assert_eq!(snapshot.position_status(), PositionStatus::Lost);
    assert_eq!(
        snapshot.error(SourceKind::Position).unwrap().consecutive_failures,
        3
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    let snapshot = p.aggregator.snapshot();
    assert_eq!(snapshot.position_status(), PositionStatus::Live);
    assert!(snapshot.error(SourceKind::Position).is_none());
}

#[tokio::test(start_paused = true)]
async fn test_empty_pass_list_and_geocode_outage() {
    let http = RoutingHttp::default()
        .route(POSITION_BASE, vec![Reply::ok(&position_body(1.0, 1.0))])
        .route(GEOCODE_BASE, vec![Reply::unavailable()])
        .route(PASS_BASE, vec![Reply::ok(NO_PASS_BODY)]);
    let p = pipeline(http);

    p.aggregator.start(new_york()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let snapshot = p.aggregator.snapshot();
    assert_eq!(snapshot.pass_status, PassStatus::NoneScheduled);
    assert!(snapshot.pass.is_none());
    assert!(snapshot.place.is_default());
    assert!(snapshot.error(SourceKind::Pass).is_none());

    let geocode = snapshot.error(SourceKind::Geocode).unwrap();
    assert_eq!(geocode.severity, FaultSeverity::Transient);
    assert_eq!(snapshot.position_status(), PositionStatus::Live);
}

#[tokio::test(start_paused = true)]
async fn test_observer_change_refreshes_lookups() {
    let http = RoutingHttp::default()
        .route(POSITION_BASE, vec![Reply::ok(&position_body(1.0, 1.0))])
        .route(GEOCODE_BASE, vec![Reply::ok(NEW_YORK_BODY)])
        .route(PASS_BASE, vec![Reply::ok(ONE_PASS_BODY)]);
    let p = pipeline(http);

    p.aggregator.start(new_york()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(p.http.requests_to(PASS_BASE), 1);

    let london = Coordinate::new(51.5074, -0.1278).unwrap();
    p.aggregator.update_observer(london).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(p.http.requests_to(PASS_BASE), 2);
    assert_eq!(p.http.requests_to(GEOCODE_BASE), 2);
    assert_eq!(p.aggregator.snapshot().observer, Some(london));
}

#[tokio::test(start_paused = true)]
async fn test_stop_voids_in_flight_poll() {
    let http = RoutingHttp::default()
        .route(
            POSITION_BASE,
            vec![Reply::after(Duration::from_secs(3), &position_body(1.0, 1.0))],
        )
        .route(GEOCODE_BASE, vec![Reply::ok(NEW_YORK_BODY)])
        .route(PASS_BASE, vec![Reply::ok(ONE_PASS_BODY)]);
    let p = pipeline(http);

    p.aggregator.start(new_york()).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    p.aggregator.stop();
    let published = p.published.lock().len();

    tokio::time::sleep(Duration::from_secs(20)).await;

    assert_eq!(p.published.lock().len(), published);
    assert!(p.camera.instructions.lock().is_empty());
    assert_eq!(p.http.requests_to(POSITION_BASE), 1);
}

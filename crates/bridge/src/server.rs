use std::sync::Arc;

use {
    axum::{
        Json, Router,
        body::Bytes,
        extract::{RawQuery, State},
        http::{HeaderMap, StatusCode, header::AUTHORIZATION},
        routing::{get, post},
    },
    botplus_channels::{ConnectionStatus, EventDispatcher},
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tower_http::trace::TraceLayer,
    tracing::{debug, info, warn},
};

use crate::vote::{VoteKind, extract_payload};

/// Shared state behind every bridge route.
pub struct BridgeState {
    pub dispatcher: EventDispatcher,
    pub status: Arc<dyn ConnectionStatus>,
    /// Without a secret every vote is refused.
    pub vote_secret: Option<Secret<String>>,
}

impl BridgeState {
    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.vote_secret else {
            return false;
        };
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|given| constant_time_eq(given, expected.expose_secret()))
    }
}

/// Exact match whose running time does not depend on where the inputs differ.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Body of `GET /` and `GET /ping`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PingResponse {
    pub status: String,
    /// Heartbeat latency in milliseconds, 0 while offline.
    pub ping: f64,
}

impl PingResponse {
    fn from_status(status: &dyn ConnectionStatus) -> Self {
        if !status.is_ready() {
            return Self {
                status: "Offline".into(),
                ping: 0.0,
            };
        }
        Self {
            status: "Online".into(),
            ping: status
                .latency()
                .map_or(0.0, |latency| latency.as_secs_f64() * 1000.0),
        }
    }
}

/// Build the bridge router (shared between the server task and tests).
pub fn build_bridge_app(state: Arc<BridgeState>) -> Router {
    Router::new()
        .route("/", get(ping_handler))
        .route("/ping", get(ping_handler))
        .route("/vote", post(vote_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ping_handler(State(state): State<Arc<BridgeState>>) -> Json<PingResponse> {
    Json(PingResponse::from_status(state.status.as_ref()))
}

async fn vote_handler(
    State(state): State<Arc<BridgeState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> StatusCode {
    if !state.authorized(&headers) {
        debug!("vote refused: bad or missing authorization");
        return StatusCode::UNAUTHORIZED;
    }

    let payload = extract_payload(&body, query.as_deref());
    let Some(kind) = VoteKind::from_payload(&payload) else {
        debug!(vote_type = ?payload.get("type"), "vote refused: unknown type");
        return StatusCode::UNAUTHORIZED;
    };

    let event = kind.event_name();
    match state.dispatcher.dispatch_custom(event, Value::Object(payload)) {
        Ok(()) => {
            info!(event, "vote received");
            StatusCode::OK
        },
        Err(e) => {
            warn!(event, error = %e, "failed to dispatch vote");
            StatusCode::SERVICE_UNAVAILABLE
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use {
        axum::{body::Body, http::Request},
        botplus_channels::{BotEvent, EventKind, MemoryTransport},
        botplus_common::UserId,
        tokio_util::sync::CancellationToken,
        tower::ServiceExt,
    };

    use {super::*, crate::vote::TEST_VOTE_EVENT};

    struct Fixture {
        app: Router,
        dispatcher: EventDispatcher,
        transport: Arc<MemoryTransport>,
        _cancel: CancellationToken,
    }

    fn fixture(secret: Option<&str>) -> Fixture {
        let (dispatcher, dispatch_loop) = EventDispatcher::new();
        let cancel = CancellationToken::new();
        tokio::spawn(dispatch_loop.run(cancel.clone()));
        let transport = Arc::new(MemoryTransport::new(UserId(1)));
        let app = build_bridge_app(Arc::new(BridgeState {
            dispatcher: dispatcher.clone(),
            status: transport.clone(),
            vote_secret: secret.map(|s| Secret::new(s.to_string())),
        }));
        Fixture {
            app,
            dispatcher,
            transport,
            _cancel: cancel,
        }
    }

    fn vote(auth: Option<&str>, body: &'static str) -> Request<Body> {
        let mut req = Request::post("/vote").header("content-type", "application/json");
        if let Some(auth) = auth {
            req = req.header("authorization", auth);
        }
        req.body(Body::from(body)).unwrap()
    }

    async fn ping(app: Router, path: &str) -> PingResponse {
        let resp = app
            .oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn ping_reports_offline_then_online() {
        let f = fixture(None);
        assert_eq!(ping(f.app.clone(), "/ping").await, PingResponse {
            status: "Offline".into(),
            ping: 0.0,
        });

        f.transport.set_ready(Duration::from_millis(37));
        let online = ping(f.app.clone(), "/").await;
        assert_eq!(online.status, "Online");
        assert!((online.ping - 37.0).abs() < 1e-6);
    }

    struct ReadyUnmeasured;

    impl ConnectionStatus for ReadyUnmeasured {
        fn is_ready(&self) -> bool {
            true
        }

        fn latency(&self) -> Option<Duration> {
            None
        }
    }

    #[tokio::test]
    async fn ping_is_online_before_first_heartbeat() {
        let (dispatcher, _loop) = EventDispatcher::new();
        let app = build_bridge_app(Arc::new(BridgeState {
            dispatcher,
            status: Arc::new(ReadyUnmeasured),
            vote_secret: None,
        }));
        assert_eq!(ping(app, "/ping").await, PingResponse {
            status: "Online".into(),
            ping: 0.0,
        });
    }

    #[test]
    fn secret_comparison_is_exact() {
        assert!(constant_time_eq("hunter2", "hunter2"));
        assert!(!constant_time_eq("hunter2", "hunter3"));
        assert!(!constant_time_eq("hunter2", "hunter22"));
        assert!(!constant_time_eq("", "x"));
        assert!(constant_time_eq("", ""));
    }

    #[tokio::test]
    async fn ping_json_uses_capitalized_keys() {
        let f = fixture(None);
        let resp = f
            .app
            .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, serde_json::json!({"Status": "Offline", "Ping": 0.0}));
    }

    #[tokio::test]
    async fn authorized_upvote_emits_one_event() {
        let f = fixture(Some("S"));
        let mut events = f.dispatcher.subscribe();

        let resp = f
            .app
            .oneshot(vote(Some("S"), r#"{"type":"upvote","user":"7"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());

        let event = events
            .next_matching(&EventKind::custom("vote"), Some(Duration::from_secs(1)), |_| true)
            .await
            .unwrap()
            .unwrap();
        match event.as_ref() {
            BotEvent::Custom { payload, .. } => {
                assert_eq!(payload["user"], "7");
            },
            other => panic!("unexpected event {other:?}"),
        }
        let extra = events
            .next_matching(&EventKind::custom("vote"), Some(Duration::from_millis(50)), |_| true)
            .await
            .unwrap();
        assert!(extra.is_none());
    }

    #[tokio::test]
    async fn test_vote_has_its_own_event() {
        let f = fixture(Some("S"));
        let mut events = f.dispatcher.subscribe();
        let resp = f
            .app
            .oneshot(vote(Some("S"), r#"{"type":"test"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let event = events
            .next_matching(
                &EventKind::custom(TEST_VOTE_EVENT),
                Some(Duration::from_secs(1)),
                |_| true,
            )
            .await
            .unwrap();
        assert!(event.is_some());
    }

    #[tokio::test]
    async fn refusals_emit_nothing() {
        for (secret, auth, body) in [
            (Some("S"), Some("T"), r#"{"type":"upvote"}"#),
            (Some("S"), None, r#"{"type":"upvote"}"#),
            (None, Some("S"), r#"{"type":"upvote"}"#),
            (Some("S"), Some("S"), r#"{"type":"downvote"}"#),
            (Some("S"), Some("s"), r#"{"type":"upvote"}"#),
        ] {
            let f = fixture(secret);
            let mut events = f.dispatcher.subscribe();
            let resp = f.app.oneshot(vote(auth, body)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
            assert!(body.is_empty());

            let next = tokio::time::timeout(Duration::from_millis(50), events.recv()).await;
            assert!(next.is_err(), "no event expected");
        }
    }

    #[tokio::test]
    async fn form_and_query_bodies_are_accepted() {
        let f = fixture(Some("S"));
        let form = Request::post("/vote")
            .header("authorization", "S")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("type=upvote&user=9"))
            .unwrap();
        assert_eq!(
            f.app.clone().oneshot(form).await.unwrap().status(),
            StatusCode::OK
        );

        let query = Request::post("/vote?type=test")
            .header("authorization", "S")
            .body(Body::empty())
            .unwrap();
        assert_eq!(f.app.oneshot(query).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn vote_requires_post() {
        let f = fixture(Some("S"));
        let resp = f
            .app
            .oneshot(Request::get("/vote").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use stakegov_governance::{
    CoordinationTransport, GovernanceClient, GovernanceError, HttpTransport, TransportError,
};
use stakegov_types::{Amount, Timestamp};
use tokio_util::sync::CancellationToken;

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api")
}

#[tokio::test]
async fn fetches_proposals() {
    let app = Router::new().route(
        "/api/proposals",
        get(|| async {
            Json(json!([
                {
                    "vote_id": "prop-7", "name": "Listing", "details": "tier 2",
                    "address": "payout", "amount": "1500", "txid": "",
                    "start_time": "1700000000", "end_time": "1701000000",
                    "votes_affirm": "4", "votes_oppose": "1"
                },
                {
                    "id": "8", "vote_id": "prop-8", "name": "Audit",
                    "amount": 20.5, "end_time": 1702000000
                }
            ]))
        }),
    );
    let base = serve(app).await;
    let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();

    let proposals = transport.get_proposals().await.unwrap();
    assert_eq!(proposals.len(), 2);
    assert_eq!(proposals[0].vote_id.as_str(), "prop-7");
    assert_eq!(proposals[0].amount, Amount::from_coins(1_500));
    assert_eq!(proposals[0].end_time, Timestamp::new(1_701_000_000));
    assert_eq!(proposals[1].id, "8");
    assert_eq!(proposals[1].amount, Amount::from_coin_str("20.5").unwrap());
}

#[tokio::test]
async fn posts_ballot_array_and_reads_records() {
    let received: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = received.clone();
    let app = Router::new().route(
        "/api/votes",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(body);
                Json(json!([
                    {"voteid": "prop-7", "address": "a", "signature": "x", "vote": "1", "weight": "30"},
                    {"voteid": "prop-7", "address": "b", "weight": 20}
                ]))
            }
        }),
    );
    let base = serve(app).await;
    let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();

    let payload = r#"[{"voteid":"prop-7","address":"a","signature":"c2ln","ballot":"1"}]"#;
    let records = transport.cast_votes(payload).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].weight, Amount::new(30));
    assert_eq!(records[1].weight, Amount::new(20));

    let body = received.lock().unwrap().clone().unwrap();
    assert_eq!(body[0]["ballot"], "1");
    assert_eq!(body[0]["voteid"], "prop-7");
}

#[tokio::test]
async fn server_error_is_request_failed() {
    let app = Router::new().route(
        "/api/proposals",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
    );
    let base = serve(app).await;
    let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        transport.get_proposals().await,
        Err(TransportError::RequestFailed(_))
    ));
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let app = Router::new().route("/api/proposals", get(|| async { "not json" }));
    let base = serve(app).await;
    let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
    assert!(matches!(
        transport.get_proposals().await,
        Err(TransportError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn unreachable_service() {
    let transport = HttpTransport::new("http://127.0.0.1:1/api", Duration::from_secs(2)).unwrap();
    assert!(transport.get_proposals().await.is_err());
}

async fn slow_votes_service() -> String {
    let app = Router::new().route(
        "/api/votes",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!([]))
        }),
    );
    serve(app).await
}

#[tokio::test]
async fn slow_cast_is_timed_out() {
    let base = slow_votes_service().await;
    let transport = HttpTransport::new(&base, Duration::from_millis(200)).unwrap();
    assert!(matches!(
        transport.cast_votes("[]").await,
        Err(TransportError::TimedOut(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_cast_outcome_is_always_unknown() {
    let base = slow_votes_service().await;
    let timeout = Duration::from_millis(200);
    // Transport and wait share one bound, so either timer may fire first.
    for _ in 0..6 {
        let transport = HttpTransport::new(&base, timeout).unwrap();
        let client = GovernanceClient::new(Arc::new(transport));
        let err = client
            .submit_ballots(&[], timeout, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::OutcomeUnknown), "got {err:?}");
    }
}

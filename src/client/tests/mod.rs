//! Client tests against a mocked catalogue.

use super::*;
use crate::config::RetryConfig;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod lifecycle;

pub(crate) const NORM_ID: i64 = 4;

pub(crate) fn test_tokens() -> TokenPair {
    TokenPair {
        access_token: "access-test".to_string(),
        refresh_token: "refresh-test".to_string(),
        token_type: "bearer".to_string(),
    }
}

/// Config pointed at the mock server with millisecond backoff
pub(crate) fn test_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        base_url: server.uri(),
        request_timeout: Duration::from_secs(10),
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Mount the norm list and the detail of the single test norm
pub(crate) async fn mount_taxonomy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ws/Norme"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": NORM_ID, "name": "NF EN 15804+A2"}])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/ws/Norme/{NORM_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "indicators": [
                {"id": 19, "nameFr": "Changement climatique - total", "unitName": "kg CO2 eq."}
            ],
            "phases": [
                {"id": 1, "nameFr": "Étape de production"},
                {"id": 2, "nameFr": "Total cycle de vie"}
            ]
        })))
        .mount(server)
        .await;
}

pub(crate) fn index_body(ids: &[i64]) -> serde_json::Value {
    serde_json::Value::Array(
        ids.iter()
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "serialIdentifier": format!("S-{id}"),
                    "name": format!("Produit {id}"),
                    "classificationIds": [],
                    "lastUpdate": "2024-12-20T00:00:00",
                    "isArchived": false
                })
            })
            .collect(),
    )
}

pub(crate) fn record_body(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "serialIdentifier": format!("S-{id}"),
        "name": format!("Produit {id}"),
        "responsibleOrganism": {"name": "Fabricant"},
        "indicatorSet": {
            "id": NORM_ID,
            "indicatorQuantities": [
                {"indicatorId": 19, "phaseId": 1, "quantity": 1.25},
                {"indicatorId": 19, "phaseId": 2, "quantity": 3.5},
                {"indicatorId": 404, "phaseId": 2, "quantity": 0.5}
            ]
        }
    })
}

pub(crate) async fn mount_index(server: &MockServer, ids: &[i64]) {
    Mock::given(method("GET"))
        .and(path("/ws/Epd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(index_body(ids)))
        .mount(server)
        .await;
}

pub(crate) async fn mount_record(server: &MockServer, id: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/ws/Epd/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_body(id)))
        .mount(server)
        .await;
}

/// Client with an injected token and the test taxonomy loaded
pub(crate) async fn create_test_client(server: &MockServer) -> IniesClient {
    mount_taxonomy(server).await;
    IniesClient::with_token(test_config(server), test_tokens())
        .await
        .unwrap()
}

/// Drain every event currently buffered in a receiver
pub(crate) fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

//! Mock catalogue fixtures

use inies_dl::{ClientConfig, RetryConfig};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Operator identity accepted by [`mount_login`]
pub const TEST_EMAIL: &str = "ops@example.com";
/// API key accepted by [`mount_login`]
pub const TEST_API_KEY: &str = "secret-key";
/// Norm every fixture record is declared under
pub const NORM_ID: i64 = 4;
/// Display name of [`NORM_ID`]
pub const NORM_NAME: &str = "NF EN 15804+A2";

/// Client config pointed at the mock server with millisecond backoff
pub fn test_config(server: &MockServer) -> ClientConfig {
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

/// Accept [`TEST_EMAIL`] / [`TEST_API_KEY`] exactly once
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/ws/Login"))
        .and(body_json(serde_json::json!({
            "email": TEST_EMAIL,
            "apiKey": TEST_API_KEY
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Norm list plus the detail of [`NORM_ID`]
pub async fn mount_taxonomy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ws/Norme"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{"id": NORM_ID, "name": NORM_NAME}])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/ws/Norme/{NORM_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "indicators": [
                {"id": 19, "nameFr": "Changement climatique - total", "unitName": "kg CO2 eq."},
                {"id": 30, "nameFr": "Consommation d'eau", "unitName": "m3"}
            ],
            "phases": [
                {"id": 1, "nameFr": "Étape de production"},
                {"id": 2, "nameFr": "A4-Transport"},
                {"id": 3, "nameFr": "A5-Processus de construction – installation"},
                {"id": 4, "nameFr": "Étape de fin de vie"},
                {"id": 5, "nameFr": "Total cycle de vie"}
            ]
        })))
        .mount(server)
        .await;
}

/// Index listing of `ids`
pub async fn mount_index(server: &MockServer, ids: &[i64]) {
    let body: Vec<_> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "serialIdentifier": format!("S-{id}"),
                "name": format!("Produit {id}"),
                "classificationIds": [12],
                "lastUpdate": "2025-01-06T08:30:00+01:00",
                "isArchived": false
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/ws/Epd"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Full payload of one record
pub fn record_json(id: i64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "serialIdentifier": format!("S-{id}"),
        "name": format!("Produit {id}"),
        "version": "1.0",
        "issueDate": "2023-03-14T00:00:00",
        "declarationType": 1,
        "declarationTypeName": "Individuelle",
        "responsibleOrganism": {"name": "Fabricant", "country": "France"},
        "commercialReferences": "Gamme A\r\nGamme B",
        "dvt": 50,
        "ufQuantity": 1.0,
        "ufUnit": "m2",
        "ufDescription": "1 m2 de paroi",
        "productionRegionFr": ["Bretagne"],
        "fuConstituantProducts": [
            {"name": "Béton", "quantity": 200.0, "unit": "kg", "unitId": 3, "constituantType": 1}
        ],
        "indicatorSet": {
            "id": NORM_ID,
            "indicatorQuantities": [
                {"indicatorId": 19, "phaseId": 1, "quantity": 10.0},
                {"indicatorId": 19, "phaseId": 2, "quantity": 2.0},
                {"indicatorId": 19, "phaseId": 3, "quantity": 1.0},
                {"indicatorId": 19, "phaseId": 4, "quantity": 0.5},
                {"indicatorId": 19, "phaseId": 5, "quantity": id as f64},
                {"indicatorId": 30, "phaseId": 5, "quantity": 99.0}
            ]
        }
    })
}

/// Serve [`record_json`] for `id`
pub async fn mount_record(server: &MockServer, id: i64) {
    Mock::given(method("GET"))
        .and(path(format!("/ws/Epd/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json(id)))
        .mount(server)
        .await;
}

/// Answer `id` with `status` every time
pub async fn mount_record_status(server: &MockServer, id: i64, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/ws/Epd/{id}")))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

use actix_web::{
    http::StatusCode,
    test::{self, TestRequest},
    web, App,
};
use serde_json::{json, Value};

use handy2go::{build_state, config::Config, routes, state::AppState};

fn state() -> AppState {
    build_state(&Config::default()).unwrap()
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(routes::configure),
        )
        .await
    };
}

macro_rules! set_role {
    ($app:expr, $role:expr) => {{
        let req = TestRequest::post()
            .uri("/api/session/role")
            .set_json(json!({ "role": $role }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert!(resp.status().is_success());
    }};
}

#[actix_web::test]
async fn health_is_ok() {
    let state = state();
    let app = app!(state);
    let resp = test::call_service(&app, TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn pages_render() {
    let state = state();
    let app = app!(state);
    for uri in ["/", "/orders", "/chats", "/chats/c1", "/profile", "/tracking"] {
        let resp = test::call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
    let resp = test::call_service(&app, TestRequest::get().uri("/chats/missing").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn second_active_job_is_refused() {
    let state = state();
    let app = app!(state);

    let req = TestRequest::post()
        .uri("/api/session/role")
        .set_json(json!({ "role": "PROVIDER" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        TestRequest::post().uri("/api/orders/req_101/accept").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "You already have a job in progress. Finish it before accepting another."
    );

    let orders: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/orders").to_request(),
    )
    .await;
    let statuses: Vec<&str> = orders
        .as_array()
        .unwrap()
        .iter()
        .map(|order| order["status"].as_str().unwrap())
        .collect();
    assert_eq!(statuses, vec!["PENDING", "ACCEPTED"]);
}

#[actix_web::test]
async fn client_cannot_accept_orders() {
    let state = state();
    let app = app!(state);
    let resp = test::call_service(
        &app,
        TestRequest::post().uri("/api/orders/req_101/accept").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn direct_request_flow() {
    let state = state();
    let app = app!(state);

    let session: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post().uri("/api/providers/p1/select").to_request(),
    )
    .await;
    assert_eq!(session["mode"], "provider_selected");
    assert_eq!(session["provider_id"], "p1");

    let session: Value = test::call_and_read_body_json(
        &app,
        TestRequest::post().uri("/api/request/begin").to_request(),
    )
    .await;
    assert_eq!(session["mode"], "composing_request");

    let req = TestRequest::post()
        .uri("/api/request/description")
        .set_json(json!({ "description": "No anda el disyuntor" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let resp = test::call_service(&app, TestRequest::post().uri("/api/request/send").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["status"], "PENDING");
    assert_eq!(body["order"]["description"], "No anda el disyuntor");
    assert_eq!(body["chat"]["order_id"], body["order"]["id"]);

    let chats: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/chats").to_request(),
    )
    .await;
    let matching = chats
        .as_array()
        .unwrap()
        .iter()
        .filter(|chat| chat["order_id"] == body["order"]["id"])
        .count();
    assert_eq!(matching, 1);
}

#[actix_web::test]
async fn busy_provider_is_unavailable() {
    let state = state();
    let app = app!(state);
    test::call_service(&app, TestRequest::post().uri("/api/providers/p2/select").to_request()).await;
    let resp = test::call_service(&app, TestRequest::post().uri("/api/request/begin").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn category_filter_narrows_providers() {
    let state = state();
    let app = app!(state);

    let all: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/providers").to_request(),
    )
    .await;
    assert_eq!(all.as_array().unwrap().len(), 4);

    let req = TestRequest::post()
        .uri("/api/session/filter")
        .set_json(json!({ "category_id": "mudanza" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let filtered: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/providers").to_request(),
    )
    .await;
    let ids: Vec<&str> = filtered
        .as_array()
        .unwrap()
        .iter()
        .map(|provider| provider["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["p3"]);

    let req = TestRequest::post()
        .uri("/api/session/filter")
        .set_json(json!({ "category_id": "jardineria" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn public_request_hire_flow() {
    let state = state();
    let app = app!(state);

    let req = TestRequest::post()
        .uri("/api/public-requests")
        .set_json(json!({
            "category_id": "electricidad",
            "description": "Colgar una lámpara",
            "offer_price": "",
            "coordinates": { "lat": -34.6045, "lng": -58.3845 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let request: Value = test::read_body_json(resp).await;
    assert_eq!(request["offer_price"], "A convenir");
    let id = request["id"].as_str().unwrap().to_string();

    let req = TestRequest::post()
        .uri("/api/session/role")
        .set_json(json!({ "role": "PROVIDER" }))
        .to_request();
    test::call_service(&app, req).await;

    let resp = test::call_service(
        &app,
        TestRequest::post().uri(&format!("/api/public-requests/{id}/apply")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let hire = format!("/api/public-requests/{id}/applicants/p1/accept");
    set_role!(app, "CLIENT");
    let resp = test::call_service(&app, TestRequest::post().uri(&hire).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    set_role!(app, "PROVIDER");
    for step in ["start", "complete"] {
        let resp = test::call_service(
            &app,
            TestRequest::post()
                .uri(&format!("/api/orders/req_102/{step}"))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    set_role!(app, "CLIENT");
    let resp = test::call_service(&app, TestRequest::post().uri(&hire).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["order"]["status"], "ACCEPTED");
    assert_eq!(body["order"]["id"], format!("ord_pub_{id}"));

    let resp = test::call_service(
        &app,
        TestRequest::get().uri(&format!("/api/public-requests/{id}")).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let tracking: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/tracking").to_request(),
    )
    .await;
    assert_eq!(tracking["order_id"], format!("ord_pub_{id}"));
}

#[actix_web::test]
async fn only_parties_can_track_or_cancel_a_job() {
    let state = state();
    let app = app!(state);
    let track = || TestRequest::post().uri("/api/orders/req_102/track").to_request();
    let cancel = || TestRequest::post().uri("/api/tracking/cancel").to_request();

    let resp = test::call_service(&app, track()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    set_role!(app, "GUEST");
    let resp = test::call_service(&app, track()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = test::call_service(&app, cancel()).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    set_role!(app, "PROVIDER");
    let resp = test::call_service(&app, track()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let order: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/orders/req_102").to_request(),
    )
    .await;
    assert_eq!(order["status"], "ACCEPTED");
}

#[actix_web::test]
async fn tracking_is_empty_until_a_job_starts() {
    let state = state();
    let app = app!(state);
    let resp = test::call_service(&app, TestRequest::get().uri("/api/tracking").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = test::call_service(
        &app,
        TestRequest::post().uri("/api/tracking/cancel").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn chat_messages_are_appended() {
    let state = state();
    let app = app!(state);

    let chat: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/chats/c1").to_request(),
    )
    .await;
    assert_eq!(chat["unread_count"], 0);

    let req = TestRequest::post()
        .uri("/api/chats/c1/messages")
        .set_json(json!({ "text": "Dale, te espero" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let chat: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/chats/c1").to_request(),
    )
    .await;
    assert_eq!(chat["last_message"], "Dale, te espero");
    assert_eq!(chat["messages"].as_array().unwrap().len(), 2);

    let req = TestRequest::post()
        .uri("/api/chats/c1/messages")
        .set_json(json!({ "text": "   " }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn estimate_without_key_uses_fallback() {
    let state = state();
    let app = app!(state);
    let req = TestRequest::post()
        .uri("/api/estimate")
        .set_json(json!({
            "service_name": "Plomería",
            "location": "Florida 500",
            "description": "Pierde el termotanque"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["estimate"], "Consultar con profesional");
    assert_eq!(body["sources"], json!([]));
}

#[actix_web::test]
async fn addresses_and_profile() {
    let state = state();
    let app = app!(state);

    let req = TestRequest::post()
        .uri("/api/addresses")
        .set_json(json!({
            "name": "Casa",
            "address": "Av. Rivadavia 5000",
            "coordinates": { "lat": -34.62, "lng": -58.44 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let session: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/session").to_request(),
    )
    .await;
    assert_eq!(session["current_address"], "Casa");
    assert_eq!(session["client_location"]["lat"], -34.62);

    let req = TestRequest::put()
        .uri("/api/profile")
        .set_json(json!({ "range": 0 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::put()
        .uri("/api/profile")
        .set_json(json!({ "status": "CLOSED" }))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["status"], "CLOSED");
}

#[actix_web::test]
async fn markers_follow_role() {
    let state = state();
    let app = app!(state);
    let markers: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/markers").to_request(),
    )
    .await;
    assert!(markers
        .as_array()
        .unwrap()
        .iter()
        .any(|marker| marker["kind"] == "provider"));

    let req = TestRequest::post()
        .uri("/api/session/role")
        .set_json(json!({ "role": "PROVIDER" }))
        .to_request();
    test::call_service(&app, req).await;

    let markers: Value = test::call_and_read_body_json(
        &app,
        TestRequest::get().uri("/api/markers").to_request(),
    )
    .await;
    let kinds: Vec<&str> = markers
        .as_array()
        .unwrap()
        .iter()
        .map(|marker| marker["kind"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"service_area"));
    assert!(kinds.contains(&"public_request"));
    assert!(!kinds.contains(&"provider"));
}

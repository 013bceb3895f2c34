use actix_web::{http::StatusCode, test, web, App};
use audiocall_server::access_token::{now_secs, AccessTokenIssuer, DEFAULT_TOKEN_TTL};
use audiocall_server::config::Settings;
use audiocall_server::handlers;
use std::time::Duration;

const LIVEKIT_URL: &str = "wss://audio.example.com/rtc?region=eu";

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.livekit.api_key = "APIdevkey".to_string();
    settings.livekit.api_secret = "integration-secret".to_string();
    settings.livekit.url = LIVEKIT_URL.to_string();
    settings
}

fn test_issuer() -> AccessTokenIssuer {
    AccessTokenIssuer::new(
        "APIdevkey".to_string(),
        b"integration-secret".to_vec(),
        DEFAULT_TOKEN_TTL,
    )
    .unwrap()
}

async fn fetch_token(uri: &str) -> serde_json::Value {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_settings()))
            .app_data(web::Data::new(test_issuer()))
            .configure(handlers::routes),
    )
    .await;

    let req = test::TestRequest::get().uri(uri).to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    test::read_body_json(resp).await
}

#[actix_web::test]
async fn test_get_token_with_room_and_participant() {
    let body = fetch_token("/get-token/?room=standup&participant=alice").await;

    let claims = test_issuer()
        .decode(body["token"].as_str().unwrap())
        .expect("token should verify with the configured secret");
    assert_eq!(claims.sub, "alice");
    assert_eq!(claims.iss, "APIdevkey");
    assert_eq!(claims.video.room, "standup");
    assert!(claims.video.room_join);
    assert!(claims.video.can_publish);
    assert!(claims.video.can_subscribe);
    assert_eq!(claims.exp - claims.nbf, 3600);
}

#[actix_web::test]
async fn test_get_token_defaults() {
    let body = fetch_token("/get-token/").await;

    let claims = test_issuer().decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.video.room, "audio-room");
    assert_eq!(claims.sub, "user");
}

#[actix_web::test]
async fn test_get_token_partial_defaults() {
    let body = fetch_token("/get-token/?participant=bob").await;
    let claims = test_issuer().decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.video.room, "audio-room");
    assert_eq!(claims.sub, "bob");

    let body = fetch_token("/get-token/?room=lobby").await;
    let claims = test_issuer().decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.video.room, "lobby");
    assert_eq!(claims.sub, "user");
}

#[actix_web::test]
async fn test_get_token_keeps_values_verbatim() {
    let body = fetch_token("/get-token/?room=team%20room%2F1&participant=").await;

    let claims = test_issuer().decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.video.room, "team room/1");
    assert_eq!(claims.sub, "");
}

#[actix_web::test]
async fn test_get_token_repeated_param_keeps_last_value() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_settings()))
            .app_data(web::Data::new(test_issuer()))
            .configure(handlers::routes),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/get-token/?room=a&participant=alice&room=b")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let claims = test_issuer().decode(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.video.room, "b");
    assert_eq!(claims.sub, "alice");
}

#[actix_web::test]
async fn test_get_token_response_shape() {
    let body = fetch_token("/get-token/?room=standup").await;

    let object = body.as_object().expect("json object");
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["livekit_url", "token"]);
    assert_eq!(body["livekit_url"], LIVEKIT_URL);
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
}

#[actix_web::test]
async fn test_get_token_rejected_by_other_secret() {
    let body = fetch_token("/get-token/").await;

    let other = AccessTokenIssuer::new(
        "APIdevkey".to_string(),
        b"not-the-secret".to_vec(),
        DEFAULT_TOKEN_TTL,
    )
    .unwrap();
    assert!(other.decode(body["token"].as_str().unwrap()).is_err());
}

#[actix_web::test]
async fn test_get_token_anchored_to_wall_clock() {
    let before = now_secs();
    let first = fetch_token("/get-token/").await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    let second = fetch_token("/get-token/").await;
    let after = now_secs();

    let issuer = test_issuer();
    let first = issuer.decode(first["token"].as_str().unwrap()).unwrap();
    let second = issuer.decode(second["token"].as_str().unwrap()).unwrap();

    assert!(first.nbf >= before && second.nbf <= after);
    let delta = second.nbf - first.nbf;
    assert!((1..=2).contains(&delta), "unexpected nbf delta {}", delta);
    assert_eq!(second.exp - first.exp, delta);
}

#[actix_web::test]
async fn test_post_is_not_routed() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_settings()))
            .app_data(web::Data::new(test_issuer()))
            .configure(handlers::routes),
    )
    .await;

    let req = test::TestRequest::post().uri("/get-token/").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_client_error());
}

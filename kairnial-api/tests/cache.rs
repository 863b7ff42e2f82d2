mod common;

use axum::http::StatusCode;
use common::{project_uri, ws_path, TestApp};
use serde_json::json;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn identical_reads_hit_upstream_once() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("aclmanager.getAclGrants")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"acl_code": "dms.read", "acl_label": "Read documents", "acl_granted": "1"},
            {"acl_code": "dms.write", "acl_granted": 0},
        ])))
        .expect(1)
        .mount(&app.ws)
        .await;

    let (first_status, first) = app.get(&project_uri("admin/acl/grants")).await;
    let (second_status, second) = app.get(&project_uri("admin/acl/grants/")).await;

    assert_eq!(first_status, StatusCode::OK);
    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(first, second);
    assert_eq!(first[0]["code"], "dms.read");
    assert_eq!(first[0]["granted"], true);
    assert_eq!(first[1]["granted"], false);
    assert_eq!(app.ws_calls("aclmanager.getAclGrants").await, 1);
}

#[tokio::test]
async fn emitters_are_never_cached() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("aclmanager.getAllowedEmitters")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&app.ws)
        .await;

    app.get(&project_uri("defects/emitters")).await;
    app.get(&project_uri("defects/emitters")).await;

    assert_eq!(app.ws_calls("aclmanager.getAllowedEmitters").await, 2);
}

#[tokio::test]
async fn errors_are_not_cached() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("aclmanager.getModules")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .up_to_n_times(1)
        .mount(&app.ws)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("aclmanager.getModules")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&app.ws)
        .await;

    let (status, body) = app.get(&project_uri("admin/modules")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 503);

    let (status, _) = app.get(&project_uri("admin/modules")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.ws.cache().len() >= 1);
}

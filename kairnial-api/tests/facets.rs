mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{authorized, project_uri, valid_token, ws_path, TestApp};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path, path_regex};
use wiremock::{Mock, ResponseTemplate};

fn with_body(method: &str, uri: &str, body: Value) -> Request<Body> {
    authorized(Request::builder().method(method).uri(uri), &valid_token())
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn users_list_combines_rows_and_count() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("users.getUsers")))
        .and(body_partial_json(json!({"params": [{"SEARCH": "ada", "LIMITSKIP": 0, "LIMITTAKE": 1}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "account_id": "5",
            "account_uuid": "7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10",
            "account_firstname": "Ada",
            "account_lastname": "Lovelace",
            "account_email": "ada@example.com",
        }])))
        .expect(1)
        .mount(&app.ws)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("users.getNbUsers")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("12")))
        .expect(1)
        .mount(&app.ws)
        .await;

    let (status, body) = app
        .get(&project_uri("admin/users?search=ada&page_limit=1"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 12);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["uuid"], "7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10");
}

#[tokio::test]
async fn refused_membership_change_is_not_acceptable() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("users.addUserToGroup")))
        .and(body_partial_json(json!({"params": [{
            "g_id": "3",
            "groups_user_uuid": "7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10",
        }]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(false)))
        .expect(1)
        .mount(&app.ws)
        .await;

    let (status, body) = app
        .send(with_body(
            "POST",
            &project_uri("admin/groups/3/users/add"),
            json!({"user_uuid": "7d3c2a8e-0f51-4a55-9b1c-3c1b3e0b5f10"}),
        ))
        .await;

    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["status"], 406);
}

#[tokio::test]
async fn documents_need_a_folder() {
    let app = TestApp::spawn().await;

    let (status, body) = app.get(&project_uri("dms/documents")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["description"], "folder_id is required");
}

#[tokio::test]
async fn documents_of_a_folder_are_listed() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("fichiers.getFilesFromCat")))
        .and(body_partial_json(json!({"params": [{"fcat_id": 4}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": [
            {"files_id": 1, "files_name": "a"},
            {"files_id": 2, "files_name": "b"},
            {"files_id": 3, "files_name": "c"},
        ]})))
        .mount(&app.ws)
        .await;

    let (status, body) = app
        .get(&project_uri("dms/documents?folder_id=4&page_offset=2"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 3);
    assert_eq!(body["page_offset"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["id"], 3);
    assert_eq!(body["items"][0]["file_name"], "c");
}

#[tokio::test]
async fn document_search_is_forwarded_with_the_folder() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("fichiers.getFilesFromCat")))
        .and(body_partial_json(json!({"params": [{"fcat_id": 4, "SEARCH": "plan"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"files": [
            {"files_id": 1, "files_name": "plan-rdc"},
            {"files_id": 2, "files_name": "photo", "files_title": "Site PLAN"},
            {"files_id": 3, "files_name": "invoice"},
        ]})))
        .expect(1)
        .mount(&app.ws)
        .await;

    let (status, body) = app
        .get(&project_uri("dms/documents?folder_id=4&search=plan"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["id"], 1);
    assert_eq!(body["items"][1]["id"], 2);
}

#[tokio::test]
async fn folder_archive_answers_no_content() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("fichiers.archiveIt")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .expect(1)
        .mount(&app.ws)
        .await;

    let (status, body) = app
        .send(
            authorized(Request::delete(project_uri("dms/folders/4")), &valid_token())
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn project_creation_is_scoped_to_the_client() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path_regex(ws_path("projects.addProject")))
        .and(body_partial_json(json!({
            "service": "acme",
            "params": [{"project_name": "Tower B"}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            "a1f0c3d2-6b7e-4f21-9d0a-5e8c7b6a4f32"
        )))
        .expect(1)
        .mount(&app.ws)
        .await;

    let (status, body) = app
        .send(with_body("POST", "/acme/projects", json!({"name": "Tower B"})))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["uuid"], "a1f0c3d2-6b7e-4f21-9d0a-5e8c7b6a4f32");
    assert_eq!(body["name"], "Tower B");
}

#[tokio::test]
async fn project_listing_goes_to_the_auth_server() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/projects"))
        .and(body_partial_json(json!({"client_id": "acme", "LIMITSKIP": 0, "LIMITTAKE": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 1,
            "items": [{"project_uuid": "a1f0c3d2-6b7e-4f21-9d0a-5e8c7b6a4f32", "project_name": "Tower B"}],
        })))
        .expect(1)
        .mount(&app.auth)
        .await;

    let (status, body) = app.get("/acme/projects").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Tower B");
}

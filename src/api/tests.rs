use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::routes::create_router;
use super::{AppState, Backends};
use crate::bolt::ExcludeList;
use crate::db::Database;
use crate::llm::{ChatModel, CompletionRequest, DefaultProvider, LlmError, ModelRegistry, TokenStream};
use crate::project::ProjectModel;
use crate::session::{FileSendState, Role};
use crate::upstream::{IdentityVerifier, ProjectSource, UpstreamError, VerifiedUser};

struct StubIdentity;

#[async_trait]
impl IdentityVerifier for StubIdentity {
    async fn verify(&self, token: &str) -> Result<VerifiedUser, UpstreamError> {
        match token {
            "alice-token" => Ok(VerifiedUser {
                user_id: "alice".into(),
                email: Some("alice@example.com".into()),
            }),
            "bob-token" => Ok(VerifiedUser {
                user_id: "bob".into(),
                email: None,
            }),
            _ => Err(UpstreamError::Unauthorized("Invalid token".into())),
        }
    }
}

#[derive(Default)]
struct ScriptedModel {
    chunks: Vec<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn stream_chat(&self, request: CompletionRequest) -> Result<TokenStream, LlmError> {
        self.requests.lock().unwrap().push(request);
        let chunks: Vec<Result<String, LlmError>> = self.chunks.iter().cloned().map(Ok).collect();
        Ok(futures::stream::iter(chunks).boxed())
    }
}

#[derive(Default)]
struct StubProjects {
    saved: Mutex<Vec<(String, Value)>>,
}

#[async_trait]
impl ProjectSource for StubProjects {
    async fn fetch_project(&self, project_id: &str, _token: &str) -> Result<Option<ProjectModel>, UpstreamError> {
        Ok((project_id == "p1").then(|| ProjectModel {
            name: "Demo Shop".into(),
            ..Default::default()
        }))
    }

    async fn fetch_generation(&self, _project_id: &str, _token: &str) -> Result<Option<Value>, UpstreamError> {
        Ok(None)
    }

    async fn save_generation(&self, project_id: &str, _token: &str, generation: &Value) -> Result<(), UpstreamError> {
        self.saved
            .lock()
            .unwrap()
            .push((project_id.to_string(), generation.clone()));
        Ok(())
    }
}

struct Harness {
    state: AppState,
    model: Arc<ScriptedModel>,
    projects: Arc<StubProjects>,
}

fn harness(chunks: &[&str]) -> Harness {
    let model = Arc::new(ScriptedModel {
        chunks: chunks.iter().map(|c| c.to_string()).collect(),
        ..Default::default()
    });
    let projects = Arc::new(StubProjects::default());
    let state = AppState::new(
        Database::open_in_memory().unwrap(),
        ModelRegistry::with_defaults(DefaultProvider::default()),
        ExcludeList::with_defaults(),
        "http://gen.test",
        Backends {
            llm: model.clone(),
            identity: Arc::new(StubIdentity),
            projects: projects.clone(),
        },
    );
    Harness { state, model, projects }
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn multipart_request(uri: &str, method: Method, token: &str, fields: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
    let boundary = "appgen-test-boundary";
    let mut body = Vec::new();
    for (name, content_type, data) in fields {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        match content_type {
            Some(ct) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}.zip\"\r\nContent-Type: {}\r\n\r\n",
                    name, name, ct
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes()),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n".as_slice());
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

fn parse(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn health_and_models_are_public() {
    let h = harness(&[]);
    let (status, body) = send(&h.state, Request::builder().uri("/health").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok".as_slice());

    let (status, body) = send(&h.state, Request::builder().uri("/api/models").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    let models = parse(&body);
    assert!(models
        .as_array()
        .unwrap()
        .iter()
        .any(|m| m["modelKey"] == "claude-3-7-sonnet"));
    assert!(models[0].get("apiKey").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let h = harness(&[]);
    let (status, body) = send(&h.state, Request::builder().uri("/api/chats").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let body = parse(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(body["error"], "Missing authentication token");

    let (status, body) = send(&h.state, get("/api/chats", "nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(parse(&body)["error"], "Invalid token");
}

#[tokio::test]
async fn unknown_model_is_a_bad_request() {
    let h = harness(&[]);
    let req = json_request(
        Method::POST,
        "/api/chat",
        Some("alice-token"),
        json!({ "model": "nope", "messages": [{ "role": "user", "content": "hi" }] }),
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"], "Model configuration not found for model: nope");
}

#[tokio::test]
async fn chat_streams_files_and_stores_the_turn() {
    let h = harness(&[
        "Here you go.\n<boltArtifact id=\"project-files\" title=\"Todo\">\n<boltAction type=\"file\" filePath=\"a.",
        "txt\">\nhello\n</boltAct",
        "ion>\n</boltArtifact>",
    ]);
    let req = json_request(
        Method::POST,
        "/api/chat",
        Some("alice-token"),
        json!({
            "model": "gpt-4o-mini",
            "chatId": "c1",
            "projectId": "p1",
            "tools": [{ "type": "function", "function": { "name": "search" } }],
            "messages": [{ "id": "m1", "role": "user", "content": "Build a todo app" }],
        }),
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("event: token"));
    assert!(text.contains("event: file"));
    assert!(text.contains(r#"{"path":"a.txt","content":"hello"}"#));
    assert!(text.contains("event: done"));
    assert!(!text.contains("event: error"));

    let requests = h.model.requests.lock().unwrap();
    let sent = &requests[0].messages;
    assert_eq!(sent[0].role, Role::System);
    assert!(sent[0].content.contains("Demo Shop"));
    drop(requests);

    let chat = h.state.db.get_chat("c1").unwrap().unwrap();
    assert_eq!(chat.user_id.as_deref(), Some("alice"));
    assert_eq!(chat.title, "Build a todo app");
    assert_eq!(chat.messages.last().unwrap().role, Role::Assistant);

    let session = h.state.sessions.get("c1").unwrap();
    let session = session.lock().unwrap();
    assert_eq!(session.files().get("a.txt"), Some("hello"));
    assert_eq!(session.state("a.txt"), FileSendState::Sent);
    drop(session);

    let saved = h.projects.saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].0, "p1");
    assert_eq!(saved[0].1["files"]["a.txt"], "hello");
    assert_eq!(saved[0].1["projectName"], "Demo Shop");
    assert!(!h.state.generations.is_running("c1"));
}

#[tokio::test]
async fn local_edits_are_replayed_before_the_next_question() {
    let h = harness(&["Done."]);
    let req = json_request(
        Method::PUT,
        "/api/chats/c2/files",
        Some("alice-token"),
        json!({ "files": { "a.txt": "one" }, "initial": true }),
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["changed"], json!(["a.txt"]));

    let (status, body) = send(&h.state, get("/api/chats/c2/files", "alice-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["states"][0]["state"], "pending_initial");

    let req = json_request(
        Method::POST,
        "/api/chat",
        Some("alice-token"),
        json!({
            "model": "gpt-4o-mini",
            "mode": "chat",
            "chatId": "c2",
            "messages": [{ "role": "user", "content": "What does a.txt say?" }],
        }),
    );
    let (status, _) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);

    let requests = h.model.requests.lock().unwrap();
    let sent = &requests[0].messages;
    let replay = sent
        .iter()
        .find(|m| m.content.contains("<boltArtifact"))
        .expect("file replay message");
    assert!(replay.content.contains("the current file"));
    assert!(replay.content.contains("filePath=\"a.txt\""));
    assert_eq!(sent.last().unwrap().content, "What does a.txt say?");
}

#[tokio::test]
async fn echoed_flush_message_is_replaced_not_duplicated() {
    let h = harness(&["Done."]);
    let req = json_request(
        Method::PUT,
        "/api/chats/c5/files",
        Some("alice-token"),
        json!({ "files": { "a.txt": "one", "b.txt": "one" }, "initial": true }),
    );
    send(&h.state, req).await;

    let first_turn = json!([{ "id": "q1", "role": "user", "content": "Start" }]);
    let req = json_request(
        Method::POST,
        "/api/chat",
        Some("alice-token"),
        json!({ "model": "gpt-4o-mini", "mode": "chat", "chatId": "c5", "messages": first_turn }),
    );
    let (status, _) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);

    let req = json_request(
        Method::PUT,
        "/api/chats/c5/files",
        Some("alice-token"),
        json!({ "files": { "a.txt": "two" } }),
    );
    send(&h.state, req).await;

    let req = json_request(Method::POST, "/api/chats/c5/flush", Some("alice-token"), json!({}));
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);
    let flushed = parse(&body)["message"].clone();
    let flushed_id = flushed["id"].as_str().unwrap().to_string();
    assert!(flushed_id.starts_with("files-update-"));

    let req = json_request(
        Method::POST,
        "/api/chat",
        Some("alice-token"),
        json!({
            "model": "gpt-4o-mini",
            "mode": "chat",
            "chatId": "c5",
            "files": { "b.txt": "two" },
            "messages": [
                { "id": "q1", "role": "user", "content": "Start" },
                { "id": "r1", "role": "assistant", "content": "Done." },
                flushed,
                { "id": "q2", "role": "user", "content": "Now what?" },
            ],
        }),
    );
    let (status, _) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);

    let requests = h.model.requests.lock().unwrap();
    let sent = &requests[1].messages;
    assert!(sent.iter().all(|m| m.id != flushed_id));
    let deltas: Vec<_> = sent
        .iter()
        .filter(|m| m.id.starts_with("files-update-"))
        .collect();
    assert_eq!(deltas.len(), 1);
    assert!(deltas[0].content.contains("filePath=\"a.txt\""));
    assert!(deltas[0].content.contains("filePath=\"b.txt\""));
    assert_eq!(
        sent.iter().filter(|m| m.content.contains("filePath=\"a.txt\"")).count(),
        1
    );
    assert_eq!(sent[sent.len() - 2].id, deltas[0].id);
    assert_eq!(sent.last().unwrap().id, "q2");
}

#[tokio::test]
async fn flush_without_pending_files_returns_null() {
    let h = harness(&[]);
    let req = json_request(Method::POST, "/api/chats/c3/flush", Some("alice-token"), json!({}));
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["message"], Value::Null);
}

#[tokio::test]
async fn chats_are_private_to_their_owner() {
    let h = harness(&["ok"]);
    let req = json_request(
        Method::POST,
        "/api/chat",
        Some("alice-token"),
        json!({ "model": "gpt-4o-mini", "chatId": "c4", "messages": [{ "role": "user", "content": "hi" }] }),
    );
    send(&h.state, req).await;

    let (status, _) = send(&h.state, get("/api/chats/c4", "bob-token")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&h.state, get("/api/chats", "alice-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body).as_array().unwrap().len(), 1);

    let req = Request::builder()
        .method(Method::DELETE)
        .uri("/api/chats/c4")
        .header(header::AUTHORIZATION, "alice-token")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(h.state.db.get_chat("c4").unwrap().is_none());
    assert!(h.state.sessions.get("c4").is_none());
}

#[tokio::test]
async fn load_rebuilds_session_from_history() {
    let h = harness(&["<boltArtifact id=\"x\" title=\"x\">\n<boltAction type=\"file\" filePath=\"b.txt\">\nB\n</boltAction>\n</boltArtifact>"]);
    let req = json_request(
        Method::POST,
        "/api/chat",
        Some("alice-token"),
        json!({ "model": "gpt-4o-mini", "chatId": "c5", "messages": [{ "role": "user", "content": "make b" }] }),
    );
    send(&h.state, req).await;
    h.state.sessions.remove("c5");

    let req = json_request(Method::POST, "/api/chats/c5/load", Some("alice-token"), json!({}));
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["files"]["b.txt"], "B");
    let last = body["messages"].as_array().unwrap().last().unwrap().clone();
    assert!(last["content"].as_str().unwrap().contains("the current file"));
}

#[tokio::test]
async fn storage_upload_list_download_delete() {
    let h = harness(&[]);
    let zip = crate::storage::create_zip_from_files(&[crate::storage::ZipEntry::new("index.html", "<html/>")], "frontend")
        .unwrap();

    let req = multipart_request(
        "/api/storage/upload",
        Method::POST,
        "alice-token",
        &[("projectId", None, b"p1".as_slice()), ("frontend", Some("application/zip"), zip.as_slice())],
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["backend"], Value::Null);
    let file_path = body["data"]["frontend"]["filePath"].as_str().unwrap().to_string();
    assert!(file_path.starts_with("users/alice/projects/p1/generated-apps/frontend-"));
    assert!(body["data"]["frontend"]["url"]
        .as_str()
        .unwrap()
        .starts_with("http://gen.test/api/storage/download/users/alice/"));

    let (status, body) = send(&h.state, get("/api/storage/list?projectId=p1", "alice-token")).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["files"][0]["filePath"], file_path.as_str());

    let (status, body) = send(&h.state, get("/api/storage/list?projectId=p1", "bob-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["data"]["count"], 0);

    let (status, body) = send(&h.state, get(&format!("/api/storage/download/{}", file_path), "alice-token")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, zip);

    let (status, _) = send(&h.state, get(&format!("/api/storage/download/{}", file_path), "bob-token")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = json_request(
        Method::DELETE,
        "/api/storage/delete",
        Some("alice-token"),
        json!({ "filePaths": [file_path, "users/alice/projects/p1/generated-apps/missing.zip"] }),
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["deletedCount"], 2);
    assert_eq!(body["message"], "Successfully deleted 2 file(s)");
}

#[tokio::test]
async fn storage_validation_errors() {
    let h = harness(&[]);

    let req = multipart_request("/api/storage/upload", Method::POST, "alice-token", &[("projectId", None, b"p1".as_slice())]);
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"], "At least one zip file (frontend or backend) is required");

    let req = multipart_request(
        "/api/storage/upload",
        Method::POST,
        "alice-token",
        &[("frontend", Some("application/zip"), b"PK".as_slice())],
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"], "Missing projectId");

    let req = multipart_request(
        "/api/storage/upload",
        Method::POST,
        "alice-token",
        &[("projectId", None, b"p1".as_slice()), ("backend", Some("text/plain"), b"x".as_slice())],
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"], "Backend file must be a zip file");

    let (status, body) = send(&h.state, get("/api/storage/list", "alice-token")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"], "Missing projectId parameter");

    let req = json_request(Method::DELETE, "/api/storage/delete", Some("alice-token"), json!({ "filePaths": [] }));
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(parse(&body)["error"], "filePaths array is required and must not be empty");

    let req = json_request(
        Method::DELETE,
        "/api/storage/delete",
        Some("alice-token"),
        json!({ "filePaths": ["users/bob/projects/p1/generated-apps/x.zip"] }),
    );
    let (status, _) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = multipart_request(
        "/api/storage/update",
        Method::PUT,
        "alice-token",
        &[
            ("frontendFilePath", None, b"users/alice/projects/p1/generated-apps/gone.zip".as_slice()),
            ("frontend", Some("application/zip"), b"PK".as_slice()),
        ],
    );
    let (status, _) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generate_zips_from_file_maps() {
    let h = harness(&[]);
    let req = json_request(
        Method::POST,
        "/api/storage/generate",
        Some("alice-token"),
        json!({ "projectId": "p9", "backend": { "server.js": "listen()" } }),
    );
    let (status, body) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["data"]["frontend"], Value::Null);
    assert!(body["data"]["backend"]["fileName"].as_str().unwrap().starts_with("backend-"));

    let req = json_request(Method::POST, "/api/storage/generate", Some("alice-token"), json!({ "projectId": "p9" }));
    let (status, _) = send(&h.state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_generation_is_not_found() {
    let h = harness(&[]);
    let (status, body) = send(&h.state, get("/api/projects/p1/generation", "alice-token")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(parse(&body)["code"], "NOT_FOUND");
}

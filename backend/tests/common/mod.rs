#![allow(dead_code)]

use repostats::config::AppConfig;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OWNER: &str = "octo";
pub const REPO: &str = "hello";

/// `if (a) { for (;;) {} }\nfunction f() {}\n`, scoring 3.
pub const INDEX_JS_BASE64: &str = "aWYgKGEpIHsgZm9yICg7Oykge30gfQpmdW5jdGlvbiBmKCkge30K";

pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig::default().with_github_api_url(server.uri())
}

pub fn route(suffix: &str) -> String {
    format!("/repos/{OWNER}/{REPO}{suffix}")
}

pub fn repository_json() -> serde_json::Value {
    json!({
        "id": 1296269,
        "full_name": "octo/hello",
        "description": "My first repository",
        "html_url": "https://github.com/octo/hello",
        "stargazers_count": 3,
        "forks_count": 1,
        "open_issues_count": 2,
        "topics": ["demo"]
    })
}

pub async fn mount_json(server: &MockServer, suffix: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route(suffix)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, suffix: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route(suffix)))
        .respond_with(
            ResponseTemplate::new(status).set_body_json(json!({ "message": "Not Found" })),
        )
        .mount(server)
        .await;
}

/// Mounts one page of a paginated endpoint, linking to `next_page` when given.
pub async fn mount_page(
    server: &MockServer,
    suffix: &str,
    page: u32,
    next_page: Option<u32>,
    body: serde_json::Value,
) {
    let mut response = ResponseTemplate::new(200).set_body_json(body);
    if let Some(next) = next_page {
        let link = format!(
            "<{}{}?per_page=100&page={next}>; rel=\"next\"",
            server.uri(),
            route(suffix)
        );
        response = response.insert_header("link", link.as_str());
    }

    Mock::given(method("GET"))
        .and(path(route(suffix)))
        .and(query_param("page", page.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Mounts a repository where every endpoint answers.
pub async fn mount_repository(server: &MockServer) {
    mount_json(server, "", repository_json()).await;
    mount_json(server, "/languages", json!({ "TypeScript": 80, "CSS": 20 })).await;
    mount_json(
        server,
        "/stats/contributors",
        json!([
            { "author": { "login": "alice" }, "total": 5, "weeks": [] },
            { "author": { "login": "bob" }, "total": 9, "weeks": [] }
        ]),
    )
    .await;
    mount_json(
        server,
        "/stats/commit_activity",
        json!([{ "days": [0, 1, 0, 0, 2, 0, 0], "total": 3, "week": 1704585600 }]),
    )
    .await;
    mount_json(
        server,
        "/contents",
        json!([
            { "name": "index.js", "path": "index.js", "type": "file", "size": 40 },
            { "name": "README.md", "path": "README.md", "type": "file", "size": 12 },
            { "name": "src", "path": "src", "type": "dir", "size": 0 },
            { "name": "broken.js", "path": "broken.js", "type": "file", "size": 5 }
        ]),
    )
    .await;
    mount_json(
        server,
        "/contents/index.js",
        json!({ "name": "index.js", "content": INDEX_JS_BASE64, "encoding": "base64" }),
    )
    .await;
    mount_page(
        server,
        "/pulls",
        1,
        None,
        json!([
            {
                "number": 1,
                "title": "Add feature",
                "state": "closed",
                "created_at": "2024-01-01T00:00:00Z",
                "closed_at": "2024-01-03T00:00:00Z",
                "merged_at": "2024-01-03T00:00:00Z"
            },
            {
                "number": 2,
                "title": "Work in progress",
                "state": "open",
                "created_at": "2024-01-02T00:00:00Z",
                "closed_at": null,
                "merged_at": null
            }
        ]),
    )
    .await;
    mount_page(
        server,
        "/stargazers",
        1,
        Some(2),
        json!([
            { "starred_at": "2024-02-01T10:00:00Z", "user": { "login": "x" } },
            { "starred_at": "2024-02-01T12:00:00Z", "user": { "login": "y" } }
        ]),
    )
    .await;
    mount_page(
        server,
        "/stargazers",
        2,
        None,
        json!([{ "starred_at": "2024-02-03T00:00:00Z", "user": { "login": "z" } }]),
    )
    .await;
    mount_page(
        server,
        "/forks",
        1,
        None,
        json!([{ "full_name": "fork/hello", "created_at": "2024-03-01T08:00:00Z" }]),
    )
    .await;
}

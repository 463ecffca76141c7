//! End-to-end MCP sessions against a mocked Azure DevOps organization.

mod common;

use common::*;
use httpmock::prelude::*;
use serde_json::{json, Value};

fn pr_args() -> Value {
    json!({"repositoryId": "api", "pullRequestId": 17, "projectId": "web"})
}

#[tokio::test]
async fn test_initialize_and_list_tools() {
    let server = MockServer::start();

    let responses = run_session(
        &server,
        &[
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": {"name": "e2e", "version": "1.0"}
            }}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ],
    )
    .await;

    assert_eq!(responses.len(), 2);
    let init = responses[0].result.as_ref().unwrap();
    assert_eq!(init["serverInfo"]["name"], "azdo-mcp");

    let tools = responses[1].result.as_ref().unwrap()["tools"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(tools.len(), 8);
    assert!(tools
        .iter()
        .all(|t| t["inputSchema"]["type"] == "object" && t["description"].is_string()));
}

#[tokio::test]
async fn test_get_pull_request() {
    let server = MockServer::start();
    mock_connection_check(&server);
    server.mock(|when, then| {
        when.method(GET)
            .path(pr_path("web", "api", 17, ""))
            .query_param("api-version", "7.1");
        then.status(200).json_body(fixture("pull_request"));
    });

    let responses = run_session(&server, &[tool_call(1, "get_pull_request", pr_args())]).await;

    let pr: Value = serde_json::from_str(&result_text(&responses[0])).unwrap();
    assert_eq!(pr["title"], "Add LRU cache");
    assert_eq!(pr["createdBy"]["uniqueName"], "sam@contoso.com");
    assert_eq!(pr["mergeStatus"], "succeeded");
}

#[tokio::test]
async fn test_list_pr_comments_from_fixture() {
    let server = MockServer::start();
    mock_connection_check(&server);
    server.mock(|when, then| {
        when.method(GET).path(pr_path("web", "api", 17, "/threads"));
        then.status(200).json_body(fixture("threads"));
    });

    let responses = run_session(&server, &[tool_call(1, "list_pr_comments", pr_args())]).await;

    let comments: Value = serde_json::from_str(&result_text(&responses[0])).unwrap();
    let comments = comments.as_array().unwrap();

    // System thread and the thread with a null PR context are dropped
    assert_eq!(comments.len(), 2);

    let first = &comments[0];
    assert_eq!(first["threadId"], 11);
    assert_eq!(first["filePath"], "/src/cache/mod.rs");
    assert_eq!(
        first["location"],
        json!({"startLine": 42, "endLine": 44, "startOffset": 5, "endOffset": 18})
    );
    assert_eq!(first["status"], "Active");
    assert_eq!(first["author"], "Dana Reviewer");

    let reply = &first["replies"][0];
    assert_eq!(reply["commentId"], 2);
    assert_eq!(reply["parentCommentId"], 1);
    assert_eq!(reply["replies"][0]["content"], "Thanks!");

    assert_eq!(comments[1]["threadId"], 12);
    assert_eq!(comments[1]["status"], "Fixed");
    assert_eq!(comments[1]["replies"], json!([]));
}

#[tokio::test]
async fn test_get_pr_files_uses_latest_iteration() {
    let server = MockServer::start();
    mock_connection_check(&server);
    server.mock(|when, then| {
        when.method(GET).path(pr_path("web", "api", 17, "/iterations"));
        then.status(200).json_body(fixture("iterations"));
    });
    let changes = server.mock(|when, then| {
        when.method(GET)
            .path(pr_path("web", "api", 17, "/iterations/2/changes"))
            .query_param("$compareTo", "1");
        then.status(200).json_body(fixture("changes"));
    });

    let mut args = pr_args();
    args["compareTo"] = json!("1");
    let responses = run_session(&server, &[tool_call(1, "get_pr_files", args)]).await;

    changes.assert();
    let files: Value = serde_json::from_str(&result_text(&responses[0])).unwrap();
    let paths: Vec<&str> = files
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["item"]["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["/src/cache/mod.rs", "/src/cache/lru.rs"]);
}

#[tokio::test]
async fn test_reply_returns_updated_thread() {
    let server = MockServer::start();
    mock_connection_check(&server);
    let post = server.mock(|when, then| {
        when.method(POST)
            .path(pr_path("web", "api", 17, "/threads/12/comments"))
            .json_body(json!({"content": "Fixed in d4e5f6", "parentCommentId": 1, "commentType": "text"}));
        then.status(200).json_body(json!({
            "id": 2, "parentCommentId": 1, "content": "Fixed in d4e5f6"
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path(pr_path("web", "api", 17, "/threads/12"));
        then.status(200).json_body(json!({
            "id": 12,
            "status": "fixed",
            "comments": [
                {"id": 1, "parentCommentId": 0, "content": "Typo: recieve"},
                {"id": 2, "parentCommentId": 1, "content": "Fixed in d4e5f6"}
            ]
        }));
    });

    let mut args = pr_args();
    args["threadId"] = json!(12);
    args["content"] = json!("Fixed in d4e5f6");
    args["parentCommentId"] = json!(1);
    let responses = run_session(&server, &[tool_call(1, "reply_to_pr_comment", args)]).await;

    post.assert();
    let thread: Value = serde_json::from_str(&result_text(&responses[0])).unwrap();
    assert_eq!(thread["id"], 12);
    assert_eq!(thread["comments"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_thread_status_not_found() {
    let server = MockServer::start();
    mock_connection_check(&server);
    server.mock(|when, then| {
        when.method(PATCH)
            .path(pr_path("web", "api", 17, "/threads/99"))
            .json_body(json!({"status": "closed"}));
        then.status(404).json_body(json!({"message": "TF401181: thread not found"}));
    });

    let mut args = pr_args();
    args["threadId"] = json!(99);
    args["status"] = json!("Closed");
    let responses = run_session(&server, &[tool_call(1, "update_pr_thread_status", args)]).await;

    let result = tool_result(&responses[0]);
    assert_eq!(result.is_error, Some(true));
    assert_eq!(
        result.first_text().unwrap(),
        "Not Found: Thread 99 not found in pull request 17"
    );
}

#[tokio::test]
async fn test_rejected_token() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{}/_apis/projects", ORG));
        then.status(401).body("TF400813: The user is not authorized");
    });
    let threads = server.mock(|when, then| {
        when.method(GET).path(pr_path("web", "api", 17, "/threads"));
        then.status(200).json_body(json!({"value": []}));
    });

    let responses = run_session(&server, &[tool_call(1, "list_pr_comments", pr_args())]).await;

    threads.assert_hits(0);
    let text = result_text(&responses[0]);
    assert!(text.starts_with("Authentication Failed: Failed to authenticate with Azure DevOps: "));
    assert!(text.contains("TF400813"));
}

#[tokio::test]
async fn test_provider_failure_is_wrapped() {
    let server = MockServer::start();
    mock_connection_check(&server);
    server.mock(|when, then| {
        when.method(GET).path(format!("{}/web/_apis/git/repositories/api/pullrequests", ORG));
        then.status(500).body("Internal Server Error");
    });

    let args = json!({"repositoryId": "api", "projectId": "web", "status": "all"});
    let responses = run_session(&server, &[tool_call(1, "list_pull_requests", args)]).await;

    assert_eq!(
        result_text(&responses[0]),
        "Error: Failed to list pull requests: API error: 500 - Internal Server Error"
    );
}

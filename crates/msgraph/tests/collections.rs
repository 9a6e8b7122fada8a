//! Dispatch, paging and delta sync against a mock Graph host.

mod common;

use common::*;
use msgraph::{
    DeltaCursor, DeltaSeed, DeltaSync, Endpoint, GraphErrorKind, Paginator, Payload, Scope,
};
use serde_json::json;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, ResponseTemplate,
};

#[tokio::test]
async fn fetch_all_follows_next_link() {
    let graph = MockGraph::start().await;
    let next = format!("{}/v1.0/users?$skiptoken=2", graph.uri());

    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param("$top", "2"))
        .and(header("Authorization", "Bearer integration-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "A"}, {"id": "B"}],
            "@odata.nextLink": next,
        })))
        .expect(1)
        .mount(&graph.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .and(query_param("$skiptoken", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "C"}],
        })))
        .expect(1)
        .mount(&graph.server)
        .await;

    let client = graph.client();
    let ids = Paginator::new(&client)
        .fetch_all_with(&Endpoint::get("users").top(2), |v| {
            Ok(v["id"].as_str().unwrap_or_default().to_string())
        })
        .await
        .unwrap();

    assert_eq!(ids, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn fetch_all_fails_when_a_later_page_fails() {
    let graph = MockGraph::start().await;
    let next = format!("{}/v1.0/groups?$skiptoken=2", graph.uri());

    Mock::given(method("GET"))
        .and(path("/v1.0/groups"))
        .and(query_param("$top", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "g1"}],
            "@odata.nextLink": next,
        })))
        .mount(&graph.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/groups"))
        .and(query_param("$skiptoken", "2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&graph.server)
        .await;

    let client = graph.client();
    let err = Paginator::new(&client)
        .fetch_all(&Endpoint::get("groups").top(1))
        .await
        .unwrap_err();
    // The 503 body is not a collection page, so the traversal stops there.
    assert_eq!(err.kind, GraphErrorKind::Serialization);
}

#[tokio::test]
async fn delta_cursor_round_trip() {
    let graph = MockGraph::start().await;
    let scope = Scope::Drive("d1".into());
    let delta_path = format!("/v1.0/{}/root/delta", scope.drive_path());
    let cursor_link = format!("{}{}?token=abc", graph.uri(), delta_path);
    let next_cursor = format!("{}{}?token=def", graph.uri(), delta_path);

    Mock::given(method("GET"))
        .and(path(delta_path.as_str()))
        .and(query_param("$select", "id,name,deleted"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "1", "name": "a.txt"}],
            "@odata.deltaLink": cursor_link,
        })))
        .expect(1)
        .mount(&graph.server)
        .await;
    Mock::given(method("GET"))
        .and(path(delta_path.as_str()))
        .and(query_param("token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "1", "deleted": {"state": "deleted"}}],
            "@odata.deltaLink": next_cursor,
        })))
        .expect(1)
        .mount(&graph.server)
        .await;

    let client = graph.client();
    let sync = DeltaSync::new(&client);

    let seed = DeltaSeed::collection(
        &format!("{}/root", scope.drive_path()),
        &["id", "name", "deleted"],
    );
    let first = sync.fetch_delta(seed).await.unwrap();
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.cursor.as_str(), cursor_link);

    // Persist and restore the cursor as a caller would.
    let stored = serde_json::to_string(&first.cursor).unwrap();
    let restored: DeltaCursor = serde_json::from_str(&stored).unwrap();

    let second = sync.fetch_delta(restored).await.unwrap();
    assert_eq!(second.items[0]["deleted"]["state"], "deleted");
    assert_eq!(second.cursor.as_str(), next_cursor);
}

#[tokio::test]
async fn in_band_error_is_raised() {
    let graph = MockGraph::start().await;
    Mock::given(method("GET"))
        .and(path("/beta/me/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("request-id", "rid-7")
                .set_body_json(json!({
                    "error": {"code": "ErrorAccessDenied", "message": "Access is denied."}
                })),
        )
        .mount(&graph.server)
        .await;

    let client = graph.client();
    let err = client
        .request(&Endpoint::get("me/events").version("beta"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, GraphErrorKind::Api);
    assert_eq!(err.code.as_deref(), Some("ErrorAccessDenied"));
    assert_eq!(err.message, "Access is denied.");
    assert_eq!(err.request_id.as_deref(), Some("rid-7"));
}

#[tokio::test]
async fn file_content_is_returned_as_bytes() {
    let graph = MockGraph::start().await;
    let content: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00];
    let scope = Scope::User("adele@contoso.com".into());

    Mock::given(method("GET"))
        .and(path(format!("/v1.0/{}/content", scope.drive_item_path("01ABC"))))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "image/png")
                .set_body_bytes(content.clone()),
        )
        .mount(&graph.server)
        .await;

    let client = graph.client();
    let payload = client
        .request(&Endpoint::get(format!(
            "{}/content",
            scope.drive_item_path("01ABC")
        )))
        .await
        .unwrap();
    assert_eq!(payload, Payload::Bytes(content));
}

#[tokio::test]
async fn raw_upload_sends_caller_content_type() {
    let graph = MockGraph::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1.0/me/drive/root:/notes.txt:/content"))
        .and(header("Content-Type", "text/plain"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "f1", "size": 5})))
        .expect(1)
        .mount(&graph.server)
        .await;

    let client = graph.client();
    let endpoint = Endpoint::put(format!("{}/root:/notes.txt:/content", Scope::Me.drive_path()))
        .raw(b"hello".to_vec())
        .content_type("text/plain");
    let created = client.request(&endpoint).await.unwrap().into_json().unwrap();
    assert_eq!(created["size"], 5);
}

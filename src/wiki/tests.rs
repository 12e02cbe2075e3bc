//! Content connector tests with HTTP mocking.

#[cfg(test)]
mod content_tests {
    use crate::config::WikiConfig;
    use crate::error::{ErrorKind, WIKI_AUTH_HINT};
    use crate::wiki::{ContentConnector, DEFAULT_LIMIT};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("me@contoso.com:token")
    const AUTH: &str = "Basic bWVAY29udG9zby5jb206dG9rZW4=";

    fn connector(uri: String) -> ContentConnector {
        ContentConnector::new(&WikiConfig {
            base_url: uri,
            user: "me@contoso.com".to_string(),
            api_token: "token".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn page_json(version: u64) -> serde_json::Value {
        json!({
            "id": "123",
            "type": "page",
            "status": "current",
            "title": "Runbook",
            "space": {"key": "OPS", "name": "Operations"},
            "version": {"number": version, "when": "2024-01-01T00:00:00.000Z"},
            "body": {
                "view": {"value": "<h1>Steps</h1><p>Restart <b>now</b></p>", "representation": "view"},
                "storage": {"value": "<h1>Steps</h1>", "representation": "storage"}
            },
            "_links": {"webui": "/spaces/OPS/pages/123"}
        })
    }

    #[tokio::test]
    async fn test_get_page_strips_view_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/rest/api/content/123"))
            .and(query_param("expand", "body.view,version,space"))
            .and(header("Authorization", AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(4)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let page = connector(mock_server.uri())
            .get_page("123", None)
            .await
            .unwrap();

        let body = page.body.unwrap();
        assert_eq!(body.view.unwrap().value, "StepsRestart now");
        assert!(body.storage.is_none());
        assert_eq!(page.version.unwrap().number, 4);
        assert_eq!(page.space.unwrap().key, "OPS");
        assert_eq!(page.extra["status"], "current");
    }

    #[tokio::test]
    async fn test_get_page_custom_expand_still_clean() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/rest/api/content/123"))
            .and(query_param("expand", "body.storage,body.view"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(1)))
            .mount(&mock_server)
            .await;

        let page = connector(mock_server.uri())
            .get_page("123", Some(&["body.storage", "body.view"][..]))
            .await
            .unwrap();

        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(
            value["body"],
            json!({"view": {"value": "StepsRestart now", "representation": "view"}})
        );
    }

    #[tokio::test]
    async fn test_get_page_without_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "9", "type": "page", "title": "Empty"})),
            )
            .mount(&mock_server)
            .await;

        let page = connector(mock_server.uri())
            .get_page("9", None)
            .await
            .unwrap();
        assert_eq!(page.body.unwrap().view.unwrap().value, "");
    }

    #[tokio::test]
    async fn test_search_passthrough() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/rest/api/content/search"))
            .and(query_param("cql", "type=page AND space=\"OPS\""))
            .and(query_param("limit", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"id": "1", "type": "page", "title": "A"},
                    {"id": "2", "type": "page", "title": "B"}
                ],
                "size": 2,
                "totalSize": 40,
                "_links": {"next": "/rest/api/content/search?cursor=abc"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = connector(mock_server.uri())
            .search("type=page AND space=\"OPS\"", DEFAULT_LIMIT)
            .await
            .unwrap();

        assert_eq!(result.size, 2);
        assert_eq!(result.total_size, 40);
        let titles: Vec<&str> = result.results.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_list_spaces() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/rest/api/space"))
            .and(query_param("limit", "25"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"key": "OPS", "name": "Operations", "type": "global"},
                    {"key": "~me", "name": "Me", "type": "personal"}
                ],
                "size": 2
            })))
            .mount(&mock_server)
            .await;

        let spaces = connector(mock_server.uri())
            .list_spaces(DEFAULT_LIMIT)
            .await
            .unwrap();

        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[1].space_type, "personal");
    }

    #[tokio::test]
    async fn test_create_page_with_parent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/wiki/rest/api/content"))
            .and(body_json(json!({
                "type": "page",
                "title": "New",
                "space": {"key": "OPS"},
                "body": {"storage": {"value": "<p>Hi</p>", "representation": "storage"}},
                "ancestors": [{"id": "100"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "555", "type": "page", "title": "New", "version": {"number": 1}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let page = connector(mock_server.uri())
            .create_page("OPS", "New", "<p>Hi</p>", Some("100"))
            .await
            .unwrap();

        assert_eq!(page.id, "555");
        assert_eq!(page.version.unwrap().number, 1);
    }

    #[tokio::test]
    async fn test_create_page_without_parent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/wiki/rest/api/content"))
            .and(body_json(json!({
                "type": "page",
                "title": "Top",
                "space": {"key": "OPS"},
                "body": {"storage": {"value": "<p>x</p>", "representation": "storage"}}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "556", "type": "page", "title": "Top"})),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let page = connector(mock_server.uri())
            .create_page("OPS", "Top", "<p>x</p>", None)
            .await
            .unwrap();
        assert_eq!(page.id, "556");
    }

    #[tokio::test]
    async fn test_update_page_bumps_version() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/rest/api/content/123"))
            .and(query_param("expand", "version,space"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(7)))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/wiki/rest/api/content/123"))
            .and(body_json(json!({
                "id": "123",
                "type": "page",
                "title": "Runbook v2",
                "space": {"key": "OPS"},
                "body": {"storage": {"value": "<p>new</p>", "representation": "storage"}},
                "version": {"number": 8}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(8)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let page = connector(mock_server.uri())
            .update_page("123", "Runbook v2", "<p>new</p>")
            .await
            .unwrap();
        assert_eq!(page.version.unwrap().number, 8);
    }

    #[tokio::test]
    async fn test_update_conflict_propagates() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(2)))
            .mount(&mock_server)
            .await;

        let conflict = r#"{"statusCode":409,"message":"Version must be incremented on update. Current version is: 4"}"#;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(409).set_body_string(conflict))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = connector(mock_server.uri())
            .update_page("123", "t", "c")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.body(), Some(conflict));
    }

    #[tokio::test]
    async fn test_auth_failures_every_operation() {
        for status in [401u16, 403] {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&mock_server)
                .await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(status))
                .mount(&mock_server)
                .await;

            let wiki = connector(mock_server.uri());
            let errors = vec![
                wiki.get_page("1", None).await.unwrap_err(),
                wiki.search("type=page", 10).await.unwrap_err(),
                wiki.list_spaces(10).await.unwrap_err(),
                wiki.create_page("K", "t", "c", None).await.unwrap_err(),
                wiki.update_page("1", "t", "c").await.unwrap_err(),
            ];

            for err in errors {
                assert_eq!(err.kind(), ErrorKind::Auth);
                assert_eq!(err.to_string(), WIKI_AUTH_HINT);
            }
        }
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = connector(mock_server.uri())
            .list_spaces(DEFAULT_LIMIT)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimit);
    }

    #[tokio::test]
    async fn test_unreachable_is_transport() {
        let err = connector("http://127.0.0.1:1".to_string())
            .get_page("1", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_non_base_url_rejected_at_construction() {
        let err = ContentConnector::new(&WikiConfig {
            base_url: "mailto:me@contoso.com".to_string(),
            user: "me@contoso.com".to_string(),
            api_token: "token".to_string(),
            timeout_secs: 5,
        })
        .err()
        .expect("mailto URL should be rejected");
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}

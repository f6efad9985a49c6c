//! Tool operations against a mocked WebUI.

mod common;

use std::io::Write;

use common::*;
use qb_mcp::tools::{definitions, ToolError};
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const HASH: &str = "8c212779b4abde7c6bc608063a0d008b7e40ce32";

async fn mount_ok(server: &MockServer, verb: &str, endpoint: &str) {
    Mock::given(method(verb))
        .and(path(format!("/api/v2/{endpoint}")))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

#[tokio::test]
async fn delete_keeps_files_by_default() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_ok(&server, "POST", "torrents/delete").await;
    let tools = tools_for(&server);

    tools
        .call("delete_torrent", json!({ "hashes": HASH }))
        .await
        .unwrap();
    tools
        .call("delete_torrent", json!({ "hashes": HASH, "delete_files": false }))
        .await
        .unwrap();
    let text = tools
        .call("delete_torrent", json!({ "hashes": HASH, "delete_files": true }))
        .await
        .unwrap();
    assert!(text.contains(HASH));

    let requests = requests_to(&server, "torrents/delete").await;
    let flags: Vec<_> = requests
        .iter()
        .map(|r| form_field(r, "deleteFiles").unwrap())
        .collect();
    assert_eq!(flags, ["false", "false", "true"]);
    assert_eq!(form_field(&requests[0], "hashes").as_deref(), Some(HASH));
}

#[tokio::test]
async fn pause_and_resume_all() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_ok(&server, "POST", "torrents/stop").await;
    mount_ok(&server, "POST", "torrents/start").await;
    let tools = tools_for(&server);

    let paused = tools
        .call("pause_torrent", json!({ "hashes": "all" }))
        .await
        .unwrap();
    let resumed = tools
        .call("resume_torrent", json!({ "hashes": "all" }))
        .await
        .unwrap();
    assert_eq!(paused, "Successfully paused all torrents");
    assert_eq!(resumed, "Successfully resumed all torrents");

    let stop = requests_to(&server, "torrents/stop").await;
    assert_eq!(form_field(&stop[0], "hashes").as_deref(), Some("all"));
    assert_eq!(requests_to(&server, "torrents/start").await.len(), 1);
}

#[tokio::test]
async fn torrent_list_is_passed_through_unmodified() {
    let fixture = include_str!("fixtures/torrents.json");
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/info"))
        .and(header("cookie", format!("SID={SID}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fixture, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let text = tools_for(&server)
        .call("get_torrent_list", json!({}))
        .await
        .unwrap();
    assert_eq!(text, fixture);

    let request = &requests_to(&server, "torrents/info").await[0];
    assert_eq!(request.url.query(), None);
}

#[tokio::test]
async fn torrent_list_filters_go_to_the_query() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/info"))
        .and(query_param("filter", "downloading"))
        .and(query_param("category", "linux"))
        .and(query_param("reverse", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let text = tools_for(&server)
        .call(
            "get_torrent_list",
            json!({ "filter": "downloading", "category": "linux", "reverse": true }),
        )
        .await
        .unwrap();
    assert_eq!(text, "[]");
}

#[tokio::test]
async fn trackers_go_out_in_one_request() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/torrents/addTrackers"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    tools_for(&server)
        .call(
            "add_trackers_to_torrent",
            json!({
                "hash": HASH,
                "urls": ["http://192.168.0.1/announce", "udp://192.168.0.1:3333/dummyAnnounce"],
            }),
        )
        .await
        .unwrap();

    let request = &requests_to(&server, "torrents/addTrackers").await[0];
    assert_eq!(form_field(request, "hash").as_deref(), Some(HASH));
    assert_eq!(
        form_field(request, "urls").as_deref(),
        Some("http://192.168.0.1/announce\nudp://192.168.0.1:3333/dummyAnnounce")
    );
}

#[tokio::test]
async fn tags_are_comma_joined() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_ok(&server, "POST", "torrents/addTags").await;

    tools_for(&server)
        .call(
            "add_torrent_tags",
            json!({ "hashes": "a|b", "tags": ["TagName1", "TagName2"] }),
        )
        .await
        .unwrap();

    let request = &requests_to(&server, "torrents/addTags").await[0];
    assert_eq!(form_field(request, "hashes").as_deref(), Some("a|b"));
    assert_eq!(
        form_field(request, "tags").as_deref(),
        Some("TagName1,TagName2")
    );
}

#[tokio::test]
async fn unlimited_global_limits_are_forwarded_as_is() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_ok(&server, "POST", "transfer/setDownloadLimit").await;
    mount_ok(&server, "POST", "transfer/setUploadLimit").await;
    let tools = tools_for(&server);

    tools
        .call("set_global_download_limit", json!({ "limit": -1 }))
        .await
        .unwrap();
    tools
        .call("set_global_upload_limit", json!({ "limit": -1 }))
        .await
        .unwrap();

    for endpoint in ["transfer/setDownloadLimit", "transfer/setUploadLimit"] {
        let request = &requests_to(&server, endpoint).await[0];
        assert_eq!(form_field(request, "limit").as_deref(), Some("-1"));
    }
}

#[tokio::test]
async fn per_torrent_limits() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_ok(&server, "POST", "torrents/setDownloadLimit").await;
    mount_ok(&server, "POST", "torrents/setUploadLimit").await;
    let tools = tools_for(&server);

    tools
        .call(
            "set_torrent_download_limit",
            json!({ "hashes": HASH, "limit": 1048576 }),
        )
        .await
        .unwrap();
    tools
        .call("set_torrent_upload_limit", json!({ "hashes": HASH, "limit": 0 }))
        .await
        .unwrap();

    let download = &requests_to(&server, "torrents/setDownloadLimit").await[0];
    assert_eq!(form_field(download, "hashes").as_deref(), Some(HASH));
    assert_eq!(form_field(download, "limit").as_deref(), Some("1048576"));
    let upload = &requests_to(&server, "torrents/setUploadLimit").await[0];
    assert_eq!(form_field(upload, "limit").as_deref(), Some("0"));
}

#[tokio::test]
async fn file_priority() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_ok(&server, "POST", "torrents/filePrio").await;

    tools_for(&server)
        .call(
            "set_file_priority",
            json!({ "hash": HASH, "file_ids": [0, 3], "priority": 7 }),
        )
        .await
        .unwrap();

    let request = &requests_to(&server, "torrents/filePrio").await[0];
    assert_eq!(form_field(request, "hash").as_deref(), Some(HASH));
    assert_eq!(form_field(request, "id").as_deref(), Some("0|3"));
    assert_eq!(form_field(request, "priority").as_deref(), Some("7"));
}

#[tokio::test]
async fn file_priority_conflict_is_reported_with_status() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/torrents/filePrio"))
        .respond_with(ResponseTemplate::new(409).set_body_string("At least one file id was not found"))
        .mount(&server)
        .await;

    let err = tools_for(&server)
        .call(
            "set_file_priority",
            json!({ "hash": HASH, "file_ids": [42], "priority": 0 }),
        )
        .await
        .unwrap_err();
    let report = err.to_json();
    assert_eq!(report["error"], "RemoteError");
    assert_eq!(report["status"], 409);
    assert_eq!(report["body"], "At least one file id was not found");
}

#[tokio::test]
async fn invalid_arguments_send_nothing() {
    let server = MockServer::start().await;
    let tools = tools_for(&server);

    let cases = [
        ("delete_torrent", json!({ "hashes": "" })),
        ("delete_torrent", json!({ "delete_files": true })),
        ("set_global_download_limit", json!({ "limit": -5 })),
        ("set_file_priority", json!({ "hash": HASH, "file_ids": [0], "priority": 2 })),
        ("add_trackers_to_torrent", json!({ "hash": HASH, "urls": [] })),
        ("add_torrent_tags", json!({ "hashes": HASH, "tags": ["a,b"] })),
        ("get_application_version", json!({ "verbose": true })),
    ];
    for (name, arguments) in cases {
        let err = tools.call(name, arguments).await.unwrap_err();
        assert!(
            matches!(err, ToolError::InvalidArguments(_)),
            "{name}: got {err:?}"
        );
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_tool() {
    let server = MockServer::start().await;
    let err = tools_for(&server)
        .call("reannounce", json!({}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "UnknownTool");
}

#[tokio::test]
async fn every_listed_tool_is_dispatched() {
    let server = MockServer::start().await;
    let tools = tools_for(&server);
    for def in definitions() {
        // unknown fields fail validation before any request is sent
        if let Err(err) = tools.call(def.name, json!({ "unexpected": 1 })).await {
            assert_ne!(err.kind(), "UnknownTool", "{}", def.name);
        }
    }
}

#[tokio::test]
async fn version_is_trimmed() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/app/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("v5.0.2\n"))
        .mount(&server)
        .await;

    let version = tools_for(&server)
        .call("get_application_version", Value::Null)
        .await
        .unwrap();
    assert_eq!(version, "v5.0.2");
}

#[tokio::test]
async fn trackers_skip_pseudo_entries() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/trackers"))
        .and(query_param("hash", HASH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"url": "** [DHT] **", "status": 2, "msg": ""},
            {"url": "** [PeX] **", "status": 2, "msg": ""},
            {"url": "** [LSD] **", "status": 2, "msg": ""},
            {"url": "udp://tracker.opentrackr.org:1337/announce", "status": 2, "msg": ""},
            {"url": "https://tracker.example.org/announce", "status": 4, "msg": "timed out"},
        ])))
        .mount(&server)
        .await;

    let text = tools_for(&server)
        .call("get_torrent_trackers", json!({ "hash": HASH }))
        .await
        .unwrap();
    let urls: Vec<String> = serde_json::from_str(&text).unwrap();
    assert_eq!(
        urls,
        [
            "udp://tracker.opentrackr.org:1337/announce",
            "https://tracker.example.org/announce"
        ]
    );
}

#[tokio::test]
async fn torrent_files_passed_through() {
    let body = r#"[{"index":0,"name":"a.mkv","priority":1,"size":1024}]"#;
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/torrents/files"))
        .and(query_param("hash", HASH))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/json"))
        .mount(&server)
        .await;

    let text = tools_for(&server)
        .call("get_torrent_files", json!({ "hash": HASH }))
        .await
        .unwrap();
    assert_eq!(text, body);
}

#[tokio::test]
async fn add_torrent_uploads_files_and_links_in_one_request() {
    let mut file = tempfile::Builder::new()
        .suffix(".torrent")
        .tempfile()
        .unwrap();
    file.write_all(b"d8:announce35:udp://tracker.example.org:1337/announcee")
        .unwrap();

    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/torrents/add"))
        .and(body_string_contains("name=\"torrents\""))
        .and(body_string_contains("udp://tracker.example.org:1337/announce"))
        .and(body_string_contains("magnet:?xt=urn:btih:284b83c9c7935002391129fd97f43db5d7cc2ba0"))
        .and(body_string_contains("name=\"category\""))
        .respond_with(ResponseTemplate::new(200).set_body_string("Ok."))
        .expect(1)
        .mount(&server)
        .await;

    let text = tools_for(&server)
        .call(
            "add_torrent",
            json!({
                "file_paths": [file.path()],
                "urls": ["magnet:?xt=urn:btih:284b83c9c7935002391129fd97f43db5d7cc2ba0"],
                "category": "linux",
            }),
        )
        .await
        .unwrap();
    assert_eq!(text, "Successfully added 2 torrent(s): Ok.");
}

#[tokio::test]
async fn add_torrent_missing_file() {
    let server = MockServer::start().await;
    let err = tools_for(&server)
        .call(
            "add_torrent",
            json!({ "file_paths": ["/nonexistent/never.torrent"] }),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "IoError");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn add_torrent_rejected_file() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/torrents/add"))
        .respond_with(ResponseTemplate::new(415).set_body_string("Torrent file is not valid"))
        .mount(&server)
        .await;

    let err = tools_for(&server)
        .call("add_torrent", json!({ "urls": ["http://example.org/x.torrent"] }))
        .await
        .unwrap_err();
    assert_eq!(err.to_json()["status"], 415);
}

fn search_result(name: &str, size: i64, seeders: i64) -> Value {
    json!({
        "fileName": name,
        "fileSize": size,
        "fileUrl": format!("magnet:?dn={name}"),
        "nbLeechers": 1,
        "nbSeeders": seeders,
        "siteUrl": "https://example.org",
    })
}

#[tokio::test]
async fn search_polls_until_stopped() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/search/start"))
        .and(body_string_contains("pattern=debian"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 12})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/search/results"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "Running", "results": [], "total": 0})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/search/results"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Stopped",
            "results": [
                search_result("netinst", 700 << 20, 50),
                search_result("dvd-full", 20 << 30, 500),
                search_result("live", 3 << 30, 120),
            ],
            "total": 3,
        })))
        .mount(&server)
        .await;

    let text = tools_for(&server)
        .call("search_torrents", json!({ "pattern": "debian" }))
        .await
        .unwrap();
    let summary: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(summary["search_id"], 12);
    assert_eq!(summary["total_results"], 3);
    assert_eq!(summary["filtered_results"], 2);
    assert_eq!(summary["results"][0]["fileName"], "live");
    assert_eq!(summary["results"][1]["fileName"], "netinst");
    assert_eq!(requests_to(&server, "search/results").await.len(), 2);
}

#[tokio::test]
async fn search_without_results_times_out() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/v2/search/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/search/results"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "Running", "results": [], "total": 0})),
        )
        .expect(3)
        .mount(&server)
        .await;

    let err = tools_for(&server)
        .call("search_torrents", json!({ "pattern": "nothing" }))
        .await
        .unwrap_err();
    let report = err.to_json();
    assert_eq!(report["error"], "SearchTimeout");
    assert_eq!(report["search_id"], 7);
    assert_eq!(report["search_status"], "Running");
    assert!(report.get("status").is_none());
}

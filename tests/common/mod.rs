#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use qb_mcp::{config::SearchConfig, QbClient, Tools};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const SID: &str = "oz7Ri5xbyJjdNMpv4OZ4zN2eU1zeXkxe";

pub fn login_ok(sid: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", format!("SID={sid}; HttpOnly; SameSite=Strict; path=/").as_str())
        .set_body_string("Ok.")
}

/// Mounts a login endpoint handing out [`SID`], expected to be hit `times` times.
pub async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v2/auth/login"))
        .respond_with(login_ok(SID))
        .expect(times)
        .mount(server)
        .await;
}

pub fn client_for(server: &MockServer) -> Arc<QbClient> {
    let client = QbClient::new(
        server.uri(),
        "admin",
        "adminadmin",
        Duration::from_secs(5),
    )
    .unwrap();
    Arc::new(client)
}

pub fn tools_for(server: &MockServer) -> Tools {
    Tools::new(
        client_for(server),
        SearchConfig {
            max_polls: 3,
            poll_interval_ms: 0,
            settle_polls: 2,
        },
    )
}

/// Requests received for `endpoint`, e.g. `torrents/delete`.
pub async fn requests_to(server: &MockServer, endpoint: &str) -> Vec<wiremock::Request> {
    let path = format!("/api/v2/{endpoint}");
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.url.path() == path)
        .collect()
}

/// Decoded `application/x-www-form-urlencoded` field of a request body.
pub fn form_field(request: &wiremock::Request, name: &str) -> Option<String> {
    url::form_urlencoded::parse(&request.body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

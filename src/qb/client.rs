use super::{
    error::is_auth_failure,
    request::{ApiRequest, ApiResponse, Body},
    Error, Result,
};
use reqwest::{header, multipart, Client};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

const SID_COOKIE: &str = "SID";

#[derive(Debug, Default)]
struct Session {
    established: bool,
    /// A server with auth bypass for the caller's subnet logs in without a cookie.
    sid: Option<String>,
    /// Bumped on every login, lets concurrent callers tell whether someone
    /// already renewed the session they saw rejected.
    generation: u64,
}

/// Session-authenticated client for the qBittorrent WebUI API.
///
/// Logs in lazily on the first call and once more whenever the server
/// rejects the session.
pub struct QbClient {
    inner: Client,
    base_url: Arc<str>,
    username: String,
    password: String,
    session: Mutex<Session>,
}

impl QbClient {
    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/v2/{}", self.base_url, endpoint)
    }

    pub fn new(
        base_url: impl Into<Arc<str>>,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-cache"),
        );
        let client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(Error::Request)?;
        let base_url: Arc<str> = base_url.into();
        Ok(Self {
            inner: client,
            base_url: base_url.trim_end_matches('/').into(),
            username: username.to_string(),
            password: password.to_string(),
            session: Mutex::new(Session::default()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Logs in unconditionally, replacing any current session.
    pub async fn login(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        self.login_locked(&mut session).await
    }

    async fn login_locked(&self, session: &mut Session) -> Result<()> {
        let url = self.url("auth/login");
        debug!("POST {url}");
        let resp = self
            .inner
            .post(&url)
            .form(&[("username", &self.username), ("password", &self.password)])
            .send()
            .await
            .map_err(Error::Connection)?;
        let status = resp.status();
        let sid = resp
            .cookies()
            .find(|cookie| cookie.name() == SID_COOKIE)
            .map(|cookie| cookie.value().to_string());
        let body = resp.text().await.map_err(Error::Connection)?;

        if is_auth_failure(status) {
            return Err(Error::Auth(format!("login rejected, status: {status}")));
        }
        if !status.is_success() {
            return Err(Error::remote(status, body));
        }
        // bad credentials still come back as 200
        if body.trim() == "Fails." {
            return Err(Error::Auth("invalid username or password".to_string()));
        }

        session.established = true;
        session.sid = sid;
        session.generation += 1;
        info!("logged in to {}", self.base_url);
        Ok(())
    }

    /// Current cookie and generation, logging in first if no session exists yet.
    async fn ensure_session(&self) -> Result<(Option<String>, u64)> {
        let mut session = self.session.lock().await;
        if !session.established {
            self.login_locked(&mut session).await?;
        }
        Ok((session.sid.clone(), session.generation))
    }

    /// Logs in again unless another caller already replaced the rejected session.
    async fn renew_session(&self, rejected: u64) -> Result<Option<String>> {
        let mut session = self.session.lock().await;
        if session.generation == rejected {
            warn!("session rejected by {}, logging in again", self.base_url);
            self.login_locked(&mut session).await?;
        }
        Ok(session.sid.clone())
    }

    /// Issues one request with the session attached, re-logging in and
    /// retrying exactly once if the server rejects the session.
    pub async fn call(&self, req: &ApiRequest) -> Result<ApiResponse> {
        let (sid, generation) = self.ensure_session().await?;
        let resp = self.send(req, sid.as_deref()).await?;
        if !is_auth_failure(resp.status()) {
            return finish(resp).await;
        }

        let sid = self.renew_session(generation).await?;
        let resp = self.send(req, sid.as_deref()).await?;
        let status = resp.status();
        if is_auth_failure(status) {
            return Err(Error::Auth(format!(
                "{} still rejected after logging in again, status: {status}",
                req.endpoint
            )));
        }
        finish(resp).await
    }

    async fn send(&self, req: &ApiRequest, sid: Option<&str>) -> Result<reqwest::Response> {
        let url = self.url(req.endpoint);
        debug!("{} {url}", req.method);
        let mut builder = self.inner.request(req.method.clone(), &url);
        if let Some(sid) = sid {
            builder = builder.header(header::COOKIE, format!("{SID_COOKIE}={sid}"));
        }
        builder = match &req.body {
            Body::Empty => builder,
            Body::Query(params) => builder.query(params),
            Body::Form(params) => builder.form(params),
            Body::Multipart(parts) => {
                let mut form = multipart::Form::new();
                for (name, part) in parts {
                    form = form.part(*name, part.to_reqwest()?);
                }
                builder.multipart(form)
            }
        };
        builder.send().await.map_err(Error::Connection)
    }

    /// Ends the session on the server, if there is one.
    pub async fn logout(&self) -> Result<()> {
        let mut session = self.session.lock().await;
        if !session.established {
            return Ok(());
        }
        let sid = session.sid.take();
        session.established = false;
        let resp = self
            .send(&ApiRequest::post("auth/logout", vec![]), sid.as_deref())
            .await?;
        if resp.status().is_success() {
            info!("client log out success");
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(Error::remote(status, body))
        }
    }
}

async fn finish(resp: reqwest::Response) -> Result<ApiResponse> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Connection)?;
    if !status.is_success() {
        debug!("request failed, status: {status}, body: {body}");
        return Err(Error::remote(status, body));
    }
    Ok(ApiResponse {
        status: status.as_u16(),
        body,
    })
}

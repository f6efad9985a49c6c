use bytes::Bytes;
use reqwest::{multipart, Method};
use serde::Deserialize;

use super::{Error, Result};

const TORRENT_MIME: &str = "application/x-bittorrent";

/// One call against `/api/v2/<endpoint>`.
///
/// Kept as plain data so the client can send it a second time after a
/// re-login; a `reqwest::RequestBuilder` with a multipart body cannot be cloned.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: &'static str,
    pub body: Body,
}

#[derive(Debug, Clone)]
pub enum Body {
    Empty,
    /// Url query string, used with `GET`.
    Query(Vec<(&'static str, String)>),
    /// `application/x-www-form-urlencoded` body.
    Form(Vec<(&'static str, String)>),
    Multipart(Vec<(&'static str, Part)>),
}

#[derive(Debug, Clone)]
pub enum Part {
    Text(String),
    Torrent { file_name: String, content: Bytes },
}

impl ApiRequest {
    pub fn get(endpoint: &'static str) -> Self {
        Self {
            method: Method::GET,
            endpoint,
            body: Body::Empty,
        }
    }

    pub fn get_with(endpoint: &'static str, query: Vec<(&'static str, String)>) -> Self {
        Self {
            method: Method::GET,
            endpoint,
            body: Body::Query(query),
        }
    }

    pub fn post(endpoint: &'static str, form: Vec<(&'static str, String)>) -> Self {
        Self {
            method: Method::POST,
            endpoint,
            body: Body::Form(form),
        }
    }

    #[cfg(test)]
    fn param(&self, name: &str) -> Option<&str> {
        match &self.body {
            Body::Query(params) | Body::Form(params) => params
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str()),
            Body::Multipart(parts) => parts.iter().find_map(|(key, part)| match part {
                Part::Text(value) if *key == name => Some(value.as_str()),
                _ => None,
            }),
            Body::Empty => None,
        }
    }
}

impl Part {
    pub(crate) fn to_reqwest(&self) -> Result<multipart::Part> {
        match self {
            Part::Text(text) => Ok(multipart::Part::text(text.clone())),
            Part::Torrent { file_name, content } => multipart::Part::stream(content.clone())
                .file_name(file_name.clone())
                .mime_str(TORRENT_MIME)
                .map_err(Error::Request),
        }
    }
}

/// Parameters of `torrents/add`.
#[derive(Debug, Default)]
pub struct AddTorrentRequest {
    pub urls: Vec<String>,
    /// `(file name, .torrent content)`
    pub torrents: Vec<(String, Bytes)>,
    pub savepath: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub rename: Option<String>,
    pub paused: Option<bool>,
    pub skip_checking: Option<bool>,
    pub auto_torrent_management: Option<bool>,
}

impl From<AddTorrentRequest> for ApiRequest {
    fn from(req: AddTorrentRequest) -> Self {
        let mut parts = vec![];
        if !req.urls.is_empty() {
            parts.push(("urls", Part::Text(req.urls.join("\n"))));
        }
        for (file_name, content) in req.torrents {
            parts.push(("torrents", Part::Torrent { file_name, content }));
        }
        if let Some(savepath) = req.savepath {
            parts.push(("savepath", Part::Text(savepath)));
        }
        if let Some(category) = req.category {
            parts.push(("category", Part::Text(category)));
        }
        if !req.tags.is_empty() {
            parts.push(("tags", Part::Text(req.tags.join(","))));
        }
        if let Some(rename) = req.rename {
            parts.push(("rename", Part::Text(rename)));
        }
        // qBittorrent 5 renamed `paused` to `stopped`, older versions ignore the unknown field
        if let Some(paused) = req.paused {
            parts.push(("paused", Part::Text(paused.to_string())));
            parts.push(("stopped", Part::Text(paused.to_string())));
        }
        if let Some(skip_checking) = req.skip_checking {
            parts.push(("skip_checking", Part::Text(skip_checking.to_string())));
        }
        if let Some(auto_torrent_management) = req.auto_torrent_management {
            parts.push(("autoTMM", Part::Text(auto_torrent_management.to_string())));
        }
        Self {
            method: Method::POST,
            endpoint: "torrents/add",
            body: Body::Multipart(parts),
        }
    }
}

/// Raw answer of a successful call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Entry of `torrents/trackers`.
#[derive(Debug, Deserialize)]
pub struct Tracker {
    pub url: String,
}

impl Tracker {
    /// DHT, PeX and LSD are listed as `** [DHT] **` and so on.
    pub fn is_pseudo(&self) -> bool {
        self.url.starts_with("** [")
    }
}

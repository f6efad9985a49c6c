//! Named tool operations, each forwarding to one WebUI endpoint.

use std::{path::Path, sync::Arc};

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::{
    config::SearchConfig,
    qb::{self, request::Tracker, AddTorrentRequest, ApiRequest, QbClient},
};

pub mod args;
mod definitions;
mod search;

use args::*;
pub use definitions::{definitions, ToolDefinition};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Qb(#[from] qb::Error),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("search {search_id} returned no results in time, last status: {status:?}")]
    SearchTimeout {
        search_id: i64,
        status: Option<String>,
    },
}

impl ToolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Qb(e) => e.kind(),
            Self::InvalidArguments(_) => "InvalidArguments",
            Self::UnknownTool(_) => "UnknownTool",
            Self::Io { .. } => "IoError",
            Self::SearchTimeout { .. } => "SearchTimeout",
        }
    }

    /// Structured failure reported to the caller.
    pub fn to_json(&self) -> Value {
        let mut value = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        match self {
            Self::Qb(qb::Error::Remote { status, body }) => {
                value["status"] = json!(status);
                value["body"] = json!(body);
            }
            Self::SearchTimeout { search_id, status } => {
                value["search_id"] = json!(search_id);
                value["search_status"] = json!(status);
            }
            _ => {}
        }
        value
    }
}

pub(crate) fn parse_args<T: DeserializeOwned + Validate>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Default::default()),
        other => other,
    };
    let args: T = serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;
    args.validate()?;
    Ok(args)
}

/// The tool surface over one shared client.
pub struct Tools {
    client: Arc<QbClient>,
    search: SearchConfig,
}

impl Tools {
    pub fn new(client: Arc<QbClient>, search: SearchConfig) -> Self {
        Self { client, search }
    }

    /// Dispatches a tool call by name. The returned text goes to the caller as is.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        match name {
            "add_torrent" => self.add_torrent(parse_args(arguments)?).await,
            "delete_torrent" => self.delete_torrent(parse_args(arguments)?).await,
            "pause_torrent" => self.pause_torrent(parse_args(arguments)?).await,
            "resume_torrent" => self.resume_torrent(parse_args(arguments)?).await,
            "get_torrent_list" => self.get_torrent_list(parse_args(arguments)?).await,
            "search_torrents" => self.search_torrents(parse_args(arguments)?).await,
            "get_torrent_trackers" => self.get_torrent_trackers(parse_args(arguments)?).await,
            "get_torrent_files" => self.get_torrent_files(parse_args(arguments)?).await,
            "add_trackers_to_torrent" => {
                self.add_trackers_to_torrent(parse_args(arguments)?).await
            }
            "add_torrent_tags" => self.add_torrent_tags(parse_args(arguments)?).await,
            "set_global_download_limit" => {
                self.set_global_download_limit(parse_args(arguments)?).await
            }
            "set_global_upload_limit" => self.set_global_upload_limit(parse_args(arguments)?).await,
            "set_torrent_download_limit" => {
                self.set_torrent_download_limit(parse_args(arguments)?).await
            }
            "set_torrent_upload_limit" => {
                self.set_torrent_upload_limit(parse_args(arguments)?).await
            }
            "set_file_priority" => self.set_file_priority(parse_args(arguments)?).await,
            "get_application_version" => {
                parse_args::<NoArgs>(arguments)?;
                self.get_application_version().await
            }
            _ => Err(ToolError::UnknownTool(name.to_string())),
        }
    }

    pub async fn add_torrent(&self, args: AddTorrentArgs) -> Result<String, ToolError> {
        let mut torrents = vec![];
        for path in &args.file_paths {
            let content = tokio::fs::read(path).await.map_err(|source| ToolError::Io {
                path: path.clone(),
                source,
            })?;
            let file_name = Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload.torrent".to_string());
            torrents.push((file_name, Bytes::from(content)));
        }
        let count = torrents.len() + args.urls.len();
        let req = AddTorrentRequest {
            urls: args.urls,
            torrents,
            savepath: args.savepath,
            category: args.category,
            tags: args.tags,
            rename: args.rename,
            paused: args.paused,
            skip_checking: args.skip_checking,
            auto_torrent_management: args.auto_tmm,
        };
        let resp = self.client.call(&req.into()).await?;
        info!("add torrent success, {count} sources");
        let body = resp.body.trim();
        if body.is_empty() {
            Ok(format!("Successfully added {count} torrent(s)"))
        } else {
            Ok(format!("Successfully added {count} torrent(s): {body}"))
        }
    }

    pub async fn delete_torrent(&self, args: DeleteTorrentArgs) -> Result<String, ToolError> {
        self.client
            .call(&ApiRequest::post(
                "torrents/delete",
                vec![
                    ("hashes", args.hashes.clone()),
                    ("deleteFiles", args.delete_files.to_string()),
                ],
            ))
            .await?;
        Ok(done("deleted", &args.hashes))
    }

    pub async fn pause_torrent(&self, args: HashesArgs) -> Result<String, ToolError> {
        self.client
            .call(&ApiRequest::post(
                "torrents/stop",
                vec![("hashes", args.hashes.clone())],
            ))
            .await?;
        Ok(done("paused", &args.hashes))
    }

    pub async fn resume_torrent(&self, args: HashesArgs) -> Result<String, ToolError> {
        self.client
            .call(&ApiRequest::post(
                "torrents/start",
                vec![("hashes", args.hashes.clone())],
            ))
            .await?;
        Ok(done("resumed", &args.hashes))
    }

    /// Returns the server's JSON untouched.
    pub async fn get_torrent_list(&self, args: TorrentListArgs) -> Result<String, ToolError> {
        let mut query = vec![];
        if let Some(filter) = args.filter {
            query.push(("filter", filter));
        }
        if let Some(category) = args.category {
            query.push(("category", category));
        }
        if let Some(tag) = args.tag {
            query.push(("tag", tag));
        }
        if let Some(sort) = args.sort {
            query.push(("sort", sort));
        }
        if let Some(reverse) = args.reverse {
            query.push(("reverse", reverse.to_string()));
        }
        if let Some(limit) = args.limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = args.offset {
            query.push(("offset", offset.to_string()));
        }
        if let Some(hashes) = args.hashes {
            query.push(("hashes", hashes));
        }
        let req = if query.is_empty() {
            ApiRequest::get("torrents/info")
        } else {
            ApiRequest::get_with("torrents/info", query)
        };
        Ok(self.client.call(&req).await?.body)
    }

    pub async fn search_torrents(&self, args: SearchArgs) -> Result<String, ToolError> {
        let summary = search::run(&self.client, &self.search, args).await?;
        serde_json::to_string_pretty(&summary).map_err(|e| ToolError::Qb(e.into()))
    }

    /// Real tracker urls of a torrent, without the DHT/PeX/LSD entries.
    pub async fn get_torrent_trackers(&self, args: HashArgs) -> Result<String, ToolError> {
        let trackers: Vec<Tracker> = self
            .client
            .call(&ApiRequest::get_with(
                "torrents/trackers",
                vec![("hash", args.hash)],
            ))
            .await?
            .json()?;
        let urls: Vec<String> = trackers
            .into_iter()
            .filter(|t| !t.is_pseudo())
            .map(|t| t.url)
            .collect();
        Ok(json!(urls).to_string())
    }

    pub async fn get_torrent_files(&self, args: HashArgs) -> Result<String, ToolError> {
        let resp = self
            .client
            .call(&ApiRequest::get_with(
                "torrents/files",
                vec![("hash", args.hash)],
            ))
            .await?;
        Ok(resp.body)
    }

    /// All urls go out in one request, newline separated.
    pub async fn add_trackers_to_torrent(&self, args: AddTrackersArgs) -> Result<String, ToolError> {
        let urls = args.urls.join("\n");
        self.client
            .call(&ApiRequest::post(
                "torrents/addTrackers",
                vec![("hash", args.hash.clone()), ("urls", urls)],
            ))
            .await?;
        Ok(format!(
            "Successfully added {} tracker(s) to {}",
            args.urls.len(),
            args.hash
        ))
    }

    pub async fn add_torrent_tags(&self, args: AddTagsArgs) -> Result<String, ToolError> {
        let tags = args.tags.join(",");
        self.client
            .call(&ApiRequest::post(
                "torrents/addTags",
                vec![("hashes", args.hashes.clone()), ("tags", tags.clone())],
            ))
            .await?;
        Ok(format!("Successfully added tags {tags} to {}", args.hashes))
    }

    pub async fn set_global_download_limit(
        &self,
        args: GlobalLimitArgs,
    ) -> Result<String, ToolError> {
        self.client
            .call(&ApiRequest::post(
                "transfer/setDownloadLimit",
                vec![("limit", args.limit.to_string())],
            ))
            .await?;
        Ok(format!("Successfully set global download limit: {}", args.limit))
    }

    pub async fn set_global_upload_limit(&self, args: GlobalLimitArgs) -> Result<String, ToolError> {
        self.client
            .call(&ApiRequest::post(
                "transfer/setUploadLimit",
                vec![("limit", args.limit.to_string())],
            ))
            .await?;
        Ok(format!("Successfully set global upload limit: {}", args.limit))
    }

    pub async fn set_torrent_download_limit(
        &self,
        args: TorrentLimitArgs,
    ) -> Result<String, ToolError> {
        self.client
            .call(&ApiRequest::post(
                "torrents/setDownloadLimit",
                vec![
                    ("hashes", args.hashes.clone()),
                    ("limit", args.limit.to_string()),
                ],
            ))
            .await?;
        Ok(format!(
            "Successfully set download limit of {} to {}",
            args.hashes, args.limit
        ))
    }

    pub async fn set_torrent_upload_limit(
        &self,
        args: TorrentLimitArgs,
    ) -> Result<String, ToolError> {
        self.client
            .call(&ApiRequest::post(
                "torrents/setUploadLimit",
                vec![
                    ("hashes", args.hashes.clone()),
                    ("limit", args.limit.to_string()),
                ],
            ))
            .await?;
        Ok(format!(
            "Successfully set upload limit of {} to {}",
            args.hashes, args.limit
        ))
    }

    pub async fn set_file_priority(&self, args: FilePriorityArgs) -> Result<String, ToolError> {
        let ids = args
            .file_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("|");
        self.client
            .call(&ApiRequest::post(
                "torrents/filePrio",
                vec![
                    ("hash", args.hash.clone()),
                    ("id", ids.clone()),
                    ("priority", args.priority.value().to_string()),
                ],
            ))
            .await?;
        Ok(format!(
            "Successfully set priority {} on files {ids} of {}",
            args.priority.value(),
            args.hash
        ))
    }

    pub async fn get_application_version(&self) -> Result<String, ToolError> {
        let resp = self.client.call(&ApiRequest::get("app/version")).await?;
        Ok(resp.body.trim().to_string())
    }
}

fn done(action: &str, hashes: &str) -> String {
    if hashes == "all" {
        format!("Successfully {action} all torrents")
    } else {
        format!("Successfully {action} torrent(s): {hashes}")
    }
}

//! Typed arguments of every tool, checked before anything is sent.

use serde::Deserialize;

use super::ToolError;

pub trait Validate {
    fn validate(&self) -> Result<(), ToolError>;
}

fn invalid(message: impl Into<String>) -> ToolError {
    ToolError::InvalidArguments(message.into())
}

fn require_hashes(field: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(invalid(format!("`{field}` must not be empty")));
    }
    Ok(())
}

/// -1 is qBittorrent's "unlimited" and is forwarded untouched.
fn require_limit(limit: i64) -> Result<(), ToolError> {
    if limit < -1 {
        return Err(invalid(format!(
            "`limit` must be -1 (unlimited) or a byte rate >= 0, got {limit}"
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

impl Validate for NoArgs {
    fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTorrentArgs {
    /// Local `.torrent` files.
    #[serde(default)]
    pub file_paths: Vec<String>,
    /// Magnet links or http(s) links to `.torrent` files.
    #[serde(default)]
    pub urls: Vec<String>,
    pub savepath: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub rename: Option<String>,
    pub paused: Option<bool>,
    pub skip_checking: Option<bool>,
    pub auto_tmm: Option<bool>,
}

impl Validate for AddTorrentArgs {
    fn validate(&self) -> Result<(), ToolError> {
        if self.file_paths.is_empty() && self.urls.is_empty() {
            return Err(invalid("provide at least one of `file_paths` or `urls`"));
        }
        if self.file_paths.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("`file_paths` contains an empty path"));
        }
        if self.urls.iter().any(|u| u.trim().is_empty() || u.contains('\n')) {
            return Err(invalid("`urls` entries must be non-empty single lines"));
        }
        validate_tags(&self.tags, false)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashesArgs {
    /// One hash, several joined with `|`, or `all`.
    pub hashes: String,
}

impl Validate for HashesArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_hashes("hashes", &self.hashes)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteTorrentArgs {
    pub hashes: String,
    #[serde(default)]
    pub delete_files: bool,
}

impl Validate for DeleteTorrentArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_hashes("hashes", &self.hashes)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TorrentListArgs {
    /// Status filter: all, downloading, seeding, completed, stopped, active, ...
    pub filter: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: Option<String>,
    pub reverse: Option<bool>,
    pub limit: Option<u32>,
    pub offset: Option<i64>,
    pub hashes: Option<String>,
}

impl Validate for TorrentListArgs {
    fn validate(&self) -> Result<(), ToolError> {
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    pub pattern: String,
    #[serde(default = "all")]
    pub category: String,
    #[serde(default = "all")]
    pub plugins: String,
    #[serde(default = "default_max_size_gb")]
    pub max_size_gb: f64,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: i64,
}

fn all() -> String {
    "all".to_string()
}

fn default_max_size_gb() -> f64 {
    5.0
}

fn default_search_limit() -> u32 {
    100
}

impl Validate for SearchArgs {
    fn validate(&self) -> Result<(), ToolError> {
        if self.pattern.trim().is_empty() {
            return Err(invalid("`pattern` must not be empty"));
        }
        if !(self.max_size_gb.is_finite() && self.max_size_gb > 0.0) {
            return Err(invalid("`max_size_gb` must be a positive number"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashArgs {
    pub hash: String,
}

impl Validate for HashArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_hashes("hash", &self.hash)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTrackersArgs {
    pub hash: String,
    pub urls: Vec<String>,
}

impl Validate for AddTrackersArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_hashes("hash", &self.hash)?;
        if self.urls.is_empty() {
            return Err(invalid("`urls` must contain at least one tracker"));
        }
        if self.urls.iter().any(|u| u.trim().is_empty() || u.contains('\n')) {
            return Err(invalid("tracker urls must be non-empty single lines"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddTagsArgs {
    pub hashes: String,
    pub tags: Vec<String>,
}

impl Validate for AddTagsArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_hashes("hashes", &self.hashes)?;
        validate_tags(&self.tags, true)
    }
}

/// Tags travel comma separated, so a comma inside one would split it.
fn validate_tags(tags: &[String], required: bool) -> Result<(), ToolError> {
    if required && tags.is_empty() {
        return Err(invalid("`tags` must contain at least one tag"));
    }
    if tags.iter().any(|t| t.trim().is_empty() || t.contains(',')) {
        return Err(invalid("tags must be non-empty and must not contain commas"));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalLimitArgs {
    /// Bytes per second.
    pub limit: i64,
}

impl Validate for GlobalLimitArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_limit(self.limit)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TorrentLimitArgs {
    pub hashes: String,
    pub limit: i64,
}

impl Validate for TorrentLimitArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_hashes("hashes", &self.hashes)?;
        require_limit(self.limit)
    }
}

/// File priorities accepted by `torrents/filePrio`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "u8")]
pub enum FilePriority {
    DoNotDownload = 0,
    Normal = 1,
    High = 6,
    Maximal = 7,
}

impl TryFrom<u8> for FilePriority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::DoNotDownload),
            1 => Ok(Self::Normal),
            6 => Ok(Self::High),
            7 => Ok(Self::Maximal),
            other => Err(format!(
                "invalid priority {other}, expected 0 (do not download), 1 (normal), 6 (high) or 7 (maximal)"
            )),
        }
    }
}

impl FilePriority {
    pub fn value(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilePriorityArgs {
    pub hash: String,
    /// Indexes into the list returned by `get_torrent_files`.
    pub file_ids: Vec<u32>,
    pub priority: FilePriority,
}

impl Validate for FilePriorityArgs {
    fn validate(&self) -> Result<(), ToolError> {
        require_hashes("hash", &self.hash)?;
        if self.file_ids.is_empty() {
            return Err(invalid("`file_ids` must contain at least one file index"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse<T: serde::de::DeserializeOwned + Validate>(
        value: serde_json::Value,
    ) -> Result<T, ToolError> {
        super::super::parse_args(value)
    }

    #[test]
    fn delete_files_defaults_to_false() {
        let args: DeleteTorrentArgs = parse(json!({"hashes": "abc"})).unwrap();
        assert!(!args.delete_files);
    }

    #[test]
    fn unknown_fields_rejected() {
        let err = parse::<HashesArgs>(json!({"hashes": "abc", "force": true})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn limits() {
        assert!(parse::<GlobalLimitArgs>(json!({"limit": -1})).is_ok());
        assert!(parse::<GlobalLimitArgs>(json!({"limit": 0})).is_ok());
        assert!(parse::<GlobalLimitArgs>(json!({"limit": -2})).is_err());
        assert!(parse::<GlobalLimitArgs>(json!({"limit": "fast"})).is_err());
    }

    #[test]
    fn priority_values() {
        let args: FilePriorityArgs =
            parse(json!({"hash": "abc", "file_ids": [0, 2], "priority": 6})).unwrap();
        assert_eq!(args.priority, FilePriority::High);
        assert_eq!(args.priority.value(), 6);
        let err = parse::<FilePriorityArgs>(json!({"hash": "abc", "file_ids": [0], "priority": 3}))
            .unwrap_err();
        assert!(err.to_string().contains("invalid priority 3"));
    }

    #[test]
    fn tags_must_not_contain_commas() {
        assert!(parse::<AddTagsArgs>(json!({"hashes": "a", "tags": ["x", "y"]})).is_ok());
        assert!(parse::<AddTagsArgs>(json!({"hashes": "a", "tags": ["x,y"]})).is_err());
        assert!(parse::<AddTagsArgs>(json!({"hashes": "a", "tags": []})).is_err());
    }

    #[test]
    fn add_torrent_needs_a_source() {
        assert!(parse::<AddTorrentArgs>(json!({})).is_err());
        assert!(parse::<AddTorrentArgs>(json!({"urls": ["magnet:?xt=urn:btih:abc"]})).is_ok());
    }

    #[test]
    fn search_defaults() {
        let args: SearchArgs = parse(json!({"pattern": "debian"})).unwrap();
        assert_eq!(args.category, "all");
        assert_eq!(args.plugins, "all");
        assert_eq!(args.max_size_gb, 5.0);
        assert_eq!(args.limit, 100);
        assert_eq!(args.offset, 0);
    }
}

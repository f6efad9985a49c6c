use serde::Serialize;
use serde_json::{json, Value};

/// Entry of the `tools/list` answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

fn tool(name: &'static str, description: &'static str, input_schema: Value) -> ToolDefinition {
    ToolDefinition {
        name,
        description,
        input_schema,
    }
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn hashes_property() -> Value {
    json!({
        "type": "string",
        "description": "Torrent hash, several hashes separated by |, or `all`",
    })
}

fn hash_property() -> Value {
    json!({"type": "string", "description": "Torrent hash"})
}

fn limit_property() -> Value {
    json!({
        "type": "integer",
        "minimum": -1,
        "description": "Speed limit in bytes/second, -1 for unlimited",
    })
}

/// Every tool exposed to callers, in a stable order.
pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        tool(
            "add_torrent",
            "Add torrents from local .torrent files and/or magnet links",
            object(
                json!({
                    "file_paths": {"type": "array", "items": {"type": "string"}, "description": "Paths of local .torrent files"},
                    "urls": {"type": "array", "items": {"type": "string"}, "description": "Magnet links or urls of .torrent files"},
                    "savepath": {"type": "string"},
                    "category": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "rename": {"type": "string"},
                    "paused": {"type": "boolean"},
                    "skip_checking": {"type": "boolean"},
                    "auto_tmm": {"type": "boolean", "description": "Use automatic torrent management"},
                }),
                &[],
            ),
        ),
        tool(
            "delete_torrent",
            "Delete torrents, optionally with their downloaded files",
            object(
                json!({
                    "hashes": hashes_property(),
                    "delete_files": {"type": "boolean", "default": false},
                }),
                &["hashes"],
            ),
        ),
        tool(
            "pause_torrent",
            "Pause (stop) torrents",
            object(json!({"hashes": hashes_property()}), &["hashes"]),
        ),
        tool(
            "resume_torrent",
            "Resume (start) torrents",
            object(json!({"hashes": hashes_property()}), &["hashes"]),
        ),
        tool(
            "get_torrent_list",
            "List torrents, optionally filtered by status, category or tag",
            object(
                json!({
                    "filter": {
                        "type": "string",
                        "enum": ["all", "downloading", "seeding", "completed", "stopped", "paused", "active", "inactive", "resumed", "running", "stalled", "stalled_uploading", "stalled_downloading", "errored"],
                    },
                    "category": {"type": "string"},
                    "tag": {"type": "string"},
                    "sort": {"type": "string", "description": "Torrent property to sort by"},
                    "reverse": {"type": "boolean"},
                    "limit": {"type": "integer", "minimum": 0},
                    "offset": {"type": "integer"},
                    "hashes": hashes_property(),
                }),
                &[],
            ),
        ),
        tool(
            "search_torrents",
            "Search torrents with the installed search plugins, returns the 10 best seeded results",
            object(
                json!({
                    "pattern": {"type": "string"},
                    "category": {"type": "string", "default": "all", "description": "all, movies, tv, music, games, anime, software, books"},
                    "plugins": {"type": "string", "default": "all"},
                    "max_size_gb": {"type": "number", "default": 5.0},
                    "limit": {"type": "integer", "default": 100, "minimum": 0},
                    "offset": {"type": "integer", "default": 0},
                }),
                &["pattern"],
            ),
        ),
        tool(
            "get_torrent_trackers",
            "Get the tracker urls of a torrent",
            object(json!({"hash": hash_property()}), &["hash"]),
        ),
        tool(
            "get_torrent_files",
            "Get the files of a torrent, their index is the file id used by set_file_priority",
            object(json!({"hash": hash_property()}), &["hash"]),
        ),
        tool(
            "add_trackers_to_torrent",
            "Add tracker urls to a torrent",
            object(
                json!({
                    "hash": hash_property(),
                    "urls": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                }),
                &["hash", "urls"],
            ),
        ),
        tool(
            "add_torrent_tags",
            "Add tags to torrents",
            object(
                json!({
                    "hashes": hashes_property(),
                    "tags": {"type": "array", "items": {"type": "string"}, "minItems": 1},
                }),
                &["hashes", "tags"],
            ),
        ),
        tool(
            "set_global_download_limit",
            "Set the global download speed limit",
            object(json!({"limit": limit_property()}), &["limit"]),
        ),
        tool(
            "set_global_upload_limit",
            "Set the global upload speed limit",
            object(json!({"limit": limit_property()}), &["limit"]),
        ),
        tool(
            "set_torrent_download_limit",
            "Set the download speed limit of torrents",
            object(
                json!({"hashes": hashes_property(), "limit": limit_property()}),
                &["hashes", "limit"],
            ),
        ),
        tool(
            "set_torrent_upload_limit",
            "Set the upload speed limit of torrents",
            object(
                json!({"hashes": hashes_property(), "limit": limit_property()}),
                &["hashes", "limit"],
            ),
        ),
        tool(
            "set_file_priority",
            "Set the download priority of files inside a torrent",
            object(
                json!({
                    "hash": hash_property(),
                    "file_ids": {"type": "array", "items": {"type": "integer", "minimum": 0}, "minItems": 1},
                    "priority": {
                        "type": "integer",
                        "enum": [0, 1, 6, 7],
                        "description": "0 do not download, 1 normal, 6 high, 7 maximal",
                    },
                }),
                &["hash", "file_ids", "priority"],
            ),
        ),
        tool(
            "get_application_version",
            "Get the qBittorrent version",
            object(json!({}), &[]),
        ),
    ]
}

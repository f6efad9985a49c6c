use serde::Deserialize;
use serde_json::{json, Value};

use super::{args::SearchArgs, ToolError};
use crate::{
    config::SearchConfig,
    qb::{ApiRequest, QbClient},
};

const TOP_RESULTS: usize = 10;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Deserialize)]
struct SearchStarted {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    status: String,
    #[serde(default)]
    results: Vec<Value>,
}

/// Starts a plugin search and polls until it stops, or settles with
/// results, or the poll budget runs out.
pub(super) async fn run(
    client: &QbClient,
    config: &SearchConfig,
    args: SearchArgs,
) -> Result<Value, ToolError> {
    let started: SearchStarted = client
        .call(&ApiRequest::post(
            "search/start",
            vec![
                ("pattern", args.pattern.clone()),
                ("category", args.category.clone()),
                ("plugins", args.plugins.clone()),
            ],
        ))
        .await?
        .json()?;
    let search_id = started.id;
    info!("search {search_id} started for {:?}", args.pattern);

    let mut torrents = vec![];
    let mut status = None;
    for attempt in 1..=config.max_polls {
        let results: SearchResults = client
            .call(&ApiRequest::post(
                "search/results",
                vec![
                    ("id", search_id.to_string()),
                    ("limit", args.limit.to_string()),
                    ("offset", args.offset.to_string()),
                ],
            ))
            .await?
            .json()?;
        debug!(
            "search {search_id} poll {attempt}: {} with {} results",
            results.status,
            results.results.len()
        );
        let stopped = results.status == "Stopped";
        torrents = results.results;
        status = Some(results.status);
        if stopped || (!torrents.is_empty() && attempt >= config.settle_polls) {
            break;
        }
        if attempt < config.max_polls {
            tokio::time::sleep(config.poll_interval()).await;
        }
    }

    if torrents.is_empty() && status.as_deref() != Some("Stopped") {
        return Err(ToolError::SearchTimeout { search_id, status });
    }

    let total_results = torrents.len();
    let results = top_results(torrents, args.max_size_gb);
    Ok(json!({
        "search_id": search_id,
        "pattern": args.pattern,
        "total_results": total_results,
        "filtered_results": results.filtered,
        "results": results.top,
    }))
}

struct Ranked {
    filtered: usize,
    top: Vec<Value>,
}

/// Drops results larger than `max_size_gb` and keeps the best seeded ones.
fn top_results(torrents: Vec<Value>, max_size_gb: f64) -> Ranked {
    let max_size = max_size_gb * GIB;
    let mut kept: Vec<Value> = torrents
        .into_iter()
        .filter(|t| number(t, "fileSize") <= max_size)
        .collect();
    let filtered = kept.len();
    kept.sort_by(|a, b| number(b, "nbSeeders").total_cmp(&number(a, "nbSeeders")));
    kept.truncate(TOP_RESULTS);
    Ranked { filtered, top: kept }
}

fn number(torrent: &Value, key: &str) -> f64 {
    torrent.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

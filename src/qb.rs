//! Client for the qBittorrent WebUI API (`/api/v2`).

mod client;
mod error;
pub mod request;

pub use client::QbClient;
pub use error::{Error, Result};
pub use request::{AddTorrentRequest, ApiRequest, ApiResponse};

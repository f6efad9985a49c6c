use reqwest::StatusCode;

/// Failures surfaced by [`QbClient`](super::QbClient).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Host unreachable, connection reset or request timed out.
    #[error("cannot reach qBittorrent: {0}")]
    Connection(#[source] reqwest::Error),
    /// Bad credentials, or the session was rejected again right after a fresh login.
    #[error("authentication failed: {0}")]
    Auth(String),
    /// Any other non-2xx answer.
    #[error("qBittorrent answered {status}: {body}")]
    Remote { status: u16, body: String },
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("cannot build request: {0}")]
    Request(#[source] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn remote(status: StatusCode, body: String) -> Self {
        Self::Remote {
            status: status.as_u16(),
            body,
        }
    }

    /// Stable name of the failure kind, reported to tool callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connection(_) => "ConnectionError",
            Self::Auth(_) => "AuthError",
            Self::Remote { .. } => "RemoteError",
            Self::Decode(_) => "DecodeError",
            Self::Request(_) => "RequestError",
        }
    }
}

/// qBittorrent answers 403 to requests without a valid session, some
/// versions and reverse proxies answer 401.
pub(crate) fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED
}

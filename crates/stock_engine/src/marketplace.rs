use async_trait::async_trait;
use stock_core::{ListingDetail, ListingId};

use crate::{CredentialBundle, FailureKind, FetchError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarketplaceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http status {status} from {url}")]
    HttpStatus { status: u16, url: String },
    #[error("malformed page {url}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("redirected away from {url}; session is not logged in")]
    NotLoggedIn { url: String },
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("selling list still had new listings after {pages} pages")]
    ListTruncated { pages: usize },
}

impl MarketplaceError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            MarketplaceError::Network(_)
            | MarketplaceError::InvalidCredentials(_)
            | MarketplaceError::InvalidUrl(_) => FailureKind::Network,
            MarketplaceError::Timeout(_) => FailureKind::Timeout,
            MarketplaceError::HttpStatus { status, .. } => FailureKind::HttpStatus(*status),
            MarketplaceError::Malformed { .. } | MarketplaceError::ListTruncated { .. } => {
                FailureKind::Malformed
            }
            MarketplaceError::NotLoggedIn { .. } => FailureKind::NotLoggedIn,
        }
    }

    pub(crate) fn into_fetch_error(self, listing_id: ListingId) -> FetchError {
        FetchError::new(listing_id, self.failure_kind(), self.to_string())
    }
}

/// An authenticated marketplace capability.
#[async_trait]
pub trait MarketplaceSession: Send + Sync {
    /// Lightweight probe: do the session credentials still work?
    async fn is_logged_in(&self) -> Result<bool, MarketplaceError>;

    async fn list_active_listing_ids(&self) -> Result<Vec<ListingId>, MarketplaceError>;

    async fn fetch_listing_detail(&self, id: &ListingId) -> Result<ListingDetail, MarketplaceError>;
}

/// Builds sessions from credential bundles.
pub trait SessionConnector: Send + Sync {
    type Session: MarketplaceSession + 'static;

    /// Fails only when the bundle cannot be turned into a session at all;
    /// validity against the remote service is checked separately.
    fn connect(&self, credentials: &CredentialBundle) -> Result<Self::Session, MarketplaceError>;
}

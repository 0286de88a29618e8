use async_trait::async_trait;
use stock_logging::{stock_info, stock_warn};

use crate::{
    CacheError, CredentialBundle, CredentialCache, MarketplaceError, MarketplaceSession,
    SessionConnector,
};

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("login was cancelled")]
    Cancelled,
    #[error("no credentials were provided")]
    Empty,
    #[error("login failed: {0}")]
    Failed(String),
}

/// Interactive source of fresh credentials.
#[async_trait]
pub trait LoginProvider: Send + Sync {
    async fn login(&self) -> Result<CredentialBundle, LoginError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Login(#[from] LoginError),
    #[error(transparent)]
    Persist(#[from] CacheError),
    #[error("fresh credentials were rejected: {0}")]
    Connect(MarketplaceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Cached credentials passed the login probe.
    Cached,
    /// Credentials came from the login provider and were written to the cache.
    FreshLogin,
}

#[derive(Debug)]
pub struct ObtainedSession<S> {
    pub session: S,
    pub origin: SessionOrigin,
}

pub struct SessionManager<C, L> {
    connector: C,
    login: L,
}

impl<C, L> SessionManager<C, L>
where
    C: SessionConnector,
    L: LoginProvider,
{
    pub fn new(connector: C, login: L) -> Self {
        Self { connector, login }
    }

    /// Returns a session that is either probe-confirmed or freshly issued.
    ///
    /// Any problem with the cached bundle (missing, unreadable, malformed,
    /// rejected, probe error) falls back to a single login. Fresh credentials
    /// are persisted before use and are not probed again.
    pub async fn obtain_session(
        &self,
        cache: &CredentialCache,
    ) -> Result<ObtainedSession<C::Session>, SessionError> {
        if let Some(session) = self.try_cached(cache).await {
            stock_info!("Reusing cached session from {:?}", cache.path());
            return Ok(ObtainedSession {
                session,
                origin: SessionOrigin::Cached,
            });
        }

        stock_info!("Requesting fresh credentials via interactive login");
        let bundle = self.login.login().await?;
        if bundle.is_empty() {
            return Err(LoginError::Empty.into());
        }
        cache.store(&bundle)?;
        let session = self
            .connector
            .connect(&bundle)
            .map_err(SessionError::Connect)?;
        Ok(ObtainedSession {
            session,
            origin: SessionOrigin::FreshLogin,
        })
    }

    async fn try_cached(&self, cache: &CredentialCache) -> Option<C::Session> {
        let bundle = match cache.load() {
            Ok(Some(bundle)) => bundle,
            Ok(None) => return None,
            Err(err) => {
                stock_warn!("Ignoring credential cache: {}", err);
                return None;
            }
        };
        let session = match self.connector.connect(&bundle) {
            Ok(session) => session,
            Err(err) => {
                stock_warn!("Cached credentials unusable: {}", err);
                return None;
            }
        };
        match session.is_logged_in().await {
            Ok(true) => Some(session),
            Ok(false) => {
                stock_info!("Cached credentials are no longer logged in");
                None
            }
            Err(err) => {
                stock_warn!("Login probe failed: {}", err);
                None
            }
        }
    }
}

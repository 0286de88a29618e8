#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use stock_core::{ListingDetail, ListingId};
use stock_engine::{
    CredentialBundle, EngineEvent, LoginError, LoginProvider, MarketplaceError,
    MarketplaceSession, ProgressSink, SessionConnector,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(stock_logging::initialize_for_tests);
}

pub fn bundle(token: &str) -> CredentialBundle {
    [("token", token)].into_iter().collect()
}

pub fn detail(title: &str, stock: u32, start_price: &str) -> ListingDetail {
    ListingDetail {
        title: title.to_string(),
        stock,
        start_price: start_price.to_string(),
    }
}

pub fn ids(count: usize) -> Vec<ListingId> {
    (0..count).map(|i| ListingId::new(format!("x{i}"))).collect()
}

/// In-memory marketplace with per-listing delays and failures.
#[derive(Default)]
pub struct FakeMarketplace {
    listings: Vec<(ListingId, ListingDetail)>,
    failing: HashSet<ListingId>,
    delays: HashMap<ListingId, Duration>,
    default_delay: Duration,
    list_error: Option<MarketplaceError>,
    fetch_calls: Mutex<Vec<ListingId>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeMarketplace {
    pub fn with_listings(count: usize) -> Self {
        let listings = ids(count)
            .into_iter()
            .enumerate()
            .map(|(i, id)| {
                let price = format!("{} 円", (i + 1) * 100);
                (id, detail(&format!("item {i}"), 1, &price))
            })
            .collect();
        Self {
            listings,
            ..Self::default()
        }
    }

    pub fn listing(mut self, id: &str, detail: ListingDetail) -> Self {
        self.listings.push((ListingId::new(id), detail));
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(ListingId::new(id));
        self
    }

    pub fn delayed(mut self, id: &str, delay: Duration) -> Self {
        self.delays.insert(ListingId::new(id), delay);
        self
    }

    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn list_error(mut self, err: MarketplaceError) -> Self {
        self.list_error = Some(err);
        self
    }

    pub fn listing_ids(&self) -> Vec<ListingId> {
        self.listings.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn fetch_calls(&self) -> Vec<ListingId> {
        self.fetch_calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketplaceSession for FakeMarketplace {
    async fn is_logged_in(&self) -> Result<bool, MarketplaceError> {
        Ok(true)
    }

    async fn list_active_listing_ids(&self) -> Result<Vec<ListingId>, MarketplaceError> {
        match &self.list_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.listing_ids()),
        }
    }

    async fn fetch_listing_detail(&self, id: &ListingId) -> Result<ListingDetail, MarketplaceError> {
        self.fetch_calls.lock().unwrap().push(id.clone());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(id).copied().unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(id) {
            return Err(MarketplaceError::HttpStatus {
                status: 500,
                url: format!("fake://{id}"),
            });
        }
        self.listings
            .iter()
            .find(|(listing, _)| listing == id)
            .map(|(_, detail)| detail.clone())
            .ok_or_else(|| MarketplaceError::Malformed {
                url: format!("fake://{id}"),
                reason: "unknown listing".into(),
            })
    }
}

/// Probe behaviour for sessions built by [`FakeConnector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Logged in exactly when the bundle equals the connector's valid bundle.
    MatchValid,
    Error,
}

pub struct FakeConnector {
    valid: CredentialBundle,
    probe: Probe,
    pub probes: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn accepting(valid: CredentialBundle) -> Self {
        Self {
            valid,
            probe: Probe::MatchValid,
            probes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn probe_errors(mut self) -> Self {
        self.probe = Probe::Error;
        self
    }
}

#[derive(Debug)]
pub struct FakeSession {
    pub credentials: CredentialBundle,
    logged_in: bool,
    probe: Probe,
    probes: Arc<AtomicUsize>,
}

#[async_trait]
impl MarketplaceSession for FakeSession {
    async fn is_logged_in(&self) -> Result<bool, MarketplaceError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match self.probe {
            Probe::MatchValid => Ok(self.logged_in),
            Probe::Error => Err(MarketplaceError::Timeout("probe".into())),
        }
    }

    async fn list_active_listing_ids(&self) -> Result<Vec<ListingId>, MarketplaceError> {
        Ok(Vec::new())
    }

    async fn fetch_listing_detail(&self, id: &ListingId) -> Result<ListingDetail, MarketplaceError> {
        Err(MarketplaceError::Malformed {
            url: id.to_string(),
            reason: "not used".into(),
        })
    }
}

impl SessionConnector for FakeConnector {
    type Session = FakeSession;

    fn connect(&self, credentials: &CredentialBundle) -> Result<FakeSession, MarketplaceError> {
        if credentials.is_empty() {
            return Err(MarketplaceError::InvalidCredentials("empty".into()));
        }
        Ok(FakeSession {
            credentials: credentials.clone(),
            logged_in: *credentials == self.valid,
            probe: self.probe,
            probes: self.probes.clone(),
        })
    }
}

pub struct FakeLogin {
    fresh: Option<CredentialBundle>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeLogin {
    pub fn issuing(fresh: CredentialBundle) -> Self {
        Self {
            fresh: Some(fresh),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            fresh: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl LoginProvider for FakeLogin {
    async fn login(&self) -> Result<CredentialBundle, LoginError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fresh.clone().ok_or(LoginError::Cancelled)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

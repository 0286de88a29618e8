use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Client, Response, StatusCode};
use scraper::{ElementRef, Html, Selector};
use stock_core::{ListingDetail, ListingId};
use stock_logging::{stock_debug, stock_trace, stock_warn};
use url::Url;

use crate::{decode_html, CredentialBundle, MarketplaceError, MarketplaceSession, SessionConnector};

const SELLING_PATH: &str = "/openuser/jp/show/mystatus";
const STOCK_LABEL: &str = "個数";
const START_PRICE_LABEL: &str = "開始時の価格";

static LISTING_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/jp/auction/([A-Za-z0-9]+)").expect("listing link pattern is a valid regex")
});

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("static selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static ROW_HEAD_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("static selector"));
static ROW_DATA_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static selector"));
static TERM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dt").expect("static selector"));

#[derive(Debug, Clone)]
pub struct MarketplaceSettings {
    /// Host serving the seller's "my auctions" pages.
    pub base_url: String,
    /// Host serving individual auction pages.
    pub listing_base_url: String,
    /// Page the operator signs in on during interactive login.
    pub login_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_list_pages: usize,
    pub user_agent: String,
}

impl Default for MarketplaceSettings {
    fn default() -> Self {
        Self {
            base_url: "https://auctions.yahoo.co.jp".to_string(),
            listing_base_url: "https://page.auctions.yahoo.co.jp".to_string(),
            login_url: "https://login.yahoo.co.jp/config/login".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_list_pages: 50,
            user_agent: concat!("auction-stock/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl MarketplaceSettings {
    /// Point both hosts at one base URL, keeping the other settings.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            listing_base_url: base_url.clone(),
            base_url,
            ..Self::default()
        }
    }
}

/// Builds cookie-authenticated [`HttpMarketplace`] sessions.
#[derive(Debug, Clone, Default)]
pub struct HttpConnector {
    settings: MarketplaceSettings,
}

impl HttpConnector {
    pub fn new(settings: MarketplaceSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MarketplaceSettings {
        &self.settings
    }
}

impl SessionConnector for HttpConnector {
    type Session = HttpMarketplace;

    fn connect(&self, credentials: &CredentialBundle) -> Result<HttpMarketplace, MarketplaceError> {
        if credentials.is_empty() {
            return Err(MarketplaceError::InvalidCredentials(
                "credential bundle is empty".into(),
            ));
        }
        let cookie = HeaderValue::from_str(&credentials.to_cookie_header()).map_err(|_| {
            MarketplaceError::InvalidCredentials("cookie contains invalid characters".into())
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, cookie);

        // Redirects are not followed: an authenticated page that redirects
        // means the cookies were rejected.
        let client = Client::builder()
            .default_headers(headers)
            .user_agent(self.settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|err| MarketplaceError::Network(err.to_string()))?;

        Ok(HttpMarketplace {
            client,
            settings: self.settings.clone(),
        })
    }
}

/// Marketplace session backed by the seller's browser cookies.
#[derive(Debug, Clone)]
pub struct HttpMarketplace {
    client: Client,
    settings: MarketplaceSettings,
}

impl HttpMarketplace {
    fn selling_url(&self, page: usize) -> Result<Url, MarketplaceError> {
        let mut url = join_url(&self.settings.base_url, SELLING_PATH)?;
        url.query_pairs_mut().append_pair("select", "selling");
        if page > 1 {
            url.query_pairs_mut().append_pair("apg", &page.to_string());
        }
        Ok(url)
    }

    fn listing_url(&self, id: &ListingId) -> Result<Url, MarketplaceError> {
        join_url(
            &self.settings.listing_base_url,
            &format!("/jp/auction/{}", id.as_str()),
        )
    }

    async fn send(&self, url: &Url) -> Result<Response, MarketplaceError> {
        stock_trace!("GET {}", url);
        self.client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)
    }

    async fn get_html(&self, url: &Url) -> Result<String, MarketplaceError> {
        let response = self.send(url).await?;
        let status = response.status();
        if status.is_redirection() {
            return Err(MarketplaceError::NotLoggedIn {
                url: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(MarketplaceError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        decode_html(&bytes, content_type.as_deref())
            .map(|decoded| decoded.html)
            .map_err(|err| MarketplaceError::Malformed {
                url: url.to_string(),
                reason: err.to_string(),
            })
    }
}

#[async_trait]
impl MarketplaceSession for HttpMarketplace {
    async fn is_logged_in(&self) -> Result<bool, MarketplaceError> {
        let url = self.selling_url(1)?;
        let status = self.send(&url).await?.status();
        stock_debug!("Login probe returned {}", status);
        if status.is_success() {
            Ok(true)
        } else if status.is_redirection()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            Ok(false)
        } else {
            Err(MarketplaceError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            })
        }
    }

    async fn list_active_listing_ids(&self) -> Result<Vec<ListingId>, MarketplaceError> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for page in 1..=self.settings.max_list_pages {
            let html = self.get_html(&self.selling_url(page)?).await?;
            let before = ids.len();
            for id in extract_listing_ids(&html) {
                if seen.insert(id.clone()) {
                    ids.push(id);
                }
            }
            stock_debug!("Selling page {} added {} listings", page, ids.len() - before);
            if ids.len() == before {
                return Ok(ids);
            }
        }
        // Still growing at the page cap: the list would be partial.
        stock_warn!(
            "Selling list not exhausted after {} pages ({} listings so far)",
            self.settings.max_list_pages,
            ids.len()
        );
        Err(MarketplaceError::ListTruncated {
            pages: self.settings.max_list_pages,
        })
    }

    async fn fetch_listing_detail(&self, id: &ListingId) -> Result<ListingDetail, MarketplaceError> {
        let url = self.listing_url(id)?;
        let html = self.get_html(&url).await?;
        parse_listing_page(&html).map_err(|reason| MarketplaceError::Malformed {
            url: url.to_string(),
            reason: reason.to_string(),
        })
    }
}

fn join_url(base: &str, path: &str) -> Result<Url, MarketplaceError> {
    Url::parse(base)
        .and_then(|base| base.join(path))
        .map_err(|err| MarketplaceError::InvalidUrl(format!("{base}{path}: {err}")))
}

fn map_reqwest_error(err: reqwest::Error) -> MarketplaceError {
    if err.is_timeout() {
        return MarketplaceError::Timeout(err.to_string());
    }
    MarketplaceError::Network(err.to_string())
}

/// Listing IDs linked from a selling-list page, first occurrence order.
pub(crate) fn extract_listing_ids(html: &str) -> Vec<ListingId> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    document
        .select(&LINK_SELECTOR)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| LISTING_LINK.captures(href))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .filter(|id| seen.insert(id.clone()))
        .map(ListingId::from)
        .collect()
}

pub(crate) fn parse_listing_page(html: &str) -> Result<ListingDetail, &'static str> {
    let document = Html::parse_document(html);
    let title = document
        .select(&TITLE_SELECTOR)
        .map(element_text)
        .find(|text| !text.is_empty())
        .ok_or("title missing")?;

    let fields = labelled_fields(&document);
    let stock = field(&fields, STOCK_LABEL)
        .ok_or("stock missing")
        .and_then(|text| leading_count(text).ok_or("stock is not a number"))?;
    let start_price = field(&fields, START_PRICE_LABEL)
        .unwrap_or_default()
        .to_string();

    Ok(ListingDetail {
        title,
        stock,
        start_price,
    })
}

/// `(label, value)` pairs from `<tr><th/><td/></tr>` rows and `<dt/><dd/>` pairs.
fn labelled_fields(document: &Html) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    for row in document.select(&ROW_SELECTOR) {
        let head = row.select(&ROW_HEAD_SELECTOR).next();
        let data = row.select(&ROW_DATA_SELECTOR).next();
        if let (Some(head), Some(data)) = (head, data) {
            fields.push((element_text(head), element_text(data)));
        }
    }
    for term in document.select(&TERM_SELECTOR) {
        let definition = term
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .filter(|el| el.value().name() == "dd");
        if let Some(definition) = definition {
            fields.push((element_text(term), element_text(definition)));
        }
    }
    fields
}

fn field<'a>(fields: &'a [(String, String)], label: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(name, _)| name.contains(label))
        .map(|(_, value)| value.as_str())
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn leading_count(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

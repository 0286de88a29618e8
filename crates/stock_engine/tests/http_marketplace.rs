use std::time::Duration;

use stock_core::ListingId;
use stock_engine::{
    CredentialBundle, HttpConnector, MarketplaceError, MarketplaceSession, MarketplaceSettings,
    SessionConnector,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SELLING: &str = "/openuser/jp/show/mystatus";

fn cookies() -> CredentialBundle {
    [("B", "abc"), ("T", "xyz")].into_iter().collect()
}

fn connect(server: &MockServer) -> stock_engine::HttpMarketplace {
    HttpConnector::new(MarketplaceSettings::with_base_url(server.uri()))
        .connect(&cookies())
        .expect("connect")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{body}</body></html>"),
        "text/html; charset=utf-8",
    )
}

#[tokio::test]
async fn probe_sends_cookies_and_accepts_ok() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .and(query_param("select", "selling"))
        .and(header("cookie", "B=abc; T=xyz"))
        .respond_with(html(""))
        .expect(1)
        .mount(&server)
        .await;

    assert!(connect(&server).is_logged_in().await.unwrap());
}

#[tokio::test]
async fn probe_treats_login_redirect_as_logged_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://login.example/"),
        )
        .mount(&server)
        .await;

    assert!(!connect(&server).is_logged_in().await.unwrap());
}

#[tokio::test]
async fn probe_surfaces_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = connect(&server).is_logged_in().await.unwrap_err();
    assert!(matches!(err, MarketplaceError::HttpStatus { status: 503, .. }));
}

#[tokio::test]
async fn listing_ids_follow_pages_until_nothing_new() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .and(query_param("apg", "2"))
        .respond_with(html(
            r#"<a href="/jp/auction/b2">b2</a><a href="/jp/auction/a1">again</a>"#,
        ))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .and(query_param("apg", "3"))
        .respond_with(html(r#"<a href="/jp/auction/b2">b2</a>"#))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .respond_with(html(
            r#"<a href="/jp/auction/a1">a1</a><a href="/jp/auction/a0">a0</a>"#,
        ))
        .mount(&server)
        .await;

    let ids = connect(&server).list_active_listing_ids().await.unwrap();
    let ids: Vec<&str> = ids.iter().map(ListingId::as_str).collect();
    assert_eq!(ids, vec!["a1", "a0", "b2"]);
}

#[tokio::test]
async fn listing_ids_refuse_a_partial_list_at_the_page_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .and(query_param("apg", "2"))
        .respond_with(html(r#"<a href="/jp/auction/p2">p2</a>"#))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .respond_with(html(r#"<a href="/jp/auction/p1">p1</a>"#))
        .mount(&server)
        .await;

    let settings = MarketplaceSettings {
        max_list_pages: 1,
        ..MarketplaceSettings::with_base_url(server.uri())
    };
    let session = HttpConnector::new(settings).connect(&cookies()).unwrap();
    let err = session.list_active_listing_ids().await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ListTruncated { pages: 1 }));
}

#[tokio::test]
async fn listing_ids_within_the_page_cap_are_complete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .and(query_param("apg", "2"))
        .respond_with(html(r#"<a href="/jp/auction/p1">p1</a>"#))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .respond_with(html(r#"<a href="/jp/auction/p1">p1</a>"#))
        .mount(&server)
        .await;

    let settings = MarketplaceSettings {
        max_list_pages: 2,
        ..MarketplaceSettings::with_base_url(server.uri())
    };
    let session = HttpConnector::new(settings).connect(&cookies()).unwrap();
    let ids = session.list_active_listing_ids().await.unwrap();
    assert_eq!(ids, vec![ListingId::new("p1")]);
}

#[tokio::test]
async fn listing_ids_fail_when_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SELLING))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/login"))
        .mount(&server)
        .await;

    let err = connect(&server).list_active_listing_ids().await.unwrap_err();
    assert!(matches!(err, MarketplaceError::NotLoggedIn { .. }));
}

#[tokio::test]
async fn detail_page_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jp/auction/x123"))
        .respond_with(html(
            r#"<h1 class="ProductTitle__text">Vintage camera</h1>
               <table>
                 <tr><th>個数</th><td>4</td></tr>
                 <tr><th>開始時の価格</th><td>12,345 円（税 0 円）</td></tr>
               </table>"#,
        ))
        .mount(&server)
        .await;

    let detail = connect(&server)
        .fetch_listing_detail(&ListingId::new("x123"))
        .await
        .unwrap();
    assert_eq!(detail.title, "Vintage camera");
    assert_eq!(detail.stock, 4);
    assert_eq!(detail.start_price, "12,345 円（税 0 円）");
}

#[tokio::test]
async fn euc_jp_detail_page_is_decoded() {
    let server = MockServer::start().await;
    let body = "<html><body><h1>カメラ</h1><table><tr><th>個数</th><td>2</td></tr></table></body></html>";
    let (bytes, _, _) = encoding_rs::EUC_JP.encode(body);
    Mock::given(method("GET"))
        .and(path("/jp/auction/e1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(bytes.into_owned(), "text/html; charset=EUC-JP"),
        )
        .mount(&server)
        .await;

    let detail = connect(&server)
        .fetch_listing_detail(&ListingId::new("e1"))
        .await
        .unwrap();
    assert_eq!(detail.title, "カメラ");
    assert_eq!(detail.stock, 2);
}

#[tokio::test]
async fn detail_without_stock_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jp/auction/bad"))
        .respond_with(html("<h1>Only a title</h1>"))
        .mount(&server)
        .await;

    let err = connect(&server)
        .fetch_listing_detail(&ListingId::new("bad"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Malformed { .. }));
}

#[tokio::test]
async fn detail_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jp/auction/slow"))
        .respond_with(html("<h1>slow</h1>").set_delay(Duration::from_millis(250)))
        .mount(&server)
        .await;

    let settings = MarketplaceSettings {
        request_timeout: Duration::from_millis(50),
        ..MarketplaceSettings::with_base_url(server.uri())
    };
    let session = HttpConnector::new(settings).connect(&cookies()).unwrap();
    let err = session
        .fetch_listing_detail(&ListingId::new("slow"))
        .await
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::Timeout(_)));
}

#[test]
fn empty_bundle_cannot_connect() {
    let err = HttpConnector::default()
        .connect(&CredentialBundle::new())
        .unwrap_err();
    assert!(matches!(err, MarketplaceError::InvalidCredentials(_)));
}

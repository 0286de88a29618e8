use async_trait::async_trait;
use console::style;
use dialoguer::Password;
use stock_engine::{CredentialBundle, LoginError, LoginProvider};
use stock_logging::{stock_info, stock_warn};

/// Interactive login: the operator signs in with a browser and pastes the
/// `Cookie` header of the marketplace site.
pub struct CookiePrompt {
    login_url: String,
}

impl CookiePrompt {
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
        }
    }
}

#[async_trait]
impl LoginProvider for CookiePrompt {
    async fn login(&self) -> Result<CredentialBundle, LoginError> {
        let login_url = self.login_url.clone();
        tokio::task::spawn_blocking(move || prompt_for_cookies(&login_url))
            .await
            .map_err(|err| LoginError::Failed(err.to_string()))?
    }
}

fn prompt_for_cookies(login_url: &str) -> Result<CredentialBundle, LoginError> {
    println!("{}", style("ログインが必要です").yellow().bold());
    println!("1. ブラウザで {login_url} にログインしてください");
    println!("2. 開発者ツールから auctions.yahoo.co.jp の Cookie ヘッダーをコピーしてください");
    if let Err(err) = open::that(login_url) {
        stock_warn!("Could not open browser for login: {}", err);
    }

    let input = Password::new()
        .with_prompt("Cookie")
        .allow_empty_password(true)
        .interact()
        .map_err(|err| LoginError::Failed(err.to_string()))?;
    let bundle = parse_cookie_input(&input)?;
    stock_info!("Received {} cookies from interactive login", bundle.len());
    Ok(bundle)
}

/// Accepts a bare header value or a full `Cookie: ...` line.
pub(crate) fn parse_cookie_input(input: &str) -> Result<CredentialBundle, LoginError> {
    let trimmed = input.trim();
    let value = match trimmed.split_once(':') {
        Some((name, rest)) if name.trim().eq_ignore_ascii_case("cookie") => rest,
        _ => trimmed,
    };
    let bundle = CredentialBundle::from_cookie_header(value);
    if bundle.is_empty() {
        return Err(LoginError::Empty);
    }
    Ok(bundle)
}

//! Authenticated platform session management.
//!
//! The session is owned exclusively by [`SessionManager`]: cookies are
//! replayed optimistically at startup and only proven invalid when a
//! later browsing action lands on a login surface. Invalidation triggers
//! one automated login; the refreshed cookies are persisted wholesale.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use thirtyfour::cookie::Cookie;
use thirtyfour::{By, ChromiumLikeCapabilities, DesiredCapabilities, Key, WebDriver, WebElement};
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::models::config::SessionConfig;

const BASE_URL: &str = "https://x.com/";
const LOGIN_URL: &str = "https://x.com/i/flow/login";

/// Known selectors for the username field, tried in order. The platform
/// rotates its markup; the autocomplete attribute has been the most
/// stable.
const USERNAME_SELECTORS: [&str; 3] = [
    "input[autocomplete='username']",
    "input[name='text']",
    "input[data-testid='ocfEnterTextTextInput']",
];

const PASSWORD_SELECTORS: [&str; 2] = [
    "input[name='password']",
    "input[autocomplete='current-password']",
];

/// The "unusual activity" interstitial re-asks for the username.
const VERIFICATION_SELECTOR: &str = "input[data-testid='ocfEnterTextTextInput']";

const ERROR_BANNER_SELECTOR: &str = "div[data-testid='error-detail']";

/// Owns the browser session and the durable cookie store.
pub struct SessionManager {
    driver: WebDriver,
    config: SessionConfig,
}

impl SessionManager {
    /// Start the browser and optimistically replay stored cookies.
    ///
    /// The replayed session is accepted as-is; validity is discovered
    /// empirically by whichever component browses next.
    pub async fn connect(config: SessionConfig) -> Result<Self, AuthError> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.add_arg("--headless=new")?;
        }
        caps.add_arg("--window-size=1280,1024")?;
        caps.add_arg("--disable-blink-features=AutomationControlled")?;

        let driver = WebDriver::new(&config.webdriver_url, caps).await?;
        let manager = Self { driver, config };
        manager.restore_cookies().await?;
        Ok(manager)
    }

    /// The underlying driver. Read-only for everyone but this manager.
    pub fn driver(&self) -> &WebDriver {
        &self.driver
    }

    /// Bounded settle delay after a page action.
    pub(crate) async fn settle(&self) {
        tokio::time::sleep(Duration::from_secs(self.config.settle_secs)).await;
    }

    /// Run the automated login flow and persist the refreshed session.
    ///
    /// Fatal when no credentials are configured or the platform rejects
    /// the flow; there is no unauthenticated fallback.
    pub async fn login(&self) -> Result<(), AuthError> {
        let (username, password) = match (&self.config.username, &self.config.password) {
            (Some(u), Some(p)) => (u.clone(), p.clone()),
            _ => return Err(AuthError::NoCredentials),
        };

        info!("running automated login");
        self.driver.goto(LOGIN_URL).await?;
        self.settle().await;

        let username_field = self
            .find_first(&USERNAME_SELECTORS)
            .await
            .ok_or_else(|| AuthError::FieldNotFound("username".to_string()))?;
        username_field.send_keys(&username).await?;
        username_field.send_keys(Key::Enter + "").await?;
        self.settle().await;

        // Optional "unusual activity" verification step: the platform
        // re-asks for the username before showing the password field.
        if self.find_first(&PASSWORD_SELECTORS).await.is_none() {
            if let Ok(field) = self.driver.find(By::Css(VERIFICATION_SELECTOR)).await {
                info!("verification step detected, resupplying username");
                field.send_keys(&username).await?;
                field.send_keys(Key::Enter + "").await?;
                self.settle().await;
            }
        }

        let password_field = self
            .find_first(&PASSWORD_SELECTORS)
            .await
            .ok_or_else(|| AuthError::FieldNotFound("password".to_string()))?;
        password_field.send_keys(&password).await?;
        password_field.send_keys(Key::Enter + "").await?;
        self.settle().await;

        // Success: off the login path and no error banner.
        let url = self.driver.current_url().await?;
        if is_login_url(url.as_str()) {
            return Err(AuthError::LoginFailed(format!(
                "still on login surface: {url}"
            )));
        }
        if let Ok(banner) = self.driver.find(By::Css(ERROR_BANNER_SELECTOR)).await {
            let text = banner.text().await.unwrap_or_default();
            return Err(AuthError::LoginFailed(text));
        }

        self.persist_cookies().await?;
        info!("login succeeded, session persisted");
        Ok(())
    }

    /// Close the browser session.
    pub async fn close(self) -> Result<(), AuthError> {
        self.driver.quit().await?;
        Ok(())
    }

    async fn find_first(&self, selectors: &[&str]) -> Option<WebElement> {
        for selector in selectors {
            if let Ok(element) = self.driver.find(By::Css(*selector)).await {
                debug!(selector, "matched login field");
                return Some(element);
            }
        }
        None
    }

    async fn restore_cookies(&self) -> Result<(), AuthError> {
        let Some(stored) = load_cookie_file(&self.config.cookie_file) else {
            debug!("no durable session to restore");
            return Ok(());
        };

        // Cookies can only be attached once the browser is on the domain.
        self.driver.goto(BASE_URL).await?;
        for (name, value) in &stored {
            let mut cookie = Cookie::new(name.clone(), value.clone());
            cookie.set_domain(".x.com");
            cookie.set_path("/");
            if let Err(e) = self.driver.add_cookie(cookie).await {
                warn!(cookie = name.as_str(), error = %e, "could not restore cookie");
            }
        }
        info!(count = stored.len(), "restored session cookies");
        Ok(())
    }

    async fn persist_cookies(&self) -> Result<(), AuthError> {
        let cookies = self.driver.get_all_cookies().await?;
        let map: BTreeMap<String, String> = cookies
            .iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect();
        if let Err(e) = save_cookie_file(&self.config.cookie_file, &map) {
            warn!(error = %e, "could not persist session cookies");
        }
        Ok(())
    }
}

/// Whether a URL is on the platform's login path.
pub(crate) fn is_login_url(url: &str) -> bool {
    url.contains("/i/flow/login") || url.contains("/login")
}

/// Read the durable cookie store: a flat JSON name -> value map.
fn load_cookie_file(path: &Path) -> Option<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Overwrite the durable cookie store wholesale.
fn save_cookie_file(path: &Path, map: &BTreeMap<String, String>) -> std::io::Result<()> {
    let content = serde_json::to_string_pretty(map)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cookie_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut map = BTreeMap::new();
        map.insert("auth_token".to_string(), "abc123".to_string());
        map.insert("ct0".to_string(), "def456".to_string());

        save_cookie_file(&path, &map).unwrap();
        let loaded = load_cookie_file(&path).unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_missing_cookie_file() {
        assert!(load_cookie_file(Path::new("/nonexistent/cookies.json")).is_none());
    }

    #[test]
    fn test_is_login_url() {
        assert!(is_login_url("https://x.com/i/flow/login"));
        assert!(is_login_url("https://x.com/login?redirect=home"));
        assert!(!is_login_url("https://x.com/BancoCentral_AR/media"));
    }
}

//! Bulletin discovery within the authenticated platform.
//!
//! Successive generations of this scraper located the daily post in
//! different ways as the platform changed; they survive here as one
//! locator with an ordered list of discovery strategies. A strategy that
//! lands on a login surface aborts the whole locator with a
//! session-expired signal instead of retrying itself.

use std::fmt;

use chrono::NaiveDate;
use chrono_tz::Tz;
use thirtyfour::{By, WebDriver};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::LocateError;
use crate::models::config::SourceConfig;

use super::session::{is_login_url, SessionManager};

/// One method of locating the bulletin post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// The account's media gallery, scrolled.
    MediaGallery,
    /// Full-text search scoped to account + hashtags + image filter,
    /// windowed one day around the target date.
    ScopedSearch,
    /// The plain profile timeline, scrolled.
    Timeline,
}

impl DiscoveryStrategy {
    /// Fixed strategy order.
    pub const ORDER: [DiscoveryStrategy; 3] = [
        DiscoveryStrategy::MediaGallery,
        DiscoveryStrategy::ScopedSearch,
        DiscoveryStrategy::Timeline,
    ];
}

impl fmt::Display for DiscoveryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryStrategy::MediaGallery => write!(f, "media-gallery"),
            DiscoveryStrategy::ScopedSearch => write!(f, "scoped-search"),
            DiscoveryStrategy::Timeline => write!(f, "timeline"),
        }
    }
}

/// Finds the bulletin's image URL for a target date.
pub struct ContentLocator {
    config: SourceConfig,
    timezone: Tz,
}

impl ContentLocator {
    pub fn new(config: SourceConfig, timezone: Tz) -> Self {
        Self { config, timezone }
    }

    /// Try each discovery strategy in order; the first to find a post
    /// matching the target date wins.
    pub async fn find_image_url(
        &self,
        session: &SessionManager,
        date: NaiveDate,
    ) -> Result<Url, LocateError> {
        for strategy in DiscoveryStrategy::ORDER {
            info!(%strategy, %date, "running discovery strategy");
            if let Some(url) = self.run_strategy(session, strategy, date).await? {
                info!(%strategy, %url, "bulletin located");
                return Ok(url);
            }
            warn!(%strategy, "strategy exhausted its budget");
        }

        let driver = session.driver();
        let last_url = driver
            .current_url()
            .await
            .map(|u| u.to_string())
            .unwrap_or_default();
        let page_title = driver.title().await.unwrap_or_default();
        Err(LocateError::NotFound {
            date,
            last_url,
            page_title,
        })
    }

    async fn run_strategy(
        &self,
        session: &SessionManager,
        strategy: DiscoveryStrategy,
        date: NaiveDate,
    ) -> Result<Option<Url>, LocateError> {
        let driver = session.driver();
        driver.goto(self.start_url(strategy, date)).await?;
        session.settle().await;

        for iteration in 0..self.config.scroll_budget {
            self.check_still_authenticated(driver).await?;

            if let Some(url) = self.scan_visible_posts(driver, date).await? {
                return Ok(Some(url));
            }

            debug!(%strategy, iteration, "no match yet, scrolling");
            driver
                .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
                .await?;
            session.settle().await;
        }

        Ok(None)
    }

    fn start_url(&self, strategy: DiscoveryStrategy, date: NaiveDate) -> String {
        let account = &self.config.account;
        match strategy {
            DiscoveryStrategy::MediaGallery => format!("https://x.com/{account}/media"),
            DiscoveryStrategy::ScopedSearch => {
                let since = date.pred_opt().unwrap_or(date);
                let until = date.succ_opt().unwrap_or(date);
                let query = format!(
                    "from:{account} {} filter:images since:{since} until:{until}",
                    self.config.hashtags.join(" ")
                );
                let mut url = Url::parse("https://x.com/search").expect("static url");
                url.query_pairs_mut()
                    .append_pair("q", &query)
                    .append_pair("src", "typed_query")
                    .append_pair("f", "live");
                url.to_string()
            }
            DiscoveryStrategy::Timeline => format!("https://x.com/{account}"),
        }
    }

    /// A login redirect proves the session invalid; the caller owns the
    /// single re-authentication cycle.
    async fn check_still_authenticated(&self, driver: &WebDriver) -> Result<(), LocateError> {
        let url = driver.current_url().await?;
        if is_login_url(url.as_str()) {
            return Err(LocateError::SessionExpired {
                url: url.to_string(),
            });
        }
        Ok(())
    }

    /// Inspect visible posts for one published on the target calendar
    /// day carrying the required hashtags, and extract its media URL.
    async fn scan_visible_posts(
        &self,
        driver: &WebDriver,
        date: NaiveDate,
    ) -> Result<Option<Url>, LocateError> {
        let articles = driver.find_all(By::Css("article")).await?;
        debug!(posts = articles.len(), "inspecting visible posts");

        for article in articles {
            let Ok(time_element) = article.find(By::Css("time")).await else {
                continue;
            };
            let Some(timestamp) = time_element.attr("datetime").await? else {
                continue;
            };
            if !timestamp_matches(&timestamp, date, self.timezone) {
                continue;
            }

            // Hashtag check only where text is visible; media-gallery
            // tiles often render no text at all.
            let text = article.text().await.unwrap_or_default();
            if !text.trim().is_empty() && !has_required_hashtags(&text, &self.config.hashtags) {
                debug!("post on target day lacks required hashtags");
                continue;
            }

            let images = article.find_all(By::Css("img[src*='/media/']")).await?;
            for image in images {
                if let Some(src) = image.attr("src").await? {
                    let best = largest_variant(&src);
                    if let Ok(url) = Url::parse(&best) {
                        return Ok(Some(url));
                    }
                }
            }
        }

        Ok(None)
    }
}

/// Whether an RFC 3339 post timestamp falls on the target calendar day
/// in the fixed timezone. Time-of-day is irrelevant.
pub(crate) fn timestamp_matches(timestamp: &str, target: NaiveDate, tz: Tz) -> bool {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&tz).date_naive() == target)
        .unwrap_or(false)
}

/// Whether the post text contains every required hashtag
/// (case-insensitive).
pub(crate) fn has_required_hashtags(text: &str, hashtags: &[String]) -> bool {
    let lower = text.to_lowercase();
    hashtags.iter().all(|tag| lower.contains(&tag.to_lowercase()))
}

/// Rewrite a media URL's size qualifier to the largest variant.
///
/// Handles both the query form (`?format=jpg&name=small`) and the legacy
/// suffix form (`photo.jpg:small`). URLs without a qualifier pass
/// through unchanged.
pub(crate) fn largest_variant(src: &str) -> String {
    if let Ok(mut url) = Url::parse(src) {
        if url.query_pairs().any(|(k, _)| k == "name") {
            let pairs: Vec<(String, String)> = url
                .query_pairs()
                .map(|(k, v)| {
                    if k == "name" {
                        (k.into_owned(), "orig".to_string())
                    } else {
                        (k.into_owned(), v.into_owned())
                    }
                })
                .collect();
            url.query_pairs_mut().clear().extend_pairs(pairs);
            return url.to_string();
        }
    }

    if let Some((base, qualifier)) = src.rsplit_once(':') {
        if ["thumb", "small", "medium", "large"].contains(&qualifier) {
            return format!("{base}:orig");
        }
    }

    src.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ba_tz() -> Tz {
        "America/Argentina/Buenos_Aires".parse().unwrap()
    }

    #[test]
    fn test_timestamp_matches_calendar_day() {
        let target = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        // 14:30 UTC is 11:30 in Buenos Aires, same calendar day.
        assert!(timestamp_matches("2026-01-19T14:30:00.000Z", target, ba_tz()));
        // 02:00 UTC on the 20th is still 23:00 on the 19th in Buenos Aires.
        assert!(timestamp_matches("2026-01-20T02:00:00.000Z", target, ba_tz()));
        assert!(!timestamp_matches("2026-01-18T14:30:00.000Z", target, ba_tz()));
        assert!(!timestamp_matches("garbage", target, ba_tz()));
    }

    #[test]
    fn test_has_required_hashtags() {
        let tags = vec!["#databcra".to_string(), "#principalesvariables".to_string()];
        assert!(has_required_hashtags(
            "#DataBCRA #PrincipalesVariables del día",
            &tags
        ));
        assert!(!has_required_hashtags("#DataBCRA solamente", &tags));
    }

    #[test]
    fn test_largest_variant_query_form() {
        assert_eq!(
            largest_variant("https://pbs.twimg.com/media/Gh123?format=jpg&name=small"),
            "https://pbs.twimg.com/media/Gh123?format=jpg&name=orig"
        );
        assert_eq!(
            largest_variant("https://pbs.twimg.com/media/Gh123?format=jpg&name=900x900"),
            "https://pbs.twimg.com/media/Gh123?format=jpg&name=orig"
        );
    }

    #[test]
    fn test_largest_variant_suffix_form() {
        assert_eq!(
            largest_variant("https://pbs.twimg.com/media/Gh123.jpg:small"),
            "https://pbs.twimg.com/media/Gh123.jpg:orig"
        );
    }

    #[test]
    fn test_largest_variant_passthrough() {
        assert_eq!(
            largest_variant("https://pbs.twimg.com/media/Gh123.jpg"),
            "https://pbs.twimg.com/media/Gh123.jpg"
        );
    }

    #[test]
    fn test_search_url_contains_window() {
        let locator = ContentLocator::new(SourceConfig::default(), ba_tz());
        let date = NaiveDate::from_ymd_opt(2026, 1, 19).unwrap();
        let url = locator.start_url(DiscoveryStrategy::ScopedSearch, date);
        assert!(url.contains("2026-01-18"));
        assert!(url.contains("2026-01-20"));
        assert!(url.contains("BancoCentral_AR"));
    }
}

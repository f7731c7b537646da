use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::models::AccountStatus;

const PROFILE_BASE: &str = "https://www.instagram.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";
const ACCEPT_LANGUAGES: &str = "en-US,en;q=0.9";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Page-content heuristics for deciding whether a profile is still up.
/// Instagram changes its markup now and then, so these are injectable rather
/// than baked into the logic. Phrases and markers are matched against the
/// lowercased page body and must themselves be lowercase.
#[derive(Debug, Clone)]
pub struct Heuristics {
    pub unavailable_phrases: Vec<String>,
    pub title_marker: String,
    pub profile_marker: String,
}

impl Default for Heuristics {
    fn default() -> Self {
        Self {
            unavailable_phrases: vec![
                "sorry, this page isn't available".to_string(),
                "the link you followed may be broken".to_string(),
                "page may have been removed".to_string(),
                "page isn&#39;t available".to_string(),
            ],
            title_marker: "og:title".to_string(),
            profile_marker: "profilepage_".to_string(),
        }
    }
}

/// Anything that can classify an account by name. The monitor loop runs
/// against this seam so tests can script statuses instead of hitting the
/// network.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn check(&self, username: &str) -> AccountStatus;
}

#[derive(Clone)]
pub struct StatusChecker {
    http: Client,
    heuristics: Heuristics,
}

impl StatusChecker {
    pub fn new() -> Self {
        Self::with_heuristics(Heuristics::default())
    }

    pub fn with_heuristics(heuristics: Heuristics) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGES));
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build http client");
        Self { http, heuristics }
    }
}

#[async_trait]
impl StatusSource for StatusChecker {
    /// One GET of the profile page, no retries. Transport failures come back
    /// as `AccountStatus::Error` instead of bubbling up, so a flaky network
    /// can never take the monitor loop down with it.
    async fn check(&self, username: &str) -> AccountStatus {
        let url = format!("{PROFILE_BASE}/{username}/");
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return AccountStatus::Error(e.to_string()),
        };
        let status = response.status();
        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => return AccountStatus::Error(e.to_string()),
        };
        classify_page(status, &body, &self.heuristics)
    }
}

/// Decision policy, in order: hard 404, then known takedown phrases, then
/// "does this even look like a profile page" via the two markers.
pub fn classify_page(status: StatusCode, body: &str, heuristics: &Heuristics) -> AccountStatus {
    if status == StatusCode::NOT_FOUND {
        return AccountStatus::NotFound;
    }
    let page = body.to_lowercase();
    if heuristics
        .unavailable_phrases
        .iter()
        .any(|phrase| page.contains(phrase.as_str()))
    {
        return AccountStatus::Suspended;
    }
    if !page.contains(&heuristics.title_marker) && !page.contains(&heuristics.profile_marker) {
        return AccountStatus::Suspended;
    }
    AccountStatus::Active
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: StatusCode, body: &str) -> AccountStatus {
        classify_page(status, body, &Heuristics::default())
    }

    #[test]
    fn http_404_wins_over_page_content() {
        let body = r#"<meta property="og:title" content="alice"> ProfilePage_123"#;
        assert_eq!(classify(StatusCode::NOT_FOUND, body), AccountStatus::NotFound);
    }

    #[test]
    fn takedown_phrase_means_suspended() {
        let body = r#"<meta property="og:title"> Sorry, this page isn't available."#;
        assert_eq!(classify(StatusCode::OK, body), AccountStatus::Suspended);
    }

    #[test]
    fn escaped_takedown_phrase_is_recognized() {
        let body = "<title>Page isn&#39;t available</title> og:title profilepage_1";
        assert_eq!(classify(StatusCode::OK, body), AccountStatus::Suspended);
    }

    #[test]
    fn page_without_profile_markers_is_suspended() {
        let body = "<html><body>log in to continue</body></html>";
        assert_eq!(classify(StatusCode::OK, body), AccountStatus::Suspended);
    }

    #[test]
    fn title_marker_keeps_the_account_active() {
        let body = r#"<meta property="og:title" content="alice (@alice)">"#;
        assert_eq!(classify(StatusCode::OK, body), AccountStatus::Active);
    }

    #[test]
    fn profile_marker_alone_is_enough() {
        let body = r#"{"id":"ProfilePage_42"}"#;
        assert_eq!(classify(StatusCode::OK, body), AccountStatus::Active);
    }

    #[test]
    fn markers_match_case_insensitively() {
        let body = "<META PROPERTY=\"OG:TITLE\">";
        assert_eq!(classify(StatusCode::OK, body), AccountStatus::Active);
    }

    #[test]
    fn custom_heuristics_replace_the_defaults() {
        let heuristics = Heuristics {
            unavailable_phrases: vec!["gone for good".to_string()],
            title_marker: "x-title".to_string(),
            profile_marker: "x-profile".to_string(),
        };
        assert_eq!(
            classify_page(StatusCode::OK, "x-title: Gone For Good", &heuristics),
            AccountStatus::Suspended
        );
        assert_eq!(
            classify_page(StatusCode::OK, "an x-profile page", &heuristics),
            AccountStatus::Active
        );
    }
}

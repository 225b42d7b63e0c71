use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result};
use scraper::{Html, Selector};

use crate::models::is_web_url;
use crate::sources::TitleSource;

/// Bytes of the response body scanned for a `<title>`.
const MAX_SCAN_BYTES: u64 = 20_000;
/// Titles longer than this are shortened with an ellipsis.
const MAX_TITLE_CHARS: usize = 120;

/// Fetches a page and reads its `<title>`.
pub struct PageTitleResolver {
    client: reqwest::blocking::Client,
}

impl PageTitleResolver {
    /// Builds a client whose connect and total timeouts are both `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }

    fn fetch_head(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .context("request failed")?
            .error_for_status()
            .context("server returned an error")?;

        let mut body = Vec::new();
        resp.take(MAX_SCAN_BYTES)
            .read_to_end(&mut body)
            .context("failed to read response")?;

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

impl TitleSource for PageTitleResolver {
    fn fetch_title(&self, url: &str) -> Option<String> {
        if !is_web_url(url) {
            return None;
        }

        match self.fetch_head(url) {
            Ok(html) => {
                let title = extract_title(&html);
                log::debug!("title for {}: {:?}", url, title);
                title
            }
            Err(e) => {
                log::warn!("could not fetch title for {}: {:#}", url, e);
                None
            }
        }
    }
}

/// Text of the first complete `<title>` element in `html`, shortened to
/// [`MAX_TITLE_CHARS`].
pub fn extract_title(html: &str) -> Option<String> {
    // an unterminated title in a truncated page is not trusted
    if !html.to_ascii_lowercase().contains("</title>") {
        return None;
    }

    let document = Html::parse_document(html);
    let title_sel = Selector::parse("title").ok()?;
    let raw: String = document.select(&title_sel).next()?.text().collect();

    let title = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        return None;
    }
    Some(truncate(&title))
}

fn truncate(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let head: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_title() {
        let html = "<html><head><title>Lofi Beats</title></head><body></body></html>";
        assert_eq!(extract_title(html).as_deref(), Some("Lofi Beats"));
    }

    #[test]
    fn test_extract_is_case_insensitive() {
        let html = "<HTML><HEAD><TITLE lang=\"en\">  Upper\n  Case </TITLE></HEAD></HTML>";
        assert_eq!(extract_title(html).as_deref(), Some("Upper Case"));
    }

    #[test]
    fn test_extract_decodes_entities() {
        let html = "<title>Rock &amp; Roll</title>";
        assert_eq!(extract_title(html).as_deref(), Some("Rock & Roll"));
    }

    #[test]
    fn test_unterminated_title() {
        assert_eq!(extract_title("<html><title>Cut off here"), None);
    }

    #[test]
    fn test_missing_or_empty_title() {
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    #[test]
    fn test_long_title_is_truncated() {
        let long = "x".repeat(200);
        let html = format!("<title>{long}</title>");
        let title = extract_title(&html).unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_truncate_counts_chars() {
        let exact = "가".repeat(MAX_TITLE_CHARS);
        assert_eq!(truncate(&exact), exact);
    }

    #[test]
    fn test_non_http_scheme_yields_none() {
        let resolver = PageTitleResolver::new(Duration::from_secs(1)).unwrap();
        assert_eq!(resolver.fetch_title("ftp://example.com/file"), None);
        assert_eq!(resolver.fetch_title("not a url"), None);
    }

    #[test]
    fn test_unreachable_host_yields_none() {
        let resolver = PageTitleResolver::new(Duration::from_secs(1)).unwrap();
        assert_eq!(resolver.fetch_title("http://127.0.0.1:9/"), None);
    }

    /// Needs network access.
    /// Run with: cargo test page_title -- --ignored
    #[test]
    #[ignore]
    fn test_fetch_real_page() {
        let resolver = PageTitleResolver::new(Duration::from_secs(4)).unwrap();
        let title = resolver.fetch_title("https://example.com/");
        assert_eq!(title.as_deref(), Some("Example Domain"));
    }
}

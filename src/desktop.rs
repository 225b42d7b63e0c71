//! Host integrations: the clipboard and the default browser.

use anyhow::{Context, Result};

use crate::models::is_web_url;

/// Opens a link outside the program.
pub trait LinkOpener {
    /// Asks the host to open `url`. Errors are recoverable and reported to the user.
    fn open(&self, url: &str) -> Result<()>;
}

/// Hands links to the operating system's default browser.
pub struct SystemBrowser;

impl LinkOpener for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        log::info!("opening {}", url);
        webbrowser::open(url).with_context(|| format!("could not open {url}"))
    }
}

/// Current clipboard text, if it is a web link.
///
/// A missing or unreadable clipboard is logged and treated like one that
/// holds no link, so callers can fall back to a prompt.
pub fn clipboard_url() -> Option<String> {
    match arboard::Clipboard::new().and_then(|mut cb| cb.get_text()) {
        Ok(text) => usable_url(&text),
        Err(e) => {
            log::debug!("clipboard unavailable: {}", e);
            None
        }
    }
}

fn usable_url(text: &str) -> Option<String> {
    let text = text.trim();
    is_web_url(text).then(|| text.to_string())
}

pub mod page_title;

/// Looks up a human-readable title for a link.
///
/// Implementations never fail loudly: any problem collapses to `None` and the
/// caller asks the user for a title instead.
pub trait TitleSource {
    /// Title for `url`, or `None` when nothing usable was found.
    fn fetch_title(&self, url: &str) -> Option<String>;
}

/// A source that never finds a title. Used when fetching is turned off.
pub struct NoTitles;

impl TitleSource for NoTitles {
    fn fetch_title(&self, _url: &str) -> Option<String> {
        None
    }
}

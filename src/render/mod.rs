//! Rendering capability used by the scrapers.
//!
//! The source site is a client-rendered application, so the scrapers drive a
//! browser instead of parsing HTTP responses. [`RenderContext`] is the narrow
//! surface they need: navigate, query, read, click. Two implementations exist:
//!
//! | Implementation | Module | Notes |
//! |----------------|--------|-------|
//! | WebDriver | [`webdriver`] | Headless Chrome behind a running chromedriver |
//! | Scripted fake | `fake` | Test-only DOM built from canned HTML |

use crate::auth::SessionCookie;
use crate::error::RenderError;

#[cfg(test)]
pub mod fake;
pub mod webdriver;

/// A browsing session able to load pages and inspect their rendered DOM.
///
/// Selectors are CSS selectors. Element handles are only meaningful for the
/// page they were obtained from.
pub trait RenderContext {
    /// Handle to a rendered element.
    type Element: Clone;

    /// Load `url` in the session.
    async fn navigate(&self, url: &str) -> Result<(), RenderError>;

    /// Install a cookie for the currently loaded origin.
    async fn add_cookie(&self, cookie: &SessionCookie) -> Result<(), RenderError>;

    /// All elements of the current page matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>, RenderError>;

    /// Descendants of `scope` matching `selector`, in document order.
    async fn query_within(
        &self,
        scope: &Self::Element,
        selector: &str,
    ) -> Result<Vec<Self::Element>, RenderError>;

    /// The direct parent of `element`.
    async fn parent(&self, element: &Self::Element) -> Result<Self::Element, RenderError>;

    /// Rendered text of `element`, one line per block of text.
    async fn read_text(&self, element: &Self::Element) -> Result<String, RenderError>;

    /// Value of attribute `name`, if set.
    async fn attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> Result<Option<String>, RenderError>;

    async fn click(&self, element: &Self::Element) -> Result<(), RenderError>;

    /// End the session and release the browser.
    async fn close(self) -> Result<(), RenderError>;
}

/// First descendant of `scope` matching `selector`.
pub async fn query_first<R: RenderContext>(
    ctx: &R,
    scope: &R::Element,
    selector: &str,
) -> Result<R::Element, RenderError> {
    ctx.query_within(scope, selector)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RenderError::NotFound(selector.to_string()))
}

/// First line of an element's text, trimmed.
pub fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim()
}

/// Last non-empty line of an element's text, trimmed.
///
/// Team cells render a crest caption above the name, so the name is the last
/// line.
pub fn last_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .unwrap_or("")
}

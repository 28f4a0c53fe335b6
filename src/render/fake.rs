//! Scripted [`RenderContext`] for tests.
//!
//! Pages are canned HTML keyed by URL. A page may have several snapshots to
//! mimic a client-side app filling the DOM in over time: every document-level
//! query returns the current snapshot and then moves on to the next one, and
//! the last snapshot stays put. Clicking an element whose `id` has a script
//! swaps in the scripted HTML.

use super::RenderContext;
use crate::auth::SessionCookie;
use crate::error::RenderError;
use scraper::{ElementRef, Html, Selector};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Handle to an element of one particular document generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeElement {
    generation: u64,
    index: usize,
}

struct Loaded {
    snapshots: Vec<String>,
    cursor: usize,
    doc: Html,
}

#[derive(Default)]
struct State {
    page: Option<Loaded>,
    generation: u64,
    visited: Vec<String>,
    cookies: Vec<SessionCookie>,
}

/// Scripted [`RenderContext`] backed by static HTML.
///
/// Each URL serves a list of snapshots. Every page-wide query moves the page
/// one snapshot further, so rendering that fills in over time can be replayed.
/// Clicks swap the whole page for new HTML.
#[derive(Default)]
pub struct FakeRenderContext {
    /// Snapshots per URL; the last one stays once reached.
    pages: HashMap<String, Vec<String>>,
    /// Page replacing the current one when the element with this id is clicked.
    clicks: HashMap<String, String>,
    failing: HashSet<String>,
    state: RefCell<State>,
}

impl FakeRenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` at `url`.
    pub fn page(self, url: &str, html: &str) -> Self {
        self.page_snapshots(url, &[html])
    }

    /// Serve `url` as a sequence of progressively rendered snapshots.
    pub fn page_snapshots(mut self, url: &str, snapshots: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            snapshots.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Clicking the element with `id` replaces the page with `html`.
    pub fn on_click(mut self, id: &str, html: &str) -> Self {
        self.clicks.insert(id.to_string(), html.to_string());
        self
    }

    /// Navigating to `url` fails.
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    /// URLs navigated to, in order, failures included.
    pub fn visited(&self) -> Vec<String> {
        self.state.borrow().visited.clone()
    }

    /// Cookies installed so far.
    pub fn cookies(&self) -> Vec<SessionCookie> {
        self.state.borrow().cookies.clone()
    }

    fn load(&self, snapshots: Vec<String>) {
        let mut state = self.state.borrow_mut();
        state.generation += 1;
        let doc = Html::parse_document(snapshots.first().map(String::as_str).unwrap_or(""));
        state.page = Some(Loaded {
            snapshots,
            cursor: 0,
            doc,
        });
    }

    /// Run `f` on the element behind `handle`.
    fn with_element<T>(
        &self,
        handle: &FakeElement,
        f: impl FnOnce(ElementRef<'_>, &Html, u64) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        let state = self.state.borrow();
        let page = state
            .page
            .as_ref()
            .ok_or_else(|| RenderError::Driver("no page loaded".to_string()))?;
        if handle.generation != state.generation {
            return Err(RenderError::Driver("stale element reference".to_string()));
        }
        let element = all_elements(&page.doc)
            .nth(handle.index)
            .ok_or_else(|| RenderError::Driver("stale element reference".to_string()))?;
        f(element, &page.doc, state.generation)
    }
}

fn parse_selector(selector: &str) -> Result<Selector, RenderError> {
    Selector::parse(selector).map_err(|e| RenderError::Driver(format!("bad selector `{selector}`: {e}")))
}

fn all_elements(doc: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    doc.root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

fn handle_for(doc: &Html, generation: u64, element: ElementRef<'_>) -> Result<FakeElement, RenderError> {
    all_elements(doc)
        .position(|e| e.id() == element.id())
        .map(|index| FakeElement { generation, index })
        .ok_or_else(|| RenderError::Driver("element outside document".to_string()))
}

impl RenderContext for FakeRenderContext {
    type Element = FakeElement;

    async fn navigate(&self, url: &str) -> Result<(), RenderError> {
        self.state.borrow_mut().visited.push(url.to_string());
        if self.failing.contains(url) {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        let snapshots = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| RenderError::Navigation {
                url: url.to_string(),
                reason: "404".to_string(),
            })?;
        self.load(snapshots);
        Ok(())
    }

    async fn add_cookie(&self, cookie: &SessionCookie) -> Result<(), RenderError> {
        let mut state = self.state.borrow_mut();
        if state.page.is_none() {
            return Err(RenderError::Driver("cookies need a loaded page".to_string()));
        }
        state.cookies.push(cookie.clone());
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<FakeElement>, RenderError> {
        let sel = parse_selector(selector)?;
        let mut state = self.state.borrow_mut();
        let generation = state.generation;
        let page = state
            .page
            .as_mut()
            .ok_or_else(|| RenderError::Driver("no page loaded".to_string()))?;

        let found = page
            .doc
            .select(&sel)
            .map(|e| handle_for(&page.doc, generation, e))
            .collect::<Result<Vec<_>, _>>()?;

        if page.cursor + 1 < page.snapshots.len() {
            page.cursor += 1;
            page.doc = Html::parse_document(&page.snapshots[page.cursor]);
            state.generation += 1;
        }
        Ok(found)
    }

    async fn query_within(
        &self,
        scope: &FakeElement,
        selector: &str,
    ) -> Result<Vec<FakeElement>, RenderError> {
        let sel = parse_selector(selector)?;
        self.with_element(scope, |element, doc, generation| {
            element
                .select(&sel)
                .map(|e| handle_for(doc, generation, e))
                .collect()
        })
    }

    async fn parent(&self, element: &FakeElement) -> Result<FakeElement, RenderError> {
        self.with_element(element, |element, doc, generation| {
            let parent = element
                .parent()
                .and_then(ElementRef::wrap)
                .ok_or_else(|| RenderError::NotFound("parent".to_string()))?;
            handle_for(doc, generation, parent)
        })
    }

    async fn read_text(&self, element: &FakeElement) -> Result<String, RenderError> {
        self.with_element(element, |element, _, _| {
            Ok(element
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n"))
        })
    }

    async fn attribute(
        &self,
        element: &FakeElement,
        name: &str,
    ) -> Result<Option<String>, RenderError> {
        self.with_element(element, |element, _, _| {
            Ok(element.value().attr(name).map(str::to_string))
        })
    }

    async fn click(&self, element: &FakeElement) -> Result<(), RenderError> {
        let id = self.with_element(element, |element, _, _| {
            Ok(element.value().attr("id").map(str::to_string))
        })?;
        if let Some(html) = id.and_then(|id| self.clicks.get(&id).cloned()) {
            self.load(vec![html]);
        }
        Ok(())
    }

    async fn close(self) -> Result<(), RenderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_snapshots_advance_per_query() {
        let ctx = FakeRenderContext::new().page_snapshots(
            "https://x/p",
            &["<ul></ul>", "<ul><li>a</li></ul>", "<ul><li>a</li><li>b</li></ul>"],
        );
        ctx.navigate("https://x/p").await.unwrap();
        assert_eq!(ctx.query_all("li").await.unwrap().len(), 0);
        assert_eq!(ctx.query_all("li").await.unwrap().len(), 1);
        assert_eq!(ctx.query_all("li").await.unwrap().len(), 2);
        assert_eq!(ctx.query_all("li").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_text_parent_and_attributes() {
        let ctx = FakeRenderContext::new().page(
            "https://x/p",
            r#"<div id="outer"><p data-key="7"><span>Line one</span> <b>Line two</b></p></div>"#,
        );
        ctx.navigate("https://x/p").await.unwrap();
        let p = ctx.query_all("p").await.unwrap().remove(0);
        assert_eq!(ctx.read_text(&p).await.unwrap(), "Line one\nLine two");
        assert_eq!(ctx.attribute(&p, "data-key").await.unwrap().as_deref(), Some("7"));
        let outer = ctx.parent(&p).await.unwrap();
        assert_eq!(ctx.attribute(&outer, "id").await.unwrap().as_deref(), Some("outer"));
        let spans = ctx.query_within(&outer, "span").await.unwrap();
        assert_eq!(spans.len(), 1);
    }

    #[tokio::test]
    async fn test_click_script_and_stale_handles() {
        let ctx = FakeRenderContext::new()
            .page("https://x/p", r#"<button id="go">Go</button>"#)
            .on_click("go", "<table><tr data-key='1'><td>x</td></tr></table>");
        ctx.navigate("https://x/p").await.unwrap();
        let button = ctx.query_all("#go").await.unwrap().remove(0);
        ctx.click(&button).await.unwrap();
        assert_eq!(ctx.query_all("tr[data-key]").await.unwrap().len(), 1);
        assert!(ctx.read_text(&button).await.is_err());
    }

    #[tokio::test]
    async fn test_failing_and_unknown_urls() {
        let ctx = FakeRenderContext::new().failing("https://x/broken");
        assert!(ctx.navigate("https://x/broken").await.is_err());
        assert!(ctx.navigate("https://x/missing").await.is_err());
        assert_eq!(ctx.visited().len(), 2);
    }
}

//! Page fragment loading for the three viewer variants.
//!
//! Fragments are fetched strictly in declared order, one at a time. A failed
//! fetch never aborts loading: it is logged and replaced by an inline
//! placeholder block. There are no retries and no cancellation.

use std::sync::LazyLock;

use flipbook_protocol::{PageData, Size};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::html::escape;

/// Page height / width used when the real ratio cannot be determined (A4).
pub const DEFAULT_ASPECT_RATIO: f64 = 1.414;

pub const NO_PAGES_HTML: &str = r#"<p style="text-align:center;">no pages to display</p>"#;

#[allow(clippy::expect_used)]
static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']*)["']"#)
        .expect("BUG: invalid IMG_SRC_RE regex literal")
});

#[allow(clippy::expect_used)]
static BACKGROUND_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#"(?i)background(?:-image)?\s*:[^;"]*?url\(\s*"#,
        r#"(?:&quot;|['"])?([^'")&]+)(?:&quot;|['"])?\s*\)"#,
    ))
    .expect("BUG: invalid BACKGROUND_URL_RE regex literal")
});

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("failed to read body of {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    pub fn is_http(&self) -> bool {
        matches!(self, Self::Status { .. })
    }
}

/// Fetches page fragments (`fetch` in the browser).
#[allow(async_fn_in_trait)]
pub trait FragmentFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// The element fragments are appended to, in arrival order.
pub trait FragmentSink {
    fn append_html(&mut self, html: &str);
}

impl FragmentSink for String {
    fn append_html(&mut self, html: &str) {
        self.push_str(html);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    /// URLs that were replaced by a placeholder.
    pub failed: Vec<String>,
}

/// Fetch `urls` one after another and append each fragment to `sink` as it
/// arrives. Used by the continuous-scroll viewer.
pub async fn load_sequential<F, S>(
    urls: Option<&[String]>,
    fetcher: &F,
    sink: Option<&mut S>,
) -> LoadReport
where
    F: FragmentFetcher + ?Sized,
    S: FragmentSink + ?Sized,
{
    let mut report = LoadReport::default();
    let (Some(urls), Some(sink)) = (urls, sink) else {
        log::error!("loader: pages to load or content container not found");
        return report;
    };

    for url in urls {
        match fetcher.fetch(url).await {
            Ok(fragment) => {
                sink.append_html(&fragment);
                report.loaded += 1;
            }
            Err(e) => {
                log::error!("loader: failed to load page {url}: {e}");
                sink.append_html(&scroll_error_html(url));
                report.failed.push(url.clone());
            }
        }
    }
    report
}

fn scroll_error_html(url: &str) -> String {
    format!(
        concat!(
            r#"<p class="load-error" style="color:red;text-align:center;">"#,
            "content failed to load: {}</p>",
        ),
        escape(url)
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchLoad {
    /// The manifest was empty; show [`NO_PAGES_HTML`] instead of a book.
    NoPages,
    Loaded {
        /// All fragments joined in manifest order.
        html: String,
        /// Background images of successfully loaded pages, to be decoded
        /// before the book is laid out.
        background_images: Vec<String>,
        failed: usize,
    },
}

/// Fetch every page of the single-page manifest before anything is shown.
pub async fn load_batch<F>(pages: &[PageData], fetcher: &F) -> BatchLoad
where
    F: FragmentFetcher + ?Sized,
{
    if pages.is_empty() {
        return BatchLoad::NoPages;
    }

    let mut html = String::new();
    let mut background_images = Vec::new();
    let mut failed = 0;
    for page in pages {
        match fetcher.fetch(&page.url).await {
            Ok(fragment) => {
                background_images.extend(background_image_urls(&fragment));
                html.push_str(&fragment);
            }
            Err(e) => {
                log::error!("loader: failed to load page {}: {e}", page.url);
                html.push_str(&missing_page_html(&e));
                failed += 1;
            }
        }
    }
    BatchLoad::Loaded {
        html,
        background_images,
        failed,
    }
}

fn missing_page_html(error: &FetchError) -> String {
    let message = if error.is_http() {
        "page failed to load"
    } else {
        "network error"
    };
    format!(concat!(
        r#"<div class="turn-page missing-page">"#,
        r#"<div class="error-content"><p>{message}</p></div></div>"#,
    ), message = message)
}

/// URLs referenced by `background`/`background-image` declarations.
pub fn background_image_urls(fragment: &str) -> Vec<String> {
    BACKGROUND_URL_RE
        .captures_iter(fragment)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|u| !u.is_empty())
        .collect()
}

/// URL of the fragment for page `n` in the double-page layout.
pub fn double_page_url(page: u32) -> String {
    format!("pages/page-{page}.html")
}

/// A page the flip library asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingPage {
    pub page: u32,
    /// Content to put in the page element. `None` leaves it empty (a failed
    /// first page is the blank inside cover).
    pub html: Option<String>,
}

/// Load the pages the flip library reports missing, in the order given.
pub async fn load_missing<F>(pages: &[u32], fetcher: &F) -> Vec<MissingPage>
where
    F: FragmentFetcher + ?Sized,
{
    let mut out = Vec::with_capacity(pages.len());
    for &page in pages {
        let url = double_page_url(page);
        let html = match fetcher.fetch(&url).await {
            Ok(fragment) => Some(fragment),
            Err(e) => {
                log::warn!("loader: page {page} failed to load: {e}");
                (page > 1).then(|| {
                    r#"<div class="page-placeholder"><h3>page failed to load</h3></div>"#.to_owned()
                })
            }
        };
        out.push(MissingPage { page, html });
    }
    out
}

/// First step of measuring the book's page aspect ratio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AspectProbe {
    /// Load this image and report its natural size to [`resolve_aspect_ratio`].
    Image(String),
    /// Use [`DEFAULT_ASPECT_RATIO`].
    Default,
}

/// Find the image whose natural size gives the page aspect ratio.
///
/// Page 2 is used because page 1 is usually a blank cover side. Books with a
/// single page, a failed fetch, or no `<img>` fall back to the default.
pub async fn probe_aspect_ratio<F>(total_pages: u32, fetcher: &F) -> AspectProbe
where
    F: FragmentFetcher + ?Sized,
{
    if total_pages <= 1 {
        return AspectProbe::Default;
    }
    let fragment = match fetcher.fetch(&double_page_url(2)).await {
        Ok(f) => f,
        Err(e) => {
            log::warn!("loader: aspect probe failed: {e}");
            return AspectProbe::Default;
        }
    };
    match first_img_src(&fragment) {
        // Fragment paths are relative to `pages/`, the book to the index page.
        Some(src) => AspectProbe::Image(src.replacen("../", "", 1)),
        None => AspectProbe::Default,
    }
}

/// Height / width of the probed image, or the default when it failed to load.
pub fn resolve_aspect_ratio(natural: Option<Size>) -> f64 {
    natural
        .and_then(|s| s.aspect_hw())
        .unwrap_or(DEFAULT_ASPECT_RATIO)
}

fn first_img_src(fragment: &str) -> Option<String> {
    IMG_SRC_RE
        .captures(fragment)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// Serves canned responses and records the order of requests.
    #[derive(Debug, Default)]
    pub struct FakeFetcher {
        pub responses: HashMap<String, Result<String, u16>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn ok(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_owned(), Ok(body.to_owned()));
            self
        }

        pub fn status(mut self, url: &str, status: u16) -> Self {
            self.responses.insert(url.to_owned(), Err(status));
            self
        }
    }

    impl FragmentFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requests.borrow_mut().push(url.to_owned());
            match self.responses.get(url) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(status)) => Err(FetchError::Status {
                    url: url.to_owned(),
                    status: *status,
                }),
                None => Err(FetchError::Network {
                    url: url.to_owned(),
                    message: "connection refused".into(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeFetcher;
    use super::*;
    use pollster::block_on;

    #[test]
    fn sequential_keeps_order_and_inlines_errors() {
        let fetcher = FakeFetcher::default()
            .ok("p1.html", "<section>1</section>")
            .status("p2.html", 404)
            .ok("p3.html", "<section>3</section>");
        let urls = vec!["p1.html".to_owned(), "p2.html".to_owned(), "p3.html".to_owned()];
        let mut container = String::new();

        let report =
            block_on(load_sequential(Some(urls.as_slice()), &fetcher, Some(&mut container)));

        assert_eq!(report.loaded, 2);
        assert_eq!(report.failed, vec!["p2.html".to_owned()]);
        let first = container.find("<section>1</section>").unwrap();
        let error = container.find("content failed to load: p2.html").unwrap();
        let third = container.find("<section>3</section>").unwrap();
        assert!(first < error && error < third);
        assert_eq!(*fetcher.requests.borrow(), urls);
    }

    #[test]
    fn sequential_without_manifest_does_nothing() {
        let fetcher = FakeFetcher::default();
        let mut container = String::new();
        let report = block_on(load_sequential(None, &fetcher, Some(&mut container)));
        assert_eq!(report, LoadReport::default());
        assert!(container.is_empty());

        let urls = vec!["p1.html".to_owned()];
        let report = block_on(load_sequential::<_, String>(Some(urls.as_slice()), &fetcher, None));
        assert_eq!(report.loaded, 0);
        assert!(fetcher.requests.borrow().is_empty());
    }

    #[test]
    fn batch_placeholders_distinguish_http_and_network() {
        let fetcher = FakeFetcher::default()
            .ok(
                "pages/p1.html",
                r#"<div class="turn-page" style="background-image: url('images/p1.jpg')"></div>"#,
            )
            .status("pages/p2.html", 500);
        let pages = vec![
            PageData { url: "pages/p1.html".into(), width: 800.0, height: 1131.0 },
            PageData { url: "pages/p2.html".into(), width: 800.0, height: 1131.0 },
            PageData { url: "pages/p3.html".into(), width: 800.0, height: 1131.0 },
        ];
        let batch = block_on(load_batch(&pages, &fetcher));
        let BatchLoad::Loaded { html, background_images, failed } = batch else {
            panic!("expected loaded batch");
        };
        assert_eq!(failed, 2);
        assert_eq!(background_images, vec!["images/p1.jpg".to_owned()]);
        let ok = html.find("images/p1.jpg").unwrap();
        let http = html.find("page failed to load").unwrap();
        let network = html.find("network error").unwrap();
        assert!(ok < http && http < network);
        assert_eq!(html.matches("turn-page missing-page").count(), 2);
    }

    #[test]
    fn batch_without_pages() {
        let fetcher = FakeFetcher::default();
        assert_eq!(block_on(load_batch(&[], &fetcher)), BatchLoad::NoPages);
    }

    #[test]
    fn background_urls_in_attribute_forms() {
        let html = concat!(
            r#"<div style="background-image:url(&quot;a.png&quot;)"></div>"#,
            r#"<div style="background: #fff url(b.jpg) no-repeat"></div>"#,
        );
        assert_eq!(background_image_urls(html), vec!["a.png".to_owned(), "b.jpg".to_owned()]);
    }

    #[test]
    fn missing_pages_get_placeholders_except_cover() {
        let fetcher = FakeFetcher::default().ok("pages/page-3.html", "<img src='x.png'>");
        let loaded = block_on(load_missing(&[1, 2, 3], &fetcher));
        assert_eq!(loaded[0], MissingPage { page: 1, html: None });
        assert!(loaded[1].html.as_deref().is_some_and(|h| h.contains("page-placeholder")));
        assert_eq!(loaded[2].html.as_deref(), Some("<img src='x.png'>"));
        assert_eq!(
            *fetcher.requests.borrow(),
            vec!["pages/page-1.html", "pages/page-2.html", "pages/page-3.html"]
        );
    }

    #[test]
    fn aspect_probe() {
        let fetcher = FakeFetcher::default().ok(
            "pages/page-2.html",
            r#"<div class="page"><img class="bg" src="../images/page-2.jpg" alt=""></div>"#,
        );
        assert_eq!(
            block_on(probe_aspect_ratio(10, &fetcher)),
            AspectProbe::Image("images/page-2.jpg".into())
        );
        assert_eq!(block_on(probe_aspect_ratio(1, &fetcher)), AspectProbe::Default);

        let no_img = FakeFetcher::default().ok("pages/page-2.html", "<p>text</p>");
        assert_eq!(block_on(probe_aspect_ratio(4, &no_img)), AspectProbe::Default);
        let failing = FakeFetcher::default();
        assert_eq!(block_on(probe_aspect_ratio(4, &failing)), AspectProbe::Default);
    }

    #[test]
    fn aspect_resolution() {
        assert_eq!(resolve_aspect_ratio(Some(Size::new(1000.0, 1500.0))), 1.5);
        assert_eq!(resolve_aspect_ratio(Some(Size::new(0.0, 0.0))), DEFAULT_ASPECT_RATIO);
        assert_eq!(resolve_aspect_ratio(None), DEFAULT_ASPECT_RATIO);
    }
}

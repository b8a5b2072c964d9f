//! Outline (table of contents) markup and link parsing.

use flipbook_protocol::OutlineItem;

use crate::html::escape;

/// How outline entries address their page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlineLinkStyle {
    /// `href='#' data-page='N'`, handled by the flip controller.
    DataPage,
    /// `href='{prefix}N'`, e.g. `#page/` or `#page-`.
    HashPrefix(&'static str),
}

/// Render the nested `<ul>` for the sidebar using `data-page` links.
pub fn render_outline(items: &[OutlineItem]) -> String {
    render_outline_with(items, OutlineLinkStyle::DataPage)
}

/// Render the nested `<ul>`; an empty outline renders as nothing.
pub fn render_outline_with(items: &[OutlineItem], style: OutlineLinkStyle) -> String {
    let mut html = String::new();
    push_list(&mut html, items, style);
    html
}

fn push_list(html: &mut String, items: &[OutlineItem], style: OutlineLinkStyle) {
    if items.is_empty() {
        return;
    }
    html.push_str("<ul>");
    for item in items {
        let title = escape(&item.title);
        match style {
            OutlineLinkStyle::DataPage => {
                html.push_str(&format!("<li><a href='#' data-page='{}'>{title}</a>", item.page));
            }
            OutlineLinkStyle::HashPrefix(prefix) => {
                html.push_str(&format!("<li><a href='{prefix}{}'>{title}</a>", item.page));
            }
        }
        push_list(html, &item.children, style);
        html.push_str("</li>");
    }
    html.push_str("</ul>");
}

/// Target of a clicked outline link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutlineLink {
    Page(u32),
    /// In-document anchor id, without the leading `#`.
    Anchor(String),
    None,
}

impl OutlineLink {
    /// Interpret a link from its `href` and `data-page` attributes.
    ///
    /// A positive `data-page` wins; then `#page/N`; then any other `#id`.
    pub fn parse(href: Option<&str>, data_page: Option<&str>) -> Self {
        if let Some(page) = data_page.and_then(parse_page) {
            return Self::Page(page);
        }
        let Some(fragment) = href.and_then(|h| h.trim().strip_prefix('#')) else {
            return Self::None;
        };
        if let Some(n) = fragment.strip_prefix("page/") {
            return parse_page(n).map_or(Self::None, Self::Page);
        }
        if fragment.is_empty() {
            Self::None
        } else {
            Self::Anchor(fragment.to_owned())
        }
    }
}

fn parse_page(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<OutlineItem> {
        vec![
            OutlineItem::new("Intro", 1),
            OutlineItem::new("Part <A>", 3).with_children(vec![OutlineItem::new("Detail", 4)]),
        ]
    }

    #[test]
    fn nested_data_page_markup() {
        assert_eq!(
            render_outline(&sample()),
            "<ul><li><a href='#' data-page='1'>Intro</a></li>\
             <li><a href='#' data-page='3'>Part &lt;A&gt;</a>\
             <ul><li><a href='#' data-page='4'>Detail</a></li></ul></li></ul>"
        );
    }

    #[test]
    fn hash_prefix_markup() {
        let html = render_outline_with(&sample()[..1], OutlineLinkStyle::HashPrefix("#page-"));
        assert_eq!(html, "<ul><li><a href='#page-1'>Intro</a></li></ul>");
    }

    #[test]
    fn empty_outline_renders_nothing() {
        assert_eq!(render_outline(&[]), "");
    }

    #[test]
    fn link_parsing() {
        assert_eq!(OutlineLink::parse(Some("#"), Some("12")), OutlineLink::Page(12));
        assert_eq!(OutlineLink::parse(Some("#page/5"), None), OutlineLink::Page(5));
        assert_eq!(OutlineLink::parse(Some("#page/x"), None), OutlineLink::None);
        assert_eq!(
            OutlineLink::parse(Some("#page-5"), None),
            OutlineLink::Anchor("page-5".into())
        );
        assert_eq!(OutlineLink::parse(Some("#"), Some("0")), OutlineLink::None);
        assert_eq!(OutlineLink::parse(Some("https://x"), None), OutlineLink::None);
        assert_eq!(OutlineLink::parse(None, None), OutlineLink::None);
    }
}

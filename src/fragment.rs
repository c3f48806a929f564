//! # Fragment Location
//!
//! Isolates the part of a page that lists a category's events. Pages are
//! parsed with html5ever (through `scraper`), which repairs malformed markup
//! instead of rejecting it, so an anchor can be found even when the rest of
//! the document is broken.

use scraper::{ElementRef, Html};
use std::collections::BTreeSet;
use tracing::debug;

/// Serialized HTML subtree rooted at an anchor element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Identifier the fragment was located by
    pub anchor_id: String,

    /// Outer HTML of the anchor element
    pub html: String,
}

impl Fragment {
    pub fn as_str(&self) -> &str {
        &self.html
    }
}

fn find_anchor<'a>(document: &'a Html, anchor_id: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().id() == Some(anchor_id))
}

/// Locate the subtree whose root carries `id="anchor_id"`.
///
/// Returns `None` when no element matches. The first match in document order
/// wins if the page repeats an id.
pub fn locate(html: &str, anchor_id: &str) -> Option<Fragment> {
    let document = Html::parse_document(html);

    let fragment = find_anchor(&document, anchor_id).map(|element| Fragment {
        anchor_id: anchor_id.to_string(),
        html: element.html(),
    });

    match &fragment {
        Some(f) => debug!("Located #{} ({} bytes)", anchor_id, f.html.len()),
        None => debug!("Anchor #{} not found", anchor_id),
    }

    fragment
}

/// Collect links inside the anchor's subtree whose `href` starts with `prefix`.
///
/// Links are de-duplicated and sorted. A missing anchor yields no links.
pub fn discover_links(html: &str, anchor_id: &str, prefix: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Some(anchor) = find_anchor(&document, anchor_id) else {
        return Vec::new();
    };

    anchor
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "a")
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| href.starts_with(prefix))
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Selector;

    const PAGE: &str = r#"
        <html>
          <head><title>CosmoCaixa</title></head>
          <body>
            <nav><a href="https://cosmocaixa.org/es/p/menu">Menú</a></nav>
            <section id="portlet_listactivities_INSTANCE_Q4EA43110XIZ">
              <article>
                <h3>Taller de robótica</h3>
                <a href="https://cosmocaixa.org/es/p/taller-robotica">Ver</a>
                <a href="https://cosmocaixa.org/es/p/taller-robotica">Comprar</a>
              </article>
              <article>
                <h3>Visita guiada</h3>
                <a href="https://cosmocaixa.org/es/p/visita">Ver</a>
                <a href="/es/contacto">Contacto</a>
              </article>
            </section>
            <footer><p>Fuera del listado</p></footer>
          </body>
        </html>
    "#;

    #[test]
    fn test_locate_returns_only_anchor_subtree() {
        let fragment = locate(PAGE, "portlet_listactivities_INSTANCE_Q4EA43110XIZ").unwrap();

        assert!(fragment.html.starts_with("<section"));
        assert!(fragment.html.contains("Taller de robótica"));
        assert!(fragment.html.contains("Visita guiada"));
        assert!(!fragment.html.contains("Menú"));
        assert!(!fragment.html.contains("Fuera del listado"));
        assert!(!fragment.html.contains("<title>"));

        let reparsed = Html::parse_fragment(&fragment.html);
        let nav = Selector::parse("nav, footer, head").unwrap();
        assert_eq!(reparsed.select(&nav).count(), 0);
    }

    #[test]
    fn test_locate_missing_anchor() {
        assert!(locate(PAGE, "portlet_listactivities_INSTANCE_u3YZVHkpD017").is_none());
        assert!(locate("", "anything").is_none());
    }

    #[test]
    fn test_locate_tolerates_malformed_html() {
        let broken = r#"<html><body><div class="x"><p>unclosed <b>bold
            <ul id="target"><li>Planetario <i>Bubble</li><li>Dos</ul>
            <table><tr><td>stray</div></body>"#;

        let fragment = locate(broken, "target").unwrap();

        assert!(fragment.html.starts_with("<ul"));
        assert!(fragment.html.contains("Planetario"));
        assert!(fragment.html.contains("Dos"));
        assert!(!fragment.html.contains("stray"));
    }

    #[test]
    fn test_locate_id_is_exact_match() {
        let html = r#"<div id="target-extra">no</div><div id="target">yes</div>"#;
        let fragment = locate(html, "target").unwrap();

        assert_eq!(fragment.html, r#"<div id="target">yes</div>"#);
    }

    #[test]
    fn test_discover_links_filters_and_dedupes() {
        let links = discover_links(
            PAGE,
            "portlet_listactivities_INSTANCE_Q4EA43110XIZ",
            "https://cosmocaixa.org/es/p/",
        );

        assert_eq!(
            links,
            vec![
                "https://cosmocaixa.org/es/p/taller-robotica".to_string(),
                "https://cosmocaixa.org/es/p/visita".to_string(),
            ]
        );
    }

    #[test]
    fn test_discover_links_missing_anchor() {
        assert!(discover_links(PAGE, "nope", "https://").is_empty());
    }
}

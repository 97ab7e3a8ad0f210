use scraper::{Html, Selector};
use std::sync::OnceLock;

/// Image alt attribute coverage for a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageAltStats {
    pub total: usize,
    pub missing_alt: usize,
}

pub struct PageExtractor;

impl PageExtractor {
    pub fn extract_title(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("title").unwrap());
        html.select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn extract_meta_description(html: &Html) -> Option<String> {
        Self::extract_meta_content(html, "description")
    }

    /// Content of the first `<meta name=..>` or `<meta property=..>` with the given key.
    pub fn extract_meta_content(html: &Html, key: &str) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("meta[content]").unwrap());
        html.select(selector)
            .find(|el| {
                let v = el.value();
                v.attr("name")
                    .or_else(|| v.attr("property"))
                    .map(|name| name.eq_ignore_ascii_case(key))
                    .unwrap_or(false)
            })
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Every canonical href on the page, in document order.
    pub fn extract_canonicals(html: &Html) -> Vec<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("link[rel][href]").unwrap());
        html.select(selector)
            .filter(|el| {
                el.value()
                    .attr("rel")
                    .map(|rel| {
                        rel.split_whitespace()
                            .any(|r| r.eq_ignore_ascii_case("canonical"))
                    })
                    .unwrap_or(false)
            })
            .filter_map(|el| el.value().attr("href"))
            .map(|s| s.trim().to_string())
            .collect()
    }

    pub fn extract_lang(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("html[lang]").unwrap());
        html.select(selector)
            .next()
            .and_then(|el| el.value().attr("lang"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    pub fn count_h1(html: &Html) -> usize {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("h1").unwrap());
        html.select(selector)
            .filter(|el| !el.text().collect::<String>().trim().is_empty())
            .count()
    }

    pub fn image_alt_stats(html: &Html) -> ImageAltStats {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("img").unwrap());

        html.select(selector)
            .fold(ImageAltStats::default(), |mut stats, img| {
                stats.total += 1;
                let decorative = img.value().attr("role") == Some("presentation")
                    || img.value().attr("aria-hidden") == Some("true");
                if img.value().attr("alt").is_none() && !decorative {
                    stats.missing_alt += 1;
                }
                stats
            })
    }

    pub fn extract_word_count(html: &Html) -> usize {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("body").unwrap());
        html.select(selector)
            .next()
            .map(|body| body.text().collect::<String>().split_whitespace().count())
            .unwrap_or(0)
    }

    /// Raw text of every `<script type="application/ld+json">` block.
    pub fn extract_json_ld_blocks(html: &Html) -> Vec<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("script[type]").unwrap());
        html.select(selector)
            .filter(|el| {
                el.value()
                    .attr("type")
                    .map(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
                    .unwrap_or(false)
            })
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html lang="en">
        <head>
            <title>  Widgets for every occasion  </title>
            <meta name="description" content="All the widgets.">
            <meta property="og:title" content="Widgets">
            <link rel="canonical" href="https://example.com/widgets">
            <script type="application/ld+json">{"@type":"Product"}</script>
            <script type="Application/LD+JSON">
                {"@type":"Organization"}
            </script>
            <script type="text/javascript">var x = 1;</script>
        </head>
        <body>
            <h1>Widgets</h1>
            <h1>  </h1>
            <img src="a.png" alt="A widget">
            <img src="b.png">
            <img src="c.png" role="presentation">
            <p>one two three</p>
        </body>
        </html>
    "#;

    #[test]
    fn extracts_head_metadata() {
        let html = Html::parse_document(PAGE);
        assert_eq!(
            PageExtractor::extract_title(&html).as_deref(),
            Some("Widgets for every occasion")
        );
        assert_eq!(
            PageExtractor::extract_meta_description(&html).as_deref(),
            Some("All the widgets.")
        );
        assert_eq!(
            PageExtractor::extract_meta_content(&html, "og:title").as_deref(),
            Some("Widgets")
        );
        assert_eq!(PageExtractor::extract_lang(&html).as_deref(), Some("en"));
        assert_eq!(
            PageExtractor::extract_canonicals(&html),
            vec!["https://example.com/widgets".to_string()]
        );
    }

    #[test]
    fn extracts_json_ld_blocks_case_insensitively() {
        let html = Html::parse_document(PAGE);
        let blocks = PageExtractor::extract_json_ld_blocks(&html);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], r#"{"@type":"Product"}"#);
        assert!(blocks[1].contains("Organization"));
    }

    #[test]
    fn counts_body_elements() {
        let html = Html::parse_document(PAGE);
        assert_eq!(PageExtractor::count_h1(&html), 1);
        assert_eq!(
            PageExtractor::image_alt_stats(&html),
            ImageAltStats {
                total: 3,
                missing_alt: 1
            }
        );
        assert_eq!(PageExtractor::extract_word_count(&html), 4);
    }
}

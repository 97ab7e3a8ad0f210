use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, Event};
use url::Url;

pub const SITE_MAP_PATH: &str = "/sitemap.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapFormat {
    Xml,
    PlainText,
}

/// Parsed view of a sitemap body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapDocument {
    /// Local name of the root element (`urlset`, `sitemapindex`) for XML sitemaps.
    pub root: Option<String>,
    pub urls: Vec<String>,
    pub lastmod_count: usize,
    pub parse_error: Option<String>,
}

impl SitemapDocument {
    pub fn is_index(&self) -> bool {
        self.root.as_deref() == Some("sitemapindex")
    }

    pub fn has_valid_root(&self) -> bool {
        matches!(self.root.as_deref(), Some("urlset") | Some("sitemapindex"))
    }
}

impl SitemapFormat {
    pub fn detect(text: &str) -> Self {
        match text.trim_start().starts_with('<') || text.contains("<loc>") {
            true => SitemapFormat::Xml,
            false => SitemapFormat::PlainText,
        }
    }

    pub fn parse(&self, text: &str) -> SitemapDocument {
        match self {
            SitemapFormat::Xml => Self::parse_xml(text),
            SitemapFormat::PlainText => SitemapDocument {
                root: None,
                urls: Self::extract_from_plain_text(text),
                lastmod_count: 0,
                parse_error: None,
            },
        }
    }

    fn parse_xml(text: &str) -> SitemapDocument {
        let mut reader = quick_xml::Reader::from_str(text);
        let mut doc = SitemapDocument::default();
        let mut buf = Vec::new();
        let mut in_loc_tag = false;
        let mut loc_text = String::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = e.local_name();
                    let name = name.as_ref();
                    if doc.root.is_none() {
                        doc.root = Some(String::from_utf8_lossy(name).into_owned());
                    }
                    match name {
                        b"loc" => {
                            in_loc_tag = true;
                            loc_text.clear();
                        }
                        b"lastmod" => doc.lastmod_count += 1,
                        _ => {}
                    }
                }
                Ok(Event::Empty(ref e)) if doc.root.is_none() => {
                    doc.root = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Ok(Event::GeneralRef(ref e)) if in_loc_tag => match resolve_reference(e) {
                    Some(resolved) => loc_text.push_str(&resolved),
                    None => {
                        tracing::warn!(
                            "[SITEMAP] Unknown entity reference at {}",
                            reader.buffer_position()
                        );
                    }
                },
                Ok(Event::Text(e)) if in_loc_tag => match e.decode() {
                    Ok(txt) => loc_text.push_str(&txt),
                    Err(err) => {
                        tracing::warn!(
                            "[SITEMAP] Invalid URL text at {}: {}",
                            reader.buffer_position(),
                            err
                        );
                    }
                },
                Ok(Event::End(ref e)) if in_loc_tag && e.local_name().as_ref() == b"loc" => {
                    let url = loc_text.trim();
                    if !url.is_empty() {
                        doc.urls.push(url.to_string());
                    }
                    in_loc_tag = false;
                }
                Ok(Event::Eof) => break,
                Err(err) => {
                    doc.parse_error = Some(format!(
                        "XML error at position {}: {}",
                        reader.error_position(),
                        err
                    ));
                    break;
                }
                _ => {}
            }
            buf.clear();
        }
        doc
    }

    fn extract_from_plain_text(text: &str) -> Vec<String> {
        text.split_whitespace()
            .filter_map(|token| Url::parse(token).ok())
            .map(|url| url.to_string())
            .collect()
    }
}

/// Text for `&amp;`-style and numeric character references.
fn resolve_reference(reference: &BytesRef) -> Option<String> {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        return Some(ch.to_string());
    }
    let name = reference.decode().ok()?;
    resolve_predefined_entity(&name).map(str::to_string)
}

pub fn parse_sitemap(text: &str) -> SitemapDocument {
    SitemapFormat::detect(text).parse(text)
}

//! Image search results page scraping.
//!
//! The page layout is undocumented and changes without notice. Candidates
//! come from two places, in this order: `<img>` attributes in document order,
//! then image URLs embedded in inline `<script>` data.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

use super::Candidate;

const IMG_URL_ATTRS: &[&str] = &["data-iurl", "data-src", "src"];

struct PageSelectors {
    img: Selector,
    script: Selector,
    unicode_escape: Regex,
    embedded_url: Regex,
}

impl PageSelectors {
    fn get() -> Option<&'static Self> {
        static INSTANCE: OnceLock<Option<PageSelectors>> = OnceLock::new();
        INSTANCE
            .get_or_init(|| {
                Some(Self {
                    img: Selector::parse("img").ok()?,
                    script: Selector::parse("script").ok()?,
                    unicode_escape: Regex::new(r"\\u([0-9a-fA-F]{4})").ok()?,
                    embedded_url: Regex::new(
                        r#"(?i)https?://[^\s"'<>\\\[\]]+\.(?:gif|webp|png|jpe?g)(?:\?[^\s"'<>\\\[\]]*)?"#,
                    )
                    .ok()?,
                })
            })
            .as_ref()
    }
}

/// Collect every candidate URL on the page, duplicates included.
#[must_use]
pub fn candidates(body: &str) -> Vec<Candidate> {
    let Some(sel) = PageSelectors::get() else {
        return Vec::new();
    };

    let document = Html::parse_document(body);
    let mut out = Vec::new();

    for img in document.select(&sel.img) {
        out.extend(img_candidates(&img));
    }

    for script in document.select(&sel.script) {
        let text: String = script.text().collect();
        if text.is_empty() {
            continue;
        }
        out.extend(script_candidates(&text, sel));
    }

    out
}

fn img_candidates(img: &ElementRef<'_>) -> Vec<Candidate> {
    let element = img.value();
    let caption = element.attr("alt").map(ToString::to_string);

    IMG_URL_ATTRS
        .iter()
        .filter_map(|attr| element.attr(attr))
        .map(str::trim)
        .filter(|value| value.starts_with("http"))
        .map(|value| Candidate::new(value, caption.clone()))
        .collect()
}

fn script_candidates(text: &str, sel: &PageSelectors) -> Vec<Candidate> {
    let unescaped = unescape_script(text, &sel.unicode_escape);

    sel.embedded_url
        .find_iter(&unescaped)
        .map(|m| html_escape::decode_html_entities(m.as_str()).to_string())
        .map(|url| Candidate::new(url, None))
        .collect()
}

/// Undo the JSON string escaping inline data uses for URLs, e.g.
/// `https:\/\/x\/a.gif?w=1` becomes `https://x/a.gif?w=1`.
fn unescape_script(text: &str, unicode_escape: &Regex) -> String {
    let text = text.replace("\\/", "/");
    unicode_escape
        .replace_all(&text, |caps: &regex::Captures<'_>| {
            u32::from_str_radix(&caps[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

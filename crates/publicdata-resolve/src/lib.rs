#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Landing-page scanner: finds downloadable data assets in provider HTML and
//! extracts basic page metadata.
//!
//! # Design
//! - Pure text in, assets out; fetching the page is the caller's concern.
//! - Regex scanning over an HTML parser: portal markup is too irregular to
//!   reward a DOM, and the patterns stay auditable.
//! - Candidate links qualify by file extension alone; anything without an
//!   allow-listed suffix is someone else's link.
//! - Malformed markup never fails the scan. No matches means no assets.

use std::collections::HashSet;
use std::path::PathBuf;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ResolveError, Result};

pub mod error;

/// File extensions that qualify a link as a downloadable data asset.
pub const ALLOWED_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls", "zip", "json", "xml", "dat", "txt"];

const ANCHOR_PATTERN: &str = r#"(?is)<a\s+[^>]*href=["']([^"']+)["'][^>]*>(.*?)</a>"#;
const TITLE_PATTERN: &str = r"(?is)<title[^>]*>(.*?)</title>";
const H1_PATTERN: &str = r"(?is)<h1[^>]*>(.*?)</h1>";
const DESCRIPTION_PATTERN: &str =
    r#"(?i)<meta\s+name=["']description["']\s+content=["']([^"']*)["']"#;

/// A downloadable asset discovered on a landing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    /// Absolute download URL.
    pub url: String,
    /// Human-readable title, falling back to the URL basename.
    pub title: String,
    /// Lowercase file extension from [`ALLOWED_EXTENSIONS`].
    pub format: String,
    /// 1-based position in the resolved asset list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Where the asset was downloaded to, once fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
    /// Download failure message, when fetching this asset failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Asset {
    const fn new(url: String, title: String, format: String) -> Self {
        Self {
            url,
            title,
            format,
            rank: None,
            local_path: None,
            error: None,
        }
    }
}

/// Title and description extracted from a landing page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageMetadata {
    /// Page title from `<title>`, falling back to the first `<h1>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Contents of the `description` meta tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Scan `html` for downloadable data assets, absolutized against
/// `landing_url`.
///
/// Two patterns contribute candidates: anchor hrefs and
/// `data-url`/`data-href`/`data-download` attributes. Duplicate absolute
/// URLs collapse to their first occurrence, and surviving assets are ranked
/// in order of appearance starting at 1.
pub fn resolve_assets(html: &str, landing_url: &str) -> Result<Vec<Asset>> {
    let landing = Url::parse(landing_url).map_err(|source| ResolveError::LandingUrl {
        url: landing_url.to_string(),
        source,
    })?;
    let anchor_re = compile(ANCHOR_PATTERN)?;
    let attr_re = compile(&data_attr_pattern())?;

    let mut seen = HashSet::new();
    let mut assets = Vec::new();

    for captures in anchor_re.captures_iter(html) {
        let Some(href) = captures.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Some(format) = allowed_extension(href) else {
            continue;
        };
        let Some(url) = absolutize_url(href, &landing) else {
            debug!(href, "skipping unresolvable href");
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        let text = captures.get(2).map_or("", |m| m.as_str());
        let mut title = strip_tags(text);
        if title.is_empty() {
            title = url_basename(href);
        }
        assets.push(Asset::new(url, title, format));
    }

    for captures in attr_re.captures_iter(html) {
        let Some(href) = captures.get(1).map(|m| m.as_str()) else {
            continue;
        };
        let Some(format) = allowed_extension(href) else {
            continue;
        };
        let Some(url) = absolutize_url(href, &landing) else {
            debug!(href, "skipping unresolvable data attribute");
            continue;
        };
        if !seen.insert(url.clone()) {
            continue;
        }
        assets.push(Asset::new(url, url_basename(href), format));
    }

    for (index, asset) in assets.iter_mut().enumerate() {
        asset.rank = Some(u32::try_from(index + 1).unwrap_or(u32::MAX));
    }

    debug!(landing_url, count = assets.len(), "resolved landing page assets");
    Ok(assets)
}

/// Extract the page title and meta description from `html`.
pub fn extract_page_metadata(html: &str) -> Result<PageMetadata> {
    let title_re = compile(TITLE_PATTERN)?;
    let h1_re = compile(H1_PATTERN)?;
    let description_re = compile(DESCRIPTION_PATTERN)?;

    let from_pattern = |re: &Regex| {
        re.captures(html)
            .and_then(|captures| captures.get(1))
            .map(|m| strip_tags(m.as_str()))
            .filter(|text| !text.is_empty())
    };

    let title = from_pattern(&title_re).or_else(|| from_pattern(&h1_re));
    let description = description_re
        .captures(html)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|text| !text.is_empty());

    Ok(PageMetadata { title, description })
}

/// Remove HTML tags from `text` and trim surrounding whitespace.
#[must_use]
pub fn strip_tags(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => cleaned.push(ch),
            _ => {}
        }
    }
    cleaned.trim().to_string()
}

/// Absolutize `href` against the landing page URL.
///
/// Absolute `http(s)` URLs pass through, `//` inherits the landing scheme,
/// a leading `/` inherits scheme and authority, and anything else resolves
/// as a relative reference. Unresolvable hrefs yield `None`.
#[must_use]
pub fn absolutize_url(href: &str, landing: &Url) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with("//") {
        return Some(format!("{}:{href}", landing.scheme()));
    }
    if href.starts_with('/') {
        let host = landing.host_str()?;
        let authority = landing
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        return Some(format!("{}://{authority}{href}", landing.scheme()));
    }
    landing.join(href).ok().map(Into::into)
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ResolveError::RegexCompile {
        pattern: pattern.to_string(),
        source,
    })
}

fn data_attr_pattern() -> String {
    format!(
        r#"(?i)(?:data-url|data-href|data-download)=["']([^"']+\.(?:{}))["']"#,
        ALLOWED_EXTENSIONS.join("|")
    )
}

fn allowed_extension(href: &str) -> Option<String> {
    let lowered = href.to_ascii_lowercase();
    ALLOWED_EXTENSIONS
        .iter()
        .find(|ext| lowered.ends_with(&format!(".{ext}")))
        .map(|ext| (*ext).to_string())
}

fn url_basename(href: &str) -> String {
    href.rsplit('/')
        .next()
        .and_then(|name| name.split('?').next())
        .unwrap_or_default()
        .to_string()
}

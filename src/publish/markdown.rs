//! Document loading for the publisher: heading escaping, front-matter
//! parsing, template substitution, markdown rendering and asset-link
//! discovery.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use pulldown_cmark::{Options, Parser, html};
use regex::Regex;

/// Returns the compiled heading-marker pattern.
fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^(#{1,6})\s+").expect("valid heading pattern"))
}

/// Wraps literal markdown heading markers in template string literals so the
/// substitution pass re-emits them verbatim instead of interpreting them.
pub fn escape_headings(text: &str) -> String {
    heading_pattern()
        .replace_all(text, |caps: &regex::Captures<'_>| format!("{{{{ \"{}\" }}}} ", &caps[1]))
        .into_owned()
}

/// Splits a document into its front-matter mapping and remaining content.
///
/// A document without a leading front-matter block yields an empty mapping
/// and the full text.
pub fn split_front_matter(text: &str) -> Result<(serde_yaml::Mapping, String)> {
    let Some(rest) = text.strip_prefix("---") else {
        return Ok((serde_yaml::Mapping::new(), text.to_string()));
    };
    let Some((raw_metadata, content)) = rest.split_once("\n---") else {
        return Ok((serde_yaml::Mapping::new(), text.to_string()));
    };

    let metadata: serde_yaml::Mapping =
        serde_yaml::from_str(raw_metadata).context("Malformed front-matter block")?;
    let content = content.strip_prefix('\n').unwrap_or(content);
    Ok((metadata, content.to_string()))
}

/// Merges global metadata with document front-matter; the document wins on
/// conflicting keys.
pub fn merge_metadata(
    global: &serde_yaml::Mapping,
    document: &serde_yaml::Mapping,
) -> serde_yaml::Mapping {
    let mut merged = global.clone();
    for (key, value) in document {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Renders markdown to HTML with tables, footnotes and strikethrough
/// enabled.
pub fn markdown_to_html(markdown: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_FOOTNOTES | Options::ENABLE_STRIKETHROUGH;
    let mut out = String::new();
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

/// What kind of asset a link points at, which decides where the target file
/// is looked up and how the rewritten link is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    /// An `href` into a build output subdirectory.
    Link,
    /// An `src` into the images directory.
    Image,
}

/// A relative asset reference found in rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    /// Link or image.
    pub kind:   AssetKind,
    /// The relative target, exactly as it appears in the HTML.
    pub target: String,
}

/// Returns the compiled asset-href pattern.
fn href_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"href="((?:lecture|assessments|extra)/[^"]*)""#).expect("valid href pattern")
    })
}

/// Returns the compiled image-src pattern.
fn src_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"src="(images/[^"]*)""#).expect("valid src pattern"))
}

/// Finds relative links into the known build subdirectories (`lecture/`,
/// `assessments/`, `extra/`) and relative image sources (`images/`).
pub fn find_asset_refs(html: &str) -> Vec<AssetRef> {
    let mut refs = Vec::new();
    for caps in href_pattern().captures_iter(html) {
        refs.push(AssetRef {
            kind:   AssetKind::Link,
            target: caps[1].to_string(),
        });
    }
    for caps in src_pattern().captures_iter(html) {
        refs.push(AssetRef {
            kind:   AssetKind::Image,
            target: caps[1].to_string(),
        });
    }
    refs
}

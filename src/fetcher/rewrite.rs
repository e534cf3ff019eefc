//! Resource discovery and reference rewriting
//!
//! This module scans a parsed document for the resource references a local
//! mirror needs:
//! - `<img src="...">`
//! - `<link href="...">`
//! - `<script src="...">`
//!
//! The tags are scanned one kind at a time in that order, each kind in
//! document order. Only relative references are considered. Each one is
//! resolved against the document URL for downloading and mapped to a
//! deterministic path under the asset directory, which replaces the attribute
//! value in the serialized output. Absolute references are left exactly as
//! written.

use crate::fetcher::serializer::{serialize, Rewrites};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::{ParseError, Url};

/// Tag and attribute pairs that hold resource references
const RESOURCE_ATTRIBUTES: [(&str, &str); 3] = [("img", "src"), ("link", "href"), ("script", "src")];

/// A relative reference found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReference {
    /// Position of the owning element in document order
    pub element: usize,

    /// Tag name of the owning element
    pub tag: &'static str,

    /// Attribute the reference was read from
    pub attribute: &'static str,

    /// The attribute value as written in the document
    pub reference: String,

    /// The reference resolved against the document URL
    pub resolved: Url,

    /// Local path written back into the attribute
    pub local_path: String,
}

/// One local file and the resources that map onto it
///
/// Distinct URLs can collide on one path (`a.png` and `/a.png` from a page
/// below the site root). They are all downloaded, one after another, and the
/// file keeps the last body written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDownload {
    /// Destination path relative to the storage root
    pub local_path: String,

    /// Absolute URLs to fetch into the path, in scan order, without repeats
    pub urls: Vec<Url>,
}

impl AssetDownload {
    /// Returns true if more than one distinct URL maps onto this path
    pub fn is_collision(&self) -> bool {
        self.urls.len() > 1
    }
}

/// A document after its resource references have been rewritten
#[derive(Debug, Clone)]
pub struct RewrittenDocument {
    /// Serialized markup with local paths substituted
    pub html: String,

    /// Every rewritten reference, in scan order
    pub references: Vec<ResourceReference>,

    /// Downloads to dispatch, one per distinct local path
    pub assets: Vec<AssetDownload>,

    /// Number of `<a>` elements
    pub link_count: usize,

    /// Number of `<img>` elements
    pub image_count: usize,
}

/// Parses HTML, rewrites relative resource references, and serializes the result
///
/// The parse is lenient: malformed markup is repaired the way browsers do.
/// Several references mapping to the same local path are all rewritten and
/// share one [`AssetDownload`]; each distinct URL among them is fetched once.
///
/// # Arguments
///
/// * `html` - The document markup
/// * `base_url` - The document URL, used to resolve relative references
/// * `asset_dir` - Directory name the local paths are placed under
///
/// # Returns
///
/// * `Ok(RewrittenDocument)` - The rewritten markup and the work it implies
/// * `Err(String)` - The document could not be processed
///
/// # Example
///
/// ```
/// use fetch_webpage::fetcher::rewrite_document;
/// use url::Url;
///
/// let html = r#"<html><body><img src="a.png"></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let doc = rewrite_document(html, &base_url, "example.com.html_assets").unwrap();
/// assert!(doc.html.contains(r#"src="example.com.html_assets/a.png""#));
/// assert_eq!(doc.assets[0].urls[0].as_str(), "https://example.com/a.png");
/// ```
pub fn rewrite_document(
    html: &str,
    base_url: &Url,
    asset_dir: &str,
) -> Result<RewrittenDocument, String> {
    let document = Html::parse_document(html);

    let link_count = count_elements(&document, "a")?;
    let image_count = count_elements(&document, "img")?;

    let references = scan_references(&document, base_url, asset_dir);

    let mut rewrites = Rewrites::new();
    let mut asset_index: HashMap<&str, usize> = HashMap::new();
    let mut assets: Vec<AssetDownload> = Vec::new();
    for reference in &references {
        rewrites
            .entry(reference.element)
            .or_default()
            .push((reference.attribute, reference.local_path.clone()));

        match asset_index.get(reference.local_path.as_str()) {
            Some(&index) => {
                let asset = &mut assets[index];
                if !asset.urls.contains(&reference.resolved) {
                    asset.urls.push(reference.resolved.clone());
                }
            }
            None => {
                asset_index.insert(&reference.local_path, assets.len());
                assets.push(AssetDownload {
                    local_path: reference.local_path.clone(),
                    urls: vec![reference.resolved.clone()],
                });
            }
        }
    }

    let html = serialize(&document, &rewrites);

    Ok(RewrittenDocument {
        html,
        references,
        assets,
        link_count,
        image_count,
    })
}

fn count_elements(document: &Html, tag: &str) -> Result<usize, String> {
    let selector =
        Selector::parse(tag).map_err(|e| format!("invalid selector '{}': {:?}", tag, e))?;
    Ok(document.select(&selector).count())
}

/// Collects relative references: all images, then all links, then all
/// scripts, each kind in document order
fn scan_references(document: &Html, base_url: &Url, asset_dir: &str) -> Vec<ResourceReference> {
    let elements: Vec<(usize, ElementRef<'_>)> = document
        .tree
        .root()
        .descendants()
        .filter_map(ElementRef::wrap)
        .enumerate()
        .collect();

    let mut references = Vec::new();
    for &(tag, attribute) in &RESOURCE_ATTRIBUTES {
        for (position, element) in &elements {
            if element.value().name() != tag {
                continue;
            }

            let Some(value) = element.value().attr(attribute) else {
                continue;
            };

            if let Some((resolved, local_path)) = plan_reference(value, base_url, asset_dir) {
                references.push(ResourceReference {
                    element: *position,
                    tag,
                    attribute,
                    reference: value.to_string(),
                    resolved,
                    local_path,
                });
            }
        }
    }

    references
}

/// Decides what to do with one attribute value
///
/// Returns the resolved URL and the local path, or `None` when the value
/// must be left alone:
/// - absolute URLs (including `data:` and `javascript:`)
/// - values that do not parse as URLs at all
/// - references without a path to store (`""`, `"#top"`, `"?q=1"`)
fn plan_reference(value: &str, base_url: &Url, asset_dir: &str) -> Option<(Url, String)> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    match Url::parse(value) {
        Err(ParseError::RelativeUrlWithoutBase) => {}
        Ok(_) | Err(_) => return None,
    }

    let resolved = base_url.join(value).ok()?;
    let path = reference_path(value)?;

    Some((resolved, format!("{}/{}", asset_dir, path)))
}

/// Extracts and normalizes the path component of a relative reference
///
/// Query and fragment are dropped, so is the authority of a scheme-relative
/// reference. `.` segments vanish and `..` never climbs above the asset
/// directory. Returns `None` when nothing is left.
///
/// # Examples
///
/// ```
/// use fetch_webpage::fetcher::reference_path;
///
/// assert_eq!(reference_path("/js/app.js?v=3").as_deref(), Some("js/app.js"));
/// assert_eq!(reference_path("../img/./a.png").as_deref(), Some("img/a.png"));
/// assert_eq!(reference_path("//cdn.example.com/x.css").as_deref(), Some("x.css"));
/// assert_eq!(reference_path("#top"), None);
/// ```
pub fn reference_path(reference: &str) -> Option<String> {
    let end = reference
        .find(|c| c == '?' || c == '#').unwrap_or(reference.len());
    let mut path = &reference[..end];

    if let Some(rest) = path.strip_prefix("//") {
        path = rest.find('/').map(|slash| &rest[slash..]).unwrap_or("");
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

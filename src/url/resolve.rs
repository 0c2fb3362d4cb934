use crate::{UrlError, UrlResult};
use url::Url;

/// Returns true if `link` already carries an `http://` or `https://` scheme
pub fn has_scheme(link: &str) -> bool {
    let lower = link.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolves a link found on a page into an absolute URL
///
/// # Resolution Rules
///
/// 1. A link with an `http://` or `https://` scheme is returned unchanged
/// 2. A link starting with `/` replaces the base path
/// 3. Any other link is joined onto the directory of the base path
/// 4. The joined path is normalized (`.` and `..` collapsed, never above root)
/// 5. Scheme, host and port of the base are kept; its query and fragment are
///    replaced by the link's own (if any)
///
/// # Arguments
///
/// * `base_url` - URL of the page the link was found on
/// * `link` - The raw `href` value
///
/// # Returns
///
/// * `Ok(String)` - The absolute URL
/// * `Err(UrlError)` - `base_url` could not be parsed or has no host
///
/// # Examples
///
/// ```
/// use aozora_collector::url::resolve;
///
/// let url = resolve("https://h/cards/1/card2.html", "../../data.zip").unwrap();
/// assert_eq!(url, "https://h/data.zip");
/// ```
pub fn resolve(base_url: &str, link: &str) -> UrlResult<String> {
    let link = link.trim();
    if has_scheme(link) {
        return Ok(link.to_string());
    }

    let mut base =
        Url::parse(base_url).map_err(|e| UrlError::Parse(format!("{}: {}", base_url, e)))?;
    if base.host_str().is_none() {
        return Err(UrlError::MissingHost(base_url.to_string()));
    }

    let (rest, fragment) = match link.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (link, None),
    };
    let (link_path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let joined = if link_path.starts_with('/') {
        link_path.to_string()
    } else {
        format!("{}/{}", parent_dir(base.path()), link_path)
    };

    base.set_path(&normalize_path(&joined));
    base.set_query(query);
    base.set_fragment(fragment);

    Ok(base.to_string())
}

/// Returns the directory part of a URL path (`/a/b/c.html` -> `/a/b`)
fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}

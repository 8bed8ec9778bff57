// src/utils/url.rs

//! URL manipulation utilities.
//!
//! The slug builder maps an item title + identifier to its canonical
//! detail-page URL. Secret/limited listings bypass this (their detail pages
//! are not derivable) and keep the search-page URL instead.

/// Turn an item title into a URL slug.
///
/// Lowercases, maps whitespace runs to single hyphens, and drops everything
/// outside `[a-z0-9-]`.
///
/// # Examples
/// ```
/// use shelfwatch::utils::slugify;
///
/// assert_eq!(slugify("Ceramic Mug (Blue)"), "ceramic-mug-blue");
/// ```
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_hyphen = true;

    for c in title.chars() {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() {
            slug.push(lower);
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Build the canonical detail-page URL for an item.
///
/// Returns `None` when the title slugs to nothing; such listings are not
/// addressable and the caller decides whether to fall back or skip.
pub fn detail_url(base_url: &str, title: &str, id: &str) -> Option<String> {
    let slug = slugify(title);
    if slug.is_empty() || id.is_empty() {
        return None;
    }
    Some(format!(
        "{}/product/{}-{}",
        base_url.trim_end_matches('/'),
        slug,
        id
    ))
}

/// Extract the domain from a URL string.
pub fn get_domain(url_str: &str) -> Option<String> {
    url::Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_lowercase()))
}

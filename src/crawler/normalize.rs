use url::Url;

/// Canonical identity of a URL: everything but the fragment.
/// Scheme, user info, host, port, path and query are kept as they are.
pub fn normalize(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_fragment(None);
    canonical
}

/// String form of [`normalize`]. Input that does not parse as a URL is
/// returned unchanged.
pub fn normalize_str(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => normalize(&url).into(),
        Err(_) => raw.to_string(),
    }
}

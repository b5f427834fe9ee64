//! Beer image URLs.
//!
//! Images live in external object storage; the catalog only stores a path.

/// Turns a stored image path into a URL a browser can fetch.
pub trait ImageResolver: Send + Sync {
  fn resolve(&self, path: &str) -> String;
}

/// Resolves paths against the public URL of a storage bucket.
#[derive(Debug, Clone)]
pub struct PublicUrlResolver {
  base_url: String,
}

impl PublicUrlResolver {
  pub fn new(base_url: impl Into<String>) -> Self {
    let base_url: String = base_url.into();
    Self { base_url: base_url.trim_end_matches('/').to_owned() }
  }
}

impl ImageResolver for PublicUrlResolver {
  fn resolve(&self, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
      return path.to_owned();
    }
    format!("{}/{}", self.base_url, path.trim_start_matches('/'))
  }
}

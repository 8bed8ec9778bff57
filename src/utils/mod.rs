//! Utility functions and helpers.

pub mod url;

pub use url::{detail_url, get_domain, slugify};

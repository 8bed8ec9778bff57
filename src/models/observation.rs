//! Raw payload shapes returned by the catalog source.
//!
//! Field names mirror the wire format of the listing and detail endpoints;
//! everything optional stays optional so a malformed record never fails the
//! whole page deserialization.

use serde::{Deserialize, Serialize};

/// Listing type tag for limited/secret drops whose detail-page URL cannot
/// be rebuilt deterministically.
pub const SECRET_KIND: &str = "secret";

/// One record from the paginated listing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    /// Price in the smallest currency unit
    #[serde(default, rename = "price")]
    pub price_minor: Option<i64>,

    /// Units in stock; zero means sold out
    #[serde(default)]
    pub stock: Option<u32>,

    #[serde(default, rename = "image")]
    pub image_url: Option<String>,

    /// Listing type tag ("standard", "secret", ...)
    #[serde(default)]
    pub kind: Option<String>,
}

impl Observation {
    pub fn is_in_stock(&self) -> bool {
        self.stock.unwrap_or(0) > 0
    }

    /// Secret/limited listings get a fallback URL instead of a derived one.
    pub fn is_secret(&self) -> bool {
        self.kind.as_deref() == Some(SECRET_KIND)
    }
}

/// One page of the paginated listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingPage {
    /// Total item count across all pages
    #[serde(rename = "total")]
    pub total_count: u32,

    /// Page size used by the source
    pub page_size: u32,

    pub items: Vec<Observation>,
}

impl ListingPage {
    /// Number of pages covering `total_count`, derived from the first
    /// successful response (not known a priori).
    pub fn page_count(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size)
    }
}

/// Detail-page payload for a single item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailPayload {
    /// Units in stock; `None` means the payload was malformed
    #[serde(default)]
    pub stock: Option<u32>,

    #[serde(default, rename = "image")]
    pub image_url: Option<String>,
}

//! Docdrift Definitions
//!
//! Recorded expectations for upstream documentation pages. Each module holds
//! one API's [`Conversion`]s; every conversion declares, element by element,
//! what its page said when it was last reviewed and which symbols that
//! content produces.
//!
//! The pages as they looked at review time are kept under `fixtures/` and can
//! be served with [`recorded_pages`] for offline runs.
//!
//! ## Available APIs
//!
//! - [`notion`] - Notion object and endpoint reference
//!
//! ## Examples
//!
//! ```
//! use docdrift_definitions::notion;
//!
//! let conversions = notion::conversions();
//! assert_eq!(conversions.len(), 4);
//! assert_eq!(conversions[0].name(), "user");
//! ```

pub mod notion;
pub mod prelude;

use docdrift_lib::fetch::StaticFetcher;
use docdrift_lib::pipeline::Conversion;

/// Every known conversion, across all APIs.
pub fn conversions() -> Vec<Box<dyn Conversion>> {
    notion::conversions()
}

/// Serves every recorded page under its conversion's URL, embedded under
/// `attribute`.
pub fn recorded_pages(attribute: &str) -> StaticFetcher {
    notion::recorded_pages()
        .into_iter()
        .fold(StaticFetcher::new(), |fetcher, (url, page)| {
            fetcher.with_page(url, &page, attribute)
        })
}

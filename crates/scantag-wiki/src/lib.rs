//! Document service for Scantag
//!
//! The tagging engine reads and writes documents only through the
//! [`DocumentService`] trait. Two implementations are provided:
//!
//! - [`WikiClient`] talks to a MediaWiki Action API endpoint, with bot
//!   password login, client-side rate limiting and maxlag handling
//! - [`MemoryWiki`] keeps pages in memory, for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use scantag_wiki::{ClientOptions, DocumentService, PageRef, WikiClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WikiClient::new("https://en.wikipedia.org/w/api.php", &ClientOptions::default())?;
//!     client.login("Yapperbot@Scantag", "bot-password").await?;
//!
//!     if let Some(doc) = client.fetch(&PageRef::title("Example")).await? {
//!         println!("{} was last edited at {}", doc.title, doc.base_timestamp);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod checksum;
mod client;
mod error;
mod mediawiki;
mod memory;
mod service;
mod types;

pub use checksum::md5_hex;
pub use client::{ClientOptions, HttpClient};
pub use error::{Error, Result};
pub use mediawiki::WikiClient;
pub use memory::MemoryWiki;
pub use service::DocumentService;
pub use types::{Document, EditOutcome, EditRequest, PageRef, RejectionCode, RevisionMeta};

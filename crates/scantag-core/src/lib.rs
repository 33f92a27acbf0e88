//! Scantag Core - edit submission and run orchestration
//!
//! This crate ties the rule engine to a [`scantag_wiki::DocumentService`]:
//!
//! - [`EditSubmitter`] evaluates one document, submits the edit it needs and
//!   classifies the service's answer, re-fetching after conflicts
//! - [`BatchDriver`] walks a corpus in batches, or runs one test page twice
//! - [`RuleSnapshot`] builds a rule set in full and then publishes it
//! - [`SandboxReport`] renders the sandbox rule source as a wikitable
//!
//! Documents are processed strictly one after another. Only errors that end
//! the run are returned as [`Error`]; everything a run recovers from is a
//! [`DocumentOutcome`].

pub mod corpus;
pub mod driver;
pub mod error;
pub mod sandbox;
pub mod snapshot;
pub mod submitter;

pub use corpus::CorpusReader;
pub use driver::{BatchDriver, RunStats};
pub use error::{Error, Result};
pub use sandbox::{SandboxOutcome, SandboxReport, SandboxSummary};
pub use snapshot::{RuleSnapshot, RuleSource};
pub use submitter::{DocumentOutcome, EditSubmitter, SubmitterOptions};

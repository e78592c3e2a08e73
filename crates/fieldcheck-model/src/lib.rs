//! fieldcheck Model
//!
//! Plain data for the inspection workflow.
//!
//! # Core Concepts
//!
//! - [`Catalog`]: ordered, validated set of [`ChecklistDefinition`]s
//! - [`AnswerValue`]: a single answer (text, boolean, number or empty)
//! - [`Draft`]: every in-progress answer, image, signature and ignored flag
//!   of one auditor
//! - [`ReportSnapshot`]: frozen copy of a complete draft, ready for storage
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldcheck_model::{Catalog, Draft, PassFail};
//!
//! let catalog = Catalog::from_path("checklists.yaml")?;
//! let mut draft = Draft::new();
//! draft.set_answer("gerencial".into(), "pop_1".into(), PassFail::Pass.into());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod answer;
mod definition;
mod draft;
mod error;
mod ids;
mod report;

// Re-exports
pub use answer::{AnswerValue, PassFail};
pub use definition::{Catalog, ChecklistDefinition, Item, ItemKind, Section};
pub use draft::{AnswerSet, AttachmentSet, Draft, SignatureSet};
pub use error::CatalogError;
pub use ids::{ChecklistId, ItemId, ReportId, Role, SectionId, UserId};
pub use report::{Author, CreatedReport, ReportSnapshot, ReportSummary};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

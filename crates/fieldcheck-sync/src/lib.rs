//! fieldcheck Sync
//!
//! Keeps one auditor's in-progress draft consistent with a remote mirror and
//! files the finished report.
//!
//! # Core Concepts
//!
//! - [`DraftStore`]: the single mutation surface; publishes [`Revision`]s
//! - [`AutosaveScheduler`]: debounced writes, one in flight at a time
//! - [`Reconciler`]: pulls the remote draft while the auditor is idle
//! - [`Finalizer`]: validates, submits and commits the report
//! - [`DraftSession`]: all of the above for one auditor
//!
//! # Example
//!
//! ```rust,ignore
//! use fieldcheck_sync::{DraftSession, Remotes, SyncConfig};
//!
//! let remotes = Remotes::shared(backend);
//! let config = SyncConfig::default();
//! let session = DraftSession::open(catalog, remotes, author, "Centro", config).await?;
//! session.set_answer("gerencial", "pop_1", PassFail::Pass)?;
//! let outcome = session.finalize().await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod activity;
mod autosave;
mod cache;
mod config;
mod error;
mod finalize;
mod reconciler;
mod remote;
mod session;
mod store;

pub use activity::ActivityTracker;
pub use autosave::{AutosaveScheduler, SaveStatus};
pub use cache::ReportCache;
pub use config::SyncConfig;
pub use error::{ConfigError, DraftError, RemoteError, SessionError};
pub use finalize::{FinalizeOutcome, Finalizer};
pub use reconciler::{ReconcileOutcome, Reconciler, SkipReason};
pub use remote::{DraftRemote, ReportRemote};
pub use session::{DraftSession, Remotes};
pub use store::{DraftStore, Revision, RevisionOrigin, RATING_MAX};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        DraftError, DraftRemote, DraftSession, FinalizeOutcome, RemoteError, Remotes,
        ReportRemote, SaveStatus, SyncConfig,
    };
    pub use fieldcheck_engine::{FinalizeState, NavigationTarget};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

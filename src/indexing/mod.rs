//! Workspace icon indexing: discovery, parsing passes, the registry and the
//! [`IconIndex`] facade over them.

pub mod facade;
mod ignore_filter;
mod inline;
mod lines;
pub mod registry;
mod usage;
mod walker;

pub use facade::{ChangeSummary, CollectedScan, IconIndex, ScanJob, ScanRequest, ScanStats};
pub use ignore_filter::IgnoreFilter;
pub use inline::find_inline_svgs;
pub use registry::{Collision, GenerationEnd, IconRegistry, ScanScope, ScanToken, UpsertOutcome};
pub use usage::UsageIndexer;
pub use walker::{Candidate, CandidateIter, CandidateKind, FileScanner, SourceText};

//! Core logic - framework-agnostic local storage, sync jobs, and reporting.

/// Budget reports computed from local data
pub mod report;
/// Local store handle and typed accessors
pub mod store;
/// Pull and push sync jobs and their orchestrator
pub mod sync;

//! Application layer containing the drop-in orchestration core.
//!
//! `DropInEngine` is the entry point: it owns one flow instance, dispatches
//! to the registered flow sources, applies the step-up policy and hands the
//! caller a single terminal outcome. The resume bridge and the last-used
//! cache sit on top of the shared key/value persistence port.

pub mod engine;
pub mod last_used;
pub mod recent;
pub mod resume;
pub mod sources;

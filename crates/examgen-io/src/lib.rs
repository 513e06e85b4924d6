//! examgen-io: File collaborators for the exam composition engine.
//!
//! Reads question banks and signup sheets (tab-separated), persists history
//! as timestamped JSON snapshots, and loads tool settings.

pub mod error;
pub mod questions;
pub mod settings;
pub mod signups;
pub mod snapshot;

//! Core library for docksweep: splits a ligand library across
//! externally-scheduled docking jobs, recovers the set of completed items
//! from the run directory's output layout, plans redo runs for the rest,
//! and aggregates scored results into a ranked summary table.
//!
//! The scientific computation itself is an opaque containerized worker;
//! this crate only builds its command lines, bookkeeps the run directory
//! and interprets the worker's file-based side effects.

pub mod error;
pub mod failures;
pub mod jobs;
pub mod manifest;
pub mod partition;
pub mod redo;
pub mod run_dir;
pub mod scan;
pub mod summary;
pub mod template;

pub use error::{Error, Result};
pub use manifest::WorkItem;

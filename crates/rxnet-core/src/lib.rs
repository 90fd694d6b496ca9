//! # rxnet Core Library
//!
//! A library for automated reaction pathway search: it drives chains of
//! constrained geometry relaxations through an external optimization engine
//! and condenses the resulting energy trajectories into a deduplicated,
//! barrier-ranked network of stable species connected by transition states.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`Frame`,
//!   `Trajectory`, `PathwayRecord`), constraint schedules, and the I/O
//!   formats (XYZ trajectories, pathway record documents, table exports).
//!
//! - **[`engine`]: The Logic Core.** This stateful layer hosts the
//!   constrained-scan driver, trajectory segmentation, the restart-safe
//!   pathway store, species deduplication, and the layered reaction-network
//!   builder, together with the collaborator traits for the external
//!   optimization engine and the structure canonicalizer.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties the `engine` and `core` together into complete procedures: a
//!   parallel scan batch and a network analysis pass over its results.

pub mod core;
pub mod engine;
pub mod workflows;

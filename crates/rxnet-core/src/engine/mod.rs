//! # Engine Module
//!
//! This module implements the stateful machinery of the reaction search: the
//! constrained-scan driver that chains geometry relaxations through the
//! external optimization engine, the trajectory segmenter that distills scan
//! output into pathway records, and the aggregation stages (restart-safe
//! store, species catalog, layered network builder) that assemble the final
//! reaction network.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated scan and network parameters
//! - **Collaborators** ([`optimizer`]) - Traits for the optimization engine
//!   and the structure canonicalizer, plus subprocess-backed adapters
//! - **Scan Driver** ([`scan`]) - Forward/backward constrained relaxation
//!   chains stitched into one trajectory
//! - **Segmentation** ([`segment`]) - Stable/transition stretch-point
//!   extraction and stable-point re-relaxation
//! - **Aggregation** ([`store`], [`catalog`], [`network`]) - Restart-safe
//!   record collection, species deduplication, network assembly
//! - **Progress Monitoring** ([`progress`]) - Phase and job callbacks
//! - **Error Handling** ([`error`]) - Engine-level error taxonomy

pub mod catalog;
pub mod config;
pub mod error;
pub mod network;
pub mod optimizer;
pub mod progress;
pub mod scan;
pub mod segment;
pub mod store;

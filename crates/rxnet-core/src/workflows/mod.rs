//! # Workflows Module
//!
//! This module provides the high-level entry points that orchestrate the
//! engine layer: the batch search workflow that drives constrained scans and
//! distills their trajectories into pathway records, and the network
//! workflow that aggregates every stored pathway into the species catalog
//! and the barrier-ranked reaction network tables.

pub mod network;
pub mod search;

//! # Core Module
//!
//! This module provides the fundamental building blocks for reaction pathway
//! search: stateless data models for structures, trajectories, and pathway
//! records, constraint schedules for bond-stretching scans, and the I/O
//! formats shared between scan jobs and the analysis pass.
//!
//! ## Architecture
//!
//! - **Data Models** ([`models`]) - Structures, frames, pathway records,
//!   species entries, and reaction network rows
//! - **Constraint Schedules** ([`constraints`]) - Ordered geometric restraints
//!   driving a bond-breaking/forming scan
//! - **File I/O** ([`io`]) - XYZ trajectories, pathway record documents,
//!   failure sentinels, and CSV table exports

pub mod constraints;
pub mod io;
pub mod models;

//! Data models for reaction pathway search.
//!
//! Everything in this module is plain data: structures and trajectory frames
//! produced by scan jobs, the pathway records distilled from them, and the
//! species/network rows derived during aggregation. Mutation is confined to
//! the aggregation phase (species entries monotonically improve); frames and
//! persisted records are immutable.

pub mod frame;
pub mod network;
pub mod pathway;
pub mod species;
pub mod structure;

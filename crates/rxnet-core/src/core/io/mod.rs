//! Input/output formats shared between scan jobs and the analysis pass.
//!
//! Three surfaces live here: XYZ-style trajectory files whose comment lines
//! round-trip a scalar energy, the per-job pathway record document (JSON)
//! together with the failure sentinel markers, and the CSV exports of the
//! species table and the assembled reaction network.

pub mod record;
pub mod tables;
pub mod xyz;

pub mod network;
pub mod scan;

//! Network input

pub mod edge_list;

pub use edge_list::{load_network, read_network, LoadStats};

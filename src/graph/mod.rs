//! Gene network representation and traversal algorithms

pub mod algorithms;
pub mod builder;
pub mod network;

pub use builder::{EdgeInsert, GraphBuilder};
pub use network::{Edge, GeneNetwork};

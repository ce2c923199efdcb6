//! Community detection and topology analysis of gene interaction networks

pub mod cluster;
pub mod compare;
pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod pipeline;
pub mod storage;
pub mod topology;
pub mod viz;

pub use anyhow::{anyhow, Result};

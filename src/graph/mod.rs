//! Dependency structure of a parameter set.
pub mod dag;

pub use dag::{DependencyGraph, GraphError, NodeId};

//! Data loading
//!
//! Reads labelled image rows into an [`ImageDataset`].

pub mod emnist;

pub use self::emnist::*;

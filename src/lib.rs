#![deny(clippy::correctness)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::nursery,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::cast_lossless
)]
#![doc = include_str!("../README.md")]

mod composite;
mod item;
mod levels;
pub mod metrics;
mod search;
mod store;
mod tree;

pub use crate::{
    composite::CompositeTree,
    item::{DistanceFn, Item},
    levels::LevelsWithItems,
    store::{InMemoryStore, PartitionedStore, PartitioningFn, Store},
    tree::{TraceMetrics, Tracer, Tree},
};

/// The current version of the crate.
pub const VERSION: &str = "0.4.0";

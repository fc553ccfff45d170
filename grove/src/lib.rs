//! # grove
//!
//! Append-biased fixed-resolution time-series storage over a filesystem
//! tree.
//!
//! grove persists metric datapoints as flat binary files organized in a
//! directory hierarchy that mirrors dotted metric names. There is no
//! database engine underneath: the filesystem is the authority, and
//! kernel-visible file locks make the write path safe across threads and
//! across processes sharing one storage root.
//!
//! **Status**: This crate is in early development. The API is not yet stable.
//!
//! ## Key Properties
//!
//! - One metric per directory, one binary slice file per contiguous run
//!   of fixed-step samples
//! - Byte offsets keyed by elapsed time: slot `k` of a slice holds the
//!   value at `start_time + k * time_step`
//! - Temporal gaps bridged with `NaN` markers up to a configured ceiling,
//!   abandoned into a fresh slice past it
//! - Safe concurrent writers via exclusive whole-file advisory locks
//! - No background threads, no compaction, no hidden global state
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grove::{Datapoint, MetaBag, MetaValue, Tree};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open a tree over an existing root directory
//! let tree = Tree::open("./metrics")?;
//!
//! // Create a node at 60s resolution (the default)
//! let mut properties = MetaBag::new();
//! properties.insert("timeStep".to_string(), MetaValue::from(60i64));
//! tree.create_node("servers.web1.cpu", properties)?;
//!
//! // Store datapoints
//! tree.store("servers.web1.cpu", Datapoint::new(1_700_000_000, 42.5))?;
//! tree.store("servers.web1.cpu", Datapoint::new(1_700_000_060, 43.0))?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Tree`] — Top-level handle; maps names to paths, caches nodes,
//!   exposes `store`
//! - [`Node`] — One metric; metadata persistence and slice routing
//! - [`Slice`] — One binary file; offset math, gap padding, locked writes
//! - [`MetaBag`] — Per-node property bag round-tripped through a
//!   JSON-compatible codec
//!
//! ## Scope
//!
//! This is a write path and metadata path. Reading back time ranges,
//! rollup/aggregation, and retention enforcement are left to external
//! processes, which may delete slices at any time — the write path
//! tolerates that and re-routes.
//!
//! ## Modules
//!
//! For lower-level access, the individual modules are also public:
//!
//! - [`tree`] — Tree lifecycle, name resolution, node cache, store
//! - [`node`] — Node directories, metadata, slice-selection algorithm
//! - [`slice`] — Raw slice file format and the locked write
//! - [`meta`] — Metadata property bags and their textual codec
//! - [`config`] — Engine tunables
//! - [`point`] — The shared datapoint type
//! - [`error`] — Error types

pub mod config;
pub mod error;
pub mod meta;
pub mod node;
pub mod point;
pub mod slice;
pub mod tree;

// Re-export primary API types at crate root for convenience.
pub use config::TreeConfig;
pub use error::{GroveError, Result};
pub use meta::{MetaBag, MetaValue};
pub use node::Node;
pub use point::Datapoint;
pub use slice::Slice;
pub use tree::Tree;

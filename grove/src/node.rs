//! Node directories: metadata persistence and slice routing.
//!
//! A node is the engine's representation of one metric, backed by a
//! directory. The directory holds a marker file identifying it as a node,
//! a metadata sidecar with the property bag, and zero or more slice files
//! at possibly different resolutions.
//!
//! # Directory Layout
//!
//! ```text
//! <root>/a/b/c/
//! ├── .grove-node        <- marker, empty; presence identifies the node
//! ├── meta.json          <- property bag, required integer key "timeStep"
//! ├── 1700000000@60.slice
//! └── 1700010000@60.slice
//! ```
//!
//! The node never caches slice membership across writes: the directory is
//! re-scanned per write so slices created or deleted by other processes
//! become visible immediately.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::{fs, io};

use crate::config::TreeConfig;
use crate::error::{GroveError, NodeError, Result, SliceError};
use crate::meta::{self, MetaBag, MetaValue, TIME_STEP_KEY};
use crate::point::Datapoint;
use crate::slice::Slice;

/// Marker file whose presence identifies a directory as a node.
pub const NODE_MARKER_FILE: &str = ".grove-node";

/// Name of the metadata sidecar file in the node directory.
pub const METADATA_FILE: &str = "meta.json";

/// How many times a write re-runs slice routing after finding a slice
/// deleted out from under it, before giving up.
///
/// External deletion is rare (a retention or compaction process pruning
/// old slices), so the loop converges almost immediately in practice.
const SLICE_DELETED_RETRIES: usize = 8;

/// Sentinel for "resolution not read from metadata yet".
const TIME_STEP_UNKNOWN: i64 = 0;

/// Outcome of one routing attempt.
enum Routing {
    /// The datapoint landed (or was a discarded gap marker).
    Written,
    /// The selected slice vanished before the write; route again.
    SliceVanished,
}

/// The storage engine's representation of one metric.
///
/// # Thread Safety
///
/// A `Node` is safe to share across threads and processes: the slice list
/// is re-read per write, slice files are serialized by their own file
/// locks, and the cached resolution is an atomic refreshed lazily from
/// the metadata sidecar.
#[derive(Debug)]
pub struct Node {
    /// The dotted metric name (for errors and logging).
    name: String,
    /// The node's directory.
    dir: PathBuf,
    /// Engine tunables, threaded down into slices.
    config: TreeConfig,
    /// Most-precise resolution in seconds per point, cached after the
    /// first metadata read. [`TIME_STEP_UNKNOWN`] until then.
    time_step: AtomicI64,
}

impl Node {
    /// Attaches to an existing node directory without touching the
    /// filesystem.
    ///
    /// The resolution starts unknown and is read from metadata on first
    /// use. The tree verifies the directory is a node before attaching.
    pub fn new(dir: PathBuf, name: impl Into<String>, config: TreeConfig) -> Self {
        Self {
            name: name.into(),
            dir,
            config,
            time_step: AtomicI64::new(TIME_STEP_UNKNOWN),
        }
    }

    /// Creates a node directory and persists its initial metadata.
    ///
    /// The directory is created recursively (pre-existing is fine), and
    /// `timeStep` defaults to the configured value when the caller's
    /// properties omit it.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Io`] on filesystem failure, or
    /// [`NodeError::Corrupt`] if the supplied properties carry an
    /// unusable `timeStep`.
    pub fn create(
        dir: PathBuf,
        name: impl Into<String>,
        mut properties: MetaBag,
        config: TreeConfig,
    ) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(|source| NodeError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let marker = dir.join(NODE_MARKER_FILE);
        fs::write(&marker, b"").map_err(|source| NodeError::Io {
            path: marker.display().to_string(),
            source,
        })?;

        properties
            .entry(TIME_STEP_KEY.to_string())
            .or_insert_with(|| MetaValue::from(config.default_time_step));

        let node = Self::new(dir, name, config);
        node.write_metadata(&properties)?;

        tracing::debug!(metric = %node.name, dir = %node.dir.display(), "created node");

        Ok(node)
    }

    /// Returns true if `path` is a directory identified as a node by its
    /// marker file.
    pub fn is_node_dir(path: &Path) -> bool {
        path.is_dir() && path.join(NODE_MARKER_FILE).is_file()
    }

    /// Returns the dotted metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node's directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the cached resolution, if metadata has been read.
    pub fn time_step(&self) -> Option<i64> {
        match self.time_step.load(Ordering::Relaxed) {
            TIME_STEP_UNKNOWN => None,
            step => Some(step),
        }
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    /// Reads and decodes the metadata sidecar, refreshing the cached
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Corrupt`] if the sidecar is missing,
    /// unreadable, undecodable, or lacks a usable positive integer
    /// `timeStep`.
    pub fn read_metadata(&self) -> Result<MetaBag> {
        let path = self.metadata_path();
        let text = fs::read_to_string(&path).map_err(|e| NodeError::Corrupt {
            path: self.dir.display().to_string(),
            reason: format!("cannot read metadata '{}': {e}", path.display()),
        })?;

        let bag = meta::decode(&text).map_err(|e| NodeError::Corrupt {
            path: self.dir.display().to_string(),
            reason: format!("cannot decode metadata: {e}"),
        })?;

        let step = meta::time_step(&bag).ok_or_else(|| NodeError::Corrupt {
            path: self.dir.display().to_string(),
            reason: format!("metadata lacks a usable positive integer '{TIME_STEP_KEY}'"),
        })?;

        self.time_step.store(step, Ordering::Relaxed);
        Ok(bag)
    }

    /// Persists the property bag, overwriting any prior content, and
    /// refreshes the cached resolution from it.
    ///
    /// The sidecar is replaced atomically (temp file and rename) so
    /// concurrent readers never observe a partial document.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Corrupt`] if the bag lacks a usable positive
    /// integer `timeStep` (the invariant that every node carries one is
    /// enforced at the write), or [`NodeError::Io`] on filesystem failure.
    pub fn write_metadata(&self, bag: &MetaBag) -> Result<()> {
        let step = meta::time_step(bag).ok_or_else(|| NodeError::Corrupt {
            path: self.dir.display().to_string(),
            reason: format!("refusing to persist metadata without a usable positive integer '{TIME_STEP_KEY}'"),
        })?;

        let text = meta::encode(bag)?;

        let path = self.metadata_path();
        let tmp = self.dir.join(format!("{METADATA_FILE}.tmp"));
        fs::write(&tmp, text).map_err(|source| NodeError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| NodeError::Io {
            path: path.display().to_string(),
            source,
        })?;

        self.time_step.store(step, Ordering::Relaxed);
        Ok(())
    }

    /// Lists the node's slices as `(start_time, time_step)` pairs, sorted
    /// by start time descending (most recent first).
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Deleted`] if the node directory no longer
    /// exists, or [`NodeError::Io`] for other filesystem failures.
    pub fn list_slices(&self) -> Result<Vec<(i64, i64)>> {
        let entries = fs::read_dir(&self.dir).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                NodeError::Deleted {
                    path: self.dir.display().to_string(),
                }
            } else {
                NodeError::Io {
                    path: self.dir.display().to_string(),
                    source,
                }
            }
        })?;

        let mut slices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| NodeError::Io {
                path: self.dir.display().to_string(),
                source,
            })?;
            if let Some(identity) =
                Slice::parse_file_name(&entry.file_name().to_string_lossy())
            {
                slices.push(identity);
            }
        }

        // Descending by start time; equal starts order by step so the
        // ordering is total.
        slices.sort_unstable_by(|a, b| b.cmp(a));

        Ok(slices)
    }

    /// Routes one datapoint to the correct slice and writes it.
    ///
    /// The newest slice at the node's resolution whose start precedes the
    /// timestamp receives the write. A gap beyond the configured ceiling
    /// abandons that slice and starts a new one at exactly the incoming
    /// timestamp; a slice deleted between cataloguing and writing causes
    /// the routing to re-run against a fresh directory scan.
    ///
    /// `NaN` values are silently discarded: `NaN` is reserved as the
    /// internal gap marker and never accepted as a real sample.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Corrupt`] if the resolution cannot be read
    /// from metadata, [`NodeError::SliceRetriesExhausted`] if routing
    /// keeps losing slices to external deletion, or any slice I/O error
    /// unmodified. [`SliceError::GapTooLarge`] and [`SliceError::Deleted`]
    /// never escape this method under normal operation.
    pub fn write(&self, point: Datapoint) -> Result<()> {
        for _attempt in 0..SLICE_DELETED_RETRIES {
            match self.route(point)? {
                Routing::Written => return Ok(()),
                Routing::SliceVanished => {
                    tracing::debug!(
                        metric = %self.name,
                        "slice deleted externally, re-routing write"
                    );
                }
            }
        }

        Err(NodeError::SliceRetriesExhausted {
            path: self.dir.display().to_string(),
            attempts: SLICE_DELETED_RETRIES,
        }
        .into())
    }

    /// One pass of the slice-selection algorithm.
    fn route(&self, point: Datapoint) -> Result<Routing> {
        let time_step = self.resolve_time_step()?;

        if point.is_gap() {
            return Ok(Routing::Written);
        }

        for (start, step) in self.list_slices()? {
            if step != time_step || start > point.timestamp {
                continue;
            }

            // First eligible slice wins; never fall through to older ones.
            let slice = Slice::new(&self.dir, start, step, self.config.max_slice_gap);
            return match slice.write(point) {
                Ok(()) => Ok(Routing::Written),
                Err(GroveError::Slice(SliceError::GapTooLarge {
                    gap_points, ..
                })) => {
                    tracing::debug!(
                        metric = %self.name,
                        gap_points,
                        max_gap = self.config.max_slice_gap,
                        "gap exceeds ceiling, starting new slice"
                    );
                    self.start_slice(point, time_step)
                }
                Err(GroveError::Slice(SliceError::Deleted { .. })) => {
                    Ok(Routing::SliceVanished)
                }
                Err(other) => Err(other),
            };
        }

        // No eligible slice: never written at this resolution, or every
        // candidate starts after the incoming timestamp.
        self.start_slice(point, time_step)
    }

    /// Starts a brand-new slice at exactly the datapoint's timestamp and
    /// writes the point into slot 0.
    fn start_slice(&self, point: Datapoint, time_step: i64) -> Result<Routing> {
        let slice = Slice::create(
            &self.dir,
            point.timestamp,
            time_step,
            self.config.max_slice_gap,
        )?;
        slice.write(point)?;
        Ok(Routing::Written)
    }

    /// Returns the node's resolution, reading metadata on first use.
    fn resolve_time_step(&self) -> Result<i64> {
        let cached = self.time_step.load(Ordering::Relaxed);
        if cached != TIME_STEP_UNKNOWN {
            return Ok(cached);
        }

        self.read_metadata()?;
        Ok(self.time_step.load(Ordering::Relaxed))
    }
}

//! Error types for the grove time-series storage engine.

use thiserror::Error;

/// The main error type for all grove operations.
///
/// This enum covers all possible error conditions that can occur during
/// tree, node, and slice operations, from initial construction to the
/// byte-level write path.
#[derive(Error, Debug)]
pub enum GroveError {
    /// Error at the tree level (root validation, node lookup).
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Error at the node level (metadata, slice routing).
    #[error("node error: {0}")]
    Node(#[from] NodeError),

    /// Error at the slice level (file I/O, gap handling).
    #[error("slice error: {0}")]
    Slice(#[from] SliceError),

    /// Error encoding or decoding a metadata property bag.
    #[error("metadata error: {0}")]
    Meta(#[from] MetaError),
}

/// Errors that can occur at the tree level.
#[derive(Error, Debug)]
pub enum TreeError {
    /// The tree root is missing or not a directory.
    ///
    /// Fatal at construction time; there is no recovery short of pointing
    /// the tree at a valid root.
    #[error("invalid tree root '{path}': {reason}")]
    InvalidRoot {
        /// The root path that failed validation.
        path: String,
        /// Why the root was rejected.
        reason: String,
    },

    /// The engine configuration failed validation.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of what was invalid.
        reason: String,
    },

    /// A node lookup found no node directory at the resolved path.
    ///
    /// Recoverable by the caller, typically by creating the node first.
    #[error("no node found for metric '{name}'")]
    NodeNotFound {
        /// The dotted metric name that failed to resolve.
        name: String,
    },
}

/// Errors that can occur at the node level.
#[derive(Error, Debug)]
pub enum NodeError {
    /// The node directory vanished mid-operation (external deletion).
    #[error("node directory '{path}' no longer exists")]
    Deleted {
        /// The node directory path.
        path: String,
    },

    /// The node metadata is missing, unreadable, undecodable, or lacks a
    /// usable `timeStep` key. Never auto-repaired.
    #[error("corrupt node '{path}': {reason}")]
    Corrupt {
        /// The node directory path.
        path: String,
        /// Description of what was wrong with the metadata.
        reason: String,
    },

    /// Slice routing kept finding slices that were deleted out from under
    /// it and gave up after the retry ceiling.
    #[error("slice routing for node '{path}' exhausted {attempts} retries")]
    SliceRetriesExhausted {
        /// The node directory path.
        path: String,
        /// How many routing attempts were made.
        attempts: usize,
    },

    /// A filesystem operation on the node directory failed.
    #[error("node I/O failed for '{path}': {source}")]
    Io {
        /// The path that failed.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur at the slice level.
#[derive(Error, Debug)]
pub enum SliceError {
    /// The slice's backing file does not exist at write time.
    ///
    /// Signals that the slice was removed by an external process after it
    /// was catalogued; the caller re-resolves rather than recreating it.
    #[error("slice file '{path}' was deleted")]
    Deleted {
        /// The slice file path.
        path: String,
    },

    /// Bridging the temporal gap to the write position would pad more
    /// points than the configured ceiling allows.
    ///
    /// The file is left unmodified; the caller starts a new slice instead.
    #[error("gap of {gap_points} points in '{path}' exceeds ceiling of {max_gap}")]
    GapTooLarge {
        /// The slice file path.
        path: String,
        /// The number of points the gap would span.
        gap_points: u64,
        /// The configured gap ceiling.
        max_gap: u64,
    },

    /// A filesystem operation on the slice file failed.
    #[error("slice I/O failed for '{path}': {source}")]
    Io {
        /// The slice file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while encoding or decoding metadata.
#[derive(Error, Debug)]
pub enum MetaError {
    /// The metadata text is not well-formed JSON.
    #[error("malformed metadata text: {source}")]
    Parse {
        /// The underlying JSON parsing error.
        #[source]
        source: serde_json::Error,
    },

    /// The metadata text parsed but is not usable as a property bag.
    #[error("undecodable metadata: {reason}")]
    Decode {
        /// Description of why the document was rejected.
        reason: String,
    },

    /// A value in the bag has no representation in the textual encoding.
    #[error("unencodable metadata value: {reason}")]
    Encode {
        /// Description of the offending value.
        reason: String,
    },
}

/// Type alias for `Result<T, GroveError>`.
pub type Result<T> = std::result::Result<T, GroveError>;

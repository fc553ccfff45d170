//! Tree: the root directory mapping metric names to nodes.
//!
//! The tree is the top-level handle. It maps dotted metric names onto the
//! filesystem (`a.b.c` → `<root>/a/b/c`), memoizes constructed node
//! handles, and exposes the `store` entry point that ingestion layers
//! call.
//!
//! The in-memory node cache is a best-effort memoization only: the
//! filesystem stays authoritative, cached nodes lazily re-resolve their
//! resolution and slice membership from disk, and other processes
//! mutating the same root are observed without invalidation machinery.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::meta::MetaBag;
use crate::node::Node;
use crate::point::Datapoint;

/// The root collection of nodes mapped onto a filesystem hierarchy.
///
/// # Thread Safety
///
/// All entry points take `&self`; a `Tree` wrapped in an `Arc` can be
/// shared freely across threads. Cross-process safety comes from the
/// slice-level file locks, not from this handle.
///
/// # Example
///
/// ```rust,no_run
/// use grove::{Datapoint, MetaBag, Tree};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tree = Tree::open("/var/lib/grove")?;
/// tree.create_node("servers.web1.cpu", MetaBag::new())?;
/// tree.store("servers.web1.cpu", Datapoint::new(1_700_000_000, 42.5))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Tree {
    /// Absolute path to the tree root.
    root: PathBuf,
    /// Engine tunables, threaded into every node.
    config: TreeConfig,
    /// Best-effort memo of constructed nodes, keyed by metric name.
    nodes: RwLock<HashMap<String, Arc<Node>>>,
}

impl Tree {
    /// Opens a tree at `root` with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRoot`] if the path does not exist or
    /// is not a directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        Self::open_with_config(root, TreeConfig::default())
    }

    /// Opens a tree at `root` with an explicit configuration.
    ///
    /// The root is normalized to an absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidRoot`] if the path does not exist or
    /// is not a directory, or [`TreeError::InvalidConfig`] if the
    /// configuration fails validation.
    pub fn open_with_config<P: AsRef<Path>>(root: P, config: TreeConfig) -> Result<Self> {
        config.validate()?;

        let root = root.as_ref();
        if !root.exists() {
            return Err(TreeError::InvalidRoot {
                path: root.display().to_string(),
                reason: "path does not exist".to_string(),
            }
            .into());
        }
        if !root.is_dir() {
            return Err(TreeError::InvalidRoot {
                path: root.display().to_string(),
                reason: "path is not a directory".to_string(),
            }
            .into());
        }

        let root = root.canonicalize().map_err(|e| TreeError::InvalidRoot {
            path: root.display().to_string(),
            reason: format!("cannot normalize path: {e}"),
        })?;

        Ok(Self {
            root,
            config,
            nodes: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the absolute root path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the tree's configuration.
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Maps a dotted metric name to its directory under the root.
    ///
    /// Deterministic: each `.`-separated component becomes one path
    /// component. No filesystem access happens here.
    pub fn resolve_path(&self, name: &str) -> PathBuf {
        name.split('.')
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Returns true if a node exists for the metric name.
    pub fn has_node(&self, name: &str) -> bool {
        Node::is_node_dir(&self.resolve_path(name))
    }

    /// Resolves a metric name to its node, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the resolved path is not a
    /// node directory. Callers wanting auto-creation use
    /// [`create_node`](Self::create_node) first.
    pub fn get_node(&self, name: &str) -> Result<Arc<Node>> {
        if let Some(node) = self.read_cache().get(name) {
            return Ok(Arc::clone(node));
        }

        let dir = self.resolve_path(name);
        if !Node::is_node_dir(&dir) {
            return Err(TreeError::NodeNotFound {
                name: name.to_string(),
            }
            .into());
        }

        let node = Arc::new(Node::new(dir, name, self.config));
        self.write_cache().insert(name.to_string(), Arc::clone(&node));
        Ok(node)
    }

    /// Creates a node for the metric name and caches it.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::NodeError`] from node creation.
    pub fn create_node(&self, name: &str, properties: MetaBag) -> Result<Arc<Node>> {
        let node = Arc::new(Node::create(
            self.resolve_path(name),
            name,
            properties,
            self.config,
        )?);
        self.write_cache().insert(name.to_string(), Arc::clone(&node));
        Ok(node)
    }

    /// Stores one datapoint for the metric name.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::NodeNotFound`] if the node does not exist (no
    /// auto-creation), or propagates the node's write error.
    pub fn store(&self, name: &str, point: Datapoint) -> Result<()> {
        self.get_node(name)?.write(point)
    }

    // The cache is best-effort; a poisoned lock just means some writer
    // panicked mid-insert, and the map contents are still usable.
    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<Node>>> {
        self.nodes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_cache(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<Node>>> {
        self.nodes.write().unwrap_or_else(|e| e.into_inner())
    }
}

//! In-memory mirror of a build output tree.
//!
//! Nodes live in an arena owned by [`PathTree`] and refer to each other by
//! [`NodeId`]. The tree is built once by [`crate::builder`] and only read
//! afterwards, so derived values (`full_path`) are computed at insertion.
//!
//! Userscripts and their `.meta.js` companions are paired through the
//! per-directory [`ScriptRegistry`]: the pairing is a lookup by script id in
//! the parent directory, so it does not depend on which file was seen first.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::debug;

use crate::content_type::{self, FileInfo};
use crate::meta::ScriptMeta;

pub const SCRIPT_SUFFIX: &str = ".user.js";
pub const META_SUFFIX: &str = ".meta.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: walkdir::Error,
    },
    #[error("cannot insert below {path}: not a directory")]
    NotADirectory { path: String },
    #[error("path {path} has no segments")]
    EmptyPath { path: String },
}

/// Per-directory maps used to pair scripts with their metadata files.
#[derive(Debug, Clone, Default)]
pub struct ScriptRegistry {
    pub scripts_by_id: BTreeMap<String, NodeId>,
    pub meta_by_id: BTreeMap<String, NodeId>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Directory(ScriptRegistry),
    File(FileInfo),
    Script {
        file: FileInfo,
        script_id: String,
    },
    ScriptMeta {
        file: FileInfo,
        script_id: String,
        meta: ScriptMeta,
    },
}

/// What to create for the last segment of an inserted path.
#[derive(Debug, Clone)]
pub enum NodeSeed {
    Directory,
    File,
    Script,
    ScriptMeta(ScriptMeta),
}

/// Node kind decided from the file name alone, before any content is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedClass {
    Directory,
    File,
    Script,
    ScriptMeta,
}

impl SeedClass {
    /// Directory first, then `.meta.js`, then `.user.js`, then plain file.
    pub fn classify(name: &str, is_dir: bool) -> Self {
        if is_dir {
            SeedClass::Directory
        } else if name.ends_with(META_SUFFIX) {
            SeedClass::ScriptMeta
        } else if name.ends_with(SCRIPT_SUFFIX) {
            SeedClass::Script
        } else {
            SeedClass::File
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathNode {
    pub id: NodeId,
    pub segment: String,
    pub parent: Option<NodeId>,
    pub full_path: String,
    pub children: HashMap<String, NodeId>,
    pub kind: NodeKind,
}

impl PathNode {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    pub fn file_info(&self) -> Option<&FileInfo> {
        match &self.kind {
            NodeKind::Directory(_) => None,
            NodeKind::File(file)
            | NodeKind::Script { file, .. }
            | NodeKind::ScriptMeta { file, .. } => Some(file),
        }
    }

    pub fn script_id(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Script { script_id, .. } | NodeKind::ScriptMeta { script_id, .. } => {
                Some(script_id)
            }
            _ => None,
        }
    }

    pub fn meta(&self) -> Option<&ScriptMeta> {
        match &self.kind {
            NodeKind::ScriptMeta { meta, .. } => Some(meta),
            _ => None,
        }
    }

    pub fn registry(&self) -> Option<&ScriptRegistry> {
        match &self.kind {
            NodeKind::Directory(registry) => Some(registry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathTree {
    nodes: Vec<PathNode>,
    by_path: BTreeMap<String, NodeId>,
    top_level: Vec<NodeId>,
}

impl Default for PathTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTree {
    pub fn new() -> Self {
        let root = PathNode {
            id: NodeId(0),
            segment: String::new(),
            parent: None,
            full_path: String::new(),
            children: HashMap::new(),
            kind: NodeKind::Directory(ScriptRegistry::default()),
        };
        Self {
            nodes: vec![root],
            by_path: BTreeMap::new(),
            top_level: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &PathNode {
        &self.nodes[id.0]
    }

    /// Number of nodes, root excluded.
    pub fn len(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-level children in the order they were first inserted.
    pub fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    pub fn child(&self, parent: NodeId, segment: &str) -> Option<NodeId> {
        self.node(parent).children.get(segment).copied()
    }

    /// Insert `path` (slash separated, relative to the root), creating any
    /// missing intermediate directories. The last segment is created from
    /// `seed` unless it already exists, in which case the existing node wins.
    pub fn insert(&mut self, path: &str, seed: NodeSeed) -> Result<NodeId, TreeError> {
        let segments: Vec<&str> = split_segments(path).collect();
        let Some((last, intermediate)) = segments.split_last() else {
            return Err(TreeError::EmptyPath {
                path: path.to_string(),
            });
        };

        let mut current = self.root();
        for segment in intermediate {
            current = match self.child(current, segment) {
                Some(id) => id,
                None => self.create(current, segment, NodeSeed::Directory)?,
            };
        }

        match self.child(current, last) {
            Some(id) => Ok(id),
            None => self.create(current, last, seed),
        }
    }

    fn create(&mut self, parent: NodeId, segment: &str, seed: NodeSeed) -> Result<NodeId, TreeError> {
        let parent_node = self.node(parent);
        if !parent_node.is_dir() {
            return Err(TreeError::NotADirectory {
                path: parent_node.full_path.clone(),
            });
        }
        let full_path = if parent_node.parent.is_none() {
            segment.to_string()
        } else {
            format!("{}/{}", parent_node.full_path, segment)
        };

        let id = NodeId(self.nodes.len());
        let kind = match seed {
            NodeSeed::Directory => NodeKind::Directory(ScriptRegistry::default()),
            NodeSeed::File => NodeKind::File(content_type::guess(segment)),
            NodeSeed::Script => {
                let script_id = strip_suffix(segment, SCRIPT_SUFFIX);
                self.registry_mut(parent)
                    .scripts_by_id
                    .insert(script_id.clone(), id);
                NodeKind::Script {
                    file: content_type::guess(segment),
                    script_id,
                }
            }
            NodeSeed::ScriptMeta(meta) => {
                let script_id = strip_suffix(segment, META_SUFFIX);
                self.registry_mut(parent)
                    .meta_by_id
                    .insert(script_id.clone(), id);
                NodeKind::ScriptMeta {
                    file: content_type::guess(segment),
                    script_id,
                    meta,
                }
            }
        };

        debug!(path = %full_path, "Adding tree node");
        self.nodes.push(PathNode {
            id,
            segment: segment.to_string(),
            parent: Some(parent),
            full_path: full_path.clone(),
            children: HashMap::new(),
            kind,
        });
        self.nodes[parent.0]
            .children
            .insert(segment.to_string(), id);
        self.by_path.insert(full_path, id);
        if parent == self.root() {
            self.top_level.push(id);
        }
        Ok(id)
    }

    fn registry_mut(&mut self, dir: NodeId) -> &mut ScriptRegistry {
        match &mut self.nodes[dir.0].kind {
            NodeKind::Directory(registry) => registry,
            _ => unreachable!("registry requested for a non-directory node"),
        }
    }

    /// Look a path up by descending through `children` one segment at a time.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        let mut descended = false;
        for segment in split_segments(path) {
            current = self.child(current, segment)?;
            descended = true;
        }
        descended.then_some(current)
    }

    /// Look a path up in the flat full-path index.
    pub fn lookup(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Every inserted node, ordered by full path.
    pub fn entries(&self) -> impl Iterator<Item = &PathNode> {
        self.by_path.values().map(|id| self.node(*id))
    }

    /// Every non-directory node, ordered by full path.
    pub fn files(&self) -> impl Iterator<Item = &PathNode> {
        self.entries().filter(|node| !node.is_dir())
    }

    /// The metadata node paired with a script node.
    pub fn meta_for(&self, script: NodeId) -> Option<NodeId> {
        let node = self.node(script);
        let NodeKind::Script { script_id, .. } = &node.kind else {
            return None;
        };
        let parent = self.node(node.parent?).registry()?;
        parent.meta_by_id.get(script_id).copied()
    }

    /// The script node paired with a metadata node.
    pub fn script_for(&self, meta: NodeId) -> Option<NodeId> {
        let node = self.node(meta);
        let NodeKind::ScriptMeta { script_id, .. } = &node.kind else {
            return None;
        };
        let parent = self.node(node.parent?).registry()?;
        parent.scripts_by_id.get(script_id).copied()
    }

    /// Path of `node` as seen from `ancestor`, starting with the ancestor's
    /// own segment. Relative to the root this is the full path.
    pub fn relative_path(&self, ancestor: NodeId, node: NodeId) -> String {
        if ancestor == self.root() {
            return self.node(node).full_path.clone();
        }
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let n = self.node(id);
            segments.push(n.segment.as_str());
            if id == ancestor {
                break;
            }
            current = n.parent;
        }
        segments.reverse();
        segments.join("/")
    }
}

fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

fn strip_suffix(name: &str, suffix: &str) -> String {
    name.strip_suffix(suffix).unwrap_or(name).to_string()
}

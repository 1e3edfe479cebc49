use crate::request::RenameRequest;
use crate::validate::ValidatedBatch;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A name inside a directory. Collisions are scoped to one directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub directory: PathBuf,
    pub name: String,
}

impl NodeKey {
    pub fn new(directory: &Path, name: &str) -> Self {
        Self {
            directory: directory.to_path_buf(),
            name: name.to_string(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub key: NodeKey,
    /// Node this name is renamed to
    pub next: Option<usize>,
    /// Node renamed onto this name
    pub prev: Option<usize>,
    /// Request that moves the file currently holding this name
    pub request: Option<usize>,
}

/// Names touched by a batch, as an arena addressed by index.
///
/// Every active request contributes one edge `current -> target`. After
/// validation each node has at most one outgoing and one incoming edge, so the
/// graph is a disjoint union of simple paths and simple cycles.
#[derive(Debug, Clone, Default)]
pub struct CollisionGraph {
    nodes: Vec<Node>,
    index: HashMap<NodeKey, usize>,
}

impl CollisionGraph {
    pub fn build(requests: &[RenameRequest], validated: &ValidatedBatch) -> Self {
        let mut graph = Self::default();

        for &request_index in &validated.active {
            let request = &requests[request_index];
            let from = graph.intern(NodeKey::new(&request.directory, &request.current_name));
            let to = graph.intern(NodeKey::new(&request.directory, &request.target_name));

            graph.nodes[from].next = Some(to);
            graph.nodes[from].request = Some(request_index);
            graph.nodes[to].prev = Some(from);
        }

        graph
    }

    fn intern(&mut self, key: NodeKey) -> usize {
        if let Some(&existing) = self.index.get(&key) {
            return existing;
        }
        let id = self.nodes.len();
        self.index.insert(key.clone(), id);
        self.nodes.push(Node {
            key,
            next: None,
            prev: None,
            request: None,
        });
        id
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn lookup(&self, directory: &Path, name: &str) -> Option<usize> {
        self.index.get(&NodeKey::new(directory, name)).copied()
    }

    /// Whether `name` in `directory` is a current or target name in the batch
    pub fn contains(&self, directory: &Path, name: &str) -> bool {
        self.lookup(directory, name).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

use crate::{path::CodingPath, value::ValueTree};

/// The mutable context of a single decode call.
///
/// It holds a stack of the nodes being decoded (the top is the node currently
/// being decoded) and the coding path of that top node. The stack can never be
/// empty: the root node stays at the bottom for the whole call.
#[derive(Debug)]
pub struct DecodingState<'a> {
    current: &'a ValueTree,
    storage: Vec<&'a ValueTree>,
    coding_path: CodingPath,
    saved_paths: Vec<CodingPath>,
}

impl<'a> DecodingState<'a> {
    #[must_use]
    pub const fn new(root: &'a ValueTree) -> Self {
        Self {
            current: root,
            storage: Vec::new(),
            coding_path: CodingPath::new(),
            saved_paths: Vec::new(),
        }
    }

    /// Returns the node on top of the stack.
    #[must_use]
    pub const fn current(&self) -> &'a ValueTree {
        self.current
    }

    #[must_use]
    pub const fn coding_path(&self) -> &CodingPath {
        &self.coding_path
    }

    /// Returns how many nodes sit above the root.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.storage.len()
    }

    /// Makes `node` the current node, located at `path`.
    pub(crate) fn push(&mut self, node: &'a ValueTree, path: CodingPath) {
        self.storage.push(std::mem::replace(&mut self.current, node));
        self.saved_paths
            .push(std::mem::replace(&mut self.coding_path, path));
    }

    /// Restores the node and path that were current before the matching [`push`](Self::push).
    /// Popping at the root does nothing.
    pub(crate) fn pop(&mut self) {
        if let Some(node) = self.storage.pop() {
            self.current = node;
        }
        if let Some(path) = self.saved_paths.pop() {
            self.coding_path = path;
        }
    }
}

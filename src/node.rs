//! Search nodes and path reconstruction.

/// Index of a node in the driver's node arena.
pub type NodeId = usize;

/// A node in the search tree.
///
/// Nodes live in a flat arena owned by the search driver and refer to their
/// parent by index. Once created a node never changes, so the parent chain
/// always ends at the start node and cannot cycle.
#[derive(Debug, Clone)]
pub struct SearchNode<S, A> {
    state: S,
    g: f64,
    h: f64,
    action: Option<A>,
    parent: Option<NodeId>,
    depth: u32,
}

impl<S, A> SearchNode<S, A> {
    /// The start node: no parent, no action, `g = 0`.
    pub fn root(state: S, h: f64) -> Self {
        SearchNode {
            state,
            g: 0.0,
            h,
            action: None,
            parent: None,
            depth: 0,
        }
    }

    pub fn child(state: S, g: f64, h: f64, action: A, parent: NodeId, depth: u32) -> Self {
        SearchNode {
            state,
            g,
            h,
            action: Some(action),
            parent: Some(parent),
            depth,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    /// Accumulated path cost from the start node.
    pub fn g(&self) -> f64 {
        self.g
    }

    /// Heuristic estimate of the remaining cost.
    pub fn h(&self) -> f64 {
        self.h
    }

    /// Priority key, `g + h`. Lower is expanded first.
    pub fn f(&self) -> f64 {
        self.g + self.h
    }

    /// The transition that produced this node; `None` for the start node.
    pub fn action(&self) -> Option<&A> {
        self.action.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Number of transitions from the start node.
    pub fn depth(&self) -> u32 {
        self.depth
    }
}

/// Follows the parent chain from `terminal` back to the start node,
/// returning arena indices in start-to-terminal order.
pub fn extract_path<S, A>(arena: &[SearchNode<S, A>], terminal: NodeId) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = Some(terminal);
    while let Some(idx) = current {
        path.push(idx);
        current = arena[idx].parent;
    }
    path.reverse();
    path
}

/// The actions along the path from the start node to `terminal`.
pub fn extract_actions<S, A: Clone>(arena: &[SearchNode<S, A>], terminal: NodeId) -> Vec<A> {
    extract_path(arena, terminal)
        .into_iter()
        .filter_map(|idx| arena[idx].action.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // root(0) -> 1 -> 3, root(0) -> 2
    fn small_tree() -> Vec<SearchNode<&'static str, char>> {
        vec![
            SearchNode::root("start", 4.0),
            SearchNode::child("a", 1.0, 3.0, 'r', 0, 1),
            SearchNode::child("b", 1.0, 5.0, 'd', 0, 1),
            SearchNode::child("goal", 2.5, 0.0, 'R', 1, 2),
        ]
    }

    #[test]
    fn test_root_node() {
        let tree = small_tree();
        let root = &tree[0];
        assert_eq!(root.g(), 0.0);
        assert_eq!(root.f(), 4.0);
        assert!(root.action().is_none());
        assert!(root.parent().is_none());
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn test_child_node_f_is_g_plus_h() {
        let tree = small_tree();
        assert_eq!(tree[1].f(), 4.0);
        assert_eq!(tree[2].f(), 6.0);
        assert_eq!(tree[3].f(), 2.5);
        assert_eq!(tree[3].action(), Some(&'R'));
        assert_eq!(tree[3].parent(), Some(1));
    }

    #[test]
    fn test_extract_path() {
        let tree = small_tree();
        assert_eq!(extract_path(&tree, 3), vec![0, 1, 3]);
        assert_eq!(extract_path(&tree, 2), vec![0, 2]);
        assert_eq!(extract_path(&tree, 0), vec![0]);
    }

    #[test]
    fn test_extract_actions_skips_root() {
        let tree = small_tree();
        assert_eq!(extract_actions(&tree, 3), vec!['r', 'R']);
        assert!(extract_actions(&tree, 0).is_empty());
    }
}

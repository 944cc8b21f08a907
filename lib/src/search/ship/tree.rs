//! The search tree: rows stored in an arena, each linked to its parent.

use super::rows::Row;
use crate::cells::{State, DEAD};
use std::collections::VecDeque;

/// A row of the search tree.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) row: Row,
    pub(crate) parent: Option<usize>,
    /// Index of the row in the interleaved sequence.
    pub(crate) depth: usize,
    /// Whether this row or one of its ancestors is not empty.
    pub(crate) live: bool,
    /// The depth up to which a deepening pass has already extended this
    /// row or its ancestors.
    pub(crate) pruned: usize,
}

pub(crate) fn is_empty(row: &[State]) -> bool {
    row.iter().all(|&state| state == DEAD)
}

/// Something that looks up nodes by id.
pub(crate) trait Nodes {
    fn node(&self, id: usize) -> &Node;

    /// The last `len` rows ending at `id`, oldest first.
    fn window(&self, id: usize, len: usize) -> Vec<&[State]> {
        let mut rows = Vec::with_capacity(len);
        let mut current = Some(id);
        while rows.len() < len {
            match current {
                Some(id) => {
                    let node = self.node(id);
                    rows.push(&node.row[..]);
                    current = node.parent;
                }
                None => break,
            }
        }
        rows.reverse();
        rows
    }

    /// All rows from the root to `id`.
    fn path(&self, id: usize) -> Vec<&[State]> {
        self.window(id, self.node(id).depth + 1)
    }

    /// The child of `parent` with the given row, not yet stored anywhere.
    fn child(&self, parent: usize, row: Row, pruned: usize) -> Node {
        let node = self.node(parent);
        let live = node.live || !is_empty(&row);
        let depth = node.depth + 1;
        Node {
            row,
            parent: Some(parent),
            depth,
            live,
            pruned: pruned.max(depth),
        }
    }
}

/// Nodes are pushed after their parents, so a parent always has a
/// smaller id than its children.
#[derive(Clone, Debug, Default)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
}

impl Nodes for Tree {
    fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }
}

impl Tree {
    /// A chain of `len` empty rows. Returns the tree and the id of the
    /// last row.
    pub(crate) fn with_prefix(empty: &Row, len: usize) -> (Self, usize) {
        let nodes = (0..len)
            .map(|depth| Node {
                row: empty.clone(),
                parent: depth.checked_sub(1),
                depth,
                live: false,
                pruned: depth,
            })
            .collect();
        (Tree { nodes }, len - 1)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn push(&mut self, parent: usize, row: Row) -> usize {
        let pruned = self.nodes[parent].pruned;
        let node = self.child(parent, row, pruned);
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Appends the nodes of a branch that was grown when the tree had
    /// `base` nodes, and returns a function that renumbers its ids.
    pub(crate) fn merge(&mut self, base: usize, nodes: Vec<Node>) -> impl Fn(usize) -> usize {
        let offset = self.nodes.len() - base;
        let renumber = move |id: usize| if id < base { id } else { id + offset };
        for mut node in nodes {
            node.parent = node.parent.map(renumber);
            self.nodes.push(node);
        }
        renumber
    }

    /// Drops every node that is not an ancestor of a queued node,
    /// and renumbers the queue.
    pub(crate) fn compact(&mut self, queue: &mut VecDeque<usize>) {
        let mut keep = vec![false; self.nodes.len()];
        for &id in queue.iter() {
            let mut current = Some(id);
            while let Some(id) = current {
                if keep[id] {
                    break;
                }
                keep[id] = true;
                current = self.nodes[id].parent;
            }
        }

        let mut ids = vec![usize::MAX; self.nodes.len()];
        let nodes = std::mem::take(&mut self.nodes);
        for (old, mut node) in nodes.into_iter().enumerate() {
            if keep[old] {
                node.parent = node.parent.map(|parent| ids[parent]);
                ids[old] = self.nodes.len();
                self.nodes.push(node);
            }
        }
        for id in queue.iter_mut() {
            *id = ids[*id];
        }
    }
}

/// Nodes grown from a shared tree by one deepening worker.
///
/// Their ids continue after the tree's, so they can be merged back
/// once every worker is done.
#[derive(Debug)]
pub(crate) struct Branch<'t> {
    tree: &'t Tree,
    base: usize,
    nodes: Vec<Node>,
}

impl<'t> Branch<'t> {
    pub(crate) fn new(tree: &'t Tree) -> Self {
        Branch {
            tree,
            base: tree.len(),
            nodes: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, parent: usize, row: Row, pruned: usize) -> usize {
        let node = self.child(parent, row, pruned);
        self.nodes.push(node);
        self.base + self.nodes.len() - 1
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

impl Nodes for Branch<'_> {
    fn node(&self, id: usize) -> &Node {
        if id < self.base {
            self.tree.node(id)
        } else {
            &self.nodes[id - self.base]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells::ALIVE;

    fn row(states: &[State]) -> Row {
        states.to_vec().into_boxed_slice()
    }

    #[test]
    fn windows_and_paths() {
        let empty = row(&[DEAD, DEAD]);
        let (mut tree, root) = Tree::with_prefix(&empty, 3);
        let a = tree.push(root, row(&[ALIVE, DEAD]));
        let b = tree.push(a, row(&[DEAD, ALIVE]));
        assert!(!tree.node(root).live);
        assert!(tree.node(b).live);
        assert_eq!(tree.node(b).depth, 4);
        assert_eq!(tree.window(b, 2), vec![&[ALIVE, DEAD][..], &[DEAD, ALIVE][..]]);
        assert_eq!(tree.path(b).len(), 5);
    }

    #[test]
    fn compaction_keeps_ancestors_of_the_queue() {
        let empty = row(&[DEAD]);
        let (mut tree, root) = Tree::with_prefix(&empty, 2);
        let a = tree.push(root, row(&[ALIVE]));
        let _dead_end = tree.push(root, row(&[DEAD]));
        let b = tree.push(a, row(&[DEAD]));
        let mut queue: VecDeque<usize> = vec![b].into();
        tree.compact(&mut queue);
        assert_eq!(tree.len(), 4);
        let b = queue[0];
        assert_eq!(tree.node(b).depth, 3);
        assert_eq!(tree.path(b)[2], &[ALIVE][..]);
    }

    #[test]
    fn branches_are_merged_after_the_tree() {
        let empty = row(&[DEAD]);
        let (mut tree, root) = Tree::with_prefix(&empty, 2);
        let base = tree.len();
        let first = {
            let mut branch = Branch::new(&tree);
            let a = branch.push(root, row(&[ALIVE]), 5);
            let b = branch.push(a, row(&[DEAD]), 5);
            assert_eq!(branch.path(b), vec![&[DEAD][..], &[DEAD], &[ALIVE], &[DEAD]]);
            (branch.into_nodes(), b)
        };
        let second = {
            let mut branch = Branch::new(&tree);
            let c = branch.push(root, row(&[DEAD]), 0);
            (branch.into_nodes(), c)
        };
        assert_eq!((first.1, second.1), (3, 2));

        let renumber = tree.merge(base, first.0);
        let b = renumber(first.1);
        let renumber = tree.merge(base, second.0);
        let c = renumber(second.1);
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.node(b).depth, 3);
        assert_eq!(tree.node(b).pruned, 5);
        assert_eq!(tree.path(b)[2], &[ALIVE][..]);
        assert_eq!(tree.node(c).parent, Some(root));
        assert_eq!(tree.node(c).pruned, 2);
        assert!(!tree.node(c).live);
    }
}

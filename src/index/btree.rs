use crate::index::{Accumulate, IndexError};
use std::fmt::Debug;

/// Default maximum number of keys per node.
pub const DEFAULT_BTREE_ORDER: usize = 3;

/// Integer key to accumulated integer value, as built from the page store.
pub type OrderedIndex = BPlusTree<i32, i32>;

type NodeId = usize;

#[derive(Debug, Clone)]
enum Node<K, V> {
    Leaf {
        keys: Vec<K>,
        values: Vec<V>,
        next: Option<NodeId>,
    },
    Internal {
        keys: Vec<K>,
        children: Vec<NodeId>,
    },
}

impl<K, V> Node<K, V> {
    fn empty_leaf() -> Self {
        Node::Leaf {
            keys: Vec::new(),
            values: Vec::new(),
            next: None,
        }
    }

    fn key_count(&self) -> usize {
        match self {
            Node::Leaf { keys, .. } | Node::Internal { keys, .. } => keys.len(),
        }
    }

    fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Shape of the tree, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeStatistics {
    pub height: usize,
    pub leaf_count: usize,
    pub internal_count: usize,
    pub entry_count: usize,
}

/// In-memory B+Tree with accumulator semantics.
///
/// Nodes live in an arena and refer to each other by index. Leaves hold the
/// entries and are chained left to right through `next`; internal nodes hold
/// separator keys with one more child than keys. A node holding more than
/// `order` keys is split straight after the insert that overflowed it.
///
/// There is no delete; the index is rebuilt from a full scan instead.
#[derive(Debug, Clone)]
pub struct BPlusTree<K, V> {
    nodes: Vec<Node<K, V>>,
    root: NodeId,
    order: usize,
    len: usize,
}

impl<K, V> BPlusTree<K, V>
where
    K: Ord + Clone + Debug,
    V: Accumulate + Clone + Debug,
{
    pub fn new(order: usize) -> Result<Self, IndexError> {
        if order < 2 {
            return Err(IndexError::InvalidOrder(order));
        }
        Ok(Self {
            nodes: vec![Node::empty_leaf()],
            root: 0,
            order,
            len: 0,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; a tree with a single leaf has height 1.
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = self.root;
        while let Node::Internal { children, .. } = &self.nodes[node] {
            node = children[0];
            height += 1;
        }
        height
    }

    pub fn get_statistics(&self) -> BTreeStatistics {
        let leaf_count = self.nodes.iter().filter(|node| node.is_leaf()).count();
        BTreeStatistics {
            height: self.height(),
            leaf_count,
            internal_count: self.nodes.len() - leaf_count,
            entry_count: self.len,
        }
    }

    /// Insert `key`, or add `value` to its stored value if present.
    pub fn insert_or_update(&mut self, key: K, value: V) {
        // (internal node, index of the child taken)
        let mut path: Vec<(NodeId, usize)> = Vec::new();
        let mut node = self.root;
        while let Node::Internal { keys, children } = &self.nodes[node] {
            let index = keys.partition_point(|k| *k <= key);
            path.push((node, index));
            node = children[index];
        }

        let Node::Leaf { keys, values, .. } = &mut self.nodes[node] else {
            unreachable!("descent always ends at a leaf");
        };
        let pos = keys.partition_point(|k| *k < key);
        if pos < keys.len() && keys[pos] == key {
            values[pos].accumulate(value);
            return;
        }
        keys.insert(pos, key);
        values.insert(pos, value);
        self.len += 1;

        self.split_upwards(node, path);
    }

    fn split_upwards(&mut self, mut node: NodeId, mut path: Vec<(NodeId, usize)>) {
        while self.nodes[node].key_count() > self.order {
            let (separator, sibling) = self.split(node);

            match path.pop() {
                None => {
                    let root = self.alloc(Node::Internal {
                        keys: vec![separator],
                        children: vec![node, sibling],
                    });
                    self.root = root;
                    return;
                }
                Some((parent, index)) => {
                    let Node::Internal { keys, children } = &mut self.nodes[parent] else {
                        unreachable!("path only records internal nodes");
                    };
                    keys.insert(index, separator);
                    children.insert(index + 1, sibling);
                    node = parent;
                }
            }
        }
    }

    /// Move the upper half of `node` into a new right sibling. Returns the
    /// separator for the parent and the sibling id.
    fn split(&mut self, node: NodeId) -> (K, NodeId) {
        let sibling_id = self.nodes.len();

        let (separator, sibling) = match &mut self.nodes[node] {
            Node::Leaf { keys, values, next } => {
                let mid = keys.len() / 2;
                let right_keys = keys.split_off(mid);
                let right_values = values.split_off(mid);
                let separator = right_keys[0].clone();
                let sibling = Node::Leaf {
                    keys: right_keys,
                    values: right_values,
                    next: next.replace(sibling_id),
                };
                (separator, sibling)
            }
            Node::Internal { keys, children } => {
                let mid = keys.len() / 2;
                let mut right_keys = keys.split_off(mid);
                let separator = right_keys.remove(0);
                let right_children = children.split_off(mid + 1);
                let sibling = Node::Internal {
                    keys: right_keys,
                    children: right_children,
                };
                (separator, sibling)
            }
        };

        let allocated = self.alloc(sibling);
        debug_assert_eq!(allocated, sibling_id);
        (separator, sibling_id)
    }

    fn alloc(&mut self, node: Node<K, V>) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// The leaf whose key range contains `key`.
    fn find_leaf(&self, key: &K) -> NodeId {
        let mut node = self.root;
        while let Node::Internal { keys, children } = &self.nodes[node] {
            node = children[keys.partition_point(|k| k <= key)];
        }
        node
    }

    fn leftmost_leaf(&self) -> NodeId {
        let mut node = self.root;
        while let Node::Internal { children, .. } = &self.nodes[node] {
            node = children[0];
        }
        node
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.nodes[self.find_leaf(key)] {
            Node::Leaf { keys, values, .. } => {
                keys.binary_search(key).ok().map(|pos| &values[pos])
            }
            Node::Internal { .. } => None,
        }
    }

    /// Values of all keys in `[lower, upper]`, ascending by key.
    pub fn range_query(&self, lower: &K, upper: &K) -> Vec<V> {
        self.range(lower, upper).map(|(_, value)| value.clone()).collect()
    }

    /// Entries with keys in `[lower, upper]`, walking the leaf chain from the
    /// leaf that would hold `lower`.
    pub fn range<'a>(&'a self, lower: &K, upper: &'a K) -> LeafChainIter<'a, K, V> {
        let leaf = self.find_leaf(lower);
        let pos = match &self.nodes[leaf] {
            Node::Leaf { keys, .. } => keys.partition_point(|k| k < lower),
            Node::Internal { .. } => 0,
        };
        LeafChainIter {
            tree: self,
            leaf: Some(leaf),
            pos,
            upper: Some(upper),
        }
    }

    /// Every entry in ascending key order.
    pub fn iter(&self) -> LeafChainIter<'_, K, V> {
        LeafChainIter {
            tree: self,
            leaf: Some(self.leftmost_leaf()),
            pos: 0,
            upper: None,
        }
    }

    /// Keys in leaf-chain order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    /// Check ordering, fan-out and leaf-chain invariants.
    #[cfg(test)]
    fn validate(&self) {
        fn visit<K: Ord + Clone + Debug, V>(
            tree: &BPlusTree<K, V>,
            node: NodeId,
            lower: Option<&K>,
            upper: Option<&K>,
            depth: usize,
            leaves: &mut Vec<(NodeId, usize)>,
        ) {
            let keys = match &tree.nodes[node] {
                Node::Leaf { keys, .. } | Node::Internal { keys, .. } => keys,
            };
            assert!(keys.len() <= tree.order, "node {node} overflows");
            assert!(keys.windows(2).all(|w| w[0] < w[1]), "node {node} unsorted");
            if let Some(lower) = lower {
                assert!(keys.iter().all(|k| k >= lower));
            }
            if let Some(upper) = upper {
                assert!(keys.iter().all(|k| k < upper));
            }
            match &tree.nodes[node] {
                Node::Leaf { .. } => leaves.push((node, depth)),
                Node::Internal { keys, children } => {
                    assert_eq!(children.len(), keys.len() + 1);
                    for (i, child) in children.iter().enumerate() {
                        let lo = if i == 0 { lower } else { Some(&keys[i - 1]) };
                        let hi = if i == keys.len() { upper } else { Some(&keys[i]) };
                        visit(tree, *child, lo, hi, depth + 1, leaves);
                    }
                }
            }
        }

        let mut leaves = Vec::new();
        visit(self, self.root, None, None, 1, &mut leaves);

        assert_eq!(self.nodes[self.root].is_leaf(), leaves.len() == 1);
        assert!(leaves.iter().all(|(_, depth)| *depth == self.height()));

        // The chain visits exactly the leaves, left to right
        let mut chain = Vec::new();
        let mut cursor = Some(self.leftmost_leaf());
        while let Some(leaf) = cursor {
            chain.push(leaf);
            cursor = match &self.nodes[leaf] {
                Node::Leaf { next, .. } => *next,
                Node::Internal { .. } => panic!("chain reached an internal node"),
            };
        }
        let expected: Vec<NodeId> = leaves.iter().map(|(leaf, _)| *leaf).collect();
        assert_eq!(chain, expected);
    }
}

impl Default for BPlusTree<i32, i32> {
    fn default() -> Self {
        Self {
            nodes: vec![Node::empty_leaf()],
            root: 0,
            order: DEFAULT_BTREE_ORDER,
            len: 0,
        }
    }
}

/// Walks the leaf chain, optionally stopping at the first key above `upper`.
pub struct LeafChainIter<'a, K, V> {
    tree: &'a BPlusTree<K, V>,
    leaf: Option<NodeId>,
    pos: usize,
    upper: Option<&'a K>,
}

impl<'a, K: Ord, V> Iterator for LeafChainIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Node::Leaf { keys, values, next } = &self.tree.nodes[self.leaf?] else {
                self.leaf = None;
                return None;
            };

            if self.pos < keys.len() {
                let key = &keys[self.pos];
                if self.upper.is_some_and(|upper| key > upper) {
                    self.leaf = None;
                    return None;
                }
                let value = &values[self.pos];
                self.pos += 1;
                return Some((key, value));
            }

            self.leaf = *next;
            self.pos = 0;
        }
    }
}

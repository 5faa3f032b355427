use std::collections::HashMap;
use std::sync::RwLock;

use crate::path::PathKey;

/// A thread-safe Trie keyed by path segments.
///
/// Each value is stored at the node for the path it was inserted under.
/// Lookups answer the two questions listener matching needs:
/// - which values sit on a strict ancestor of a path (`ancestors_of`)
/// - which values sit on the path itself or anywhere below it (`subtree_of`)
///
/// Because the trie walks whole segments, `a.b` never matches `a.bc`.
///
/// # Examples
///
/// ```ignore
/// let trie = Trie::new();
/// trie.insert(&PathKey::parse("a")?, 1);
/// trie.insert(&PathKey::parse("a.b.c")?, 2);
///
/// trie.ancestors_of(&PathKey::parse("a.b")?); // [1]
/// trie.subtree_of(&PathKey::parse("a.b")?);   // [2]
/// ```
pub struct Trie<T> {
    root: RwLock<TrieNode<T>>,
}

struct TrieNode<T> {
    /// Children keyed by segment string.
    children: HashMap<String, TrieNode<T>>,
    /// Values stored at this node (inserted with exactly this path).
    values: Vec<T>,
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Clone> Trie<T> {
    /// Create a new empty Trie.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(TrieNode::default()),
        }
    }

    /// Insert a value at the given path.
    pub fn insert(&self, path: &PathKey, value: T) {
        let mut root = self.root.write().unwrap();
        root.node_mut(path.segments()).values.push(value);
    }

    /// Values stored on strict ancestors of `path`, root first.
    pub fn ancestors_of(&self, path: &PathKey) -> Vec<T> {
        let root = self.root.read().unwrap();
        let mut results = Vec::new();
        let mut node = &*root;
        for segment in path.segments() {
            results.extend(node.values.iter().cloned());
            match node.children.get(segment) {
                Some(child) => node = child,
                None => break,
            }
        }
        results
    }

    /// Values stored at `path` or anywhere beneath it.
    pub fn subtree_of(&self, path: &PathKey) -> Vec<T> {
        let root = self.root.read().unwrap();
        let mut results = Vec::new();
        if let Some(node) = root.node(path.segments()) {
            node.collect_all(&mut results);
        }
        results
    }

    /// Remove values matching the predicate from the given path.
    ///
    /// Returns `true` if any values were removed. Nodes left empty are pruned.
    pub fn remove<F>(&self, path: &PathKey, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        let mut root = self.root.write().unwrap();
        root.remove(path.segments(), &predicate)
    }

    /// Total number of stored values.
    pub fn len(&self) -> usize {
        self.root.read().unwrap().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for Trie<T>
where
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TrieNode<T> {
    fn node(&self, segments: &[String]) -> Option<&TrieNode<T>> {
        let mut node = self;
        for segment in segments {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    fn node_mut(&mut self, segments: &[String]) -> &mut TrieNode<T> {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.clone()).or_default();
        }
        node
    }

    fn collect_all(&self, results: &mut Vec<T>) {
        results.extend(self.values.iter().cloned());
        for child in self.children.values() {
            child.collect_all(results);
        }
    }

    fn remove<F>(&mut self, segments: &[String], predicate: &F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        let Some((first, rest)) = segments.split_first() else {
            let before = self.values.len();
            self.values.retain(|v| !predicate(v));
            return self.values.len() < before;
        };

        let Some(child) = self.children.get_mut(first) else {
            return false;
        };
        let removed = child.remove(rest, predicate);
        if child.values.is_empty() && child.children.is_empty() {
            self.children.remove(first);
        }
        removed
    }

    fn count(&self) -> usize {
        self.values.len() + self.children.values().map(TrieNode::count).sum::<usize>()
    }
}

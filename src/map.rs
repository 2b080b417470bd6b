use core::fmt::{Debug, Display};
use core::hash::{Hash, Hasher};
use core::ops::Index;
use core::{fmt, ptr};

use std::collections::hash_map::DefaultHasher;

use crate::arena::NodeArena;
use crate::error::{AllocError, OnError};
use crate::node::{InternalNode, LeafNode, Node, NodePtr};
use crate::pool::{ChildrenPool, PoolStats};

/// Fixed depth of the trie: ten levels of six hash bits each.
pub(crate) const MAX_LEVEL: usize = 10;

/// Bits of the hash consumed per level.
const CHUNK_BITS: usize = 6;

/// Keeps the low `MAX_LEVEL * CHUNK_BITS` bits of a hash.
const HASH_MASK: u64 = 0x0FFF_FFFF_FFFF_FFFF;

/// The child slot addressed by `hash` at tree level `level`.
#[inline(always)]
const fn chunk(hash: u64, level: usize) -> usize {
    ((hash >> (CHUNK_BITS * level)) & 0x3F) as usize
}

/// Allocator sizing of a [`HamtMap`].
///
/// The defaults are tuned so that workloads of tens of thousands of entries never leave
/// the pre-allocated pool slab.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HamtConfig {
    /// Child-pointer cells in the pool slab.
    pub pool_capacity: usize,
    /// Node slots per arena block.
    pub arena_block: usize,
}

impl Default for HamtConfig {
    #[inline]
    fn default() -> Self {
        HamtConfig {
            pool_capacity: 4_000_000,
            arena_block: 1024,
        }
    }
}

/// Structural counters of the trie, gathered by a full walk.
///
/// These power structural assertions in tests and coarse observability; the walk is not
/// meant for hot paths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TreeStats {
    /// Number of key-value pairs across all leaf buckets.
    pub entries: usize,
    /// Deepest node observed, counted from the root at depth `0`.
    pub max_depth: usize,
    /// Number of internal nodes, the root included.
    pub internal_nodes: usize,
    /// Number of leaf buckets.
    pub leaf_nodes: usize,
    /// Mean live children per internal node.
    pub avg_children_per_internal: f64,
    /// Live child pointers across all internal nodes.
    pub total_child_pointers: usize,
}

/// A hash array mapped trie with pool-backed allocation.
///
/// Keys are located by their 64-bit hash, consumed six bits per tree level over a fixed
/// depth of ten levels; the last level holds leaf buckets in which colliding keys coexist
/// in insertion order. Internal nodes keep their children in dense bitmap-indexed arrays.
///
/// Nodes live in a block-allocated arena and child arrays in a bump-allocated pool, both
/// private to the map, so insertion and lookup stay off the general-purpose allocator;
/// [`pool_stats`](HamtMap::pool_stats) exposes the pool's telemetry. The map owns
/// its keys and values and is mutated in place; it is not a persistent data structure and
/// must be externally serialized if shared across threads.
pub struct HamtMap<K, V> {
    root: NodePtr<K, V>,
    arena: NodeArena<Node<K, V>>,
    pool: ChildrenPool<NodePtr<K, V>>,
    hash_fn: Option<fn(&K) -> u64>,
    len: usize,
}

// Core implementation
impl<K, V> HamtMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new `HamtMap` with the default allocator sizing.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let map: HamtMap<i32, &str> = HamtMap::new();
    ///
    /// assert_eq!(map.len(), 0);
    /// assert!(map.is_empty());
    /// ```
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        Self::with_config(HamtConfig::default())
    }

    /// Creates a new `HamtMap` that hashes keys with `hash_fn` instead of the platform's
    /// default hasher.
    ///
    /// The hook is honored verbatim; a degenerate hash (even a constant) only affects
    /// performance, never correctness.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// // Every key collides, yet all of them remain retrievable.
    /// let mut map = HamtMap::with_hasher(|_: &i32| 42);
    ///
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    ///
    /// assert_eq!(map.get(&1), Some("one"));
    /// assert_eq!(map.get(&2), Some("two"));
    /// assert_eq!(map.len(), 2);
    /// ```
    #[must_use]
    #[inline]
    pub fn with_hasher(hash_fn: fn(&K) -> u64) -> Self {
        Self::with_config_and_hasher(HamtConfig::default(), hash_fn)
    }

    /// Creates a new `HamtMap` with explicit allocator sizing.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::{HamtConfig, HamtMap};
    ///
    /// let mut map = HamtMap::with_config(HamtConfig {
    ///     pool_capacity: 1 << 16,
    ///     arena_block: 256,
    /// });
    ///
    /// map.insert("key", 1);
    ///
    /// assert_eq!(map.get(&"key"), Some(1));
    /// ```
    ///
    /// # Panics
    ///
    /// If `arena_block` is `0`, or if the pool slab cannot be allocated.
    #[must_use]
    #[inline]
    pub fn with_config(config: HamtConfig) -> Self {
        match Self::make(config, None, OnError::Panic) {
            Ok(map) => map,
            // A panicking context never returns an error.
            Err(_) => unreachable!("Logic error: panicking context returned an error"),
        }
    }

    /// Creates a new `HamtMap` with explicit allocator sizing and a custom hash hook.
    ///
    /// # Panics
    ///
    /// If `arena_block` is `0`, or if the pool slab cannot be allocated.
    #[must_use]
    #[inline]
    pub fn with_config_and_hasher(config: HamtConfig, hash_fn: fn(&K) -> u64) -> Self {
        match Self::make(config, Some(hash_fn), OnError::Panic) {
            Ok(map) => map,
            Err(_) => unreachable!("Logic error: panicking context returned an error"),
        }
    }

    /// Creates a new `HamtMap` with explicit allocator sizing, reporting slab allocation
    /// failure instead of aborting.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::{HamtConfig, HamtMap};
    ///
    /// let result: Result<HamtMap<i32, i32>, _> = HamtMap::try_with_config(HamtConfig {
    ///     pool_capacity: usize::MAX,
    ///     arena_block: 1024,
    /// });
    ///
    /// assert!(result.is_err());
    /// ```
    pub fn try_with_config(config: HamtConfig) -> Result<Self, AllocError> {
        Self::make(config, None, OnError::ReturnErr)
    }

    fn make(
        config: HamtConfig,
        hash_fn: Option<fn(&K) -> u64>,
        on_err: OnError,
    ) -> Result<Self, AllocError> {
        let mut arena = NodeArena::new(config.arena_block);
        let pool = ChildrenPool::new(config.pool_capacity, on_err)?;

        // The root is always internal and exists for the map's whole lifetime.
        let root: *mut Node<K, V> = arena.allocate();
        unsafe { root.write(Node::new_internal()) };

        Ok(HamtMap {
            root,
            arena,
            pool,
            hash_fn,
            len: 0,
        })
    }

    /// Returns the number of key-value pairs in the `HamtMap`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// assert_eq!(map.len(), 0);
    ///
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks if the `HamtMap` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let map: HamtMap<i32, &str> = HamtMap::new();
    ///
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Calculates the masked hash value for a key.
    ///
    /// Only the low 60 bits take part in addressing: ten levels of six bits each.
    #[inline]
    fn make_hash(&self, key: &K) -> u64 {
        let hash = match self.hash_fn {
            Some(hash_fn) => hash_fn(key),
            None => {
                let mut hasher = DefaultHasher::new();
                key.hash(&mut hasher);
                hasher.finish()
            }
        };
        hash & HASH_MASK
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the key is already present, its value is overwritten and the length is
    /// unchanged; otherwise the pair is appended to the leaf addressed by the key's hash,
    /// creating the path of internal nodes on the way down as needed.
    ///
    /// # Time Complexity
    ///
    /// _O_(1): the walk visits a fixed number of levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some("a"));
    ///
    /// // Updating an existing key does not change the length.
    /// map.insert(1, "b");
    /// assert_eq!(map.get(&1), Some("b"));
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) {
        let hash = self.make_hash(&key);

        let mut node = self.root;

        for level in 0..MAX_LEVEL {
            // Levels below `MAX_LEVEL` hold internal nodes only.
            let internal = unsafe { (*node).as_internal_mut() };
            let slot = chunk(hash, level);

            node = match internal.child_at(slot) {
                Some(child) => child,
                None => internal.add_child(
                    slot,
                    &mut self.arena,
                    &mut self.pool,
                    level + 1 < MAX_LEVEL,
                ),
            };
        }

        // The walk ends at the leaf addressed by every chunk of the hash.
        let leaf = unsafe { (*node).as_leaf_mut() };

        if leaf.put(key, value) {
            self.len += 1;
        }
    }

    /// Walks the trie and returns a reference to the value stored for `key`.
    fn lookup(&self, key: &K) -> Option<&V> {
        let hash = self.make_hash(key);

        let mut node = self.root;

        for level in 0..MAX_LEVEL {
            let internal = unsafe { (*node).as_internal() };

            match internal.child_at(chunk(hash, level)) {
                Some(child) => node = child,
                None => return None,
            }
        }

        unsafe { (*node).as_leaf() }.get(key)
    }

    /// Retrieves a clone of the value stored for `key`.
    ///
    /// # Returns
    ///
    /// - `Some(value)`: if the key is found.
    ///
    /// - `None`: if the key does not exist.
    ///
    /// # Time Complexity
    ///
    /// _O_(1): the walk visits a fixed number of levels.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, "a");
    ///
    /// assert_eq!(map.get(&1), Some("a"));
    ///
    /// // Key does not exist.
    /// assert_eq!(map.get(&2), None);
    /// ```
    #[must_use]
    #[inline]
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.lookup(key).cloned()
    }

    /// Returns `true` if the map contains a value for the specified key.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, "a");
    ///
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    #[inline]
    pub fn contains_key(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    /// Returns an iterator over the key-value pairs in the `HamtMap`.
    ///
    /// Pairs are yielded in traversal order: depth-first over ascending child slots, with
    /// colliding keys in insertion order. The order is deterministic for a fixed
    /// insertion history but is otherwise unspecified.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, 10);
    /// map.insert(2, 20);
    ///
    /// let mut pairs: Vec<(i32, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
    /// pairs.sort();
    ///
    /// assert_eq!(pairs, vec![(1, 10), (2, 20)]);
    /// ```
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V> {
        let root = unsafe { (*self.root).as_internal() };
        Iter {
            stack: vec![(root, 0)],
            leaf: None,
        }
    }

    /// Returns an iterator over the keys in the `HamtMap`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, "a");
    ///
    /// assert_eq!(map.keys().collect::<Vec<&i32>>(), vec![&1]);
    /// ```
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in the `HamtMap`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, "a");
    ///
    /// assert_eq!(map.values().collect::<Vec<&&str>>(), vec![&"a"]);
    /// ```
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Returns a snapshot of the children pool's telemetry counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// for i in 0..100 {
    ///     map.insert(i, i);
    /// }
    ///
    /// // Default sizing keeps the workload inside the slab.
    /// assert_eq!(map.pool_stats().fallback_allocations, 0);
    /// ```
    #[inline]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Walks the trie and returns its structural counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, "a");
    ///
    /// let stats = map.tree_stats();
    ///
    /// assert_eq!(stats.entries, 1);
    /// assert_eq!(stats.leaf_nodes, 1);
    /// ```
    pub fn tree_stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();

        Self::collect_tree_stats(unsafe { &*self.root }, 0, &mut stats);

        if stats.internal_nodes > 0 {
            stats.avg_children_per_internal =
                stats.total_child_pointers as f64 / stats.internal_nodes as f64;
        }

        stats
    }

    fn collect_tree_stats(node: &Node<K, V>, depth: usize, stats: &mut TreeStats) {
        if depth > stats.max_depth {
            stats.max_depth = depth;
        }

        match node {
            Node::Internal(internal) => {
                stats.internal_nodes += 1;
                stats.total_child_pointers += internal.child_count();

                for &child in internal.children() {
                    Self::collect_tree_stats(unsafe { &*child }, depth + 1, stats);
                }
            }
            Node::Leaf(leaf) => {
                stats.leaf_nodes += 1;
                stats.entries += leaf.len();
            }
        }
    }
}

impl<K, V> HamtMap<K, V> {
    /// Destroys the subtree rooted at `node`.
    ///
    /// Leaf payloads are released here; child arrays are left to the pool, which owns
    /// them, and node memory is left to the arena.
    ///
    /// # Safety
    ///
    /// `node` must point to a live node that is not reachable again after this call.
    unsafe fn drop_subtree(node: NodePtr<K, V>) {
        unsafe {
            if let Node::Internal(internal) = &*node {
                for &child in internal.children() {
                    Self::drop_subtree(child);
                }
            }

            ptr::drop_in_place(node);
        }
    }
}

impl<K, V> Drop for HamtMap<K, V> {
    fn drop(&mut self) {
        // The tree must be walked before the allocators release their backing memory;
        // `arena` and `pool` drop after this body in declaration order.
        unsafe { Self::drop_subtree(self.root) };
    }
}

impl<K, V> Default for HamtMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new `HamtMap` with the default allocator sizing.
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Index<&K> for HamtMap<K, V>
where
    K: Eq + Hash,
{
    type Output = V;

    /// Returns a reference to the value stored for `key`.
    ///
    /// # Panics
    ///
    /// If the key is not present in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use hamt_map::HamtMap;
    ///
    /// let mut map = HamtMap::new();
    ///
    /// map.insert(1, "a");
    ///
    /// assert_eq!(map[&1], "a");
    /// ```
    fn index(&self, key: &K) -> &Self::Output {
        match self.lookup(key) {
            Some(value) => value,
            None => panic!("key not found"),
        }
    }
}

impl<'a, K, V> IntoIterator for &'a HamtMap<K, V>
where
    K: Eq + Hash,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    /// Returns an iterator over the key-value pairs in the `HamtMap`.
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Debug for HamtMap<K, V>
where
    K: Eq + Hash + Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Display for HamtMap<K, V>
where
    K: Display + Eq + Hash,
    V: Display,
{
    /// Formats the map as `{k1: v1, k2: v2}` in traversal order, `{}` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (index, (key, value)) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// An iterator over the key-value pairs of a [`HamtMap`], in traversal order.
pub struct Iter<'a, K, V> {
    /// Internal nodes on the path, each with a cursor into its dense child array.
    stack: Vec<(&'a InternalNode<K, V>, usize)>,
    /// The leaf currently being drained, with a cursor into its bucket.
    leaf: Option<(&'a LeafNode<K, V>, usize)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((leaf, index)) = self.leaf {
                if index < leaf.len() {
                    self.leaf = Some((leaf, index + 1));
                    let entry = &leaf.entries()[index];
                    return Some((&entry.key, &entry.value));
                }
                self.leaf = None;
            }

            let (internal, cursor) = self.stack.last_mut()?;

            if *cursor < internal.child_count() {
                let child = internal.children()[*cursor];
                *cursor += 1;

                let child: &'a Node<K, V> = unsafe { &*child };
                match child {
                    Node::Internal(next) => self.stack.push((next, 0)),
                    Node::Leaf(leaf) => self.leaf = Some((leaf, 0)),
                }
            } else {
                self.stack.pop();
            }
        }
    }
}

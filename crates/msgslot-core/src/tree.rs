//! Height-balanced channel tree
//!
//! Each endpoint owns one `ChannelTree` mapping a [`ChannelId`] to the last
//! message written on that channel. The tree is an AVL tree whose nodes live
//! in an [`Arena`] and link to each other by [`NodeId`]; rotations only
//! rewrite indices.
//!
//! ```text
//!        k2                k1
//!       /  \              /  \
//!      k1   C    ==>     A    k2        rotate_with_left(k2)
//!     /  \                   /  \
//!    A    B                 B    C
//! ```
//!
//! Heights are cached per node, with an empty subtree at -1. Insertion
//! rebalances at most once on the way back up; deletion re-checks every
//! ancestor.
//!
//! Overwriting a channel never goes through delete + insert: the new
//! payload is staged first and then swapped into the existing entry, so a
//! failed allocation leaves the old message in place.

use core::cmp::Ordering;
use core::fmt;
use core::mem;
use std::fmt::Write as _;

use crate::arena::Arena;
use crate::constants::{BUF_LEN, UNLIMITED_ENTRIES};
use crate::error::{SlotError, SlotResult};
use crate::id::{ChannelId, NodeId};

/// One stored message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEntry {
    channel_id: ChannelId,
    payload: Vec<u8>,
}

impl ChannelEntry {
    #[inline]
    pub fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Message bytes, exactly as written
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of valid bytes in the payload
    #[inline]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// A stored entry is never empty; a zero-length one is degenerate
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

struct Node {
    entry: ChannelEntry,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: i32,
}

impl Node {
    fn leaf(entry: ChannelEntry) -> Self {
        Node {
            entry,
            left: None,
            right: None,
            height: 0,
        }
    }
}

/// What `insert_or_replace` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new entry was added
    Inserted,
    /// An existing entry's payload was swapped
    Replaced { previous_len: usize },
}

/// First structural problem found by [`ChannelTree::check_invariants`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Key out of order relative to an ancestor
    Order { channel: ChannelId },
    /// Subtree heights differ by more than one
    Balance { channel: ChannelId, left: i32, right: i32 },
    /// Cached height does not match the subtrees
    Height { channel: ChannelId, cached: i32, actual: i32 },
    /// Payload is empty or longer than `BUF_LEN`
    PayloadLength { channel: ChannelId, len: usize },
    /// Reachable nodes do not match the arena's live count
    Count { reachable: usize, live: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::Order { channel } => {
                write!(f, "channel {} out of order", channel)
            }
            InvariantViolation::Balance { channel, left, right } => {
                write!(f, "channel {} unbalanced: left {} right {}", channel, left, right)
            }
            InvariantViolation::Height { channel, cached, actual } => {
                write!(f, "channel {} height {} should be {}", channel, cached, actual)
            }
            InvariantViolation::PayloadLength { channel, len } => {
                write!(f, "channel {} has {}-byte payload", channel, len)
            }
            InvariantViolation::Count { reachable, live } => {
                write!(f, "{} reachable nodes but {} live", reachable, live)
            }
        }
    }
}

/// AVL tree of channel messages for one endpoint
pub struct ChannelTree {
    arena: Arena<Node>,
    root: Option<NodeId>,
}

impl ChannelTree {
    /// Create an empty tree with no entry limit
    pub fn new() -> Self {
        Self::with_limit(UNLIMITED_ENTRIES)
    }

    /// Create an empty tree holding at most `max_entries` channels
    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            arena: Arena::with_limit(max_entries),
            root: None,
        }
    }

    /// Look up the message stored for `key`
    pub fn find(&self, key: ChannelId) -> Option<&ChannelEntry> {
        self.find_id(key).map(|id| &self.arena[id].entry)
    }

    #[inline]
    pub fn contains(&self, key: ChannelId) -> bool {
        self.find_id(key).is_some()
    }

    /// Entry with the smallest channel id
    pub fn find_min(&self) -> Option<&ChannelEntry> {
        self.root.map(|id| &self.arena[self.min_id(id)].entry)
    }

    /// Entry with the largest channel id
    pub fn find_max(&self) -> Option<&ChannelEntry> {
        let mut id = self.root?;
        while let Some(right) = self.arena[id].right {
            id = right;
        }
        Some(&self.arena[id].entry)
    }

    /// Store `bytes` as the message for `key`
    ///
    /// `bytes` must be 1..=`BUF_LEN` long. The payload is copied into a
    /// freshly reserved buffer before the tree is touched; if that or the
    /// node allocation fails, the tree is unchanged.
    pub fn insert_or_replace(&mut self, key: ChannelId, bytes: &[u8]) -> SlotResult<InsertOutcome> {
        if bytes.is_empty() || bytes.len() > BUF_LEN {
            return Err(SlotError::InvalidArgument);
        }

        let mut payload = Vec::new();
        payload.try_reserve_exact(bytes.len())?;
        payload.extend_from_slice(bytes);

        if let Some(id) = self.find_id(key) {
            let old = mem::replace(&mut self.arena[id].entry.payload, payload);
            return Ok(InsertOutcome::Replaced { previous_len: old.len() });
        }

        let node = Node::leaf(ChannelEntry { channel_id: key, payload });
        let new_id = self.arena.allocate(node)?;
        let root = self.root;
        self.root = Some(self.insert_at(root, new_id));
        self.verify();
        Ok(InsertOutcome::Inserted)
    }

    /// Remove the entry for `key`, returning it if present
    pub fn delete(&mut self, key: ChannelId) -> Option<ChannelEntry> {
        let mut removed = None;
        let root = self.root;
        self.root = self.delete_at(root, key, &mut removed);
        self.verify();
        removed
    }

    /// Release every entry, returning how many were dropped
    pub fn dispose(&mut self) -> usize {
        let root = self.root;
        let released = self.dispose_subtree(root);
        self.root = None;
        self.arena.clear();
        released
    }

    /// Number of stored channels
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the whole tree (-1 when empty)
    #[inline]
    pub fn height(&self) -> i32 {
        self.height_of(self.root)
    }

    /// Maximum number of channels this tree accepts
    #[inline]
    pub fn limit(&self) -> usize {
        self.arena.limit()
    }

    /// In-order iterator over entries
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            tree: self,
            stack: Vec::new(),
        };
        iter.push_left(self.root);
        iter
    }

    /// Channel ids in ascending order
    pub fn channel_ids(&self) -> Vec<ChannelId> {
        self.iter().map(ChannelEntry::channel_id).collect()
    }

    /// Pre-order structural dump, one node per line
    ///
    /// ```text
    /// 42 [5] (L:17) (R:99)
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_subtree(self.root, &mut out);
        out
    }

    /// Check order, balance, cached heights and payload lengths
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut reachable = 0;
        self.check_subtree(self.root, None, None, &mut reachable)?;
        if reachable != self.arena.len() {
            return Err(InvariantViolation::Count {
                reachable,
                live: self.arena.len(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn find_id(&self, key: ChannelId) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.arena[id];
            cur = match key.cmp(&node.entry.channel_id) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    fn min_id(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.arena[id].left {
            id = left;
        }
        id
    }

    #[inline]
    fn key(&self, id: NodeId) -> ChannelId {
        self.arena[id].entry.channel_id
    }

    #[inline]
    fn height_of(&self, id: Option<NodeId>) -> i32 {
        match id {
            Some(id) => self.arena[id].height,
            None => -1,
        }
    }

    fn update_height(&mut self, id: NodeId) {
        let node = &self.arena[id];
        let h = self.height_of(node.left).max(self.height_of(node.right)) + 1;
        self.arena[id].height = h;
    }

    /// Left height minus right height
    fn balance(&self, id: NodeId) -> i32 {
        let node = &self.arena[id];
        self.height_of(node.left) - self.height_of(node.right)
    }

    /// Rotate `k2` with its left child; returns the new subtree root
    fn rotate_with_left(&mut self, k2: NodeId) -> NodeId {
        let Some(k1) = self.arena[k2].left else {
            return k2;
        };
        self.arena[k2].left = self.arena[k1].right;
        self.arena[k1].right = Some(k2);
        self.update_height(k2);
        self.update_height(k1);
        k1
    }

    /// Rotate `k1` with its right child; returns the new subtree root
    fn rotate_with_right(&mut self, k1: NodeId) -> NodeId {
        let Some(k2) = self.arena[k1].right else {
            return k1;
        };
        self.arena[k1].right = self.arena[k2].left;
        self.arena[k2].left = Some(k1);
        self.update_height(k1);
        self.update_height(k2);
        k2
    }

    /// Left-right case
    fn double_rotate_with_left(&mut self, k3: NodeId) -> NodeId {
        if let Some(left) = self.arena[k3].left {
            let new_left = self.rotate_with_right(left);
            self.arena[k3].left = Some(new_left);
        }
        self.rotate_with_left(k3)
    }

    /// Right-left case
    fn double_rotate_with_right(&mut self, k1: NodeId) -> NodeId {
        if let Some(right) = self.arena[k1].right {
            let new_right = self.rotate_with_left(right);
            self.arena[k1].right = Some(new_right);
        }
        self.rotate_with_right(k1)
    }

    /// Link an already allocated leaf under `t`; `new`'s key is absent
    fn insert_at(&mut self, t: Option<NodeId>, new: NodeId) -> NodeId {
        let Some(mut t) = t else {
            return new;
        };
        let key = self.key(new);

        match key.cmp(&self.key(t)) {
            Ordering::Less => {
                let left = self.arena[t].left;
                let left = self.insert_at(left, new);
                self.arena[t].left = Some(left);
                if self.balance(t) == 2 {
                    t = if key < self.key(left) {
                        self.rotate_with_left(t)
                    } else {
                        self.double_rotate_with_left(t)
                    };
                }
            }
            Ordering::Greater => {
                let right = self.arena[t].right;
                let right = self.insert_at(right, new);
                self.arena[t].right = Some(right);
                if self.balance(t) == -2 {
                    t = if key > self.key(right) {
                        self.rotate_with_right(t)
                    } else {
                        self.double_rotate_with_right(t)
                    };
                }
            }
            // Callers replace in place instead
            Ordering::Equal => {}
        }

        self.update_height(t);
        t
    }

    fn delete_at(
        &mut self,
        t: Option<NodeId>,
        key: ChannelId,
        removed: &mut Option<ChannelEntry>,
    ) -> Option<NodeId> {
        let t = t?;

        match key.cmp(&self.key(t)) {
            Ordering::Less => {
                let left = self.arena[t].left;
                let left = self.delete_at(left, key, removed);
                self.arena[t].left = left;
            }
            Ordering::Greater => {
                let right = self.arena[t].right;
                let right = self.delete_at(right, key, removed);
                self.arena[t].right = right;
            }
            Ordering::Equal => match (self.arena[t].left, self.arena[t].right) {
                (Some(_), Some(right)) => {
                    // Move the in-order successor's entry up. The doomed entry
                    // lands in the successor's slot, which is still the
                    // leftmost position of the right subtree, so order holds.
                    let successor = self.min_id(right);
                    if let Some((a, b)) = self.arena.pair_mut(t, successor) {
                        mem::swap(&mut a.entry, &mut b.entry);
                    }
                    let right = self.delete_at(Some(right), key, removed);
                    self.arena[t].right = right;
                }
                (child, None) | (None, child) => {
                    *removed = self.arena.release(t).map(|node| node.entry);
                    return child;
                }
            },
        }

        Some(self.rebalance(t))
    }

    /// Restore balance at `t` after a deletion below it
    fn rebalance(&mut self, t: NodeId) -> NodeId {
        self.update_height(t);
        let balance = self.balance(t);

        if balance > 1 {
            if let Some(left) = self.arena[t].left {
                let l = &self.arena[left];
                if self.height_of(l.left) < self.height_of(l.right) {
                    return self.double_rotate_with_left(t);
                }
            }
            return self.rotate_with_left(t);
        }

        if balance < -1 {
            if let Some(right) = self.arena[t].right {
                let r = &self.arena[right];
                if self.height_of(r.right) < self.height_of(r.left) {
                    return self.double_rotate_with_right(t);
                }
            }
            return self.rotate_with_right(t);
        }

        t
    }

    fn dispose_subtree(&mut self, t: Option<NodeId>) -> usize {
        let Some(t) = t else {
            return 0;
        };
        let (left, right) = (self.arena[t].left, self.arena[t].right);
        let released = self.dispose_subtree(left) + self.dispose_subtree(right);
        self.arena.release(t);
        released + 1
    }

    fn dump_subtree(&self, t: Option<NodeId>, out: &mut String) {
        let Some(t) = t else {
            return;
        };
        let node = &self.arena[t];
        let _ = write!(out, "{} [{}]", node.entry.channel_id, node.entry.len());
        if let Some(left) = node.left {
            let _ = write!(out, " (L:{})", self.key(left));
        }
        if let Some(right) = node.right {
            let _ = write!(out, " (R:{})", self.key(right));
        }
        out.push('\n');
        self.dump_subtree(node.left, out);
        self.dump_subtree(node.right, out);
    }

    fn check_subtree(
        &self,
        t: Option<NodeId>,
        lo: Option<ChannelId>,
        hi: Option<ChannelId>,
        reachable: &mut usize,
    ) -> Result<i32, InvariantViolation> {
        let Some(t) = t else {
            return Ok(-1);
        };
        let node = &self.arena[t];
        let channel = node.entry.channel_id;

        if lo.is_some_and(|lo| channel <= lo) || hi.is_some_and(|hi| channel >= hi) {
            return Err(InvariantViolation::Order { channel });
        }
        let len = node.entry.len();
        if len == 0 || len > BUF_LEN {
            return Err(InvariantViolation::PayloadLength { channel, len });
        }

        let left = self.check_subtree(node.left, lo, Some(channel), reachable)?;
        let right = self.check_subtree(node.right, Some(channel), hi, reachable)?;
        if (left - right).abs() > 1 {
            return Err(InvariantViolation::Balance { channel, left, right });
        }
        let actual = left.max(right) + 1;
        if node.height != actual {
            return Err(InvariantViolation::Height {
                channel,
                cached: node.height,
                actual,
            });
        }

        *reachable += 1;
        Ok(actual)
    }

    #[inline]
    fn verify(&self) {
        #[cfg(feature = "debug-assertions")]
        if let Err(violation) = self.check_invariants() {
            panic!("channel tree corrupted: {}", violation);
        }
    }
}

impl Default for ChannelTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChannelTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelTree")
            .field("len", &self.len())
            .field("height", &self.height())
            .finish()
    }
}

impl<'a> IntoIterator for &'a ChannelTree {
    type Item = &'a ChannelEntry;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// In-order iterator over a [`ChannelTree`]
pub struct Iter<'a> {
    tree: &'a ChannelTree,
    stack: Vec<NodeId>,
}

impl<'a> Iter<'a> {
    fn push_left(&mut self, mut cur: Option<NodeId>) {
        while let Some(id) = cur {
            self.stack.push(id);
            cur = self.tree.arena[id].left;
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ChannelEntry;

    fn next(&mut self) -> Option<&'a ChannelEntry> {
        let id = self.stack.pop()?;
        let tree = self.tree;
        self.push_left(tree.arena[id].right);
        Some(&tree.arena[id].entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ch(raw: u32) -> ChannelId {
        ChannelId::new(raw).unwrap()
    }

    /// Deterministic pseudo-random sequence
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (self.0 >> 33) as u32
        }
    }

    fn assert_sorted(tree: &ChannelTree) {
        let ids = tree.channel_ids();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "not strictly increasing: {:?}", ids);
    }

    #[test]
    fn test_find_empty() {
        let tree = ChannelTree::new();
        assert!(tree.find(ch(1)).is_none());
        assert!(tree.find_min().is_none());
        assert!(tree.find_max().is_none());
        assert_eq!(tree.height(), -1);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_and_find() {
        let mut tree = ChannelTree::new();
        assert_eq!(tree.insert_or_replace(ch(42), b"hello"), Ok(InsertOutcome::Inserted));
        assert_eq!(tree.insert_or_replace(ch(7), b"seven"), Ok(InsertOutcome::Inserted));

        let entry = tree.find(ch(42)).unwrap();
        assert_eq!(entry.channel_id(), ch(42));
        assert_eq!(entry.payload(), b"hello");
        assert_eq!(entry.len(), 5);
        assert!(tree.find(ch(8)).is_none());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_replace_swaps_payload() {
        let mut tree = ChannelTree::new();
        tree.insert_or_replace(ch(3), b"first message").unwrap();
        let outcome = tree.insert_or_replace(ch(3), b"B").unwrap();

        assert_eq!(outcome, InsertOutcome::Replaced { previous_len: 13 });
        assert_eq!(tree.find(ch(3)).unwrap().payload(), b"B");
        assert_eq!(tree.len(), 1);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_rejects_bad_lengths() {
        let mut tree = ChannelTree::new();
        assert_eq!(tree.insert_or_replace(ch(1), b""), Err(SlotError::InvalidArgument));
        assert_eq!(
            tree.insert_or_replace(ch(1), &[0u8; BUF_LEN + 1]),
            Err(SlotError::InvalidArgument)
        );
        assert!(tree.insert_or_replace(ch(1), &[0u8; BUF_LEN]).is_ok());
    }

    #[test]
    fn test_single_rotation() {
        let mut tree = ChannelTree::new();
        for id in [1, 2, 3] {
            tree.insert_or_replace(ch(id), b"x").unwrap();
        }
        assert_eq!(tree.dump(), "2 [1] (L:1) (R:3)\n1 [1]\n3 [1]\n");
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_double_rotation() {
        let mut tree = ChannelTree::new();
        for id in [30, 10, 20] {
            tree.insert_or_replace(ch(id), b"x").unwrap();
        }
        assert_eq!(tree.dump(), "20 [1] (L:10) (R:30)\n10 [1]\n30 [1]\n");

        let mut tree = ChannelTree::new();
        for id in [10, 30, 20] {
            tree.insert_or_replace(ch(id), b"x").unwrap();
        }
        assert_eq!(tree.find_min().unwrap().channel_id(), ch(10));
        assert_eq!(tree.dump(), "20 [1] (L:10) (R:30)\n10 [1]\n30 [1]\n");
    }

    #[test]
    fn test_sequential_inserts_stay_balanced() {
        let mut tree = ChannelTree::new();
        for id in 1..=1023 {
            tree.insert_or_replace(ch(id), b"m").unwrap();
        }
        tree.check_invariants().unwrap();
        // A perfect tree of 1023 nodes has height 9
        assert_eq!(tree.height(), 9);
        assert_eq!(tree.find_min().unwrap().channel_id(), ch(1));
        assert_eq!(tree.find_max().unwrap().channel_id(), ch(1023));
    }

    #[test]
    fn test_delete_leaf_and_missing() {
        let mut tree = ChannelTree::new();
        tree.insert_or_replace(ch(5), b"five").unwrap();
        assert!(tree.delete(ch(6)).is_none());

        let removed = tree.delete(ch(5)).unwrap();
        assert_eq!(removed.payload(), b"five");
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn test_delete_two_children_keeps_payloads() {
        let mut tree = ChannelTree::new();
        for id in [50, 30, 70, 20, 40, 60, 80] {
            tree.insert_or_replace(ch(id), format!("msg{}", id).as_bytes()).unwrap();
        }

        let removed = tree.delete(ch(50)).unwrap();
        assert_eq!(removed.channel_id(), ch(50));
        assert_eq!(removed.payload(), b"msg50");

        for id in [20, 30, 40, 60, 70, 80] {
            assert_eq!(tree.find(ch(id)).unwrap().payload(), format!("msg{}", id).as_bytes());
        }
        assert!(tree.find(ch(50)).is_none());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_delete_triggers_rotation() {
        let mut tree = ChannelTree::new();
        for id in [20, 10, 30, 40] {
            tree.insert_or_replace(ch(id), b"x").unwrap();
        }
        tree.delete(ch(10));
        assert_eq!(tree.dump(), "30 [1] (L:20) (R:40)\n20 [1]\n40 [1]\n");

        let mut tree = ChannelTree::new();
        for id in [20, 10, 30, 25] {
            tree.insert_or_replace(ch(id), b"x").unwrap();
        }
        tree.delete(ch(10));
        assert_eq!(tree.dump(), "25 [1] (L:20) (R:30)\n20 [1]\n30 [1]\n");
    }

    #[test]
    fn test_random_ops_keep_invariants() {
        let mut tree = ChannelTree::new();
        let mut shadow = std::collections::BTreeMap::new();
        let mut rng = Lcg(0x5eed);

        for step in 0..4000u32 {
            let key = ch(rng.next() % 300 + 1);
            if rng.next() % 3 == 0 {
                let removed = tree.delete(key).map(|e| e.payload().to_vec());
                assert_eq!(removed, shadow.remove(&key));
            } else {
                let len = (rng.next() as usize % BUF_LEN) + 1;
                let msg = vec![(step % 251) as u8; len];
                tree.insert_or_replace(key, &msg).unwrap();
                shadow.insert(key, msg);
            }
            if step % 97 == 0 {
                tree.check_invariants().unwrap();
                assert_sorted(&tree);
            }
        }

        tree.check_invariants().unwrap();
        assert_eq!(tree.len(), shadow.len());
        for (entry, (key, msg)) in tree.iter().zip(shadow.iter()) {
            assert_eq!(entry.channel_id(), *key);
            assert_eq!(entry.payload(), &msg[..]);
        }
    }

    #[test]
    fn test_delete_everything() {
        let mut tree = ChannelTree::new();
        let mut rng = Lcg(7);
        let mut keys: Vec<u32> = (1..=200).collect();
        for &k in &keys {
            tree.insert_or_replace(ch(k), b"v").unwrap();
        }
        // Shuffle deletion order
        for i in (1..keys.len()).rev() {
            let j = rng.next() as usize % (i + 1);
            keys.swap(i, j);
        }
        for &k in &keys {
            assert!(tree.delete(ch(k)).is_some());
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
    }

    #[test]
    fn test_limit_failure_leaves_tree_intact() {
        let mut tree = ChannelTree::with_limit(2);
        tree.insert_or_replace(ch(1), b"one").unwrap();
        tree.insert_or_replace(ch(2), b"two").unwrap();
        let before = tree.dump();

        assert_eq!(tree.insert_or_replace(ch(3), b"three"), Err(SlotError::AllocationFailure));
        assert_eq!(tree.dump(), before);
        assert_eq!(tree.len(), 2);

        // Overwrites need no new node
        assert!(tree.insert_or_replace(ch(2), b"TWO").is_ok());
        assert_eq!(tree.find(ch(2)).unwrap().payload(), b"TWO");
        assert_eq!(tree.find(ch(1)).unwrap().payload(), b"one");
    }

    #[test]
    fn test_slots_reused_after_delete() {
        let mut tree = ChannelTree::with_limit(1);
        tree.insert_or_replace(ch(9), b"a").unwrap();
        tree.delete(ch(9));
        tree.insert_or_replace(ch(10), b"b").unwrap();
        assert_eq!(tree.channel_ids(), vec![ch(10)]);
    }

    #[test]
    fn test_dispose() {
        let mut tree = ChannelTree::new();
        for id in 1..=64 {
            tree.insert_or_replace(ch(id), b"bye").unwrap();
        }
        assert_eq!(tree.dispose(), 64);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.dispose(), 0);

        // Usable again after teardown
        tree.insert_or_replace(ch(1), b"again").unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_violation_display() {
        let v = InvariantViolation::Balance { channel: ch(4), left: 2, right: 0 };
        assert_eq!(format!("{}", v), "channel 4 unbalanced: left 2 right 0");
    }
}

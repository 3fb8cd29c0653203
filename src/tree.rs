//! Implicit range tree: shapes, paths, keys and range decomposition.
//!
//! A [`TreeShape`] `(height H, bit_width B)` fixes an implicit tree over the
//! 64-bit index space. Every non-root level has fan-out `2^B`; the root level
//! holds whatever high-order bits remain, so its fan-out is unbounded.
//!
//! # Paths
//!
//! The path of an index is obtained by peeling off the low `B` bits `H-1`
//! times; what remains is the root segment. Paths are stored root first:
//!
//! ```text
//!   index = 0b11_0110, H = 3, B = 2
//!
//!   low 2 bits  -> 10  (leaf segment,  level 2)
//!   next 2 bits -> 01  (middle segment, level 1)
//!   remainder   -> 11  (root segment,  level 0)
//!
//!   path = [3, 1, 2]      keys = ":3", ":3:1", ":3:1:2"
//! ```
//!
//! Each path prefix names a node; its backend value is the sum of every delta
//! applied anywhere below it.
//!
//! # Range decomposition
//!
//! [`TreeShape::decompose`] splits `[from, to]` into disjoint nodes whose
//! leaves cover the range exactly. Below the level where the two paths
//! diverge, `from` contributes every right sibling along its path and `to`
//! every left sibling along its path; at the divergence level every node
//! strictly between the two is taken whole:
//!
//! ```text
//!                    (divergence level d)
//!          ┌────────┬────────┬────────┬────────┐
//!          │  f[d]  │  f+1   │  ...   │  t[d]  │
//!          └───┬────┴────────┴────────┴───┬────┘
//!     right siblings of from     left siblings of to
//!     + from's own leaf          + to's own leaf
//! ```
//!
//! At most `O(H · 2^B)` nodes are produced below the root; at the root the
//! true numeric gap between the two root segments is scanned.
//!
//! Negative indices are supported: a range crossing zero is split in two,
//! since the two's complement reinterpretation keeps each half ordered.

use std::fmt::Write as _;

use crate::error::ConfigError;

/// Widest meaningful level on a 64-bit index.
pub const MAX_BIT_WIDTH: u32 = 64;

/// Immutable tree configuration.
///
/// # Examples
///
/// ```rust
/// use sommatori::tree::TreeShape;
///
/// let shape = TreeShape::new(3, 2).unwrap();
/// assert_eq!(shape.path(0b11_0110), vec![3, 1, 2]);
/// assert_eq!(shape.fan_out(), Some(4));
///
/// assert!(TreeShape::new(0, 2).is_err());
/// assert!(TreeShape::new(3, 0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeShape {
    height: u32,
    bit_width: u32,
}

/// One node of the implicit tree, identified by its level (root is 0) and
/// the first index of its subtree, in the unsigned index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TreeNode {
    /// Depth of the node, root level first.
    pub level: u32,
    /// Smallest unsigned index in the node's subtree.
    pub first: u64,
}

impl TreeShape {
    /// Creates a shape, rejecting non-positive height or bit-width and
    /// bit-widths wider than the index.
    pub fn new(height: u32, bit_width: u32) -> Result<Self, ConfigError> {
        if height < 1 {
            return Err(ConfigError::ZeroHeight);
        }
        if bit_width < 1 {
            return Err(ConfigError::ZeroBitWidth);
        }
        if bit_width > MAX_BIT_WIDTH {
            return Err(ConfigError::BitWidthTooLarge { bit_width });
        }
        Ok(Self { height, bit_width })
    }

    /// Number of levels, root included.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bits consumed by every non-root level.
    pub const fn bit_width(&self) -> u32 {
        self.bit_width
    }

    /// Children per non-root node, `None` when `2^B` does not fit in `u64`.
    pub fn fan_out(&self) -> Option<u64> {
        1u64.checked_shl(self.bit_width)
    }

    fn segment_mask(&self) -> u64 {
        low_mask(u64::from(self.bit_width))
    }

    /// Bit offset of `level`'s segment inside an index.
    fn level_shift(&self, level: u32) -> u64 {
        u64::from(self.height - 1 - level) * u64::from(self.bit_width)
    }

    /// Largest segment value any index can have at `level`.
    fn max_segment(&self, level: u32) -> u64 {
        let shift = self.level_shift(level);
        let remaining = shr(u64::MAX, shift);
        if level == 0 {
            remaining
        } else {
            remaining & self.segment_mask()
        }
    }

    /// Root-first path of an unsigned index.
    pub fn path_of(&self, mut idx: u64) -> Vec<u64> {
        let height = self.height as usize;
        let mask = self.segment_mask();
        let mut path = vec![0; height];
        for slot in path[1..].iter_mut().rev() {
            *slot = idx & mask;
            idx = shr(idx, u64::from(self.bit_width));
        }
        path[0] = idx;
        path
    }

    /// Root-first path of `index`.
    pub fn path(&self, index: i64) -> Vec<u64> {
        self.path_of(index as u64)
    }

    /// Keys of every ancestor of `index`, root first, ending with its leaf.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sommatori::tree::TreeShape;
    ///
    /// let shape = TreeShape::new(3, 2).unwrap();
    /// assert_eq!(shape.path_keys("", 0b11_0110), vec![":3", ":3:1", ":3:1:2"]);
    /// assert_eq!(shape.path_keys("hits", 1), vec!["hits:0", "hits:0:0", "hits:0:0:1"]);
    /// ```
    pub fn path_keys(&self, namespace: &str, index: i64) -> Vec<String> {
        let mut key = String::from(namespace);
        self.path(index)
            .into_iter()
            .map(|segment| {
                push_segment(&mut key, segment);
                key.clone()
            })
            .collect()
    }

    /// Key naming `node`.
    pub fn node_key(&self, namespace: &str, node: TreeNode) -> String {
        let mut key = String::from(namespace);
        for segment in &self.path_of(node.first)[..=node.level as usize] {
            push_segment(&mut key, *segment);
        }
        key
    }

    /// Last unsigned index inside `node`'s subtree.
    pub fn node_last(&self, node: TreeNode) -> u64 {
        node.first | low_mask(self.level_shift(node.level))
    }

    /// Node at `level` whose segment there is `segment`, sharing every
    /// higher segment with `reference`.
    fn sibling(&self, reference: u64, level: u32, segment: u64) -> TreeNode {
        let shift = self.level_shift(level);
        let upper = if level == 0 {
            0
        } else {
            reference & !low_mask(shift + u64::from(self.bit_width))
        };
        TreeNode {
            level,
            first: upper | shl(segment, shift),
        }
    }

    /// Splits `[from, to]` into disjoint nodes covering it exactly.
    ///
    /// An empty range (`from > to`) yields no nodes; `from == to` yields the
    /// single leaf of `from`. The order is deterministic: for each ordered
    /// half of the range, right siblings along `from`'s path, then the nodes
    /// between the two paths, then left siblings along `to`'s path.
    pub fn decompose(&self, from: i64, to: i64) -> Vec<TreeNode> {
        let mut nodes = Vec::new();
        if from > to {
            return nodes;
        }
        if from < 0 && to >= 0 {
            self.decompose_unsigned(from as u64, u64::MAX, &mut nodes);
            self.decompose_unsigned(0, to as u64, &mut nodes);
        } else {
            self.decompose_unsigned(from as u64, to as u64, &mut nodes);
        }
        nodes
    }

    fn decompose_unsigned(&self, lo: u64, hi: u64, nodes: &mut Vec<TreeNode>) {
        let leaf = self.height - 1;
        if lo == hi {
            nodes.push(TreeNode { level: leaf, first: lo });
            return;
        }

        let from_path = self.path_of(lo);
        let to_path = self.path_of(hi);
        let split = from_path
            .iter()
            .zip(&to_path)
            .position(|(f, t)| f != t)
            .unwrap_or(0) as u32;

        for level in split + 1..self.height {
            let own = from_path[level as usize];
            for segment in (own..=self.max_segment(level)).skip(1) {
                nodes.push(self.sibling(lo, level, segment));
            }
        }
        nodes.push(TreeNode { level: leaf, first: lo });

        let (f, t) = (from_path[split as usize], to_path[split as usize]);
        for segment in (f..t).skip(1) {
            nodes.push(self.sibling(lo, split, segment));
        }

        for level in split + 1..self.height {
            for segment in 0..to_path[level as usize] {
                nodes.push(self.sibling(hi, level, segment));
            }
        }
        nodes.push(TreeNode { level: leaf, first: hi });
    }

    /// Keys the decomposition of `[from, to]` reads.
    pub fn range_keys(&self, namespace: &str, from: i64, to: i64) -> Vec<String> {
        self.decompose(from, to)
            .into_iter()
            .map(|node| self.node_key(namespace, node))
            .collect()
    }
}

impl Default for TreeShape {
    /// Height 8, bit-width 2: fan-out 4, eight keys per increment.
    fn default() -> Self {
        Self {
            height: 8,
            bit_width: 2,
        }
    }
}

fn push_segment(key: &mut String, segment: u64) {
    // Writing into a String cannot fail.
    let _ = write!(key, ":{segment}");
}

fn low_mask(bits: u64) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn shr(value: u64, bits: u64) -> u64 {
    if bits >= 64 {
        0
    } else {
        value >> bits
    }
}

fn shl(value: u64, bits: u64) -> u64 {
    if bits >= 64 {
        0
    } else {
        value << bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(height: u32, bit_width: u32) -> TreeShape {
        TreeShape::new(height, bit_width).unwrap()
    }

    /// Leaf spans of a decomposition, as signed ranges sorted by start.
    fn spans(shape: &TreeShape, from: i64, to: i64) -> Vec<(i64, i64)> {
        let mut spans: Vec<(i64, i64)> = shape
            .decompose(from, to)
            .into_iter()
            .map(|n| (n.first as i64, shape.node_last(n) as i64))
            .collect();
        spans.sort();
        spans
    }

    fn assert_exact_cover(shape: &TreeShape, from: i64, to: i64) {
        let spans = spans(shape, from, to);
        assert!(!spans.is_empty(), "{shape:?} [{from},{to}] produced no nodes");
        assert_eq!(spans[0].0, from, "{shape:?} [{from},{to}] starts late");
        for pair in spans.windows(2) {
            assert_eq!(pair[0].1 + 1, pair[1].0, "{shape:?} [{from},{to}] gap or overlap");
        }
        assert_eq!(spans[spans.len() - 1].1, to, "{shape:?} [{from},{to}] ends wrong");
    }

    #[test]
    fn test_new_validates() {
        assert_eq!(TreeShape::new(0, 1), Err(ConfigError::ZeroHeight));
        assert_eq!(TreeShape::new(1, 0), Err(ConfigError::ZeroBitWidth));
        assert_eq!(
            TreeShape::new(2, 65),
            Err(ConfigError::BitWidthTooLarge { bit_width: 65 })
        );
        assert!(TreeShape::new(1, 1).is_ok());
        assert!(TreeShape::new(2, 64).is_ok());
    }

    #[test]
    fn test_default() {
        let shape = TreeShape::default();
        assert_eq!(shape.height(), 8);
        assert_eq!(shape.bit_width(), 2);
    }

    #[test]
    fn test_fan_out() {
        assert_eq!(shape(2, 1).fan_out(), Some(2));
        assert_eq!(shape(2, 8).fan_out(), Some(256));
        assert_eq!(shape(2, 64).fan_out(), None);
    }

    #[test]
    fn test_path() {
        let s = shape(3, 2);
        assert_eq!(s.path(0), vec![0, 0, 0]);
        assert_eq!(s.path(5), vec![0, 1, 1]);
        assert_eq!(s.path(0b11_0110), vec![3, 1, 2]);
        // root carries all remaining bits
        assert_eq!(s.path(0b1_0111_0110), vec![23, 1, 2]);
    }

    #[test]
    fn test_path_height_one() {
        let s = shape(1, 3);
        assert_eq!(s.path(12345), vec![12345]);
        assert_eq!(s.path_keys("", 12345), vec![":12345"]);
    }

    #[test]
    fn test_path_wide_levels() {
        // levels above bit 64 are always zero
        let s = shape(4, 30);
        assert_eq!(s.path(-1), vec![0, 0b1111, (1 << 30) - 1, (1 << 30) - 1]);
        let s = shape(2, 64);
        assert_eq!(s.path(7), vec![0, 7]);
    }

    #[test]
    fn test_path_keys() {
        let s = shape(3, 2);
        assert_eq!(s.path_keys("", 0b11_0110), vec![":3", ":3:1", ":3:1:2"]);
        assert_eq!(s.path_keys("ns", 0), vec!["ns:0", "ns:0:0", "ns:0:0:0"]);
    }

    #[test]
    fn test_node_key_and_last() {
        let s = shape(3, 2);
        let node = TreeNode { level: 1, first: 0b11_0100 };
        assert_eq!(s.node_key("", node), ":3:1");
        assert_eq!(s.node_last(node), 0b11_0111);
        let root = TreeNode { level: 0, first: 0b10_0000 };
        assert_eq!(s.node_key("", root), ":2");
        assert_eq!(s.node_last(root), 0b10_1111);
    }

    #[test]
    fn test_empty_range() {
        assert!(shape(3, 2).decompose(5, 4).is_empty());
        assert!(shape(3, 2).range_keys("", 0, -1).is_empty());
    }

    #[test]
    fn test_single_point_is_one_leaf() {
        let s = shape(4, 2);
        assert_eq!(
            s.decompose(37, 37),
            vec![TreeNode { level: 3, first: 37 }]
        );
        assert_eq!(s.range_keys("", 37, 37), vec![s.path_keys("", 37)[3].clone()]);
    }

    #[test]
    fn test_adjacent_leaves() {
        let s = shape(3, 2);
        assert_eq!(s.range_keys("", 4, 5), vec![":0:1:0", ":0:1:1"]);
    }

    #[test]
    fn test_known_decomposition() {
        // [1, 14] in a 3-level binary-ish tree of fan-out 4:
        // right siblings of 1 under :0:0, the nodes :0:1 and :0:2 whole,
        // then left siblings of 14 under :0:3.
        let s = shape(3, 2);
        assert_eq!(
            s.range_keys("", 1, 14),
            vec![
                ":0:0:2", ":0:0:3", ":0:0:1",
                ":0:1", ":0:2",
                ":0:3:0", ":0:3:1", ":0:3:2",
            ]
        );
    }

    #[test]
    fn test_root_gap_is_unbounded() {
        // two levels of 1 bit: the root segment is index >> 1
        let s = shape(2, 1);
        let keys = s.range_keys("", 0, 21);
        // from = 0 -> [0, 0], to = 21 -> [10, 1]; roots 1..=9 are whole
        assert_eq!(keys.len(), 1 + 1 + 9 + 1 + 1);
        assert!(keys.contains(&":9".to_string()));
        assert_exact_cover(&s, 0, 21);
    }

    #[test]
    fn test_exact_cover_small_shapes() {
        for (h, b) in [(1, 1), (1, 4), (2, 1), (2, 3), (3, 2), (4, 1), (5, 3)] {
            let s = shape(h, b);
            for from in -20..40 {
                for to in from..from + 45 {
                    assert_exact_cover(&s, from, to);
                }
            }
        }
    }

    #[test]
    fn test_exact_cover_across_zero() {
        let s = shape(4, 2);
        assert_exact_cover(&s, -1, 0);
        assert_exact_cover(&s, -100, 100);
        assert_exact_cover(&s, i64::MIN, i64::MIN + 10);
        assert_exact_cover(&s, i64::MAX - 10, i64::MAX);
    }

    #[test]
    fn test_exact_cover_wide_levels() {
        // bit-widths that overshoot 64 bits across the height
        for (h, b) in [(3, 40), (2, 64), (5, 20), (70, 1)] {
            let s = shape(h, b);
            assert_exact_cover(&s, 0, 100);
            assert_exact_cover(&s, 1 << 40, (1 << 40) + 3);
            assert_exact_cover(&s, -3, 2);
        }
    }

    #[test]
    fn test_deterministic() {
        let s = shape(5, 2);
        assert_eq!(s.range_keys("x", 17, 900), s.range_keys("x", 17, 900));
    }

    #[test]
    fn test_bounded_below_root() {
        // with a single root segment everything is bounded by H * 2^B
        let s = shape(6, 2);
        for (from, to) in [(0, 4095), (1, 4094), (123, 3000)] {
            let n = s.decompose(from, to).len();
            assert!(n <= 2 * 6 * 4, "{n} nodes for [{from},{to}]");
        }
    }
}

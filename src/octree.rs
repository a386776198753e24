//! Octree color quantization.
//!
//! Colors are inserted into a trie with one level per bit of color resolution.
//! At depth `d`, bit `W - 1 - d` of every channel is packed into a digit that selects
//! one of `2^N` children (`8` for RGB, `16` for RGBA), with the first channel in the most
//! significant position. Each leaf accumulates the sum and count of the colors that
//! reached it, so its average color becomes a palette entry.
//!
//! The number of leaves is bounded while colors are being inserted: once it rises above
//! [`REDUCE_CEILING`], the deepest internal nodes are collapsed (oldest first) until it is
//! back within bounds. Building the palette reduces the tree further, down to the requested
//! [`PaletteSize`], and then numbers the leaves in pre-order.
//!
//! A lookup walks the trie again with the same digits. If the walk falls off the tree before
//! reaching a leaf, it continues through the first existing child, so every color maps to
//! some palette entry, whether or not it was inserted.
//!
//! # Examples
//! ```
//! # use octette::{octree::ColorTree, PaletteSize};
//! # use palette::Srgb;
//! # fn main() -> Result<(), octette::QuantizeError> {
//! let mut tree = ColorTree::<Srgb<u8>, u8, 3>::new(8, PaletteSize::from(16))?;
//! tree.insert(Srgb::new(0, 0, 0));
//! tree.insert(Srgb::new(255, 255, 255));
//!
//! let tree = tree.build_palette()?;
//! assert_eq!(tree.palette(), &[Srgb::new(0, 0, 0), Srgb::new(255, 255, 255)]);
//! assert_eq!(tree.palette_index(Srgb::new(250, 250, 250)), 1);
//! # Ok(())
//! # }
//! ```

use crate::{
    error::{invalid_parameter, invariant},
    Channel, ColorComponents, ColorSlice, PaletteSize, QuantizeError, QuantizeOutput,
};
use log::{debug, trace};
use num_traits::{AsPrimitive, Zero};
use palette::cast;
use std::{collections::VecDeque, marker::PhantomData};

/// The maximum number of leaves a [`ColorTree`] holds while colors are being inserted.
///
/// This is independent of the requested [`PaletteSize`].
pub const REDUCE_CEILING: u32 = 256;

/// Node index of the root.
const ROOT: u32 = 0;

/// Link value for an empty child slot. The root is never a child, so `0` is free to use.
const EMPTY: u32 = 0;

/// A builder struct to specify the parameters for a [`ColorTree`].
///
/// # Examples
/// ```
/// # use octette::{octree::OctreeOptions, PaletteSize};
/// let options = OctreeOptions::new()
///     .max_depth(5)
///     .palette_size(PaletteSize::from(32));
///
/// // Or pair the palette size with the depth: 2^depth, capped at 256.
/// let options = OctreeOptions::with_depth(6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctreeOptions {
    /// The number of trie levels, i.e., bits of each channel that are considered.
    pub(crate) max_depth: u8,
    /// The maximum number of colors in the palette.
    pub(crate) palette_size: PaletteSize,
}

impl Default for OctreeOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OctreeOptions {
    /// The default tree depth.
    pub const DEFAULT_MAX_DEPTH: u8 = 8;

    /// Creates a new [`OctreeOptions`] with a depth of [`OctreeOptions::DEFAULT_MAX_DEPTH`]
    /// and a palette size of [`PaletteSize::MAX`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            palette_size: PaletteSize::MAX,
        }
    }

    /// Creates a new [`OctreeOptions`] with the given depth and
    /// a palette size of [`PaletteSize::for_depth`].
    #[must_use]
    pub const fn with_depth(max_depth: u8) -> Self {
        Self {
            max_depth,
            palette_size: PaletteSize::for_depth(max_depth),
        }
    }

    /// Sets the depth of the tree.
    ///
    /// The depth must be in the range `1..=W`, where `W` is the bit width of a color channel.
    /// Smaller depths merge more colors into each leaf.
    ///
    /// The default depth is [`OctreeOptions::DEFAULT_MAX_DEPTH`].
    #[must_use]
    pub const fn max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the maximum number of colors in the palette. It must be nonzero.
    ///
    /// The default palette size is [`PaletteSize::MAX`].
    #[must_use]
    pub const fn palette_size(mut self, palette_size: PaletteSize) -> Self {
        self.palette_size = palette_size;
        self
    }
}

/// A single trie node.
#[derive(Debug, Clone, Copy)]
struct Node<Sum, const N: usize> {
    /// The channel-wise sum of the colors absorbed by this node.
    totals: [Sum; N],
    /// The number of colors absorbed by this node.
    pixel_count: u32,
    /// Whether this node absorbs colors instead of passing them to its children.
    is_leaf: bool,
    /// Only meaningful once the palette has been built.
    palette_index: u8,
}

impl<Sum: Zero + Copy, const N: usize> Node<Sum, N> {
    /// An empty internal node.
    fn new() -> Self {
        Self {
            totals: [Sum::zero(); N],
            pixel_count: 0,
            is_leaf: false,
            palette_index: 0,
        }
    }
}

/// A color tree that accumulates colors and reduces them to a palette.
///
/// `N` is the number of channels in `Color` and must be `3` (RGB) or `4` (RGBA).
/// `Component` is the channel type, which also fixes the maximum depth of the tree
/// (`8` for `u8`, `16` for `u16`).
///
/// The tree is consumed by [`ColorTree::build_palette`], which returns an [`IndexedTree`]
/// that answers palette lookups.
#[derive(Debug, Clone)]
pub struct ColorTree<Color, Component, const N: usize>
where
    Color: ColorComponents<Component, N>,
    Component: Channel,
{
    /// The color type must remain the same for each [`ColorTree`].
    _phantom: PhantomData<Color>,
    /// The node pool. The root is always at index [`ROOT`].
    nodes: Vec<Node<Component::Sum, N>>,
    /// `2^N` child slots per node, laid out in node order.
    links: Vec<u32>,
    /// Pool slots of nodes detached by reductions, reused by later insertions.
    free: Vec<u32>,
    /// For each non-terminal depth, the internal nodes that can still be merged, oldest first.
    reducible: Vec<VecDeque<u32>>,
    /// The current number of leaves.
    leaf_count: u32,
    /// The number of trie levels.
    max_depth: u8,
    /// The maximum number of colors in the palette.
    palette_size: PaletteSize,
    /// Set if a reduction failed during insertion; reported by [`ColorTree::build_palette`].
    failure: Option<String>,
}

impl<Color, Component, const N: usize> ColorTree<Color, Component, N>
where
    Color: ColorComponents<Component, N>,
    Component: Channel,
{
    /// The number of children per node.
    const BRANCHES: usize = 1 << N;

    /// Creates a new, empty [`ColorTree`] with the given depth and palette size.
    ///
    /// # Errors
    /// Returns [`QuantizeError::InvalidParameter`] if `max_depth` is `0` or greater than the
    /// channel bit width, if `palette_size` is `0`, or if `N` is not `3` or `4`.
    pub fn new(max_depth: u8, palette_size: PaletteSize) -> Result<Self, QuantizeError> {
        Self::with_options(
            OctreeOptions::new()
                .max_depth(max_depth)
                .palette_size(palette_size),
        )
    }

    /// Creates a new, empty [`ColorTree`] from the given [`OctreeOptions`].
    ///
    /// # Errors
    /// See [`ColorTree::new`].
    pub fn with_options(options: OctreeOptions) -> Result<Self, QuantizeError> {
        let OctreeOptions { max_depth, palette_size } = options;

        if N != 3 && N != 4 {
            return Err(invalid_parameter(
                "channels",
                &N,
                &"only RGB (3) and RGBA (4) colors are supported",
            ));
        }

        if max_depth == 0 || max_depth > Component::BITS {
            return Err(invalid_parameter(
                "max_depth",
                &max_depth,
                &format!("must be in the range 1..={}", Component::BITS),
            ));
        }

        if palette_size.into_inner() == 0 {
            return Err(invalid_parameter(
                "palette_size",
                &palette_size,
                &"must be at least 1",
            ));
        }

        let mut tree = Self {
            _phantom: PhantomData,
            nodes: Vec::new(),
            links: Vec::new(),
            free: Vec::new(),
            reducible: vec![VecDeque::new(); usize::from(max_depth)],
            leaf_count: 0,
            max_depth,
            palette_size,
            failure: None,
        };

        tree.push_node(0);

        Ok(tree)
    }

    /// The number of trie levels.
    #[must_use]
    pub const fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// The maximum number of colors in the palette.
    #[must_use]
    pub const fn palette_size(&self) -> PaletteSize {
        self.palette_size
    }

    /// The current number of leaves.
    ///
    /// This never exceeds [`REDUCE_CEILING`] between insertions.
    #[must_use]
    pub const fn leaf_count(&self) -> u32 {
        self.leaf_count
    }

    /// Whether or not no colors have been inserted yet.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Computes the child digit of `components` at the given depth.
    #[inline]
    fn branch(components: &[Component; N], depth: u8) -> usize {
        let shift = Component::BITS - 1 - depth;
        components
            .iter()
            .fold(0, |digit, &c| (digit << 1) | c.bit(shift))
    }

    /// The link slots holding the children of `node`.
    #[inline]
    fn children(&self, node: u32) -> &[u32] {
        let start = node as usize * Self::BRANCHES;
        &self.links[start..(start + Self::BRANCHES)]
    }

    /// Allocates a node at the given depth and registers it for reduction
    /// (non-terminal depths) or counts it as a leaf (the terminal depth).
    fn push_node(&mut self, depth: u8) -> u32 {
        let index = if let Some(index) = self.free.pop() {
            self.nodes[index as usize] = Node::new();
            index
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let index = self.nodes.len() as u32;
            self.nodes.push(Node::new());
            self.links
                .resize(self.links.len() + Self::BRANCHES, EMPTY);
            index
        };

        if depth < self.max_depth {
            self.reducible[usize::from(depth)].push_back(index);
        } else {
            self.leaf_count += 1;
        }

        index
    }

    /// Adds a single color to the tree.
    ///
    /// The total number of colors inserted into one tree must not exceed
    /// [`MAX_PIXELS`](crate::MAX_PIXELS).
    pub fn insert(&mut self, color: Color) {
        self.insert_count(color, 1);
    }

    /// Adds a color to the tree `count` times.
    ///
    /// This gives the same tree as calling [`ColorTree::insert`] `count` times in a row.
    pub fn insert_count(&mut self, color: Color, count: u32) {
        if count == 0 || self.failure.is_some() {
            return;
        }

        let components = cast::into_array(color);

        let mut node = ROOT;
        let mut depth = 0;
        while depth < self.max_depth && !self.nodes[node as usize].is_leaf {
            let slot = node as usize * Self::BRANCHES + Self::branch(&components, depth);
            depth += 1;
            node = match self.links[slot] {
                EMPTY => {
                    let child = self.push_node(depth);
                    self.links[slot] = child;
                    child
                }
                child => child,
            };
        }

        let leaf = &mut self.nodes[node as usize];
        leaf.is_leaf = true;
        leaf.pixel_count += count;
        let count = Component::Sum::from(count);
        for (total, &c) in leaf.totals.iter_mut().zip(&components) {
            let c: Component::Sum = c.into();
            *total += c * count;
        }

        if self.leaf_count > REDUCE_CEILING {
            if let Err(err) = self.reduce(REDUCE_CEILING) {
                self.failure = Some(err.to_string());
            }
        }
    }

    /// Adds every color in the slice to the tree.
    pub fn add_colors(&mut self, colors: ColorSlice<Color>) {
        for &color in colors.as_ref() {
            self.insert(color);
        }
    }

    /// Merges the deepest reducible nodes, oldest first, until at most `limit` leaves remain.
    fn reduce(&mut self, limit: u32) -> Result<(), QuantizeError> {
        if self.leaf_count <= limit {
            return Ok(());
        }

        let before = self.leaf_count;
        while self.leaf_count > limit {
            let Some(node) = self
                .reducible
                .iter_mut()
                .rev()
                .find_map(VecDeque::pop_front)
            else {
                return Err(invariant(
                    "reduce",
                    &format!(
                        "{} leaves remain above the limit of {limit}, but no node can be merged",
                        self.leaf_count
                    ),
                ));
            };

            self.merge_children(node);
        }

        debug!(
            "reduced color tree from {before} to {} leaves (limit {limit})",
            self.leaf_count
        );

        Ok(())
    }

    /// Folds the statistics of all children of `node` into it, detaches them,
    /// and turns `node` into a leaf.
    ///
    /// All children are leaves, since deeper levels are always reduced first.
    fn merge_children(&mut self, node: u32) {
        let start = node as usize * Self::BRANCHES;
        let mut merged = 0;
        for slot in start..(start + Self::BRANCHES) {
            let child = std::mem::replace(&mut self.links[slot], EMPTY);
            if child != EMPTY {
                let Node { totals, pixel_count, .. } = self.nodes[child as usize];
                let parent = &mut self.nodes[node as usize];
                for (total, child_total) in parent.totals.iter_mut().zip(totals) {
                    *total += child_total;
                }
                parent.pixel_count += pixel_count;
                self.free.push(child);
                merged += 1;
            }
        }

        if merged > 0 {
            self.nodes[node as usize].is_leaf = true;
            self.leaf_count = self.leaf_count - merged + 1;
            trace!("merged {merged} leaves into node {node}");
        }
    }

    /// Reduces the tree to at most [`PaletteSize`] leaves and computes the palette.
    ///
    /// Leaves are numbered in pre-order, visiting children in digit order.
    /// Each palette color is the channel-wise average of the colors in its leaf, rounded down.
    ///
    /// # Errors
    /// Returns [`QuantizeError::Invariant`] if the tree's bookkeeping is inconsistent.
    /// This does not happen for any sequence of insertions and indicates a bug.
    pub fn build_palette(mut self) -> Result<IndexedTree<Color, Component, N>, QuantizeError> {
        if let Some(reason) = self.failure.take() {
            return Err(invariant("insert", &reason));
        }

        self.reduce(u32::from(self.palette_size.into_inner()))?;
        let palette_size = usize::from(self.palette_size.into_inner());

        let mut palette: Vec<Color> =
            Vec::with_capacity(palette_size.min(self.leaf_count as usize));
        let mut counts = Vec::with_capacity(palette.capacity());

        let mut stack = vec![ROOT];
        while let Some(index) = stack.pop() {
            let node = &mut self.nodes[index as usize];
            if node.is_leaf {
                if palette.len() < palette_size {
                    if node.pixel_count == 0 {
                        return Err(invariant(
                            "build_palette",
                            &format!("leaf {index} has no colors to average"),
                        ));
                    }

                    #[allow(clippy::cast_possible_truncation)]
                    {
                        node.palette_index = palette.len() as u8;
                    }
                    let count = Component::Sum::from(node.pixel_count);
                    let components: [Component; N] = node.totals.map(|total| (total / count).as_());
                    palette.push(cast::from_array(components));
                    counts.push(node.pixel_count);
                } else {
                    node.palette_index = 0;
                }
            } else {
                let start = index as usize * Self::BRANCHES;
                stack.extend(
                    self.links[start..(start + Self::BRANCHES)]
                        .iter()
                        .rev()
                        .filter(|&&child| child != EMPTY),
                );
            }
        }

        debug!(
            "built a palette of {} colors from {} leaves",
            palette.len(),
            self.leaf_count
        );

        Ok(IndexedTree { tree: self, palette, counts })
    }
}

/// A [`ColorTree`] with a finished palette, used to map colors to palette indices.
#[derive(Debug, Clone)]
pub struct IndexedTree<Color, Component, const N: usize>
where
    Color: ColorComponents<Component, N>,
    Component: Channel,
{
    /// The tree with palette indices assigned to its leaves.
    tree: ColorTree<Color, Component, N>,
    /// The palette colors.
    palette: Vec<Color>,
    /// The number of colors absorbed into each palette color.
    counts: Vec<u32>,
}

impl<Color, Component, const N: usize> IndexedTree<Color, Component, N>
where
    Color: ColorComponents<Component, N>,
    Component: Channel,
{
    /// The palette colors, in index order.
    #[must_use]
    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    /// The number of inserted colors absorbed into each palette color.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Returns the index of the palette color for `color`.
    ///
    /// `color` need not have been inserted. The returned index is always valid
    /// for a non-empty palette; an empty tree maps everything to `0`.
    #[must_use]
    pub fn palette_index(&self, color: Color) -> u8 {
        let tree = &self.tree;
        let components = cast::into_array(color);

        let mut index = ROOT;
        let mut depth = 0;
        loop {
            let node = &tree.nodes[index as usize];
            if node.is_leaf {
                return node.palette_index;
            }

            if depth >= tree.max_depth {
                return 0;
            }

            let children = tree.children(index);
            index = match children[ColorTree::<Color, Component, N>::branch(&components, depth)] {
                EMPTY => match children.iter().find(|&&child| child != EMPTY) {
                    Some(&child) => child,
                    None => return 0,
                },
                child => child,
            };
            depth += 1;
        }
    }

    /// Returns the palette index for each color in the slice.
    #[must_use]
    pub fn remap(&self, colors: &[Color]) -> Vec<u8> {
        colors
            .iter()
            .map(|&color| self.palette_index(color))
            .collect()
    }

    /// Discards the tree and returns the palette and the counts for each palette color.
    #[must_use]
    pub fn into_palette(self) -> (Vec<Color>, Vec<u32>) {
        (self.palette, self.counts)
    }

    /// Discards the tree and bundles the palette with the given palette `indices`.
    #[must_use]
    pub fn into_output(self, indices: Vec<u8>) -> QuantizeOutput<Color> {
        QuantizeOutput {
            palette: self.palette,
            counts: self.counts,
            indices,
        }
    }
}

/// Computes a color palette from the given `colors` using the given [`OctreeOptions`].
///
/// # Errors
/// Returns an error if the options are invalid for the color type (see [`ColorTree::new`]).
pub fn palette<Color, Component, const N: usize>(
    colors: ColorSlice<Color>,
    options: OctreeOptions,
) -> Result<QuantizeOutput<Color>, QuantizeError>
where
    Color: ColorComponents<Component, N>,
    Component: Channel,
{
    let mut tree = ColorTree::with_options(options)?;
    tree.add_colors(colors);
    let (palette, counts) = tree.build_palette()?.into_palette();
    Ok(QuantizeOutput { palette, counts, indices: Vec::new() })
}

/// Computes a color palette from the given `colors` using the given [`OctreeOptions`].
/// The returned [`QuantizeOutput`] will have its `indices` populated.
///
/// # Errors
/// Returns an error if the options are invalid for the color type (see [`ColorTree::new`]).
pub fn indexed_palette<Color, Component, const N: usize>(
    colors: ColorSlice<Color>,
    options: OctreeOptions,
) -> Result<QuantizeOutput<Color>, QuantizeError>
where
    Color: ColorComponents<Component, N>,
    Component: Channel,
{
    let mut tree = ColorTree::with_options(options)?;
    tree.add_colors(colors);
    let tree = tree.build_palette()?;
    let indices = tree.remap(&colors);
    Ok(tree.into_output(indices))
}

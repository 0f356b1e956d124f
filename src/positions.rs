//! Committed free positions of blocks.
//!
//! The host's copy of where each block sits. It only changes in response to
//! `UPDATE_FREE_POSITION` commits; intermediate drag frames never reach it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Block identifier as found in the `data-block-id` attribute.
pub type BlockId = String;

/// Integer pixel offset from the canvas origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A committed drag result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPosition {
    pub block_id: BlockId,
    pub x: u32,
    pub y: u32,
}

/// Block id -> position, in first-commit order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionMap {
    entries: IndexMap<BlockId, Point>,
}

impl PositionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit, replacing any earlier position for the block.
    ///
    /// Commits are idempotent: applying the same one twice leaves the same map.
    pub fn commit(&mut self, position: &BlockPosition) {
        self.entries
            .insert(position.block_id.clone(), Point::new(position.x, position.y));
    }

    pub fn get(&self, block_id: &str) -> Option<Point> {
        self.entries.get(block_id).copied()
    }

    pub fn remove(&mut self, block_id: &str) -> Option<Point> {
        self.entries.shift_remove(block_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Point)> + '_ {
        self.entries.iter().map(|(id, p)| (id.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(BlockId, Point)> for PositionMap {
    fn from_iter<I: IntoIterator<Item = (BlockId, Point)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

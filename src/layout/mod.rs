//! File layout: geometry, region placement, the tag table and tile indexes.
//!
//! Planning runs leaves first:
//!
//! ```text
//! ImageGeometry ──► TileGrid ──┐
//!                              ├──► plan_layout ──► OffsetTable ──► build_tags
//! BlockLengths ────────────────┤                        │
//! tag_schema().len() ──────────┘                        └──► build_tile_offsets
//! ```
//!
//! Everything here is pure and performs no I/O.

pub mod grid;
pub mod index;
pub mod planner;
pub mod tags;

pub use grid::{
    ImageGeometry, TileGrid, BITS_PER_SAMPLE, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH,
    DEFAULT_TILE_SIZE,
};
pub use index::{build_tile_byte_counts, build_tile_offsets, encode_u32_table};
pub use planner::{plan_layout, region_lengths, BlockLengths, OffsetTable, Region, RegionKind};
pub use tags::{build_tags, check_tag_table, tag_schema, TagSpec, TagValue};

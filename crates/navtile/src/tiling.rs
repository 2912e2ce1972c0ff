//! Tile grid helpers for streaming builds
//!
//! Tiles are square, `tile_size * cell_size` world units on a side, with tile
//! (0, 0) starting at the world origin. Tile coordinates map X to `x` and Z
//! to `y`.

use glam::IVec2;
use navtile_common::BoundingBox;

/// Lists every tile whose footprint overlaps the XZ extent of `bounds`
///
/// Tiles are returned row by row, Z outermost.
pub fn overlapping_tiles(tile_size: i32, cell_size: f32, bounds: &BoundingBox) -> Vec<IVec2> {
    let tcs = tile_size as f32 * cell_size;
    if !(tcs > 0.0) {
        return Vec::new();
    }

    let start_x = (bounds.minimum.x / tcs).floor() as i32;
    let start_y = (bounds.minimum.z / tcs).floor() as i32;
    let end_x = (bounds.maximum.x / tcs).ceil() as i32;
    let end_y = (bounds.maximum.z / tcs).ceil() as i32;

    let mut tiles = Vec::new();
    for y in start_y..end_y {
        for x in start_x..end_x {
            tiles.push(IVec2::new(x, y));
        }
    }
    tiles
}

/// Replaces the XZ extent of `bounds` with the footprint of tile `coord`
///
/// Y is snapped outward to whole cells so that neighbouring tiles built from
/// the same source bounds share their vertical grid.
pub fn clamp_bounds_to_tile(
    tile_size: i32,
    cell_size: f32,
    cell_height: f32,
    bounds: BoundingBox,
    coord: IVec2,
) -> BoundingBox {
    let tcs = tile_size as f32 * cell_size;
    let mut clamped = bounds;

    clamped.minimum.x = coord.x as f32 * tcs;
    clamped.minimum.z = coord.y as f32 * tcs;
    clamped.maximum.x = clamped.minimum.x + tcs;
    clamped.maximum.z = clamped.minimum.z + tcs;

    clamped.minimum.y = (bounds.minimum.y / cell_height).floor() * cell_height;
    clamped.maximum.y = (bounds.maximum.y / cell_height).ceil() * cell_height;

    clamped
}

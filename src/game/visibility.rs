//! Zoom-bucketed spatial visibility index
//!
//! One grid layer per registered zoom level, each with a cell size matched to
//! that zoom's viewport. An observer's visible set is the union of the cells
//! covering its viewport at its zoom level. The index reflects positions as
//! of the start of the visibility phase: static objects are inserted once at
//! construction, dynamic objects are rebuilt before diffing each tick.

use hashbrown::HashSet;
use rustc_hash::FxHashMap;

use crate::error::GameError;
use crate::game::ids::ObjectId;
use crate::util::vec2::Vec2;

/// Viewport half-extent as a multiple of the zoom level, with a margin so
/// objects do not pop at screen edges
const VIEW_EXTENT_SCALE: f32 = 1.25;

type CellKey = (i32, i32);

/// Grid layer for one zoom level
struct ZoomLayer {
    cell_size: f32,
    inv_cell_size: f32,
    static_cells: FxHashMap<CellKey, HashSet<ObjectId>>,
    dynamic_cells: FxHashMap<CellKey, HashSet<ObjectId>>,
}

impl ZoomLayer {
    fn new(zoom: u32) -> Self {
        let cell_size = zoom as f32;
        Self {
            cell_size,
            inv_cell_size: 1.0 / cell_size,
            static_cells: FxHashMap::default(),
            dynamic_cells: FxHashMap::default(),
        }
    }

    #[inline]
    fn cell_of(&self, position: Vec2) -> CellKey {
        (
            (position.x * self.inv_cell_size).floor() as i32,
            (position.y * self.inv_cell_size).floor() as i32,
        )
    }
}

/// Visibility index over all registered zoom levels
pub struct VisibilityGrid {
    bounds: Vec2,
    layers: FxHashMap<u32, ZoomLayer>,
}

impl VisibilityGrid {
    /// Register the closed set of zoom levels for this instance
    pub fn new(map_width: f32, map_height: f32, zoom_levels: &[u32]) -> Self {
        let layers = zoom_levels
            .iter()
            .map(|&zoom| (zoom, ZoomLayer::new(zoom)))
            .collect();
        Self {
            bounds: Vec2::new(map_width, map_height),
            layers,
        }
    }

    fn in_bounds(&self, position: Vec2) -> bool {
        position.x >= 0.0
            && position.y >= 0.0
            && position.x <= self.bounds.x
            && position.y <= self.bounds.y
    }

    /// Insert a static object into every layer. Called once at construction;
    /// the map is immutable for the simulation's lifetime.
    pub fn insert_static(&mut self, id: ObjectId, position: Vec2) {
        for layer in self.layers.values_mut() {
            let key = layer.cell_of(position);
            layer.static_cells.entry(key).or_default().insert(id);
        }
    }

    /// Rebuild the dynamic half of every layer from current object positions.
    /// Runs before the visibility phase each tick.
    pub fn rebuild_dynamic(&mut self, objects: impl Iterator<Item = (ObjectId, Vec2)> + Clone) {
        for layer in self.layers.values_mut() {
            for cell in layer.dynamic_cells.values_mut() {
                cell.clear();
            }
            for (id, position) in objects.clone() {
                let key = layer.cell_of(position);
                layer.dynamic_cells.entry(key).or_default().insert(id);
            }
        }
    }

    /// Objects occupying the cell containing `position` at `zoom`.
    ///
    /// Out-of-bounds positions yield an empty set — many queries originate
    /// from players near the map edge. Unregistered zoom levels fail fast.
    pub fn query(&self, position: Vec2, zoom: u32) -> Result<HashSet<ObjectId>, GameError> {
        let layer = self
            .layers
            .get(&zoom)
            .ok_or(GameError::InvalidZoomLevel { zoom })?;
        if !self.in_bounds(position) {
            return Ok(HashSet::new());
        }
        let key = layer.cell_of(position);
        let mut out = HashSet::new();
        if let Some(cell) = layer.static_cells.get(&key) {
            out.extend(cell.iter().copied());
        }
        if let Some(cell) = layer.dynamic_cells.get(&key) {
            out.extend(cell.iter().copied());
        }
        Ok(out)
    }

    /// Union of all cells covering the observer's viewport at its zoom
    pub fn visible_set(&self, center: Vec2, zoom: u32) -> Result<HashSet<ObjectId>, GameError> {
        let layer = self
            .layers
            .get(&zoom)
            .ok_or(GameError::InvalidZoomLevel { zoom })?;
        let mut out = HashSet::new();
        if !self.in_bounds(center) {
            return Ok(out);
        }

        let half_extent = zoom as f32 * VIEW_EXTENT_SCALE;
        let (min_cx, min_cy) = layer.cell_of(center - Vec2::new(half_extent, half_extent));
        let (max_cx, max_cy) = layer.cell_of(center + Vec2::new(half_extent, half_extent));

        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                if let Some(cell) = layer.static_cells.get(&(cx, cy)) {
                    out.extend(cell.iter().copied());
                }
                if let Some(cell) = layer.dynamic_cells.get(&(cx, cy)) {
                    out.extend(cell.iter().copied());
                }
            }
        }
        Ok(out)
    }

    /// Registered zoom levels (test/diagnostic use)
    pub fn zoom_levels(&self) -> impl Iterator<Item = u32> + '_ {
        self.layers.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::zoom;

    fn test_grid() -> VisibilityGrid {
        VisibilityGrid::new(720.0, 720.0, &zoom::LEVELS)
    }

    #[test]
    fn test_query_finds_dynamic_object() {
        let mut grid = test_grid();
        grid.rebuild_dynamic([(1u16, Vec2::new(100.0, 100.0))].into_iter());
        let result = grid.query(Vec2::new(100.0, 100.0), zoom::DEFAULT).unwrap();
        assert!(result.contains(&1));
    }

    #[test]
    fn test_out_of_bounds_is_empty_for_every_level() {
        let mut grid = test_grid();
        grid.insert_static(3, Vec2::new(10.0, 10.0));
        for level in zoom::LEVELS {
            let result = grid.query(Vec2::new(-50.0, 400.0), level).unwrap();
            assert!(result.is_empty(), "zoom {} not empty", level);
            let result = grid.query(Vec2::new(400.0, 9999.0), level).unwrap();
            assert!(result.is_empty(), "zoom {} not empty", level);
        }
    }

    #[test]
    fn test_unregistered_zoom_fails() {
        let grid = test_grid();
        let err = grid.query(Vec2::new(100.0, 100.0), 999).unwrap_err();
        assert!(matches!(err, GameError::InvalidZoomLevel { zoom: 999 }));
        assert!(grid
            .visible_set(Vec2::new(100.0, 100.0), 999)
            .is_err());
    }

    #[test]
    fn test_visible_set_covers_viewport() {
        let mut grid = test_grid();
        // One object near the observer, one across the map
        grid.rebuild_dynamic(
            [
                (1u16, Vec2::new(360.0, 360.0)),
                (2u16, Vec2::new(370.0, 350.0)),
                (3u16, Vec2::new(20.0, 20.0)),
            ]
            .into_iter(),
        );
        let visible = grid
            .visible_set(Vec2::new(360.0, 360.0), zoom::DEFAULT)
            .unwrap();
        assert!(visible.contains(&1));
        assert!(visible.contains(&2));
        assert!(!visible.contains(&3));
    }

    #[test]
    fn test_larger_zoom_sees_farther() {
        let mut grid = test_grid();
        grid.rebuild_dynamic(
            [(1u16, Vec2::new(360.0, 360.0)), (2u16, Vec2::new(430.0, 360.0))].into_iter(),
        );
        let near = grid
            .visible_set(Vec2::new(360.0, 360.0), zoom::INDOOR)
            .unwrap();
        let far = grid.visible_set(Vec2::new(360.0, 360.0), 68).unwrap();
        assert!(!near.contains(&2));
        assert!(far.contains(&2));
    }

    #[test]
    fn test_rebuild_replaces_previous_positions() {
        let mut grid = test_grid();
        grid.rebuild_dynamic([(1u16, Vec2::new(100.0, 100.0))].into_iter());
        grid.rebuild_dynamic([(1u16, Vec2::new(600.0, 600.0))].into_iter());
        let old = grid.query(Vec2::new(100.0, 100.0), zoom::DEFAULT).unwrap();
        assert!(!old.contains(&1));
        let new = grid.query(Vec2::new(600.0, 600.0), zoom::DEFAULT).unwrap();
        assert!(new.contains(&1));
    }

    #[test]
    fn test_static_objects_survive_dynamic_rebuild() {
        let mut grid = test_grid();
        grid.insert_static(9, Vec2::new(200.0, 200.0));
        grid.rebuild_dynamic(std::iter::empty());
        let result = grid.query(Vec2::new(200.0, 200.0), zoom::DEFAULT).unwrap();
        assert!(result.contains(&9));
    }
}

//! Uniform-grid spatial hash
//!
//! Space is cut into cubic cells of `cell_size`. An entity is referenced from
//! every cell its volume spans (inclusive on x, y and z), and a reverse index
//! remembers those cells so removal touches only what was inserted.

use std::collections::{BTreeSet, HashMap};

use super::SpatialQuery;
use crate::foundation::collections::EntityId;
use crate::foundation::math::Aabb;

/// Integer cell coordinate
pub type CellKey = (i64, i64, i64);

#[derive(Debug, Clone)]
struct Entry {
    cells: Vec<CellKey>,
    aabb: Aabb,
}

/// Grid-based broad-phase index
#[derive(Debug, Clone)]
pub struct SpatialHashMap {
    cell_size: f64,
    map: HashMap<CellKey, Vec<EntityId>>,
    entries: HashMap<EntityId, Entry>,
}

impl SpatialHashMap {
    /// Create an empty index with the given cell edge length
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: if cell_size > 0.0 { cell_size } else { 1.0 },
            map: HashMap::new(),
            entries: HashMap::new(),
        }
    }

    /// Cell edge length
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cells spanned by a volume
    #[allow(clippy::cast_possible_truncation)]
    pub fn cells(&self, aabb: &Aabb) -> Vec<CellKey> {
        let cell = |v: f64| (v / self.cell_size).floor() as i64;
        let mut keys = Vec::new();
        for x in cell(aabb.min.x)..=cell(aabb.max.x) {
            for y in cell(aabb.min.y)..=cell(aabb.max.y) {
                for z in cell(aabb.min.z)..=cell(aabb.max.z) {
                    keys.push((x, y, z));
                }
            }
        }
        keys
    }

    /// Cells currently referencing `entity`
    pub fn cells_of(&self, entity: EntityId) -> Option<&[CellKey]> {
        self.entries.get(&entity).map(|entry| entry.cells.as_slice())
    }

    /// Number of occupied cells
    pub fn occupied_cells(&self) -> usize {
        self.map.len()
    }
}

impl SpatialQuery for SpatialHashMap {
    fn insert(&mut self, entity: EntityId, aabb: Aabb) {
        self.remove(entity);
        let cells = self.cells(&aabb);
        for key in &cells {
            self.map.entry(*key).or_default().push(entity);
        }
        self.entries.insert(entity, Entry { cells, aabb });
    }

    fn remove(&mut self, entity: EntityId) -> bool {
        let Some(entry) = self.entries.remove(&entity) else {
            return false;
        };
        for key in entry.cells {
            if let Some(bucket) = self.map.get_mut(&key) {
                bucket.retain(|&e| e != entity);
                if bucket.is_empty() {
                    self.map.remove(&key);
                }
            }
        }
        true
    }

    fn query_nearby(&self, aabb: &Aabb) -> Vec<EntityId> {
        let found: BTreeSet<EntityId> = self
            .cells(aabb)
            .iter()
            .filter_map(|key| self.map.get(key))
            .flatten()
            .copied()
            .collect();
        found.into_iter().collect()
    }

    fn query_colliding(&self, entity: EntityId, aabb: &Aabb) -> Vec<EntityId> {
        self.query_nearby(aabb)
            .into_iter()
            .filter(|&other| other != entity)
            .filter(|other| self.entries.get(other).is_some_and(|entry| entry.aabb.overlaps(aabb)))
            .collect()
    }

    fn get_aabb(&self, entity: EntityId) -> Option<Aabb> {
        self.entries.get(&entity).map(|entry| entry.aabb)
    }

    fn clear(&mut self) {
        self.map.clear();
        self.entries.clear();
    }

    fn entity_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::collections::SlotMap;
    use crate::foundation::math::Vector;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn boxed(x: f64, y: f64, size: f64) -> Aabb {
        Aabb::from_center_size(Vector::new(x, y), Vector::splat(size), 0.0, 1.0)
    }

    fn keys(count: usize) -> Vec<EntityId> {
        let mut arena = SlotMap::<EntityId, ()>::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn test_cells_are_inclusive_and_floor_negative() {
        let grid = SpatialHashMap::new(64.0);

        assert_eq!(grid.cells(&boxed(0.0, 0.0, 32.0)).len(), 4);
        assert_eq!(grid.cells(&boxed(32.0, 32.0, 32.0)), vec![(0, 0, 0)]);
        assert_eq!(grid.cells(&boxed(-10.0, 32.0, 4.0)), vec![(-1, 0, 0)]);
    }

    #[test]
    fn test_remove_uses_reverse_index() {
        let ids = keys(2);
        let mut grid = SpatialHashMap::new(64.0);
        grid.insert(ids[0], boxed(0.0, 0.0, 200.0));
        grid.insert(ids[1], boxed(10.0, 10.0, 8.0));
        assert_eq!(grid.cells_of(ids[0]).map(<[CellKey]>::len), Some(16));

        assert!(grid.remove(ids[0]));
        assert!(!grid.remove(ids[0]));
        assert_eq!(grid.entity_count(), 1);
        assert_eq!(grid.occupied_cells(), 1);
        assert_eq!(grid.query_nearby(&boxed(0.0, 0.0, 500.0)), vec![ids[1]]);
    }

    #[test]
    fn test_reinsert_moves_entity() {
        let ids = keys(1);
        let mut grid = SpatialHashMap::new(64.0);
        grid.insert(ids[0], boxed(0.0, 0.0, 8.0));
        grid.update(ids[0], boxed(1000.0, 1000.0, 8.0));

        assert!(grid.query_nearby(&boxed(0.0, 0.0, 8.0)).is_empty());
        assert_eq!(grid.query_nearby(&boxed(1000.0, 1000.0, 8.0)), vec![ids[0]]);
        assert_eq!(grid.entity_count(), 1);
    }

    #[test]
    fn test_nearby_deduplicates_multi_cell_entities() {
        let ids = keys(1);
        let mut grid = SpatialHashMap::new(16.0);
        grid.insert(ids[0], boxed(0.0, 0.0, 100.0));

        assert_eq!(grid.query_nearby(&boxed(0.0, 0.0, 100.0)), vec![ids[0]]);
    }

    #[test]
    fn test_colliding_excludes_self_and_touching() {
        let ids = keys(3);
        let mut grid = SpatialHashMap::new(64.0);
        grid.insert(ids[0], boxed(0.0, 0.0, 32.0));
        grid.insert(ids[1], boxed(32.0, 0.0, 32.0));
        grid.insert(ids[2], boxed(20.0, 0.0, 32.0));

        assert_eq!(grid.query_colliding(ids[0], &boxed(0.0, 0.0, 32.0)), vec![ids[2]]);
    }

    #[test]
    fn test_colliding_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let ids = keys(150);
        let mut grid = SpatialHashMap::new(64.0);
        let mut volumes = Vec::new();

        for &id in &ids {
            let center = Vector::new(rng.gen_range(-400.0..400.0), rng.gen_range(-400.0..400.0));
            let size = Vector::new(rng.gen_range(1.0..150.0), rng.gen_range(1.0..150.0));
            let z = f64::from(rng.gen_range(0..3_u8));
            let depth = f64::from(rng.gen_range(1..3_u8));
            let aabb = Aabb::from_center_size(center, size, z, depth);
            grid.insert(id, aabb);
            volumes.push((id, aabb));
        }

        for &(id, aabb) in &volumes {
            let mut expected: Vec<EntityId> = volumes
                .iter()
                .filter(|(other, other_aabb)| *other != id && other_aabb.overlaps(&aabb))
                .map(|(other, _)| *other)
                .collect();
            expected.sort_unstable();

            let mut found = grid.query_colliding(id, &aabb);
            found.sort_unstable();
            assert_eq!(found, expected);
        }
    }
}

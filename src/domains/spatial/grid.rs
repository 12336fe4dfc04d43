//! Uniform-bucket spatial index used for neighbourhood queries.
//!
//! The grid is planar: entities live on the arena floor, so bucketing and
//! distances use x and y only. It is rebuilt from scratch every tick.

use crate::common::{DomainError, DomainResult};
use crate::domains::geometry::Vector3;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct GridEntry {
    pub id: usize,
    pub name: String,
    pub position: Vector3,
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f64,
    entries: Vec<GridEntry>,
    by_id: HashMap<usize, usize>,
    buckets: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> DomainResult<Self> {
        if cell_size.is_nan() || cell_size <= 0.0 || cell_size.is_infinite() {
            return Err(DomainError::configuration(
                "spatial grid",
                "cell size must be positive",
            ));
        }
        Ok(Self {
            cell_size,
            entries: Vec::new(),
            by_id: HashMap::new(),
            buckets: HashMap::new(),
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_id.clear();
        self.buckets.clear();
    }

    fn bucket_of(&self, position: &Vector3) -> (i64, i64) {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    /// Files an entity under its bucket. Re-inserting an id moves it.
    pub fn insert(&mut self, id: usize, name: &str, position: Vector3) {
        if let Some(slot) = self.by_id.get(&id).copied() {
            let old = self.bucket_of(&self.entries[slot].position);
            if let Some(bucket) = self.buckets.get_mut(&old) {
                bucket.retain(|s| *s != slot);
            }
            self.entries[slot].position = position;
            self.entries[slot].name = name.to_string();
            let cell = self.bucket_of(&position);
            self.buckets.entry(cell).or_default().push(slot);
            return;
        }
        let slot = self.entries.len();
        self.entries.push(GridEntry {
            id,
            name: name.to_string(),
            position,
        });
        self.by_id.insert(id, slot);
        let cell = self.bucket_of(&position);
        self.buckets.entry(cell).or_default().push(slot);
    }

    pub fn rebuild<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = GridEntry>,
    {
        self.clear();
        for entry in entries {
            self.insert(entry.id, &entry.name, entry.position);
        }
    }

    pub fn get(&self, id: usize) -> Option<&GridEntry> {
        self.by_id.get(&id).map(|slot| &self.entries[*slot])
    }

    /// Entities other than `id` within `range` of it, sorted by id. Unknown
    /// ids have no neighbours.
    pub fn neighbors(&self, id: usize, range: f64) -> Vec<&GridEntry> {
        match self.get(id) {
            Some(entry) => self.within(&entry.position, range, Some(id)),
            None => Vec::new(),
        }
    }

    /// Entities within `range` of `position`, optionally excluding one id.
    pub fn within(&self, position: &Vector3, range: f64, exclude: Option<usize>) -> Vec<&GridEntry> {
        if range < 0.0 {
            return Vec::new();
        }
        let span = ((range / self.cell_size).ceil() as i64).max(1);
        let (cx, cy) = self.bucket_of(position);
        let mut found: Vec<&GridEntry> = Vec::new();
        for bx in (cx - span)..=(cx + span) {
            for by in (cy - span)..=(cy + span) {
                let Some(bucket) = self.buckets.get(&(bx, by)) else {
                    continue;
                };
                for slot in bucket {
                    let entry = &self.entries[*slot];
                    if Some(entry.id) == exclude {
                        continue;
                    }
                    if entry.position.planar_distance(position) <= range {
                        found.push(entry);
                    }
                }
            }
        }
        found.sort_by_key(|e| e.id);
        found
    }
}

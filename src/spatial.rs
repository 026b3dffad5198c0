//! Point-location index over wall points.
//!
//! An unbalanced quadrant tree stored in an arena: the first inserted point is
//! the root and every later point descends by comparing each axis against the
//! node it meets, hanging off the first empty child. Nothing is rebalanced, so
//! sorted input degenerates into a chain; the index is built once per level and
//! holds a few hundred points at most.

use crate::error::LevelError;
use crate::types::WorldPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quadrant {
    NorthWest = 0,
    NorthEast = 1,
    SouthWest = 2,
    SouthEast = 3,
}

impl Quadrant {
    fn of(point: WorldPoint, key: WorldPoint) -> Self {
        match (point.x < key.x, point.z >= key.z) {
            (true, true) => Self::NorthWest,
            (false, true) => Self::NorthEast,
            (true, false) => Self::SouthWest,
            (false, false) => Self::SouthEast,
        }
    }
}

#[derive(Clone, Debug)]
struct QuadNode {
    key: WorldPoint,
    children: [Option<usize>; 4],
}

#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    nodes: Vec<QuadNode>,
}

impl SpatialIndex {
    pub fn build<I>(points: I) -> Result<Self, LevelError>
    where
        I: IntoIterator<Item = WorldPoint>,
    {
        let mut index = Self::default();
        for point in points {
            index.insert(point);
        }
        if index.is_empty() {
            return Err(LevelError::NoWallPoints);
        }
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `false` when an equal key already sits on the descent path.
    ///
    /// That halt is the same one a positive `query` takes, so a duplicate
    /// insert cannot be told apart from a hit.
    pub fn insert(&mut self, point: WorldPoint) -> bool {
        if self.nodes.is_empty() {
            self.nodes.push(QuadNode {
                key: point,
                children: [None; 4],
            });
            return true;
        }
        let mut current = 0;
        loop {
            let node = &self.nodes[current];
            if node.key == point {
                return false;
            }
            let quadrant = Quadrant::of(point, node.key) as usize;
            let next = node.children[quadrant];
            match next {
                Some(child) => current = child,
                None => {
                    let id = self.nodes.len();
                    self.nodes.push(QuadNode {
                        key: point,
                        children: [None; 4],
                    });
                    self.nodes[current].children[quadrant] = Some(id);
                    return true;
                }
            }
        }
    }

    pub fn query(&self, point: WorldPoint) -> bool {
        let mut cursor = if self.nodes.is_empty() { None } else { Some(0) };
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.key == point {
                return true;
            }
            cursor = node.children[Quadrant::of(point, node.key) as usize];
        }
        false
    }

    /// Longest root-to-leaf chain, counted in nodes.
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0usize, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            for child in self.nodes[id].children.iter().flatten() {
                stack.push((*child, depth + 1));
            }
        }
        deepest
    }
}

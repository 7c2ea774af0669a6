//! A* pathfinding over the grid world
//!
//! Four-directional, unit step cost, Manhattan heuristic. Open-set ties on
//! `f` are broken by insertion order so a given world and pair of endpoints
//! always yields the same route. Parents are recorded in `came_from` as nodes
//! are relaxed; reconstruction never consults the open set.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use ahash::{AHashMap, AHashSet};

use crate::core::error::{Result, SimError};
use crate::core::types::GridPos;
use crate::world::GridWorld;

/// Node in the A* open set
#[derive(Debug, Clone, Copy)]
struct PathNode {
    pos: GridPos,
    f_cost: u32,
    /// Insertion counter, earlier wins among equal f
    seq: u64,
}

impl PartialEq for PathNode {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.seq == other.seq
    }
}

impl Eq for PathNode {}

impl Ord for PathNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PathNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a shortest walkable route from `start` to `goal`
///
/// The result excludes `start` and ends with `goal`. It is empty when the
/// endpoints coincide, either endpoint is out of bounds or blocked, or no
/// route exists. Callers must not read an empty path as arrival.
pub fn find_path(world: &GridWorld, start: GridPos, goal: GridPos) -> Vec<GridPos> {
    if start == goal || !world.is_walkable(start) || !world.is_walkable(goal) {
        return Vec::new();
    }

    let mut open_set = BinaryHeap::new();
    let mut came_from: AHashMap<GridPos, GridPos> = AHashMap::new();
    let mut g_scores: AHashMap<GridPos, u32> = AHashMap::new();
    let mut closed: AHashSet<GridPos> = AHashSet::new();
    let mut seq = 0u64;

    g_scores.insert(start, 0);
    open_set.push(PathNode {
        pos: start,
        f_cost: start.manhattan(&goal),
        seq,
    });

    while let Some(current) = open_set.pop() {
        if current.pos == goal {
            return reconstruct_path(&came_from, start, goal);
        }
        // Stale duplicate of an already expanded node
        if !closed.insert(current.pos) {
            continue;
        }

        let current_g = g_scores.get(&current.pos).copied().unwrap_or(u32::MAX);

        for neighbor in current.pos.neighbors() {
            if closed.contains(&neighbor) || !world.is_walkable(neighbor) {
                continue;
            }

            let tentative_g = current_g + 1;
            let neighbor_g = g_scores.get(&neighbor).copied().unwrap_or(u32::MAX);

            if tentative_g < neighbor_g {
                came_from.insert(neighbor, current.pos);
                g_scores.insert(neighbor, tentative_g);

                seq += 1;
                open_set.push(PathNode {
                    pos: neighbor,
                    f_cost: tentative_g + neighbor.manhattan(&goal),
                    seq,
                });
            }
        }
    }

    Vec::new()
}

/// Like `find_path`, but reports a missing route as `Unreachable`
///
/// Identical endpoints are a successful empty route.
pub fn try_find_path(world: &GridWorld, start: GridPos, goal: GridPos) -> Result<Vec<GridPos>> {
    if start == goal {
        return Ok(Vec::new());
    }
    let path = find_path(world, start, goal);
    if path.is_empty() {
        Err(SimError::Unreachable {
            from: start,
            to: goal,
        })
    } else {
        Ok(path)
    }
}

/// Walk parent links back from `goal`, dropping `start`
fn reconstruct_path(
    came_from: &AHashMap<GridPos, GridPos>,
    start: GridPos,
    goal: GridPos,
) -> Vec<GridPos> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}

/// Nearest walkable cell to `from` by breadth-first search
///
/// Searches through blocked cells as well, so a position buried inside a
/// footprint still finds the closest way out.
pub fn nearest_walkable(world: &GridWorld, from: GridPos) -> Option<GridPos> {
    if !world.in_bounds(from) {
        return None;
    }
    let mut seen: AHashSet<GridPos> = AHashSet::new();
    let mut queue = VecDeque::from([from]);
    seen.insert(from);
    while let Some(pos) = queue.pop_front() {
        if world.is_walkable(pos) {
            return Some(pos);
        }
        for n in pos.neighbors() {
            if world.in_bounds(n) && seen.insert(n) {
                queue.push_back(n);
            }
        }
    }
    None
}

/// True when every step is orthogonal, walkable and the route ends at `goal`
pub fn is_valid_path(world: &GridWorld, start: GridPos, goal: GridPos, path: &[GridPos]) -> bool {
    let Some(last) = path.last() else {
        return false;
    };
    if *last != goal {
        return false;
    }
    let mut prev = start;
    for &step in path {
        if !prev.is_adjacent(&step) || !world.is_walkable(step) {
            return false;
        }
        prev = step;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BuildingId;
    use crate::world::{Footprint, Occupant};
    use proptest::prelude::*;

    fn wall(world: &mut GridWorld, id: u32, pos: GridPos) {
        world
            .place(Occupant::Building(BuildingId(id)), &Footprint::cell(pos))
            .unwrap();
    }

    /// Reference shortest distance by plain breadth-first search
    fn bfs_distance(world: &GridWorld, start: GridPos, goal: GridPos) -> Option<usize> {
        if !world.is_walkable(start) || !world.is_walkable(goal) {
            return None;
        }
        let mut dist: AHashMap<GridPos, usize> = AHashMap::new();
        let mut queue = VecDeque::from([start]);
        dist.insert(start, 0);
        while let Some(pos) = queue.pop_front() {
            if pos == goal {
                return dist.get(&pos).copied();
            }
            let d = dist[&pos];
            for n in pos.neighbors() {
                if world.is_walkable(n) && !dist.contains_key(&n) {
                    dist.insert(n, d + 1);
                    queue.push_back(n);
                }
            }
        }
        None
    }

    #[test]
    fn test_pathfind_straight_line() {
        let world = GridWorld::flat(10, 10);
        let start = GridPos::new(0, 0);
        let goal = GridPos::new(5, 0);

        let path = find_path(&world, start, goal);

        assert_eq!(path.len(), 5);
        assert_eq!(path.first(), Some(&GridPos::new(1, 0)));
        assert_eq!(path.last(), Some(&goal));
        assert!(!path.contains(&start));
    }

    #[test]
    fn test_pathfind_around_obstacle() {
        let mut world = GridWorld::flat(10, 10);
        wall(&mut world, 1, GridPos::new(2, 0));
        wall(&mut world, 2, GridPos::new(2, 1));

        let start = GridPos::new(0, 0);
        let goal = GridPos::new(5, 0);
        let path = find_path(&world, start, goal);

        assert!(is_valid_path(&world, start, goal, &path));
        assert!(!path.contains(&GridPos::new(2, 0)));
        assert_eq!(path.len(), 9);
    }

    #[test]
    fn test_pathfind_no_path() {
        let mut world = GridWorld::flat(10, 10);
        let goal = GridPos::new(5, 5);
        for (i, n) in goal.neighbors().into_iter().enumerate() {
            wall(&mut world, i as u32 + 1, n);
        }

        let path = find_path(&world, GridPos::new(0, 0), goal);
        assert!(path.is_empty());
        assert!(matches!(
            try_find_path(&world, GridPos::new(0, 0), goal),
            Err(SimError::Unreachable { .. })
        ));
    }

    #[test]
    fn test_pathfind_same_start_goal() {
        let world = GridWorld::flat(10, 10);
        let p = GridPos::new(5, 5);
        assert!(find_path(&world, p, p).is_empty());
        assert_eq!(try_find_path(&world, p, p).unwrap(), Vec::new());
    }

    #[test]
    fn test_invalid_endpoints() {
        let mut world = GridWorld::flat(10, 10);
        wall(&mut world, 1, GridPos::new(3, 3));
        assert!(find_path(&world, GridPos::new(-1, 0), GridPos::new(2, 2)).is_empty());
        assert!(find_path(&world, GridPos::new(0, 0), GridPos::new(10, 2)).is_empty());
        assert!(find_path(&world, GridPos::new(0, 0), GridPos::new(3, 3)).is_empty());
    }

    #[test]
    fn test_pathfind_is_deterministic() {
        let mut world = GridWorld::flat(20, 20);
        for y in 2..15 {
            wall(&mut world, y as u32, GridPos::new(8, y));
        }
        let a = find_path(&world, GridPos::new(1, 10), GridPos::new(18, 9));
        let b = find_path(&world, GridPos::new(1, 10), GridPos::new(18, 9));
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn test_pathfind_maze() {
        // Serpentine corridor forces a long detour
        let mut world = GridWorld::flat(7, 7);
        let mut id = 0;
        for x in 0..6 {
            id += 1;
            wall(&mut world, id, GridPos::new(x, 1));
        }
        for x in 1..7 {
            id += 1;
            wall(&mut world, id, GridPos::new(x, 3));
        }
        for x in 0..6 {
            id += 1;
            wall(&mut world, id, GridPos::new(x, 5));
        }
        let start = GridPos::new(0, 0);
        let goal = GridPos::new(0, 6);
        let path = find_path(&world, start, goal);
        assert!(is_valid_path(&world, start, goal, &path));
        assert_eq!(Some(path.len()), bfs_distance(&world, start, goal));
    }

    #[test]
    fn test_nearest_walkable_escapes_footprint() {
        let mut world = GridWorld::flat(10, 10);
        world
            .place(
                Occupant::Building(BuildingId(1)),
                &Footprint::new(GridPos::new(2, 2), 3, 3),
            )
            .unwrap();
        let exit = nearest_walkable(&world, GridPos::new(3, 3)).unwrap();
        assert!(world.is_walkable(exit));
        assert_eq!(GridPos::new(3, 3).manhattan(&exit), 2);
        assert_eq!(nearest_walkable(&world, GridPos::new(0, 0)), Some(GridPos::new(0, 0)));
        assert_eq!(nearest_walkable(&world, GridPos::new(20, 0)), None);
    }

    fn small_world(blocked: &[bool]) -> GridWorld {
        let mut world = GridWorld::flat(5, 5);
        for (i, is_blocked) in blocked.iter().enumerate() {
            if *is_blocked {
                let pos = GridPos::new(i as i32 % 5, i as i32 / 5);
                wall(&mut world, i as u32 + 1, pos);
            }
        }
        world
    }

    proptest! {
        #[test]
        fn prop_path_is_valid_and_optimal(
            blocked in proptest::collection::vec(proptest::bool::weighted(0.3), 25),
            sx in 0i32..5, sy in 0i32..5, gx in 0i32..5, gy in 0i32..5,
        ) {
            let world = small_world(&blocked);
            let start = GridPos::new(sx, sy);
            let goal = GridPos::new(gx, gy);
            let path = find_path(&world, start, goal);

            match bfs_distance(&world, start, goal) {
                Some(0) => prop_assert!(path.is_empty()),
                Some(d) => {
                    prop_assert!(is_valid_path(&world, start, goal, &path));
                    prop_assert_eq!(path.len(), d);
                }
                None => prop_assert!(path.is_empty()),
            }
        }

        #[test]
        fn prop_path_repeats_exactly(
            blocked in proptest::collection::vec(proptest::bool::weighted(0.25), 25),
            gx in 0i32..5, gy in 0i32..5,
        ) {
            let world = small_world(&blocked);
            let start = GridPos::new(0, 0);
            let goal = GridPos::new(gx, gy);
            prop_assert_eq!(find_path(&world, start, goal), find_path(&world, start, goal));
        }
    }
}

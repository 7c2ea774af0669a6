//! Generic dense grid keyed by cell coordinate

use crate::core::types::GridPos;

/// Row-major 2D grid with bounds-checked access
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Grid filled with `value`; non-positive dimensions yield an empty grid
    pub fn filled(width: i32, height: i32, value: T) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            data: vec![value; (width * height) as usize],
        }
    }
}

impl<T> Grid<T> {
    /// Build a grid by evaluating `f` for every cell in row-major order
    pub fn from_fn(width: i32, height: i32, mut f: impl FnMut(GridPos) -> T) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(GridPos::new(x, y)));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    #[inline]
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y * self.width + pos.x) as usize)
    }

    #[inline]
    pub fn get(&self, pos: GridPos) -> Option<&T> {
        self.index_of(pos).map(|i| &self.data[i])
    }

    #[inline]
    pub fn get_mut(&mut self, pos: GridPos) -> Option<&mut T> {
        self.index_of(pos).map(move |i| &mut self.data[i])
    }

    /// Store `value` at `pos`; returns false when out of bounds
    pub fn set(&mut self, pos: GridPos, value: T) -> bool {
        match self.get_mut(pos) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridPos, &T)> + '_ {
        let width = self.width;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, v)| (GridPos::new(i as i32 % width, i as i32 / width), v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

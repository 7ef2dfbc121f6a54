// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! `Point`: an ordered tuple of extended reals (C1). Coordinates are either
//! a finite `f64` or "undefined" (`None`); undefined models both "not yet
//! set" and "fixed out of the subproblem".

use std::hash::{Hash, Hasher};
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One coordinate: a finite value, or undefined.
pub type Coord = Option<f64>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Point {
    coords: Vec<Coord>,
}

impl Point {
    pub fn new(coords: Vec<Coord>) -> Self {
        Point { coords }
    }

    pub fn undefined(n: usize) -> Self {
        Point { coords: vec![None; n] }
    }

    pub fn from_values(values: &[f64]) -> Self {
        Point { coords: values.iter().copied().map(Some).collect() }
    }

    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    pub fn get(&self, i: usize) -> Coord {
        self.coords[i]
    }

    pub fn set(&mut self, i: usize, v: Coord) {
        self.coords[i] = v;
    }

    pub fn as_slice(&self) -> &[Coord] {
        &self.coords
    }

    /// Returns the defined coordinates as plain `f64`, panicking if any
    /// coordinate is undefined — used once a point is known fully set
    /// (e.g. right before handing it to the black box).
    pub fn values(&self) -> Vec<f64> {
        self.coords
            .iter()
            .map(|c| c.expect("point has an undefined coordinate"))
            .collect()
    }

    pub fn is_fully_defined(&self) -> bool {
        self.coords.iter().all(|c| c.is_some())
    }

    /// Coordinate-wise sum; undefined coordinates stay undefined in the
    /// result (they represent fixed-out variables, not zero).
    pub fn add_direction(&self, d: &[f64]) -> Point {
        assert_eq!(self.coords.len(), d.len());
        let coords = self
            .coords
            .iter()
            .zip(d.iter())
            .map(|(c, di)| c.map(|v| v + di))
            .collect();
        Point { coords }
    }
}

/// Equality is coordinate-wise exact equality on defined entries, per the
/// data model: two points differing only in which coordinates are
/// undefined are not equal.
impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.coords.len() == other.coords.len()
            && self
                .coords
                .iter()
                .zip(other.coords.iter())
                .all(|(a, b)| match (a, b) {
                    (Some(x), Some(y)) => x.to_bits() == y.to_bits(),
                    (None, None) => true,
                    _ => false,
                })
    }
}
impl Eq for Point {}

/// Points are used as Cache keys, so they need a stable hash consistent
/// with the bitwise-exact equality above.
impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in &self.coords {
            match c {
                Some(v) => {
                    1u8.hash(state);
                    v.to_bits().hash(state);
                }
                None => 0u8.hash(state),
            }
        }
    }
}

impl Index<usize> for Point {
    type Output = Coord;
    fn index(&self, i: usize) -> &Coord {
        &self.coords[i]
    }
}
impl IndexMut<usize> for Point {
    fn index_mut(&mut self, i: usize) -> &mut Coord {
        &mut self.coords[i]
    }
}

#[cfg(test)]
mod test_point {
    use super::*;

    #[test]
    fn equality_is_coordinate_wise_exact() {
        let a = Point::from_values(&[1.0, 2.0]);
        let b = Point::from_values(&[1.0, 2.0]);
        let c = Point::from_values(&[1.0, 2.0000001]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn undefined_coordinate_breaks_equality_with_defined() {
        let mut a = Point::from_values(&[1.0, 2.0]);
        let b = Point::from_values(&[1.0, 2.0]);
        a.set(1, None);
        assert_ne!(a, b);
    }

    #[test]
    fn add_direction_preserves_undefined() {
        let mut p = Point::from_values(&[1.0, 2.0]);
        p.set(1, None);
        let moved = p.add_direction(&[1.0, 5.0]);
        assert_eq!(moved.get(0), Some(2.0));
        assert_eq!(moved.get(1), None);
    }
}

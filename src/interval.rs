// Copyright 2023 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

/// Closed range `[a, b]` along one axis.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Interval {
    pub a: f32,
    pub b: f32,
}

impl Interval {
    pub const fn new(a: f32, b: f32) -> Self {
        Self { a, b }
    }

    /// Smallest interval containing all three values.
    pub fn of3(a: f32, b: f32, c: f32) -> Self {
        Self::new(a.min(b).min(c), a.max(b).max(c))
    }

    pub fn empty(&self) -> bool {
        self.a > self.b
    }

    /// True when the interiors overlap. Intervals that only touch at an
    /// endpoint do not intersect.
    pub fn intersects(&self, other: Self) -> bool {
        self.b > other.a && self.a < other.b
    }

    /// Widens the interval by `d` on both ends.
    pub fn fatten(&self, d: f32) -> Self {
        Self::new(self.a - d, self.b + d)
    }

    pub fn length(&self) -> f32 {
        self.b - self.a
    }
}

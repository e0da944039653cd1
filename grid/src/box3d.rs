//! Integer boxes in (column, row, band) space.
//!
//! A [Box3D] is half open: `min` is inside, `max` is one past the last
//! position on each axis. Iteration visits `x` fastest, then `y`, then
//! `z`, which is also the memory order of a band-major raster buffer.

use crate::Size;
use num_traits::PrimInt;

/// A (column, row, band) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Voxel<T = i32> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Voxel<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Box3D<T = i32> {
    min: Voxel<T>,
    max: Voxel<T>,
}

impl<T: PrimInt> Box3D<T> {
    /// Returns the box `[min, max)`. An axis where `max < min` is
    /// collapsed to empty.
    pub fn new(min: Voxel<T>, max: Voxel<T>) -> Self {
        let max = Voxel {
            x: max.x.max(min.x),
            y: max.y.max(min.y),
            z: max.z.max(min.z),
        };
        Self { min, max }
    }

    /// Returns the box covering every cell of `size`, or `None` if
    /// `size` does not fit in `T`.
    pub fn from_size(size: Size) -> Option<Self> {
        Some(Self {
            min: Voxel::new(T::zero(), T::zero(), T::zero()),
            max: Voxel::new(
                T::from(size.xsize)?,
                T::from(size.ysize)?,
                T::from(size.zsize)?,
            ),
        })
    }

    pub fn min_corner(&self) -> Voxel<T> {
        self.min
    }

    /// One past the last position.
    pub fn max_corner(&self) -> Voxel<T> {
        self.max
    }

    pub fn xlength(&self) -> usize {
        length(self.min.x, self.max.x)
    }

    pub fn ylength(&self) -> usize {
        length(self.min.y, self.max.y)
    }

    pub fn zlength(&self) -> usize {
        length(self.min.z, self.max.z)
    }

    /// Number of positions in this box.
    pub fn volume(&self) -> usize {
        self.xlength() * self.ylength() * self.zlength()
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    pub fn contains(&self, v: Voxel<T>) -> bool {
        self.min.x <= v.x
            && v.x < self.max.x
            && self.min.y <= v.y
            && v.y < self.max.y
            && self.min.z <= v.z
            && v.z < self.max.z
    }

    /// Offset of `v` in iteration order, if `v` is inside this box.
    pub fn linear_index(&self, v: Voxel<T>) -> Option<usize> {
        if !self.contains(v) {
            return None;
        }
        let x = length(self.min.x, v.x);
        let y = length(self.min.y, v.y);
        let z = length(self.min.z, v.z);
        Some((z * self.ylength() + y) * self.xlength() + x)
    }

    /// Returns an iterator visiting every position exactly once.
    pub fn iter(&self) -> BoxIter<T> {
        BoxIter {
            bounds: *self,
            cursor: self.min,
            remaining: self.volume(),
        }
    }

    /// Splits this box into at most about `parts` disjoint sub-boxes.
    ///
    /// Sub-boxes are returned in iteration order and tile the box
    /// without gaps or overlap. Each covers full rows of a single band,
    /// so it maps onto one contiguous run of a band-major buffer.
    pub fn partition(&self, parts: usize) -> Vec<Self> {
        let (ylen, zlen) = (self.ylength(), self.zlength());
        if self.is_empty() {
            return Vec::new();
        }
        let bands_per_layer = parts.max(1).div_ceil(zlen).clamp(1, ylen);
        let mut boxes = Vec::with_capacity(zlen * bands_per_layer);
        let mut z = self.min.z;
        while z < self.max.z {
            for band in 0..bands_per_layer {
                let (y0, y1) = (
                    ylen * band / bands_per_layer,
                    ylen * (band + 1) / bands_per_layer,
                );
                boxes.push(Self {
                    min: Voxel::new(self.min.x, self.min.y + cast(y0), z),
                    max: Voxel::new(self.max.x, self.min.y + cast(y1), z + T::one()),
                });
            }
            z = z + T::one();
        }
        boxes
    }
}

impl<T: PrimInt> IntoIterator for &Box3D<T> {
    type Item = Voxel<T>;
    type IntoIter = BoxIter<T>;

    fn into_iter(self) -> BoxIter<T> {
        self.iter()
    }
}

/// Iterator over the positions of a [Box3D].
#[derive(Debug, Clone)]
pub struct BoxIter<T = i32> {
    bounds: Box3D<T>,
    cursor: Voxel<T>,
    remaining: usize,
}

impl<T: PrimInt> Iterator for BoxIter<T> {
    type Item = Voxel<T>;

    fn next(&mut self) -> Option<Voxel<T>> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.cursor;
        self.remaining -= 1;
        self.cursor.x = self.cursor.x + T::one();
        if self.cursor.x == self.bounds.max.x {
            self.cursor.x = self.bounds.min.x;
            self.cursor.y = self.cursor.y + T::one();
            if self.cursor.y == self.bounds.max.y {
                self.cursor.y = self.bounds.min.y;
                self.cursor.z = self.cursor.z + T::one();
            }
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: PrimInt> ExactSizeIterator for BoxIter<T> {
    fn len(&self) -> usize {
        self.remaining
    }
}

fn length<T: PrimInt>(lo: T, hi: T) -> usize {
    if hi <= lo {
        0
    } else {
        (hi - lo).to_usize().unwrap_or(0)
    }
}

/// Converts a length already bounded by a box extent back into `T`.
fn cast<T: PrimInt>(v: usize) -> T {
    T::from(v).unwrap_or_else(T::max_value)
}

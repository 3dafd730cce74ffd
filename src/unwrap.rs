//! 2-D phase unwrapping
//!
//! [QualityGuided] follows the unwrapping path from the most reliable sample to the
//! least reliable one, reliability being measured by the wrapped second differences
//! of the phase (M. A. Herráez et al., Applied Optics 41(35), 2002).

use ndarray::Array2;
use std::{cmp::Ordering, collections::BinaryHeap, f64::consts::PI};

/// Wraps a phase into `(-π, π]`
pub fn wrap(phase: f64) -> f64 {
    let wrapped = (phase + PI).rem_euclid(2. * PI) - PI;
    if wrapped == -PI {
        PI
    } else {
        wrapped
    }
}

/// Continuous phase from a wrapped phase
pub trait PhaseUnwrapper {
    fn unwrap(&self, wrapped: &Array2<f64>) -> Array2<f64>;
}

/// Quality-guided path-following unwrapper
#[derive(Debug, Default, Clone, Copy)]
pub struct QualityGuided;

struct Pixel {
    quality: f64,
    index: usize,
    from: usize,
}
impl PartialEq for Pixel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Pixel {}
impl PartialOrd for Pixel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Pixel {
    // highest quality first, then lowest index
    fn cmp(&self, other: &Self) -> Ordering {
        self.quality
            .total_cmp(&other.quality)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl QualityGuided {
    /// Reliability map, border samples get the lowest reliability
    pub fn quality(wrapped: &Array2<f64>) -> Array2<f64> {
        let (height, width) = wrapped.dim();
        Array2::from_shape_fn((height, width), |(i, j)| {
            if i == 0 || j == 0 || i + 1 == height || j + 1 == width {
                return f64::NEG_INFINITY;
            }
            let p = wrapped[[i, j]];
            let second = |a: f64, b: f64| wrap(a - p) - wrap(p - b);
            let h = second(wrapped[[i, j - 1]], wrapped[[i, j + 1]]);
            let v = second(wrapped[[i - 1, j]], wrapped[[i + 1, j]]);
            let d1 = second(wrapped[[i - 1, j - 1]], wrapped[[i + 1, j + 1]]);
            let d2 = second(wrapped[[i - 1, j + 1]], wrapped[[i + 1, j - 1]]);
            -(h * h + v * v + d1 * d1 + d2 * d2)
        })
    }
}

impl PhaseUnwrapper for QualityGuided {
    fn unwrap(&self, wrapped: &Array2<f64>) -> Array2<f64> {
        let (height, width) = wrapped.dim();
        let n = height * width;
        if n == 0 {
            return wrapped.clone();
        }
        let phase: Vec<f64> = wrapped.iter().copied().collect();
        let quality: Vec<f64> = Self::quality(wrapped).iter().copied().collect();
        let neighbors = |k: usize| {
            let (i, j) = (k / width, k % width);
            [
                (i > 0).then(|| k - width),
                (i + 1 < height).then(|| k + width),
                (j > 0).then(|| k - 1),
                (j + 1 < width).then(|| k + 1),
            ]
        };

        let start = (0..n)
            .map(|index| Pixel {
                quality: quality[index],
                index,
                from: index,
            })
            .max()
            .map_or(0, |p| p.index);
        let mut unwrapped = phase.clone();
        let mut visited = vec![false; n];
        let mut heap = BinaryHeap::new();
        heap.push(Pixel {
            quality: quality[start],
            index: start,
            from: start,
        });
        while let Some(Pixel { index, from, .. }) = heap.pop() {
            if visited[index] {
                continue;
            }
            visited[index] = true;
            if from != index {
                unwrapped[index] = unwrapped[from] + wrap(phase[index] - phase[from]);
            }
            for k in neighbors(index).into_iter().flatten() {
                if !visited[k] {
                    heap.push(Pixel {
                        quality: quality[k],
                        index: k,
                        from: index,
                    });
                }
            }
        }
        Array2::from_shape_vec((height, width), unwrapped).unwrap_or_else(|_| wrapped.clone())
    }
}

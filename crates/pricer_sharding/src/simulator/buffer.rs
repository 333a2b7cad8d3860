//! Full-path storage for memory-pressure runs.
//!
//! Paths are stored row-major: `data[path * steps + step]` holds the price
//! after `step + 1` steps. The initial spot is not stored.

use std::mem::size_of;

use crate::error::{Result, SimulationError};

/// Row-major buffer of simulated prices for one shard.
#[derive(Clone, Debug, PartialEq)]
pub struct PathBuffer {
    paths: usize,
    steps: usize,
    data: Vec<f64>,
}

impl PathBuffer {
    /// Bytes needed for `paths × steps` prices, computed without overflow.
    #[inline]
    pub fn required_bytes(paths: usize, steps: usize) -> u128 {
        paths as u128 * steps as u128 * size_of::<f64>() as u128
    }

    /// Allocates a zeroed buffer for one shard.
    ///
    /// The allocation is fallible: an element count that overflows, a size
    /// above `limit_bytes`, or an allocator refusal all yield
    /// `ResourceExhausted` carrying the shard shape.
    ///
    /// # Errors
    ///
    /// `ResourceExhausted` as described above.
    pub fn allocate(
        shard_index: usize,
        paths: usize,
        steps: usize,
        limit_bytes: Option<usize>,
    ) -> Result<Self> {
        let requested_bytes = Self::required_bytes(paths, steps);
        let exhausted = || SimulationError::ResourceExhausted {
            shard_index,
            paths_in_shard: paths,
            steps_per_path: steps,
            requested_bytes,
        };

        if let Some(limit) = limit_bytes {
            if requested_bytes > limit as u128 {
                return Err(exhausted());
            }
        }

        let len = paths
            .checked_mul(steps)
            .filter(|len| len.checked_mul(size_of::<f64>()).is_some())
            .ok_or_else(exhausted)?;

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| exhausted())?;
        data.resize(len, 0.0);

        Ok(Self { paths, steps, data })
    }

    /// Number of paths (rows).
    #[inline]
    pub fn paths(&self) -> usize {
        self.paths
    }

    /// Number of steps per path (columns).
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Size of the stored prices in bytes.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len() * size_of::<f64>()
    }

    /// Prices of one path.
    #[inline]
    pub fn row(&self, path: usize) -> &[f64] {
        let start = path * self.steps;
        &self.data[start..start + self.steps]
    }

    /// Mutable prices of one path.
    #[inline]
    pub fn row_mut(&mut self, path: usize) -> &mut [f64] {
        let start = path * self.steps;
        &mut self.data[start..start + self.steps]
    }

    /// All prices, row-major.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_and_index() {
        let mut buffer = PathBuffer::allocate(0, 3, 4, None).unwrap();
        assert_eq!(buffer.paths(), 3);
        assert_eq!(buffer.steps(), 4);
        assert_eq!(buffer.byte_len(), 96);

        buffer.row_mut(1).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buffer.row(1), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(&buffer.as_slice()[4..8], &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buffer.row(0), &[0.0; 4]);
    }

    #[test]
    fn test_limit_exceeded() {
        let err = PathBuffer::allocate(3, 1_000, 128, Some(1_000_000)).unwrap_err();
        assert_eq!(
            err,
            SimulationError::ResourceExhausted {
                shard_index: 3,
                paths_in_shard: 1_000,
                steps_per_path: 128,
                requested_bytes: 1_024_000,
            }
        );
    }

    #[test]
    fn test_element_count_overflow() {
        let err = PathBuffer::allocate(1, usize::MAX, 2, None).unwrap_err();
        match err {
            SimulationError::ResourceExhausted {
                requested_bytes, ..
            } => assert_eq!(requested_bytes, usize::MAX as u128 * 16),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_allocator_refusal() {
        // 2^60 elements: the count fits in usize but no allocator can serve it
        let err = PathBuffer::allocate(0, 1 << 40, 1 << 20, None).unwrap_err();
        assert!(matches!(err, SimulationError::ResourceExhausted { .. }));
    }
}

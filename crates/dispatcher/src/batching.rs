//! Capacity-sized slicing shared by both dispatchers

use std::ops::Range;

use crate::error::BatchingError;

/// Ordered, contiguous ranges covering `0..len`, each at most `capacity` long.
///
/// An empty input yields nothing for any capacity. A zero capacity on a
/// non-empty input is rejected up front so no caller can spin on a zero step.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    len: usize,
    size: usize,
    next: usize,
}

impl BatchPlan {
    /// Plan slices for `len` items under `capacity`
    ///
    /// # Errors
    /// [`BatchingError::ZeroCapacity`] when `capacity == 0 && len > 0`
    pub fn new(len: usize, capacity: u64) -> Result<Self, BatchingError> {
        let size = usize::try_from(capacity).unwrap_or(usize::MAX).min(len);
        if size == 0 && len > 0 {
            return Err(BatchingError::ZeroCapacity { len });
        }
        Ok(Self { len, size, next: 0 })
    }

    /// Length of every slice but possibly the last
    pub fn batch_size(&self) -> usize {
        self.size
    }

    /// `ceil(len / capacity)`, independent of iteration progress
    pub fn batch_count(&self) -> usize {
        if self.size == 0 {
            0
        } else {
            self.len.div_ceil(self.size)
        }
    }
}

impl Iterator for BatchPlan {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.next >= self.len {
            return None;
        }
        let start = self.next;
        let end = start.saturating_add(self.size).min(self.len);
        self.next = end;
        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.size == 0 {
            0
        } else {
            (self.len - self.next).div_ceil(self.size)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BatchPlan {}

/// Borrow `items` as capacity-sized slices, in order
///
/// # Errors
/// [`BatchingError::ZeroCapacity`] when `capacity == 0` and `items` is non-empty
pub fn slices<T>(
    items: &[T],
    capacity: u64,
) -> Result<impl ExactSizeIterator<Item = &[T]> + '_, BatchingError> {
    let plan = BatchPlan::new(items.len(), capacity)?;
    Ok(plan.map(move |range| &items[range]))
}

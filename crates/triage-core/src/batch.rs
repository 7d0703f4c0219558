//! Fixed-size batching of pending work.

use std::slice::Chunks;

use crate::CoreError;

/// Split `items` into consecutive groups of at most `size` elements.
///
/// Order is preserved and every element appears in exactly one group; only
/// the last group may be shorter. Groups are produced lazily.
pub fn chunk<T>(items: &[T], size: usize) -> Result<Chunks<'_, T>, CoreError> {
    if size == 0 {
        return Err(CoreError::Config("batch size must be positive".into()));
    }
    Ok(items.chunks(size))
}

/// Number of batches needed for `len` items at `size` per batch.
pub fn batch_count(len: usize, size: usize) -> Result<usize, CoreError> {
    if size == 0 {
        return Err(CoreError::Config("batch size must be positive".into()));
    }
    Ok(len.div_ceil(size))
}

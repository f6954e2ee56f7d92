//! Splits pending work into bounded request batches.

use crate::error::{Result, TranslateError};

/// Default number of strings sent per request
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Lazily split `items` into consecutive batches of at most `size` items.
///
/// The last batch may be shorter. Empty input yields no batches. A zero size
/// is rejected rather than looping forever.
pub fn batches<T>(items: &[T], size: usize) -> Result<std::slice::Chunks<'_, T>> {
    if size == 0 {
        return Err(TranslateError::Configuration(
            "Batch size must be at least 1".to_string(),
        ));
    }
    Ok(items.chunks(size))
}

/// Number of batches `batches` will produce for `len` items.
pub fn batch_count(len: usize, size: usize) -> usize {
    if size == 0 {
        return 0;
    }
    len.div_ceil(size)
}

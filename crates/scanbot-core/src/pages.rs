//! Page split/merge primitives.

use std::io::Write;

use crate::error::Result;

/// Low-level document page operations used by duplex reassembly.
///
/// Implementations are synchronous and CPU-bound; callers run them on the
/// blocking thread pool.
pub trait PageEngine: Send + Sync {
    /// Splits a document into single-page documents, in page order.
    fn split(&self, document: &[u8]) -> Result<Vec<Vec<u8>>>;

    /// Concatenates single-page documents, in the given order, into `out`.
    fn merge(&self, pages: &[Vec<u8>], out: &mut dyn Write) -> Result<()>;
}

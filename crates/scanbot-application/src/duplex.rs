//! Duplex merge engine.
//!
//! Reassembles two single-sided feeder passes into physical page order.
//! The merged document is produced on the blocking pool and streamed to the
//! caller through a bounded channel, so delivery can start before the whole
//! output exists.

use bytes::Bytes;
use scanbot_core::error::{Result, ScanBotError};
use scanbot_core::pages::PageEngine;
use scanbot_core::scanner::{DocumentStream, read_document};
use std::io::{self, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

/// Number of in-flight chunks between the merge writer and the reader.
pub const DEFAULT_PIPE_CAPACITY: usize = 16;

pub struct DuplexMerger {
    engine: Arc<dyn PageEngine>,
    pipe_capacity: usize,
}

impl DuplexMerger {
    pub fn new(engine: Arc<dyn PageEngine>) -> Self {
        Self {
            engine,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }

    /// Merges a front pass and a rear pass into `F0, R[n-1], F1, ..., F[n-1], R0`.
    ///
    /// Fails with [`ScanBotError::PageCountMismatch`] before producing any
    /// output when either side cannot be split, the page counts differ, or a
    /// side is empty. Failures while writing the merged document surface as
    /// read errors on the returned stream.
    pub async fn merge(&self, front: DocumentStream, rear: DocumentStream) -> Result<DocumentStream> {
        let front = read_document(front).await?;
        let rear = read_document(rear).await?;

        let engine = self.engine.clone();
        let pages = tokio::task::spawn_blocking(move || split_sides(engine.as_ref(), &front, &rear))
            .await
            .map_err(|err| ScanBotError::page_engine(format!("split task failed: {err}")))??;

        tracing::info!("[Duplex] Merging {} pages", pages.len());

        let (tx, rx) = mpsc::channel(self.pipe_capacity);
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || {
            let mut writer = ChannelWriter { tx };
            if let Err(err) = engine.merge(&pages, &mut writer) {
                tracing::error!("[Duplex] Merge failed: {}", err);
                // The reader may already be gone.
                let _ = writer.tx.blocking_send(Err(io::Error::other(err.to_string())));
            }
        });

        let chunks = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        });
        Ok(Box::pin(StreamReader::new(chunks)))
    }
}

/// Interleaves front pages in order with rear pages in reverse order.
///
/// Callers guarantee both sides have the same length.
pub fn interleave<T>(front: Vec<T>, rear: Vec<T>) -> Vec<T> {
    front
        .into_iter()
        .zip(rear.into_iter().rev())
        .flat_map(|(front, rear)| [front, rear])
        .collect()
}

fn split_sides(engine: &dyn PageEngine, front: &[u8], rear: &[u8]) -> Result<Vec<Vec<u8>>> {
    let front = engine.split(front);
    let rear = engine.split(rear);

    match (front, rear) {
        (Ok(front), Ok(rear)) if front.len() == rear.len() && !front.is_empty() => {
            Ok(interleave(front, rear))
        }
        (front, rear) => {
            if let Err(err) = &front {
                tracing::warn!("[Duplex] Failed to split front scan: {}", err);
            }
            if let Err(err) = &rear {
                tracing::warn!("[Duplex] Failed to split rear scan: {}", err);
            }
            Err(ScanBotError::PageCountMismatch {
                front: front.map_or(0, |pages| pages.len()),
                rear: rear.map_or(0, |pages| pages.len()),
            })
        }
    }
}

/// Blocking writer half of the merge pipe.
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Bytes>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .blocking_send(Ok(Bytes::copy_from_slice(buf)))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "merged stream reader dropped"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanbot_core::scanner::stream_from_bytes;
    use tokio::io::AsyncReadExt;

    /// One page per line; a document containing "corrupt" cannot be split.
    struct LineEngine {
        fail_merge: bool,
    }

    impl PageEngine for LineEngine {
        fn split(&self, document: &[u8]) -> Result<Vec<Vec<u8>>> {
            let text = String::from_utf8_lossy(document);
            if text.contains("corrupt") {
                return Err(ScanBotError::page_engine("not a document"));
            }
            Ok(text
                .split('\n')
                .filter(|line| !line.is_empty())
                .map(|line| line.as_bytes().to_vec())
                .collect())
        }

        fn merge(&self, pages: &[Vec<u8>], out: &mut dyn Write) -> Result<()> {
            for (index, page) in pages.iter().enumerate() {
                if self.fail_merge && index == 1 {
                    return Err(ScanBotError::page_engine("disk full"));
                }
                out.write_all(page)?;
                out.write_all(b"\n")?;
            }
            Ok(())
        }
    }

    fn merger(fail_merge: bool) -> DuplexMerger {
        DuplexMerger::new(Arc::new(LineEngine { fail_merge })).with_pipe_capacity(1)
    }

    fn doc(text: &str) -> DocumentStream {
        stream_from_bytes(text.as_bytes().to_vec())
    }

    #[test]
    fn test_interleave_reverses_rear_side() {
        assert_eq!(
            interleave(vec!["F0", "F1", "F2"], vec!["R0", "R1", "R2"]),
            vec!["F0", "R2", "F1", "R1", "F2", "R0"]
        );
        assert_eq!(interleave(vec![1], vec![2]), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_merge_streams_reordered_pages() {
        let merged = merger(false)
            .merge(doc("F0\nF1\nF2\n"), doc("R0\nR1\nR2\n"))
            .await
            .unwrap();

        let bytes = read_document(merged).await.unwrap();
        assert_eq!(bytes, b"F0\nR2\nF1\nR1\nF2\nR0\n");
    }

    #[tokio::test]
    async fn test_merge_rejects_unequal_sides() {
        let err = merger(false)
            .merge(doc("F0\nF1\nF2\n"), doc("R0\nR1\n"))
            .await
            .err()
            .unwrap();

        assert_eq!(err, ScanBotError::PageCountMismatch { front: 3, rear: 2 });
    }

    #[tokio::test]
    async fn test_merge_rejects_empty_sides() {
        let err = merger(false).merge(doc(""), doc("")).await.err().unwrap();
        assert!(err.is_page_count_mismatch());
    }

    #[tokio::test]
    async fn test_unsplittable_side_is_a_mismatch() {
        let err = merger(false)
            .merge(doc("F0\n"), doc("corrupt"))
            .await
            .err()
            .unwrap();

        assert_eq!(err, ScanBotError::PageCountMismatch { front: 1, rear: 0 });
    }

    #[tokio::test]
    async fn test_writer_failure_reaches_reader() {
        let mut merged = merger(true)
            .merge(doc("F0\nF1\n"), doc("R0\nR1\n"))
            .await
            .unwrap();

        let mut buffer = Vec::new();
        let err = merged.read_to_end(&mut buffer).await.unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }
}

//! Byte-counting wrapper for request bodies.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;

/// Callback receiving whole-percent progress.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

pin_project! {
    /// Reports percent of `total` bytes yielded so far, at most once per
    /// distinct value.
    ///
    /// Reported progress tops out at 99: the last percent belongs to the
    /// server acknowledging the upload.
    pub struct ProgressStream<S> {
        #[pin]
        inner: S,
        sent: u64,
        total: u64,
        last: Option<u8>,
        report: ProgressFn,
    }
}

impl<S> ProgressStream<S> {
    /// Wraps `inner`, which is expected to yield `total` bytes.
    pub fn new(inner: S, total: u64, report: ProgressFn) -> Self {
        Self {
            inner,
            sent: 0,
            total,
            last: None,
            report,
        }
    }
}

impl<S> Stream for ProgressStream<S>
where
    S: Stream<Item = io::Result<Bytes>>,
{
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let item = ready!(this.inner.poll_next(cx));

        if let Some(Ok(chunk)) = &item {
            *this.sent += chunk.len() as u64;
            let pct = percent(*this.sent, *this.total);
            if *this.last != Some(pct) {
                *this.last = Some(pct);
                (this.report)(pct);
            }
        }

        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 99;
    }
    let pct = sent.saturating_mul(100) / total;
    u8::try_from(pct.min(99)).unwrap_or(99)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::{StreamExt, stream};

    use super::*;

    #[tokio::test]
    async fn test_reports_distinct_percentages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let chunks = vec![
            Ok(Bytes::from_static(&[0; 25])),
            Ok(Bytes::from_static(&[0; 25])),
            Ok(Bytes::from_static(&[0; 0])),
            Ok(Bytes::from_static(&[0; 50])),
        ];
        let stream = ProgressStream::new(
            stream::iter(chunks),
            100,
            Arc::new(move |pct| sink.lock().unwrap().push(pct)),
        );

        let total: usize = stream.map(|c| c.unwrap().len()).collect::<Vec<_>>().await.iter().sum();
        assert_eq!(total, 100);
        assert_eq!(*seen.lock().unwrap(), vec![25, 50, 99]);
    }

    #[test]
    fn test_percent_edges() {
        assert_eq!(percent(0, 0), 99);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(10, 5), 99);
    }
}

//! Single byte-range requests (`Range: bytes=...`).

/// An inclusive byte range within a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset, inclusive.
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered, never zero.
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// The `Content-Range` header value for a blob of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// How a request's `Range` header applies to a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No usable range; serve the whole body.
    Full,
    /// Serve exactly this range.
    Partial(ByteRange),
    /// The range lies outside the blob.
    Unsatisfiable,
}

impl RangeRequest {
    /// Interpret a `Range` header against a blob of `total` bytes.
    ///
    /// Only a single `bytes=` range is honored. A header that is malformed
    /// or asks for several ranges is ignored and the full body is served.
    pub fn parse(header: Option<&str>, total: u64) -> Self {
        let Some(spec) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return Self::Full;
        };
        if spec.contains(',') {
            return Self::Full;
        }
        let Some((start_part, end_part)) = spec.split_once('-') else {
            return Self::Full;
        };
        let (start_part, end_part) = (start_part.trim(), end_part.trim());

        if start_part.is_empty() {
            // Suffix form: the last N bytes.
            let Ok(suffix) = end_part.parse::<u64>() else {
                return Self::Full;
            };
            if suffix == 0 || total == 0 {
                return Self::Unsatisfiable;
            }
            return Self::Partial(ByteRange {
                start: total.saturating_sub(suffix),
                end: total - 1,
            });
        }

        let Ok(start) = start_part.parse::<u64>() else {
            return Self::Full;
        };
        let end = if end_part.is_empty() {
            None
        } else {
            match end_part.parse::<u64>() {
                Ok(end) => Some(end),
                Err(_) => return Self::Full,
            }
        };

        if matches!(end, Some(end) if end < start) {
            return Self::Full;
        }
        if start >= total {
            return Self::Unsatisfiable;
        }

        let last = total - 1;
        Self::Partial(ByteRange {
            start,
            end: end.map_or(last, |end| end.min(last)),
        })
    }
}

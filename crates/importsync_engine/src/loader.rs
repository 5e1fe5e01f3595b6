//! Buffered loading of ordered records from an external store.
//!
//! A [`PageSource`] produces records ordered by natural key, one bounded
//! page at a time, restarting each query strictly after the last key seen
//! ("keyset pagination"). [`BufferedLoader`] turns such a source into a
//! lazy record stream suitable for the merge chunker, re-querying only when
//! a full page was consumed.

use tracing::debug;

use importsync_core::{NaturalKey, Record};

use crate::error::{EngineError, EngineResult};

/// A producer of ordered record pages.
///
/// Implementations must return records in ascending natural-key order,
/// strictly greater than `after` when it is given, and at most `limit` of
/// them. Returning a short page signals that the source is exhausted.
pub trait PageSource<K: NaturalKey> {
    /// Fetches the next page of records.
    ///
    /// # Errors
    ///
    /// Implementations surface their own failures as
    /// [`EngineError::Source`]; the loader does not retry.
    fn fetch_page(&mut self, after: Option<&K>, limit: usize) -> EngineResult<Vec<Record<K>>>;
}

/// Streams records out of a [`PageSource`] one page at a time.
pub struct BufferedLoader<P> {
    source: P,
    page_size: usize,
}

impl<P> BufferedLoader<P> {
    /// Creates a loader with the given page size.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidPageSize`] if `page_size` is zero.
    pub fn new(source: P, page_size: usize) -> EngineResult<Self> {
        if page_size == 0 {
            return Err(EngineError::InvalidPageSize { got: page_size });
        }
        Ok(Self { source, page_size })
    }

    /// Consumes the loader, returning the record stream.
    pub fn records<K>(self) -> BufferedRecords<P, K>
    where
        K: NaturalKey,
        P: PageSource<K>,
    {
        BufferedRecords {
            source: self.source,
            page_size: self.page_size,
            buffer: Vec::new().into_iter(),
            last_key: None,
            last_page_len: 0,
            started: false,
            failed: false,
        }
    }
}

/// Iterator over the records of a [`BufferedLoader`].
///
/// Yields `Err` once on the first source failure, then fuses.
pub struct BufferedRecords<P, K: NaturalKey> {
    source: P,
    page_size: usize,
    buffer: std::vec::IntoIter<Record<K>>,
    last_key: Option<K>,
    last_page_len: usize,
    started: bool,
    failed: bool,
}

impl<P, K> Iterator for BufferedRecords<P, K>
where
    K: NaturalKey,
    P: PageSource<K>,
{
    type Item = EngineResult<Record<K>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(record) = self.buffer.next() {
                self.last_key = Some(record.key().clone());
                return Some(Ok(record));
            }

            // A short page means the source was exhausted.
            if self.started && self.last_page_len < self.page_size {
                return None;
            }

            match self.source.fetch_page(self.last_key.as_ref(), self.page_size) {
                Ok(page) => {
                    self.started = true;
                    self.last_page_len = page.len();
                    debug!(
                        records = page.len(),
                        after = ?self.last_key,
                        "fetched loader page"
                    );
                    if page.is_empty() {
                        return None;
                    }
                    self.buffer = page.into_iter();
                }
                Err(error) => {
                    self.failed = true;
                    return Some(Err(error));
                }
            }
        }
    }
}

/// An in-memory page source over a sorted record vector.
///
/// Useful in tests and for small imports that already fit in memory.
pub struct VecSource<K: NaturalKey> {
    records: Vec<Record<K>>,
}

impl<K: NaturalKey> VecSource<K> {
    /// Creates a source from records, sorting them by natural key.
    pub fn new(mut records: Vec<Record<K>>) -> Self {
        records.sort();
        Self { records }
    }
}

impl<K: NaturalKey> PageSource<K> for VecSource<K> {
    fn fetch_page(&mut self, after: Option<&K>, limit: usize) -> EngineResult<Vec<Record<K>>> {
        let page = self
            .records
            .iter()
            .filter(|record| after.is_none_or(|key| record.key() > key))
            .take(limit)
            .cloned()
            .collect();
        Ok(page)
    }
}

//! Paginated reading of a group's message history, newest first

use async_trait::async_trait;

use crate::models::Message;
use crate::Result;

/// Upstream the scan reads from
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Up to `limit` messages strictly older than `before_id` (or the newest
    /// page when `None`), newest first. An empty batch means the history is
    /// exhausted.
    async fn fetch_message_batch(
        &self,
        group_id: &str,
        before_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<Message>>;

    /// Members in the group right now
    async fn current_member_count(&self, group_id: &str) -> Result<i64>;
}

/// Cursor over one group's history
///
/// Each call to [`next_batch`](Self::next_batch) asks for the messages before
/// the oldest one seen so far. Transport errors are returned as-is; there is
/// no retry here.
pub struct MessageHistoryReader<'a, S: MessageSource + ?Sized> {
    source: &'a S,
    group_id: String,
    page_size: u32,
    before_id: Option<String>,
    exhausted: bool,
    pages_read: usize,
}

impl<'a, S: MessageSource + ?Sized> MessageHistoryReader<'a, S> {
    pub fn new(source: &'a S, group_id: &str, page_size: u32) -> Self {
        Self {
            source,
            group_id: group_id.to_string(),
            page_size,
            before_id: None,
            exhausted: false,
            pages_read: 0,
        }
    }

    /// Next page, or `None` once an empty page has been seen
    pub async fn next_batch(&mut self) -> Result<Option<Vec<Message>>> {
        if self.exhausted {
            return Ok(None);
        }

        let batch = self
            .source
            .fetch_message_batch(&self.group_id, self.before_id.as_deref(), self.page_size)
            .await?;

        match batch.last() {
            Some(oldest) => {
                self.before_id = Some(oldest.id.clone());
                self.pages_read += 1;
                tracing::debug!(
                    group_id = %self.group_id,
                    page = self.pages_read,
                    messages = batch.len(),
                    before_id = %oldest.id,
                    "read message page"
                );
                Ok(Some(batch))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Drain the remaining pages into one newest-first stream
    pub async fn read_all(&mut self) -> Result<Vec<Message>> {
        let mut merged = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            merged.extend(batch);
        }
        Ok(merged)
    }

    pub fn pages_read(&self) -> usize {
        self.pages_read
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::MemsBotError;

    struct PagedSource {
        messages: Vec<Message>,
        calls: Mutex<Vec<Option<String>>>,
        fail_after: Option<usize>,
    }

    impl PagedSource {
        fn new(count: usize) -> Self {
            // ids count down: higher id = newer
            let messages = (0..count)
                .rev()
                .map(|i| Message {
                    id: format!("{i:04}"),
                    created_at: i as i64,
                    ..Default::default()
                })
                .collect();
            Self {
                messages,
                calls: Mutex::new(Vec::new()),
                fail_after: None,
            }
        }
    }

    #[async_trait]
    impl MessageSource for PagedSource {
        async fn fetch_message_batch(
            &self,
            _group_id: &str,
            before_id: Option<&str>,
            limit: u32,
        ) -> Result<Vec<Message>> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(before_id.map(str::to_string));
            if self.fail_after.is_some_and(|n| calls.len() > n) {
                return Err(MemsBotError::Custom("connection reset".to_string()));
            }
            Ok(self
                .messages
                .iter()
                .filter(|m| before_id.map_or(true, |b| m.id.as_str() < b))
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn current_member_count(&self, _group_id: &str) -> Result<i64> {
            Ok(3)
        }
    }

    #[tokio::test]
    async fn test_reads_every_page_then_stops() {
        let source = PagedSource::new(250);
        let mut reader = MessageHistoryReader::new(&source, "g", 100);

        let all = reader.read_all().await.unwrap();
        assert_eq!(all.len(), 250);
        assert_eq!(all.first().unwrap().id, "0249");
        assert_eq!(all.last().unwrap().id, "0000");
        assert_eq!(reader.pages_read(), 3);

        let calls = source.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![None, Some("0150".to_string()), Some("0050".to_string()), Some("0000".to_string())]
        );
    }

    #[tokio::test]
    async fn test_exhausted_reader_does_not_fetch_again() {
        let source = PagedSource::new(0);
        let mut reader = MessageHistoryReader::new(&source, "g", 100);
        assert!(reader.next_batch().await.unwrap().is_none());
        assert!(reader.next_batch().await.unwrap().is_none());
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut source = PagedSource::new(300);
        source.fail_after = Some(1);
        let mut reader = MessageHistoryReader::new(&source, "g", 100);
        assert!(reader.next_batch().await.unwrap().is_some());
        let err = reader.read_all().await.unwrap_err();
        assert!(matches!(err, MemsBotError::Custom(_)));
    }
}

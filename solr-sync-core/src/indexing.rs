//! Chunked bulk indexing.
//!
//! Items are turned into documents and submitted to the update handler in
//! consecutive, order-preserving chunks, one request per chunk, each awaited
//! before the next is built. Lazily produced sources are only ever pulled
//! forward, so at most one chunk of items is held in memory.

use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::contract::{Commit, Document, ProgressSink, UpdateApi};
use crate::error::{Result, SolrError};

pub const DEFAULT_CHUNK_SIZE: usize = 150;

/// Something that can be stored in the index.
///
/// Implementors supply the item-type label, their local id and the payload
/// fields; the unique index id and the `id`/`item_type` payload entries are
/// derived from those.
pub trait Indexable {
    /// Label shared by every item of this kind, e.g. `article`.
    fn index_item_type(&self) -> &str;

    /// Identifier unique among items of the same type.
    fn index_local_id(&self) -> String;

    /// Payload fields besides `id` and `item_type`.
    fn index_fields(&self) -> Document;

    /// Globally unique id, `<item_type>.<local_id>`.
    fn index_id(&self) -> String {
        format!("{}.{}", self.index_item_type(), self.index_local_id())
    }

    /// Full document. `id` and `item_type` always reflect the item, whatever
    /// `index_fields` returned under those keys.
    fn index_data(&self) -> Document {
        let mut doc = self.index_fields();
        doc.insert("id".to_string(), Value::String(self.index_id()));
        doc.insert(
            "item_type".to_string(),
            Value::String(self.index_item_type().to_string()),
        );
        doc
    }
}

/// A database-style result set that can be walked once from the front.
///
/// `count` may be expensive (a separate query), so the indexer never calls it.
pub trait QuerySet<'a, T> {
    fn count(&self) -> usize;

    /// Consumes the set, yielding items in order.
    fn iterator(self) -> BoxStream<'a, T>;
}

/// Items handed to [`index_items`].
pub enum Items<'a, T> {
    /// Already in memory; chunks are slices of it.
    Materialized(&'a [T]),
    /// Produced on demand, pulled forward one chunk at a time.
    Lazy(BoxStream<'a, T>),
}

impl<'a, T> Items<'a, T> {
    pub fn from_query_set<Q: QuerySet<'a, T>>(query_set: Q) -> Self {
        Items::Lazy(query_set.iterator())
    }
}

impl<'a, T> From<&'a [T]> for Items<'a, T> {
    fn from(items: &'a [T]) -> Self {
        Items::Materialized(items)
    }
}

impl<'a, T> From<&'a Vec<T>> for Items<'a, T> {
    fn from(items: &'a Vec<T>) -> Self {
        Items::Materialized(items.as_slice())
    }
}

async fn submit_chunk<U: UpdateApi + ?Sized>(
    client: &U,
    chunk: usize,
    docs: &[Document],
    progress: Option<&dyn ProgressSink>,
) -> Result<()> {
    info!(chunk, size = docs.len(), "[INDEX] Submitting chunk");
    if let Err(e) = client.index(docs, Commit::Default).await {
        error!(chunk, size = docs.len(), error = %e, "[INDEX][ERROR] Chunk submission failed");
        return Err(e);
    }
    if let Some(sink) = progress {
        sink.update(docs.len());
    }
    Ok(())
}

/// Indexes every item in chunks of at most `chunk_size`, returning how many
/// were submitted.
///
/// The first failing chunk stops the run; chunks already sent stay indexed.
pub async fn index_items<'a, U, T>(
    client: &U,
    items: Items<'a, T>,
    chunk_size: usize,
    progress: Option<&dyn ProgressSink>,
) -> Result<usize>
where
    U: UpdateApi + ?Sized,
    T: Indexable + 'a,
{
    if chunk_size == 0 {
        return Err(SolrError::Usage("chunk size must be at least 1".to_string()));
    }

    let mut submitted = 0;
    let mut chunk = 0;
    match items {
        Items::Materialized(slice) => {
            debug!(items = slice.len(), chunk_size, "[INDEX] Indexing materialized items");
            for batch in slice.chunks(chunk_size) {
                let docs: Vec<Document> = batch.iter().map(Indexable::index_data).collect();
                submit_chunk(client, chunk, &docs, progress).await?;
                submitted += docs.len();
                chunk += 1;
            }
        }
        Items::Lazy(stream) => {
            debug!(chunk_size, "[INDEX] Indexing lazily produced items");
            let mut batches = stream.chunks(chunk_size);
            while let Some(batch) = batches.next().await {
                let docs: Vec<Document> = batch.iter().map(Indexable::index_data).collect();
                drop(batch);
                submit_chunk(client, chunk, &docs, progress).await?;
                submitted += docs.len();
                chunk += 1;
            }
        }
    }

    info!(submitted, chunks = chunk, "[INDEX] Indexing complete");
    Ok(submitted)
}

pub async fn index_item<U, T>(client: &U, item: &T) -> Result<()>
where
    U: UpdateApi + ?Sized,
    T: Indexable + ?Sized,
{
    let doc = item.index_data();
    debug!(id = %item.index_id(), "[INDEX] Indexing single item");
    client.index(std::slice::from_ref(&doc), Commit::Default).await
}

pub async fn remove_from_index<U, T>(client: &U, item: &T) -> Result<()>
where
    U: UpdateApi + ?Sized,
    T: Indexable + ?Sized,
{
    let id = item.index_id();
    info!(id = %id, "[INDEX] Removing item from index");
    client.delete_by_id(&[id]).await
}

/// Deletes all given items in one request. Nothing is sent for an empty slice.
pub async fn remove_items_from_index<U, T>(client: &U, items: &[T]) -> Result<usize>
where
    U: UpdateApi + ?Sized,
    T: Indexable,
{
    if items.is_empty() {
        return Ok(0);
    }
    let ids: Vec<String> = items.iter().map(Indexable::index_id).collect();
    info!(count = ids.len(), "[INDEX] Removing items from index");
    client.delete_by_id(&ids).await?;
    Ok(ids.len())
}

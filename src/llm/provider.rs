use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::types::{AppResult, CompletionChunk, CompletionRequest, Credential};

/// Lazily pulled answer fragments.
///
/// Finite and single-use; dropping it releases the underlying connection.
/// The first `Err` item is also the last item.
pub type ChunkStream = BoxStream<'static, AppResult<CompletionChunk>>;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn stream_answer(
        &self,
        request: &CompletionRequest,
        credential: &Credential,
    ) -> AppResult<ChunkStream>;
}

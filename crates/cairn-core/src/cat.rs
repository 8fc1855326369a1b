//! Content resolution and payload concatenation.

use std::io::{self, Cursor, Read};

use async_trait::async_trait;
use cairn_store::BlockAccess;
use cairn_stream::{Payload, PayloadReader, Producer, ResponseEmitter, StreamResult};
use cairn_types::strip_path_namespace;
use tracing::debug;

use crate::error::{CoreError, CoreResult};

/// Bytes behind a path, with the size the resolver declares for them.
pub struct ResolvedContent {
    pub reader: PayloadReader,
    pub size: u64,
}

impl std::fmt::Debug for ResolvedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedContent")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Turns a human path string into a byte reader.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn resolve(&self, path: &str) -> CoreResult<ResolvedContent>;
}

/// Resolves `<cid>` or `/ipfs/<cid>` to the raw bytes of a single block.
#[derive(Clone, Debug)]
pub struct BlockResolver {
    access: BlockAccess,
}

impl BlockResolver {
    pub fn new(access: BlockAccess) -> Self {
        Self { access }
    }
}

#[async_trait]
impl ContentResolver for BlockResolver {
    async fn resolve(&self, path: &str) -> CoreResult<ResolvedContent> {
        let key = strip_path_namespace(path);
        if key.contains('/') {
            return Err(CoreError::Resolve {
                path: path.to_string(),
                reason: "path traversal below a block is not supported".into(),
            });
        }
        let block = self.access.get(key)?;
        let size = block.size();
        Ok(ResolvedContent {
            reader: Box::new(Cursor::new(block.into_data())),
            size,
        })
    }
}

/// Resolve every path in order and join them into one payload whose declared
/// length is the sum of the parts.
///
/// The first path that fails to resolve fails the whole request.
pub async fn concatenate(
    resolver: &dyn ContentResolver,
    paths: &[String],
) -> CoreResult<Payload> {
    let mut reader: PayloadReader = Box::new(io::empty());
    let mut length = 0u64;
    for path in paths {
        let content = resolver.resolve(path).await?;
        debug!(%path, size = content.size, "resolved");
        length += content.size;
        reader = Box::new(reader.chain(content.reader));
    }
    Ok(Payload::new(reader, length))
}

/// Emits one prepared payload.
#[derive(Debug)]
pub struct PayloadProducer(pub Payload);

#[async_trait]
impl<T: Send + 'static> Producer<T> for PayloadProducer {
    async fn produce(self, emitter: &mut ResponseEmitter<T>) -> StreamResult<()> {
        emitter.emit_payload(self.0).await
    }
}

//! Batch poller
//!
//! One fetch per poll, no matter how many tags are configured: the reader
//! computes the minimal contiguous span covering every resolvable tag, pulls
//! it in a single `read_bytes`, then decodes each tag's slice into the
//! current-value store. Process-control links are round-trip bound rather
//! than bandwidth bound, so one larger read beats many small ones.

use std::sync::Arc;

use s7block::{AddressKind, ValueCodec};
use tracing::{debug, warn};

use crate::catalog::TagCatalog;
use crate::error::{Result, TagSrvError};
use crate::remote::RemoteMemoryService;
use crate::store::CurrentValueStore;

pub struct BatchReader {
    catalog: Arc<TagCatalog>,
}

impl BatchReader {
    pub fn new(catalog: Arc<TagCatalog>) -> Self {
        Self { catalog }
    }

    /// The assumed common block and the span length covering every
    /// resolvable tag. `None` when nothing in the catalog is pollable.
    ///
    /// The block number comes from the first resolvable entry; entries
    /// pointing elsewhere are still covered by the span so their (wrong)
    /// decode stays in bounds, and are warned about during the poll.
    pub fn read_span(&self) -> Option<(u16, u32)> {
        let mut block = None;
        let mut max_offset = 0u32;
        for tag in self.catalog.iter() {
            let addr = tag.resolve();
            if !addr.is_valid() {
                continue;
            }
            block.get_or_insert(addr.db_number);
            max_offset = max_offset.max(addr.end_offset());
        }
        block.map(|db| (db, max_offset))
    }

    /// Fetch the span once and decode every tag positionally into `store`.
    /// On fetch failure the store is left untouched and the remote service's
    /// own error text is propagated.
    pub async fn poll_all(
        &self,
        service: &mut dyn RemoteMemoryService,
        store: &mut CurrentValueStore,
    ) -> Result<()> {
        let Some((db_number, span)) = self.read_span() else {
            debug!("no pollable tags, skipping fetch");
            return Ok(());
        };

        let buf = match service.read_bytes(db_number, 0, span).await {
            Ok(buf) => buf,
            Err(status) => {
                return Err(TagSrvError::remote_io(format!(
                    "read DB{db_number} 0..{span}: {}",
                    service.describe_error(status)
                )));
            }
        };

        for (index, tag) in self.catalog.iter().enumerate() {
            let addr = tag.resolve();
            if !addr.is_valid() {
                continue;
            }
            if addr.db_number != db_number {
                warn!(
                    tag = %tag.name,
                    configured_block = addr.db_number,
                    polled_block = db_number,
                    "tag block differs from the polled block, decoded data is wrong"
                );
            }
            let offset = addr.byte_offset as usize;
            let raw = match addr.kind {
                AddressKind::Word16 => ValueCodec::decode_word16(&buf, offset),
                AddressKind::Real32 => ValueCodec::decode_real32(&buf, offset),
                AddressKind::Bit => {
                    f64::from(u8::from(ValueCodec::decode_bit(&buf, offset, addr.bit_offset)))
                }
                AddressKind::Invalid => unreachable!(),
            };
            store.set(index, ValueCodec::apply_scale(raw, tag.scale));
        }

        debug!(db = db_number, bytes = span, tags = self.catalog.len(), "poll complete");
        Ok(())
    }
}

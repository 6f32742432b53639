//! Single-tag writer
//!
//! Numeric tags are encoded and written in one call of exact field width.
//! Bit tags go through a read-modify-write of the owning byte: the remote
//! service writes whole bytes, and the other seven bits may belong to other
//! tags, so clobbering the byte would corrupt them.

use std::sync::Arc;

use s7block::{AddressKind, ValueCodec};
use tracing::debug;

use crate::catalog::TagCatalog;
use crate::error::{Result, TagSrvError};
use crate::remote::RemoteMemoryService;
use crate::store::CurrentValueStore;

pub struct TagWriter {
    catalog: Arc<TagCatalog>,
}

impl TagWriter {
    pub fn new(catalog: Arc<TagCatalog>) -> Self {
        Self { catalog }
    }

    /// Write an engineering value to a named tag.
    ///
    /// On success the current-value store is updated with the written intent
    /// immediately, without a verifying re-read; the next poll reconciles it
    /// with whatever the controller logic may have done since.
    pub async fn write_tag(
        &self,
        service: &mut dyn RemoteMemoryService,
        store: &mut CurrentValueStore,
        name: &str,
        value: f64,
    ) -> Result<()> {
        let index = self
            .catalog
            .find_by_name(name)
            .ok_or_else(|| TagSrvError::tag_not_found(name))?;
        let tag = self
            .catalog
            .get(index)
            .ok_or_else(|| TagSrvError::internal("catalog index out of range"))?;

        let addr = tag.resolve();
        if !addr.is_valid() {
            return Err(TagSrvError::data(format!(
                "tag {} has unparseable address {:?}",
                tag.name, tag.address
            )));
        }

        let raw = ValueCodec::remove_scale(value, tag.scale);
        let stored = match addr.kind {
            AddressKind::Word16 => {
                let bytes = ValueCodec::encode_word16(raw as i16);
                self.write_checked(service, addr.db_number, addr.byte_offset, &bytes)
                    .await?;
                value
            }
            AddressKind::Real32 => {
                let bytes = ValueCodec::encode_real32(raw as f32);
                self.write_checked(service, addr.db_number, addr.byte_offset, &bytes)
                    .await?;
                value
            }
            AddressKind::Bit => {
                // Fetch the owning byte first; if that fails nothing is
                // written and the operation has no effect.
                let owning = match service.read_bytes(addr.db_number, addr.byte_offset, 1).await {
                    Ok(buf) if !buf.is_empty() => buf[0],
                    Ok(_) => {
                        return Err(TagSrvError::remote_io(
                            "empty read of owning byte".to_string(),
                        ))
                    }
                    Err(status) => {
                        return Err(TagSrvError::remote_io(format!(
                            "read owning byte: {}",
                            service.describe_error(status)
                        )))
                    }
                };
                let target = value != 0.0;
                let patched = ValueCodec::encode_bit(owning, addr.bit_offset, target);
                self.write_checked(service, addr.db_number, addr.byte_offset, &[patched])
                    .await?;
                f64::from(u8::from(target))
            }
            AddressKind::Invalid => unreachable!(),
        };

        store.set(index, stored);
        debug!(tag = %tag.name, value, "tag written");
        Ok(())
    }

    async fn write_checked(
        &self,
        service: &mut dyn RemoteMemoryService,
        db_number: u16,
        offset: u32,
        bytes: &[u8],
    ) -> Result<()> {
        match service.write_bytes(db_number, offset, bytes).await {
            Ok(()) => Ok(()),
            Err(status) => Err(TagSrvError::remote_io(format!(
                "write DB{db_number}.{offset}: {}",
                service.describe_error(status)
            ))),
        }
    }
}

use super::accumulator::Batch;
use super::registry::Registry;
use crate::error::{ErrorKind, Result};
use crate::xml;
use exn::ResultExt;
use mapgen_compress::Compression;
use mapgen_storage::BackendHandle;
use std::path::PathBuf;
use tracing::instrument;

/// Serializes a batch and persists it under its numbered name.
#[derive(Clone)]
pub(crate) struct Flusher {
    pub(crate) backend: BackendHandle,
    pub(crate) name: String,
    pub(crate) compression: Compression,
    pub(crate) registry: Registry,
}
impl Flusher {
    /// `{name}_{number}.xml.gz` (or `.xml` when uncompressed).
    pub(crate) fn file_name(&self, number: u64) -> String {
        format!("{}_{}{}", self.name, number, self.compression.xml_suffix())
    }

    #[instrument(skip_all, fields(group = %self.name, batch = batch.number, records = batch.records.len()))]
    pub(crate) async fn flush(&self, batch: Batch) -> Result<String> {
        let file_name = self.file_name(batch.number);
        let document = xml::encode_urlset(&batch.records)?;
        let path = PathBuf::from(&file_name);
        let size = self
            .backend
            .write(&path, document, self.compression)
            .await
            .or_raise(|| ErrorKind::WriteFailure(path.clone()))?;
        self.registry.push(file_name.clone());
        tracing::info!(file = %file_name, backend = self.backend.name(), bytes = size, "Wrote sitemap");
        Ok(file_name)
    }
}

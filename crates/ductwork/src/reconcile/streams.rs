//! Stream selection against a discovered catalog.

use std::collections::BTreeMap;

use crate::api::CatalogStream;
use crate::model::SyncMode;

/// Builds the sync catalog entries for a connection from the source's
/// discovered catalog.
///
/// Streams keep the discovery order. A stream named in the config table is
/// carried over with its discovered settings, the configured mode pair and
/// `selected` forced on; streams the config does not name are dropped
/// entirely, and config entries naming streams the catalog lacks are
/// ignored. Extra discovered fields (cursor, primary key, json schema)
/// ride along untouched.
pub fn merge_streams(
    discovered: &[CatalogStream],
    stream_config: &BTreeMap<String, SyncMode>,
) -> Vec<CatalogStream> {
    discovered
        .iter()
        .filter_map(|entry| {
            let mode = stream_config.get(&entry.stream.name)?;
            let mut merged = entry.clone();
            merged.config.sync_mode = mode.sync_mode().to_string();
            merged.config.destination_sync_mode = mode.destination_sync_mode().to_string();
            merged.config.selected = true;
            Some(merged)
        })
        .collect()
}

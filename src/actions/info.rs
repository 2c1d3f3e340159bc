use crate::errors::ActionError;
use crate::subtitle::{Document, Metadata};

use super::{value_to_string, MetadataRef, Params};

// @module: Metadata (script info) actions

/// The document has exactly one metadata mapping
pub fn select_current_info(_doc: &Document, _params: &Params) -> Result<Vec<MetadataRef>, ActionError> {
    Ok(vec![MetadataRef])
}

/// Snapshot of the metadata for later diffing or restoration
pub fn action_save(doc: &mut Document, _info: MetadataRef, _params: &Params) -> Result<Metadata, ActionError> {
    Ok(doc.metadata.clone())
}

/// Merge every parameter into the metadata, last write wins
pub fn action_update(doc: &mut Document, _info: MetadataRef, params: &Params) -> Result<Metadata, ActionError> {
    for (key, value) in params {
        doc.metadata.insert(key.as_str(), value_to_string(value));
    }
    Ok(doc.metadata.clone())
}

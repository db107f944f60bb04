//! Pipeline message carried through the processor.

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::ItemError;

/// A single stream-processing message
///
/// Holds the raw body, string metadata and, once processed, the per-item error
/// (if any) produced for this message. The error is attached next to the body
/// rather than replacing it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    body: Bytes,
    metadata: BTreeMap<String, String>,
    error: Option<ItemError>,
}

impl Message {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            metadata: BTreeMap::new(),
            error: None,
        }
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(
        &mut self,
        body: impl Into<Bytes>,
    ) {
        self.body = body.into();
    }

    pub fn meta(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    pub fn error(&self) -> Option<&ItemError> {
        self.error.as_ref()
    }

    pub fn set_error(
        &mut self,
        error: ItemError,
    ) {
        self.error = Some(error);
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

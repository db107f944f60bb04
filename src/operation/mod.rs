//! Operation strategies
//!
//! A closed set of document verbs. Each verb maps a resolved `(key, payload)`
//! pair onto a [`StoreCall`] descriptor and declares whether it needs a
//! payload at all.

mod dispatcher;
pub use dispatcher::*;


use std::fmt;
use std::str::FromStr;

use bytes::Bytes;

use crate::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operation {
    #[default]
    Get,
    Insert,
    Remove,
    Replace,
    Upsert,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Get,
        Operation::Insert,
        Operation::Remove,
        Operation::Replace,
        Operation::Upsert,
    ];

    /// Whether the strategy consumes the value produced for each message
    pub fn needs_payload(&self) -> bool {
        matches!(self, Operation::Insert | Operation::Replace | Operation::Upsert)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Insert => "insert",
            Operation::Remove => "remove",
            Operation::Replace => "replace",
            Operation::Upsert => "upsert",
        }
    }

    /// Builds the store call for this verb. Read and delete verbs drop the value.
    pub fn descriptor(
        &self,
        key: String,
        value: Option<EncodedValue>,
    ) -> std::result::Result<StoreCall, MissingPayload> {
        let value = || value.ok_or(MissingPayload(*self));
        Ok(match self {
            Operation::Get => StoreCall::Get { key },
            Operation::Remove => StoreCall::Remove { key },
            Operation::Insert => StoreCall::Insert { key, value: value()? },
            Operation::Replace => StoreCall::Replace { key, value: value()? },
            Operation::Upsert => StoreCall::Upsert { key, value: value()? },
        })
    }
}

impl FromStr for Operation {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ConfigurationError::InvalidOperation(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A write verb reached the store without a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingPayload(pub Operation);

/// Per-message request: resolved key and optional payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    key: String,
    payload: Option<Bytes>,
}

impl OperationRequest {
    pub fn new(
        key: impl Into<String>,
        payload: Option<Bytes>,
    ) -> Self {
        Self {
            key: key.into(),
            payload,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    pub(crate) fn into_parts(self) -> (String, Option<Bytes>) {
        (self.key, self.payload)
    }
}

/// Transcoded content ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedValue {
    pub content: Bytes,
    pub flags: u32,
}

/// Store call descriptor handed to the collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get { key: String },
    Insert { key: String, value: EncodedValue },
    Remove { key: String },
    Replace { key: String, value: EncodedValue },
    Upsert { key: String, value: EncodedValue },
}

impl StoreCall {
    pub fn key(&self) -> &str {
        match self {
            StoreCall::Get { key }
            | StoreCall::Insert { key, .. }
            | StoreCall::Remove { key }
            | StoreCall::Replace { key, .. }
            | StoreCall::Upsert { key, .. } => key,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            StoreCall::Get { .. } => Operation::Get,
            StoreCall::Insert { .. } => Operation::Insert,
            StoreCall::Remove { .. } => Operation::Remove,
            StoreCall::Replace { .. } => Operation::Replace,
            StoreCall::Upsert { .. } => Operation::Upsert,
        }
    }
}

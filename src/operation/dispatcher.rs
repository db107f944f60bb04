use tracing::trace;

use super::Operation;
use super::OperationRequest;
use super::StoreCall;
use crate::ConfigurationError;
use crate::EncodedValue;
use crate::ItemError;
use crate::ItemErrorKind;
use crate::Transcoder;

/// Resolves the configured operation once and turns requests into store calls
#[derive(Debug, Clone, Copy)]
pub struct OperationDispatcher {
    operation: Operation,
    transcoder: Transcoder,
}

impl OperationDispatcher {
    /// Resolves `operation` (defaults to `get`) and checks its payload contract.
    ///
    /// # Errors
    /// - [`ConfigurationError::InvalidOperation`] for an unknown name
    /// - [`ConfigurationError::ValueRequired`] when a write verb has no value expression
    pub fn new(
        operation: Option<&str>,
        has_value: bool,
        transcoder: Transcoder,
    ) -> std::result::Result<Self, ConfigurationError> {
        let operation = match operation {
            Some(name) => name.parse::<Operation>()?,
            None => Operation::default(),
        };
        Self::with_operation(operation, has_value, transcoder)
    }

    pub fn with_operation(
        operation: Operation,
        has_value: bool,
        transcoder: Transcoder,
    ) -> std::result::Result<Self, ConfigurationError> {
        if operation.needs_payload() && !has_value {
            return Err(ConfigurationError::ValueRequired);
        }
        Ok(Self {
            operation,
            transcoder,
        })
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn transcoder(&self) -> Transcoder {
        self.transcoder
    }

    /// Builds the store call for one request.
    ///
    /// Encoding failures stay scoped to the request.
    pub fn dispatch(
        &self,
        request: OperationRequest,
    ) -> std::result::Result<StoreCall, ItemError> {
        let (key, payload) = request.into_parts();

        let value = match (self.operation.needs_payload(), payload) {
            (true, Some(payload)) => {
                let (content, flags) = self.transcoder.encode(payload)?;
                Some(EncodedValue { content, flags })
            }
            _ => None,
        };

        trace!(%key, op = %self.operation, "dispatch");

        self.operation.descriptor(key, value).map_err(|missing| {
            ItemError::new(
                ItemErrorKind::Encoding,
                format!("{} requires a value but none was produced", missing.0),
            )
        })
    }
}

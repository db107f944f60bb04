//! Writes per-item results back onto their messages.


use tracing::trace;

use crate::BatchError;
use crate::ItemError;
use crate::ItemErrorKind;
use crate::ItemOutcome;
use crate::Message;
use crate::OperationResult;
use crate::Transcoder;

#[derive(Debug, Clone, Copy)]
pub struct ResultMapper {
    transcoder: Transcoder,
}

impl ResultMapper {
    pub fn new(transcoder: Transcoder) -> Self {
        Self { transcoder }
    }

    /// Decodes a raw store outcome. Reads go through the transcoder,
    /// mutations carry no content.
    pub fn to_result(
        &self,
        outcome: ItemOutcome,
    ) -> OperationResult {
        match outcome {
            Ok(Some(document)) => self.transcoder.decode(document),
            Ok(None) => OperationResult::Empty,
            Err(e) => OperationResult::Error(e),
        }
    }

    /// Applies `results[i]` to `messages[i]`.
    ///
    /// # Errors
    /// [`BatchError::ResultCountMismatch`] when the lengths differ; no message
    /// is touched in that case.
    pub fn apply(
        &self,
        messages: &mut [Message],
        results: Vec<OperationResult>,
    ) -> std::result::Result<(), BatchError> {
        if messages.len() != results.len() {
            return Err(BatchError::ResultCountMismatch {
                expected: messages.len(),
                actual: results.len(),
            });
        }

        for (message, result) in messages.iter_mut().zip(results) {
            Self::apply_one(message, result);
        }
        Ok(())
    }

    pub fn apply_one(
        message: &mut Message,
        result: OperationResult,
    ) {
        match result {
            OperationResult::RawBytes(bytes) => message.set_body(bytes),
            OperationResult::StructuredValue(value) => match serde_json::to_vec(&value) {
                Ok(body) => message.set_body(body),
                Err(e) => message.set_error(ItemError::new(ItemErrorKind::Encoding, e.to_string())),
            },
            // pass-through
            OperationResult::Empty => {}
            OperationResult::Error(e) => {
                trace!("attach item error: {}", e);
                message.set_error(e);
            }
        }
    }
}

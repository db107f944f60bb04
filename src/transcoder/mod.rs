//! Payload transcoders
//!
//! Every stored document carries common flags describing the format of its
//! content. A transcoder decides which flags a write stores and which flags it
//! accepts when decoding a read.

use std::str::FromStr;

use bytes::Bytes;

use crate::ConfigurationError;
use crate::Document;
use crate::ItemError;
use crate::ItemErrorKind;
use crate::OperationResult;


/// Format nibble lives in the top byte of the flags
const FORMAT_MASK: u32 = 0xFF00_0000;

pub const JSON_FLAGS: u32 = 0x0200_0000;
pub const BINARY_FLAGS: u32 = 0x0300_0000;
pub const STRING_FLAGS: u32 = 0x0400_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Binary,
    String,
    Unknown,
}

impl DataFormat {
    pub fn from_flags(flags: u32) -> Self {
        match flags & FORMAT_MASK {
            JSON_FLAGS => DataFormat::Json,
            BINARY_FLAGS => DataFormat::Binary,
            STRING_FLAGS => DataFormat::String,
            // Legacy documents written without common flags are treated as JSON
            0 => DataFormat::Json,
            _ => DataFormat::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transcoder {
    #[default]
    Raw,
    RawJson,
    RawString,
    Json,
    Legacy,
}

impl FromStr for Transcoder {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Transcoder::Raw),
            "rawjson" => Ok(Transcoder::RawJson),
            "rawstring" => Ok(Transcoder::RawString),
            "json" => Ok(Transcoder::Json),
            "legacy" => Ok(Transcoder::Legacy),
            other => Err(ConfigurationError::InvalidTranscoder(other.to_string())),
        }
    }
}

impl Transcoder {
    pub fn name(&self) -> &'static str {
        match self {
            Transcoder::Raw => "raw",
            Transcoder::RawJson => "rawjson",
            Transcoder::RawString => "rawstring",
            Transcoder::Json => "json",
            Transcoder::Legacy => "legacy",
        }
    }

    /// Encodes a payload into stored content and flags.
    pub fn encode(
        &self,
        payload: Bytes,
    ) -> std::result::Result<(Bytes, u32), ItemError> {
        match self {
            Transcoder::Raw | Transcoder::Legacy => Ok((payload, BINARY_FLAGS)),
            Transcoder::RawJson => Ok((payload, JSON_FLAGS)),
            Transcoder::RawString => {
                std::str::from_utf8(&payload).map_err(|e| {
                    ItemError::new(ItemErrorKind::Encoding, format!("payload is not utf-8: {e}"))
                })?;
                Ok((payload, STRING_FLAGS))
            }
            Transcoder::Json => {
                serde_json::from_slice::<serde_json::Value>(&payload).map_err(|e| {
                    ItemError::new(ItemErrorKind::Encoding, format!("payload is not json: {e}"))
                })?;
                Ok((payload, JSON_FLAGS))
            }
        }
    }

    /// Decodes a stored document into the result written back to the message.
    pub fn decode(
        &self,
        document: Document,
    ) -> OperationResult {
        match self.try_decode(document) {
            Ok(result) => result,
            Err(e) => OperationResult::Error(e),
        }
    }

    fn try_decode(
        &self,
        document: Document,
    ) -> std::result::Result<OperationResult, ItemError> {
        let format = DataFormat::from_flags(document.flags);
        match (self, format) {
            (Transcoder::Raw, DataFormat::Binary)
            | (Transcoder::RawJson, DataFormat::Json)
            | (Transcoder::RawString, DataFormat::String)
            | (Transcoder::Legacy, DataFormat::Binary)
            | (Transcoder::Legacy, DataFormat::String) => Ok(OperationResult::RawBytes(document.content)),
            (Transcoder::Json, DataFormat::Json) | (Transcoder::Legacy, DataFormat::Json) => {
                let value = serde_json::from_slice(&document.content).map_err(|e| {
                    ItemError::new(ItemErrorKind::Decoding, format!("stored content is not json: {e}"))
                })?;
                Ok(OperationResult::StructuredValue(value))
            }
            (transcoder, format) => Err(ItemError::new(
                ItemErrorKind::Decoding,
                format!(
                    "{} transcoder cannot decode {:?} document (flags {:#010x})",
                    transcoder.name(),
                    format,
                    document.flags
                ),
            )),
        }
    }
}

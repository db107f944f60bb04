//! Per-message key-value document dispatcher for stream pipelines.
//!
//! Each incoming message is turned into one document operation (get, insert,
//! remove, replace or upsert). A batch of messages becomes one ordered round
//! trip to the collection, and results come back onto the same messages in
//! the same order: document content for reads, pass-through for mutations,
//! an attached [`ItemError`] for keys that failed on their own.
//!
//! # Basic Usage
//! ```no_run
//! use std::sync::Arc;
//! use docstore_processor::{DocstoreConfig, DocumentProcessor, MemoryCluster, Message};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut config = DocstoreConfig::default();
//!     config.processor.operation = Some("upsert".to_string());
//!     config.processor.value = Some("content()".to_string());
//!     config.processor.key = "${! meta(\"id\") }".to_string();
//!
//!     let cluster = Arc::new(MemoryCluster::connect(&config.connection).unwrap());
//!     let processor = DocumentProcessor::new(&config, cluster).await.unwrap();
//!
//!     let mut message = Message::new(r#"{"a":1}"#).with_metadata("id", "doc1");
//!     processor.process(&mut message).await.unwrap();
//! }
//! ```

mod batch;
mod config;
mod errors;
mod expr;
mod mapper;
mod message;
mod operation;
mod processor;
mod store;
mod transcoder;

pub mod metrics;

pub use batch::*;
pub use config::*;
pub use errors::*;
pub use expr::*;
pub use mapper::*;
pub use message::*;
pub use operation::*;
pub use processor::*;
pub use store::*;
pub use transcoder::*;

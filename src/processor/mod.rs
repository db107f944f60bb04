//! Document processor
//!
//! Ties the pieces together for the host pipeline:
//! 1. resolve key and value for every message
//! 2. dispatch each request to a store call
//! 3. execute the batch in one round trip
//! 4. map results back onto the messages, in arrival order
//!
//! Messages are only touched once the round trip has succeeded; a
//! [`BatchError`] leaves the whole batch as it came in.


use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::metrics::BATCH_FAILURES_TOTAL;
use crate::metrics::BATCH_SIZE;
use crate::metrics::ITEM_ERRORS_TOTAL;
use crate::metrics::OPERATIONS_TOTAL;
use crate::BatchError;
use crate::BatchExecutor;
use crate::Cluster;
use crate::CollectionHandle;
use crate::DocstoreConfig;
use crate::ExecutionMode;
use crate::InterpolatedString;
use crate::ItemError;
use crate::KeyResolver;
use crate::Message;
use crate::OperationDispatcher;
use crate::OperationRequest;
use crate::OperationResult;
use crate::Result;
use crate::ResultMapper;
use crate::StoreCall;
use crate::Transcoder;
use crate::ValueBuilder;
use crate::ValueMapping;

pub struct DocumentProcessor {
    cluster: Arc<dyn Cluster>,
    collection: CollectionHandle,
    key: Box<dyn KeyResolver>,
    value: Option<Box<dyn ValueBuilder>>,
    dispatcher: OperationDispatcher,
    executor: Arc<dyn BatchExecutor>,
    mapper: ResultMapper,
}

impl std::fmt::Debug for DocumentProcessor {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("DocumentProcessor")
            .field("operation", &self.dispatcher.operation())
            .field("transcoder", &self.dispatcher.transcoder())
            .field("has_value", &self.value.is_some())
            .finish()
    }
}

impl DocumentProcessor {
    /// Builds a processor from configuration.
    ///
    /// Fails fast, before any message is processed:
    /// - [`crate::ConfigurationError`] for an unknown transcoder, mode or
    ///   operation, a malformed expression, or a write verb without `value`
    /// - [`crate::ConnectionError`] when the bucket is not ready within the
    ///   configured timeout
    pub async fn new(
        config: &DocstoreConfig,
        cluster: Arc<dyn Cluster>,
    ) -> Result<Self> {
        let connection = &config.connection;
        let settings = &config.processor;

        let transcoder = match settings.transcoder.as_deref() {
            Some(name) => name.parse::<Transcoder>()?,
            None => Transcoder::default(),
        };
        let mode = settings.mode.parse::<ExecutionMode>()?;

        cluster
            .wait_until_ready(&connection.bucket, connection.timeout())
            .await?;

        let key = InterpolatedString::parse(&settings.key)?;
        let value = settings.value.as_deref().map(ValueMapping::parse).transpose()?;

        let collection = cluster.collection(&connection.bucket, connection.collection.clone())?;

        let dispatcher = OperationDispatcher::new(settings.operation.as_deref(), value.is_some(), transcoder)?;

        info!(
            "document processor ready: bucket={}, collection={}, operation={}, transcoder={}, mode={:?}",
            connection.bucket,
            connection.collection.as_deref().unwrap_or(crate::DEFAULT_COLLECTION),
            dispatcher.operation(),
            transcoder.name(),
            mode
        );

        Ok(Self {
            cluster,
            collection,
            key: Box::new(key),
            value: value.map(|v| Box::new(v) as Box<dyn ValueBuilder>),
            dispatcher,
            executor: mode.executor(settings.max_in_flight),
            mapper: ResultMapper::new(transcoder),
        })
    }

    /// Assembles a processor from already-built parts.
    pub fn from_parts(
        cluster: Arc<dyn Cluster>,
        collection: CollectionHandle,
        key: Box<dyn KeyResolver>,
        value: Option<Box<dyn ValueBuilder>>,
        dispatcher: OperationDispatcher,
        executor: Arc<dyn BatchExecutor>,
    ) -> Self {
        let mapper = ResultMapper::new(dispatcher.transcoder());
        Self {
            cluster,
            collection,
            key,
            value,
            dispatcher,
            executor,
            mapper,
        }
    }

    pub fn dispatcher(&self) -> &OperationDispatcher {
        &self.dispatcher
    }

    /// Handles one message as a batch of one.
    pub async fn process(
        &self,
        message: &mut Message,
    ) -> std::result::Result<(), BatchError> {
        self.process_batch(std::slice::from_mut(message), &CancellationToken::new())
            .await
    }

    /// Processes `messages` in one round trip, updating them in place.
    ///
    /// Per-item failures are attached to their message and do not affect
    /// siblings. On `Err` no message has been modified.
    pub async fn process_batch(
        &self,
        messages: &mut [Message],
        cancel: &CancellationToken,
    ) -> std::result::Result<(), BatchError> {
        // Cancelled before anything ran: even per-item errors stay off the messages
        if cancel.is_cancelled() {
            BATCH_FAILURES_TOTAL.with_label_values(&["cancelled"]).inc();
            return Err(BatchError::Cancelled);
        }
        if messages.is_empty() {
            return Ok(());
        }
        BATCH_SIZE.observe(messages.len() as f64);

        let prepared: Vec<std::result::Result<StoreCall, ItemError>> =
            messages.iter().map(|message| self.prepare(message)).collect();

        // Only prepared calls travel; remember where each one came from
        let mut submitted = Vec::with_capacity(prepared.len());
        let mut calls = Vec::with_capacity(prepared.len());
        let mut results: Vec<Option<OperationResult>> = Vec::with_capacity(prepared.len());
        for (index, call) in prepared.into_iter().enumerate() {
            match call {
                Ok(call) => {
                    submitted.push(index);
                    calls.push(call);
                    results.push(None);
                }
                Err(e) => results.push(Some(OperationResult::Error(e))),
            }
        }

        debug!(
            "process_batch: {} messages, {} submitted as {}",
            messages.len(),
            calls.len(),
            self.dispatcher.operation()
        );

        let outcomes = match self.executor.execute(&self.collection, calls, cancel).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!("batch of {} messages failed: {}", messages.len(), e);
                BATCH_FAILURES_TOTAL.with_label_values(&[batch_failure_reason(&e)]).inc();
                return Err(e);
            }
        };
        OPERATIONS_TOTAL
            .with_label_values(&[self.dispatcher.operation().name()])
            .inc_by(outcomes.len() as u64);

        for (index, outcome) in submitted.into_iter().zip(outcomes) {
            results[index] = Some(self.mapper.to_result(outcome));
        }

        let results: Vec<OperationResult> = results
            .into_iter()
            .map(|r| r.unwrap_or(OperationResult::Empty))
            .collect();

        for result in &results {
            if let OperationResult::Error(e) = result {
                ITEM_ERRORS_TOTAL.with_label_values(&[e.kind().as_str()]).inc();
            }
        }

        self.mapper.apply(messages, results)
    }

    /// Resolves the store call for a single message.
    fn prepare(
        &self,
        message: &Message,
    ) -> std::result::Result<StoreCall, ItemError> {
        let key = self.key.resolve_key(message)?;

        // A value is only evaluated when the operation consumes it
        let payload = match &self.value {
            Some(builder) if self.dispatcher.operation().needs_payload() => Some(builder.build_value(message)?),
            _ => None,
        };

        self.dispatcher.dispatch(OperationRequest::new(key, payload))
    }

    /// Asks the connection layer to close the cluster.
    pub async fn close(&self) -> Result<()> {
        info!("closing document processor");
        self.cluster.close().await?;
        Ok(())
    }
}

fn batch_failure_reason(e: &BatchError) -> &'static str {
    match e {
        BatchError::Transport(_) => "transport",
        BatchError::Cancelled => "cancelled",
        BatchError::ResultCountMismatch { .. } => "result_count_mismatch",
    }
}

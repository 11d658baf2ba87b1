// Narration Service - drives the pipeline and dispatches flushes in the background
use crate::common::{
    ApplicationError, ApplicationResult, Cadence, DomainEvent, EventEnvelope, EventJournal, Tickable,
};
use crate::domains::environment::WorldMetadata;
use crate::domains::logger::DynLogger;
use crate::domains::narration::{
    trim_response, FailurePolicy, NarrationDispatcher, NarrationEvent, NarrationPipeline, NarrationRequest,
    ResponseSlot, SummaryRequest, TickReport, WorldSummary, DEFAULT_FAILURE_TEXT,
};
use crate::domains::tracking::WorldQuery;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

const JOURNAL_SOURCE: &str = "narration-service";

#[derive(Debug, Clone)]
pub struct FailureHandling {
    pub policy: FailurePolicy,
    pub text: String,
}

impl Default for FailureHandling {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::WriteFailureText,
            text: DEFAULT_FAILURE_TEXT.to_string(),
        }
    }
}

/// Result of one background dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Delivered { sequence: u64, text: String },
    Failed { sequence: u64, reason: String },
}

impl DispatchOutcome {
    pub fn sequence(&self) -> u64 {
        match self {
            DispatchOutcome::Delivered { sequence, .. } | DispatchOutcome::Failed { sequence, .. } => *sequence,
        }
    }
}

enum JournalCommand {
    Append(Vec<EventEnvelope>),
    Flush(oneshot::Sender<()>),
}

/// Single writer task in front of the journal. Appends land in the order they
/// were queued; a flush resolves once everything queued before it is written.
#[derive(Clone)]
struct JournalWriter {
    journal: Arc<dyn EventJournal>,
    commands: mpsc::UnboundedSender<JournalCommand>,
}

impl JournalWriter {
    fn spawn(journal: Arc<dyn EventJournal>, logger: DynLogger) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<JournalCommand>();
        let sink = journal.clone();
        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    JournalCommand::Append(records) => {
                        if let Err(e) = sink.append(records).await {
                            logger.warn(&format!("Journal append failed: {}", e));
                        }
                    }
                    JournalCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });
        Self { journal, commands: tx }
    }

    fn append(&self, records: Vec<EventEnvelope>, logger: &DynLogger) {
        if records.is_empty() {
            return;
        }
        if self.commands.send(JournalCommand::Append(records)).is_err() {
            logger.error("Journal writer stopped, records dropped");
        }
    }

    async fn flush(&self) -> bool {
        let (done, wait) = oneshot::channel();
        if self.commands.send(JournalCommand::Flush(done)).is_err() {
            return false;
        }
        wait.await.is_ok()
    }
}

/// Where and how the start-of-session world summary is requested.
pub struct SummarySettings {
    pub slot: Arc<dyn ResponseSlot>,
    pub system_prompt: String,
    pub metadata: WorldMetadata,
}

#[derive(Clone)]
struct DispatchContext {
    dispatcher: Arc<dyn NarrationDispatcher>,
    slot: Arc<dyn ResponseSlot>,
    journal: Option<JournalWriter>,
    responses: mpsc::UnboundedSender<String>,
    failure: FailureHandling,
    logger: DynLogger,
}

pub struct NarrationService {
    pipeline: NarrationPipeline,
    world: Arc<dyn WorldQuery>,
    context: DispatchContext,
    responses: mpsc::UnboundedReceiver<String>,
    in_flight: Vec<JoinHandle<DispatchOutcome>>,
    summary: Option<SummarySettings>,
    summary_task: Option<JoinHandle<Result<String, String>>>,
    cadence: Cadence,
}

impl NarrationService {
    pub fn new(
        pipeline: NarrationPipeline,
        world: Arc<dyn WorldQuery>,
        dispatcher: Arc<dyn NarrationDispatcher>,
        slot: Arc<dyn ResponseSlot>,
        sample_interval: Duration,
        logger: DynLogger,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            pipeline,
            world,
            context: DispatchContext {
                dispatcher,
                slot,
                journal: None,
                responses: tx,
                failure: FailureHandling::default(),
                logger,
            },
            responses: rx,
            in_flight: Vec::new(),
            summary: None,
            summary_task: None,
            cadence: Cadence::new(sample_interval),
        }
    }

    /// Records pipeline events in `journal`. Must be called from within a
    /// tokio runtime since the journal writer runs as its own task.
    pub fn with_journal(mut self, journal: Arc<dyn EventJournal>) -> Self {
        self.context.journal = Some(JournalWriter::spawn(journal, self.context.logger.clone()));
        self
    }

    pub fn with_failure_handling(mut self, failure: FailureHandling) -> Self {
        self.context.failure = failure;
        self
    }

    pub fn with_summary(mut self, summary: SummarySettings) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Clears the response slots and registers the world's entities. With a
    /// summary configured, the world summary request goes out as well, which
    /// needs a tokio runtime.
    pub fn start(&mut self) -> ApplicationResult<usize> {
        self.context
            .slot
            .clear()
            .map_err(|e| ApplicationError::ResponseSlot(e.to_string()))?;
        if let Some(summary) = &self.summary {
            summary
                .slot
                .clear()
                .map_err(|e| ApplicationError::ResponseSlot(e.to_string()))?;
        }
        let tracked = self.pipeline.initialize(self.world.as_ref())?;
        if self.summary.is_some() {
            self.request_world_summary();
        }
        Ok(tracked)
    }

    /// Sends the whole-world overview. Its answer goes to the summary slot and
    /// never into the story's prior responses.
    pub fn request_world_summary(&mut self) {
        let Some(settings) = &self.summary else {
            self.context.logger.warn("World summary requested without a summary slot");
            return;
        };
        let request = SummaryRequest {
            system_prompt: settings.system_prompt.clone(),
            summary: WorldSummary::from_world(self.world.as_ref(), &settings.metadata),
        };
        let slot = settings.slot.clone();
        let context = self.context.clone();
        self.context.logger.info(&format!(
            "World summary requested: {} players, {} objects",
            request.summary.players.len(),
            request.summary.objects.len()
        ));
        if let Some(journal) = &context.journal {
            let event = NarrationEvent::SummaryDispatched {
                player_count: request.summary.players.len(),
                object_count: request.summary.objects.len(),
                timestamp: Utc::now(),
            };
            journal.append(envelopes_of(&[event], &context.logger), &context.logger);
        }
        self.summary_task = Some(tokio::spawn(async move {
            complete_summary(context, slot, request).await
        }));
    }

    /// Waits for the world summary, if one was requested and not yet awaited.
    pub async fn wait_for_summary(&mut self) -> Option<Result<String, String>> {
        let handle = self.summary_task.take()?;
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                self.context.logger.error(&format!("Summary task aborted: {}", e));
                Err(e.to_string())
            }
        };
        self.flush_journal().await;
        Some(result)
    }

    /// One sampling pass. Must run inside a tokio runtime since flushes are
    /// dispatched with `tokio::spawn`.
    pub fn run_tick(&mut self) -> TickReport {
        self.drain_responses();
        let report = self.pipeline.tick(self.world.as_ref());

        if let Some(journal) = &self.context.journal {
            let mut envelopes = envelopes_of(&report.tracking_events, &self.context.logger);
            envelopes.extend(envelopes_of(&report.observations, &self.context.logger));
            journal.append(envelopes, &self.context.logger);
        }

        for request in &report.flushes {
            self.dispatch(request.clone());
        }
        self.in_flight.retain(|handle| !handle.is_finished());
        report
    }

    /// Sends `request` without blocking the caller. The response is written to
    /// the slot by the spawned task and fed back into the pipeline on a later
    /// tick.
    pub fn dispatch(&mut self, request: NarrationRequest) {
        let context = self.context.clone();
        if let Some(journal) = &context.journal {
            let event = NarrationEvent::FlushDispatched {
                sequence: request.sequence,
                event_count: request.payload.event_history.len(),
                timestamp: Utc::now(),
            };
            journal.append(envelopes_of(&[event], &context.logger), &context.logger);
        }
        self.in_flight
            .push(tokio::spawn(async move { complete_dispatch(context, request).await }));
    }

    /// Waits for every dispatch still running, folds their answers into the
    /// pipeline and drains the journal writer.
    pub async fn wait_for_dispatches(&mut self) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        self.wait_for_summary().await;
        for handle in self.in_flight.drain(..) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => self.context.logger.error(&format!("Dispatch task aborted: {}", e)),
            }
        }
        self.drain_responses();
        self.flush_journal().await;
        outcomes
    }

    /// Resolves once every record queued so far has been written.
    pub async fn flush_journal(&self) {
        if let Some(journal) = &self.context.journal {
            if !journal.flush().await {
                self.context.logger.error("Journal writer stopped before flushing");
            }
        }
    }

    /// Journal records of one subject; empty when no journal is attached.
    pub async fn journal_entries(&self, subject_id: &str) -> ApplicationResult<Vec<EventEnvelope>> {
        self.flush_journal().await;
        match &self.context.journal {
            Some(writer) => writer
                .journal
                .load_subject(subject_id)
                .await
                .map_err(ApplicationError::Journal),
            None => Ok(Vec::new()),
        }
    }

    pub fn pending_dispatches(&self) -> usize {
        self.in_flight.iter().filter(|h| !h.is_finished()).count()
    }

    pub fn pipeline(&self) -> &NarrationPipeline {
        &self.pipeline
    }

    fn drain_responses(&mut self) {
        while let Ok(text) = self.responses.try_recv() {
            self.pipeline.record_response(&text);
        }
    }
}

impl Tickable for NarrationService {
    fn on_tick(&mut self, delta: Duration) {
        if self.cadence.advance(delta) {
            self.run_tick();
        }
    }
}

async fn complete_dispatch(context: DispatchContext, request: NarrationRequest) -> DispatchOutcome {
    let sequence = request.sequence;
    let outcome = match context.dispatcher.complete(&request).await {
        Ok(raw) => {
            let text = trim_response(&raw);
            context.logger.info(&format!("Narration #{} received: {}", sequence, text));
            write_slot(&context.slot, text.clone(), &context.logger).await;
            // The receiver only goes away with the service.
            let _ = context.responses.send(text.clone());
            DispatchOutcome::Delivered { sequence, text }
        }
        Err(e) => {
            context.logger.error(&format!("Narration #{} failed: {}", sequence, e));
            if context.failure.policy == FailurePolicy::WriteFailureText {
                write_slot(&context.slot, context.failure.text.clone(), &context.logger).await;
            }
            DispatchOutcome::Failed {
                sequence,
                reason: e.to_string(),
            }
        }
    };

    if let Some(journal) = &context.journal {
        let event = match &outcome {
            DispatchOutcome::Delivered { sequence, text } => NarrationEvent::ResponseReceived {
                sequence: *sequence,
                text: text.clone(),
                timestamp: Utc::now(),
            },
            DispatchOutcome::Failed { sequence, reason } => NarrationEvent::DispatchFailed {
                sequence: *sequence,
                reason: reason.clone(),
                timestamp: Utc::now(),
            },
        };
        journal.append(envelopes_of(&[event], &context.logger), &context.logger);
    }
    outcome
}

async fn complete_summary(
    context: DispatchContext,
    slot: Arc<dyn ResponseSlot>,
    request: SummaryRequest,
) -> Result<String, String> {
    let (result, event) = match context.dispatcher.summarize(&request).await {
        Ok(raw) => {
            let text = trim_response(&raw);
            context.logger.info(&format!("World summary received: {}", text));
            write_slot(&slot, text.clone(), &context.logger).await;
            let event = NarrationEvent::SummaryReceived {
                text: text.clone(),
                timestamp: Utc::now(),
            };
            (Ok(text), event)
        }
        Err(e) => {
            context.logger.error(&format!("World summary failed: {}", e));
            if context.failure.policy == FailurePolicy::WriteFailureText {
                write_slot(&slot, context.failure.text.clone(), &context.logger).await;
            }
            let event = NarrationEvent::SummaryFailed {
                reason: e.to_string(),
                timestamp: Utc::now(),
            };
            (Err(e.to_string()), event)
        }
    };
    if let Some(journal) = &context.journal {
        journal.append(envelopes_of(&[event], &context.logger), &context.logger);
    }
    result
}

/// Slot writes may touch the filesystem, so they run on the blocking pool.
async fn write_slot(slot: &Arc<dyn ResponseSlot>, text: String, logger: &DynLogger) {
    let slot = slot.clone();
    match tokio::task::spawn_blocking(move || slot.write(&text)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => logger.error(&format!("Could not write response slot: {}", e)),
        Err(e) => logger.error(&format!("Response slot write aborted: {}", e)),
    }
}

fn envelopes_of<E: DomainEvent + Serialize>(events: &[E], logger: &DynLogger) -> Vec<EventEnvelope> {
    events
        .iter()
        .filter_map(|event| match EventEnvelope::new(event, JOURNAL_SOURCE) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                logger.warn(&format!("Skipping {} in journal: {}", event.event_type(), e));
                None
            }
        })
        .collect()
}

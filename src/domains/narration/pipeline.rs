use super::payload::{NarrationPayload, NarrationRequest, DEFAULT_SYSTEM_PROMPT};
use crate::common::{AggregateRoot, DomainError, DomainResult, Vector3};
use crate::domains::environment::{EnvironmentSnapshot, EnvironmentSnapshotter};
use crate::domains::history::{EventHistoryWindow, PushOutcome};
use crate::domains::logger::DynLogger;
use crate::domains::relativity::{EventBuilder, ObservationEvent, ObserverFrame};
use crate::domains::tracking::{EntityTracker, SampleReport, TrackingEvent, WorldQuery};
use std::collections::VecDeque;
use std::sync::Arc;

pub const DEFAULT_MAX_PRIOR_RESPONSES: usize = 10;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub system_prompt: String,
    /// Upper bound on earlier answers echoed back in each payload.
    pub max_prior_responses: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_prior_responses: DEFAULT_MAX_PRIOR_RESPONSES,
        }
    }
}

/// Everything one sampling pass produced.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub sample: SampleReport,
    pub tracking_events: Vec<TrackingEvent>,
    pub observations: Vec<ObservationEvent>,
    pub flushes: Vec<NarrationRequest>,
    /// Set when classification was skipped because no observer is tracked.
    pub observer_missing: bool,
}

/// Synchronous core: sample, classify, buffer and assemble payloads.
/// Dispatching the payloads is left to the caller.
pub struct NarrationPipeline {
    tracker: EntityTracker,
    builder: EventBuilder,
    window: EventHistoryWindow,
    snapshotter: EnvironmentSnapshotter,
    settings: PipelineSettings,
    start: Option<Arc<EnvironmentSnapshot>>,
    current: Option<EnvironmentSnapshot>,
    prior_responses: VecDeque<String>,
    flush_sequence: u64,
    logger: DynLogger,
}

impl NarrationPipeline {
    pub fn new(
        tracker: EntityTracker,
        builder: EventBuilder,
        window: EventHistoryWindow,
        snapshotter: EnvironmentSnapshotter,
        settings: PipelineSettings,
        logger: DynLogger,
    ) -> Self {
        Self {
            tracker,
            builder,
            window,
            snapshotter,
            settings,
            start: None,
            current: None,
            prior_responses: VecDeque::new(),
            flush_sequence: 0,
            logger,
        }
    }

    /// Registers the world's entities and captures the start environment.
    /// The start snapshot is taken once and kept for the whole session.
    pub fn initialize(&mut self, world: &dyn WorldQuery) -> DomainResult<usize> {
        let tracked = self.tracker.register_from_world(world)?;
        if self.tracker.observer().is_none() {
            self.logger
                .warn("No observer found at start-up; movements will not be classified");
        }
        self.logger.info(&format!(
            "Tracking {} entities (observer: {})",
            tracked,
            self.tracker.observer().map(|o| o.id.as_str()).unwrap_or("none")
        ));

        if self.start.is_none() {
            let snapshot = self.snapshotter.snapshot(world);
            self.logger.info(&format!(
                "Start environment captured with {} objects",
                snapshot.objects.len()
            ));
            self.start = Some(Arc::new(snapshot));
        }
        Ok(tracked)
    }

    pub fn tick(&mut self, world: &dyn WorldQuery) -> TickReport {
        let sample = self.tracker.sample(world);
        for id in &sample.stale {
            self.logger.debug(&format!("Entity {} is no longer valid", id));
        }
        for id in &sample.invalid {
            self.logger.warn(&format!("Could not read position of {}", id));
        }

        let tracking_events = self.tracker.take_uncommitted_events();
        let mut report = TickReport {
            sample,
            tracking_events,
            ..TickReport::default()
        };

        if self.tracker.observer().is_none() {
            if !report.tracking_events.is_empty() {
                self.logger.warn(&DomainError::MissingObserver.to_string());
            }
            report.observer_missing = true;
            return report;
        }

        let frame = ObserverFrame::from_world(world);
        let moved: Vec<(String, Vector3)> = report
            .tracking_events
            .iter()
            .filter_map(|event| match event {
                TrackingEvent::EntityMoved {
                    entity_id,
                    current_position,
                    is_observer: false,
                    ..
                } => Some((entity_id.clone(), *current_position)),
                _ => None,
            })
            .collect();

        for (entity_id, position) in moved {
            let measurement = frame.measure(position);
            self.logger.debug(&format!(
                "{} at {:.2} units, dots f={:.3} r={:.3} v={:.3}",
                entity_id,
                measurement.distance,
                measurement.projections.forward,
                measurement.projections.right,
                measurement.projections.vertical
            ));

            let Some(event) = self.builder.build(&entity_id, &measurement) else {
                continue;
            };
            self.logger.info(&format!(
                "{} {} ({:.2} units)",
                event.target_id, event.relative_position, event.distance
            ));
            report.observations.push(event.clone());

            if self.window.push(event) == PushOutcome::FlushDue {
                match self.flush(world) {
                    Ok(request) => report.flushes.push(request),
                    Err(e) => self.logger.error(&format!("Flush skipped: {}", e)),
                }
            }
        }
        report
    }

    /// Assembles a request from the current window. The window counter has
    /// already been reset by the time this runs, so a failure here consumes
    /// the flush.
    pub fn flush(&mut self, world: &dyn WorldQuery) -> DomainResult<NarrationRequest> {
        let current = self.snapshotter.snapshot(world);
        self.current = Some(current.clone());
        let start = match &self.start {
            Some(start) => start.clone(),
            None => {
                let start = Arc::new(current.clone());
                self.start = Some(start.clone());
                start
            }
        };

        let payload = NarrationPayload {
            start_environment: (*start).clone(),
            current_environment: current,
            event_history: self.window.to_vec(),
            prior_responses: self.prior_responses.iter().cloned().collect(),
        };
        payload.validate()?;

        self.flush_sequence += 1;
        self.logger.info(&format!(
            "Flush #{} with {} events",
            self.flush_sequence,
            payload.event_history.len()
        ));
        Ok(NarrationRequest {
            sequence: self.flush_sequence,
            system_prompt: self.settings.system_prompt.clone(),
            payload,
        })
    }

    /// Keeps an answer so later payloads can continue the story.
    pub fn record_response(&mut self, text: &str) {
        if text.is_empty() || self.settings.max_prior_responses == 0 {
            return;
        }
        self.prior_responses.push_back(text.to_string());
        while self.prior_responses.len() > self.settings.max_prior_responses {
            self.prior_responses.pop_front();
        }
    }

    pub fn tracker(&self) -> &EntityTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut EntityTracker {
        &mut self.tracker
    }

    pub fn window(&self) -> &EventHistoryWindow {
        &self.window
    }

    pub fn start_snapshot(&self) -> Option<Arc<EnvironmentSnapshot>> {
        self.start.clone()
    }

    pub fn current_snapshot(&self) -> Option<&EnvironmentSnapshot> {
        self.current.as_ref()
    }

    pub fn prior_responses(&self) -> Vec<String> {
        self.prior_responses.iter().cloned().collect()
    }

    pub fn flush_count(&self) -> u64 {
        self.flush_sequence
    }
}

mod common;

use async_trait::async_trait;
use common::MockWorld;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use storygen_app::adapters::inbound::{FileEventJournal, InMemoryEventJournal};
use storygen_app::adapters::outbound::{init_noop_logger, InMemoryResponseSlot};
use storygen_app::application::*;
use storygen_app::common::{DomainError, DomainResult, EventJournal, Tickable, Vector3};
use storygen_app::domains::environment::{EnvironmentSnapshotter, WorldMetadata};
use storygen_app::domains::history::EventHistoryWindow;
use storygen_app::domains::narration::*;
use storygen_app::domains::relativity::EventBuilder;
use storygen_app::domains::tracking::{EntityTracker, WorldQuery};

struct ScriptedDispatcher {
    answer: Result<String, String>,
    calls: Mutex<Vec<NarrationRequest>>,
    summaries: Mutex<Vec<SummaryRequest>>,
}

impl ScriptedDispatcher {
    fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
            summaries: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: Err("connection refused".to_string()),
            calls: Mutex::new(Vec::new()),
            summaries: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl NarrationDispatcher for ScriptedDispatcher {
    async fn complete(&self, request: &NarrationRequest) -> DomainResult<String> {
        self.calls.lock().unwrap().push(request.clone());
        self.answer.clone().map_err(DomainError::DispatchFailure)
    }

    async fn summarize(&self, request: &SummaryRequest) -> DomainResult<String> {
        self.summaries.lock().unwrap().push(request.clone());
        self.answer.clone().map_err(DomainError::DispatchFailure)
    }
}

struct Harness {
    world: Arc<MockWorld>,
    slot: Arc<InMemoryResponseSlot>,
    service: NarrationService,
}

fn harness(dispatcher: Arc<ScriptedDispatcher>, capacity: usize) -> Harness {
    let world = Arc::new(MockWorld::new());
    world.add_prop("crate", Vector3::new(100.0, 0.0, 0.0));
    let slot = Arc::new(InMemoryResponseSlot::new());

    let pipeline = NarrationPipeline::new(
        EntityTracker::default(),
        EventBuilder::default(),
        EventHistoryWindow::new(capacity),
        EnvironmentSnapshotter::new(WorldMetadata::default()),
        PipelineSettings::default(),
        init_noop_logger(),
    );
    let service = NarrationService::new(
        pipeline,
        world.clone() as Arc<dyn WorldQuery>,
        dispatcher,
        slot.clone(),
        Duration::from_millis(100),
        init_noop_logger(),
    );
    Harness { world, slot, service }
}

fn nudge(world: &MockWorld, step: usize) {
    world.move_to("crate", Vector3::new(100.0, step as f64, 0.0));
}

#[tokio::test]
async fn test_start_clears_the_slot() {
    let mut h = harness(ScriptedDispatcher::ok("x"), 10);
    h.slot.write("left over from last session").unwrap();

    assert_eq!(h.service.start().unwrap(), 1);
    assert_eq!(h.slot.read().unwrap(), "");
    assert!(h.service.journal_entries("crate").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_successful_dispatch_writes_trimmed_response() {
    let dispatcher = ScriptedDispatcher::ok("\n\nThe crate edged closer.\n");
    let mut h = harness(dispatcher.clone(), 1);
    h.service.start().unwrap();

    nudge(&h.world, 1);
    let report = h.service.run_tick();
    assert_eq!(report.flushes.len(), 1);

    let outcomes = h.service.wait_for_dispatches().await;
    assert_eq!(
        outcomes,
        vec![DispatchOutcome::Delivered {
            sequence: 1,
            text: "The crate edged closer.".to_string()
        }]
    );
    assert_eq!(h.slot.read().unwrap(), "The crate edged closer.");
    assert_eq!(
        h.service.pipeline().prior_responses(),
        vec!["The crate edged closer.".to_string()]
    );

    // The next payload continues the story.
    nudge(&h.world, 2);
    h.service.run_tick();
    h.service.wait_for_dispatches().await;
    let calls = dispatcher.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].payload.prior_responses.is_empty());
    assert_eq!(calls[1].payload.prior_responses, vec!["The crate edged closer.".to_string()]);
}

#[tokio::test]
async fn test_failure_writes_failure_text() {
    let mut h = harness(ScriptedDispatcher::failing(), 1);
    h.service.start().unwrap();

    nudge(&h.world, 1);
    h.service.run_tick();
    let outcomes = h.service.wait_for_dispatches().await;

    assert!(matches!(outcomes[0], DispatchOutcome::Failed { sequence: 1, .. }));
    assert_eq!(h.slot.read().unwrap(), DEFAULT_FAILURE_TEXT);
    assert!(h.service.pipeline().prior_responses().is_empty());
    // A failed request does not roll the window back.
    assert_eq!(h.service.pipeline().window().counter(), 0);
    assert_eq!(h.service.pipeline().window().len(), 1);
}

#[tokio::test]
async fn test_failure_can_retain_previous_text() {
    let h = harness(ScriptedDispatcher::failing(), 1);
    let mut service = h.service.with_failure_handling(FailureHandling {
        policy: FailurePolicy::RetainPrevious,
        text: DEFAULT_FAILURE_TEXT.to_string(),
    });
    service.start().unwrap();
    h.slot.write("An older story.").unwrap();

    nudge(&h.world, 1);
    service.run_tick();
    service.wait_for_dispatches().await;
    assert_eq!(h.slot.read().unwrap(), "An older story.");
}

#[tokio::test]
async fn test_journal_records_pipeline_events() {
    let journal = Arc::new(InMemoryEventJournal::new());
    let h = harness(ScriptedDispatcher::ok("Story."), 1);
    let mut service = h.service.with_journal(journal.clone());
    service.start().unwrap();

    nudge(&h.world, 1);
    service.run_tick();
    service.wait_for_dispatches().await;

    let observed = journal.load_by_type("ObservationRecorded", None).await.unwrap();
    assert_eq!(observed.len(), 1);
    assert_eq!(observed[0].subject_id, "crate");
    assert_eq!(journal.load_by_type("EntityMoved", None).await.unwrap().len(), 1);
    assert_eq!(journal.load_by_type("FlushDispatched", None).await.unwrap().len(), 1);

    let narration = service.journal_entries("narration").await.unwrap();
    assert!(narration.iter().any(|e| e.event_type == "ResponseReceived"));
}

#[tokio::test]
async fn test_journal_keeps_tick_order() {
    let journal = Arc::new(InMemoryEventJournal::new());
    let h = harness(ScriptedDispatcher::ok("Story."), 10);
    let mut service = h.service.with_journal(journal.clone());
    service.start().unwrap();

    for step in 1..=6 {
        nudge(&h.world, step);
        service.run_tick();
    }
    service.wait_for_dispatches().await;

    let moves: Vec<f64> = journal
        .load_subject("crate")
        .await
        .unwrap()
        .iter()
        .filter(|e| e.event_type == "EntityMoved")
        .map(|e| e.event_data["EntityMoved"]["current_position"]["y"].as_f64().unwrap())
        .collect();
    assert_eq!(moves, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_journal_is_complete_after_shutdown_wait() {
    let dir = tempfile::TempDir::new().unwrap();
    let journal = Arc::new(FileEventJournal::new(dir.path()));
    let h = harness(ScriptedDispatcher::ok("Story."), 10);
    let mut service = h.service.with_journal(journal.clone());
    service.start().unwrap();

    for step in 1..=5 {
        nudge(&h.world, step);
        service.run_tick();
    }
    service.wait_for_dispatches().await;

    let observed = journal.load_by_type("ObservationRecorded", None).await.unwrap();
    assert_eq!(observed.len(), 5);
}

#[tokio::test]
async fn test_on_tick_follows_cadence() {
    let dispatcher = ScriptedDispatcher::ok("Story.");
    let mut h = harness(dispatcher.clone(), 1);
    h.service.start().unwrap();

    nudge(&h.world, 1);
    h.service.on_tick(Duration::from_millis(40));
    h.service.on_tick(Duration::from_millis(40));
    assert_eq!(h.service.pipeline().window().len(), 0);

    h.service.on_tick(Duration::from_millis(40));
    assert_eq!(h.service.pipeline().window().len(), 1);
    h.service.wait_for_dispatches().await;
    assert_eq!(dispatcher.calls.lock().unwrap().len(), 1);
}

fn summary_settings(slot: Arc<InMemoryResponseSlot>) -> SummarySettings {
    SummarySettings {
        slot,
        system_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
        metadata: WorldMetadata {
            title: "Courtyard".to_string(),
            theme: "dusk".to_string(),
            description: "A quiet yard".to_string(),
        },
    }
}

#[tokio::test]
async fn test_start_sends_world_summary_to_its_own_slot() {
    let dispatcher = ScriptedDispatcher::ok("  The courtyard waits.  ");
    let summary_slot = Arc::new(InMemoryResponseSlot::new());
    summary_slot.write("stale summary").unwrap();
    let h = harness(dispatcher.clone(), 10);
    let mut service = h.service.with_summary(summary_settings(summary_slot.clone()));

    service.start().unwrap();
    let result = service.wait_for_summary().await;

    assert_eq!(result, Some(Ok("The courtyard waits.".to_string())));
    assert_eq!(summary_slot.read().unwrap(), "The courtyard waits.");
    assert_eq!(h.slot.read().unwrap(), "");
    assert!(service.pipeline().prior_responses().is_empty());

    let summaries = dispatcher.summaries.lock().unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0].summary;
    assert_eq!(summary.game_title, "Courtyard");
    assert_eq!(summary.players[0].id, "player");
    assert_eq!(summary.objects.len(), 1);
    assert_eq!(summary.objects[0].id, "crate");
    assert_eq!(summary.objects[0].role, Some(ObjectRole::Static));
    assert!(dispatcher.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_world_summary_writes_failure_text() {
    let journal = Arc::new(InMemoryEventJournal::new());
    let summary_slot = Arc::new(InMemoryResponseSlot::new());
    let h = harness(ScriptedDispatcher::failing(), 10);
    let mut service = h
        .service
        .with_journal(journal.clone())
        .with_summary(summary_settings(summary_slot.clone()));

    service.start().unwrap();
    service.wait_for_dispatches().await;

    assert_eq!(summary_slot.read().unwrap(), DEFAULT_FAILURE_TEXT);
    let kinds: Vec<String> = service
        .journal_entries("narration")
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.event_type)
        .collect();
    assert_eq!(kinds, vec!["SummaryDispatched".to_string(), "SummaryFailed".to_string()]);
}

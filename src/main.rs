use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use storygen_app::adapters::inbound::{FileEventJournal, SceneWorld};
use storygen_app::adapters::outbound::{
    init_buffered_logger, init_combined_logger, init_noop_logger, init_tracing_logger, CompletionsClient,
    FileResponseSlot, OpenAiChatClient,
};
use storygen_app::application::{HudFeed, NarrationService, SummarySettings};
use storygen_app::config::LlmProvider;
use storygen_app::domains::environment::EnvironmentSnapshotter;
use storygen_app::domains::history::EventHistoryWindow;
use storygen_app::domains::logger::DynLogger;
use storygen_app::domains::narration::{NarrationDispatcher, NarrationPipeline, ResponseSlot};
use storygen_app::domains::tracking::{EntityTracker, WorldQuery};
use storygen_app::{Config, Tickable};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting storygen-app with {}", config_path);

    let logger: DynLogger = match &config.logging.file {
        _ if config.logging.level.eq_ignore_ascii_case("off") => init_noop_logger(),
        Some(path) => init_combined_logger(path, &config.logging.level),
        None => init_tracing_logger("storygen"),
    };
    let logger = if config.logging.buffered {
        init_buffered_logger(logger, config.logging.buffer_capacity)
    } else {
        logger
    };

    let scene = Arc::new(SceneWorld::load(&config.environment.scene_path)?);
    info!("Scene '{}' loaded", scene.metadata().title);
    let world: Arc<dyn WorldQuery> = scene.clone();

    let mut snapshotter = EnvironmentSnapshotter::new(scene.metadata().clone());
    snapshotter.name_denylist = config.environment.name_denylist.clone();
    snapshotter.max_extent = config.environment.max_extent;

    let pipeline = NarrationPipeline::new(
        EntityTracker::new(config.tracking.position_epsilon),
        config.event_builder(),
        EventHistoryWindow::new(config.history.capacity),
        snapshotter,
        config.pipeline_settings(),
        logger.clone(),
    );

    let endpoint = config.llm_endpoint();
    if endpoint.api_key.is_none() && config.llm.provider == LlmProvider::OpenaiChat {
        warn!("No API key found; requests will likely be rejected");
    }
    let dispatcher: Arc<dyn NarrationDispatcher> = match config.llm.provider {
        LlmProvider::OpenaiChat => Arc::new(OpenAiChatClient::new(endpoint)?),
        LlmProvider::Completions => Arc::new(CompletionsClient::new(endpoint)?),
    };
    let slot: Arc<dyn ResponseSlot> = Arc::new(FileResponseSlot::new(&config.response.path));

    let mut service = NarrationService::new(
        pipeline,
        world,
        dispatcher,
        slot.clone(),
        config.sample_interval(),
        logger.clone(),
    )
    .with_failure_handling(config.failure_handling());
    if config.journal.enabled {
        service = service.with_journal(Arc::new(FileEventJournal::new(&config.journal.path)));
    }
    let summary_slot: Option<Arc<dyn ResponseSlot>> = config
        .summary
        .enabled
        .then(|| Arc::new(FileResponseSlot::new(&config.summary.path)) as Arc<dyn ResponseSlot>);
    if let Some(summary_slot) = &summary_slot {
        service = service.with_summary(SummarySettings {
            slot: summary_slot.clone(),
            system_prompt: config.summary_prompt(),
            metadata: scene.metadata().clone(),
        });
    }

    let tracked = service.start()?;
    info!("Tracking {} scene objects", tracked);

    let mut hud = HudFeed::new(slot, config.hud_poll_interval(), config.hud.lines, logger.clone());
    if let Some(summary_slot) = summary_slot {
        hud = hud.with_summary(summary_slot);
    }

    let tick = Duration::from_millis(config.tracking.sample_interval_ms.min(config.hud.poll_interval_ms));
    let mut interval = tokio::time::interval(tick);
    let mut last = tokio::time::Instant::now();

    loop {
        tokio::select! {
            now = interval.tick() => {
                let delta = now.duration_since(last);
                last = now;
                scene.advance(delta);
                service.on_tick(delta);
                hud.on_tick(delta);
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl-C: {}", e);
                }
                break;
            }
        }
    }

    info!("Shutting down, waiting for {} pending requests", service.pending_dispatches());
    for outcome in service.wait_for_dispatches().await {
        info!("Request #{} finished", outcome.sequence());
    }
    match service.journal_entries("narration").await {
        Ok(entries) if !entries.is_empty() => info!("Journal holds {} narration records", entries.len()),
        Ok(_) => {}
        Err(e) => warn!("Could not read journal: {}", e),
    }
    if let Some(summary) = hud.summary().filter(|s| !s.is_empty()) {
        info!("HUD summary: {}", summary);
    }
    for line in hud.lines().iter().filter(|l| !l.is_empty()) {
        info!("HUD: {}", line);
    }
    Ok(())
}

use std::fs;
use std::path::Path;
use std::time::Duration;
use storygen_app::adapters::inbound::{FileEventJournal, SceneWorld};
use storygen_app::adapters::outbound::{CompletionsClient, FileResponseSlot, LlmEndpoint, OpenAiChatClient};
use storygen_app::common::{EventEnvelope, EventJournal, Vector3};
use storygen_app::domains::environment::{EnvironmentSnapshot, EnvironmentSnapshotter, WorldMetadata};
use storygen_app::domains::narration::{
    NarrationPayload, NarrationRequest, ResponseSlot, SummaryRequest, WorldSummary, DEFAULT_SUMMARY_PROMPT,
};
use storygen_app::domains::relativity::{ObservationEvent, RelativeDirection, RelativePosition};
use storygen_app::domains::tracking::{EntityKind, WorldQuery};
use tempfile::tempdir;

fn endpoint() -> LlmEndpoint {
    LlmEndpoint {
        base_url: "http://localhost:1234".to_string(),
        model: "local-model".to_string(),
        temperature: 0.7,
        max_tokens: 150,
        api_key: None,
        timeout: Duration::from_secs(5),
    }
}

fn request() -> NarrationRequest {
    let snapshot = EnvironmentSnapshot::new(&WorldMetadata::default(), vec![]);
    NarrationRequest {
        sequence: 1,
        system_prompt: "Tell a story.".to_string(),
        payload: NarrationPayload {
            start_environment: snapshot.clone(),
            current_environment: snapshot,
            event_history: vec![ObservationEvent::new(
                "crate",
                141.42,
                RelativePosition::Spatial(RelativeDirection::FrontRightBelow),
                chrono::Utc::now(),
            )],
            prior_responses: vec![],
        },
    }
}

#[test]
fn test_file_response_slot_roundtrip() {
    let dir = tempdir().unwrap();
    let slot = FileResponseSlot::new(dir.path().join("LLM_Response").join("LLM_response.txt"));

    assert_eq!(slot.read().unwrap(), "");
    slot.write("The crate rolled closer.").unwrap();
    assert_eq!(
        fs::read_to_string(slot.path()).unwrap(),
        "The crate rolled closer."
    );
    assert_eq!(slot.read().unwrap(), "The crate rolled closer.");

    slot.clear().unwrap();
    assert_eq!(slot.read().unwrap(), "");
}

#[test]
fn test_file_response_slot_replaces_whole_file() {
    let dir = tempdir().unwrap();
    let slot = FileResponseSlot::new(dir.path().join("LLM_response.txt"));

    slot.write("A long first story about the barrel rolling past the well.").unwrap();
    slot.write("Short.").unwrap();
    assert_eq!(slot.read().unwrap(), "Short.");

    let names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["LLM_response.txt".to_string()]);
}

#[test]
fn test_chat_body_carries_payload_as_string() {
    let client = OpenAiChatClient::new(endpoint()).unwrap();
    let body = serde_json::to_value(client.request_body(&request()).unwrap()).unwrap();

    assert_eq!(body["model"], "local-model");
    assert_eq!(body["max_tokens"], 150);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "Tell a story.");
    assert_eq!(body["messages"][1]["role"], "user");

    let payload: serde_json::Value =
        serde_json::from_str(body["messages"][1]["content"].as_str().unwrap()).unwrap();
    assert_eq!(payload["event_history"][0]["label"], "front-right-below");
}

#[test]
fn test_completions_prompt_prefixes_system_prompt() {
    let client = CompletionsClient::new(endpoint()).unwrap();
    let body = client.request_body(&request()).unwrap();
    assert!(body.prompt.starts_with("Tell a story.\n{"));
    assert!(body.prompt.contains("\"event_history\""));
}

#[test]
fn test_summary_body_describes_scene() {
    let world = SceneWorld::from_json(
        r#"{
            "metadata": {"title": "Yard", "theme": "dusk", "description": "A quiet yard"},
            "observer": {"id": "wanderer", "position": {"x": 0, "y": 0, "z": 0}},
            "objects": [
                {"id": "lever", "name": "Old lever", "position": {"x": 5, "y": 0, "z": 0},
                 "tags": ["Type: lever", "Interactable"]},
                {"id": "guard", "position": {"x": 0, "y": 9, "z": 0}, "kind": "character"}
            ]
        }"#,
    )
    .unwrap();
    let request = SummaryRequest {
        system_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
        summary: WorldSummary::from_world(&world, world.metadata()),
    };

    let client = OpenAiChatClient::new(endpoint()).unwrap();
    let body = serde_json::to_value(client.summary_body(&request).unwrap()).unwrap();
    assert_eq!(body["messages"][0]["content"], DEFAULT_SUMMARY_PROMPT);

    let summary: serde_json::Value =
        serde_json::from_str(body["messages"][1]["content"].as_str().unwrap()).unwrap();
    assert_eq!(summary["game_title"], "Yard");
    assert_eq!(summary["players"][0]["id"], "wanderer");
    assert_eq!(summary["players"][1]["id"], "guard");
    assert_eq!(summary["objects"][0]["id"], "Old lever");
    assert_eq!(summary["objects"][0]["type"], "Interactable");

    let completion = CompletionsClient::new(endpoint()).unwrap().summary_body(&request).unwrap();
    assert!(completion.prompt.starts_with(DEFAULT_SUMMARY_PROMPT));
}

#[test]
fn test_non_finite_payload_is_not_sent() {
    let client = OpenAiChatClient::new(endpoint()).unwrap();
    let mut request = request();
    request.payload.event_history[0].distance = f64::NAN;
    assert!(client.request_body(&request).is_err());
}

#[test]
fn test_scene_file_loads_and_snapshots() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scene.json");
    fs::write(
        &path,
        r#"{
            "metadata": {"title": "Yard", "theme": "dusk", "description": "A quiet yard"},
            "observer": {"id": "wanderer", "position": {"x": 0, "y": 0, "z": 0}},
            "objects": [
                {"id": "crate", "name": "Crate", "position": {"x": 10, "y": 0, "z": 0},
                 "extent": {"x": 1, "y": 1, "z": 1}, "tags": ["Type: box"]},
                {"id": "cam", "position": {"x": 0, "y": 0, "z": 2}, "kind": "camera"}
            ]
        }"#,
    )
    .unwrap();

    let world = SceneWorld::load(&path).unwrap();
    assert_eq!(world.metadata().title, "Yard");
    assert_eq!(world.observer_forward(), Vector3::FORWARD);
    let kinds: Vec<_> = world.enumerate_world_objects().iter().map(|o| o.kind).collect();
    assert_eq!(kinds, vec![EntityKind::Observer, EntityKind::Prop, EntityKind::Camera]);

    let snapshot = EnvironmentSnapshotter::new(world.metadata().clone()).snapshot(&world);
    assert_eq!(snapshot.objects.len(), 1);
    assert_eq!(snapshot.objects[0].dimensions, Vector3::new(2.0, 2.0, 2.0));
}

#[test]
fn test_bundled_demo_scene_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("resources/scenes/demo_scene.json");
    let world = SceneWorld::load(path).unwrap();
    assert_eq!(world.observer_id().as_deref(), Some("wanderer"));

    let snapshot = EnvironmentSnapshotter::new(world.metadata().clone()).snapshot(&world);
    assert!(snapshot.object("Wooden Crate").is_some());
    assert!(snapshot.object("Courtyard Floor").is_none());
}

#[test]
fn test_missing_scene_is_infrastructure_error() {
    assert!(SceneWorld::load("/definitely/not/here.json").is_err());
}

#[test]
fn test_file_journal_outside_async_test() {
    let dir = tempdir().unwrap();
    let journal = FileEventJournal::new(dir.path().join("journal"));
    let event = ObservationEvent::new(
        "crate/1",
        50.0,
        RelativePosition::Spatial(RelativeDirection::DirectlyAbove),
        chrono::Utc::now(),
    );
    let envelope = EventEnvelope::new(&event, "test").unwrap();

    tokio_test::block_on(async {
        journal.append(vec![envelope.clone()]).await.unwrap();
        let loaded = journal.load_subject("crate/1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].event_id, envelope.event_id);
        assert_eq!(loaded[0].event_data["label"], "directly above");
    });
    assert!(dir.path().join("journal").join("crate_1.jsonl").exists());
}

use crate::common::{EventEnvelope, EventJournal};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// JSON Lines journal. Envelopes are appended to one file per subject so
/// several processes can share a journal directory.
pub struct FileEventJournal {
    base_path: PathBuf,
}

impl FileEventJournal {
    pub fn new<P: Into<PathBuf>>(base_path: P) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File for a subject; characters unsafe in file names become `_`.
    fn get_file_path(&self, subject_id: &str) -> PathBuf {
        let file_stem: String = subject_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.jsonl", file_stem))
    }

    async fn ensure_base_dir(&self) -> Result<(), String> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("Failed to create journal directory: {}", e))
    }

    async fn read_file(path: &Path) -> Result<Vec<EventEnvelope>, String> {
        let file = File::open(path)
            .await
            .map_err(|e| format!("Failed to open journal file {}: {}", path.display(), e))?;

        let mut lines = BufReader::new(file).lines();
        let mut events = Vec::new();
        let mut line_number = 0u64;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("Failed to read line: {}", e))?
        {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let event: EventEnvelope = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to deserialize event at line {}: {}", line_number, e))?;
            events.push(event);
        }
        Ok(events)
    }
}

#[async_trait]
impl EventJournal for FileEventJournal {
    async fn append(&self, events: Vec<EventEnvelope>) -> Result<(), String> {
        if events.is_empty() {
            return Ok(());
        }
        self.ensure_base_dir().await?;

        let mut by_subject: BTreeMap<String, String> = BTreeMap::new();
        for event in events {
            let json_line =
                serde_json::to_string(&event).map_err(|e| format!("Failed to serialize event: {}", e))?;
            let buffer = by_subject.entry(event.subject_id.clone()).or_default();
            buffer.push_str(&json_line);
            buffer.push('\n');
        }

        for (subject_id, buffer) in by_subject {
            let file_path = self.get_file_path(&subject_id);
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)
                .await
                .map_err(|e| format!("Failed to open journal file {}: {}", file_path.display(), e))?;

            // One write per subject keeps lines from concurrent appends whole.
            file.write_all(buffer.as_bytes())
                .await
                .map_err(|e| format!("Failed to write events: {}", e))?;
            file.flush()
                .await
                .map_err(|e| format!("Failed to flush journal file: {}", e))?;
        }
        Ok(())
    }

    async fn load_subject(&self, subject_id: &str) -> Result<Vec<EventEnvelope>, String> {
        let file_path = self.get_file_path(subject_id);
        if !file_path.exists() {
            return Ok(vec![]);
        }
        Ok(Self::read_file(&file_path)
            .await?
            .into_iter()
            .filter(|e| e.subject_id == subject_id)
            .collect())
    }

    async fn load_by_type(
        &self,
        event_type: &str,
        from_timestamp: Option<DateTime<Utc>>,
    ) -> Result<Vec<EventEnvelope>, String> {
        self.ensure_base_dir().await?;

        let mut all_events = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.base_path)
            .await
            .map_err(|e| format!("Failed to read directory: {}", e))?;

        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| format!("Failed to read directory entry: {}", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("jsonl") {
                continue;
            }
            all_events.extend(
                Self::read_file(&path)
                    .await?
                    .into_iter()
                    .filter(|e| e.event_type == event_type)
                    .filter(|e| from_timestamp.map_or(true, |from| e.occurred_at >= from)),
            );
        }

        all_events.sort_by(|a, b| a.occurred_at.cmp(&b.occurred_at));
        Ok(all_events)
    }
}

//! The local persistent todo store.
//!
//! Owns the in-memory collection (newest first) and re-persists the whole
//! collection through the injected `TodoStorage` after every mutation.
//! Snapshots are queued to a single writer task, so they land in mutation
//! order even when an individual write is slow. Persistence is best-effort:
//! write failures are logged, never surfaced, so the todo experience stays
//! available. The accepted data-loss window is a crash between a mutation
//! and its completed write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use super::storage::{StorageError, TodoStorage};

/// A single user task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    /// Never empty or whitespace-only; always stored trimmed.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    pub completed: bool,
    /// Creation timestamp, immutable across edits and toggles.
    pub created_at: DateTime<Utc>,
}

type WriteAck = oneshot::Sender<Result<(), StorageError>>;

/// Single-writer store over the todo collection.
pub struct TodoStore {
    todos: Vec<Todo>,
    storage: Arc<dyn TodoStorage>,
    writer: mpsc::UnboundedSender<(String, Option<WriteAck>)>,
    loaded: bool,
}

impl TodoStore {
    /// Spawns the writer task that drains queued snapshots in order. The
    /// task exits once the store is dropped and the queue is empty.
    pub fn new(storage: Arc<dyn TodoStorage>) -> Self {
        let (writer, mut queue) = mpsc::unbounded_channel::<(String, Option<WriteAck>)>();
        let sink = Arc::clone(&storage);
        tokio::spawn(async move {
            while let Some((payload, ack)) = queue.recv().await {
                let result = sink.write(&payload).await;
                match ack {
                    Some(ack) => {
                        let _ = ack.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            tracing::error!("Failed to persist todos: {}", e);
                        }
                    }
                }
            }
        });

        Self {
            todos: Vec::new(),
            storage,
            writer,
            loaded: false,
        }
    }

    /// Read the persisted collection once at startup.
    ///
    /// Missing or corrupt data yields an empty collection; the parse failure
    /// is logged and never surfaced. Subsequent calls are no-ops.
    pub async fn load(&mut self) {
        if self.loaded {
            return;
        }

        self.todos = match self.storage.read().await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Persisted todos are corrupt, starting empty: {}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read persisted todos, starting empty: {}", e);
                Vec::new()
            }
        };
        self.loaded = true;
    }

    /// Ordered collection, newest first.
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Count of items not yet completed.
    pub fn remaining(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    /// Create a todo and prepend it. Silently a no-op when the title trims
    /// to empty.
    pub fn add(&mut self, title: &str, description: Option<&str>) {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return;
        }

        self.todos.insert(
            0,
            Todo {
                id: Uuid::new_v4(),
                title: trimmed.to_string(),
                description: description.map(str::to_string),
                completed: false,
                created_at: Utc::now(),
            },
        );
        self.persist();
    }

    /// Flip `completed` on the matching item. No-op when `id` is unknown.
    pub fn toggle(&mut self, id: Uuid) {
        if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
            todo.completed = !todo.completed;
            self.persist();
        }
    }

    /// Remove the matching item. No-op when `id` is unknown.
    pub fn delete(&mut self, id: Uuid) {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        if self.todos.len() != before {
            self.persist();
        }
    }

    /// Replace title and description on the matching item. A title that
    /// trims to empty discards the whole edit; `id`, `completed`, and
    /// `created_at` are never touched.
    pub fn edit(&mut self, id: Uuid, title: &str, description: Option<&str>) {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return;
        }

        if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
            todo.title = trimmed.to_string();
            todo.description = description.map(str::to_string);
            self.persist();
        }
    }

    /// Queue the current collection behind any pending snapshots and wait
    /// for its write to finish. Used at shutdown; regular mutations persist
    /// fire-and-forget instead.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let payload = serde_json::to_string(&self.todos)?;
        let (ack, done) = oneshot::channel();
        self.writer
            .send((payload, Some(ack)))
            .map_err(|_| StorageError::WriterGone)?;
        done.await.map_err(|_| StorageError::WriterGone)?
    }

    /// Best-effort re-persist of the full collection, queued to the writer
    /// task so snapshots reach storage in mutation order.
    fn persist(&self) {
        let payload = match serde_json::to_string(&self.todos) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize todos: {}", e);
                return;
            }
        };
        let _ = self.writer.send((payload, None));
    }
}

//! Remote status documents written per user and per entity

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use waypoint_errors::{Error, StatusError};
use waypoint_events::{AppEvent, EventEmitter, EventSender, StatusEvent};
use waypoint_types::EntityGuid;

use crate::state::InstallState;
use crate::subscriber::{StatusSubscriber, StatusUpdate};

/// Collection the status documents are written to
pub const DEFAULT_STATUS_COLLECTION: &str = "openInstallLibrary";

/// Where a status document is stored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StatusScope {
    User,
    Entity(EntityGuid),
}

impl fmt::Display for StatusScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Entity(guid) => write!(f, "entity:{guid}"),
        }
    }
}

/// Durable document storage with explicit scopes
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the write is rejected or the backend is unreachable.
    async fn write_user_document(
        &self,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error>;

    /// # Errors
    ///
    /// Returns an error if the write is rejected or the backend is unreachable.
    async fn write_entity_document(
        &self,
        guid: &EntityGuid,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error>;
}

#[async_trait]
impl<T: DocumentStore + ?Sized> DocumentStore for Arc<T> {
    async fn write_user_document(
        &self,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        (**self)
            .write_user_document(collection, document_id, document)
            .await
    }

    async fn write_entity_document(
        &self,
        guid: &EntityGuid,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        (**self)
            .write_entity_document(guid, collection, document_id, document)
            .await
    }
}

/// Persists the aggregate state on every transition
///
/// The user-scoped document is written for every update. Installed and
/// failed updates are also written once per known entity GUID. Every scope
/// is attempted even when an earlier one fails.
pub struct ScopedStatusReporter<S> {
    store: S,
    collection: String,
    tx: Option<EventSender>,
}

impl<S: DocumentStore> ScopedStatusReporter<S> {
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            collection: DEFAULT_STATUS_COLLECTION.to_string(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Scopes written for `update` given the GUIDs in `state`
    #[must_use]
    pub fn scopes_for(state: &InstallState, update: StatusUpdate<'_>) -> Vec<StatusScope> {
        let mut scopes = vec![StatusScope::User];
        if update.is_entity_scoped() {
            scopes.extend(state.entity_guids().iter().cloned().map(StatusScope::Entity));
        }
        scopes
    }

    async fn write(
        &self,
        scope: &StatusScope,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        match scope {
            StatusScope::User => {
                self.store
                    .write_user_document(&self.collection, document_id, document)
                    .await
            }
            StatusScope::Entity(guid) => {
                self.store
                    .write_entity_document(guid, &self.collection, document_id, document)
                    .await
            }
        }
    }
}

impl<S> EventEmitter for ScopedStatusReporter<S> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

#[async_trait]
impl<S: DocumentStore> StatusSubscriber for ScopedStatusReporter<S> {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn notify(&self, state: &InstallState, update: StatusUpdate<'_>) -> Result<(), Error> {
        let document = state.to_document()?;
        let document_id = state.document_id().to_string();

        let mut failed_scopes = Vec::new();
        let mut messages = Vec::new();

        for scope in Self::scopes_for(state, update) {
            match self.write(&scope, &document_id, &document).await {
                Ok(()) => self.emit(AppEvent::Status(StatusEvent::DocumentWritten {
                    scope: scope.to_string(),
                    document_id: document_id.clone(),
                })),
                Err(err) => {
                    messages.push(err.to_string());
                    failed_scopes.push(scope.to_string());
                }
            }
        }

        if failed_scopes.is_empty() {
            Ok(())
        } else {
            Err(StatusError::ScopedWriteFailed {
                scopes: failed_scopes,
                message: messages.join("; "),
            }
            .into())
        }
    }
}

/// One document accepted by [`MemoryDocumentStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub scope: StatusScope,
    pub collection: String,
    pub document_id: String,
    pub document: Value,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    user_writes: AtomicUsize,
    entity_writes: AtomicUsize,
    documents: Mutex<Vec<StoredDocument>>,
}

/// Document store kept in memory, with per-scope failure switches
///
/// Write counters include failed attempts. Clones share counters and
/// documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    inner: Arc<MemoryStoreInner>,
    user_scope_error: Option<String>,
    entity_scope_error: Option<String>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every user-scoped write with `message`
    #[must_use]
    pub fn with_user_scope_error(mut self, message: impl Into<String>) -> Self {
        self.user_scope_error = Some(message.into());
        self
    }

    /// Fail every entity-scoped write with `message`
    #[must_use]
    pub fn with_entity_scope_error(mut self, message: impl Into<String>) -> Self {
        self.entity_scope_error = Some(message.into());
        self
    }

    #[must_use]
    pub fn user_write_count(&self) -> usize {
        self.inner.user_writes.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn entity_write_count(&self) -> usize {
        self.inner.entity_writes.load(Ordering::SeqCst)
    }

    /// Successfully stored documents in write order
    #[must_use]
    pub fn documents(&self) -> Vec<StoredDocument> {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, document: StoredDocument) {
        self.inner
            .documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn write_user_document(
        &self,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        self.inner.user_writes.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.user_scope_error {
            return Err(Error::internal(message.clone()));
        }
        self.store(StoredDocument {
            scope: StatusScope::User,
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            document: document.clone(),
        });
        Ok(())
    }

    async fn write_entity_document(
        &self,
        guid: &EntityGuid,
        collection: &str,
        document_id: &str,
        document: &Value,
    ) -> Result<(), Error> {
        self.inner.entity_writes.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.entity_scope_error {
            return Err(Error::internal(message.clone()));
        }
        self.store(StoredDocument {
            scope: StatusScope::Entity(guid.clone()),
            collection: collection.to_string(),
            document_id: document_id.to_string(),
            document: document.clone(),
        });
        Ok(())
    }
}

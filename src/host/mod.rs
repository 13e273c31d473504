//! Host integration boundary.
//!
//! Everything the engine knows about the editor environment passes through
//! the traits and event types in this module. The host adapts its own
//! diagnostics, document, and version-control APIs behind these seams; the
//! engine never touches an editor API directly.

use crate::models::{ChatBubbleMessage, ContentItemMessage, LockStateMessage, StateMessage};

/// Stable identity of an open document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentId(pub String);

impl DocumentId {
    /// Creates a document id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Point-in-time view of a repository, delivered inside repository events.
///
/// `id` is a stable identity derived from the repository's root location;
/// `head_commit` may be absent in detached or initial states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySnapshot {
    /// Stable repository identity.
    pub id: String,
    /// Current HEAD commit identifier, if any.
    pub head_commit: Option<String>,
}

impl RepositorySnapshot {
    /// Creates a snapshot.
    pub fn new(id: impl Into<String>, head_commit: Option<String>) -> Self {
        Self {
            id: id.into(),
            head_commit,
        }
    }
}

/// Inbound events delivered by the host, in delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Diagnostics changed for a batch of documents.
    DiagnosticsChanged {
        /// The documents whose diagnostics changed.
        documents: Vec<DocumentId>,
    },
    /// A document's text changed.
    DocumentChanged {
        /// The changed document.
        document: DocumentId,
    },
    /// The active editor changed (possibly to none).
    ActiveEditorChanged {
        /// The newly active document, if any.
        document: Option<DocumentId>,
    },
    /// A tracked repository's state changed.
    RepositoryChanged {
        /// Snapshot of the repository after the change.
        repository: RepositorySnapshot,
    },
    /// A new repository appeared after startup.
    RepositoryOpened {
        /// Snapshot of the new repository.
        repository: RepositorySnapshot,
    },
    /// Workspace folders changed; carries the full current repository set
    /// so the watch can subscribe new repositories and purge gone ones.
    WorkspaceFoldersChanged {
        /// All repositories currently present.
        repositories: Vec<RepositorySnapshot>,
    },
    /// The user clicked the rendered character.
    CharacterClicked,
}

/// Read access to the host's diagnostics engine.
pub trait DiagnosticsProvider: Send + 'static {
    /// Error-severity diagnostic count for one document.
    fn error_count(&self, document: &DocumentId) -> u32;

    /// Total error-severity diagnostic count across all open documents.
    fn workspace_error_count(&self) -> u32;
}

/// Read access to workspace document text.
pub trait WorkspaceTextProvider: Send + 'static {
    /// The currently active document, if any.
    fn active_document(&self) -> Option<DocumentId>;

    /// Full current text of a document, if it is still open.
    fn document_text(&self, document: &DocumentId) -> Option<String>;
}

/// The presentation channel toward the rendering surface.
///
/// Owns no business logic; implementations forward messages to whatever
/// renders the character. Every message arrives fully formed.
pub trait PresentationSink: Send + 'static {
    /// The mood state changed.
    fn state_changed(&self, message: StateMessage);

    /// Show a chat bubble.
    fn chat_bubble(&self, message: ChatBubbleMessage);

    /// Deliver a content item.
    fn content_item(&self, message: ContentItemMessage);

    /// Report the feed lock countdown.
    fn lock_state(&self, message: LockStateMessage);

    /// The feed session unlocked.
    fn unlocked(&self);

    /// Surface a non-fatal warning to the user.
    fn warn(&self, text: &str);
}

//! Core collections engine for the Dayboard productivity dashboard.
//! Tasks, notes and chat threads, their derived views and the timed chat
//! and auto-save transitions live here; presentation layers call in with
//! intents and render the returned view models.

pub mod clock;
pub mod config;
pub mod logging;
pub mod model;
pub mod port;
pub mod service;
pub mod timer;
pub mod view;

pub use clock::{local_timestamp, Clock, ManualClock, SharedClock, SystemClock, Timestamp};
pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError,
    LoggingSettings,
};
pub use model::chat::{Author, ChatMessage, ChatThread, DeliveryStatus, MessageId, ThreadId};
pub use model::note::{
    normalize_tag, NewNote, Note, NoteId, NotePatch, TagValidationError, DEFAULT_NOTE_TITLE,
};
pub use model::task::{NewTask, Priority, Task, TaskId, TaskPatch, TaskValidationError};
pub use port::chat::{
    LoopbackTransport, MessageTransport, Responder, SimulatedResponder, TransportError,
};
pub use port::store::{MemoryStore, NoteStore, StoreError, StoreResult, TaskStore};
pub use service::autosave::{AutoSaveScheduler, AutoSaveStatus, ReleasedEdit};
pub use service::chat_engine::{
    ChatEngine, ChatView, InputStatus, RegenerateError, SendError, ThreadSummary,
};
pub use service::dashboard::{Dashboard, TickReport};
pub use service::note_collection::{NoteCard, NoteCollection, NoteView};
pub use service::task_collection::{CategoryCounts, TaskCard, TaskCollection, TaskView};
pub use view::badge::DueStatus;
pub use view::filter::{DateRange, NoteQuery, TaskCategory, TaskQuery};
pub use view::recency::{BucketGroup, RecencyBucket};
pub use view::sort::{NoteSortKey, TaskSortKey};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

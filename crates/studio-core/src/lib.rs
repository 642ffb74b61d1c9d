pub mod ai;
pub mod chat;
pub mod config;
pub mod duration;
pub mod format;
pub mod i18n;
pub mod layout;
pub mod proposal;
pub mod provider;
pub mod session;
pub mod state;
pub mod streaming;
pub mod svg;
pub mod viewport;

// Re-export main types for convenience
pub use ai::{ProposalError, ProposalGenerator};
pub use config::Config;
pub use format::{classify_line, format_message, Block, Segment};
pub use i18n::{Catalog, Locale, Translate};
pub use layout::{layout_proposal, FlowGraph, GraphEdge, GraphNode, LayoutConfig, LayoutMode, NodeColor, Point};
pub use proposal::{Proposal, Section, TimelineEntry};
pub use provider::Provider;
pub use session::{SessionSaver, SessionStore, SqliteSessionStore, StudioState};
pub use state::{ChatMessage, ChatRole, Feedback};
pub use streaming::{StreamHandle, StreamUpdate, StreamingPresenter};
pub use viewport::{CanvasViewport, PointerInput, ViewportCommand, ViewportState};

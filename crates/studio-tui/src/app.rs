use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use ratatui::layout::Rect;
use studio_core::chat::{build_description, compose_assistant_message};
use studio_core::layout::{layout_proposal, FlowGraph, LayoutConfig, LayoutMode, Point};
use studio_core::session::{new_session_id, SessionSaver, SessionStore, StudioState};
use studio_core::streaming::MessageId;
use studio_core::viewport::{CanvasViewport, PointerInput, ViewportCommand};
use studio_core::{
    Catalog, ChatMessage, ChatRole, Config, Feedback, Locale, Proposal, ProposalError,
    ProposalGenerator, StreamHandle, StreamUpdate, StreamingPresenter, Translate,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Canvas panes narrower than this many columns use the single-column layout.
pub const COMPACT_BREAKPOINT_COLS: f64 = 60.0;

/// Terminal cells are roughly twice as tall as they are wide; screen
/// coordinates use half-cell units so the canvas keeps its aspect ratio.
pub const CELL_WIDTH: f64 = 1.0;
pub const CELL_HEIGHT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Canvas,
    Input,
}

pub struct AppOptions {
    pub force_compact: bool,
    pub session_id: Option<String>,
    pub export_dir: PathBuf,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,
    pub locale: Locale,
    pub catalog: Catalog,

    // Conversation
    pub initial_desc: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub input_cursor: usize,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub generator: ProposalGenerator,
    pub generation_task: Option<JoinHandle<Result<Proposal, ProposalError>>>,
    generation_is_refinement: bool,

    // Streaming, one reveal per message still being revealed
    presenter: StreamingPresenter,
    streams: HashMap<MessageId, Reveal>,

    // Flow canvas
    pub proposal: Option<Proposal>,
    pub layout_config: LayoutConfig,
    pub layout_mode: LayoutMode,
    pub force_compact: bool,
    pub viewport: CanvasViewport,
    pub graph: FlowGraph,

    // Areas from the last draw, for mouse hit-testing
    pub chat_area: Option<Rect>,
    pub canvas_area: Option<Rect>,
    pub input_area: Option<Rect>,

    // Persistence
    saver: Option<SessionSaver>,
    pub session_id: String,

    // Status line and animation
    pub status: Option<String>,
    pub animation_frame: u8,
    pub export_dir: PathBuf,
}

/// A running reveal and the text it ends on.
struct Reveal {
    _handle: StreamHandle,
    text: String,
}

impl App {
    pub fn new(
        config: &Config,
        options: AppOptions,
        stream_tx: mpsc::UnboundedSender<StreamUpdate>,
        store: Option<Arc<dyn SessionStore>>,
    ) -> Self {
        let locale = config.locale();
        let layout_config = LayoutConfig::default();
        let session_id = options.session_id.unwrap_or_else(new_session_id);
        let saver = store.map(|store| SessionSaver::new(store, session_id.clone()));
        let layout_mode = if options.force_compact {
            LayoutMode::Compact
        } else {
            LayoutMode::Full
        };

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,
            locale,
            catalog: Catalog::new(locale),

            initial_desc: None,
            messages: Vec::new(),
            input: String::new(),
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            generator: ProposalGenerator::from_config(config),
            generation_task: None,
            generation_is_refinement: false,

            presenter: StreamingPresenter::new(stream_tx),
            streams: HashMap::new(),

            proposal: None,
            layout_config,
            layout_mode,
            force_compact: options.force_compact,
            viewport: CanvasViewport::new(layout_config),
            graph: FlowGraph::default(),

            chat_area: None,
            canvas_area: None,
            input_area: None,

            saver,
            session_id,

            status: None,
            animation_frame: 0,
            export_dir: options.export_dir,
        }
    }

    pub fn t(&self, key: &str) -> String {
        self.catalog.t(key)
    }

    pub fn is_generating(&self) -> bool {
        self.generation_task.is_some()
    }

    /// Resume a persisted session.
    pub fn restore(&mut self, state: StudioState) {
        info!(session_id = %self.session_id, messages = state.messages.len(), "session restored");
        self.initial_desc = state.initial_desc;
        self.messages = state
            .messages
            .into_iter()
            .map(|mut m| {
                // A reveal interrupted by a quit shows whatever text it had.
                m.is_streaming = false;
                m
            })
            .collect();
        if let Some(proposal) = state.proposal {
            self.set_proposal(proposal);
        }
    }

    /// Start the session from a description given up front.
    pub fn start_with_description(&mut self, description: String) {
        let description = description.trim().to_string();
        if description.is_empty() {
            return;
        }
        self.messages.push(ChatMessage::user(description.clone()));
        self.initial_desc = Some(description.clone());
        self.start_generation(description, false);
        self.schedule_save();
    }

    /// Send the text in the input box as a refinement request.
    pub fn send_message(&mut self) {
        let text = self.input.trim().to_string();
        if text.is_empty() || self.is_generating() {
            return;
        }

        let description = build_description(
            self.initial_desc.as_deref(),
            &self.messages,
            Some(&text),
            self.proposal.as_ref(),
            &self.catalog,
        );
        let refinement = self.proposal.is_some();

        self.messages.push(ChatMessage::user(text));
        self.input.clear();
        self.input_cursor = 0;
        self.start_generation(description, refinement);
        self.scroll_chat_to_bottom();
        self.schedule_save();
    }

    fn start_generation(&mut self, description: String, refinement: bool) {
        if self.is_generating() {
            return;
        }
        let generator = self.generator.clone();
        let locale = self.locale;
        self.generation_is_refinement = refinement;
        self.generation_task = Some(tokio::spawn(async move {
            generator.generate(&description, locale).await
        }));
    }

    /// Pick up a finished generation, if any.
    pub async fn poll_generation(&mut self) {
        let finished = self
            .generation_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }
        let Some(task) = self.generation_task.take() else {
            return;
        };

        match task.await {
            Ok(Ok(proposal)) => {
                let text =
                    compose_assistant_message(&proposal, self.generation_is_refinement, &self.catalog);
                self.set_proposal(proposal);
                self.push_streamed_message(&text);
            }
            Ok(Err(e)) => {
                let key = if e.is_quota() {
                    "chat.quotaExceeded"
                } else {
                    "chat.generationFailed"
                };
                self.messages.push(ChatMessage::assistant(self.t(key)));
            }
            Err(e) => {
                warn!(error = %e, "generation task failed");
                self.messages.push(ChatMessage::assistant(self.t("chat.generationFailed")));
            }
        }
        self.scroll_chat_to_bottom();
        self.schedule_save();
    }

    fn push_streamed_message(&mut self, text: &str) {
        let id = self.messages.len();
        self.messages.push(ChatMessage::streaming());
        let handle = self.presenter.present(id, text);
        self.streams.insert(
            id,
            Reveal {
                _handle: handle,
                text: text.to_string(),
            },
        );
    }

    /// Apply one reveal step to the message it names.
    pub fn apply_stream_update(&mut self, update: StreamUpdate) {
        let Some(message) = self.messages.get_mut(update.message_id) else {
            return;
        };
        message.content = update.content;
        message.is_streaming = update.is_streaming;

        if !update.is_streaming {
            self.streams.remove(&update.message_id);
            self.schedule_save();
        }
        self.scroll_chat_to_bottom();
    }

    pub fn set_proposal(&mut self, proposal: Proposal) {
        self.proposal = Some(proposal);
        self.relayout();
    }

    /// Rebuild the graph from scratch. Dragged positions are discarded.
    pub fn relayout(&mut self) {
        self.graph = match &self.proposal {
            Some(proposal) => layout_proposal(
                proposal,
                self.layout_mode,
                &self.layout_config,
                self.locale,
                &self.catalog,
            ),
            None => FlowGraph::default(),
        };
        self.viewport.set_graph(&self.graph);
    }

    /// Record the canvas pane from the last draw and re-layout when its width
    /// crosses the compact breakpoint.
    pub fn set_canvas_area(&mut self, area: Rect) {
        self.canvas_area = Some(area);
        self.viewport.set_screen_size(
            area.width as f64 * CELL_WIDTH,
            area.height as f64 * CELL_HEIGHT,
        );

        let mode = if self.force_compact {
            LayoutMode::Compact
        } else {
            LayoutMode::for_width(area.width as f64, COMPACT_BREAKPOINT_COLS)
        };
        if mode != self.layout_mode {
            self.layout_mode = mode;
            self.relayout();
        }
    }

    /// Canvas-relative screen point for a terminal cell.
    pub fn canvas_point(&self, column: u16, row: u16) -> Option<Point> {
        let area = self.canvas_area?;
        Some(Point::new(
            (column.saturating_sub(area.x) as f64 + 0.5) * CELL_WIDTH,
            (row.saturating_sub(area.y) as f64 + 0.5) * CELL_HEIGHT,
        ))
    }

    pub fn canvas_input(&mut self, input: PointerInput) -> bool {
        self.viewport.handle(input)
    }

    pub fn canvas_command(&mut self, command: ViewportCommand) {
        self.viewport.apply(command);
    }

    /// Index of the last assistant message.
    pub fn last_assistant_index(&self) -> Option<usize> {
        self.messages
            .iter()
            .rposition(|m| m.role == ChatRole::Assistant)
    }

    /// Copy the last assistant message, once it has finished streaming.
    pub fn copy_last_message(&mut self) {
        let Some(message) = self
            .last_assistant_index()
            .map(|i| &self.messages[i])
            .filter(|m| m.accepts_actions())
        else {
            return;
        };
        copy_to_clipboard(&message.content);
        self.status = Some(self.t("chat.copied"));
    }

    pub fn rate_last_message(&mut self, rating: Feedback) {
        let Some(index) = self.last_assistant_index() else {
            return;
        };
        if self.messages[index].toggle_feedback(rating) {
            info!(message = index, feedback = ?self.messages[index].feedback, "feedback recorded");
            self.status = Some(self.t("chat.feedbackThanks"));
            self.schedule_save();
        }
    }

    /// Write the canvas as SVG and the proposal as Markdown.
    pub fn export(&mut self) -> Result<Vec<PathBuf>> {
        let Some(proposal) = &self.proposal else {
            return Ok(Vec::new());
        };
        std::fs::create_dir_all(&self.export_dir)?;

        let short_id: String = self.session_id.chars().take(8).collect();
        let stem = format!("studio-{}", short_id);
        let svg_path = self.export_dir.join(format!("{}.svg", stem));
        let md_path = self.export_dir.join(format!("{}.md", stem));

        std::fs::write(&svg_path, studio_core::svg::render_svg(&self.viewport))?;
        std::fs::write(&md_path, proposal.to_markdown())?;

        info!(svg = %svg_path.display(), markdown = %md_path.display(), "proposal exported");
        self.status = Some(format!("{}: {}", self.t("export.done"), svg_path.display()));
        Ok(vec![svg_path, md_path])
    }

    fn snapshot(&self) -> StudioState {
        StudioState {
            initial_desc: self.initial_desc.clone(),
            messages: self.messages.clone(),
            proposal: self.proposal.clone(),
        }
    }

    fn schedule_save(&mut self) {
        if self.saver.is_none() {
            return;
        }
        let state = self.snapshot();
        if let Some(saver) = self.saver.as_mut() {
            saver.schedule(state);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_generating() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the newest text is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;
        for msg in &self.messages {
            total_lines = total_lines.saturating_add(1);
            for line in msg.content.lines() {
                let char_count = line.chars().count();
                total_lines = total_lines.saturating_add((char_count / wrap_width + 1) as u16);
            }
            total_lines = total_lines.saturating_add(1);
        }
        if self.is_generating() {
            total_lines = total_lines.saturating_add(2);
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    /// Stop everything that outlives a frame and write the session one
    /// last time. Messages cut off mid-reveal are saved with their full text.
    pub fn teardown(&mut self) {
        self.viewport.teardown();
        for (id, reveal) in self.streams.drain() {
            if let Some(message) = self.messages.get_mut(id) {
                message.content = reveal.text;
                message.is_streaming = false;
            }
        }
        if let Some(task) = self.generation_task.take() {
            task.abort();
        }

        if self.saver.is_none() {
            return;
        }
        let state = self.snapshot();
        if let Some(saver) = self.saver.as_mut() {
            saver.flush(state);
        }
    }
}

fn copy_to_clipboard(text: &str) {
    use std::io::Write;
    use std::process::{Command, Stdio};

    for (program, args) in [("pbcopy", &[][..]), ("wl-copy", &[][..]), ("xclip", &["-selection", "clipboard"][..])] {
        if let Ok(mut child) = Command::new(program).args(args).stdin(Stdio::piped()).spawn() {
            if let Some(mut stdin) = child.stdin.take() {
                let _ = stdin.write_all(text.as_bytes());
            }
            let _ = child.wait();
            return;
        }
    }
    warn!("no clipboard program found");
}

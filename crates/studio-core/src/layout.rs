//! Flow graph layout
//!
//! Turns a [`Proposal`] into positioned nodes and the edges that chain them
//! together: `input → content… → output`. The layout is always rebuilt from
//! scratch; any position a user dragged a node to is discarded on the next
//! rebuild.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::duration::estimate_timeline;
use crate::i18n::{Locale, Translate};
use crate::proposal::{Proposal, Section};

pub const INPUT_ID: &str = "input";
pub const OUTPUT_ID: &str = "output";

/// Items longer than this get a chain of sentence-sized nodes of their own.
const LONG_ITEM_CHARS: usize = 200;
/// Target size of a sentence fragment when splitting a long item.
const FRAGMENT_CHARS: usize = 120;
const SUMMARY_EXCERPT_CHARS: usize = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    Primary,
    Accent,
    Lime,
    Sky,
    Slate,
}

const CONTENT_PALETTE: [NodeColor; 5] = [
    NodeColor::Lime,
    NodeColor::Sky,
    NodeColor::Accent,
    NodeColor::Primary,
    NodeColor::Slate,
];

impl NodeColor {
    /// Header color as `#rrggbb`.
    pub fn hex(&self) -> &'static str {
        match self {
            NodeColor::Primary => "#8B5CF6",
            NodeColor::Accent => "#A855F7",
            NodeColor::Lime => "#A3E635",
            NodeColor::Sky => "#38BDF8",
            NodeColor::Slate => "#94A3B8",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            NodeColor::Primary => (0x8B, 0x5C, 0xF6),
            NodeColor::Accent => (0xA8, 0x55, 0xF7),
            NodeColor::Lime => (0xA3, 0xE6, 0x35),
            NodeColor::Sky => (0x38, 0xBD, 0xF8),
            NodeColor::Slate => (0x94, 0xA3, 0xB8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn midpoint(&self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub title: String,
    pub subtitle_lines: Vec<String>,
    pub color: NodeColor,
    pub x: f64,
    pub y: f64,
}

impl GraphNode {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Axis-aligned rectangle in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutMode {
    #[default]
    Full,
    Compact,
}

impl LayoutMode {
    /// Compact below the breakpoint, full grid otherwise.
    pub fn for_width(width: f64, breakpoint: f64) -> Self {
        if width < breakpoint {
            LayoutMode::Compact
        } else {
            LayoutMode::Full
        }
    }
}

/// Which part of the proposal becomes content nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutSource {
    /// Timeline when there is one, sections otherwise.
    #[default]
    Auto,
    Timeline,
    Sections,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    pub base_x: f64,
    pub base_y: f64,
    pub step_x: f64,
    pub step_y: f64,
    pub max_rows_per_column: usize,
    pub node_width: f64,
    pub node_height: f64,
    pub padding: f64,
    pub source: LayoutSource,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            base_x: 220.0,
            base_y: 220.0,
            step_x: 420.0,
            step_y: 180.0,
            max_rows_per_column: 4,
            node_width: 280.0,
            node_height: 140.0,
            padding: 60.0,
            source: LayoutSource::Auto,
        }
    }
}

/// Positioned nodes plus the chain of edges between them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub bounds: Bounds,
}

impl FlowGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Extreme node coordinates grown by half a node and the padding, so the
/// surface always contains every node.
pub fn compute_bounds(nodes: &[GraphNode], config: &LayoutConfig) -> Bounds {
    if nodes.is_empty() {
        return Bounds::default();
    }

    let half_w = config.node_width / 2.0 + config.padding;
    let half_h = config.node_height / 2.0 + config.padding;

    let mut bounds = Bounds {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for node in nodes {
        bounds.min_x = bounds.min_x.min(node.x - half_w);
        bounds.min_y = bounds.min_y.min(node.y - half_h);
        bounds.max_x = bounds.max_x.max(node.x + half_w);
        bounds.max_y = bounds.max_y.max(node.y + half_h);
    }
    bounds
}

/// Items per node from the average item length of a section.
pub fn optimal_items_per_node(content: &[String]) -> usize {
    if content.is_empty() {
        return 3;
    }
    let total: usize = content.iter().map(|item| item.chars().count()).sum();
    let average = total / content.len();
    if average > 300 {
        1
    } else if average > 150 {
        2
    } else {
        3
    }
}

/// Break a long bullet into sentence fragments of roughly
/// [`FRAGMENT_CHARS`] characters.
fn split_long_item(item: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();

    for sentence in item.split(['.', '!', '?']) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        if current.chars().count() + sentence.chars().count() > FRAGMENT_CHARS {
            if !current.is_empty() {
                fragments.push(std::mem::take(&mut current));
            }
            current = sentence.to_string();
        } else {
            if !current.is_empty() {
                current.push_str(". ");
            }
            current.push_str(sentence);
        }
    }

    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

/// Pack a section's bullets into node-sized chunks.
pub fn split_content_into_chunks(content: &[String]) -> Vec<Vec<String>> {
    let per_node = optimal_items_per_node(content);
    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for item in content {
        if item.chars().count() > LONG_ITEM_CHARS {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_long_item(item).into_iter().map(|f| vec![f]));
        } else {
            current.push(item.clone());
            if current.len() >= per_node {
                chunks.push(std::mem::take(&mut current));
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

struct ContentNode {
    id: String,
    title: String,
    lines: Vec<String>,
    color: NodeColor,
}

fn timeline_nodes(proposal: &Proposal) -> Vec<ContentNode> {
    proposal
        .timeline
        .iter()
        .enumerate()
        .map(|(idx, entry)| ContentNode {
            id: format!("phase-{}", idx),
            title: entry.phase.clone(),
            lines: vec![entry.duration.clone(), entry.details.clone()],
            color: CONTENT_PALETTE[idx % CONTENT_PALETTE.len()],
        })
        .collect()
}

fn section_nodes(sections: &[Section]) -> Vec<ContentNode> {
    let mut nodes = Vec::new();
    for (idx, section) in sections.iter().enumerate() {
        for (chunk_idx, chunk) in split_content_into_chunks(&section.content)
            .into_iter()
            .enumerate()
        {
            let title = if chunk_idx == 0 {
                section.heading.clone()
            } else {
                format!("{} ({})", section.heading, chunk_idx + 1)
            };
            nodes.push(ContentNode {
                id: format!("sec-{}-{}", idx, chunk_idx),
                title,
                lines: chunk,
                color: CONTENT_PALETTE[idx % CONTENT_PALETTE.len()],
            });
        }
    }
    nodes
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

fn recap_lines(proposal: &Proposal, locale: Locale, t: &dyn Translate) -> Vec<String> {
    let mut lines = Vec::new();
    if !proposal.summary.trim().is_empty() {
        lines.push(excerpt(&proposal.summary, SUMMARY_EXCERPT_CHARS));
    }
    lines.push(format!("{}: {}", t.t("flow.phases"), proposal.timeline.len()));
    lines.push(format!(
        "{}: {}",
        t.t("flow.estimatedDuration"),
        estimate_timeline(&proposal.timeline).render(locale)
    ));
    lines.push(format!("{}: {}", t.t("flow.sections"), proposal.sections.len()));
    lines.push(t.t("flow.nextSteps"));
    lines
}

/// Lay out a proposal. Deterministic: the same proposal, mode and config
/// always produce the same ids, titles, colors and coordinates.
pub fn layout_proposal(
    proposal: &Proposal,
    mode: LayoutMode,
    config: &LayoutConfig,
    locale: Locale,
    t: &dyn Translate,
) -> FlowGraph {
    let use_timeline = match config.source {
        LayoutSource::Timeline => true,
        LayoutSource::Sections => false,
        LayoutSource::Auto => !proposal.timeline.is_empty(),
    };
    let content = if use_timeline {
        timeline_nodes(proposal)
    } else {
        section_nodes(&proposal.sections)
    };

    let mut nodes = Vec::with_capacity(content.len() + 2);
    let mut edges = Vec::with_capacity(content.len() + 1);

    nodes.push(GraphNode {
        id: INPUT_ID.to_string(),
        title: t.t("flow.input"),
        subtitle_lines: vec![proposal.summary.clone()],
        color: NodeColor::Lime,
        x: config.base_x,
        y: config.base_y,
    });

    let max_rows = config.max_rows_per_column.max(1);
    let mut last_id = INPUT_ID.to_string();
    let mut col = 1usize;
    let mut row = 0usize;
    // Column and row count of the last placed content node.
    let mut last_col = 0usize;
    let mut rows_in_last_col = 1usize;

    for (i, node) in content.into_iter().enumerate() {
        let (x, y) = match mode {
            LayoutMode::Compact => (config.base_x, config.base_y + (i + 1) as f64 * config.step_y),
            LayoutMode::Full => (
                config.base_x + col as f64 * config.step_x,
                config.base_y + row as f64 * config.step_y,
            ),
        };

        last_col = col;
        rows_in_last_col = row + 1;
        row += 1;
        if row >= max_rows {
            row = 0;
            col += 1;
        }

        edges.push(GraphEdge {
            from: last_id.clone(),
            to: node.id.clone(),
        });
        last_id = node.id.clone();
        nodes.push(GraphNode {
            id: node.id,
            title: node.title,
            subtitle_lines: node.lines,
            color: node.color,
            x,
            y,
        });
    }

    let content_count = nodes.len() - 1;
    let (out_x, out_y) = match mode {
        LayoutMode::Compact => (
            config.base_x,
            config.base_y + (content_count + 1) as f64 * config.step_y,
        ),
        LayoutMode::Full => (
            config.base_x + (last_col + 1) as f64 * config.step_x,
            config.base_y + (rows_in_last_col - 1) as f64 * config.step_y / 2.0,
        ),
    };

    nodes.push(GraphNode {
        id: OUTPUT_ID.to_string(),
        title: t.t("flow.output"),
        subtitle_lines: recap_lines(proposal, locale, t),
        color: NodeColor::Accent,
        x: out_x,
        y: out_y,
    });
    edges.push(GraphEdge {
        from: last_id,
        to: OUTPUT_ID.to_string(),
    });

    let bounds = compute_bounds(&nodes, config);
    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        ?mode,
        timeline = use_timeline,
        "laid out proposal"
    );

    FlowGraph {
        nodes,
        edges,
        bounds,
    }
}

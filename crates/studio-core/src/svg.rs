//! Standalone SVG rendering of the canvas surface
//!
//! Produces the same picture the interactive canvas shows: a fixed dotted
//! background in view-box space, and a transformed group with the edges
//! and node cards. Used for file export and as the image embedded in
//! printable proposals.

use crate::layout::GraphNode;
use crate::viewport::CanvasViewport;

const BACKGROUND: &str = "#f1f5f9";
const DOT_FILL: &str = "#e2e8f0";
const EDGE_STROKE: &str = "#374151";
const CARD_FILL: &str = "#1f2937";
const HEADER_HEIGHT: f64 = 36.0;
const LINE_HEIGHT: f64 = 18.0;
const MAX_LINE_CHARS: usize = 38;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut s: String = text.chars().take(max.saturating_sub(1)).collect();
    s.push('…');
    s
}

fn node_svg(node: &GraphNode, width: f64, height: f64) -> String {
    let left = node.x - width / 2.0;
    let top = node.y - height / 2.0;
    let color = node.color.hex();

    let mut out = format!(
        "<g data-node-id=\"{}\">\
         <rect x=\"{left}\" y=\"{top}\" width=\"{width}\" height=\"{height}\" rx=\"12\" fill=\"{CARD_FILL}\" stroke=\"{color}\" stroke-width=\"2\"/>\
         <rect x=\"{left}\" y=\"{top}\" width=\"{width}\" height=\"{HEADER_HEIGHT}\" rx=\"12\" fill=\"{color}\"/>\
         <text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"14\" font-weight=\"600\" fill=\"#0f172a\">{}</text>",
        escape(&node.id),
        left + 12.0,
        top + 23.0,
        escape(&truncate(&node.title, MAX_LINE_CHARS)),
    );

    let max_lines = ((height - HEADER_HEIGHT - 8.0) / LINE_HEIGHT).floor().max(0.0) as usize;
    for (i, line) in node.subtitle_lines.iter().take(max_lines).enumerate() {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-family=\"sans-serif\" font-size=\"12\" fill=\"#e5e7eb\">{}</text>",
            left + 12.0,
            top + HEADER_HEIGHT + 18.0 + i as f64 * LINE_HEIGHT,
            escape(&truncate(line, MAX_LINE_CHARS + 6)),
        ));
    }
    out.push_str("</g>");
    out
}

/// Render the viewport's current picture, live node positions and the
/// current pan/zoom included.
pub fn render_svg(viewport: &CanvasViewport) -> String {
    let vb = viewport.view_box();
    let state = viewport.state();
    let config = viewport.config();

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"xMidYMid meet\">",
        vb.min_x,
        vb.min_y,
        vb.width(),
        vb.height(),
        vb.width(),
        vb.height()
    );
    svg.push_str(&format!(
        "<defs><pattern id=\"dots\" width=\"20\" height=\"20\" patternUnits=\"userSpaceOnUse\">\
         <circle cx=\"1\" cy=\"1\" r=\"1\" fill=\"{DOT_FILL}\" opacity=\"0.3\"/></pattern></defs>"
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{BACKGROUND}\"/>",
        vb.min_x,
        vb.min_y,
        vb.width(),
        vb.height()
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"url(#dots)\"/>",
        vb.min_x,
        vb.min_y,
        vb.width(),
        vb.height()
    ));

    svg.push_str(&format!(
        "<g transform=\"translate({} {}) scale({})\">",
        state.offset.x, state.offset.y, state.scale
    ));
    for (_, curve) in viewport.edge_curves() {
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"none\" stroke=\"{EDGE_STROKE}\" stroke-width=\"2\" opacity=\"0.6\"/>",
            curve.svg_path()
        ));
    }
    for node in viewport.live_nodes() {
        svg.push_str(&node_svg(node, config.node_width, config.node_height));
    }
    svg.push_str("</g></svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Locale};
    use crate::layout::{layout_proposal, GraphEdge, LayoutConfig, LayoutMode};
    use crate::proposal::{Proposal, TimelineEntry};

    fn viewport() -> CanvasViewport {
        let proposal = Proposal {
            summary: "Build <fast> & cheap".to_string(),
            timeline: vec![TimelineEntry {
                phase: "Design".to_string(),
                duration: "2 weeks".to_string(),
                details: "Wireframes".to_string(),
            }],
            ..Default::default()
        };
        let mut graph = layout_proposal(
            &proposal,
            LayoutMode::Full,
            &LayoutConfig::default(),
            Locale::En,
            &Catalog::new(Locale::En),
        );
        graph.edges.push(GraphEdge {
            from: "ghost".to_string(),
            to: "output".to_string(),
        });
        let mut vp = CanvasViewport::new(LayoutConfig::default());
        vp.set_graph(&graph);
        vp
    }

    #[test]
    fn test_svg_has_nodes_and_edges() {
        let svg = render_svg(&viewport());
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("data-node-id=").count(), 3);
        // The dangling edge is not drawn.
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("translate(0 0) scale(1)"));
    }

    #[test]
    fn test_svg_escapes_text() {
        let svg = render_svg(&viewport());
        assert!(svg.contains("Build &lt;fast&gt; &amp; cheap"));
        assert!(!svg.contains("<fast>"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}

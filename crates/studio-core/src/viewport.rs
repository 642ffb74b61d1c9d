//! Interactive canvas state: pan, zoom, node drag and pinch
//!
//! The viewport owns a copy of the laid-out nodes, a `translate + scale`
//! transform applied to the group holding nodes and edges, and the gesture
//! currently in progress. Front ends translate their raw input into
//! [`PointerInput`] values in screen coordinates; the viewport maps them
//! through the surface transform (screen → view box) and then through the
//! group transform (view box → node-local coordinates).
//!
//! While a gesture is active the viewport holds a set of global listeners,
//! meaning move/release events must reach it even when the pointer leaves
//! the canvas. The set is emptied when the gesture ends and on teardown.

use tracing::debug;

use crate::layout::{compute_bounds, Bounds, FlowGraph, GraphEdge, GraphNode, LayoutConfig, Point};

pub const MIN_SCALE: f64 = 0.4;
pub const MAX_SCALE: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.15;

pub fn clamp_scale(scale: f64) -> f64 {
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Pan offset and zoom scale of the node/edge group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportState {
    pub scale: f64,
    pub offset: Point,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point::default(),
        }
    }
}

impl ViewportState {
    /// View-box point to node-local point.
    pub fn to_local(&self, surface: Point) -> Point {
        Point::new(
            (surface.x - self.offset.x) / self.scale,
            (surface.y - self.offset.y) / self.scale,
        )
    }

    /// Node-local point to view-box point.
    pub fn to_surface(&self, local: Point) -> Point {
        Point::new(
            self.offset.x + local.x * self.scale,
            self.offset.y + local.y * self.scale,
        )
    }
}

/// Maps the view box onto a screen rectangle, scaled uniformly and
/// centered ("meet"), and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    view_box: Bounds,
    screen_width: f64,
    screen_height: f64,
}

impl SurfaceTransform {
    pub fn new(view_box: Bounds, screen_width: f64, screen_height: f64) -> Self {
        Self {
            view_box,
            screen_width,
            screen_height,
        }
    }

    /// One screen unit per view-box unit.
    pub fn identity(view_box: Bounds) -> Self {
        Self::new(view_box, view_box.width(), view_box.height())
    }

    pub fn view_box(&self) -> Bounds {
        self.view_box
    }

    fn factor(&self) -> f64 {
        let vw = self.view_box.width();
        let vh = self.view_box.height();
        if vw <= 0.0 || vh <= 0.0 || self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return 1.0;
        }
        (self.screen_width / vw).min(self.screen_height / vh)
    }

    /// The part of surface space that is actually on screen. Equal to the
    /// view box along one axis and wider along the other.
    pub fn visible_region(&self) -> Bounds {
        let k = self.factor();
        let w = self.screen_width / k;
        let h = self.screen_height / k;
        let c = self.view_box.center();
        Bounds {
            min_x: c.x - w / 2.0,
            min_y: c.y - h / 2.0,
            max_x: c.x + w / 2.0,
            max_y: c.y + h / 2.0,
        }
    }

    pub fn screen_to_surface(&self, p: Point) -> Point {
        let k = self.factor();
        let visible = self.visible_region();
        Point::new(visible.min_x + p.x / k, visible.min_y + p.y / k)
    }

    pub fn surface_to_screen(&self, p: Point) -> Point {
        let k = self.factor();
        let visible = self.visible_region();
        Point::new((p.x - visible.min_x) * k, (p.y - visible.min_y) * k)
    }
}

/// Raw input in screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Down(Point),
    Move(Point),
    Up,
    Cancel,
    /// Negative `delta_y` zooms in.
    Wheel { delta_y: f64 },
    /// All touches currently on the surface.
    TouchStart(Vec<Point>),
    TouchMove(Vec<Point>),
    /// Touches remaining after the release.
    TouchEnd(Vec<Point>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportCommand {
    FitToView,
    ResetView,
    ZoomIn,
    ZoomOut,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Idle,
    Panning {
        anchor: Point,
    },
    DraggingNode {
        id: String,
        grab: Point,
    },
    Pinching {
        initial_distance: f64,
        initial_scale: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    PointerMove,
    PointerUp,
    TouchMove,
    TouchEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputSource {
    Pointer,
    Touch,
}

impl InputSource {
    fn listeners(self) -> [ListenerKind; 2] {
        match self {
            InputSource::Pointer => [ListenerKind::PointerMove, ListenerKind::PointerUp],
            InputSource::Touch => [ListenerKind::TouchMove, ListenerKind::TouchEnd],
        }
    }
}

/// Cubic Bézier from one node center to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl CubicBezier {
    /// Control points are pulled horizontally by half the x distance, so
    /// nodes in the same column get a straight vertical line.
    pub fn between(a: Point, b: Point) -> Self {
        let dx = (b.x - a.x) * 0.5;
        Self {
            start: a,
            c1: Point::new(a.x + dx, a.y),
            c2: Point::new(b.x - dx, b.y),
            end: b,
        }
    }

    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let a = u * u * u;
        let b = 3.0 * u * u * t;
        let c = 3.0 * u * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.c1.x + c * self.c2.x + d * self.end.x,
            a * self.start.y + b * self.c1.y + c * self.c2.y + d * self.end.y,
        )
    }

    /// `segments + 1` points along the curve, endpoints included.
    pub fn sample(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|i| self.point_at(i as f64 / segments as f64))
            .collect()
    }

    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.start.x,
            self.start.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.end.x,
            self.end.y
        )
    }
}

pub struct CanvasViewport {
    config: LayoutConfig,
    /// Nodes exactly as last handed in by the layout.
    source_nodes: Vec<GraphNode>,
    /// Nodes with user drags applied.
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    state: ViewportState,
    gesture: Gesture,
    listeners: Vec<ListenerKind>,
    screen: (f64, f64),
}

impl CanvasViewport {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            source_nodes: Vec::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            state: ViewportState::default(),
            gesture: Gesture::Idle,
            listeners: Vec::new(),
            screen: (0.0, 0.0),
        }
    }

    /// Replace the whole node/edge set. Dragged positions are dropped and an
    /// in-flight node drag ends; pan and zoom are kept.
    pub fn set_graph(&mut self, graph: &FlowGraph) {
        if matches!(self.gesture, Gesture::DraggingNode { .. }) {
            self.end_gesture();
        }
        self.source_nodes = graph.nodes.clone();
        self.nodes = graph.nodes.clone();
        self.edges = graph.edges.clone();
    }

    /// Size of the screen rectangle the surface is drawn into.
    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen = (width, height);
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn scale(&self) -> f64 {
        self.state.scale
    }

    pub fn offset(&self) -> Point {
        self.state.offset
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Global listeners held by the active gesture.
    pub fn active_listeners(&self) -> &[ListenerKind] {
        &self.listeners
    }

    /// True while move/release events must be routed here regardless of
    /// where the pointer is.
    pub fn is_capturing(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// The node set last passed to [`set_graph`](Self::set_graph), without
    /// drags. Read [`live_nodes`](Self::live_nodes) for current positions.
    pub fn current_nodes(&self) -> &[GraphNode] {
        &self.source_nodes
    }

    pub fn live_nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// View box of the rendering surface, recomputed from live positions.
    pub fn view_box(&self) -> Bounds {
        compute_bounds(&self.nodes, &self.config)
    }

    pub fn surface_transform(&self) -> SurfaceTransform {
        let view_box = self.view_box();
        if self.screen.0 <= 0.0 || self.screen.1 <= 0.0 {
            return SurfaceTransform::identity(view_box);
        }
        SurfaceTransform::new(view_box, self.screen.0, self.screen.1)
    }

    /// Curves for every edge whose endpoints both exist; dangling edges are
    /// skipped.
    pub fn edge_curves(&self) -> Vec<(&GraphEdge, CubicBezier)> {
        self.edges
            .iter()
            .filter_map(|edge| {
                let a = self.node(&edge.from)?;
                let b = self.node(&edge.to)?;
                Some((edge, CubicBezier::between(a.position(), b.position())))
            })
            .collect()
    }

    /// Topmost node under a node-local point. Later nodes draw on top.
    pub fn node_at(&self, local: Point) -> Option<&GraphNode> {
        let half_w = self.config.node_width / 2.0;
        let half_h = self.config.node_height / 2.0;
        self.nodes
            .iter()
            .rev()
            .find(|n| (local.x - n.x).abs() <= half_w && (local.y - n.y).abs() <= half_h)
    }

    pub fn apply(&mut self, command: ViewportCommand) {
        match command {
            ViewportCommand::FitToView => self.fit_to_view(),
            ViewportCommand::ResetView => self.reset_view(),
            ViewportCommand::ZoomIn => self.zoom_in(),
            ViewportCommand::ZoomOut => self.zoom_out(),
        }
    }

    // TODO: compute a content-fitting zoom once the product decides fit and reset should differ.
    pub fn fit_to_view(&mut self) {
        self.state = ViewportState::default();
    }

    pub fn reset_view(&mut self) {
        self.state = ViewportState::default();
    }

    pub fn zoom_in(&mut self) {
        self.state.scale = clamp_scale(self.state.scale + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.state.scale = clamp_scale(self.state.scale - ZOOM_STEP);
    }

    /// Feed one input event. Returns true when anything visible changed.
    pub fn handle(&mut self, input: PointerInput) -> bool {
        match input {
            PointerInput::Down(p) => self.begin_single(p, InputSource::Pointer),
            PointerInput::Move(p) => self.move_single(p),
            PointerInput::Up | PointerInput::Cancel => {
                if self.gesture == Gesture::Idle {
                    return false;
                }
                self.end_gesture();
                true
            }
            PointerInput::Wheel { delta_y } => self.wheel(delta_y),
            PointerInput::TouchStart(touches) => match touches.as_slice() {
                [p] => self.begin_single(*p, InputSource::Touch),
                [a, b, ..] => self.begin_pinch(*a, *b),
                [] => false,
            },
            PointerInput::TouchMove(touches) => match touches.as_slice() {
                [p] => self.move_single(*p),
                [a, b, ..] => self.move_pinch(*a, *b),
                [] => false,
            },
            PointerInput::TouchEnd(remaining) => {
                let done = match self.gesture {
                    Gesture::Idle => false,
                    Gesture::Pinching { .. } => remaining.len() < 2,
                    _ => remaining.is_empty(),
                };
                if done {
                    self.end_gesture();
                }
                done
            }
        }
    }

    /// Drop every listener and return to idle. Hosts call this when the
    /// canvas goes away.
    pub fn teardown(&mut self) {
        self.end_gesture();
    }

    fn attach(&mut self, source: InputSource) {
        self.listeners.clear();
        self.listeners.extend(source.listeners());
    }

    fn end_gesture(&mut self) {
        if self.gesture != Gesture::Idle {
            debug!(gesture = ?self.gesture, "gesture ended");
        }
        self.gesture = Gesture::Idle;
        self.listeners.clear();
    }

    fn to_surface(&self, screen: Point) -> Point {
        self.surface_transform().screen_to_surface(screen)
    }

    fn begin_single(&mut self, screen: Point, source: InputSource) -> bool {
        if self.gesture != Gesture::Idle {
            return false;
        }

        let surface = self.to_surface(screen);
        let local = self.state.to_local(surface);

        // Node drag wins over panning.
        if let Some(node) = self.node_at(local) {
            let grab = Point::new(local.x - node.x, local.y - node.y);
            debug!(node = %node.id, "node drag started");
            self.gesture = Gesture::DraggingNode {
                id: node.id.clone(),
                grab,
            };
        } else {
            let anchor = Point::new(
                surface.x - self.state.offset.x,
                surface.y - self.state.offset.y,
            );
            debug!("pan started");
            self.gesture = Gesture::Panning { anchor };
        }
        self.attach(source);
        true
    }

    fn move_single(&mut self, screen: Point) -> bool {
        match &self.gesture {
            Gesture::Panning { anchor } => {
                let anchor = *anchor;
                let surface = self.to_surface(screen);
                self.state.offset = Point::new(surface.x - anchor.x, surface.y - anchor.y);
                true
            }
            Gesture::DraggingNode { id, grab } => {
                let id = id.clone();
                let grab = *grab;
                let local = self.state.to_local(self.to_surface(screen));
                match self.nodes.iter_mut().find(|n| n.id == id) {
                    Some(node) => {
                        node.x = local.x - grab.x;
                        node.y = local.y - grab.y;
                        true
                    }
                    None => false,
                }
            }
            Gesture::Idle | Gesture::Pinching { .. } => false,
        }
    }

    fn begin_pinch(&mut self, a: Point, b: Point) -> bool {
        if matches!(self.gesture, Gesture::DraggingNode { .. }) {
            return false;
        }
        let distance = self.to_surface(a).distance(self.to_surface(b));
        if distance <= f64::EPSILON {
            return false;
        }
        debug!(distance, "pinch started");
        self.gesture = Gesture::Pinching {
            initial_distance: distance,
            initial_scale: self.state.scale,
        };
        self.attach(InputSource::Touch);
        true
    }

    fn move_pinch(&mut self, a: Point, b: Point) -> bool {
        let Gesture::Pinching {
            initial_distance,
            initial_scale,
        } = self.gesture
        else {
            return false;
        };

        let a = self.to_surface(a);
        let b = self.to_surface(b);
        let distance = a.distance(b);
        let old_scale = self.state.scale;
        let new_scale = clamp_scale(initial_scale * distance / initial_distance);

        // Keep the point between the fingers fixed on screen.
        let center = a.midpoint(b);
        let ratio = new_scale / old_scale;
        self.state.offset = Point::new(
            center.x - (center.x - self.state.offset.x) * ratio,
            center.y - (center.y - self.state.offset.y) * ratio,
        );
        self.state.scale = new_scale;
        true
    }

    fn wheel(&mut self, delta_y: f64) -> bool {
        if matches!(self.gesture, Gesture::DraggingNode { .. }) || delta_y == 0.0 {
            return false;
        }
        let step = if delta_y < 0.0 { ZOOM_STEP } else { -ZOOM_STEP };
        self.state.scale = clamp_scale(self.state.scale + step);
        true
    }
}

impl Drop for CanvasViewport {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::{Catalog, Locale};
    use crate::layout::{layout_proposal, LayoutMode};
    use crate::proposal::{Proposal, TimelineEntry};

    fn graph(n: usize) -> FlowGraph {
        let proposal = Proposal {
            summary: "Summary".to_string(),
            timeline: (0..n)
                .map(|i| TimelineEntry {
                    phase: format!("Phase {}", i),
                    duration: "1 week".to_string(),
                    details: String::new(),
                })
                .collect(),
            ..Default::default()
        };
        layout_proposal(
            &proposal,
            LayoutMode::Full,
            &LayoutConfig::default(),
            Locale::En,
            &Catalog::new(Locale::En),
        )
    }

    /// Viewport where screen and surface coordinates line up exactly.
    fn viewport(n: usize) -> CanvasViewport {
        let mut vp = CanvasViewport::new(LayoutConfig::default());
        vp.set_graph(&graph(n));
        vp
    }

    /// Screen point for a surface point under the current transform.
    fn screen_of(vp: &CanvasViewport, surface: Point) -> Point {
        vp.surface_transform().surface_to_screen(surface)
    }

    fn empty_spot(vp: &CanvasViewport) -> Point {
        // Between the input node and the first column, above all nodes.
        let vb = vp.view_box();
        Point::new(vb.min_x + 5.0, vb.min_y + 5.0)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_scale_stays_clamped() {
        let mut vp = viewport(2);
        for _ in 0..50 {
            vp.zoom_in();
        }
        assert_eq!(vp.scale(), MAX_SCALE);
        for _ in 0..50 {
            vp.handle(PointerInput::Wheel { delta_y: 120.0 });
        }
        assert_eq!(vp.scale(), MIN_SCALE);
        for i in 0..40 {
            if i % 3 == 0 {
                vp.zoom_out();
            } else {
                vp.handle(PointerInput::Wheel { delta_y: -1.0 });
            }
            assert!(vp.scale() >= MIN_SCALE && vp.scale() <= MAX_SCALE);
        }
    }

    #[test]
    fn test_pinch_scale_clamped() {
        let mut vp = viewport(2);
        let c = vp.view_box().center();
        let near = |d: f64| vec![Point::new(c.x - d, c.y), Point::new(c.x + d, c.y)];
        let to_screen = |vp: &CanvasViewport, pts: Vec<Point>| -> Vec<Point> {
            pts.into_iter().map(|p| screen_of(vp, p)).collect()
        };

        let start = to_screen(&vp, near(10.0));
        assert!(vp.handle(PointerInput::TouchStart(start)));
        let wide = to_screen(&vp, near(1000.0));
        vp.handle(PointerInput::TouchMove(wide));
        assert_eq!(vp.scale(), MAX_SCALE);
        let tiny = to_screen(&vp, near(0.5));
        vp.handle(PointerInput::TouchMove(tiny));
        assert_eq!(vp.scale(), MIN_SCALE);
    }

    #[test]
    fn test_pinch_keeps_center_fixed() {
        let mut vp = viewport(3);
        let c = vp.view_box().center();
        let a = Point::new(c.x - 50.0, c.y);
        let b = Point::new(c.x + 50.0, c.y);
        vp.handle(PointerInput::TouchStart(vec![screen_of(&vp, a), screen_of(&vp, b)]));

        let local_before = vp.state().to_local(c);
        let a2 = Point::new(c.x - 75.0, c.y);
        let b2 = Point::new(c.x + 75.0, c.y);
        vp.handle(PointerInput::TouchMove(vec![screen_of(&vp, a2), screen_of(&vp, b2)]));

        assert!(close(vp.scale(), 1.5));
        let local_after = vp.state().to_local(c);
        assert!(close(local_before.x, local_after.x));
        assert!(close(local_before.y, local_after.y));

        vp.handle(PointerInput::TouchEnd(vec![screen_of(&vp, a2)]));
        assert_eq!(vp.gesture(), &Gesture::Idle);
        assert!(vp.active_listeners().is_empty());
    }

    #[test]
    fn test_pan_moves_offset_only() {
        let mut vp = viewport(3);
        let before: Vec<GraphNode> = vp.live_nodes().to_vec();
        let start = empty_spot(&vp);
        assert!(vp.node_at(vp.state().to_local(start)).is_none());

        vp.handle(PointerInput::Down(screen_of(&vp, start)));
        assert!(matches!(vp.gesture(), Gesture::Panning { .. }));
        let end = Point::new(start.x + 30.0, start.y + 12.0);
        vp.handle(PointerInput::Move(screen_of(&vp, end)));

        assert!(close(vp.offset().x, 30.0));
        assert!(close(vp.offset().y, 12.0));
        assert_eq!(vp.live_nodes(), before.as_slice());

        vp.handle(PointerInput::Up);
        assert_eq!(vp.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_drag_moves_only_that_node() {
        let mut vp = viewport(4);
        let edges_before = vp.edges().to_vec();
        let target = vp.node("phase-1").unwrap().clone();
        let others: Vec<GraphNode> = vp
            .live_nodes()
            .iter()
            .filter(|n| n.id != target.id)
            .cloned()
            .collect();

        let grab_at = Point::new(target.x + 10.0, target.y - 5.0);
        vp.handle(PointerInput::Down(screen_of(&vp, grab_at)));
        assert!(matches!(vp.gesture(), Gesture::DraggingNode { id, .. } if id == "phase-1"));

        let drop_at = Point::new(grab_at.x + 40.0, grab_at.y + 25.0);
        vp.handle(PointerInput::Move(screen_of(&vp, drop_at)));
        vp.handle(PointerInput::Up);

        let moved = vp.node("phase-1").unwrap();
        assert!(close(moved.x, target.x + 40.0));
        assert!(close(moved.y, target.y + 25.0));
        for other in &others {
            assert_eq!(vp.node(&other.id).unwrap(), other);
        }
        assert_eq!(vp.edges(), edges_before.as_slice());
        assert_eq!(vp.offset(), Point::default());
    }

    #[test]
    fn test_drag_under_zoom_tracks_pointer() {
        let mut vp = viewport(2);
        vp.zoom_in();
        vp.zoom_in();
        let node = vp.node("phase-0").unwrap().clone();
        let on_node = vp.state().to_surface(node.position());
        vp.handle(PointerInput::Down(screen_of(&vp, on_node)));
        assert!(matches!(vp.gesture(), Gesture::DraggingNode { .. }));

        let target = Point::new(on_node.x + 26.0, on_node.y);
        vp.handle(PointerInput::Move(screen_of(&vp, target)));
        let moved = vp.node("phase-0").unwrap();
        assert!(close(moved.x, node.x + 26.0 / vp.scale()));
    }

    #[test]
    fn test_current_nodes_ignores_drag() {
        let mut vp = viewport(1);
        let original = vp.current_nodes().to_vec();
        let node = vp.node("phase-0").unwrap().clone();
        vp.handle(PointerInput::Down(screen_of(&vp, node.position())));
        vp.handle(PointerInput::Move(screen_of(
            &vp,
            Point::new(node.x + 15.0, node.y),
        )));
        vp.handle(PointerInput::Up);
        assert_eq!(vp.current_nodes(), original.as_slice());
        assert_ne!(vp.live_nodes(), original.as_slice());
    }

    #[test]
    fn test_wheel_ignored_while_dragging() {
        let mut vp = viewport(1);
        let node = vp.node("input").unwrap().clone();
        vp.handle(PointerInput::Down(screen_of(&vp, node.position())));
        assert!(!vp.handle(PointerInput::Wheel { delta_y: -1.0 }));
        assert_eq!(vp.scale(), 1.0);
    }

    #[test]
    fn test_listeners_removed_on_end_and_teardown() {
        let mut vp = viewport(2);
        let start = empty_spot(&vp);
        vp.handle(PointerInput::Down(screen_of(&vp, start)));
        assert_eq!(
            vp.active_listeners(),
            &[ListenerKind::PointerMove, ListenerKind::PointerUp]
        );
        assert!(vp.is_capturing());
        vp.handle(PointerInput::Cancel);
        assert!(vp.active_listeners().is_empty());

        vp.handle(PointerInput::TouchStart(vec![screen_of(&vp, start)]));
        assert_eq!(
            vp.active_listeners(),
            &[ListenerKind::TouchMove, ListenerKind::TouchEnd]
        );
        vp.teardown();
        assert!(vp.active_listeners().is_empty());
        assert_eq!(vp.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_new_graph_ends_drag_and_discards_positions() {
        let mut vp = viewport(2);
        let node = vp.node("phase-0").unwrap().clone();
        vp.handle(PointerInput::Down(screen_of(&vp, node.position())));
        vp.handle(PointerInput::Move(screen_of(
            &vp,
            Point::new(node.x + 50.0, node.y),
        )));
        vp.zoom_in();

        vp.set_graph(&graph(2));
        assert_eq!(vp.gesture(), &Gesture::Idle);
        assert!(!vp.is_capturing());
        assert_eq!(vp.node("phase-0").unwrap().x, node.x);
        assert!(close(vp.scale(), 1.0 + ZOOM_STEP));
    }

    #[test]
    fn test_fit_and_reset_restore_defaults() {
        let mut vp = viewport(2);
        vp.zoom_in();
        vp.handle(PointerInput::Down(Point::new(1.0, 1.0)));
        vp.handle(PointerInput::Move(Point::new(40.0, 40.0)));
        vp.handle(PointerInput::Up);

        vp.apply(ViewportCommand::FitToView);
        assert_eq!(vp.state(), ViewportState::default());

        vp.zoom_out();
        vp.apply(ViewportCommand::ResetView);
        assert_eq!(vp.state(), ViewportState::default());
    }

    #[test]
    fn test_dangling_edges_skipped() {
        let mut g = graph(2);
        g.edges.push(GraphEdge {
            from: "phase-0".to_string(),
            to: "missing".to_string(),
        });
        let mut vp = CanvasViewport::new(LayoutConfig::default());
        vp.set_graph(&g);
        assert_eq!(vp.edges().len(), 4);
        assert_eq!(vp.edge_curves().len(), 3);
    }

    #[test]
    fn test_bezier_shape() {
        let same_column = CubicBezier::between(Point::new(10.0, 0.0), Point::new(10.0, 100.0));
        for p in same_column.sample(8) {
            assert!(close(p.x, 10.0));
        }

        let curve = CubicBezier::between(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(curve.c1, Point::new(50.0, 0.0));
        assert_eq!(curve.c2, Point::new(50.0, 50.0));
        assert_eq!(curve.point_at(0.0), curve.start);
        assert_eq!(curve.point_at(1.0), curve.end);
        assert_eq!(curve.svg_path(), "M 0 0 C 50 0, 50 50, 100 50");
    }

    #[test]
    fn test_surface_transform_round_trip_and_meet() {
        let vb = Bounds {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 200.0,
            max_y: 100.0,
        };
        let t = SurfaceTransform::new(vb, 100.0, 100.0);
        let visible = t.visible_region();
        assert!(close(visible.width(), 200.0));
        assert!(close(visible.height(), 200.0));
        assert!(close(visible.min_y, -50.0));

        let p = Point::new(37.0, 81.0);
        let back = t.surface_to_screen(t.screen_to_surface(p));
        assert!(close(back.x, p.x));
        assert!(close(back.y, p.y));
    }
}

//! Rendering for the terminal viewer
//!
//! The document tree is flattened paragraph by paragraph into styled lines;
//! text inside a marker element picks up its class color. Anchors are
//! reported in content coordinates (line index before scrolling) so the
//! tooltip placement can run against a scrolling viewport.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use uuid::Uuid;

use limelight_core::tooltip::Rect as CoreRect;
use limelight_core::{normalize, Annotator, Document, ManipulationClass, PresentationMode};

use crate::App;

/// One marker's first on-screen run, in content coordinates
pub struct Anchor {
    pub marker: Uuid,
    pub rect: CoreRect,
}

pub struct RenderedDoc {
    pub lines: Vec<Line<'static>>,
    pub anchors: Vec<Anchor>,
}

fn class_color(class: ManipulationClass) -> Color {
    match class {
        ManipulationClass::Emotional => Color::Red,
        ManipulationClass::Fallacy => Color::Yellow,
        ManipulationClass::Rhetorical => Color::Green,
        ManipulationClass::Evidence => Color::Blue,
        ManipulationClass::Social => Color::Magenta,
    }
}

fn highlight_style(class: ManipulationClass, mode: PresentationMode) -> Style {
    let color = class_color(class);
    match mode {
        PresentationMode::FullColor => Style::default().bg(color).fg(Color::Black),
        PresentationMode::LowContrast => Style::default().fg(color).underlined(),
    }
}

/// One line being assembled. Separators between leaves come from the raw
/// bytes around the boundary, so a marker splitting a leaf mid-word does not
/// change what gets drawn.
struct LineBuilder {
    spans: Vec<Span<'static>>,
    col: u16,
    boundary_ws: bool,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            spans: Vec::new(),
            col: 0,
            boundary_ws: false,
        }
    }
}

/// Flatten the tree into one Line per paragraph, with a blank line between
pub fn layout_document(doc: &Document, annotator: &Annotator, mode: PresentationMode) -> RenderedDoc {
    let tree = &doc.tree;
    let mut rendered = RenderedDoc {
        lines: Vec::new(),
        anchors: Vec::new(),
    };

    for &block in tree.children(tree.root()) {
        if tree.tag(block) == Some("style") {
            continue;
        }
        let mut line = LineBuilder::new();
        let line_idx = rendered.lines.len() as i32;
        flatten(doc, annotator, mode, block, None, &mut line, line_idx, &mut rendered.anchors);
        rendered.lines.push(Line::from(line.spans));
        rendered.lines.push(Line::default());
    }
    rendered.lines.pop();
    rendered
}

#[allow(clippy::too_many_arguments)]
fn flatten(
    doc: &Document,
    annotator: &Annotator,
    mode: PresentationMode,
    node: limelight_core::NodeId,
    within: Option<Uuid>,
    line: &mut LineBuilder,
    line_idx: i32,
    anchors: &mut Vec<Anchor>,
) {
    let tree = &doc.tree;
    if let Some(raw) = tree.text(node) {
        let text = normalize(raw);
        if text.is_empty() {
            line.boundary_ws |= raw.chars().any(char::is_whitespace);
            return;
        }
        let leading_ws = raw.chars().next().is_some_and(char::is_whitespace);
        if line.col > 0 && (line.boundary_ws || leading_ws) {
            line.spans.push(Span::raw(" "));
            line.col += 1;
        }
        line.boundary_ws = raw.chars().last().is_some_and(char::is_whitespace);
        let width = text.chars().count() as u16;
        let style = within
            .and_then(|id| annotator.marker(id))
            .map(|m| highlight_style(m.span.manipulation_type.class(), mode))
            .unwrap_or_default();
        line.spans.push(Span::styled(text, style));
        line.col += width;
        return;
    }

    let mut inner = within;
    if tree.tag(node) == Some("mark") {
        if let Some(id) = tree
            .attr(node, limelight_core::materialize::MARKER_ID_ATTR)
            .and_then(|v| Uuid::parse_str(v).ok())
        {
            inner = Some(id);
            anchors.push(Anchor {
                marker: id,
                rect: CoreRect::new(line.col as i32, line_idx, 1, 1),
            });
        }
    }
    for &child in tree.children(node) {
        flatten(doc, annotator, mode, child, inner, line, line_idx, anchors);
    }
    // widen the anchor to cover the marker's rendered run
    if inner != within {
        if let Some(anchor) = anchors.iter_mut().rev().find(|a| Some(a.marker) == inner) {
            anchor.rect.width = (line.col as i32 - anchor.rect.x).max(1);
        }
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(frame.area());

    let rendered = layout_document(&app.document, &app.annotator, app.mode);
    let body = Paragraph::new(rendered.lines).scroll((app.scroll, 0));
    frame.render_widget(body, chunks[0]);

    draw_status(frame, app, chunks[1]);
    draw_tooltip(frame, app, chunks[0]);
}

fn draw_status(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let text = match &app.status {
        Some(msg) => msg.clone(),
        None => format!(
            "{} | {} markers | {} | j/k scroll  n/p markers  a apply  c clear  m mode  q quit",
            app.document.title,
            app.annotator.len(),
            app.mode.as_str(),
        ),
    };
    let status = Paragraph::new(text).style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_widget(status, area);
}

fn draw_tooltip(frame: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let Some(content) = app.tooltip.content() else {
        return;
    };
    let width: i32 = 44.min(area.width as i32);
    let height: i32 = 6;

    // placement runs in content coordinates; the viewport is the window the
    // scroll offset exposes
    let viewport = CoreRect::new(0, app.scroll as i32, area.width as i32, area.height as i32);
    let Some(pos) = app.tooltip.position(width, height, viewport) else {
        return;
    };
    let screen_y = pos.y - app.scroll as i32;
    if screen_y < 0 || screen_y + height > area.height as i32 {
        return;
    }
    let rect = ratatui::layout::Rect::new(
        area.x + pos.x.max(0) as u16,
        area.y + screen_y as u16,
        width as u16,
        height as u16,
    );

    let text = vec![
        Line::from(Span::styled(
            content.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(content.body.clone()),
        Line::from(format!("confidence: {:.0}%", content.confidence * 100.0)),
    ];
    let block = Block::default().borders(Borders::ALL).title("manipulation");
    frame.render_widget(Clear, rect);
    frame.render_widget(Paragraph::new(text).block(block).wrap(ratatui::widgets::Wrap { trim: true }), rect);
}

//! Limelight CLI - terminal viewer for classifier-annotated documents
//!
//! Loads a plain-text document plus a span list produced by an external
//! text classifier, and drives the core annotation engine: apply, clear,
//! cycle through the markers and show the tooltip for the selected one.

mod io;
mod ui;

use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use limelight_core::{
    AnnotationSpan, Annotator, Document, ManipulationType, PresentationMode, Tooltip,
};

/// Sample document used when no file is given
const SAMPLE_TEXT: &str = "\
Breaking: The Grid Is One Storm Away From Collapse

The sky is falling and you should be very afraid of what comes next.
Experts we spoke to agree that anyone who questions this is either
naive or paid to look the other way.

Everyone in your neighborhood is already stocking up. Do you really
want to be the only family left unprepared when the lights go out?

Stay tuned. We will keep you informed, because nobody else will.
";

fn sample_spans() -> Vec<AnnotationSpan> {
    vec![
        AnnotationSpan {
            original_text: "you should be very afraid of what comes next".to_string(),
            manipulation_type: ManipulationType::FearMongering,
            manipulation_description: "Predicts catastrophe without offering evidence."
                .to_string(),
            confidence: 0.92,
        },
        AnnotationSpan {
            original_text: "anyone who questions this is either naive or paid".to_string(),
            manipulation_type: ManipulationType::AdHominem,
            manipulation_description: "Attacks the motives of doubters instead of their argument."
                .to_string(),
            confidence: 0.81,
        },
        AnnotationSpan {
            original_text: "Everyone in your neighborhood is already stocking up".to_string(),
            manipulation_type: ManipulationType::Bandwagon,
            manipulation_description: "Implies popularity is proof.".to_string(),
            confidence: 0.77,
        },
    ]
}

pub struct App {
    pub document: Document,
    pub annotator: Annotator,
    pub spans: Vec<AnnotationSpan>,
    pub mode: PresentationMode,
    pub tooltip: Tooltip,
    pub scroll: u16,
    pub selected: usize,
    pub status: Option<String>,
    pub running: bool,
}

impl App {
    fn new(document: Document, spans: Vec<AnnotationSpan>) -> Self {
        Self {
            document,
            annotator: Annotator::new(),
            spans,
            mode: PresentationMode::FullColor,
            tooltip: Tooltip::new(),
            scroll: 0,
            selected: 0,
            status: None,
            running: true,
        }
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status = Some(msg.into());
    }

    fn apply(&mut self) {
        self.tooltip.hide_now();
        let report =
            self.annotator
                .apply_annotations(&mut self.document, &self.spans, self.mode);
        self.selected = 0;
        self.set_status(format!(
            "Applied: {}/{} spans located, {} markers, {} overlap-skipped, {} failed",
            report.spans_located,
            report.spans_total,
            report.markers_created,
            report.overlap_skipped,
            report.materialize_failed,
        ));
    }

    fn clear(&mut self) {
        self.tooltip.hide_now();
        self.annotator.clear_annotations(&mut self.document);
        self.set_status("Annotations cleared");
    }

    /// Move the marker selection and toggle the tooltip onto it
    fn select_marker(&mut self, forward: bool) {
        let rendered = ui::layout_document(&self.document, &self.annotator, self.mode);
        let count = self.annotator.len();
        if count == 0 {
            self.set_status("No markers. Press 'a' to apply annotations.");
            return;
        }
        self.selected = if forward {
            (self.selected + 1) % count
        } else {
            (self.selected + count - 1) % count
        };
        let markers = self.annotator.markers();
        let marker = markers[self.selected];
        let Some(anchor) = rendered.anchors.iter().find(|a| a.marker == marker.id) else {
            return;
        };
        self.tooltip
            .toggle(marker.id, anchor.rect, marker.tooltip_content());
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let document = match args.get(1) {
        Some(path) => io::load_document(path)?,
        None => Document::from_plain_text("Sample".to_string(), SAMPLE_TEXT),
    };
    let spans = match args.get(2) {
        Some(path) => io::load_spans(path)?,
        None => sample_spans(),
    };

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(document, spans);
    app.apply();

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        eprintln!("Error: {}", e);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|f| ui::draw(f, app))?;

        // short poll so pending tooltip hides fire without a key press
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.status = None;
                    handle_key(app, key.code);
                }
            }
        }
        app.tooltip.poll(Instant::now());
    }
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Char('q') => app.running = false,

        // Scrolling
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll = app.scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll = app.scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => app.scroll = 0,

        // Marker navigation
        KeyCode::Char('n') | KeyCode::Char(']') => app.select_marker(true),
        KeyCode::Char('p') | KeyCode::Char('[') => app.select_marker(false),

        // Annotation actions
        KeyCode::Char('a') => app.apply(),
        KeyCode::Char('c') => app.clear(),
        KeyCode::Char('m') => {
            app.mode = match app.mode {
                PresentationMode::FullColor => PresentationMode::LowContrast,
                PresentationMode::LowContrast => PresentationMode::FullColor,
            };
            if !app.annotator.is_empty() {
                app.apply();
            } else {
                app.set_status(format!("Presentation mode: {}", app.mode.as_str()));
            }
        }

        // Delayed hide, cancelled if the selection toggles it back
        KeyCode::Esc => app.tooltip.hide(Duration::from_millis(300), Instant::now()),

        _ => {}
    }
}

//! Tooltip positioner: show/hide state machine plus placement geometry
//!
//! Time is injected by the caller (`hide` takes a deadline base, `poll`
//! realizes due transitions), so the machine stays synchronous and
//! deterministic. Placement prefers centered-above, then below, then the
//! horizontal sides, and finally clamps into the viewport.

use std::time::{Duration, Instant};

use uuid::Uuid;

/// Margin kept between the overlay and the viewport edge, and between the
/// overlay and its anchor
pub const PLACEMENT_MARGIN: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// What the overlay renders; the positioner itself never interprets it
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub title: String,
    pub body: String,
    pub confidence: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Hidden,
    PendingHide { deadline: Instant },
    Visible,
}

/// Hover overlay controller, anchored to one marker at a time
#[derive(Debug)]
pub struct Tooltip {
    state: State,
    anchor: Option<(Uuid, Rect)>,
    content: Option<TooltipContent>,
}

impl Tooltip {
    pub fn new() -> Self {
        Self {
            state: State::Hidden,
            anchor: None,
            content: None,
        }
    }

    /// Render `content` anchored at `anchor`, cancelling any pending hide
    pub fn show(&mut self, marker: Uuid, anchor: Rect, content: TooltipContent) {
        self.state = State::Visible;
        self.anchor = Some((marker, anchor));
        self.content = Some(content);
    }

    /// Schedule a transition to hidden after `delay`. A later `show` or a
    /// pointer entering the overlay cancels it.
    pub fn hide(&mut self, delay: Duration, now: Instant) {
        if self.state != State::Hidden {
            self.state = State::PendingHide {
                deadline: now + delay,
            };
        }
    }

    pub fn hide_now(&mut self) {
        self.state = State::Hidden;
        self.anchor = None;
        self.content = None;
    }

    /// Pointer moved onto the overlay itself: keep it up
    pub fn pointer_entered_overlay(&mut self) {
        if matches!(self.state, State::PendingHide { .. }) {
            self.state = State::Visible;
        }
    }

    /// Hide immediately when already visible for the same marker, else show
    pub fn toggle(&mut self, marker: Uuid, anchor: Rect, content: TooltipContent) {
        if self.is_showing() && self.anchor.map(|(id, _)| id) == Some(marker) {
            self.hide_now();
        } else {
            self.show(marker, anchor, content);
        }
    }

    /// Realize a due pending hide. Call from the event loop's tick.
    pub fn poll(&mut self, now: Instant) {
        if let State::PendingHide { deadline } = self.state {
            if now >= deadline {
                self.hide_now();
            }
        }
    }

    /// Still rendered (visible or waiting out a hide delay)
    pub fn is_showing(&self) -> bool {
        self.state != State::Hidden
    }

    pub fn content(&self) -> Option<&TooltipContent> {
        self.content.as_ref()
    }

    pub fn anchored_marker(&self) -> Option<Uuid> {
        self.anchor.map(|(id, _)| id)
    }

    /// Re-anchor after scroll/resize moved the marker on screen
    pub fn update_anchor(&mut self, rect: Rect) {
        if let Some((id, _)) = self.anchor {
            self.anchor = Some((id, rect));
        }
    }

    /// Where to draw an overlay of `width` x `height`, for the current
    /// anchor. Evaluated on show and again on scroll/resize while visible.
    pub fn position(&self, width: i32, height: i32, viewport: Rect) -> Option<Point> {
        let (_, anchor) = self.anchor?;
        if !self.is_showing() {
            return None;
        }
        Some(place(anchor, width, height, viewport, PLACEMENT_MARGIN))
    }
}

impl Default for Tooltip {
    fn default() -> Self {
        Self::new()
    }
}

/// Placement policy: centered above, else below, else right, else left,
/// then clamp so the overlay never extends off-screen.
pub fn place(anchor: Rect, width: i32, height: i32, viewport: Rect, margin: i32) -> Point {
    let centered_x = anchor.x + anchor.width / 2 - width / 2;
    let centered_y = anchor.y + anchor.height / 2 - height / 2;

    let above = anchor.y - viewport.y >= height + margin;
    let below = viewport.bottom() - anchor.bottom() >= height + margin;

    let chosen = if above {
        Point {
            x: centered_x,
            y: anchor.y - height - margin,
        }
    } else if below {
        Point {
            x: centered_x,
            y: anchor.bottom() + margin,
        }
    } else if viewport.right() - anchor.right() >= width + margin {
        Point {
            x: anchor.right() + margin,
            y: centered_y,
        }
    } else {
        Point {
            x: anchor.x - width - margin,
            y: centered_y,
        }
    };

    clamp(chosen, width, height, viewport, margin)
}

fn clamp(p: Point, width: i32, height: i32, viewport: Rect, margin: i32) -> Point {
    let max_x = viewport.right() - width - margin;
    let max_y = viewport.bottom() - height - margin;
    Point {
        x: p.x.clamp(viewport.x + margin, max_x.max(viewport.x + margin)),
        y: p.y.clamp(viewport.y + margin, max_y.max(viewport.y + margin)),
    }
}

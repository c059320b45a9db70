//! Overlay positioning relative to a trigger, in viewport coordinates.
//!
//! The overlay is drawn after everything else so no pane clips it, which
//! means its position has to follow the trigger whenever any scroll container
//! moves or the viewport is resized. The positioner subscribes to those
//! events while open and releases its subscriptions on close and on drop.

use std::sync::Arc;

use parking_lot::Mutex;
use ratatui::layout::Rect;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopoverConfig {
    /// Gap between the trigger's bottom edge and the overlay.
    pub offset: u16,
    pub min_width: u16,
}

impl Default for PopoverConfig {
    fn default() -> Self {
        Self {
            offset: 1,
            min_width: 48,
        }
    }
}

/// Trigger bounds in viewport cells. `y` goes negative once the trigger is
/// scrolled above the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRect {
    pub x: i32,
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl TriggerRect {
    pub fn bottom(&self) -> i32 {
        self.y + i32::from(self.height)
    }
}

impl From<Rect> for TriggerRect {
    fn from(r: Rect) -> Self {
        Self {
            x: i32::from(r.x),
            y: i32::from(r.y),
            width: r.width,
            height: r.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopoverGeometry {
    pub top: i32,
    pub left: i32,
    pub width: u16,
}

impl PopoverGeometry {
    /// Clip to `viewport`. `None` when nothing of the overlay is visible.
    pub fn to_rect(&self, viewport: Rect, height: u16) -> Option<Rect> {
        let vx0 = i32::from(viewport.x);
        let vy0 = i32::from(viewport.y);
        let vx1 = vx0 + i32::from(viewport.width);
        let vy1 = vy0 + i32::from(viewport.height);

        let x0 = self.left.max(vx0);
        let y0 = self.top.max(vy0);
        let x1 = (self.left + i32::from(self.width)).min(vx1);
        let y1 = (self.top + i32::from(height)).min(vy1);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Rect::new(
            u16::try_from(x0).ok()?,
            u16::try_from(y0).ok()?,
            u16::try_from(x1 - x0).ok()?,
            u16::try_from(y1 - y0).ok()?,
        ))
    }
}

/// `{ top: bottom + offset, left, width: max(width, min_width) }`.
pub fn compute_position(trigger: TriggerRect, cfg: PopoverConfig) -> PopoverGeometry {
    PopoverGeometry {
        top: trigger.bottom() + i32::from(cfg.offset),
        left: trigger.x,
        width: trigger.width.max(cfg.min_width),
    }
}

// -------------------------------------------------------------------------
// Viewport event subscriptions
// -------------------------------------------------------------------------

/// Which container scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSource {
    Window,
    Container(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportEvent {
    Scroll(ScrollSource),
    Resize { width: u16, height: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerKind {
    /// `capture` listeners hear scrolls from every container, others only
    /// the window's own scroll.
    Scroll { capture: bool },
    Resize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Default)]
struct EventsInner {
    next_id: u64,
    listeners: Vec<(ListenerId, ListenerKind)>,
}

/// Viewport scroll/resize subscriptions, shared between host and overlays.
#[derive(Debug, Clone, Default)]
pub struct ViewportEvents {
    inner: Arc<Mutex<EventsInner>>,
}

impl ViewportEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, kind: ListenerKind) -> ListenerId {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.listeners.push((id, kind));
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _)| *lid != id);
        inner.listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listeners that should hear `event`.
    pub fn targets(&self, event: &ViewportEvent) -> Vec<ListenerId> {
        self.inner
            .lock()
            .listeners
            .iter()
            .filter(|(_, kind)| match (event, kind) {
                (ViewportEvent::Scroll(_), ListenerKind::Scroll { capture: true }) => true,
                (ViewportEvent::Scroll(src), ListenerKind::Scroll { capture: false }) => {
                    *src == ScrollSource::Window
                }
                (ViewportEvent::Resize { .. }, ListenerKind::Resize) => true,
                _ => false,
            })
            .map(|(id, _)| *id)
            .collect()
    }
}

// -------------------------------------------------------------------------
// Positioner
// -------------------------------------------------------------------------

#[derive(Debug)]
pub struct PopoverPositioner {
    cfg: PopoverConfig,
    events: ViewportEvents,
    listeners: Vec<ListenerId>,
    geometry: Option<PopoverGeometry>,
}

impl PopoverPositioner {
    pub fn new(cfg: PopoverConfig, events: ViewportEvents) -> Self {
        Self {
            cfg,
            events,
            listeners: Vec::new(),
            geometry: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn geometry(&self) -> Option<PopoverGeometry> {
        self.geometry
    }

    /// Compute the initial position and subscribe to scroll (capture) and resize.
    pub fn open(&mut self, trigger: TriggerRect) {
        if self.listeners.is_empty() {
            self.listeners
                .push(self.events.add(ListenerKind::Scroll { capture: true }));
            self.listeners.push(self.events.add(ListenerKind::Resize));
        }
        self.geometry = Some(compute_position(trigger, self.cfg));
    }

    /// Recompute when `event` reaches one of our listeners. Returns whether it did.
    pub fn on_event(&mut self, event: &ViewportEvent, trigger: TriggerRect) -> bool {
        if self.geometry.is_none() {
            return false;
        }
        let targets = self.events.targets(event);
        if !self.listeners.iter().any(|id| targets.contains(id)) {
            return false;
        }
        let next = compute_position(trigger, self.cfg);
        trace!(?event, top = next.top, left = next.left, "popover repositioned");
        self.geometry = Some(next);
        true
    }

    /// Drop the geometry and every subscription.
    pub fn close(&mut self) {
        for id in self.listeners.drain(..) {
            self.events.remove(id);
        }
        self.geometry = None;
    }
}

impl Drop for PopoverPositioner {
    fn drop(&mut self) {
        self.close();
    }
}

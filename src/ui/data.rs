use std::io;

use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::model::types::Category;
use crate::ui::components::theme::ThemePalette;
use crate::ui::navigate::{ExternalOpener, Navigator};
use crate::ui::popover::TriggerRect;
use crate::ui::shortcuts;

/// Scroll container id of the page body.
pub const BODY_CONTAINER: u32 = 1;

/// Page row holding the palette trigger.
pub const TRIGGER_ROW: u16 = 2;

const TRIGGER_MAX_WIDTH: u16 = 60;

/// The host application the palette navigates within: a routed page with its
/// own scroll position.
#[derive(Debug)]
pub struct HostView {
    route: String,
    history: Vec<String>,
    scroll: u16,
    status: String,
    opener: ExternalOpener,
}

impl HostView {
    pub fn new(opener: ExternalOpener) -> Self {
        Self {
            route: "/".into(),
            history: Vec::new(),
            scroll: 0,
            status: format!("{} to search", shortcuts::TOGGLE_PALETTE),
            opener,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    /// Routes visited before the current one, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Scroll the body by `delta` rows within `[0, max]`. Returns whether it moved.
    pub fn scroll_by(&mut self, delta: i32, max: u16) -> bool {
        let next = (i32::from(self.scroll) + delta).clamp(0, i32::from(max));
        let next = u16::try_from(next).unwrap_or(0);
        let moved = next != self.scroll;
        self.scroll = next;
        moved
    }

    /// Largest useful scroll offset for a body `height` rows tall.
    pub fn max_scroll(&self, height: u16) -> u16 {
        let total = u16::try_from(self.page_len()).unwrap_or(u16::MAX);
        total.saturating_sub(height)
    }

    /// Trigger bounds in viewport cells, following the body's scroll offset.
    pub fn trigger_rect(&self, body: Rect) -> TriggerRect {
        TriggerRect {
            x: i32::from(body.x) + 2,
            y: i32::from(body.y) + i32::from(TRIGGER_ROW) - i32::from(self.scroll),
            width: body.width.saturating_sub(4).min(TRIGGER_MAX_WIDTH),
            height: 1,
        }
    }

    /// Whether the viewport cell `(column, row)` lies on the trigger.
    pub fn hits_trigger(&self, body: Rect, column: u16, row: u16) -> bool {
        let t = self.trigger_rect(body);
        let (col, row) = (i32::from(column), i32::from(row));
        row == t.y && col >= t.x && col < t.x + i32::from(t.width)
    }

    fn page_len(&self) -> usize {
        // title, blank, trigger, blank, heading, blank, activity rows
        6 + ACTIVITY_ROWS
    }

    pub fn page_lines(&self, palette: ThemePalette) -> Vec<Line<'static>> {
        let (section, detail) = describe_route(&self.route);
        let mut lines = Vec::with_capacity(self.page_len());
        lines.push(Line::from(vec![
            Span::styled("folio", palette.title()),
            Span::styled(format!("  {}", self.route), palette.hint_style()),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                " Search portfolios, assets, documents, articles… ",
                palette.border_focus_style(),
            ),
            Span::styled(format!(" {} ", shortcuts::TOGGLE_PALETTE), palette.hint_style()),
        ]));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            section,
            Style::default()
                .fg(palette.fg)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(detail, palette.hint_style())));
        for i in 0..ACTIVITY_ROWS {
            let category = Category::PRIORITY[i % Category::PRIORITY.len()];
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {} ", category.icon()),
                    palette.group_header(category),
                ),
                Span::raw(format!(" activity #{:02} in {}", i + 1, category.label())),
            ]));
        }
        lines
    }
}

const ACTIVITY_ROWS: usize = 40;

fn describe_route(route: &str) -> (String, String) {
    let mut parts = route.trim_start_matches('/').splitn(2, '/');
    let head = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();
    match Category::parse(head) {
        Some(category) => (
            format!("{} {}", category.icon(), category.label()),
            format!("Viewing {} {rest}", category.as_str()),
        ),
        None if head.is_empty() => ("Dashboard".into(), "Recent activity".into()),
        None => (route.to_string(), "Page".into()),
    }
}

impl Navigator for HostView {
    fn push_route(&mut self, path: &str) {
        let previous = std::mem::replace(&mut self.route, path.to_string());
        self.history.push(previous);
        self.scroll = 0;
        self.status = format!("Opened {path}");
    }

    fn open_external(&mut self, url: &str) -> io::Result<()> {
        match self.opener.open(url) {
            Ok(()) => {
                self.status = format!("Opened {url} in browser");
                Ok(())
            }
            Err(err) => {
                self.status = format!("Could not open {url}");
                Err(err)
            }
        }
    }
}

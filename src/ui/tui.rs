//! Ratatui host wired to the search palette.

use anyhow::Result;
use once_cell::sync::Lazy;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::{ExecutableCommand, execute};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::PaletteConfig;
use crate::db_path_for;
use crate::search::provider::LookupError;
use crate::search::worker::{LookupBackend, LookupWorker};
use crate::storage::sqlite::SqliteSearchStore;
use crate::ui::components::theme::ThemePalette;
use crate::ui::data::{BODY_CONTAINER, HostView};
use crate::ui::nav::PaletteKey;
use crate::ui::navigate::{ExternalOpener, navigate};
use crate::ui::palette::{PaletteAction, PaletteController, PaletteOptions, PaletteView};
use crate::ui::popover::{ScrollSource, ViewportEvent, ViewportEvents};
use crate::ui::shortcuts::{self, ShortcutRegistry};

/// Body rows the overlay shows before it starts scrolling.
const MAX_OVERLAY_ROWS: u16 = 14;
const HEADLESS_TIMEOUT: Duration = Duration::from_secs(3);
const WHEEL_STEP: i32 = 3;

static OPEN_LEGEND: Lazy<String> = Lazy::new(|| {
    format!(
        "{}/{} select • {} open • {} close • hover to select • click to open",
        shortcuts::SELECT_PREV,
        shortcuts::SELECT_NEXT,
        shortcuts::OPEN,
        shortcuts::CLOSE
    )
});

static CLOSED_LEGEND: Lazy<String> = Lazy::new(|| {
    format!(
        "{} search | {} scroll | {} theme | {} quit",
        shortcuts::TOGGLE_PALETTE,
        shortcuts::SCROLL,
        shortcuts::THEME,
        shortcuts::QUIT
    )
});

pub fn footer_legend(palette_open: bool) -> &'static str {
    if palette_open {
        OPEN_LEGEND.as_str()
    } else {
        CLOSED_LEGEND.as_str()
    }
}

/// Overlay rows as last drawn, for mapping pointer positions to results.
#[derive(Debug, Default)]
struct OverlayHits {
    area: Rect,
    body: Rect,
    offset: usize,
    rows: Vec<Option<usize>>,
}

impl OverlayHits {
    fn clear(&mut self) {
        *self = Self::default();
    }

    fn contains(&self, column: u16, row: u16) -> bool {
        self.area.contains(Position::new(column, row))
    }

    fn index_at(&self, column: u16, row: u16) -> Option<usize> {
        if !self.body.contains(Position::new(column, row)) {
            return None;
        }
        let line = self.offset + usize::from(row - self.body.y);
        self.rows.get(line).copied().flatten()
    }
}

fn split_screen(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

fn spawn_worker(data_dir: &Path, cfg: &PaletteConfig) -> LookupWorker {
    let db_path = db_path_for(data_dir);
    let limit = cfg.per_category_limit;
    LookupWorker::spawn(
        move || {
            SqliteSearchStore::open(&db_path, limit)
                .map_err(|e| LookupError::Unavailable(e.to_string()))
        },
        cfg.watch_interval(),
    )
}

fn palette_key(key: &KeyEvent) -> Option<PaletteKey> {
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return None;
    }
    match key.code {
        KeyCode::Up => Some(PaletteKey::Up),
        KeyCode::Down => Some(PaletteKey::Down),
        KeyCode::Enter => Some(PaletteKey::Enter),
        KeyCode::Esc => Some(PaletteKey::Escape),
        KeyCode::Backspace => Some(PaletteKey::Backspace),
        KeyCode::Char(c) => Some(PaletteKey::Char(c)),
        _ => None,
    }
}

fn apply_actions<B: LookupBackend>(
    actions: Vec<PaletteAction>,
    controller: &mut PaletteController<B>,
    host: &mut HostView,
    body: Rect,
    now: Instant,
) {
    for action in actions {
        match action {
            PaletteAction::OpenChange(open) => {
                controller.set_open(open, now, host.trigger_rect(body));
            }
            PaletteAction::Navigate(item) => navigate(&item, host),
        }
    }
}

fn overlay_rows(
    view: PaletteView<'_>,
    selected: Option<usize>,
    min_len: usize,
    signed_in: bool,
    palette: ThemePalette,
) -> Vec<(Line<'static>, Option<usize>)> {
    let note = |text: String| vec![(Line::from(Span::styled(text, palette.hint_style())), None)];
    match view {
        PaletteView::Closed => Vec::new(),
        PaletteView::Hint if !signed_in => note("Sign in to search".into()),
        PaletteView::Hint => note(format!("Type at least {min_len} characters to search")),
        PaletteView::Loading => note("Searching…".into()),
        PaletteView::NoResults { query } => note(format!("No results for \"{query}\"")),
        PaletteView::Results(results) => {
            let mut rows = Vec::with_capacity(results.len() + results.groups.len());
            for group in &results.groups {
                rows.push((
                    Line::from(Span::styled(
                        format!(" {} {}", group.icon(), group.label()),
                        palette.group_header(group.category),
                    )),
                    None,
                ));
                for (offset, item) in group.items.iter().enumerate() {
                    let index = group.start + offset;
                    let icon = item.icon.as_deref().unwrap_or(group.icon());
                    let mut spans = vec![
                        Span::styled(format!("   {icon} "), Style::default().fg(group.accent())),
                        Span::raw(item.title.clone()),
                    ];
                    if !item.subtitle.is_empty() {
                        spans.push(Span::styled(
                            format!("  {}", item.subtitle),
                            palette.hint_style(),
                        ));
                    }
                    if item.external {
                        spans.push(Span::styled(" ↗", palette.hint_style()));
                    }
                    let mut line = Line::from(spans);
                    if selected == Some(index) {
                        line = line.style(palette.highlight_style());
                    }
                    rows.push((line, Some(index)));
                }
            }
            rows
        }
    }
}

fn render_palette<B: LookupBackend>(
    f: &mut Frame,
    controller: &PaletteController<B>,
    palette: ThemePalette,
    hits: &mut OverlayHits,
) {
    hits.clear();
    let Some(geometry) = controller.geometry() else {
        return;
    };
    let rows = overlay_rows(
        controller.view(),
        controller.selected_index(),
        controller.options().min_query_len,
        controller.identity().is_some(),
        palette,
    );
    let body_rows = u16::try_from(rows.len()).unwrap_or(u16::MAX).min(MAX_OVERLAY_ROWS);
    let Some(area) = geometry.to_rect(f.area(), body_rows + 3) else {
        return;
    };

    f.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(" Search ", palette.title()))
        .borders(Borders::ALL)
        .border_style(palette.border_focus_style())
        .style(palette.surface_style());
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let input = if controller.query().is_empty() {
        Line::from(vec![
            Span::styled("› ", palette.title()),
            Span::styled("Search…", palette.hint_style()),
        ])
    } else {
        Line::from(vec![
            Span::styled("› ", palette.title()),
            Span::raw(controller.query().to_string()),
            Span::styled("▏", palette.title()),
        ])
    };
    f.render_widget(Paragraph::new(input), Rect { height: 1, ..inner });

    let body = Rect {
        y: inner.y + 1,
        height: inner.height.saturating_sub(1),
        ..inner
    };
    let visible = usize::from(body.height);
    let cursor_row = controller
        .selected_index()
        .and_then(|sel| rows.iter().position(|(_, idx)| *idx == Some(sel)))
        .unwrap_or(0);
    let offset = if visible > 0 && cursor_row >= visible {
        cursor_row + 1 - visible
    } else {
        0
    };
    let lines: Vec<Line> = rows
        .iter()
        .skip(offset)
        .take(visible)
        .map(|(line, _)| line.clone())
        .collect();
    f.render_widget(Paragraph::new(lines), body);

    *hits = OverlayHits {
        area,
        body,
        offset,
        rows: rows.into_iter().map(|(_, idx)| idx).collect(),
    };
}

pub fn run_tui(data_dir: &Path, cfg: PaletteConfig, once: bool) -> Result<()> {
    if once
        && dotenvy::var("TUI_HEADLESS")
            .map(|v| v == "1")
            .unwrap_or(false)
    {
        return run_tui_headless(data_dir, &cfg);
    }

    let events = ViewportEvents::new();
    let mut controller = PaletteController::mount(
        PaletteOptions::from(&cfg),
        cfg.session_identity(),
        spawn_worker(data_dir, &cfg),
        ShortcutRegistry::global(),
        events,
    )?;
    let mut host = HostView::new(ExternalOpener::new(cfg.browser.clone()));
    if controller.identity().is_none() {
        host.set_status("No identity configured (set FOLIO_IDENTITY or --identity)");
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = event_loop(&mut terminal, &mut controller, &mut host, &cfg, once);
    drop(controller);
    teardown_terminal()?;
    res
}

fn event_loop<B: LookupBackend>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    controller: &mut PaletteController<B>,
    host: &mut HostView,
    cfg: &PaletteConfig,
    once: bool,
) -> Result<()> {
    let tick_rate = cfg.tick_rate();
    let size = terminal.size()?;
    let mut screen = Rect::new(0, 0, size.width, size.height);
    let mut theme_dark = true;
    let mut hits = OverlayHits::default();
    let mut needs_draw = true;

    loop {
        if needs_draw {
            terminal.draw(|f| {
                let palette = if theme_dark {
                    ThemePalette::dark()
                } else {
                    ThemePalette::light()
                };
                screen = f.area();
                let (body, footer) = split_screen(screen);

                f.render_widget(
                    Paragraph::new(host.page_lines(palette))
                        .style(Style::default().bg(palette.bg).fg(palette.fg))
                        .scroll((host.scroll(), 0)),
                    body,
                );

                let footer_line = format!(
                    "{} | {}",
                    footer_legend(controller.is_open()),
                    host.status()
                );
                f.render_widget(
                    Paragraph::new(footer_line).style(Style::default().fg(palette.status)),
                    footer,
                );

                // Drawn last so nothing in the body clips it.
                render_palette(f, controller, palette, &mut hits);
            })?;
            needs_draw = false;
            if once {
                return Ok(());
            }
        }

        let mut timeout = tick_rate;
        if let Some(deadline) = controller.next_deadline() {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }

        if event::poll(timeout)? {
            let (body, _) = split_screen(screen);
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    needs_draw = true;
                    if key.modifiers.contains(KeyModifiers::CONTROL)
                        && key.code == KeyCode::Char('c')
                    {
                        break;
                    }
                    if let Some(toggle) = controller.handle_global_key(&key) {
                        apply_actions(vec![toggle], controller, host, body, now);
                    } else if controller.is_open() {
                        if let Some(pk) = palette_key(&key) {
                            let outcome = controller.handle_key(pk, now);
                            apply_actions(outcome.actions, controller, host, body, now);
                        }
                    } else {
                        handle_host_key(&key, controller, host, body, now, &mut theme_dark);
                    }
                }
                Event::Mouse(mouse) => {
                    needs_draw |= handle_mouse(mouse, controller, host, &hits, body, now);
                }
                Event::Resize(width, height) => {
                    screen = Rect::new(0, 0, width, height);
                    let (body, _) = split_screen(screen);
                    controller.on_viewport_event(
                        &ViewportEvent::Resize { width, height },
                        host.trigger_rect(body),
                    );
                    needs_draw = true;
                }
                _ => {}
            }
        }

        if controller.tick(Instant::now()) {
            needs_draw = true;
        }
    }

    info!(route = %host.route(), "tui exiting");
    Ok(())
}

fn handle_host_key<B: LookupBackend>(
    key: &KeyEvent,
    controller: &mut PaletteController<B>,
    host: &mut HostView,
    body: Rect,
    now: Instant,
    theme_dark: &mut bool,
) {
    let max = host.max_scroll(body.height);
    let page = i32::from(body.height.saturating_sub(1).max(1));
    let moved = match key.code {
        KeyCode::F(2) => {
            *theme_dark = !*theme_dark;
            false
        }
        KeyCode::Enter | KeyCode::Char('/') => {
            controller.set_open(true, now, host.trigger_rect(body));
            false
        }
        KeyCode::Up => host.scroll_by(-1, max),
        KeyCode::Down => host.scroll_by(1, max),
        KeyCode::PageUp => host.scroll_by(-page, max),
        KeyCode::PageDown => host.scroll_by(page, max),
        KeyCode::Home => host.scroll_by(-i32::from(max), max),
        KeyCode::End => host.scroll_by(i32::from(max), max),
        _ => false,
    };
    if moved {
        controller.on_viewport_event(
            &ViewportEvent::Scroll(ScrollSource::Container(BODY_CONTAINER)),
            host.trigger_rect(body),
        );
    }
}

fn handle_mouse<B: LookupBackend>(
    mouse: MouseEvent,
    controller: &mut PaletteController<B>,
    host: &mut HostView,
    hits: &OverlayHits,
    body: Rect,
    now: Instant,
) -> bool {
    let (column, row) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Moved => match hits.index_at(column, row) {
            Some(index) if controller.selected_index() != Some(index) => {
                controller.handle_key(PaletteKey::Hover(index), now);
                true
            }
            _ => false,
        },
        MouseEventKind::Down(MouseButton::Left) => {
            if controller.is_open() {
                if let Some(index) = hits.index_at(column, row) {
                    controller.handle_key(PaletteKey::Hover(index), now);
                    let outcome = controller.handle_key(PaletteKey::Enter, now);
                    apply_actions(outcome.actions, controller, host, body, now);
                } else if !hits.contains(column, row) {
                    let closed = controller.dismiss().into_iter().collect();
                    apply_actions(closed, controller, host, body, now);
                }
                true
            } else if host.hits_trigger(body, column, row) {
                controller.set_open(true, now, host.trigger_rect(body));
                true
            } else {
                false
            }
        }
        MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
            if hits.contains(column, row) {
                return false;
            }
            let delta = if mouse.kind == MouseEventKind::ScrollUp {
                -WHEEL_STEP
            } else {
                WHEEL_STEP
            };
            let max = host.max_scroll(body.height);
            if !host.scroll_by(delta, max) {
                return false;
            }
            controller.on_viewport_event(
                &ViewportEvent::Scroll(ScrollSource::Container(BODY_CONTAINER)),
                host.trigger_rect(body),
            );
            true
        }
        _ => false,
    }
}

/// Drive one search through the full palette pipeline without a terminal.
fn run_tui_headless(data_dir: &Path, cfg: &PaletteConfig) -> Result<()> {
    let opts = PaletteOptions::from(cfg);
    let registry = ShortcutRegistry::new();
    let mut controller = PaletteController::mount(
        opts,
        cfg.session_identity(),
        spawn_worker(data_dir, cfg),
        &registry,
        ViewportEvents::new(),
    )?;
    let host = HostView::new(ExternalOpener::default());
    let query = dotenvy::var("TUI_HEADLESS_QUERY").unwrap_or_else(|_| "search".into());

    let opened = Instant::now();
    controller.set_open(true, opened, host.trigger_rect(Rect::new(0, 0, 100, 30)));
    let typed = opened + opts.focus_delay;
    for c in query.chars() {
        controller.handle_key(PaletteKey::Char(c), typed);
    }
    controller.tick(typed + opts.debounce);

    let give_up = Instant::now() + HEADLESS_TIMEOUT;
    while controller.is_searching() && Instant::now() < give_up {
        std::thread::sleep(Duration::from_millis(10));
        controller.tick(Instant::now());
    }

    match controller.view() {
        PaletteView::Results(results) => println!(
            "{} results in {} groups for \"{query}\"",
            results.len(),
            results.groups.len()
        ),
        PaletteView::NoResults { .. } => println!("0 results for \"{query}\""),
        PaletteView::Hint => println!("search skipped for \"{query}\""),
        PaletteView::Loading | PaletteView::Closed => {
            anyhow::bail!("headless search did not complete")
        }
    }
    Ok(())
}

fn teardown_terminal() -> Result<()> {
    let mut stdout = io::stdout();
    disable_raw_mode()?;
    execute!(stdout, DisableMouseCapture, LeaveAlternateScreen)?;
    Ok(())
}

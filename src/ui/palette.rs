//! Search palette controller.
//!
//! Owns every piece of transient palette state (query text, debounced term,
//! lookup dispatch, grouped results, selection, overlay geometry) for one
//! mounted instance. Rendering lives in [`crate::ui::tui`]; this module is
//! backend-agnostic and driven with explicit timestamps.

use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use tracing::debug;

use crate::config::PaletteConfig;
use crate::model::types::{ResultItem, SessionIdentity};
use crate::search::categorize::{CategorizedResults, categorize};
use crate::search::debounce::Debouncer;
use crate::search::dispatch::{QueryDispatcher, gate};
use crate::search::worker::{BackendEvent, LookupBackend};
use crate::ui::nav::{PaletteKey, Selection};
use crate::ui::popover::{
    PopoverConfig, PopoverGeometry, PopoverPositioner, TriggerRect, ViewportEvent, ViewportEvents,
};
use crate::ui::shortcuts::{Chord, ShortcutError, ShortcutGuard, ShortcutRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteOptions {
    pub debounce: Duration,
    pub min_query_len: usize,
    pub focus_delay: Duration,
    pub popover: PopoverConfig,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self::from(&PaletteConfig::default())
    }
}

impl From<&PaletteConfig> for PaletteOptions {
    fn from(cfg: &PaletteConfig) -> Self {
        Self {
            debounce: cfg.debounce(),
            min_query_len: cfg.min_query_len,
            focus_delay: cfg.focus_delay(),
            popover: PopoverConfig {
                offset: cfg.popover_offset,
                min_width: cfg.popover_min_width,
            },
        }
    }
}

/// Requests the palette makes of its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteAction {
    /// Controlled-visibility request (`onOpenChange`).
    OpenChange(bool),
    /// Go to this item. The overlay has already closed.
    Navigate(ResultItem),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    /// The palette handled the key; the host must not act on it.
    pub consumed: bool,
    /// Requests for the host, in the order they took effect.
    pub actions: Vec<PaletteAction>,
}

impl KeyOutcome {
    fn ignored() -> Self {
        Self::default()
    }

    fn consumed() -> Self {
        Self {
            consumed: true,
            actions: Vec::new(),
        }
    }

    fn with(actions: Vec<PaletteAction>) -> Self {
        Self {
            consumed: true,
            actions,
        }
    }
}

/// What the overlay body should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaletteView<'a> {
    Closed,
    /// Nothing searched yet: query below the gate or no identity.
    Hint,
    Loading,
    NoResults { query: &'a str },
    Results(&'a CategorizedResults),
}

pub struct PaletteController<B: LookupBackend> {
    opts: PaletteOptions,
    backend: B,
    open: bool,
    query: String,
    debouncer: Debouncer<String>,
    dispatcher: QueryDispatcher,
    results: CategorizedResults,
    selection: Selection,
    positioner: PopoverPositioner,
    focus_at: Option<Instant>,
    toggle: ShortcutGuard,
}

impl<B: LookupBackend> PaletteController<B> {
    /// Mount the palette: acquires the toggle chord for as long as the
    /// controller lives.
    pub fn mount(
        opts: PaletteOptions,
        identity: Option<SessionIdentity>,
        backend: B,
        shortcuts: &ShortcutRegistry,
        events: ViewportEvents,
    ) -> Result<Self, ShortcutError> {
        let toggle = shortcuts.acquire(Chord::palette_toggle())?;
        Ok(Self {
            debouncer: Debouncer::new(String::new(), opts.debounce),
            dispatcher: QueryDispatcher::new(opts.min_query_len, identity),
            positioner: PopoverPositioner::new(opts.popover, events),
            opts,
            backend,
            open: false,
            query: String::new(),
            results: CategorizedResults::default(),
            selection: Selection::default(),
            focus_at: None,
            toggle,
        })
    }

    pub fn options(&self) -> PaletteOptions {
        self.opts
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.dispatcher.identity()
    }

    pub fn debounced_query(&self) -> &str {
        self.debouncer.value()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selection.current()
    }

    pub fn selected_item(&self) -> Option<&ResultItem> {
        self.selection
            .current()
            .and_then(|i| self.results.item(i))
    }

    pub fn results(&self) -> &CategorizedResults {
        &self.results
    }

    pub fn is_searching(&self) -> bool {
        self.dispatcher.is_searching()
    }

    pub fn geometry(&self) -> Option<PopoverGeometry> {
        self.positioner.geometry()
    }

    /// Typed input is accepted once the focus delay after opening has passed.
    pub fn is_focused(&self, now: Instant) -> bool {
        self.focus_at.is_some_and(|at| now >= at)
    }

    /// When [`tick`](Self::tick) next has a debounced term to promote.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    pub fn view(&self) -> PaletteView<'_> {
        if !self.open {
            PaletteView::Closed
        } else if self.dispatcher.is_skipped() {
            PaletteView::Hint
        } else if self.dispatcher.is_searching() {
            PaletteView::Loading
        } else if self.results.is_empty() {
            PaletteView::NoResults {
                query: self.debouncer.value(),
            }
        } else {
            PaletteView::Results(&self.results)
        }
    }

    /// Controlled visibility. Opening twice only re-syncs the position;
    /// closing when closed is a no-op.
    pub fn set_open(&mut self, open: bool, now: Instant, trigger: TriggerRect) {
        if open == self.open {
            if open {
                self.positioner.open(trigger);
            }
            return;
        }
        if open {
            self.open = true;
            self.reset_transient();
            self.focus_at = Some(now + self.opts.focus_delay);
            self.positioner.open(trigger);
            debug!("palette opened");
        } else {
            self.close();
        }
    }

    /// Close from outside the key handler (click outside the overlay).
    /// Reports the close exactly like Escape; `None` when already closed.
    pub fn dismiss(&mut self) -> Option<PaletteAction> {
        if !self.open {
            return None;
        }
        self.close();
        Some(PaletteAction::OpenChange(false))
    }

    /// Toggle request for the global chord, if `key` is that chord.
    pub fn handle_global_key(&self, key: &KeyEvent) -> Option<PaletteAction> {
        self.toggle
            .matches(key)
            .then(|| PaletteAction::OpenChange(!self.open))
    }

    pub fn handle_key(&mut self, key: PaletteKey, now: Instant) -> KeyOutcome {
        if !self.open {
            return KeyOutcome::ignored();
        }
        match key {
            PaletteKey::Down => {
                self.selection.next();
                KeyOutcome::consumed()
            }
            PaletteKey::Up => {
                self.selection.prev();
                KeyOutcome::consumed()
            }
            PaletteKey::Hover(index) => {
                self.selection.hover(index);
                KeyOutcome::consumed()
            }
            PaletteKey::Enter => match self.selected_item().cloned() {
                Some(item) => {
                    let mut actions: Vec<_> = self.dismiss().into_iter().collect();
                    actions.push(PaletteAction::Navigate(item));
                    KeyOutcome::with(actions)
                }
                None => KeyOutcome::consumed(),
            },
            PaletteKey::Escape => KeyOutcome::with(self.dismiss().into_iter().collect()),
            PaletteKey::Char(c) => {
                if self.is_focused(now) {
                    self.query.push(c);
                    self.on_query_changed(now);
                }
                KeyOutcome::consumed()
            }
            PaletteKey::Backspace => {
                if self.is_focused(now) && self.query.pop().is_some() {
                    self.on_query_changed(now);
                }
                KeyOutcome::consumed()
            }
        }
    }

    /// Promote the debounced term and drain backend events.
    /// Returns whether anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if let Some(term) = self.debouncer.poll(now).cloned() {
            if let Some(request) = self.dispatcher.update_term(&term) {
                self.backend.submit(request);
            }
            self.rebuild();
            changed = true;
        }
        while let Some(event) = self.backend.try_next() {
            match event {
                BackendEvent::Response(response) => {
                    if self.dispatcher.accept(response) {
                        self.rebuild();
                        changed = true;
                    }
                }
                BackendEvent::DataChanged => {
                    if let Some(request) = self.dispatcher.refresh() {
                        self.backend.submit(request);
                    }
                }
            }
        }
        changed
    }

    pub fn set_identity(&mut self, identity: Option<SessionIdentity>) {
        if let Some(request) = self.dispatcher.set_identity(identity) {
            self.backend.submit(request);
        }
        self.rebuild();
    }

    /// Forward a scroll or resize; returns whether the overlay moved.
    pub fn on_viewport_event(&mut self, event: &ViewportEvent, trigger: TriggerRect) -> bool {
        self.positioner.on_event(event, trigger)
    }

    /// Explicit unmount; equivalent to dropping the controller.
    pub fn unmount(self) {}

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.reset_transient();
        self.focus_at = None;
        self.positioner.close();
        debug!("palette closed");
    }

    fn reset_transient(&mut self) {
        self.query.clear();
        self.debouncer.flush(String::new());
        self.dispatcher.reset();
        self.results = CategorizedResults::default();
        self.selection.clear();
    }

    fn on_query_changed(&mut self, now: Instant) {
        self.selection.reset(self.results.len());
        let open_gate = gate(
            &self.query,
            self.dispatcher.identity(),
            self.dispatcher.min_len(),
        )
        .is_some();
        if open_gate {
            self.debouncer.set(self.query.clone(), now);
        } else {
            // Below the gate there is nothing to wait for: go idle now so a
            // slow response for the old term cannot land afterwards.
            self.debouncer.flush(self.query.clone());
            self.dispatcher.update_term(&self.query);
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        self.results = self
            .dispatcher
            .results()
            .map(categorize)
            .unwrap_or_default();
        self.selection.reset(self.results.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Category, RawResults};
    use crate::search::dispatch::{LookupRequest, LookupResponse};
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct ManualBackend {
        sent: RefCell<Vec<LookupRequest>>,
        inbox: RefCell<VecDeque<BackendEvent>>,
    }

    impl ManualBackend {
        fn respond(&self, seq: u64, results: RawResults) {
            self.inbox
                .borrow_mut()
                .push_back(BackendEvent::Response(LookupResponse {
                    seq,
                    outcome: Ok(results),
                }));
        }
    }

    impl LookupBackend for ManualBackend {
        fn submit(&self, request: LookupRequest) {
            self.sent.borrow_mut().push(request);
        }

        fn try_next(&self) -> Option<BackendEvent> {
            self.inbox.borrow_mut().pop_front()
        }
    }

    fn item(id: &str, title: &str, category: Category) -> ResultItem {
        ResultItem {
            id: id.into(),
            title: title.into(),
            subtitle: String::new(),
            href: format!("/{category}/{id}"),
            icon: None,
            category,
            external: false,
        }
    }

    fn trigger() -> TriggerRect {
        TriggerRect {
            x: 2,
            y: 1,
            width: 30,
            height: 1,
        }
    }

    fn mounted(reg: &ShortcutRegistry) -> PaletteController<ManualBackend> {
        PaletteController::mount(
            PaletteOptions::default(),
            SessionIdentity::new("user_1"),
            ManualBackend::default(),
            reg,
            ViewportEvents::new(),
        )
        .unwrap()
    }

    fn type_str(p: &mut PaletteController<ManualBackend>, s: &str, now: Instant) {
        for c in s.chars() {
            p.handle_key(PaletteKey::Char(c), now);
        }
    }

    #[test]
    fn open_starts_empty_and_unfocused() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        assert_eq!(p.view(), PaletteView::Hint);
        assert_eq!(p.selected_index(), None);
        assert!(!p.is_focused(t0));
        p.handle_key(PaletteKey::Char('x'), t0);
        assert_eq!(p.query(), "", "input before focus is dropped");
        assert!(p.is_focused(t0 + Duration::from_millis(50)));
    }

    #[test]
    fn apple_scenario_end_to_end() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        let typed = t0 + Duration::from_millis(60);
        type_str(&mut p, "ap", typed);

        assert!(!p.tick(typed + Duration::from_millis(100)));
        assert!(p.backend().sent.borrow().is_empty());

        assert!(p.tick(typed + Duration::from_millis(180)));
        let seq = p.backend().sent.borrow()[0].seq;
        assert!(p.is_searching());
        assert_eq!(p.view(), PaletteView::Loading);

        p.backend().respond(
            seq,
            RawResults {
                portfolios: vec![item("p1", "Apple Growth", Category::Portfolio)],
                assets: vec![item("a1", "AAPL", Category::Asset)],
                ..RawResults::default()
            },
        );
        assert!(p.tick(typed + Duration::from_millis(200)));
        let PaletteView::Results(results) = p.view() else {
            panic!("expected results");
        };
        let labels: Vec<_> = results.groups.iter().map(|g| g.label()).collect();
        assert_eq!(labels, vec!["Portfolios", "Assets"]);
        assert_eq!(p.selected_index(), Some(0));
        assert_eq!(p.selected_item().unwrap().id, "p1");
    }

    #[test]
    fn enter_navigates_and_closes() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        let t1 = t0 + Duration::from_millis(60);
        type_str(&mut p, "aapl", t1);
        p.tick(t1 + Duration::from_millis(180));
        let seq = p.backend().sent.borrow()[0].seq;
        p.backend().respond(
            seq,
            RawResults {
                assets: vec![
                    item("a1", "AAPL", Category::Asset),
                    item("a2", "AAPL 2030 call", Category::Asset),
                ],
                ..RawResults::default()
            },
        );
        p.tick(t1 + Duration::from_millis(200));
        p.handle_key(PaletteKey::Down, t1);
        let out = p.handle_key(PaletteKey::Enter, t1);
        assert!(out.consumed);
        assert_eq!(
            out.actions,
            vec![
                PaletteAction::OpenChange(false),
                PaletteAction::Navigate(item("a2", "AAPL 2030 call", Category::Asset)),
            ]
        );
        assert!(!p.is_open());
        assert_eq!(p.query(), "");
        assert!(p.geometry().is_none());
    }

    #[test]
    fn enter_with_no_results_does_nothing() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        let out = p.handle_key(PaletteKey::Enter, t0);
        assert!(out.consumed);
        assert!(out.actions.is_empty());
        assert!(p.is_open());
    }

    #[test]
    fn escape_is_idempotent() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        type_str(&mut p, "ap", t0 + Duration::from_millis(60));
        let out = p.handle_key(PaletteKey::Escape, t0);
        assert_eq!(out.actions, vec![PaletteAction::OpenChange(false)]);
        assert_eq!(p.query(), "");
        assert_eq!(p.selected_index(), None);

        let again = p.handle_key(PaletteKey::Escape, t0);
        assert_eq!(again, KeyOutcome::default());
        p.set_open(false, t0, trigger());
        assert!(!p.is_open());
    }

    #[test]
    fn dismiss_reports_close_once() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        assert_eq!(p.dismiss(), None);
        p.set_open(true, t0, trigger());
        assert_eq!(p.dismiss(), Some(PaletteAction::OpenChange(false)));
        assert!(!p.is_open());
        assert!(p.geometry().is_none());
        assert_eq!(p.dismiss(), None);
    }

    #[test]
    fn clearing_query_goes_idle_immediately() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        let t1 = t0 + Duration::from_millis(60);
        type_str(&mut p, "apple", t1);
        p.tick(t1 + Duration::from_millis(180));
        let seq = p.backend().sent.borrow()[0].seq;

        for _ in 0..5 {
            p.handle_key(PaletteKey::Backspace, t1);
        }
        assert_eq!(p.view(), PaletteView::Hint);
        assert!(!p.is_searching());

        p.backend().respond(
            seq,
            RawResults {
                assets: vec![item("a1", "Apple Inc", Category::Asset)],
                ..RawResults::default()
            },
        );
        p.tick(t1 + Duration::from_millis(400));
        assert_eq!(p.view(), PaletteView::Hint, "late response must not land");
    }

    #[test]
    fn empty_response_shows_no_results_for_query() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        let t1 = t0 + Duration::from_millis(60);
        type_str(&mut p, "zzz", t1);
        p.tick(t1 + Duration::from_millis(180));
        let seq = p.backend().sent.borrow()[0].seq;
        p.backend().respond(seq, RawResults::default());
        p.tick(t1 + Duration::from_millis(190));
        assert_eq!(p.view(), PaletteView::NoResults { query: "zzz" });
    }

    #[test]
    fn data_change_reissues_live_query() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let t0 = Instant::now();
        p.set_open(true, t0, trigger());
        let t1 = t0 + Duration::from_millis(60);
        type_str(&mut p, "bond", t1);
        p.tick(t1 + Duration::from_millis(180));
        p.backend()
            .inbox
            .borrow_mut()
            .push_back(BackendEvent::DataChanged);
        p.tick(t1 + Duration::from_millis(200));
        let sent = p.backend().sent.borrow();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].key, sent[1].key);
        assert!(sent[1].seq > sent[0].seq);
    }

    #[test]
    fn closed_palette_does_not_consume_keys() {
        let reg = ShortcutRegistry::new();
        let mut p = mounted(&reg);
        let out = p.handle_key(PaletteKey::Down, Instant::now());
        assert!(!out.consumed);
    }

    #[test]
    fn global_chord_requests_toggle_and_unmount_releases_it() {
        use crossterm::event::{KeyCode, KeyModifiers};
        let reg = ShortcutRegistry::new();
        let p = mounted(&reg);
        let ctrl_k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::CONTROL);
        assert_eq!(
            p.handle_global_key(&ctrl_k),
            Some(PaletteAction::OpenChange(true))
        );
        assert!(
            PaletteController::mount(
                PaletteOptions::default(),
                None,
                ManualBackend::default(),
                &reg,
                ViewportEvents::new(),
            )
            .is_err()
        );
        p.unmount();
        assert!(reg.is_empty());
    }
}

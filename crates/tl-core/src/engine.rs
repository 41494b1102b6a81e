//! The engine: owns one document's state and exposes every entry point the
//! host calls into.

use serde_json::json;

use crate::actions::{ActionController, MenuItem, Point, TickReport};
use crate::classify::excluded_by_ancestor;
use crate::config::{load_disabled_sites, EngineOptions, Settings, DISABLED_SITES_KEY, ENABLED_KEY};
use crate::dom::{Document, DomError, NodeId};
use crate::host::{Host, HostError, OpenTarget, NEW_WINDOW};
use crate::marker::{count_marked, inject_styles, CONTROL_CLASS, HIGHLIGHT_CLASS};
use crate::notice::Notices;
use crate::protocol::{
    BackgroundRequest, ControlMessage, ControlResponse, KeyEvent, ProcessedResponse,
    StatsResponse, StatusResponse,
};
use crate::rollback::{rollback, RollbackReport};
use crate::scan::code::scan_code;
use crate::scan::{scan, ScanEpoch, ScanReport};
use crate::timer::Timestamp;
use crate::tracker::MutationTracker;

/// Title used for Markdown links when the page has none.
pub const FALLBACK_TITLE: &str = "link";

pub const ENABLED_NOTICE: &str = "Text link buttons enabled";
pub const DISABLED_NOTICE: &str = "Text link buttons disabled";

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Document error: {0}")]
    Dom(#[from] DomError),
    #[error("Host error: {0}")]
    Host(#[from] HostError),
    #[error("Protocol error: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("Engine has not been started")]
    NotStarted,
}

/// Text-link engine for a single document.
///
/// Construction injects the stylesheet; nothing is scanned until `start`
/// has read the persisted settings. Every structural edit the engine makes
/// runs inside [`Engine::quiesced`], so the mutation tracker never sees it.
pub struct Engine<H: Host> {
    doc: Document,
    host: H,
    options: EngineOptions,
    enabled: bool,
    started: bool,
    /// Current host is in the opt-out list: stay dormant
    site_suppressed: bool,
    epoch: ScanEpoch,
    tracker: MutationTracker,
    actions: ActionController,
    notices: Notices,
    subtree_scans: usize,
}

impl<H: Host> Engine<H> {
    pub fn new(mut doc: Document, host: H, options: EngineOptions) -> Result<Self, EngineError> {
        inject_styles(&mut doc)?;
        let observed = doc.body().unwrap_or_else(|| doc.root());

        Ok(Self {
            tracker: MutationTracker::new(observed),
            actions: ActionController::new(options.clone()),
            notices: Notices::new(options.notification_ms, options.notification_exit_ms),
            doc,
            host,
            options,
            enabled: true,
            started: false,
            site_suppressed: false,
            epoch: ScanEpoch::new(),
            subtree_scans: 0,
        })
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Mutable access for page-side edits. Edits made here are observed.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn actions(&self) -> &ActionController {
        &self.actions
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_site_suppressed(&self) -> bool {
        self.site_suppressed
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_active()
    }

    /// Subtree scans started by mutation batches so far.
    pub fn subtree_scans(&self) -> usize {
        self.subtree_scans
    }

    pub fn into_parts(self) -> (Document, H) {
        (self.doc, self.host)
    }

    /// Earliest timer deadline, if any is pending.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        match (self.actions.next_deadline(), self.notices.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Run `f` with observation paused. Observation resumes afterwards only
    /// if this call paused it.
    pub fn quiesced<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        let paused = self.tracker.pause(&mut self.doc);
        let result = f(self);
        if paused {
            self.tracker.resume(&mut self.doc);
        }
        result
    }

    fn ensure_started(&self) -> Result<(), EngineError> {
        if self.started {
            Ok(())
        } else {
            Err(EngineError::NotStarted)
        }
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Read settings and, if enabled, scan the page and start tracking.
    ///
    /// A page whose host is in the opt-out list is left untouched for the
    /// lifetime of this engine.
    pub fn start(&mut self) -> Result<Option<ScanReport>, EngineError> {
        if self.started {
            return Ok(None);
        }
        let settings = Settings::load(&self.host);
        self.started = true;
        self.enabled = settings.text_links_enabled;

        if let Some(host) = self.host.current_host() {
            if settings.is_site_disabled(&host) {
                log::info!("text links disabled for {host}");
                self.site_suppressed = true;
                return Ok(None);
            }
        }

        if !self.enabled {
            return Ok(None);
        }
        let report = self.scan_page();
        self.tracker.start(&mut self.doc);
        Ok(Some(report))
    }

    /// Flip the enabled state, persist it and apply it. Returns the new
    /// state.
    pub fn toggle(&mut self, now: Timestamp) -> Result<bool, EngineError> {
        self.ensure_started()?;
        self.enabled = !self.enabled;
        if let Err(e) = self.host.store_setting(ENABLED_KEY, json!(self.enabled)) {
            log::warn!("failed to persist {ENABLED_KEY}: {e}");
        }

        if self.enabled {
            if !self.site_suppressed {
                self.scan_page();
                self.tracker.start(&mut self.doc);
            }
            self.show_notice(ENABLED_NOTICE, now);
        } else {
            self.tracker.stop(&mut self.doc);
            self.rollback();
            self.show_notice(DISABLED_NOTICE, now);
        }
        log::debug!("text links {}", if self.enabled { "enabled" } else { "disabled" });
        Ok(self.enabled)
    }

    /// Full scan of the page regardless of the enabled state.
    pub fn process_page(&mut self) -> Result<ScanReport, EngineError> {
        self.ensure_started()?;
        if self.site_suppressed {
            return Ok(ScanReport::default());
        }
        Ok(self.scan_page())
    }

    fn scan_page(&mut self) -> ScanReport {
        self.quiesced(|engine| {
            let root = engine.doc.root();
            let body = engine.doc.body().unwrap_or(root);
            let mut report = scan(
                &mut engine.doc,
                body,
                &mut engine.epoch.processed,
                &mut engine.actions,
            );
            report.merge(scan_code(
                &mut engine.doc,
                root,
                &mut engine.epoch.processed,
                &mut engine.epoch.code_blocks,
                &mut engine.actions,
            ));
            report
        })
    }

    /// Deliver one mutation batch: scan every element the page inserted
    /// since the last call.
    pub fn flush_mutations(&mut self) -> ScanReport {
        let batch = self.tracker.take_batch(&mut self.doc);
        if batch.is_empty() {
            return ScanReport::default();
        }

        self.quiesced(|engine| {
            let mut report = ScanReport::default();
            for node in batch {
                if !engine.doc.is_connected(node) || excluded_by_ancestor(&engine.doc, node) {
                    continue;
                }
                engine.subtree_scans += 1;
                report.merge(scan(
                    &mut engine.doc,
                    node,
                    &mut engine.epoch.processed,
                    &mut engine.actions,
                ));
            }
            report
        })
    }

    /// Remove all engine output and restore the original text.
    pub fn rollback(&mut self) -> RollbackReport {
        let keep_tracking = self.enabled && self.tracker.is_active();
        rollback(
            &mut self.doc,
            &mut self.tracker,
            &mut self.actions,
            &mut self.epoch,
            keep_tracking,
        )
    }

    /// Add the current host to the opt-out list, then roll back and stay
    /// dormant. Returns `false` when there is no host or it was already
    /// listed.
    pub fn disable_for_current_host(&mut self, now: Timestamp) -> Result<bool, EngineError> {
        let Some(host) = self.host.current_host() else {
            return Ok(false);
        };
        let mut sites = load_disabled_sites(&self.host);
        if sites.iter().any(|h| h == &host) {
            return Ok(false);
        }
        sites.push(host.clone());
        self.host.store_setting(DISABLED_SITES_KEY, json!(sites))?;

        self.site_suppressed = true;
        self.tracker.stop(&mut self.doc);
        self.rollback();
        self.show_notice(&format!("Link buttons disabled on {host}"), now);
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Messages and keyboard
    // -------------------------------------------------------------------------

    pub fn stats(&self) -> StatsResponse {
        StatsResponse {
            buttons: count_marked(&self.doc, CONTROL_CLASS),
            urls: count_marked(&self.doc, HIGHLIGHT_CLASS),
        }
    }

    pub fn handle_message(
        &mut self,
        message: ControlMessage,
        now: Timestamp,
    ) -> Result<ControlResponse, EngineError> {
        let response = match message {
            ControlMessage::ToggleTextLinks => ControlResponse::Status(StatusResponse {
                enabled: self.toggle(now)?,
            }),
            ControlMessage::GetStatus => ControlResponse::Status(StatusResponse {
                enabled: self.enabled,
            }),
            ControlMessage::GetStats => ControlResponse::Stats(self.stats()),
            ControlMessage::ProcessPage => {
                self.process_page()?;
                ControlResponse::Processed(ProcessedResponse { processed: true })
            }
        };
        Ok(response)
    }

    /// Decode a JSON control message, handle it and encode the reply.
    pub fn handle_message_json(&mut self, text: &str, now: Timestamp) -> Result<String, EngineError> {
        let message = ControlMessage::from_json(text)?;
        let response = self.handle_message(message, now)?;
        Ok(response.to_json()?)
    }

    /// Returns whether the key press was consumed.
    pub fn handle_key(&mut self, event: &KeyEvent, now: Timestamp) -> Result<bool, EngineError> {
        if !event.is_toggle_chord() {
            return Ok(false);
        }
        self.toggle(now)?;
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Control events
    // -------------------------------------------------------------------------

    /// Primary action on a control: open its URL and show feedback.
    pub fn activate_control(&mut self, control: NodeId, now: Timestamp) -> Result<bool, EngineError> {
        let Some(url) = self.actions.url(control).map(str::to_owned) else {
            return Ok(false);
        };
        self.open_url(&url);
        self.quiesced(|engine| engine.actions.begin_feedback(&mut engine.doc, control, now))?;
        Ok(true)
    }

    fn open_url(&mut self, url: &str) {
        let request = BackgroundRequest::OpenUrl { url: url.to_string() };
        match self.host.send_open_request(&request) {
            Ok(ack) if ack.opened => {}
            Ok(ack) => {
                let reason = ack.error.unwrap_or_default();
                log::warn!("background refused to open {url}: {reason}; opening directly");
                self.host.open_direct(url, OpenTarget::NewTab);
            }
            Err(e) => {
                log::warn!("open request failed: {e}; opening directly");
                self.host.open_direct(url, OpenTarget::NewTab);
            }
        }
    }

    /// Secondary action on a control: show the context menu at `at`.
    pub fn open_context_menu(
        &mut self,
        control: NodeId,
        at: Point,
    ) -> Result<Option<NodeId>, EngineError> {
        let menu = self.quiesced(|engine| engine.actions.open_menu(&mut engine.doc, control, at))?;
        Ok(menu)
    }

    /// Click inside the open menu. Runs the chosen item and closes the menu.
    pub fn choose_menu_item(
        &mut self,
        target: NodeId,
        now: Timestamp,
    ) -> Result<Option<MenuItem>, EngineError> {
        let Some((item, control)) = self.actions.menu_hit(&self.doc, target) else {
            return Ok(None);
        };
        let url = self.actions.url(control).map(str::to_owned).unwrap_or_default();
        self.quiesced(|engine| engine.actions.dismiss_menu(&mut engine.doc))?;

        match item {
            MenuItem::OpenTab => {
                self.activate_control(control, now)?;
            }
            MenuItem::OpenWindow => self.host.open_direct(&url, NEW_WINDOW),
            MenuItem::CopyUrl => self.copy(&url),
            MenuItem::CopyMarkdown => {
                let title = self.doc.title().unwrap_or_else(|| FALLBACK_TITLE.to_string());
                self.copy(&format!("[{title}]({url})"));
            }
            MenuItem::DisableSite => {
                self.disable_for_current_host(now)?;
            }
        }
        Ok(Some(item))
    }

    fn copy(&mut self, text: &str) {
        if let Err(e) = self.host.write_clipboard(text) {
            log::warn!("clipboard write failed: {e}");
        }
    }

    /// Pointer press anywhere; closes the menu when outside it.
    pub fn pointer_down(&mut self, target: NodeId) -> Result<bool, EngineError> {
        let closed = self.quiesced(|engine| engine.actions.pointer_down(&mut engine.doc, target))?;
        Ok(closed)
    }

    pub fn pointer_enter(
        &mut self,
        control: NodeId,
        at: Point,
        now: Timestamp,
    ) -> Result<(), EngineError> {
        self.quiesced(|engine| engine.actions.pointer_enter(&mut engine.doc, control, at, now))?;
        Ok(())
    }

    pub fn pointer_leave(&mut self, control: NodeId, now: Timestamp) -> Result<(), EngineError> {
        self.quiesced(|engine| engine.actions.pointer_leave(&mut engine.doc, control, now))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Timers and notices
    // -------------------------------------------------------------------------

    /// Advance every timer to `now`.
    pub fn tick(&mut self, now: Timestamp) -> Result<TickReport, EngineError> {
        let report = self.quiesced(|engine| {
            engine.notices.tick(&mut engine.doc, now);
            engine.actions.tick(&mut engine.doc, now)
        })?;
        Ok(report)
    }

    fn show_notice(&mut self, message: &str, now: Timestamp) {
        let shown = self.quiesced(|engine| engine.notices.show(&mut engine.doc, message, now));
        if let Err(e) = shown {
            log::warn!("failed to show notification: {e}");
        }
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }
}

//! Per-control interaction state: activation feedback, context menu and
//! hover preview.
//!
//! Each control is a small state machine keyed by its node handle. Timers
//! are owned by the state they drive and advanced by `tick`. This module
//! only edits the document; anything that needs the host (opening URLs,
//! clipboard, settings) is returned to the engine as a value.

use std::collections::BTreeMap;

use crate::config::EngineOptions;
use crate::dom::{Document, DomError, NodeId};
use crate::label::LinkKind;
use crate::marker::{
    create_marked, CONTROL_CLASS, MENU_ACTION_ATTR, MENU_CLASS, SHOW_CLASS, STATE_ATTR,
    TOOLTIP_CLASS, URL_ATTR,
};
use crate::timer::{Timer, Timestamp};

/// Label shown while a control is in the activated phase.
pub const ACTIVATED_LABEL: &str = "\u{2713} opened";

/// Viewport position in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// Menu Items
// =============================================================================

/// Fixed context menu entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    OpenTab,
    OpenWindow,
    CopyUrl,
    CopyMarkdown,
    DisableSite,
}

impl MenuItem {
    pub const ALL: [MenuItem; 5] = [
        MenuItem::OpenTab,
        MenuItem::OpenWindow,
        MenuItem::CopyUrl,
        MenuItem::CopyMarkdown,
        MenuItem::DisableSite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenTab => "open-tab",
            Self::OpenWindow => "open-window",
            Self::CopyUrl => "copy-url",
            Self::CopyMarkdown => "copy-markdown",
            Self::DisableSite => "disable-site",
        }
    }

    pub fn from_attr(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|item| item.as_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OpenTab => "Open in new tab",
            Self::OpenWindow => "Open in new window",
            Self::CopyUrl => "Copy link address",
            Self::CopyMarkdown => "Copy Markdown link",
            Self::DisableSite => "Disable on this site",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::OpenTab => "\u{1F517}",
            Self::OpenWindow => "\u{1FA9F}",
            Self::CopyUrl => "\u{1F4CB}",
            Self::CopyMarkdown => "\u{1F4DD}",
            Self::DisableSite => "\u{1F6AB}",
        }
    }
}

// =============================================================================
// Control State
// =============================================================================

/// Visible phase of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPhase {
    Idle,
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hover {
    Idle,
    Pending { at: Point, timer: Timer },
    Shown { tooltip: NodeId },
    Fading { tooltip: NodeId, timer: Timer },
}

#[derive(Debug, Clone)]
struct ControlState {
    url: String,
    kind: LinkKind,
    phase: ControlPhase,
    feedback: Timer,
    hover: Hover,
}

#[derive(Debug, Clone)]
struct OpenMenu {
    node: NodeId,
    control: NodeId,
    items: Vec<(NodeId, MenuItem)>,
}

/// What `tick` changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub feedback_cleared: usize,
    pub tooltips_shown: usize,
    pub tooltips_removed: usize,
}

/// Registry and state machines for every action control in the document.
#[derive(Debug)]
pub struct ActionController {
    controls: BTreeMap<NodeId, ControlState>,
    menu: Option<OpenMenu>,
    options: EngineOptions,
}

impl ActionController {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            controls: BTreeMap::new(),
            menu: None,
            options,
        }
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn controls(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.controls.keys().copied()
    }

    pub fn url(&self, control: NodeId) -> Option<&str> {
        self.controls.get(&control).map(|s| s.url.as_str())
    }

    pub fn kind(&self, control: NodeId) -> Option<LinkKind> {
        self.controls.get(&control).map(|s| s.kind)
    }

    pub fn phase(&self, control: NodeId) -> Option<ControlPhase> {
        self.controls.get(&control).map(|s| s.phase)
    }

    /// Tooltip currently attached to `control`, visible or fading.
    pub fn tooltip(&self, control: NodeId) -> Option<NodeId> {
        match self.controls.get(&control)?.hover {
            Hover::Shown { tooltip } | Hover::Fading { tooltip, .. } => Some(tooltip),
            _ => None,
        }
    }

    /// Open menu and the control it belongs to.
    pub fn menu(&self) -> Option<(NodeId, NodeId)> {
        self.menu.as_ref().map(|m| (m.node, m.control))
    }

    /// Earliest pending deadline, for hosts that schedule `tick` calls.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.controls
            .values()
            .flat_map(|s| {
                let hover = match s.hover {
                    Hover::Pending { timer, .. } | Hover::Fading { timer, .. } => timer.deadline(),
                    _ => None,
                };
                [s.feedback.deadline(), hover]
            })
            .flatten()
            .min()
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    /// Build a detached control for `url` and register it.
    pub fn create_control(&mut self, doc: &mut Document, url: &str) -> Result<NodeId, DomError> {
        let kind = LinkKind::for_url(url);
        let button = create_marked(doc, "button", CONTROL_CLASS)?;
        {
            let el = doc.element_mut(button)?;
            el.set_attr("type", "button");
            el.set_attr("title", format!("Open: {url}"));
            el.set_attr(URL_ATTR, url);
        }
        let label = doc.create_text(kind.label());
        doc.append_child(button, label)?;

        self.controls.insert(
            button,
            ControlState {
                url: url.to_string(),
                kind,
                phase: ControlPhase::Idle,
                feedback: Timer::default(),
                hover: Hover::Idle,
            },
        );
        Ok(button)
    }

    /// Unregister a single control without touching the document.
    pub(crate) fn forget(&mut self, control: NodeId) -> bool {
        self.controls.remove(&control).is_some()
    }

    /// Hand every registered control to the caller and forget them.
    pub fn drain(&mut self) -> Vec<NodeId> {
        let controls = std::mem::take(&mut self.controls);
        controls.into_keys().collect()
    }

    // -------------------------------------------------------------------------
    // Primary action
    // -------------------------------------------------------------------------

    /// Switch `control` to its confirmation label. Returns `false` when it
    /// is already showing feedback; the running feedback is left untouched.
    pub fn begin_feedback(
        &mut self,
        doc: &mut Document,
        control: NodeId,
        now: Timestamp,
    ) -> Result<bool, DomError> {
        let feedback_ms = self.options.feedback_ms;
        let Some(state) = self.controls.get_mut(&control) else {
            return Ok(false);
        };
        if state.phase == ControlPhase::Activated {
            return Ok(false);
        }

        set_control_label(doc, control, ACTIVATED_LABEL)?;
        doc.element_mut(control)?.set_attr(STATE_ATTR, "activated");
        state.phase = ControlPhase::Activated;
        state.feedback.arm(now, feedback_ms);
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Context menu
    // -------------------------------------------------------------------------

    /// Open the context menu for `control` at the pointer. Any menu already
    /// open is dismissed first.
    pub fn open_menu(
        &mut self,
        doc: &mut Document,
        control: NodeId,
        at: Point,
    ) -> Result<Option<NodeId>, DomError> {
        if !self.controls.contains_key(&control) {
            return Ok(None);
        }
        self.dismiss_menu(doc)?;

        let menu = create_marked(doc, "div", MENU_CLASS)?;
        doc.element_mut(menu)?
            .set_attr("style", format!("top: {}px; left: {}px;", at.y, at.x));

        let mut items = Vec::with_capacity(MenuItem::ALL.len());
        for item in MenuItem::ALL {
            let row = doc.create_element("div");
            doc.element_mut(row)?.set_attr(MENU_ACTION_ATTR, item.as_str());
            for part in [item.icon(), item.label()] {
                let span = doc.create_element("span");
                let text = doc.create_text(part);
                doc.append_child(span, text)?;
                doc.append_child(row, span)?;
            }
            doc.append_child(menu, row)?;
            items.push((row, item));
        }

        let parent = doc.body().unwrap_or_else(|| doc.root());
        doc.append_child(parent, menu)?;
        self.menu = Some(OpenMenu {
            node: menu,
            control,
            items,
        });
        Ok(Some(menu))
    }

    /// Resolve a click target inside the open menu to its item and control.
    pub fn menu_hit(&self, doc: &Document, target: NodeId) -> Option<(MenuItem, NodeId)> {
        let menu = self.menu.as_ref()?;
        menu.items
            .iter()
            .find(|(row, _)| doc.contains(*row, target))
            .map(|&(_, item)| (item, menu.control))
    }

    /// Remove the open menu, if any.
    pub fn dismiss_menu(&mut self, doc: &mut Document) -> Result<bool, DomError> {
        let Some(menu) = self.menu.take() else {
            return Ok(false);
        };
        remove_and_release(doc, menu.node)?;
        Ok(true)
    }

    /// Pointer press anywhere in the page: an outside click closes the menu.
    pub fn pointer_down(&mut self, doc: &mut Document, target: NodeId) -> Result<bool, DomError> {
        let outside = self
            .menu
            .as_ref()
            .is_some_and(|menu| !doc.contains(menu.node, target));
        if outside {
            self.dismiss_menu(doc)
        } else {
            Ok(false)
        }
    }

    // -------------------------------------------------------------------------
    // Hover preview
    // -------------------------------------------------------------------------

    /// Pointer entered `control`, whose box starts at `at`.
    pub fn pointer_enter(
        &mut self,
        doc: &mut Document,
        control: NodeId,
        at: Point,
        now: Timestamp,
    ) -> Result<(), DomError> {
        let delay = self.options.hover_delay_ms;
        let Some(state) = self.controls.get_mut(&control) else {
            return Ok(());
        };
        state.hover = match state.hover {
            Hover::Idle => Hover::Pending {
                at,
                timer: Timer::armed(now, delay),
            },
            Hover::Fading { tooltip, .. } => {
                doc.element_mut(tooltip)?.add_class(SHOW_CLASS);
                Hover::Shown { tooltip }
            }
            other => other,
        };
        Ok(())
    }

    /// Pointer left `control`: cancel a pending preview or start fading.
    pub fn pointer_leave(
        &mut self,
        doc: &mut Document,
        control: NodeId,
        now: Timestamp,
    ) -> Result<(), DomError> {
        let fade = self.options.tooltip_fade_ms;
        let Some(state) = self.controls.get_mut(&control) else {
            return Ok(());
        };
        state.hover = match state.hover {
            Hover::Pending { .. } => Hover::Idle,
            Hover::Shown { tooltip } => {
                doc.element_mut(tooltip)?.remove_class(SHOW_CLASS);
                Hover::Fading {
                    tooltip,
                    timer: Timer::armed(now, fade),
                }
            }
            other => other,
        };
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Advance every control's timers to `now`.
    pub fn tick(&mut self, doc: &mut Document, now: Timestamp) -> Result<TickReport, DomError> {
        let mut report = TickReport::default();
        let offset = self.options.tooltip_offset_px;

        for (&control, state) in self.controls.iter_mut() {
            if state.feedback.fire(now) {
                state.phase = ControlPhase::Idle;
                if doc.is_alive(control) {
                    set_control_label(doc, control, state.kind.label())?;
                    doc.element_mut(control)?.remove_attr(STATE_ATTR);
                }
                report.feedback_cleared += 1;
            }

            state.hover = match state.hover {
                Hover::Pending { at, timer } if timer.is_due(now) => {
                    let tooltip = create_tooltip(doc, &state.url, at, offset)?;
                    report.tooltips_shown += 1;
                    Hover::Shown { tooltip }
                }
                Hover::Fading { tooltip, timer } if timer.is_due(now) => {
                    remove_and_release(doc, tooltip)?;
                    report.tooltips_removed += 1;
                    Hover::Idle
                }
                other => other,
            };
        }
        Ok(report)
    }

    /// Close the menu and every preview immediately.
    pub fn dismiss_all(&mut self, doc: &mut Document) -> Result<(), DomError> {
        self.dismiss_menu(doc)?;
        for state in self.controls.values_mut() {
            if let Hover::Shown { tooltip } | Hover::Fading { tooltip, .. } = state.hover {
                remove_and_release(doc, tooltip)?;
            }
            state.hover = Hover::Idle;
        }
        Ok(())
    }
}

fn set_control_label(doc: &mut Document, control: NodeId, label: &str) -> Result<(), DomError> {
    let text = doc.children(control).find(|&c| doc.is_text(c));
    match text {
        Some(text) => doc.set_text(text, label),
        None => {
            let text = doc.create_text(label);
            doc.append_child(control, text)
        }
    }
}

fn create_tooltip(doc: &mut Document, url: &str, at: Point, offset: i32) -> Result<NodeId, DomError> {
    let tooltip = create_marked(doc, "div", TOOLTIP_CLASS)?;
    {
        let el = doc.element_mut(tooltip)?;
        el.set_attr(
            "style",
            format!("position: fixed; top: {}px; left: {}px;", at.y - offset, at.x),
        );
        el.add_class(SHOW_CLASS);
    }
    let text = doc.create_text(url);
    doc.append_child(tooltip, text)?;
    let parent = doc.body().unwrap_or_else(|| doc.root());
    doc.append_child(parent, tooltip)?;
    Ok(tooltip)
}

/// Detach (if attached) and free an engine-authored node. Already released
/// nodes are ignored.
pub(crate) fn remove_and_release(doc: &mut Document, node: NodeId) -> Result<(), DomError> {
    if !doc.is_alive(node) {
        return Ok(());
    }
    if doc.parent(node).is_some() {
        doc.remove(node)?;
    }
    doc.release(node)
}

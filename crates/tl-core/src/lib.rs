//! TextLinks Core Library
//!
//! This crate finds bare URLs in a document's free text and wraps each one
//! in a highlight span followed by an action control. It keeps working as
//! the page mutates and can restore the original text exactly.
//!
//! # Architecture
//!
//! The document is an arena of generational node handles with a
//! MutationObserver-style record queue. An [`Engine`] owns one document and
//! all engine state; hosts drive it with settings, control messages, pointer
//! events and timestamps. The core never reads a clock and never touches
//! the platform directly: everything outside the document goes through the
//! [`Host`] trait.
//!
//! # Modules
//!
//! - `dom`: Arena document, selectors and mutation observation
//! - `matcher`: URL pattern and match spans
//! - `classify`: What the scanner does with each node
//! - `rewrite`: Text node split into highlight and control fragments
//! - `scan`: Document-order walk and the code container pass
//! - `tracker`: Mutation batches fed back to the scanner
//! - `rollback`: Undo of every rewrite
//! - `actions`: Per-control activation, menu and hover state
//! - `engine`: The owning engine and its entry points
//! - `host`, `protocol`, `config`: Boundary traits, wire types and settings

pub mod actions;
pub mod classify;
pub mod config;
pub mod dom;
pub mod engine;
pub mod host;
pub mod label;
pub mod marker;
pub mod matcher;
pub mod notice;
pub mod processed;
pub mod protocol;
pub mod rewrite;
pub mod rollback;
pub mod scan;
pub mod timer;
pub mod tracker;

// Re-export commonly used types
pub use actions::{ActionController, ControlPhase, MenuItem, Point};
pub use classify::{classify, Classification};
pub use config::{EngineOptions, Settings};
pub use dom::{Document, DomError, NodeId};
pub use engine::{Engine, EngineError};
pub use host::{Host, HostError, MemoryHost, OpenTarget};
pub use label::{label_for, LinkKind};
pub use matcher::{find, MatchSpan};
pub use processed::ProcessedSet;
pub use protocol::{ControlMessage, ControlResponse, KeyEvent};
pub use rollback::RollbackReport;
pub use scan::ScanReport;
pub use timer::Timestamp;

//! NeuroCrypt Session - timed behavioral capture for enrollment and verification
//!
//! A session opens a fixed capture window, collects keystroke and pointer
//! timing while it is open, and then hands the sample off exactly once to a
//! remote scorer: collector → timer → handshake → verdict.
//!
//! ## Modules
//!
//! - **Session core**: [`controller`], [`collector`], [`timer`], [`handshake`]
//! - **Scoring service**: [`client`] (trait seam plus the HTTP implementation)
//! - **Collaborators**: [`navigation`] and [`dashboard`] consume session results

pub mod client;
pub mod collector;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod error;
pub mod features;
pub mod handshake;
pub mod navigation;
pub mod timer;
pub mod types;

pub use client::{HttpScoringClient, ScoringService};
pub use collector::SignalCollector;
pub use config::SessionConfig;
pub use controller::{SessionController, SessionReport};
pub use error::SessionError;
pub use features::SampleSummary;
pub use handshake::HandshakeOrchestrator;
pub use timer::{SessionTimer, TimerTick};
pub use types::{
    AuthOutcome, InjectMode, InputEvent, MessageLevel, Mode, OutcomeKind, Profile, Sample,
    SessionSignal, SessionState, StatusMessage,
};

/// Crate version, reported by the CLI
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

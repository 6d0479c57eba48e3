//! # Companion Module
//!
//! The simulated "Khushi" companion: everything that decides what the
//! companion says, hears or reports.
//!
//! ## Key Components:
//! - **Responder**: keyword-matched replies with an emotion tag
//! - **Transcription**: mock speech-to-text for uploaded clips
//! - **Greeting**: random opening line
//! - **Vitals**: randomized mock biometric readings
//! - **Random**: the injectable random source behind all of the above
//!
//! All functions here are pure apart from reading the clock and the random
//! source; none of them touch the network or the filesystem.

pub mod greeting;     // Random greeting selection
pub mod random;       // Injectable random source
pub mod responder;    // Keyword-to-reply mapping
pub mod transcription; // Simulated speech-to-text
pub mod vitals;       // Mock health metrics

pub use greeting::{pick_greeting, Greeting};
pub use random::RandomSource;
pub use responder::{generate, AiResponse};
pub use transcription::simulate;
pub use vitals::HealthMetrics;

use chrono::{SecondsFormat, Utc};

/// Current UTC time as RFC 3339 with milliseconds, e.g. `2025-01-01T12:00:00.000Z`.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

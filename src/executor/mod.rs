//! Probe execution engine
//!
//! - [`RoundTripProbe`]: one bidirectional deliverability check
//! - [`SpamScoreProbe`]: one spam score sample
//! - [`Scheduler`]: the repeating loop driving both

pub mod roundtrip;
pub mod scheduler;
pub mod spam_score;

pub use roundtrip::{CycleReport, DirectionReport, RoundTripProbe};
pub use scheduler::{RateLimiter, Scheduler, TickReport};
pub use spam_score::{ReportParser, SpamScoreProbe, MAX_SPAM_SCORE};

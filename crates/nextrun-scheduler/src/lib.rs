//! `nextrun-scheduler` — next-occurrence resolution for recurring and one-shot
//! schedules.
//!
//! # Overview
//!
//! A schedule is either a set of relative offsets ([`Offsets`], built with
//! [`Interval`]) or a set of absolute calendar fields ([`FieldSet`], built
//! with [`Timer`]) where any field may be left open. Both resolve against a
//! single reading of an injected [`Clock`] into an [`Occurrence`]: the
//! instant plus how long to wait for it.
//!
//! | Resolver              | Fails with                                  |
//! |-----------------------|---------------------------------------------|
//! | [`resolve_relative`]  | `PastTime`, `OutOfRange`                    |
//! | [`resolve_absolute`]  | `InvalidField`, `UnresolvableSchedule`      |
//!
//! [`Ticker`] is the optional async loop that sleeps until each occurrence
//! and forwards it on a channel, stopping on a `watch` shutdown signal.

pub mod absolute;
pub mod builder;
pub mod calendar;
pub mod clock;
pub mod error;
pub mod field;
pub mod occurrence;
pub mod relative;
pub mod ticker;

pub use absolute::{resolve_absolute, resolve_absolute_with, MAX_ATTEMPTS};
pub use builder::{Interval, Timer};
pub use calendar::days_in_month;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Result, SchedulerError};
pub use field::{Field, FieldKind, FieldSet, Offsets};
pub use occurrence::{Occurrence, Resolve, Scheduled};
pub use relative::resolve_relative;
pub use ticker::Ticker;

//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

//! A ledger of misbehaving coinjoin inputs.
//!
//! Offenses are appended to a [`Prison`] and never removed. From them the prison derives, on
//! demand, the [`TimeFrame`] during which each input is banned from registering:
//!
//! - failing verification, cheating and backend protection carry fixed bans;
//! - round disruptions are banned in inverse proportion to the input's value, escalating with
//!   every repeat offense;
//! - inputs spending from banned outputs inherit half their ancestors' ban.
//!
//! Windows shorter than [`PrisonConfig::minimum_time_in_prison`] are not enforced. Registration
//! failures of the credential protocol map to offenses through [`Offense::from_credential_error`].

mod config;
mod errors;
mod offender_log;
mod offense;
mod prison;
mod time;

pub use config::PrisonConfig;
pub use errors::PrisonError;
pub use offender_log::OffenderLog;
pub use offense::{
    Offender, Offense, OutPoint, ParseOffenderError, RoundDisruptionMethod, RoundId, Txid,
};
pub use prison::{KnownTransactions, Prison};
pub use time::{TimeFrame, Timestamp};

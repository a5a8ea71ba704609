//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::PrisonError;
use crate::offense::RoundDisruptionMethod;

const MINUTE: Duration = Duration::from_secs(60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Punishment policy.
///
/// Missing fields deserialize to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrisonConfig {
    /// How many satoshis one hour of ban is worth for a round disruption.
    ///
    /// A disrupting input of exactly this value is banned for one hour, scaled by the penalty
    /// factor and the repetition factor.
    pub severity_sats_per_hour: u64,
    pub min_time_for_failed_to_verify: Duration,
    pub min_time_for_cheating: Duration,
    /// Ban windows shorter than this are not enforced at all.
    pub minimum_time_in_prison: Duration,
    pub backend_stability_safety_time: Duration,
    pub did_not_confirm_penalty_factor: f64,
    pub did_not_sign_penalty_factor: f64,
    pub double_spent_penalty_factor: f64,
    pub did_not_signal_ready_to_sign_penalty_factor: f64,
}

impl Default for PrisonConfig {
    fn default() -> Self {
        Self {
            severity_sats_per_hour: 10_000_000,
            min_time_for_failed_to_verify: 31 * DAY,
            min_time_for_cheating: DAY,
            minimum_time_in_prison: 20 * MINUTE,
            backend_stability_safety_time: 20 * MINUTE,
            did_not_confirm_penalty_factor: 0.2,
            did_not_sign_penalty_factor: 1.0,
            double_spent_penalty_factor: 3.0,
            did_not_signal_ready_to_sign_penalty_factor: 1.0,
        }
    }
}

impl PrisonConfig {
    pub fn penalty_factor(&self, method: RoundDisruptionMethod) -> f64 {
        match method {
            RoundDisruptionMethod::DidNotConfirm => self.did_not_confirm_penalty_factor,
            RoundDisruptionMethod::DidNotSign => self.did_not_sign_penalty_factor,
            RoundDisruptionMethod::DoubleSpent => self.double_spent_penalty_factor,
            RoundDisruptionMethod::DidNotSignalReadyToSign => {
                self.did_not_signal_ready_to_sign_penalty_factor
            }
        }
    }

    /// Penalty factors must be finite and non-negative.
    pub fn validate(&self) -> Result<(), PrisonError> {
        let factors = [
            self.did_not_confirm_penalty_factor,
            self.did_not_sign_penalty_factor,
            self.double_spent_penalty_factor,
            self.did_not_signal_ready_to_sign_penalty_factor,
        ];
        if factors.iter().any(|f| !f.is_finite() || *f < 0.0) {
            return Err(PrisonError::InvalidConfig(
                "penalty factors must be finite and non-negative",
            ));
        }
        Ok(())
    }
}

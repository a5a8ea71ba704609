//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use serde::{Deserialize, Serialize};

/// Largest supported range proof width; amounts are `u64`.
pub const MAX_RANGE_PROOF_WIDTH: u32 = 64;

/// Parameters fixed for one instance of the registration protocol.
///
/// Client and issuer must agree on all of them. A value of this type is always valid; both
/// [`CredentialConfig::new`] and deserialization check the invariants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCredentialConfig", into = "RawCredentialConfig")]
pub struct CredentialConfig {
    number_of_credentials: usize,
    range_proof_width: u32,
    max_amount: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub enum ConfigError {
    /// number of credentials must be at least 1, got {0}
    NumberOfCredentials(usize),
    /// range proof width must be in 1..=64, got {0}
    RangeProofWidth(u32),
    /// maximum amount {max_amount} does not fit in {range_proof_width} bits
    MaxAmountTooLarge { max_amount: u64, range_proof_width: u32 },
}

impl CredentialConfig {
    pub const DEFAULT_NUMBER_OF_CREDENTIALS: usize = 2;
    pub const DEFAULT_RANGE_PROOF_WIDTH: u32 = 51;
    /// Just over the total supply of bitcoin, in satoshis.
    pub const DEFAULT_MAX_AMOUNT: u64 = 4_300_000_000_000;

    pub fn new(
        number_of_credentials: usize,
        range_proof_width: u32,
        max_amount: u64,
    ) -> Result<Self, ConfigError> {
        if number_of_credentials == 0 {
            return Err(ConfigError::NumberOfCredentials(number_of_credentials));
        }
        if !(1..=MAX_RANGE_PROOF_WIDTH).contains(&range_proof_width) {
            return Err(ConfigError::RangeProofWidth(range_proof_width));
        }
        if range_proof_width < 64 && max_amount >> range_proof_width != 0 {
            return Err(ConfigError::MaxAmountTooLarge {
                max_amount,
                range_proof_width,
            });
        }
        Ok(Self {
            number_of_credentials,
            range_proof_width,
            max_amount,
        })
    }

    pub fn number_of_credentials(&self) -> usize {
        self.number_of_credentials
    }

    pub fn range_proof_width(&self) -> u32 {
        self.range_proof_width
    }

    pub fn max_amount(&self) -> u64 {
        self.max_amount
    }

    /// Whether `amount` may be requested or declared as a delta magnitude.
    pub fn is_amount_in_range(&self, amount: u64) -> bool {
        amount <= self.max_amount
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            number_of_credentials: Self::DEFAULT_NUMBER_OF_CREDENTIALS,
            range_proof_width: Self::DEFAULT_RANGE_PROOF_WIDTH,
            max_amount: Self::DEFAULT_MAX_AMOUNT,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default)]
struct RawCredentialConfig {
    number_of_credentials: usize,
    range_proof_width: u32,
    max_amount: u64,
}

impl Default for RawCredentialConfig {
    fn default() -> Self {
        CredentialConfig::default().into()
    }
}

impl From<CredentialConfig> for RawCredentialConfig {
    fn from(config: CredentialConfig) -> Self {
        Self {
            number_of_credentials: config.number_of_credentials,
            range_proof_width: config.range_proof_width,
            max_amount: config.max_amount,
        }
    }
}

impl TryFrom<RawCredentialConfig> for CredentialConfig {
    type Error = ConfigError;

    fn try_from(raw: RawCredentialConfig) -> Result<Self, Self::Error> {
        Self::new(
            raw.number_of_credentials,
            raw.range_proof_width,
            raw.max_amount,
        )
    }
}

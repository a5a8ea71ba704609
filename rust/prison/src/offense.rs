//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::fmt;
use std::str::FromStr;

use wabisabi_credentials::CredentialError;

use crate::time::Timestamp;

macro_rules! hex_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; 32]);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({self})", stringify!($name))
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let mut bytes = [0u8; 32];
                hex::decode_to_slice(s, &mut bytes)?;
                Ok(Self(bytes))
            }
        }
    };
}

hex_id!(
    /// A transaction id.
    Txid
);
hex_id!(
    /// Identifies one coinjoin round.
    RoundId
);

/// A reference to a transaction output, written as `txid-index`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPoint {
    pub txid: Txid,
    pub index: u32,
}

impl OutPoint {
    pub fn new(txid: Txid, index: u32) -> Self {
        Self { txid, index }
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.txid, self.index)
    }
}

impl FromStr for OutPoint {
    type Err = ParseOffenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (txid, index) = s
            .split_once('-')
            .ok_or_else(|| ParseOffenderError::InvalidOutPoint(s.to_owned()))?;
        let txid = txid
            .parse()
            .map_err(|_| ParseOffenderError::InvalidOutPoint(s.to_owned()))?;
        let index = index
            .parse()
            .map_err(|_| ParseOffenderError::InvalidOutPoint(s.to_owned()))?;
        Ok(Self { txid, index })
    }
}

/// How a participant disrupted a round after registering an input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RoundDisruptionMethod {
    DidNotConfirm,
    DidNotSign,
    DoubleSpent,
    DidNotSignalReadyToSign,
}

impl RoundDisruptionMethod {
    fn name(&self) -> &'static str {
        match self {
            Self::DidNotConfirm => "DidNotConfirm",
            Self::DidNotSign => "DidNotSign",
            Self::DoubleSpent => "DoubleSpent",
            Self::DidNotSignalReadyToSign => "DidNotSignalReadyToSign",
        }
    }
}

impl FromStr for RoundDisruptionMethod {
    type Err = ParseOffenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::DidNotConfirm,
            Self::DidNotSign,
            Self::DoubleSpent,
            Self::DidNotSignalReadyToSign,
        ]
        .into_iter()
        .find(|method| method.name() == s)
        .ok_or_else(|| ParseOffenderError::UnknownDisruptionMethod(s.to_owned()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Offense {
    RoundDisruption {
        round_id: RoundId,
        /// Value of the offending input, in satoshis.
        value: u64,
        method: RoundDisruptionMethod,
    },
    /// The coordinator could not verify a request made with this input.
    FailedToVerify { round_id: RoundId },
    /// The input was used to cheat, e.g. by presenting a credential twice.
    Cheating { round_id: RoundId },
    /// Banned to protect the coordinator's backend, not for anything the input did.
    BackendStabilitySafety { round_id: RoundId },
    /// The input spends outputs of banned transactions.
    Inherited { ancestors: Vec<OutPoint> },
}

impl Offense {
    /// Maps a rejected registration to the offense it proves, if any.
    ///
    /// Only failures detected by the coordinator implicate the sender; client-side errors never
    /// do, and neither does a range that is merely out of bounds.
    pub fn from_credential_error(round_id: RoundId, error: &CredentialError) -> Option<Self> {
        match error {
            CredentialError::CoordinatorReceivedInvalidProofs
            | CredentialError::InvalidBitCommitment
            | CredentialError::InvalidNumberOfPresentedCredentials
            | CredentialError::InvalidNumberOfRequestedCredentials => {
                Some(Self::FailedToVerify { round_id })
            }
            CredentialError::SerialNumberAlreadyUsed | CredentialError::NegativeBalance => {
                Some(Self::Cheating { round_id })
            }
            CredentialError::AmountOutOfRange
            | CredentialError::ProofCreationFailed
            | CredentialError::ClientReceivedInvalidProofs
            | CredentialError::IssuedCredentialNumberMismatch
            | CredentialError::NotEnoughZeroCredentialsToFillRequest
            | CredentialError::UnknownCredential
            | CredentialError::NoPendingRequest => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::RoundDisruption { .. } => "RoundDisruption",
            Self::FailedToVerify { .. } => "FailedToVerify",
            Self::Cheating { .. } => "Cheating",
            Self::BackendStabilitySafety { .. } => "BackendStabilitySafety",
            Self::Inherited { .. } => "Inherited",
        }
    }
}

/// One recorded offense by one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offender {
    pub outpoint: OutPoint,
    pub started: Timestamp,
    pub offense: Offense,
}

impl Offender {
    pub fn new(outpoint: OutPoint, started: Timestamp, offense: Offense) -> Self {
        Self {
            outpoint,
            started,
            offense,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, displaydoc::Display)]
pub enum ParseOffenderError {
    /// expected at least {expected} fields, found {found}
    MissingFields { expected: usize, found: usize },
    /// unexpected trailing fields
    TrailingFields,
    /// invalid timestamp '{0}'
    InvalidTimestamp(String),
    /// invalid outpoint '{0}'
    InvalidOutPoint(String),
    /// invalid round id '{0}'
    InvalidRoundId(String),
    /// invalid value '{0}'
    InvalidValue(String),
    /// unknown offense '{0}'
    UnknownOffense(String),
    /// unknown round disruption method '{0}'
    UnknownDisruptionMethod(String),
}

/// One line of the offender log:
/// `unix_seconds,outpoint,kind[,kind-specific fields...]`.
impl fmt::Display for Offender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{}",
            self.started.epoch_seconds(),
            self.outpoint,
            self.offense.kind()
        )?;
        match &self.offense {
            Offense::RoundDisruption {
                round_id,
                value,
                method,
            } => write!(f, ",{round_id},{value},{}", method.name()),
            Offense::FailedToVerify { round_id }
            | Offense::Cheating { round_id }
            | Offense::BackendStabilitySafety { round_id } => write!(f, ",{round_id}"),
            Offense::Inherited { ancestors } => {
                for ancestor in ancestors {
                    write!(f, ",{ancestor}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for Offender {
    type Err = ParseOffenderError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        let expect_fields = |expected: usize| {
            if fields.len() < expected {
                Err(ParseOffenderError::MissingFields {
                    expected,
                    found: fields.len(),
                })
            } else if fields.len() > expected {
                Err(ParseOffenderError::TrailingFields)
            } else {
                Ok(())
            }
        };
        let round_id = |field: &str| {
            RoundId::from_str(field).map_err(|_| ParseOffenderError::InvalidRoundId(field.to_owned()))
        };

        if fields.len() < 3 {
            return Err(ParseOffenderError::MissingFields {
                expected: 3,
                found: fields.len(),
            });
        }
        let started = fields[0]
            .parse()
            .map(Timestamp::from_epoch_seconds)
            .map_err(|_| ParseOffenderError::InvalidTimestamp(fields[0].to_owned()))?;
        let outpoint = fields[1].parse()?;

        let offense = match fields[2] {
            "RoundDisruption" => {
                expect_fields(6)?;
                Offense::RoundDisruption {
                    round_id: round_id(fields[3])?,
                    value: fields[4]
                        .parse()
                        .map_err(|_| ParseOffenderError::InvalidValue(fields[4].to_owned()))?,
                    method: fields[5].parse()?,
                }
            }
            "FailedToVerify" => {
                expect_fields(4)?;
                Offense::FailedToVerify {
                    round_id: round_id(fields[3])?,
                }
            }
            "Cheating" => {
                expect_fields(4)?;
                Offense::Cheating {
                    round_id: round_id(fields[3])?,
                }
            }
            "BackendStabilitySafety" => {
                expect_fields(4)?;
                Offense::BackendStabilitySafety {
                    round_id: round_id(fields[3])?,
                }
            }
            "Inherited" => Offense::Inherited {
                ancestors: fields[3..]
                    .iter()
                    .map(|field| field.parse())
                    .collect::<Result<_, _>>()?,
            },
            other => return Err(ParseOffenderError::UnknownOffense(other.to_owned())),
        };

        Ok(Self {
            outpoint,
            started,
            offense,
        })
    }
}

//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use crate::offense::ParseOffenderError;

#[derive(Debug, thiserror::Error, displaydoc::Display)]
pub enum PrisonError {
    /// offender log I/O failed: {0}
    Io(#[from] std::io::Error),
    /// corrupt offender record on line {line}: {reason}
    CorruptRecord {
        line: usize,
        #[source]
        reason: ParseOffenderError,
    },
    /// invalid prison configuration: {0}
    InvalidConfig(&'static str),
}

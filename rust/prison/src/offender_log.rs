//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::errors::PrisonError;
use crate::offense::Offender;

/// An append-only file of offenders, one [`Offender`] line per record.
pub struct OffenderLog {
    path: PathBuf,
    file: File,
}

impl OffenderLog {
    /// Opens (creating if needed) the log at `path` and returns every record already in it.
    ///
    /// Blank lines are skipped. The first line that does not parse fails the whole load.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, Vec<Offender>), PrisonError> {
        let path = path.as_ref().to_owned();
        let offenders = match File::open(&path) {
            Ok(file) => read_offenders(BufReader::new(file))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => vec![],
            Err(e) => return Err(e.into()),
        };
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::info!(
            "loaded {} offenders from {}",
            offenders.len(),
            path.display()
        );
        Ok((Self { path, file }, offenders))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, offender: &Offender) -> Result<(), PrisonError> {
        writeln!(self.file, "{offender}")?;
        self.file.flush()?;
        Ok(())
    }
}

fn read_offenders(reader: impl BufRead) -> Result<Vec<Offender>, PrisonError> {
    let mut offenders = vec![];
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let offender = line.parse().map_err(|reason| PrisonError::CorruptRecord {
            line: index + 1,
            reason,
        })?;
        offenders.push(offender);
    }
    Ok(offenders)
}

//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasher;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use crate::config::PrisonConfig;
use crate::errors::PrisonError;
use crate::offender_log::OffenderLog;
use crate::offense::{Offender, Offense, OutPoint, Txid};
use crate::time::{TimeFrame, Timestamp};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Tells whether a transaction is already known to the coordinator, e.g. because it has been
/// broadcast or confirmed.
///
/// Repeated disruptions by an input of a known transaction escalate linearly; otherwise they
/// escalate exponentially.
pub trait KnownTransactions {
    fn contains(&self, txid: &Txid) -> bool;
}

impl<S: BuildHasher> KnownTransactions for HashSet<Txid, S> {
    fn contains(&self, txid: &Txid) -> bool {
        HashSet::contains(self, txid)
    }
}

impl<T: KnownTransactions + ?Sized> KnownTransactions for RwLock<T> {
    fn contains(&self, txid: &Txid) -> bool {
        self.read().expect("not poisoned").contains(txid)
    }
}

impl<T: KnownTransactions + ?Sized> KnownTransactions for Arc<T> {
    fn contains(&self, txid: &Txid) -> bool {
        (**self).contains(txid)
    }
}

#[derive(Default)]
struct PrisonState {
    offenders: Vec<Offender>,
    by_outpoint: HashMap<OutPoint, Vec<usize>>,
    ban_windows: HashMap<OutPoint, TimeFrame>,
    log: Option<OffenderLog>,
}

impl PrisonState {
    fn insert(&mut self, offender: Offender) {
        self.by_outpoint
            .entry(offender.outpoint)
            .or_default()
            .push(self.offenders.len());
        self.offenders.push(offender);
        // Inherited windows depend on other outpoints' records.
        self.ban_windows.clear();
    }
}

/// The ledger of offenders and the ban windows derived from it.
///
/// All state sits behind one lock, so a query sees either all or none of a concurrent
/// [`punish`](Prison::punish).
pub struct Prison<K> {
    config: PrisonConfig,
    known_transactions: K,
    state: Mutex<PrisonState>,
}

impl<K: KnownTransactions> Prison<K> {
    /// An in-memory prison.
    pub fn new(config: PrisonConfig, known_transactions: K) -> Result<Self, PrisonError> {
        config.validate()?;
        Ok(Self {
            config,
            known_transactions,
            state: Mutex::default(),
        })
    }

    /// A prison backed by the offender log at `path`, starting from the records already in it.
    pub fn with_log(
        config: PrisonConfig,
        known_transactions: K,
        path: impl AsRef<Path>,
    ) -> Result<Self, PrisonError> {
        let prison = Self::new(config, known_transactions)?;
        let (log, offenders) = OffenderLog::open(path)?;
        {
            let mut state = prison.lock_state();
            for offender in offenders {
                state.insert(offender);
            }
            state.log = Some(log);
        }
        Ok(prison)
    }

    pub fn config(&self) -> &PrisonConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, PrisonState> {
        self.state.lock().expect("not poisoned")
    }

    /// Records an offense.
    ///
    /// With a log attached, the record is persisted first; if that fails, nothing is recorded.
    pub fn punish(&self, offender: Offender) -> Result<(), PrisonError> {
        let mut state = self.lock_state();
        if let Some(offender_log) = &mut state.log {
            offender_log.append(&offender)?;
        }
        log::info!(
            "punished {} at {}: {:?}",
            offender.outpoint,
            offender.started.epoch_seconds(),
            offender.offense
        );
        state.insert(offender);
        Ok(())
    }

    /// Every recorded offender, in the order they were punished.
    pub fn offenders(&self) -> Vec<Offender> {
        self.lock_state().offenders.clone()
    }

    /// The window during which `outpoint` is banned, or [`TimeFrame::ZERO`] if it never is.
    pub fn ban_time_frame(&self, outpoint: &OutPoint) -> TimeFrame {
        let mut state = self.lock_state();
        self.ban_time_frame_locked(&mut state, outpoint, &mut HashSet::new(), &mut false)
    }

    pub fn is_banned(&self, outpoint: &OutPoint, now: Timestamp) -> bool {
        self.ban_time_frame(outpoint).includes(now)
    }

    /// When the ban on `outpoint` ends, if it is banned at `now`.
    pub fn banned_until(&self, outpoint: &OutPoint, now: Timestamp) -> Option<Timestamp> {
        let frame = self.ban_time_frame(outpoint);
        frame.includes(now).then(|| frame.end())
    }

    /// The number of distinct outpoints banned at `now`.
    pub fn count_banned(&self, now: Timestamp) -> usize {
        let mut state = self.lock_state();
        let outpoints: Vec<OutPoint> = state.by_outpoint.keys().copied().collect();
        outpoints
            .iter()
            .filter(|outpoint| {
                self.ban_time_frame_locked(&mut state, outpoint, &mut HashSet::new(), &mut false)
                    .includes(now)
            })
            .count()
    }

    fn ban_time_frame_locked(
        &self,
        state: &mut PrisonState,
        outpoint: &OutPoint,
        visiting: &mut HashSet<OutPoint>,
        truncated: &mut bool,
    ) -> TimeFrame {
        if let Some(frame) = state.ban_windows.get(outpoint) {
            return *frame;
        }
        // A transaction cannot be its own ancestor; only a forged log can get here. Windows
        // computed past such a cycle depend on where the walk started, so none of them are cached.
        if !visiting.insert(*outpoint) {
            *truncated = true;
            return TimeFrame::ZERO;
        }

        let indices = state.by_outpoint.get(outpoint).cloned().unwrap_or_default();
        let mut disruptions = 0u32;
        let mut window = TimeFrame::ZERO;
        for index in indices {
            let offender = state.offenders[index].clone();
            let frame = match &offender.offense {
                Offense::RoundDisruption { value, method, .. } => {
                    disruptions = disruptions.saturating_add(1);
                    let hours = self.config.severity_sats_per_hour as f64 / (*value).max(1) as f64
                        * self.config.penalty_factor(*method)
                        * self.repetition_factor(&offender.outpoint.txid, disruptions);
                    TimeFrame::new(offender.started, duration_from_hours(hours))
                }
                Offense::FailedToVerify { .. } => TimeFrame::new(
                    offender.started,
                    self.config.min_time_for_failed_to_verify,
                ),
                Offense::Cheating { .. } => {
                    TimeFrame::new(offender.started, self.config.min_time_for_cheating)
                }
                Offense::BackendStabilitySafety { .. } => TimeFrame::new(
                    offender.started,
                    self.config.backend_stability_safety_time,
                ),
                Offense::Inherited { ancestors } => {
                    let ancestor_window = ancestors
                        .iter()
                        .map(|ancestor| {
                            self.ban_time_frame_locked(state, ancestor, visiting, truncated)
                        })
                        .max_by_key(TimeFrame::end)
                        .unwrap_or(TimeFrame::ZERO);
                    TimeFrame::new(ancestor_window.start(), ancestor_window.duration() / 2)
                }
            };
            if !frame.is_zero() && (window.is_zero() || frame.end() > window.end()) {
                window = frame;
            }
        }

        if window.duration() < self.config.minimum_time_in_prison {
            window = TimeFrame::ZERO;
        }
        visiting.remove(outpoint);
        if !*truncated {
            state.ban_windows.insert(*outpoint, window);
        }
        log::debug!(
            "{outpoint} is banned for {}s from {}",
            window.duration().as_secs(),
            window.start().epoch_seconds()
        );
        window
    }

    /// `disruptions` counts this offense and the earlier ones by the same input.
    fn repetition_factor(&self, txid: &Txid, disruptions: u32) -> f64 {
        if self.known_transactions.contains(txid) {
            f64::from(disruptions.saturating_sub(1).max(1))
        } else {
            2f64.powf(f64::from(disruptions - 1))
        }
    }
}

// Whole seconds, like the timestamps the window starts at. A zero penalty factor times an
// overflowed repetition factor is NaN, which means no ban.
fn duration_from_hours(hours: f64) -> Duration {
    if hours.is_nan() {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64((hours * SECONDS_PER_HOUR).round()).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offense::{RoundDisruptionMethod, RoundId};

    const HOUR: Duration = Duration::from_secs(3600);

    fn outpoint(byte: u8) -> OutPoint {
        OutPoint::new(Txid([byte; 32]), 0)
    }

    fn disruption(outpoint: OutPoint, started: u64, value: u64) -> Offender {
        Offender::new(
            outpoint,
            Timestamp::from_epoch_seconds(started),
            Offense::RoundDisruption {
                round_id: RoundId([0; 32]),
                value,
                method: RoundDisruptionMethod::DidNotSign,
            },
        )
    }

    fn prison() -> Prison<HashSet<Txid>> {
        Prison::new(PrisonConfig::default(), HashSet::new()).unwrap()
    }

    #[test]
    fn unknown_outpoint_is_not_banned() {
        let prison = prison();
        assert_eq!(prison.ban_time_frame(&outpoint(1)), TimeFrame::ZERO);
        assert_eq!(prison.count_banned(Timestamp::now()), 0);
    }

    #[test]
    fn disruption_of_severity_value_is_one_hour() {
        let prison = prison();
        prison
            .punish(disruption(outpoint(1), 1000, 10_000_000))
            .unwrap();
        let frame = prison.ban_time_frame(&outpoint(1));
        assert_eq!(frame.start(), Timestamp::from_epoch_seconds(1000));
        assert_eq!(frame.duration(), HOUR);
        assert!(prison.is_banned(&outpoint(1), Timestamp::from_epoch_seconds(1000)));
        assert_eq!(
            prison.banned_until(&outpoint(1), Timestamp::from_epoch_seconds(2000)),
            Some(Timestamp::from_epoch_seconds(4600))
        );
        assert_eq!(
            prison.banned_until(&outpoint(1), Timestamp::from_epoch_seconds(4600)),
            None
        );
    }

    #[test]
    fn zero_value_does_not_divide_by_zero() {
        let prison = prison();
        prison.punish(disruption(outpoint(1), 0, 0)).unwrap();
        assert_eq!(
            prison.ban_time_frame(&outpoint(1)).duration(),
            10_000_000 * HOUR
        );
    }

    #[test]
    fn huge_repetition_saturates() {
        let prison = prison();
        for i in 0..2000 {
            prison.punish(disruption(outpoint(1), i, 1)).unwrap();
        }
        assert_eq!(prison.ban_time_frame(&outpoint(1)).duration(), Duration::MAX);
    }

    #[test]
    fn latest_ending_window_wins() {
        let prison = prison();
        prison
            .punish(Offender::new(
                outpoint(1),
                Timestamp::from_epoch_seconds(0),
                Offense::Cheating {
                    round_id: RoundId([0; 32]),
                },
            ))
            .unwrap();
        prison
            .punish(disruption(outpoint(1), 10, 10_000_000))
            .unwrap();
        let frame = prison.ban_time_frame(&outpoint(1));
        assert_eq!(frame.start(), Timestamp::from_epoch_seconds(0));
        assert_eq!(frame.duration(), PrisonConfig::default().min_time_for_cheating);
    }

    #[test]
    fn inheritance_cycle_is_not_banned() {
        let prison = prison();
        for (from, to) in [(1, 2), (2, 1)] {
            prison
                .punish(Offender::new(
                    outpoint(from),
                    Timestamp::from_epoch_seconds(0),
                    Offense::Inherited {
                        ancestors: vec![outpoint(to)],
                    },
                ))
                .unwrap();
        }
        assert_eq!(prison.ban_time_frame(&outpoint(1)), TimeFrame::ZERO);
        assert_eq!(prison.ban_time_frame(&outpoint(2)), TimeFrame::ZERO);
    }

    #[test]
    fn disabled_disruption_kind_never_bans() {
        let config = PrisonConfig {
            did_not_sign_penalty_factor: 0.0,
            ..Default::default()
        };
        let prison = Prison::new(config, HashSet::new()).unwrap();
        // Enough repeats for the exponential factor to overflow to infinity.
        for i in 0..1100 {
            prison.punish(disruption(outpoint(1), i, 1)).unwrap();
        }
        assert_eq!(prison.ban_time_frame(&outpoint(1)), TimeFrame::ZERO);
    }

    #[test]
    fn duration_from_hours_edges() {
        assert_eq!(duration_from_hours(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_hours(f64::INFINITY), Duration::MAX);
        assert_eq!(duration_from_hours(0.5), Duration::from_secs(1800));
    }

    #[test]
    fn cyclic_windows_do_not_depend_on_query_order() {
        let cyclic_prison = || {
            let prison = prison();
            for (from, to) in [(1, 2), (2, 1)] {
                prison
                    .punish(Offender::new(
                        outpoint(from),
                        Timestamp::from_epoch_seconds(0),
                        Offense::Inherited {
                            ancestors: vec![outpoint(to)],
                        },
                    ))
                    .unwrap();
            }
            prison
                .punish(Offender::new(
                    outpoint(2),
                    Timestamp::from_epoch_seconds(0),
                    Offense::Cheating {
                        round_id: RoundId([0; 32]),
                    },
                ))
                .unwrap();
            prison
        };
        let day = PrisonConfig::default().min_time_for_cheating;

        let first = cyclic_prison();
        let one = first.ban_time_frame(&outpoint(1));
        let two = first.ban_time_frame(&outpoint(2));

        let second = cyclic_prison();
        assert_eq!(second.ban_time_frame(&outpoint(2)), two);
        assert_eq!(second.ban_time_frame(&outpoint(1)), one);

        assert_eq!(two.duration(), day);
        assert_eq!(one.duration(), day / 2);
    }

    #[test]
    fn known_transactions_can_be_shared() {
        let known = Arc::new(RwLock::new(HashSet::new()));
        let prison = Prison::new(PrisonConfig::default(), Arc::clone(&known)).unwrap();
        for i in 0..3 {
            prison
                .punish(disruption(outpoint(1), i, 10_000_000))
                .unwrap();
        }
        // Exponential: 2^2 hours for the third offense.
        assert_eq!(prison.ban_time_frame(&outpoint(1)).duration(), 4 * HOUR);

        known.write().unwrap().insert(Txid([1; 32]));
        prison
            .punish(disruption(outpoint(2), 0, 10_000_000))
            .unwrap();
        // Linear: 2 hours for the third offense.
        assert_eq!(prison.ban_time_frame(&outpoint(1)).duration(), 2 * HOUR);
    }
}

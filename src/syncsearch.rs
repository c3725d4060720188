//! Forward sync-search: the coherent-cycle detector that decides where a
//! frame starts and which decoder should attempt it (`spec.md` §4.2).
//!
//! Scans newly captured pulses, applying a three-way clock-drift
//! correction (halving `p0`, `p1`, or the whole cycle) before deciding
//! whether the cycle is close enough to the running `sync_duration`
//! estimate to extend the run, or far enough off to reset and reseed it.
//! Once [`SYNC_LEN`](crate::consts::SYNC_LEN) coherent cycles follow the
//! seed, commits and classifies the modulation by precedence (raw-pulse
//! display mode, then OOK, then Manchester, then ASK).

use crate::buffer::{abs_sub, PulseBuffer};
use crate::consts::{
    CLOCK_ADJUST_THRESHOLD, MANCHESTER_SYNC_MIN, OOK_DURATION_THRESHOLD, SYNC_LEN,
    SYNC_MAX_DEVIATION, SYNC_MIN_DURATION,
};
use crate::dispatcher::RunningState;

/// Result of a committed sync point: `SYNC_LEN` coherent cycles found.
#[derive(Debug, Clone, Copy)]
pub struct SyncPoint {
    pub sync_start: u8,
    pub sync_duration: u8,
    pub manchester_count: u8,
}

/// Forward sync-search scanner.
#[derive(Debug)]
pub struct SyncSearch {
    pi: u8,
    sync_start: u8,
    sync_len: u8,
    sync_duration: u8,
    manchester_count: u8,
}

impl SyncSearch {
    pub fn new() -> Self {
        Self {
            pi: 0,
            sync_start: 0,
            sync_len: 0,
            sync_duration: 0,
            manchester_count: 0,
        }
    }

    /// How many coherent cycles have been accumulated so far this run.
    /// `0` means the scanner hasn't matched a candidate window yet — used
    /// by the dispatcher to decide whether an inbound command byte should
    /// take priority over continuing the search.
    pub fn sync_len(&self) -> u8 {
        self.sync_len
    }

    /// Resets the scanner to resume from `msg_start` after a decode
    /// attempt (successful or not) has finished.
    pub fn resume_after_commit(&mut self, msg_start: u8) {
        self.pi = msg_start;
        self.sync_start = msg_start.wrapping_add(1);
        self.sync_len = 0;
        self.sync_duration = 0;
        self.manchester_count = 0;
    }

    /// Consumes newly captured pulses until either the write cursor is
    /// caught up (nothing more to look at right now) or `SYNC_LEN`
    /// coherent cycles have been found.
    pub fn scan(&mut self, buf: &PulseBuffer) -> Option<SyncPoint> {
        while self.pi != buf.current_pulse && self.sync_len < SYNC_LEN {
            let cell = buf.get(self.pi);
            let (mut p0, mut p1) = (cell.low, cell.high);
            let mut d = p0 as u16 + p1 as u16;

            if d > CLOCK_ADJUST_THRESHOLD {
                if (abs_sub(p0 / 2, p1) as u16) < d / 8 {
                    p0 /= 2;
                    d = p0 as u16 + p1 as u16;
                } else if (abs_sub(p0, p1 / 2) as u16) < d / 8 {
                    p1 /= 2;
                    d = p0 as u16 + p1 as u16;
                } else if (abs_sub((d / 2) as u8, self.sync_duration) as u16) < d / 16 {
                    p0 /= 2;
                    p1 /= 2;
                    d /= 2;
                }
            }

            if d < SYNC_MIN_DURATION || abs_sub(d as u8, self.sync_duration) as u16 > SYNC_MAX_DEVIATION {
                self.sync_start = self.pi;
                self.sync_duration = d as u8;
                self.sync_len = 0;
                self.manchester_count = 0;
            } else {
                if (abs_sub(p1, p0) as u16) < d / 8 {
                    self.manchester_count += 1;
                }
                let delta = d as i32 - self.sync_duration as i32;
                self.sync_duration = (self.sync_duration as i32 + delta / 2) as u8;
                self.sync_len += 1;
            }

            self.pi = self.pi.wrapping_add(1);
        }

        if self.sync_len >= SYNC_LEN {
            Some(SyncPoint {
                sync_start: self.sync_start,
                sync_duration: self.sync_duration,
                manchester_count: self.manchester_count,
            })
        } else {
            None
        }
    }
}

impl Default for SyncSearch {
    fn default() -> Self {
        Self::new()
    }
}

/// Chooses which decoder should attempt the frame just committed by
/// [`SyncSearch::scan`], by the fixed precedence: raw-pulse display mode
/// first, then OOK, then Manchester, then ASK.
pub fn classify(display_pulses: bool, sync_duration: u8, manchester_count: u8) -> RunningState {
    if display_pulses {
        RunningState::DecodeRawPulses
    } else if sync_duration > OOK_DURATION_THRESHOLD {
        RunningState::DecodingOok
    } else if manchester_count > MANCHESTER_SYNC_MIN {
        RunningState::DecodingManchester
    } else {
        RunningState::DecodingAsk
    }
}

/// Backward variant of the scanner: walks from a saturated cell back
/// towards the read cursor instead of forwards from it. Present in
/// `original_source/avr/rf_bridge_common.c` as `cr_syncsearch_backward`
/// but never wired into the dispatcher there either — kept here for the
/// same reason, not deleted.
#[allow(dead_code)]
pub fn backward_scan(buf: &PulseBuffer, from: u8) -> Option<SyncPoint> {
    let mut pi = from;
    let mut sync_len: u8 = 0;
    let mut sync_duration: u8 = 0;
    let mut manchester_count: u8 = 0;
    let mut sync_start = from;

    while pi != buf.current_pulse && sync_len < SYNC_LEN {
        let cell = buf.get(pi);
        let (p0, p1) = (cell.low, cell.high);
        let d = p0 as u16 + p1 as u16;

        if d >= SYNC_MIN_DURATION && abs_sub(d as u8, sync_duration) as u16 <= SYNC_MAX_DEVIATION {
            if (abs_sub(p1, p0) as u16) < d / 8 {
                manchester_count += 1;
            }
            sync_len += 1;
        } else {
            sync_start = pi;
            sync_duration = d as u8;
            sync_len = 0;
            manchester_count = 0;
        }

        pi = pi.wrapping_sub(1);
    }

    if sync_len >= SYNC_LEN {
        Some(SyncPoint {
            sync_start,
            sync_duration,
            manchester_count,
        })
    } else {
        None
    }
}

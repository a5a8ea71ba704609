//
// Copyright 2026 Signal Messenger, LLC.
// SPDX-License-Identifier: AGPL-3.0-only
//

//! A minimal Strobe-128 duplex sponge over Keccak-f\[1600\].
//!
//! Only the operations a Fiat-Shamir transcript needs are provided: `meta_ad`, `ad`, `key` and
//! `prf`. Every operation can be continued with `more = true`, in which case no new operation
//! framing is absorbed and the flags must match the operation being continued.

pub const STATE_LEN: usize = 200;
/// Bytes absorbed or squeezed between two permutations, for 128-bit security.
pub const RATE: usize = STATE_LEN - (2 * 128 / 8) - 2;

const VERSION: &[u8] = b"STROBEv1.0.2";

const FLAG_I: u8 = 1;
const FLAG_A: u8 = 1 << 1;
const FLAG_C: u8 = 1 << 2;
const FLAG_T: u8 = 1 << 3;
const FLAG_M: u8 = 1 << 4;
const FLAG_K: u8 = 1 << 5;

#[derive(Clone)]
pub struct Strobe128 {
    state: [u8; STATE_LEN],
    pos: usize,
    pos_begin: usize,
    cur_flags: u8,
}

impl std::fmt::Debug for Strobe128 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The state may have been keyed with secrets.
        f.debug_struct("Strobe128").finish_non_exhaustive()
    }
}

impl Strobe128 {
    pub fn new(protocol_label: &[u8]) -> Self {
        let mut state = [0u8; STATE_LEN];
        state[0..6].copy_from_slice(&[1, (RATE + 2) as u8, 1, 0, 1, 96]);
        state[6..6 + VERSION.len()].copy_from_slice(VERSION);
        permute(&mut state);

        let mut strobe = Strobe128 {
            state,
            pos: 0,
            pos_begin: 0,
            cur_flags: 0,
        };
        strobe.meta_ad(protocol_label, false);
        strobe
    }

    pub fn meta_ad(&mut self, data: &[u8], more: bool) {
        self.begin_op(FLAG_M | FLAG_A, more);
        self.absorb(data);
    }

    pub fn ad(&mut self, data: &[u8], more: bool) {
        self.begin_op(FLAG_A, more);
        self.absorb(data);
    }

    pub fn key(&mut self, data: &[u8], more: bool) {
        self.begin_op(FLAG_A | FLAG_C, more);
        self.overwrite(data);
    }

    pub fn prf(&mut self, out: &mut [u8], more: bool) {
        self.begin_op(FLAG_I | FLAG_A | FLAG_C, more);
        self.squeeze(out);
    }

    fn absorb(&mut self, data: &[u8]) {
        for byte in data {
            self.state[self.pos] ^= byte;
            self.advance();
        }
    }

    fn overwrite(&mut self, data: &[u8]) {
        for byte in data {
            self.state[self.pos] = *byte;
            self.advance();
        }
    }

    fn squeeze(&mut self, out: &mut [u8]) {
        for byte in out {
            *byte = self.state[self.pos];
            self.state[self.pos] = 0;
            self.advance();
        }
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
        if self.pos == RATE {
            self.run_f();
        }
    }

    fn run_f(&mut self) {
        self.state[self.pos] ^= self.pos_begin as u8;
        self.state[self.pos + 1] ^= 0x04;
        self.state[RATE + 1] ^= 0x80;
        permute(&mut self.state);
        self.pos = 0;
        self.pos_begin = 0;
    }

    fn begin_op(&mut self, flags: u8, more: bool) {
        if more {
            assert_eq!(
                self.cur_flags, flags,
                "continued operation {:#b} with different flags {:#b}",
                self.cur_flags, flags
            );
            return;
        }
        assert_eq!(flags & FLAG_T, 0, "transport operations are not supported");

        let old_begin = self.pos_begin;
        self.pos_begin = self.pos + 1;
        self.cur_flags = flags;
        self.absorb(&[old_begin as u8, flags]);

        // Cipher and key operations start on a fresh block.
        if flags & (FLAG_C | FLAG_K) != 0 && self.pos != 0 {
            self.run_f();
        }
    }
}

fn permute(state: &mut [u8; STATE_LEN]) {
    let mut lanes = [0u64; 25];
    for (lane, chunk) in lanes.iter_mut().zip(state.chunks_exact(8)) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        *lane = u64::from_le_bytes(bytes);
    }
    keccak::f1600(&mut lanes);
    for (chunk, lane) in state.chunks_exact_mut(8).zip(lanes) {
        chunk.copy_from_slice(&lane.to_le_bytes());
    }
}

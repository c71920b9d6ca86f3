//! Seat labels and the per-showtime availability set.
//!
//! A hall is a fixed 10×10 grid: rows `A`..`J`, seats `1`..`10`, labelled
//! `A1`..`J10`. A [`SeatPool`] holds the labels that are still free. It is
//! always kept in grid order and never contains a label twice.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ROWS: u8 = 10;
pub const SEATS_PER_ROW: u8 = 10;
pub const TOTAL_SEATS: usize = ROWS as usize * SEATS_PER_ROW as usize;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid seat label '{0}'")]
pub struct InvalidSeatLabel(pub String);

/// One seat of the grid. Ordering is row-major, which is grid order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatLabel {
    row: u8,
    number: u8,
}

impl SeatLabel {
    pub fn new(row: char, number: u8) -> Option<Self> {
        let row = (row as u32).checked_sub('A' as u32)?;
        if row >= ROWS as u32 || number == 0 || number > SEATS_PER_ROW {
            return None;
        }
        Some(Self { row: row as u8, number })
    }

    pub fn row(&self) -> char {
        (b'A' + self.row) as char
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn all() -> impl Iterator<Item = SeatLabel> {
        (0..ROWS).flat_map(|row| (1..=SEATS_PER_ROW).map(move |number| SeatLabel { row, number }))
    }
}

impl FromStr for SeatLabel {
    type Err = InvalidSeatLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidSeatLabel(s.to_string());
        let mut chars = s.chars();
        let row = chars.next().ok_or_else(invalid)?;
        let digits = chars.as_str();

        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u8 = digits.parse().map_err(|_| invalid())?;
        SeatLabel::new(row, number).ok_or_else(invalid)
    }
}

impl fmt::Display for SeatLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row(), self.number)
    }
}

impl Serialize for SeatLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeatLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Free seats of one showtime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeatPool {
    free: BTreeSet<SeatLabel>,
}

impl SeatPool {
    pub fn full() -> Self {
        Self { free: SeatLabel::all().collect() }
    }

    /// Builds a pool from persisted labels. Entries that are not grid labels
    /// are dropped; they can never be requested anyway.
    pub fn from_stored<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            free: labels.iter().filter_map(|l| l.as_ref().parse().ok()).collect(),
        }
    }

    pub fn contains(&self, seat: &SeatLabel) -> bool {
        self.free.contains(seat)
    }

    pub fn len(&self) -> usize {
        self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.free.is_empty()
    }

    /// All-or-nothing removal. On failure returns the first requested seat
    /// (in request order) that is not free and leaves the pool untouched.
    pub fn reserve(&mut self, seats: &[SeatLabel]) -> Result<(), SeatLabel> {
        if let Some(missing) = seats.iter().find(|s| !self.free.contains(s)) {
            return Err(*missing);
        }
        for seat in seats {
            self.free.remove(seat);
        }
        Ok(())
    }

    /// Puts seats back. Seats that are already free stay single.
    pub fn release(&mut self, seats: &[SeatLabel]) {
        self.free.extend(seats.iter().copied());
    }

    pub fn labels(&self) -> Vec<String> {
        self.free.iter().map(ToString::to_string).collect()
    }
}

//! Day-block segmentation of free-text route summaries.
//!
//! A summary looks like:
//!
//! ```text
//! **1. Gün (2025-08-13): İstanbul - Ayvalık**
//! Morning drive along the coast...
//! *   **Konaklama:** camp site near Sarımsaklı
//! **2. Gün (2025-08-14): Ayvalık - Foça**
//! ...
//! ```
//!
//! Scanning is an explicit two-state machine (`Idle`, `InBlock`) driven by
//! three events: a header line, a detail line, and end of input. Closing a
//! block, whether triggered by the next header or by end of input, emits one
//! [`DayPlan`]. A header whose ordinal is not a positive integer is recorded
//! as a [`MalformedDayHeader`] and its block is skipped.

use std::iter::{Enumerate, FusedIterator};
use std::mem;
use std::str::Lines;

use chrono::{Days, NaiveDate};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use super::DayPlan;
use super::infer::PlaceTable;

/// Separators between the legs of a header label ("İstanbul - Ayvalık").
const LABEL_SEPARATORS: &[&str] = &[" - ", " – ", " → "];

/// Line prefixes marking sub-headings inside a day block. Such lines are
/// dropped rather than added to the block's details.
const SUBHEADING_MARKERS: &[&str] = &["*   **", "**"];

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A header-shaped line whose block had to be skipped. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedDayHeader {
    #[error("line {line}: day ordinal {ordinal:?} is not a positive integer")]
    BadOrdinal { line: usize, ordinal: String },

    #[error("line {line}: day {day} falls outside the calendar")]
    DateOutOfRange { line: usize, day: u32 },
}

#[derive(Debug, Error)]
pub enum HeaderPatternError {
    #[error("at least one day word is required")]
    NoDayWords,

    #[error("invalid header pattern: {0}")]
    Regex(#[from] regex::Error),
}

// ---------------------------------------------------------------------------
// Header pattern
// ---------------------------------------------------------------------------

/// Recognizes `**<N>. <day-word> (<date>): <label>**` lines.
///
/// The day word is configurable so summaries in other languages only need a
/// different word list. The ordinal is captured loosely so that a header
/// with a non-numeric ordinal is reported instead of silently ignored.
#[derive(Debug, Clone)]
pub struct HeaderPattern {
    regex: Regex,
    day_words: Vec<String>,
}

/// The pieces of a matched header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch<'a> {
    pub ordinal: &'a str,
    pub date_token: &'a str,
    pub label: &'a str,
}

impl HeaderPattern {
    pub const DEFAULT_DAY_WORDS: &[&str] = &["Gün", "Day"];

    pub fn new<S: AsRef<str>>(day_words: &[S]) -> Result<Self, HeaderPatternError> {
        let day_words: Vec<String> = day_words
            .iter()
            .map(|w| w.as_ref().trim().to_owned())
            .filter(|w| !w.is_empty())
            .collect();
        if day_words.is_empty() {
            return Err(HeaderPatternError::NoDayWords);
        }

        let alternatives = day_words
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let regex = Regex::new(&format!(
            r"\*\*\s*([^\s.*]+)\.\s*(?i:{alternatives})\s*\(([^)]*)\)\s*:\s*([^*]*)\*\*"
        ))?;

        Ok(Self { regex, day_words })
    }

    pub fn day_words(&self) -> &[String] {
        &self.day_words
    }

    pub fn match_line<'a>(&self, line: &'a str) -> Option<HeaderMatch<'a>> {
        let caps = self.regex.captures(line)?;
        Some(HeaderMatch {
            ordinal: caps.get(1)?.as_str(),
            date_token: caps.get(2)?.as_str().trim(),
            label: caps.get(3)?.as_str().trim(),
        })
    }
}

impl Default for HeaderPattern {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DAY_WORDS).expect("built-in day words form a valid pattern")
    }
}

// ---------------------------------------------------------------------------
// Segmenter
// ---------------------------------------------------------------------------

/// Configuration shared by every segmentation run. Holds no per-run state,
/// so the same text and anchor date always yield the same days.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    header: HeaderPattern,
    places: PlaceTable,
}

impl Segmenter {
    pub fn new(header: HeaderPattern, places: PlaceTable) -> Self {
        Self { header, places }
    }

    pub fn header(&self) -> &HeaderPattern {
        &self.header
    }

    pub fn places(&self) -> &PlaceTable {
        &self.places
    }

    /// Lazily split `text` into day plans anchored at `start_date`.
    pub fn segment<'a>(&'a self, text: &'a str, start_date: NaiveDate) -> DayBlocks<'a> {
        DayBlocks {
            segmenter: self,
            lines: text.lines().enumerate(),
            start_date,
            state: State::Idle,
            malformed: Vec::new(),
        }
    }
}

/// Pick the place name from a header label: the text after the last leg
/// separator, or the whole label. `None` for an empty label.
fn label_place(label: &str) -> Option<&str> {
    let tail = LABEL_SEPARATORS
        .iter()
        .filter_map(|sep| label.rfind(sep).map(|pos| pos + sep.len()))
        .max()
        .map_or(label, |start| &label[start..]);
    Some(tail.trim()).filter(|s| !s.is_empty())
}

fn is_subheading(line: &str) -> bool {
    SUBHEADING_MARKERS.iter().any(|m| line.starts_with(m))
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct OpenBlock<'a> {
    line: usize,
    day: u32,
    label: &'a str,
    details: Vec<&'a str>,
}

#[derive(Debug)]
enum State<'a> {
    Idle,
    InBlock(OpenBlock<'a>),
    Finished,
}

#[derive(Debug)]
enum Event<'a> {
    Header { line: usize, header: HeaderMatch<'a> },
    Detail(&'a str),
    EndOfInput,
}

/// Iterator over the day plans of one summary. Not restartable: run
/// [`Segmenter::segment`] again for a fresh pass.
#[derive(Debug)]
pub struct DayBlocks<'a> {
    segmenter: &'a Segmenter,
    lines: Enumerate<Lines<'a>>,
    start_date: NaiveDate,
    state: State<'a>,
    malformed: Vec<MalformedDayHeader>,
}

impl<'a> DayBlocks<'a> {
    /// Headers skipped so far.
    pub fn malformed_headers(&self) -> &[MalformedDayHeader] {
        &self.malformed
    }

    /// Consume the iterator, returning the remaining days and every skipped
    /// header.
    pub fn collect_with_warnings(mut self) -> (Vec<DayPlan>, Vec<MalformedDayHeader>) {
        let days: Vec<DayPlan> = self.by_ref().collect();
        (days, self.malformed)
    }

    fn next_event(&mut self) -> Event<'a> {
        match self.lines.next() {
            None => Event::EndOfInput,
            Some((idx, raw)) => {
                let line = raw.trim();
                match self.segmenter.header.match_line(line) {
                    Some(header) => Event::Header {
                        line: idx + 1,
                        header,
                    },
                    None => Event::Detail(line),
                }
            }
        }
    }

    /// Apply one event. Returns a day plan when the event closed a block.
    fn step(&mut self, event: Event<'a>) -> Option<DayPlan> {
        match event {
            Event::Detail(line) => {
                if let State::InBlock(block) = &mut self.state {
                    if !line.is_empty() && !is_subheading(line) {
                        block.details.push(line);
                    }
                }
                None
            }
            Event::Header { line, header } => {
                let next = self.open(line, header);
                match mem::replace(&mut self.state, next) {
                    State::InBlock(block) => self.close(block),
                    State::Idle | State::Finished => None,
                }
            }
            Event::EndOfInput => match mem::replace(&mut self.state, State::Finished) {
                State::InBlock(block) => self.close(block),
                State::Idle | State::Finished => None,
            },
        }
    }

    fn open(&mut self, line: usize, header: HeaderMatch<'a>) -> State<'a> {
        match header.ordinal.parse::<u32>() {
            Ok(day) if day > 0 => {
                debug!(day, date = header.date_token, label = header.label, "day header");
                State::InBlock(OpenBlock {
                    line,
                    day,
                    label: header.label,
                    details: Vec::new(),
                })
            }
            _ => {
                let fault = MalformedDayHeader::BadOrdinal {
                    line,
                    ordinal: header.ordinal.to_owned(),
                };
                warn!("skipping day block: {fault}");
                self.malformed.push(fault);
                State::Idle
            }
        }
    }

    fn close(&mut self, block: OpenBlock<'a>) -> Option<DayPlan> {
        let Some(date) = self
            .start_date
            .checked_add_days(Days::new(u64::from(block.day - 1)))
        else {
            let fault = MalformedDayHeader::DateOutOfRange {
                line: block.line,
                day: block.day,
            };
            warn!("skipping day block: {fault}");
            self.malformed.push(fault);
            return None;
        };

        let details = block.details.join("\n");
        let guess = self.segmenter.places.infer(&details);
        let location_name = label_place(block.label).unwrap_or(guess.name).to_owned();

        Some(DayPlan {
            day: block.day,
            date,
            location_name,
            address_hint: guess.address.to_owned(),
            notes: details.clone(),
            details,
            site_url: None,
            latitude: 0.0,
            longitude: 0.0,
        })
    }
}

impl Iterator for DayBlocks<'_> {
    type Item = DayPlan;

    fn next(&mut self) -> Option<DayPlan> {
        loop {
            if matches!(self.state, State::Finished) {
                return None;
            }
            let event = self.next_event();
            if let Some(plan) = self.step(event) {
                return Some(plan);
            }
        }
    }
}

impl FusedIterator for DayBlocks<'_> {}

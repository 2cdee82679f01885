use crate::scraper::extract::{ExtractedFields, ExtractionEngine};

pub const MAX_ATTEMPTS: usize = 3;

/// Explicit retry state: which attempt is next, or done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempt(usize),
    Done,
}

pub struct RetryOutcome {
    pub fields: ExtractedFields,
    /// HTML from the last attempt that produced a page, for the snapshot
    /// decision downstream.
    pub last_html: Option<String>,
    pub attempts_run: usize,
}

/// Three-attempt state machine over the candidate URL list. Advances only
/// while price is unresolved; every attempt reuses the same browser page so
/// warmed-up session state carries over.
///
/// Merge policy: non-price fields are captured on first success and never
/// overwritten by a later attempt; price alone is re-sought each attempt.
pub struct RetryController {
    candidates: Vec<String>,
    state: RetryState,
    merged: ExtractedFields,
    last_html: Option<String>,
    attempts_run: usize,
}

impl RetryController {
    pub fn new(candidates: Vec<String>) -> Self {
        let candidates: Vec<String> = candidates.into_iter().take(MAX_ATTEMPTS).collect();
        let state = if candidates.is_empty() {
            RetryState::Done
        } else {
            RetryState::Attempt(0)
        };
        Self {
            candidates,
            state,
            merged: ExtractedFields::default(),
            last_html: None,
            attempts_run: 0,
        }
    }

    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Runs a single attempt and advances the state. An attempt that errors
    /// is treated as "no price for this attempt"; the run never aborts here.
    pub fn step(&mut self, engine: &mut dyn ExtractionEngine) {
        let index = match self.state {
            RetryState::Attempt(i) => i,
            RetryState::Done => return,
        };

        let url = &self.candidates[index];
        eprintln!(
            "🌐 Attempt {}/{}: {}",
            index + 1,
            self.candidates.len(),
            url
        );

        match engine.run(url) {
            Ok(outcome) => {
                self.merge(outcome.fields);
                self.last_html = Some(outcome.html);
            }
            Err(e) => {
                eprintln!("⚠️ Attempt {} failed: {e}", index + 1);
            }
        }
        self.attempts_run += 1;

        let next = index + 1;
        self.state = if self.merged.price.is_some() || next >= self.candidates.len() {
            RetryState::Done
        } else {
            RetryState::Attempt(next)
        };
    }

    pub fn run(mut self, engine: &mut dyn ExtractionEngine) -> RetryOutcome {
        while self.state != RetryState::Done {
            self.step(engine);
        }
        RetryOutcome {
            fields: self.merged,
            last_html: self.last_html,
            attempts_run: self.attempts_run,
        }
    }

    fn merge(&mut self, fresh: ExtractedFields) {
        // price is explicitly re-sought every attempt
        if fresh.price.is_some() {
            self.merged.price = fresh.price;
        }

        if self.merged.title.is_none() {
            self.merged.title = fresh.title;
        }
        if self.merged.details_line.is_none() {
            self.merged.details_line = fresh.details_line;
        }
        if self.merged.description.is_none() {
            self.merged.description = fresh.description;
        }
        if self.merged.rating.is_none() {
            self.merged.rating = fresh.rating;
        }
        if self.merged.review_count.is_none() {
            self.merged.review_count = fresh.review_count;
        }
        // coordinates travel as a pair
        if self.merged.latitude.is_none() && self.merged.longitude.is_none() {
            self.merged.latitude = fresh.latitude;
            self.merged.longitude = fresh.longitude;
        }
    }
}

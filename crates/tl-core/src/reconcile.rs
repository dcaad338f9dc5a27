//! Timeline reconciliation.
//!
//! Merges the denoised AFK intervals into the categorized event stream,
//! producing one ordered, non-overlapping timeline.
//!
//! # Algorithm Summary
//!
//! A cursor holds the current AFK interval (`None` once exhausted). Each event
//! is classified against it:
//!
//! 1. starts before, ends after: split around the AFK interval, advance
//! 2. starts during or after, ends after: emit AFK, shift the event to start
//!    where the AFK interval ends, advance
//! 3. starts before, ends during (or exactly at its start): truncate the
//!    event at the AFK start, keep the cursor
//! 4. starts before, ends before: pass through, keep the cursor
//! 5. inside the AFK interval: drop, keep the cursor
//!
//! After an advance, the remaining tail of the event is classified again
//! against the next AFK interval, so an event spanning several AFK intervals
//! is cut around each of them. Each AFK interval is emitted at most once, and
//! an interval still pending when the events run out is not emitted.

use crate::error::TimelineError;
use crate::event::{CategorizedEvent, CategorizedSegment};
use crate::interval::Interval;

/// Merges ascending AFK intervals into ascending categorized events.
pub fn reconcile<A, E>(afk: A, events: E) -> Vec<CategorizedSegment>
where
    A: IntoIterator<Item = Interval>,
    E: IntoIterator<Item = CategorizedEvent>,
{
    let mut reconciler = Reconciler::new(afk.into_iter());
    for event in events {
        reconciler.push(event);
    }
    reconciler.finish()
}

/// Like [`reconcile`], consuming a fallible event stream such as
/// [`crate::expand()`]. Stops at the first error.
pub fn try_reconcile<A, E>(afk: A, events: E) -> Result<Vec<CategorizedSegment>, TimelineError>
where
    A: IntoIterator<Item = Interval>,
    E: IntoIterator<Item = Result<CategorizedEvent, TimelineError>>,
{
    let mut reconciler = Reconciler::new(afk.into_iter());
    for event in events {
        reconciler.push(event?);
    }
    Ok(reconciler.finish())
}

struct Reconciler<A> {
    afk: A,
    current: Option<Interval>,
    segments: Vec<CategorizedSegment>,
    afk_emitted: usize,
}

impl<A> Reconciler<A>
where
    A: Iterator<Item = Interval>,
{
    fn new(mut afk: A) -> Self {
        let current = afk.next();
        Self {
            afk,
            current,
            segments: Vec::new(),
            afk_emitted: 0,
        }
    }

    fn advance(&mut self) {
        self.current = self.afk.next();
    }

    fn emit_afk(&mut self, afk: Interval) {
        self.segments.push(CategorizedSegment::afk(afk));
        self.afk_emitted += 1;
    }

    fn push(&mut self, event: CategorizedEvent) {
        let CategorizedEvent {
            category,
            interval,
            payload,
        } = event;
        let mut piece = interval;

        while let Some(afk) = self.current {
            if piece.end() > afk.end() {
                if piece.start() < afk.start() {
                    // Split: the part before the AFK interval stands alone.
                    self.segments.push(CategorizedSegment {
                        interval: piece.with_end(afk.start()),
                        category: category.clone(),
                        payload: payload.clone(),
                    });
                }
                self.emit_afk(afk);
                piece = piece.with_start(piece.start().max(afk.end()));
                self.advance();
                continue;
            }

            if piece.start() < afk.start() {
                if piece.end() >= afk.start() {
                    // Ends during: the AFK interval stays pending.
                    piece = piece.with_end(afk.start());
                }
                break;
            }

            // Engulfed by the AFK interval.
            return;
        }

        self.segments.push(CategorizedSegment {
            interval: piece,
            category,
            payload,
        });
    }

    fn finish(self) -> Vec<CategorizedSegment> {
        tracing::debug!(
            segments = self.segments.len(),
            afk = self.afk_emitted,
            pending_afk = self.current.is_some(),
            "reconciled timeline"
        );
        self.segments
    }
}

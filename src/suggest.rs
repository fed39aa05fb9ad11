/// Concept suggestion debouncer
///
/// Watches the product-image set and, after a quiet period, asks the model
/// for a creative concept exactly once. Rapid file changes restart the
/// timer; only the last set within a quiet window is ever submitted.
///
/// The struct is a pure state machine over generation counters: the iced
/// side sleeps and performs requests, then reports back here with the
/// generation it was started for. Anything reported with a stale generation
/// is discarded, which is all the cancellation this pipeline needs.

use std::time::Duration;

/// Quiet period after the last file change before a request is issued.
pub const QUIET_PERIOD: Duration = Duration::from_millis(500);

/// What the application should do after a file-set change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilesChanged {
    /// The set became empty: clear the concept now, nothing is scheduled.
    Clear,
    /// Start (or restart) the quiet-period timer for this generation.
    Debounce(u64),
}

/// A pending suggestion request: which file-set generation it carries and
/// how many concept edits the user had made when it was issued.
#[derive(Debug, Clone, Copy)]
struct Pending {
    generation: u64,
    edit_epoch: u64,
}

#[derive(Debug, Default)]
pub struct SuggestionDebouncer {
    /// Bumped on every file-set change; stale timers and requests carry an
    /// older value and are ignored.
    generation: u64,
    /// Bumped whenever the user edits the concept by hand. A suggestion
    /// completing after a manual edit must not clobber the user's text.
    edit_epoch: u64,
    in_flight: Option<Pending>,
}

impl SuggestionDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The watched file set changed. Supersedes any pending timer or
    /// in-flight request either way.
    pub fn files_changed(&mut self, file_count: usize) -> FilesChanged {
        self.generation += 1;
        if file_count == 0 {
            self.in_flight = None;
            FilesChanged::Clear
        } else {
            FilesChanged::Debounce(self.generation)
        }
    }

    /// A quiet-period timer elapsed. Returns true when the request for
    /// this generation should be issued; false means the timer was
    /// superseded by a later file change.
    pub fn timer_elapsed(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.in_flight = Some(Pending {
            generation,
            edit_epoch: self.edit_epoch,
        });
        true
    }

    /// The user edited the concept text by hand.
    pub fn concept_edited(&mut self) {
        self.edit_epoch += 1;
    }

    /// A suggestion request completed. Returns true when its result should
    /// be applied to the concept field: the file set has not changed since,
    /// and the user has not edited the concept in the interim.
    pub fn request_finished(&mut self, generation: u64) -> bool {
        match self.in_flight {
            Some(pending) if pending.generation == generation => {
                self.in_flight = None;
                pending.generation == self.generation && pending.edit_epoch == self.edit_epoch
            }
            _ => false,
        }
    }

    /// Whether a request issued from the current state is outstanding.
    pub fn is_suggesting(&self) -> bool {
        self.in_flight.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_flight_over_rapid_changes() {
        // File-set changes at t=0, 100, 200 and 600 ms. Every timer except
        // the last is superseded before or when it fires; exactly one
        // request goes out, carrying the file set as of t=600.
        let mut debouncer = SuggestionDebouncer::new();

        let gen_a = match debouncer.files_changed(1) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        let gen_b = match debouncer.files_changed(2) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        let gen_c = match debouncer.files_changed(3) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        // t=500, 600: timers for the first two generations fire, stale.
        assert!(!debouncer.timer_elapsed(gen_a));
        assert!(!debouncer.timer_elapsed(gen_b));

        // t=600: fourth change supersedes generation c before its timer.
        let gen_d = match debouncer.files_changed(4) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        assert!(!debouncer.timer_elapsed(gen_c));

        // t=1100: the last timer fires; exactly one request goes out.
        assert!(debouncer.timer_elapsed(gen_d));
        assert!(debouncer.is_suggesting());
        assert!(debouncer.request_finished(gen_d));
        assert!(!debouncer.is_suggesting());
    }

    #[test]
    fn test_empty_set_clears_and_cancels() {
        let mut debouncer = SuggestionDebouncer::new();
        let generation = match debouncer.files_changed(2) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        assert!(debouncer.timer_elapsed(generation));

        // All files removed while the request is in flight.
        assert_eq!(debouncer.files_changed(0), FilesChanged::Clear);
        assert!(!debouncer.is_suggesting());

        // The late completion lands nowhere.
        assert!(!debouncer.request_finished(generation));
    }

    #[test]
    fn test_completion_after_new_change_is_discarded() {
        let mut debouncer = SuggestionDebouncer::new();
        let first = match debouncer.files_changed(1) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        assert!(debouncer.timer_elapsed(first));

        // New files picked while the first request is still in flight.
        let second = match debouncer.files_changed(2) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };

        assert!(!debouncer.request_finished(first));
        assert!(debouncer.timer_elapsed(second));
        assert!(debouncer.request_finished(second));
    }

    #[test]
    fn test_manual_edit_wins_over_late_suggestion() {
        let mut debouncer = SuggestionDebouncer::new();
        let generation = match debouncer.files_changed(1) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        assert!(debouncer.timer_elapsed(generation));

        // User types into the concept field while the request runs.
        debouncer.concept_edited();

        // The suggestion completes but must not overwrite the user's text.
        assert!(!debouncer.request_finished(generation));
        assert!(!debouncer.is_suggesting());
    }

    #[test]
    fn test_edit_before_request_does_not_block_it() {
        let mut debouncer = SuggestionDebouncer::new();
        debouncer.concept_edited();

        let generation = match debouncer.files_changed(1) {
            FilesChanged::Debounce(g) => g,
            other => panic!("unexpected {other:?}"),
        };
        assert!(debouncer.timer_elapsed(generation));
        assert!(debouncer.request_finished(generation));
    }
}

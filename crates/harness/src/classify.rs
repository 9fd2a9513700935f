//! Outcome classifier

use std::fmt;

use isoprobe_core::{ContentionKind, Error, Result};

/// What one race revealed about the database's isolation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceOutcome {
    /// Both paths finished and exactly one probe row exists
    CleanIsolation,
    /// Both paths finished and each inserted the row
    PhantomRead {
        /// Probe rows found, always more than one
        rows: i64,
    },
    /// A path was refused a lock; the table is not inspected
    LockContention {
        /// How the lock was refused
        kind: ContentionKind,
    },
}

impl RaceOutcome {
    /// Whether this outcome is a correct one for an isolated database
    pub fn is_isolated(&self) -> bool {
        !matches!(self, RaceOutcome::PhantomRead { .. })
    }
}

impl fmt::Display for RaceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceOutcome::CleanIsolation => f.write_str("clean isolation"),
            RaceOutcome::PhantomRead { rows } => write!(f, "phantom read ({} rows)", rows),
            RaceOutcome::LockContention { kind } => write!(f, "lock contention ({})", kind),
        }
    }
}

/// Classify the probe row count of a race that completed normally
///
/// # Errors
///
/// Returns `MissingRow` when no row survived; a completed race must leave one.
pub fn classify_rows(rows: i64) -> Result<RaceOutcome> {
    match rows {
        1 => Ok(RaceOutcome::CleanIsolation),
        n if n > 1 => Ok(RaceOutcome::PhantomRead { rows: n }),
        n => Err(Error::MissingRow { rows: n }),
    }
}

/// Classify the result of a race
///
/// `count` is only called when the race completed; a lock contention error
/// classifies without looking at the table. Other errors are returned.
pub fn classify<F>(race: Result<()>, count: F) -> Result<RaceOutcome>
where
    F: FnOnce() -> Result<i64>,
{
    match race {
        Ok(()) => classify_rows(count()?),
        Err(Error::LockContention { kind, .. }) => Ok(RaceOutcome::LockContention { kind }),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn kind_strategy() -> impl Strategy<Value = ContentionKind> {
        prop_oneof![
            Just(ContentionKind::Deadlock),
            Just(ContentionKind::LockWaitTimeout),
            Just(ContentionKind::Busy),
        ]
    }

    #[test]
    fn test_one_row_is_clean() {
        assert_eq!(classify(Ok(()), || Ok(1)).unwrap(), RaceOutcome::CleanIsolation);
    }

    #[test]
    fn test_two_rows_is_phantom() {
        let outcome = classify(Ok(()), || Ok(2)).unwrap();
        assert_eq!(outcome, RaceOutcome::PhantomRead { rows: 2 });
        assert!(!outcome.is_isolated());
        assert_eq!(outcome.to_string(), "phantom read (2 rows)");
    }

    #[test]
    fn test_zero_rows_is_fatal() {
        assert!(matches!(
            classify(Ok(()), || Ok(0)),
            Err(Error::MissingRow { rows: 0 })
        ));
    }

    #[test]
    fn test_contention_skips_count() {
        let race = Err(Error::contention(ContentionKind::Deadlock, "victim"));
        let outcome = classify(race, || panic!("table must not be inspected")).unwrap();
        assert_eq!(
            outcome,
            RaceOutcome::LockContention {
                kind: ContentionKind::Deadlock
            }
        );
        assert_eq!(outcome.to_string(), "lock contention (deadlock)");
    }

    #[test]
    fn test_other_errors_propagate() {
        let race = Err(Error::Interrupted("worker thread panicked".into()));
        assert!(matches!(
            classify(race, || Ok(1)),
            Err(Error::Interrupted(_))
        ));
        assert!(matches!(
            classify(Ok(()), || Err(Error::TableNotFound("t".into()))),
            Err(Error::TableNotFound(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_contention_wins_regardless_of_rows(kind in kind_strategy(), rows in -5i64..100) {
            let race = Err(Error::contention(kind, "refused"));
            prop_assert_eq!(
                classify(race, || Ok(rows)).unwrap(),
                RaceOutcome::LockContention { kind }
            );
        }

        #[test]
        fn prop_completed_race_classifies_by_count(rows in -5i64..100) {
            match classify(Ok(()), || Ok(rows)) {
                Ok(RaceOutcome::CleanIsolation) => prop_assert_eq!(rows, 1),
                Ok(RaceOutcome::PhantomRead { rows: n }) => {
                    prop_assert!(rows > 1);
                    prop_assert_eq!(n, rows);
                }
                Ok(RaceOutcome::LockContention { .. }) => prop_assert!(false, "no lock error was raised"),
                Err(Error::MissingRow { rows: n }) => {
                    prop_assert!(rows < 1);
                    prop_assert_eq!(n, rows);
                }
                Err(other) => prop_assert!(false, "unexpected error {}", other),
            }
        }
    }
}

//! Chronological ordering of dated records.
//!
//! Stock movements and cash entries carry a business date chosen by the user,
//! not a timestamp, so several records routinely share the same day. Ordering
//! is therefore by `(date, sequence)`, where `sequence` is the monotonic
//! insertion position assigned by the store. Among records with the same date
//! the one inserted last is the latest.

use chrono::NaiveDate;

/// A record positioned on a timeline by business date and insertion order.
pub trait Chronological {
    /// Business date of the record.
    fn date(&self) -> NaiveDate;

    /// Monotonic insertion sequence assigned by the store.
    fn sequence(&self) -> u64;

    /// Total ordering key: date first, insertion order second.
    fn chrono_key(&self) -> (NaiveDate, u64) {
        (self.date(), self.sequence())
    }
}

impl<T: Chronological + ?Sized> Chronological for &T {
    fn date(&self) -> NaiveDate {
        (**self).date()
    }

    fn sequence(&self) -> u64 {
        (**self).sequence()
    }
}

/// Sort records in place, oldest first.
///
/// The sort is stable, so records with identical keys keep their relative order.
pub fn sort_chronologically<T: Chronological>(records: &mut [T]) {
    records.sort_by_key(|r| r.chrono_key());
}

/// The most recent record, or `None` for an empty input.
///
/// On identical keys the last one yielded wins.
pub fn latest<T, I>(records: I) -> Option<T>
where
    T: Chronological,
    I: IntoIterator<Item = T>,
{
    records.into_iter().max_by_key(|r| r.chrono_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Rec {
        date: NaiveDate,
        seq: u64,
    }

    impl Chronological for Rec {
        fn date(&self) -> NaiveDate {
            self.date
        }

        fn sequence(&self) -> u64 {
            self.seq
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn latest_of_empty_is_none() {
        let recs: Vec<Rec> = Vec::new();
        assert!(latest(&recs).is_none());
    }

    #[test]
    fn same_date_is_resolved_by_insertion_order() {
        let recs = vec![
            Rec { date: day(5), seq: 2 },
            Rec { date: day(5), seq: 7 },
            Rec { date: day(4), seq: 9 },
        ];
        assert_eq!(latest(&recs), Some(&recs[1]));
    }

    #[test]
    fn later_date_beats_later_insertion() {
        let recs = vec![Rec { date: day(10), seq: 1 }, Rec { date: day(2), seq: 50 }];
        assert_eq!(latest(&recs).map(|r| r.seq), Some(1));
    }

    proptest! {
        #[test]
        fn sorted_output_is_non_decreasing(
            raw in prop::collection::vec((1u32..28, 0u64..100), 0..40)
        ) {
            let mut recs: Vec<Rec> = raw.into_iter().map(|(d, seq)| Rec { date: day(d), seq }).collect();
            sort_chronologically(&mut recs);
            for pair in recs.windows(2) {
                prop_assert!(pair[0].chrono_key() <= pair[1].chrono_key());
            }
        }

        #[test]
        fn latest_is_last_after_sorting(
            raw in prop::collection::vec((1u32..28, 0u64..100), 1..40)
        ) {
            let mut recs: Vec<Rec> = raw.into_iter().map(|(d, seq)| Rec { date: day(d), seq }).collect();
            let top = latest(&recs).map(|r| r.chrono_key());
            sort_chronologically(&mut recs);
            prop_assert_eq!(top, recs.last().map(|r| r.chrono_key()));
        }
    }
}

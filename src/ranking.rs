//! Tie-aware ranking of formula candidates.
//!
//! Candidates are stably sorted by a score cascade (primary kind first,
//! then tiebreakers). Ranks are then assigned per precursor-formula block:
//! the rank only advances when the precursor formula changes between two
//! adjacent sorted candidates, so adduct variants of the same precursor share
//! one rank.
//!
//! Everything here is pure; no shared state and no I/O.

use std::cmp::Ordering;

use crate::candidate::FormulaResult;
use crate::formula::MolecularFormula;
use crate::score::{FormulaScoring, ScoreKind, ScoreValue};

/// Anything that can be ranked.
pub trait Scored {
    /// The score set, if loaded. A missing set compares as all-NA.
    fn scoring(&self) -> Option<&FormulaScoring>;

    /// Grouping key for ties.
    fn precursor_formula(&self) -> &MolecularFormula;
}

impl Scored for FormulaResult {
    fn scoring(&self) -> Option<&FormulaScoring> {
        FormulaResult::scoring(self)
    }

    fn precursor_formula(&self) -> &MolecularFormula {
        self.id().precursor_formula()
    }
}

impl<T: Scored> Scored for &T {
    fn scoring(&self) -> Option<&FormulaScoring> {
        (**self).scoring()
    }

    fn precursor_formula(&self) -> &MolecularFormula {
        (**self).precursor_formula()
    }
}

/// A candidate together with its tie-aware rank (1 = best).
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    /// Tie-aware rank, starting at 1.
    pub rank: u32,
    /// The ranked candidate.
    pub candidate: T,
}

impl<T: Scored> Scored for Ranked<T> {
    fn scoring(&self) -> Option<&FormulaScoring> {
        self.candidate.scoring()
    }

    fn precursor_formula(&self) -> &MolecularFormula {
        self.candidate.precursor_formula()
    }
}

fn score_of<T: Scored>(candidate: &T, kind: ScoreKind) -> ScoreValue {
    candidate
        .scoring()
        .map_or(ScoreValue::NotAvailable, |s| s.get(kind))
}

/// Cascade comparator: `Less` means `a` ranks before `b`.
pub fn compare_by_cascade<T: Scored>(a: &T, b: &T, cascade: &[ScoreKind]) -> Ordering {
    for kind in cascade {
        let ord = score_of(a, *kind).cmp_best_first(&score_of(b, *kind));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Stable sort by `cascade`. Equal candidates keep their input order.
pub fn rank_by<T: Scored>(candidates: impl IntoIterator<Item = T>, cascade: &[ScoreKind]) -> Vec<T> {
    let mut sorted: Vec<T> = candidates.into_iter().collect();
    sorted.sort_by(|a, b| compare_by_cascade(a, b, cascade));
    sorted
}

/// Rank values for an already sorted sequence.
///
/// Starts at 1 and increments exactly when the precursor formula differs
/// from the previous candidate's.
pub fn assign_ranks<T: Scored>(sorted: &[T]) -> Vec<u32> {
    let mut ranks = Vec::with_capacity(sorted.len());
    let mut rank = 0u32;
    let mut previous: Option<&MolecularFormula> = None;
    for candidate in sorted {
        let key = candidate.precursor_formula();
        if previous != Some(key) {
            rank += 1;
        }
        previous = Some(key);
        ranks.push(rank);
    }
    ranks
}

/// Pairs an already sorted sequence with its ranks.
pub fn with_ranks<T: Scored>(sorted: Vec<T>) -> Vec<Ranked<T>> {
    let ranks = assign_ranks(&sorted);
    sorted
        .into_iter()
        .zip(ranks)
        .map(|(candidate, rank)| Ranked { rank, candidate })
        .collect()
}

/// The tie plateau at the top of a sorted sequence.
///
/// Returns the maximal prefix sharing the first candidate's precursor
/// formula, in sorted order. Never splits a precursor block and, for
/// non-empty input, always holds at least the first element.
pub fn extract_top_ties<T: Scored>(sorted: &[T]) -> &[T] {
    let Some(best) = sorted.first() else {
        return sorted;
    };
    let key = best.precursor_formula();
    let len = sorted
        .iter()
        .take_while(|c| c.precursor_formula() == key)
        .count();
    &sorted[..len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Cand {
        name: &'static str,
        pre: MolecularFormula,
        scoring: Option<FormulaScoring>,
    }

    impl Scored for Cand {
        fn scoring(&self) -> Option<&FormulaScoring> {
            self.scoring.as_ref()
        }

        fn precursor_formula(&self) -> &MolecularFormula {
            &self.pre
        }
    }

    fn cand(name: &'static str, pre: &str, score: Option<f64>) -> Cand {
        Cand {
            name,
            pre: MolecularFormula::parse(pre).unwrap(),
            scoring: score.map(|s| FormulaScoring::new().with(ScoreKind::Sirius, s)),
        }
    }

    fn names(v: &[Cand]) -> Vec<&'static str> {
        v.iter().map(|c| c.name).collect()
    }

    #[test]
    fn ties_share_rank_and_keep_input_order() {
        let input = vec![
            cand("C", "C5H10O5", Some(8.0)),
            cand("A", "C6H12O6", Some(10.0)),
            cand("B", "C6H12O6", Some(10.0)),
        ];
        let sorted = rank_by(input, &[ScoreKind::Sirius]);
        let got: Vec<_> = sorted.iter().map(|c| c.name).collect();
        assert_eq!(got, vec!["A", "B", "C"]);
        assert_eq!(assign_ranks(&sorted), vec![1, 1, 2]);

        let top = extract_top_ties(&sorted);
        assert_eq!(names(top), vec!["A", "B"]);
    }

    #[test]
    fn rank_increments_on_every_precursor_change() {
        let sorted = vec![
            cand("a", "C6H12O6", Some(9.0)),
            cand("b", "C5H10O5", Some(8.0)),
            cand("c", "C6H12O6", Some(7.0)),
            cand("d", "C6H12O6", Some(6.0)),
        ];
        assert_eq!(assign_ranks(&sorted), vec![1, 2, 3, 3]);
        let ranked = with_ranks(sorted);
        assert_eq!(ranked[3].rank, 3);
        assert_eq!(ranked[3].candidate.name, "d");
    }

    #[test]
    fn missing_scores_sort_last() {
        let input = vec![cand("none", "C2H6", None), cand("low", "CH4", Some(-50.0))];
        let sorted = rank_by(input, &[ScoreKind::Sirius]);
        assert_eq!(sorted[0].name, "low");
    }

    #[test]
    fn cascade_falls_through_on_equal_primary() {
        let mut a = cand("a", "CH4", None);
        a.scoring = Some(FormulaScoring::new().with(ScoreKind::Zodiac, 0.5).with(ScoreKind::Sirius, 1.0));
        let mut b = cand("b", "C2H6", None);
        b.scoring = Some(FormulaScoring::new().with(ScoreKind::Zodiac, 0.5).with(ScoreKind::Sirius, 2.0));
        let sorted = rank_by(vec![a, b], &[ScoreKind::Zodiac, ScoreKind::Sirius]);
        assert_eq!(sorted[0].name, "b");
    }

    #[test]
    fn top_ties_single_and_empty() {
        let empty: Vec<Cand> = Vec::new();
        assert!(extract_top_ties(&empty).is_empty());

        let one = vec![cand("x", "CH4", Some(1.0)), cand("y", "C2H6", Some(1.0))];
        let top = extract_top_ties(&one);
        assert_eq!(names(top), vec!["x"]);
    }

    #[test]
    fn top_ties_are_a_prefix_of_the_sorted_order() {
        let mut a = cand("a", "C6H12O6", None);
        a.scoring = Some(FormulaScoring::new().with(ScoreKind::TopCsi, 5.0).with(ScoreKind::Sirius, 1.0));
        let mut b = cand("b", "C6H12O6", None);
        b.scoring = Some(FormulaScoring::new().with(ScoreKind::TopCsi, 1.0).with(ScoreKind::Sirius, 2.0));
        let sorted = rank_by(
            vec![b, cand("c", "CH4", Some(9.0)), a],
            &[ScoreKind::TopCsi, ScoreKind::Sirius],
        );
        assert_eq!(names(&sorted), vec!["a", "b", "c"]);

        let top = extract_top_ties(&sorted);
        assert_eq!(names(top), vec!["a", "b"]);
        assert_eq!(top, &sorted[..top.len()]);
    }

    #[test]
    fn missing_primary_score_falls_through_to_next_kind() {
        let mut with_zodiac = cand("z", "CH4", None);
        with_zodiac.scoring = Some(FormulaScoring::new().with(ScoreKind::Zodiac, -100.0).with(ScoreKind::Sirius, 1.0));
        let no_zodiac_high = cand("h", "C2H6", Some(50.0));
        let no_zodiac_low = cand("l", "C3H8", Some(3.0));
        let cascade = [ScoreKind::Zodiac, ScoreKind::Sirius];

        assert_eq!(compare_by_cascade(&with_zodiac, &no_zodiac_high, &cascade), Ordering::Less);
        assert_eq!(compare_by_cascade(&no_zodiac_low, &no_zodiac_high, &cascade), Ordering::Greater);
    }
}

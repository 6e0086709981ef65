//! Partial-spec matcher — `does_parm_match` plus the priority-matrix
//! ambiguity reduction.

use itertools::Itertools;

use crate::data::{ScopeId, SymbolTable};

/// Sentinel larger than any real type-string length, used for an exact
/// (non-deduced) parameter match.
pub const EXACT_PRIORITY: i64 = 99_999;

/// Scores a single (concrete, candidate) parameter pair at 1-based
/// position `index`. `candidate` may contain the placeholder token
/// `$index`. Returns `None` on no match.
pub fn does_parm_match(
    concrete: &str,
    candidate: &str,
    index: usize,
    symbols: &SymbolTable,
    scope: Option<ScopeId>,
) -> Option<i64> {
    let placeholder = format!("${index}");
    let reduced = symbols.typedef_reduce(concrete, scope);
    let substitutions = candidate.matches(&placeholder).count();

    match substitutions {
        0 => {
            if reduced == candidate {
                Some(EXACT_PRIORITY)
            } else {
                None
            }
        }
        1 => {
            let deduced_prefix = candidate.replace(&placeholder, "");
            if reduced.starts_with(&deduced_prefix) {
                Some(deduced_prefix.len() as i64)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Scores a whole candidate's parameter list against the concrete argument
/// types. `None` if any parameter fails to match, or arities differ.
pub fn score_candidate(
    concrete_args: &[String],
    candidate_parm_types: &[String],
    symbols: &SymbolTable,
    scope: Option<ScopeId>,
) -> Option<Vec<i64>> {
    if concrete_args.len() != candidate_parm_types.len() {
        return None;
    }
    concrete_args
        .iter()
        .zip_eq(candidate_parm_types)
        .enumerate()
        .map(|(i, (concrete, candidate))| does_parm_match(concrete, candidate, i + 1, symbols, scope))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub chosen: Option<usize>,
    pub ambiguous_with: Vec<usize>,
}

/// `a` dominates `b` iff it's at least as good on every column and
/// strictly better on at least one — a partial order over priority rows.
fn dominates(a: &[i64], b: &[i64]) -> bool {
    a.iter().zip(b).all(|(x, y)| x >= y) && a.iter().zip(b).any(|(x, y)| x > y)
}

/// Reduces the `R x C` priority matrix: a row wins iff it's
/// column-best on every parameter. Multiple winners are reported as
/// ambiguous; the first by discovery order (array order) is chosen.
///
/// When no row is column-best on every parameter at once (each column's
/// max is held by a different row, as in `X<T1,double*>` vs `X<int*,T2>`
/// scored against `X<int*,double*>`), falls back to the Pareto frontier:
/// the rows no other row dominates on every column. That frontier is
/// never empty, and a frontier of two or more genuinely incomparable rows
/// is exactly the ambiguous case, not a silent pick of the first row.
pub fn select_best(rows: &[Vec<i64>]) -> MatchResult {
    if rows.is_empty() {
        return MatchResult {
            chosen: None,
            ambiguous_with: vec![],
        };
    }
    let cols = rows[0].len();
    let mut is_col_best = vec![vec![false; cols]; rows.len()];
    for c in 0..cols {
        let m = rows.iter().map(|r| r[c]).max().unwrap();
        for (r, row) in rows.iter().enumerate() {
            is_col_best[r][c] = row[c] == m;
        }
    }
    let mut winners: Vec<usize> = (0..rows.len())
        .filter(|&r| is_col_best[r].iter().all(|&b| b))
        .collect();

    if winners.is_empty() {
        winners = (0..rows.len())
            .filter(|&r| !(0..rows.len()).any(|other| other != r && dominates(&rows[other], &rows[r])))
            .collect();
    }

    match winners.len() {
        1 => MatchResult {
            chosen: Some(winners[0]),
            ambiguous_with: vec![],
        },
        _ => MatchResult {
            chosen: Some(winners[0]),
            ambiguous_with: winners[1..].to_vec(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_outranks_deduced() {
        let symbols = SymbolTable::new();
        let exact = does_parm_match("int", "int", 1, &symbols, None);
        assert_eq!(exact, Some(EXACT_PRIORITY));

        let deduced = does_parm_match("p.int", "p.$1", 1, &symbols, None);
        assert_eq!(deduced, Some("p.".len() as i64));
    }

    #[test]
    fn no_match_returns_none() {
        let symbols = SymbolTable::new();
        assert_eq!(does_parm_match("double", "int", 1, &symbols, None), None);
        assert_eq!(does_parm_match("int", "p.$1", 1, &symbols, None), None);
    }

    #[test]
    fn const_pointer_outranks_plain_pointer() {
        // S3: X<const int *> against candidates X<T*> and X<const T*>.
        let symbols = SymbolTable::new();
        let a = does_parm_match("p.q(const).int", "p.$1", 1, &symbols, None).unwrap();
        let b = does_parm_match("p.q(const).int", "q(const).p.$1", 1, &symbols, None).unwrap();
        assert!(b > a);
    }

    #[test]
    fn ambiguous_partials_report_all_but_choose_first() {
        // S4: X<int*, double*> against X<T1, double*> and X<int*, T2>.
        let symbols = SymbolTable::new();
        let concrete = vec!["p.int".to_string(), "p.double".to_string()];
        let row_a = score_candidate(&concrete, &["$1".to_string(), "p.double".to_string()], &symbols, None).unwrap();
        let row_b = score_candidate(&concrete, &["p.int".to_string(), "$2".to_string()], &symbols, None).unwrap();

        let result = select_best(&[row_a, row_b]);
        assert_eq!(result.chosen, Some(0));
        assert_eq!(result.ambiguous_with, vec![1]);
    }

    #[test]
    fn unique_winner_is_order_independent() {
        let symbols = SymbolTable::new();
        let concrete = vec!["p.q(const).int".to_string()];
        let row_exact_candidate =
            score_candidate(&concrete, &["q(const).p.$1".to_string()], &symbols, None).unwrap();
        let row_loose_candidate =
            score_candidate(&concrete, &["p.$1".to_string()], &symbols, None).unwrap();

        let forward = select_best(&[row_exact_candidate.clone(), row_loose_candidate.clone()]);
        let backward = select_best(&[row_loose_candidate, row_exact_candidate]);

        // whichever position it's in, the more-specialized row always wins
        assert!(forward.ambiguous_with.is_empty());
        assert!(backward.ambiguous_with.is_empty());
    }
}

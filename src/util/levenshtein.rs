//! Approximate substring alignment based on Levenshtein edit distance.
//!
//! The default matcher needs to know how well a short pattern occurs
//! *somewhere* inside a longer field value, and which characters of the value
//! took part in the match. That is the semi-global variant of the Levenshtein
//! recurrence: skipping text before and after the match is free, every other
//! edit costs one.

use std::cmp::min;

/// Result of aligning a pattern against the best-matching window of a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    /// Number of edits needed to turn the pattern into the text window.
    pub errors: usize,
    /// First text position (in chars) covered by the window.
    pub start: usize,
    /// One past the last text position covered by the window.
    pub end: usize,
    /// Text positions aligned to an identical pattern character, ascending.
    pub matched: Vec<usize>,
}

impl Alignment {
    /// Contiguous runs of matched text positions as inclusive `(start, end)` pairs.
    pub fn match_runs(&self) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut iter = self.matched.iter().copied();

        let Some(first) = iter.next() else {
            return runs;
        };

        let (mut run_start, mut run_end) = (first, first);
        for pos in iter {
            if pos == run_end + 1 {
                run_end = pos;
            } else {
                runs.push((run_start, run_end));
                run_start = pos;
                run_end = pos;
            }
        }
        runs.push((run_start, run_end));

        runs
    }
}

/// Align `pattern` against the best window of `text`.
///
/// Returns `None` for an empty pattern or when every window needs more than
/// `max_errors` edits. Among equally good windows the one ending first wins.
///
/// The forward pass keeps two rows only. The traceback reruns the recurrence
/// over the window ending at the best end, which is never longer than the
/// pattern plus the error count, so memory stays linear in the text length.
pub fn substring_alignment(pattern: &[char], text: &[char], max_errors: usize) -> Option<Alignment> {
    if pattern.is_empty() {
        return None;
    }

    let (end, errors) = best_end(pattern, text, max_errors)?;

    let window_start = end.saturating_sub(pattern.len() + errors);
    let window = &text[window_start..end];
    let matrix = edit_matrix(pattern, window);

    // Walk back from the window end, preferring diagonal steps.
    let mut matched = Vec::new();
    let (mut i, mut j) = (pattern.len(), window.len());
    while i > 0 {
        if j > 0 {
            let cost = usize::from(pattern[i - 1] != window[j - 1]);
            if matrix[i][j] == matrix[i - 1][j - 1] + cost {
                if cost == 0 {
                    matched.push(window_start + j - 1);
                }
                i -= 1;
                j -= 1;
                continue;
            }
            if matrix[i][j] == matrix[i][j - 1] + 1 {
                j -= 1;
                continue;
            }
        }
        i -= 1;
    }
    matched.reverse();

    Some(Alignment {
        errors,
        start: window_start + j,
        end,
        matched,
    })
}

/// Cheapest end position of `pattern` in `text` and its cost.
fn best_end(pattern: &[char], text: &[char], max_errors: usize) -> Option<(usize, usize)> {
    // Row 0 stays zero: the window may start anywhere in the text.
    let mut prev = vec![0usize; text.len() + 1];
    let mut curr = vec![0usize; text.len() + 1];

    for (i, &p) in pattern.iter().enumerate() {
        curr[0] = i + 1;
        let mut min_in_row = curr[0];

        for (j, &t) in text.iter().enumerate() {
            let cost = usize::from(p != t);
            curr[j + 1] = min(
                min(
                    prev[j + 1] + 1, // deletion
                    curr[j] + 1,     // insertion
                ),
                prev[j] + cost, // substitution
            );
            min_in_row = min(min_in_row, curr[j + 1]);
        }

        // Costs never decrease going down a column.
        if min_in_row > max_errors {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev.iter()
        .copied()
        .enumerate()
        .min_by_key(|&(j, cost)| (cost, j))
        .filter(|&(_, cost)| cost <= max_errors)
}

/// Full edit matrix of `pattern` against `window`, first column anchored.
fn edit_matrix(pattern: &[char], window: &[char]) -> Vec<Vec<usize>> {
    let mut matrix = vec![vec![0usize; window.len() + 1]; pattern.len() + 1];
    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }

    for i in 1..=pattern.len() {
        for j in 1..=window.len() {
            let cost = usize::from(pattern[i - 1] != window[j - 1]);
            matrix[i][j] = min(
                min(matrix[i - 1][j] + 1, matrix[i][j - 1] + 1),
                matrix[i - 1][j - 1] + cost,
            );
        }
    }

    matrix
}

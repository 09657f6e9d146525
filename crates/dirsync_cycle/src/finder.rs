//! Detection of a repeating unit at the tail of a sequence.

/// A unit found by [`find_repetitions`] and how often it repeats.
///
/// `sequence` repeated `repetitions` times reconstructs the analyzed slice
/// exactly. `repetitions == 1` means no repetition was found and
/// `sequence` is the whole input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatedSequence<'a, T> {
    /// The repeating unit, always a prefix of the analyzed slice.
    pub sequence: &'a [T],
    /// Number of back-to-back occurrences of `sequence`.
    pub repetitions: usize,
}

impl<'a, T> RepeatedSequence<'a, T> {
    /// Returns true if the unit occurs more than once.
    pub fn is_repeating(&self) -> bool {
        self.repetitions > 1
    }

    /// Returns the number of elements covered by all repetitions.
    pub fn covered_len(&self) -> usize {
        self.sequence.len() * self.repetitions
    }
}

/// Finds the repeating unit that makes up `list`, anchored at its first element.
///
/// Single greedy pass. The candidate unit starts as `[list[0]]`. Every
/// element that matches the candidate at the cursor advances the cursor,
/// and a fully matched candidate counts one more repetition. On a
/// mismatch, everything consumed so far (all full repetitions, the partial
/// match and the mismatching element) becomes the new candidate and the
/// count starts over, so a short unit preceded by unrelated elements is
/// not reported. A pass that ends in the middle of a repetition reports
/// the whole input with a single repetition.
///
/// ```
/// use dirsync_cycle::find_repetitions;
///
/// let found = find_repetitions(&['a', 'b', 'c', 'a', 'b', 'c']);
/// assert_eq!(found.sequence, &['a', 'b', 'c']);
/// assert_eq!(found.repetitions, 2);
///
/// let partial = find_repetitions(&['a', 'b', 'a']);
/// assert_eq!(partial.repetitions, 1);
/// assert_eq!(partial.sequence.len(), 3);
/// ```
pub fn find_repetitions<T: PartialEq>(list: &[T]) -> RepeatedSequence<'_, T> {
    if list.len() < 2 {
        return RepeatedSequence {
            sequence: list,
            repetitions: 1,
        };
    }

    // The candidate is always `list[..unit_len]`.
    let mut unit_len = 1;
    let mut repetitions = 1;
    let mut cursor = 0;

    for (position, element) in list.iter().enumerate().skip(1) {
        if *element == list[cursor] {
            cursor += 1;
            if cursor == unit_len {
                cursor = 0;
                repetitions += 1;
            }
        } else {
            unit_len = position + 1;
            repetitions = 1;
            cursor = 0;
        }
    }

    if cursor != 0 {
        return RepeatedSequence {
            sequence: list,
            repetitions: 1,
        };
    }

    RepeatedSequence {
        sequence: &list[..unit_len],
        repetitions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        let empty: [u8; 0] = [];
        let found = find_repetitions(&empty);
        assert_eq!(found.repetitions, 1);
        assert!(found.sequence.is_empty());
    }

    #[test]
    fn single_element() {
        let found = find_repetitions(&['a']);
        assert_eq!(found.repetitions, 1);
        assert_eq!(found.sequence, &['a']);
    }

    #[test]
    fn identical_elements() {
        let found = find_repetitions(&['a', 'a', 'a', 'a']);
        assert_eq!(found.sequence, &['a']);
        assert_eq!(found.repetitions, 4);
    }

    #[test]
    fn unit_of_three_repeated_four_times() {
        let list: Vec<char> = "abcabcabcabc".chars().collect();
        let found = find_repetitions(&list);
        assert_eq!(found.sequence, &['a', 'b', 'c']);
        assert_eq!(found.repetitions, 4);
        assert_eq!(found.covered_len(), list.len());
    }

    #[test]
    fn leading_noise_hides_repetition() {
        let list: Vec<char> = "xyabcabc".chars().collect();
        let found = find_repetitions(&list);
        assert_eq!(found.repetitions, 1);
        assert_eq!(found.sequence, list.as_slice());
    }

    #[test]
    fn incomplete_tail_is_not_a_repetition() {
        let list: Vec<char> = "abcabca".chars().collect();
        let found = find_repetitions(&list);
        assert_eq!(found.repetitions, 1);
        assert_eq!(found.sequence, list.as_slice());
        assert!(!found.is_repeating());
    }

    #[test]
    fn mismatch_folds_partial_match_into_unit() {
        // "aab" mismatches at 'b' after matching 'a' once; the unit becomes "aab".
        let list: Vec<char> = "aabaab".chars().collect();
        let found = find_repetitions(&list);
        assert_eq!(found.sequence, &['a', 'a', 'b']);
        assert_eq!(found.repetitions, 2);
    }

    #[test]
    fn mismatch_mid_unit_restarts_from_start() {
        // After "ab" + "a", 'c' mismatches 'b'; the unit grows to "abac".
        let list: Vec<char> = "abacabac".chars().collect();
        let found = find_repetitions(&list);
        assert_eq!(found.sequence, &['a', 'b', 'a', 'c']);
        assert_eq!(found.repetitions, 2);
    }

    #[test]
    fn no_repetition_at_all() {
        let list = [1, 2, 3, 4];
        let found = find_repetitions(&list);
        assert_eq!(found.repetitions, 1);
        assert_eq!(found.sequence, &list);
    }
}

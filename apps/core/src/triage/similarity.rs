//! Ratcliff/Obershelp similarity ratio.
//!
//! `ratio(a, b) = 2 * M / T` where `T` is the total number of chars in both
//! strings and `M` is the number of chars covered by the matching blocks. The
//! blocks are found by taking the longest common substring, then recursing on
//! the pieces to its left and to its right.

/// Similarity of two strings in `[0.0, 1.0]`, computed over chars.
///
/// The longest-match search prefers the earliest block in `a`, then the
/// earliest in `b`, so the result is fully deterministic. The ratio is not
/// guaranteed symmetric; callers pass the candidate first and the query second.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Sum of the sizes of all matching blocks.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common substring of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, len)`.
///
/// Ties resolve to the smallest `i`, then the smallest `j`.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    if alo >= ahi || blo >= bhi {
        return (best_i, best_j, best_k);
    }

    // prev[x] = length of the common run ending at a[i - 1], b[blo + x - 1]
    let width = bhi - blo + 1;
    let mut prev = vec![0usize; width];
    let mut cur = vec![0usize; width];

    for i in alo..ahi {
        for j in blo..bhi {
            let x = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[x - 1] + 1;
                cur[x] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            } else {
                cur[x] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    (best_i, best_j, best_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_identical_strings() {
        assert!(approx(ratio("chest pain", "chest pain"), 1.0));
    }

    #[test]
    fn test_disjoint_strings() {
        assert!(approx(ratio("abc", "xyz"), 0.0));
        assert!(approx(ratio("", "xyz"), 0.0));
    }

    #[test]
    fn test_missing_space() {
        // "chest" + "pain" match: 2 * 9 / 19
        assert!(approx(ratio("chest pain", "chestpain"), 18.0 / 19.0));
    }

    #[test]
    fn test_classic_reference_values() {
        // Well-known values of the Ratcliff/Obershelp measure
        assert!(approx(ratio("abcd", "bcde"), 0.75));
        assert!(approx(ratio("apple", "ape"), 0.75));
        assert!(approx(ratio("wrong", "wronge"), 10.0 / 11.0));
    }

    #[test]
    fn test_longest_block_beats_earlier_shorter_one() {
        // "ab" appears first in b, but the full "abc" block further right wins
        assert!(approx(ratio("abc", "abxabc"), 2.0 * 3.0 / 9.0));
    }

    #[test]
    fn test_blocks_on_both_sides_are_counted() {
        // "xx" anchors, then "a" on the left and "b" on the right
        assert!(approx(ratio("axxb", "a-xx-b"), 2.0 * 4.0 / 10.0));
    }

    #[test]
    fn test_bounded() {
        let pairs = [("headache", "head ache"), ("fever", "feverish chills"), ("a", "aaaa")];
        for (a, b) in pairs {
            let r = ratio(a, b);
            assert!((0.0..=1.0).contains(&r), "ratio({:?}, {:?}) = {}", a, b, r);
        }
    }
}

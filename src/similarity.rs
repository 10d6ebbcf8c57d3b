//! String similarity used for content resolution and note deduplication.

/// Normalized Levenshtein ratio between two strings.
///
/// Substitutions cost two edits (an insertion plus a deletion), so the ratio
/// is `1 - distance / (len(a) + len(b))`. Identical strings score `1.0`,
/// strings with no characters in common score `0.0`. Two empty strings are
/// identical.
///
/// # Examples
///
/// ```
/// use marginalia::similarity::ratio;
///
/// assert_eq!(ratio("abc", "abc"), 1.0);
/// assert_eq!(ratio("abc", "xyz"), 0.0);
/// assert!((ratio("kitten", "sitting") - 0.615).abs() < 0.001);
/// ```
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let common = longest_common_subsequence(&a, &b);
    (2 * common) as f64 / total as f64
}

/// Length of the longest common subsequence, using a single rolling row.
fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0usize; inner.len() + 1];

    for &oc in outer {
        let mut diagonal = 0;
        for (j, &ic) in inner.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if oc == ic {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[inner.len()]
}

/// Whether `candidate` is more similar than `threshold` to any of `lines`.
pub fn matches_any<S: AsRef<str>>(candidate: &str, lines: &[S], threshold: f64) -> bool {
    lines
        .iter()
        .any(|line| ratio(candidate, line.as_ref()) > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("same", "same"), 1.0);
        assert_eq!(ratio("", "something"), 0.0);
    }

    #[test]
    fn test_known_ratio() {
        // lcs("kitten", "sitting") = "ittn" -> 2 * 4 / 13
        assert!((ratio("kitten", "sitting") - 8.0 / 13.0).abs() < 1e-9);
        assert_eq!(ratio("ab", "ba"), 0.5);
    }

    #[test]
    fn test_symmetric() {
        let pairs = [("hello world", "hello there"), ("a", "abc"), ("résumé", "resume")];
        for (a, b) in pairs {
            assert_eq!(ratio(a, b), ratio(b, a));
        }
    }

    #[test]
    fn test_matches_any_is_strict() {
        let lines = ["> my lovely text", "unrelated"];
        assert!(matches_any("> my lovely text", &lines, 0.75));
        assert!(!matches_any("> my lovely text", &lines, 1.0));
        assert!(!matches_any("completely different", &lines, 0.75));
    }
}

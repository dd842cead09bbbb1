//! File name pattern matching for enumeration search expressions.
//!
//! On Windows this defers to `PrjFileNameMatch` so filtering agrees with
//! the collation ProjFS itself uses. Elsewhere a case-insensitive `*`/`?`
//! wildcard matcher stands in.

/// Match a file name against an enumeration search expression.
///
/// A `None` or empty expression matches everything.
pub fn file_name_match(name: &str, pattern: Option<&str>) -> bool {
    match pattern {
        None => true,
        Some(p) if p.is_empty() => true,
        Some(p) => match_impl(name, p),
    }
}

#[cfg(windows)]
fn match_impl(name: &str, pattern: &str) -> bool {
    use crate::util::wstr::string_to_wide;
    use windows::Win32::Storage::ProjectedFileSystem::PrjFileNameMatch;

    let name_wide: Vec<u16> = string_to_wide(name);
    let pattern_wide: Vec<u16> = string_to_wide(pattern);

    unsafe {
        PrjFileNameMatch(
            windows::core::PCWSTR::from_raw(name_wide.as_ptr()),
            windows::core::PCWSTR::from_raw(pattern_wide.as_ptr()),
        )
        .as_bool()
    }
}

#[cfg(not(windows))]
fn match_impl(name: &str, pattern: &str) -> bool {
    let name: Vec<char> = name.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    wildcard_match(&name, &pattern)
}

/// Iterative wildcard match with star backtracking.
#[cfg(not(windows))]
fn wildcard_match(name: &[char], pattern: &[char]) -> bool {
    let (mut n, mut p): (usize, usize) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            n += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pattern_matches_all() {
        assert!(file_name_match("anything.txt", None));
        assert!(file_name_match("anything.txt", Some("")));
    }

    #[cfg(not(windows))]
    mod fallback {
        use super::*;

        #[test]
        fn test_star_matches() {
            assert!(file_name_match("report.txt", Some("*")));
            assert!(file_name_match("report.txt", Some("*.txt")));
            assert!(file_name_match("report.txt", Some("re*")));
            assert!(!file_name_match("report.txt", Some("*.html")));
        }

        #[test]
        fn test_question_mark() {
            assert!(file_name_match("a.txt", Some("?.txt")));
            assert!(!file_name_match("ab.txt", Some("?.txt")));
        }

        #[test]
        fn test_case_insensitive() {
            assert!(file_name_match("README.md", Some("readme.*")));
        }

        #[test]
        fn test_literal() {
            assert!(file_name_match("raw.txt", Some("raw.txt")));
            assert!(!file_name_match("raw.txt", Some("type.txt")));
        }

        #[test]
        fn test_star_backtracking() {
            assert!(file_name_match("abcbcd", Some("a*bcd")));
            assert!(!file_name_match("abcbce", Some("a*bcd")));
        }
    }
}

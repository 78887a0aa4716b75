//! Folding of back and home tokens into an effective path

/// Collapses back and home tokens in a raw input path
///
/// The result is the effective path: the child indices that lead from the
/// root to the current cursor. A path that begins with a back or home token
/// normalizes to the empty path. The function is total and idempotent.
///
/// # Arguments
///
/// * path - Raw input tokens, oldest first
/// * back_symbol - Token meaning "go back one step"
/// * home_symbol - Token meaning "return to the root"
pub fn normalize(path: &[String], back_symbol: &str, home_symbol: &str) -> Vec<String> {
    match path.first() {
        Some(first) if first == back_symbol || first == home_symbol => return Vec::new(),
        _ => {}
    }
    let mut path: Vec<String> = path.to_vec();
    let mut index = 1;
    while index < path.len() {
        if path[index] == back_symbol {
            path.remove(index);
            path.remove(index - 1);
            index = if index > 1 { index - 1 } else { 1 };
        } else if path[index] == home_symbol {
            path.drain(..=index);
            index = 1;
        } else {
            index += 1;
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACK: &str = "0";
    const HOME: &str = "00";

    fn tokens(path: &[&str]) -> Vec<String> {
        path.iter().map(|token| token.to_string()).collect()
    }

    #[test]
    fn plain_path_is_untouched() {
        assert_eq!(
            normalize(&tokens(&["1", "2", "3"]), BACK, HOME),
            tokens(&["1", "2", "3"])
        );
        assert!(normalize(&[], BACK, HOME).is_empty());
    }

    #[test]
    fn back_removes_previous_token() {
        assert_eq!(normalize(&tokens(&["1", "0"]), BACK, HOME), tokens(&[]));
        assert_eq!(
            normalize(&tokens(&["1", "2", "0"]), BACK, HOME),
            tokens(&["1"])
        );
        assert_eq!(
            normalize(&tokens(&["1", "2", "0", "3"]), BACK, HOME),
            tokens(&["1", "3"])
        );
        assert_eq!(
            normalize(&tokens(&["1", "0", "2", "0"]), BACK, HOME),
            tokens(&[])
        );
    }

    #[test]
    fn home_drops_everything_before_it() {
        assert_eq!(normalize(&tokens(&["1", "2", "00"]), BACK, HOME), tokens(&[]));
        assert_eq!(
            normalize(&tokens(&["1", "00", "2"]), BACK, HOME),
            tokens(&["2"])
        );
        assert_eq!(
            normalize(&tokens(&["1", "2", "00", "3", "4"]), BACK, HOME),
            tokens(&["3", "4"])
        );
    }

    #[test]
    fn leading_navigation_token_empties_the_path() {
        assert_eq!(normalize(&tokens(&["0", "1"]), BACK, HOME), tokens(&[]));
        assert_eq!(normalize(&tokens(&["00"]), BACK, HOME), tokens(&[]));
    }

    #[test]
    fn idempotent() {
        for case in vec![
            vec!["1", "2", "0", "3"],
            vec!["1", "00", "2"],
            vec!["0"],
            vec!["1", "2", "3"],
            vec![],
        ] {
            let first = normalize(&tokens(&case), BACK, HOME);
            assert_eq!(normalize(&first, BACK, HOME), first);
        }
    }

    #[test]
    fn appending_back_removes_the_last_segment() {
        for case in vec![vec!["1", "2", "3"], vec!["1"], vec!["1", "2", "0"]] {
            let mut expected = normalize(&tokens(&case), BACK, HOME);
            expected.pop();
            let mut extended = tokens(&case);
            extended.push(BACK.to_string());
            assert_eq!(normalize(&extended, BACK, HOME), expected);
        }
    }

    #[test]
    fn appending_home_empties_the_path() {
        for case in vec![vec!["1", "2", "3"], vec!["1"], vec![]] {
            let mut extended = tokens(&case);
            extended.push(HOME.to_string());
            assert_eq!(normalize(&extended, BACK, HOME), tokens(&[]));
        }
    }
}

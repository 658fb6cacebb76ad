//! Alphanumeric string ordering.
//!
//! Runs of ASCII digits compare by numeric value, everything else compares
//! character-wise, so `"2_b"` sorts before `"10_a"`.

use std::cmp::Ordering;

fn chunk(s: &str) -> (&str, &str) {
    let Some(first) = s.chars().next() else {
        return ("", "");
    };
    let digits = first.is_ascii_digit();
    let end = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_digit() != digits)
        .map_or(s.len(), |(i, _)| i);
    s.split_at(end)
}

fn cmp_numeric(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Compares two strings chunk by chunk.
pub fn compare(a: &str, b: &str) -> Ordering {
    let (mut a, mut b) = (a, b);
    loop {
        match (a.is_empty(), b.is_empty()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }
        let (a_chunk, a_rest) = chunk(a);
        let (b_chunk, b_rest) = chunk(b);
        let a_num = a_chunk.starts_with(|c: char| c.is_ascii_digit());
        let b_num = b_chunk.starts_with(|c: char| c.is_ascii_digit());
        let ord = if a_num && b_num {
            cmp_numeric(a_chunk, b_chunk)
        } else {
            a_chunk.cmp(b_chunk)
        };
        if ord != Ordering::Equal {
            return ord;
        }
        a = a_rest;
        b = b_rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(compare("2_b", "10_a"), Ordering::Less);
        assert_eq!(compare("10_a", "9_z"), Ordering::Greater);
        assert_eq!(compare("sample7", "sample07"), Ordering::Less);
    }

    #[test]
    fn text_and_prefixes() {
        assert_eq!(compare("a", "b"), Ordering::Less);
        assert_eq!(compare("1_a", "1_a"), Ordering::Equal);
        assert_eq!(compare("1_a", "1_ab"), Ordering::Less);
        assert_eq!(compare("", "x"), Ordering::Less);
    }

    #[test]
    fn sorts_directory_names() {
        let mut names = vec!["10_x", "1_x", "2_x", "1_y"];
        names.sort_by(|a, b| compare(a, b));
        assert_eq!(names, vec!["1_x", "1_y", "2_x", "10_x"]);
    }
}

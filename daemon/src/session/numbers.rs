//! Spoken digit reading
//!
//! Numbers are spoken digit by digit ("one two" is 12), with `oh` as an
//! alias for zero.

fn digit(word: &str) -> Option<char> {
    let digit = match word {
        "zero" | "oh" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        _ => return None,
    };
    Some(digit)
}

pub fn is_number(word: &str) -> bool {
    digit(word).is_some()
}

/// Read digit words from `start`, returning the value and the index just
/// past the last digit. No digits reads as 0; values too large to hold
/// saturate at `i64::MAX`.
pub fn read_number<S: AsRef<str>>(words: &[S], start: usize) -> (i64, usize) {
    let mut value: i64 = 0;
    let mut end = start;
    while let Some(d) = words.get(end).and_then(|w| digit(w.as_ref())) {
        let d = i64::from(d as u8 - b'0');
        value = value.saturating_mul(10).saturating_add(d);
        end += 1;
    }
    (value, end)
}

/// Like [`read_number`], accepting a leading `minus` or `negative`
pub fn read_integer<S: AsRef<str>>(words: &[S], start: usize) -> (i64, usize) {
    let negative = matches!(
        words.get(start).map(|w| w.as_ref()),
        Some("minus") | Some("negative")
    );
    if negative {
        let (value, end) = read_number(words, start + 1);
        (-value, end)
    } else {
        read_number(words, start)
    }
}

/// The run of digit words at the end of the phrase, if any
pub fn read_trailing_number<S: AsRef<str>>(words: &[S]) -> Option<i64> {
    let last = words.iter().rposition(|w| is_number(w.as_ref()))?;
    let start = words[..last]
        .iter()
        .rposition(|w| !is_number(w.as_ref()))
        .map_or(0, |i| i + 1);
    Some(read_number(words, start).0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_number() {
        assert_eq!(read_number(&["go", "one", "oh", "five", "up"], 1), (105, 4));
        assert_eq!(read_number(&["go"], 0), (0, 0));
        assert_eq!(read_number(&["nine"], 3), (0, 3));
    }

    #[test]
    fn test_read_number_saturates() {
        let eleven = vec!["nine"; 11];
        assert_eq!(read_number(&eleven, 0), (99_999_999_999, 11));

        let many = vec!["nine"; 25];
        assert_eq!(read_number(&many, 0), (i64::MAX, 25));
        assert_eq!(read_trailing_number(&many), Some(i64::MAX));

        let mut negative = vec!["minus"];
        negative.extend(many);
        assert_eq!(read_integer(&negative, 0), (-i64::MAX, 26));
    }

    #[test]
    fn test_read_integer() {
        assert_eq!(read_integer(&["emit", "minus", "four", "two"], 1), (-42, 4));
        assert_eq!(read_integer(&["emit", "negative", "one"], 1), (-1, 3));
        assert_eq!(read_integer(&["emit", "seven"], 1), (7, 2));
    }

    #[test]
    fn test_read_trailing_number() {
        assert_eq!(read_trailing_number(&["repeat", "three", "four"]), Some(34));
        assert_eq!(read_trailing_number(&["one", "more", "two"]), Some(2));
        assert_eq!(read_trailing_number(&["eight", "times", "please"]), Some(8));
        assert_eq!(read_trailing_number(&["repeat"]), None);
        assert_eq!(read_trailing_number::<&str>(&[]), None);
    }
}

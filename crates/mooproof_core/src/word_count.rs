//! crates/mooproof_core/src/word_count.rs

/// Result of comparing a text against the configured word limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordCheck {
    Ok(u32),
    Exceeded { count: u32, max: u32 },
}

/// Counts whitespace-delimited words.
pub fn count_words(text: &str) -> u32 {
    text.split_whitespace().count() as u32
}

/// Checks `text` against `max_words`. A maximum of `0` disables the check.
pub fn check(text: &str, max_words: u32) -> WordCheck {
    let count = count_words(text);
    if max_words > 0 && count > max_words {
        WordCheck::Exceeded {
            count,
            max: max_words,
        }
    } else {
        WordCheck::Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_runs_between_any_whitespace() {
        assert_eq!(count_words("  one\ttwo\n\nthree  "), 3);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words(" \n\t "), 0);
    }

    #[test]
    fn over_the_limit_is_exceeded() {
        assert_eq!(
            check("one two three", 2),
            WordCheck::Exceeded { count: 3, max: 2 }
        );
        assert_eq!(check("one two", 2), WordCheck::Ok(2));
    }

    #[test]
    fn empty_text_is_fine() {
        assert_eq!(check("", 5), WordCheck::Ok(0));
    }

    #[test]
    fn zero_disables_the_limit() {
        let long = "word ".repeat(10_000);
        assert_eq!(check(&long, 0), WordCheck::Ok(10_000));
    }
}

//! Heuristic filter for degenerate recognition output.
//!
//! Speech models fed near-silence or music tend to emit looping text
//! ("thank you thank you thank you ...") or low-variety babble. Both
//! patterns are cheap to detect from word statistics alone.

/// Maximum allowed run of consecutive identical words.
const MAX_CONSECUTIVE_REPEATS: usize = 4;

/// Minimum ratio of unique words, checked only above this word count.
const UNIQUE_RATIO_MIN_WORDS: usize = 10;
const MIN_UNIQUE_RATIO: f32 = 0.4;

/// Returns true if the text looks like a recognition hallucination.
///
/// Two signals are checked: more than four consecutive identical words,
/// or a unique-word ratio below 0.4 over texts longer than ten words.
/// Comparison is case-insensitive and ignores trailing punctuation.
pub fn is_hallucination(text: &str) -> bool {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| c.is_ascii_punctuation())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return false;
    }

    let mut run = 1usize;
    for pair in words.windows(2) {
        if pair[0] == pair[1] {
            run += 1;
            if run > MAX_CONSECUTIVE_REPEATS {
                return true;
            }
        } else {
            run = 1;
        }
    }

    if words.len() > UNIQUE_RATIO_MIN_WORDS {
        let mut unique: Vec<&str> = words.iter().map(|w| w.as_str()).collect();
        unique.sort_unstable();
        unique.dedup();
        let ratio = unique.len() as f32 / words.len() as f32;
        if ratio < MIN_UNIQUE_RATIO {
            return true;
        }
    }

    false
}

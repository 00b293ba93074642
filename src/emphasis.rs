use rand::Rng;

/// A word split around its emphasized letter, ready for styled rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmphasizedWord {
    pub before: String,
    pub letter: String,
    pub after: String,
}

impl EmphasizedWord {
    /// Reassemble the original word.
    pub fn word(&self) -> String {
        format!("{}{}{}", self.before, self.letter, self.after)
    }
}

/// Pick the emphasized letter for `word` with the process-wide RNG.
pub fn emphasize(word: &str) -> EmphasizedWord {
    emphasize_with(word, &mut rand::thread_rng())
}

/// Split `word` around a letter drawn from a window centered on its middle.
///
/// A single trailing period is excluded from the span used to place the
/// window, so it does not pull the chosen letter toward the end of the word;
/// it still lands in `after` in the output. The window's upper bound is
/// clamped to the full word length, not the trimmed one.
pub fn emphasize_with<R: Rng>(word: &str, rng: &mut R) -> EmphasizedWord {
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return EmphasizedWord::default();
    }

    let effective_len = if chars[chars.len() - 1] == '.' {
        chars.len() - 1
    } else {
        chars.len()
    };

    let center = effective_len / 2;
    let range = effective_len / 4;
    let start = center.saturating_sub(range);
    let end = (center + range).min(chars.len() - 1);

    let index = rng.gen_range(start..=end);

    EmphasizedWord {
        before: chars[..index].iter().collect(),
        letter: chars[index].to_string(),
        after: chars[index + 1..].iter().collect(),
    }
}

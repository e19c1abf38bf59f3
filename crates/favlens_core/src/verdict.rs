/// Token the model is told to answer with when the images match.
pub const AFFIRMATIVE_TOKEN: &str = "Yes";
/// Token the model is told to answer with otherwise.
pub const NEGATIVE_TOKEN: &str = "No";

/// Instruction sent alongside the two images.
pub fn compare_prompt() -> String {
    format!(
        "Compare these two favicons. Respond only with {AFFIRMATIVE_TOKEN} if visually \
identical or same brand/logo, otherwise {NEGATIVE_TOKEN}."
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonVerdict {
    pub is_match: bool,
}

/// How the reassembled model answer is turned into a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The answer contains the affirmative token anywhere (case-sensitive).
    #[default]
    Substring,
    /// The whole answer, trimmed and without trailing punctuation, is the
    /// affirmative token.
    Strict,
}

pub fn classify(answer: &str, mode: MatchMode) -> ComparisonVerdict {
    let is_match = match mode {
        MatchMode::Substring => answer.contains(AFFIRMATIVE_TOKEN),
        MatchMode::Strict => {
            answer
                .trim()
                .trim_end_matches(|c: char| c.is_ascii_punctuation())
                .trim_end()
                == AFFIRMATIVE_TOKEN
        }
    };
    ComparisonVerdict { is_match }
}

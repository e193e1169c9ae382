//! Effect-code parsing.
//!
//! Grammar, left to right:
//!
//! ```text
//! [RA] BASE [{first}] [L{value}]... [-TLP]
//! ```
//!
//! - `RA`: roll-again prefix
//! - `BASE`: everything before the first `{` (a 3-letter code when well formed)
//! - `{first}`: the first unlettered token group
//! - `L{value}`: token group keyed by one uppercase letter
//! - `-TLP`: three digits, tier / level / progression rate
//!
//! The suffix is stripped first, then the prefix, then base and tokens are
//! split. Parsing never fails: malformed input yields an empty or unknown
//! base, which dispatch reports as "no handler".

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::base::BaseCode;
use super::value::Scaling;

/// Roll-again prefix.
pub const ROLL_AGAIN_PREFIX: &str = "RA";

/// Structured form of an effect code.
///
/// Created fresh per parse and never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEffect {
    base: String,
    first_value: Option<String>,
    token_values: FxHashMap<char, String>,
    scaling: Scaling,
    roll_again: bool,
}

impl ParsedEffect {
    /// Parse an effect code.
    ///
    /// ```
    /// use spell_battle::effects::ParsedEffect;
    ///
    /// let parsed = ParsedEffect::parse("RAGUA{R3}T{2}D{1}-323");
    /// assert!(parsed.roll_again());
    /// assert_eq!(parsed.base(), "GUA");
    /// assert_eq!(parsed.first_value(), Some("R3"));
    /// assert_eq!(parsed.token('T'), Some("2"));
    /// assert_eq!(parsed.token('D'), Some("1"));
    /// assert_eq!(parsed.tier(), Some(3));
    /// assert_eq!(parsed.level(), Some(2));
    /// assert_eq!(parsed.progression_rate(), Some(3));
    /// ```
    #[must_use]
    pub fn parse(code: &str) -> Self {
        let (body, scaling) = split_scaling_suffix(code);

        let (body, roll_again) = match body.strip_prefix(ROLL_AGAIN_PREFIX) {
            Some(rest) => (rest, true),
            None => (body, false),
        };

        let (base, remainder) = match body.find('{') {
            Some(brace) => body.split_at(brace),
            None => (body, ""),
        };

        let mut first_value = None;
        let mut token_values = FxHashMap::default();

        for group in TokenGroups::new(remainder) {
            match group.letter {
                Some(letter) => {
                    token_values.insert(letter, group.raw.to_string());
                }
                None if first_value.is_none() => first_value = Some(group.raw.to_string()),
                None => {}
            }
        }

        Self {
            base: base.to_string(),
            first_value,
            token_values,
            scaling,
            roll_again,
        }
    }

    /// Base text as written (may be empty or unrecognized).
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The recognized base code, if any.
    #[must_use]
    pub fn base_code(&self) -> Option<BaseCode> {
        BaseCode::from_code(&self.base)
    }

    /// The leading unlettered token.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.first_value.as_deref()
    }

    /// Raw token for a letter.
    #[must_use]
    pub fn token(&self, letter: char) -> Option<&str> {
        self.token_values.get(&letter).map(String::as_str)
    }

    /// All lettered tokens.
    #[must_use]
    pub fn token_values(&self) -> &FxHashMap<char, String> {
        &self.token_values
    }

    /// Scaling metadata from the suffix.
    #[must_use]
    pub fn scaling(&self) -> Scaling {
        self.scaling
    }

    #[must_use]
    pub fn tier(&self) -> Option<u8> {
        self.scaling.tier
    }

    #[must_use]
    pub fn level(&self) -> Option<u8> {
        self.scaling.level
    }

    #[must_use]
    pub fn progression_rate(&self) -> Option<u8> {
        self.scaling.progression_rate
    }

    /// Whether the `RA` prefix was present.
    #[must_use]
    pub fn roll_again(&self) -> bool {
        self.roll_again
    }
}

/// Parse an effect code. Shorthand for [`ParsedEffect::parse`].
#[must_use]
pub fn parse(code: &str) -> ParsedEffect {
    ParsedEffect::parse(code)
}

impl std::fmt::Display for ParsedEffect {
    /// Renders the canonical code: lettered tokens in alphabetical order.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.roll_again {
            f.write_str(ROLL_AGAIN_PREFIX)?;
        }
        f.write_str(&self.base)?;
        if let Some(first) = &self.first_value {
            write!(f, "{{{}}}", first)?;
        }

        let mut letters: Vec<_> = self.token_values.keys().copied().collect();
        letters.sort_unstable();
        for letter in letters {
            write!(f, "{}{{{}}}", letter, self.token_values[&letter])?;
        }

        if let Scaling {
            tier: Some(t),
            level: Some(l),
            progression_rate: Some(p),
        } = self.scaling
        {
            write!(f, "-{}{}{}", t, l, p)?;
        }
        Ok(())
    }
}

/// Split a trailing `-DDD` suffix off the code.
fn split_scaling_suffix(code: &str) -> (&str, Scaling) {
    let bytes = code.as_bytes();
    if let [.., b'-', t, l, p] = bytes {
        if t.is_ascii_digit() && l.is_ascii_digit() && p.is_ascii_digit() {
            let scaling = Scaling::new(t - b'0', l - b'0', p - b'0');
            return (&code[..code.len() - 4], scaling);
        }
    }
    (code, Scaling::default())
}

/// One `[L]{raw}` group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TokenGroup<'a> {
    letter: Option<char>,
    raw: &'a str,
}

/// Left-to-right scan for token groups.
///
/// A letter counts only when it directly precedes `{` and was not
/// consumed by the previous group. `raw` runs to the next `}` and may
/// contain `{`. An unterminated group ends the scan.
struct TokenGroups<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> TokenGroups<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }
}

impl<'a> Iterator for TokenGroups<'a> {
    type Item = TokenGroup<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let open = self.cursor + self.text[self.cursor..].find('{')?;
        let close = open + 1 + self.text[open + 1..].find('}')?;

        let letter = self.text[self.cursor..open]
            .chars()
            .next_back()
            .filter(char::is_ascii_uppercase);
        let raw = &self.text[open + 1..close];

        self.cursor = close + 1;
        Some(TokenGroup { letter, raw })
    }
}

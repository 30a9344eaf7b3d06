//! Compound sentiment scoring.
//!
//! [`LexiconScorer`] is a rule-based valence scorer in the style of VADER:
//! each word carries a signed valence from a lexicon, adjusted by nearby
//! intensity boosters, negations, a contrastive "but", all-caps emphasis,
//! and trailing punctuation, then squashed into `[-1, 1]`.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::SentimentError;

/// Embedded default lexicon.
const DEFAULT_LEXICON_TOML: &str = include_str!("../config/lexicon.toml");

/// Valence added to an all-caps word when the text mixes cases.
const CAPS_INCREMENT: f64 = 0.733;

/// Multiplier applied to a valence preceded by a negation.
const NEGATION_SCALAR: f64 = -0.74;

/// Normalization constant in `x / sqrt(x^2 + alpha)`.
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Emphasis added per exclamation mark, up to four.
const EXCLAMATION_INCREMENT: f64 = 0.292;

/// Emphasis added per question mark when there are two or three.
const QUESTION_INCREMENT: f64 = 0.18;

/// Emphasis cap for four or more question marks.
const QUESTION_CAP: f64 = 0.96;

/// Anything that turns review text into a compound score in `[-1, 1]`.
pub trait SentimentScorer {
    /// Scores `text`.
    fn score(&self, text: &str) -> f64;
}

impl<F> SentimentScorer for F
where
    F: Fn(&str) -> f64,
{
    fn score(&self, text: &str) -> f64 {
        self(text)
    }
}

/// Lexicon as written in TOML.
#[derive(Debug, Deserialize)]
struct LexiconDefinition {
    #[serde(default)]
    negations: Vec<String>,
    #[serde(default)]
    boosters: BTreeMap<String, f64>,
    valence: BTreeMap<String, f64>,
}

/// Rule-based valence-lexicon scorer.
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    valence: BTreeMap<String, f64>,
    boosters: BTreeMap<String, f64>,
    negations: BTreeSet<String>,
}

impl LexiconScorer {
    /// Parses a lexicon from TOML with a `[valence]` table, an optional
    /// `[boosters]` table, and an optional `negations` array.
    ///
    /// # Errors
    ///
    /// Returns [`SentimentError::Toml`] if the document is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, SentimentError> {
        let def: LexiconDefinition = toml::de::from_str(toml_str)?;
        Ok(Self {
            valence: lowercase_keys(def.valence),
            boosters: lowercase_keys(def.boosters),
            negations: def.negations.iter().map(|n| n.to_lowercase()).collect(),
        })
    }

    /// The built-in review lexicon.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded lexicon is invalid.
    pub fn embedded() -> Result<Self, SentimentError> {
        Self::from_toml(DEFAULT_LEXICON_TOML)
    }

    /// Number of words with a valence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.valence.len()
    }

    /// Whether the lexicon has no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valence.is_empty()
    }

    fn in_lexicon(&self, word: &str) -> bool {
        self.valence.contains_key(&word.to_lowercase())
    }

    fn is_negation(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        self.negations.contains(&lower) || lower.contains("n't")
    }

    /// Booster adjustment contributed by `word` to a following valence.
    fn booster_scalar(&self, word: &str, valence: f64, caps_differ: bool) -> f64 {
        let Some(&base) = self.boosters.get(&word.to_lowercase()) else {
            return 0.0;
        };
        let mut scalar = if valence < 0.0 { -base } else { base };
        if caps_differ && is_all_caps(word) {
            scalar += if valence > 0.0 {
                CAPS_INCREMENT
            } else {
                -CAPS_INCREMENT
            };
        }
        scalar
    }

    /// Valence of the word at `i`, after caps, booster, and negation
    /// adjustments from up to three preceding words.
    fn word_valence(&self, words: &[&str], i: usize, caps_differ: bool) -> f64 {
        let word = words[i];
        let lower = word.to_lowercase();
        let Some(&base) = self.valence.get(&lower) else {
            return 0.0;
        };

        let mut valence = base;

        // "no" directly before a lexicon word is a determiner, not a
        // sentiment of its own.
        if lower == "no" && words.get(i + 1).is_some_and(|next| self.in_lexicon(next)) {
            valence = 0.0;
        }
        let preceded_by_no = (1..=2).any(|back| {
            i >= back && words[i - back].eq_ignore_ascii_case("no")
        });
        if preceded_by_no {
            valence = base * NEGATION_SCALAR;
        }

        if caps_differ && is_all_caps(word) {
            valence += if valence > 0.0 {
                CAPS_INCREMENT
            } else {
                -CAPS_INCREMENT
            };
        }

        for back in 1..=3 {
            if i < back {
                break;
            }
            let prev = words[i - back];
            if self.in_lexicon(prev) {
                continue;
            }

            let mut scalar = self.booster_scalar(prev, valence, caps_differ);
            match back {
                2 => scalar *= 0.95,
                3 => scalar *= 0.9,
                _ => {}
            }
            valence += scalar;

            if self.is_negation(prev) && !is_never_so(words, i, back) {
                valence *= NEGATION_SCALAR;
            } else if is_never_so(words, i, back) {
                valence *= 1.25;
            }
        }

        if i >= 1 && words[i - 1].eq_ignore_ascii_case("least") {
            let at_least = i >= 2
                && (words[i - 2].eq_ignore_ascii_case("at")
                    || words[i - 2].eq_ignore_ascii_case("very"));
            if !at_least {
                valence *= NEGATION_SCALAR;
            }
        }

        valence
    }
}

impl SentimentScorer for LexiconScorer {
    fn score(&self, text: &str) -> f64 {
        let words: Vec<&str> = text.split_whitespace().map(strip_punctuation).collect();
        if words.is_empty() {
            return 0.0;
        }
        let caps_differ = caps_differ(&words);

        let mut sentiments: Vec<f64> = (0..words.len())
            .map(|i| {
                let lower = words[i].to_lowercase();
                let kind_of = lower == "kind"
                    && words
                        .get(i + 1)
                        .is_some_and(|next| next.eq_ignore_ascii_case("of"));
                if self.boosters.contains_key(&lower) || kind_of {
                    0.0
                } else {
                    self.word_valence(&words, i, caps_differ)
                }
            })
            .collect();

        if let Some(but) = words.iter().position(|w| w.eq_ignore_ascii_case("but")) {
            for (idx, s) in sentiments.iter_mut().enumerate() {
                if idx < but {
                    *s *= 0.5;
                } else if idx > but {
                    *s *= 1.5;
                }
            }
        }

        let mut total: f64 = sentiments.iter().sum();
        let emphasis = punctuation_emphasis(text);
        if total > 0.0 {
            total += emphasis;
        } else if total < 0.0 {
            total -= emphasis;
        }

        normalize(total)
    }
}

/// Squashes an unbounded valence sum into `[-1, 1]`.
#[must_use]
pub fn normalize(total: f64) -> f64 {
    let norm = total / total.mul_add(total, NORMALIZATION_ALPHA).sqrt();
    norm.clamp(-1.0, 1.0)
}

/// "never so good" and "never this good" intensify rather than negate.
fn is_never_so(words: &[&str], i: usize, back: usize) -> bool {
    back >= 2
        && words[i - back].eq_ignore_ascii_case("never")
        && words[i - back + 1..i]
            .iter()
            .any(|w| w.eq_ignore_ascii_case("so") || w.eq_ignore_ascii_case("this"))
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4);
    let questions = text.matches('?').count();

    #[allow(clippy::cast_precision_loss)]
    let exclamation = exclamations as f64 * EXCLAMATION_INCREMENT;
    #[allow(clippy::cast_precision_loss)]
    let question = match questions {
        0 | 1 => 0.0,
        2 | 3 => questions as f64 * QUESTION_INCREMENT,
        _ => QUESTION_CAP,
    };

    exclamation + question
}

/// Strips surrounding punctuation unless that would leave two characters
/// or fewer, so emoticons like `:)` survive.
fn strip_punctuation(token: &str) -> &str {
    let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
    if stripped.chars().count() <= 2 {
        token
    } else {
        stripped
    }
}

/// Has at least one cased character and no lowercase ones.
fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

/// Some, but not all, words are in all caps.
fn caps_differ(words: &[&str]) -> bool {
    let caps = words.iter().filter(|w| is_all_caps(w)).count();
    caps > 0 && caps < words.len()
}

fn lowercase_keys(map: BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    map.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect()
}

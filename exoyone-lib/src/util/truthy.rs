use crate::error::{ExoyOneError, Result};

/// Words accepted wherever the device expects a 1/0 flag.
pub const TRUTHY_FALSY_WORDS: &[(&str, i64)] = &[
    ("true", 1),
    ("false", 0),
    ("on", 1),
    ("off", 0),
    ("left", 1),
    ("right", 0),
    ("clockwise", 1),
    ("counterclockwise", 0),
    ("anticlockwise", 0),
    ("yes", 1),
    ("no", 0),
    ("in", 1),
    ("out", 0),
    ("up", 1),
    ("down", 0),
    ("forward", 1),
    ("backward", 0),
    ("open", 1),
    ("close", 0),
];

/// Case-insensitive vocabulary lookup.
pub fn word_value(word: &str) -> Option<i64> {
    TRUTHY_FALSY_WORDS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(word))
        .map(|(_, value)| *value)
}

/// Boolean-ish input for the toggle commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Switch {
    Int(i64),
    Word(String),
}

impl Switch {
    /// Integers pass through unchanged, words go through the vocabulary.
    pub fn to_wire(&self) -> Result<i64> {
        match self {
            Switch::Int(value) => Ok(*value),
            Switch::Word(word) => word_value(word)
                .ok_or_else(|| ExoyOneError::Validation(format!("Invalid value: {}", word))),
        }
    }
}

impl From<bool> for Switch {
    fn from(value: bool) -> Self {
        Switch::Int(i64::from(value))
    }
}

impl From<i64> for Switch {
    fn from(value: i64) -> Self {
        Switch::Int(value)
    }
}

impl From<i32> for Switch {
    fn from(value: i32) -> Self {
        Switch::Int(i64::from(value))
    }
}

impl From<&str> for Switch {
    fn from(word: &str) -> Self {
        Switch::Word(word.to_string())
    }
}

impl From<String> for Switch {
    fn from(word: String) -> Self {
        Switch::Word(word)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("on", 1)]
    #[case("OFF", 0)]
    #[case("Left", 1)]
    #[case("right", 0)]
    #[case("CounterClockwise", 0)]
    #[case("yes", 1)]
    #[case("close", 0)]
    fn test_words_map_to_flags(#[case] word: &str, #[case] expected: i64) {
        assert_eq!(Switch::from(word).to_wire().unwrap(), expected);
    }

    #[rstest]
    #[case(Switch::from(true), 1)]
    #[case(Switch::from(false), 0)]
    #[case(Switch::from(0_i64), 0)]
    #[case(Switch::from(7_i64), 7)]
    fn test_integers_pass_through(#[case] input: Switch, #[case] expected: i64) {
        assert_eq!(input.to_wire().unwrap(), expected);
    }

    #[test]
    fn test_unknown_word_is_rejected() {
        assert_matches!(
            Switch::from("east").to_wire(),
            Err(ExoyOneError::Validation(message)) if message.contains("east")
        );
        assert_eq!(word_value(""), None);
    }
}

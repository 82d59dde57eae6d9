//! Line tokenizer.
//!
//! A line becomes a sequence of typed tokens. Joining the tokens reproduces
//! the line byte-for-byte, so rewriting is a list splice instead of string
//! position arithmetic.

/// One piece of a tokenized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Whitespace-delimited run of text.
    Word(String),
    /// Run of whitespace.
    Space(String),
    /// Text that no later pass may interpret (e.g., an abandoned paste).
    Frozen(String),
    /// Placeholder for the rendered fragment of directive `n`.
    Slot(usize),
}

impl Token {
    /// Text of a word token.
    #[must_use]
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(word) => Some(word),
            _ => None,
        }
    }
}

/// Split `line` into alternating word and whitespace tokens.
#[must_use]
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space = None;

    for (index, ch) in line.char_indices() {
        let is_space = ch.is_whitespace();
        match in_space {
            Some(previous) if previous != is_space => {
                tokens.push(make(&line[start..index], previous));
                start = index;
            }
            _ => {}
        }
        in_space = Some(is_space);
    }
    if let Some(is_space) = in_space {
        tokens.push(make(&line[start..], is_space));
    }
    tokens
}

fn make(text: &str, is_space: bool) -> Token {
    if is_space {
        Token::Space(text.to_owned())
    } else {
        Token::Word(text.to_owned())
    }
}

/// Join tokens back into text, rendering slots with `slot`.
pub fn join(tokens: &[Token], slot: impl Fn(usize) -> String) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Word(text) | Token::Space(text) | Token::Frozen(text) => out.push_str(text),
            Token::Slot(index) => out.push_str(&slot(*index)),
        }
    }
    out
}

/// Index of the first word after `index`, skipping whitespace.
///
/// Returns `None` if the next non-space token is not a word.
#[must_use]
pub fn next_word(tokens: &[Token], index: usize) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .skip(index + 1)
        .find(|(_, token)| !matches!(token, Token::Space(_)))
        .and_then(|(next, token)| token.as_word().map(|_| next))
}

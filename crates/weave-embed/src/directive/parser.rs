//! Paste splicing and directive extraction over token sequences.

use std::future::Future;

use super::tokenizer::{Token, join, next_word};
use super::{Directive, DirectiveKind};
use crate::resolver::REFERENCE_TERMINATOR;

/// Split a target word at its `<` terminator.
///
/// Returns the reference and, if terminated, the text after the `<`.
#[must_use]
pub fn split_target(word: &str) -> (&str, Option<&str>) {
    match word.split_once(REFERENCE_TERMINATOR) {
        Some((target, trailing)) => (target, Some(trailing)),
        None => (word, None),
    }
}

/// Splice pasted content into the token stream.
///
/// Scans right to left for words ending in `!!!paste`. Each marker word and
/// its target word are replaced by the words of the target's content (loaded
/// through `load`), with the text fused before the marker prepended to the
/// first word and the text after a `<` appended to the last. Pasted content
/// may contain further pastes, which the next pass picks up.
///
/// Runs at most `passes` passes, stopping early once a pass finds nothing.
/// A target that fails to load freezes its marker and target verbatim.
///
/// Returns the number of splices performed.
pub async fn paste_phase<F, Fut>(tokens: &mut Vec<Token>, passes: u32, mut load: F) -> usize
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Option<String>>,
{
    let mut spliced = 0;

    for _ in 0..passes {
        let mut found = false;
        let mut index = tokens.len();

        while index > 0 {
            index -= 1;
            let Some((prefix, DirectiveKind::Paste)) = tokens[index]
                .as_word()
                .and_then(DirectiveKind::split_marker)
            else {
                continue;
            };
            let Some(target_index) = next_word(tokens, index) else {
                continue;
            };
            found = true;

            let prefix = prefix.to_owned();
            let target_word = tokens[target_index].as_word().unwrap_or_default().to_owned();
            let (target, trailing) = split_target(&target_word);

            if let Some(content) = load(target.to_owned()).await {
                let words = pasted_words(&prefix, &content, trailing.unwrap_or_default());
                tokens.splice(index..=target_index, words);
                spliced += 1;
            } else {
                freeze(&mut tokens[index..=target_index]);
            }
        }

        if !found {
            break;
        }
    }

    spliced
}

fn pasted_words(prefix: &str, content: &str, trailing: &str) -> Vec<Token> {
    let words: Vec<&str> = content.split_whitespace().collect();
    if words.is_empty() {
        return vec![Token::Word(format!("{prefix}{trailing}"))];
    }

    let last = words.len() - 1;
    let mut tokens = Vec::with_capacity(words.len() * 2);
    for (index, word) in words.into_iter().enumerate() {
        if index > 0 {
            tokens.push(Token::Space(" ".to_owned()));
        }
        let mut text = String::new();
        if index == 0 {
            text.push_str(prefix);
        }
        text.push_str(word);
        if index == last {
            text.push_str(trailing);
        }
        tokens.push(Token::Word(text));
    }
    tokens
}

fn freeze(tokens: &mut [Token]) {
    for token in tokens {
        if let Token::Word(word) = token {
            let text = std::mem::take(word);
            *token = Token::Frozen(text);
        }
    }
}

/// Remove dangling `import`, `iframe` and `paste` markers from the last word.
///
/// A marker at the very end of a line has no target; it is dropped so it does
/// not show up in the rendered text. `inline` markers are left alone.
pub fn strip_dangling_markers(tokens: &mut [Token]) {
    let Some(Token::Word(word)) = tokens
        .iter_mut()
        .rev()
        .find(|token| !matches!(token, Token::Space(_)))
    else {
        return;
    };

    while let Some((prefix, kind)) = DirectiveKind::split_marker(word) {
        if kind == DirectiveKind::Inline {
            break;
        }
        let keep = prefix.len();
        word.truncate(keep);
    }
}

/// Extract `import`, `iframe` and `inline` directives from a token sequence.
///
/// Each (marker word, target word) pair is replaced by the marker's fused
/// prefix, a [`Token::Slot`] indexing into the returned directives, and any
/// text that followed the target's `<` terminator. Directives are returned
/// in left-to-right order.
#[must_use]
pub fn extract(mut tokens: Vec<Token>) -> (Vec<Token>, Vec<Directive>) {
    strip_dangling_markers(&mut tokens);

    let mut out = Vec::with_capacity(tokens.len());
    let mut directives = Vec::new();
    let mut index = 0;

    while index < tokens.len() {
        let pair = tokens[index]
            .as_word()
            .and_then(DirectiveKind::split_marker)
            .filter(|(_, kind)| *kind != DirectiveKind::Paste)
            .and_then(|marker| Some((marker, next_word(&tokens, index)?)));

        let Some(((prefix, kind), target_index)) = pair else {
            out.push(tokens[index].clone());
            index += 1;
            continue;
        };
        let target_word = tokens[target_index].as_word().unwrap_or_default();
        let (target, trailing) = split_target(target_word);
        if target.is_empty() {
            out.push(tokens[index].clone());
            index += 1;
            continue;
        }

        let mut raw_token = kind.marker();
        raw_token.push_str(&join(&tokens[index + 1..target_index], |_| String::new()));
        raw_token.push_str(target);
        if trailing.is_some() {
            raw_token.push(REFERENCE_TERMINATOR);
        }

        if !prefix.is_empty() {
            out.push(Token::Word(prefix.to_owned()));
        }
        out.push(Token::Slot(directives.len()));
        if let Some(trailing) = trailing.filter(|t| !t.is_empty()) {
            out.push(Token::Word(trailing.to_owned()));
        }
        directives.push(Directive {
            kind,
            raw_token,
            target_reference: target.to_owned(),
        });

        index = target_index + 1;
    }

    (out, directives)
}

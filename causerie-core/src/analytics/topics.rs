//! Topic extraction over user messages
//!
//! Coarse subject-matter proxy: concatenate everything users wrote, fold
//! case, keep letters only, drop short tokens and French stop words, and
//! rank the rest by frequency. Assistant messages are excluded so the bot's
//! own phrasing does not pollute the topic list.

use crate::types::{Message, Role};
use std::collections::HashMap;

/// French stop words excluded from topic counts.
const STOP_WORDS: &[&str] = &[
    "le", "la", "les", "un", "une", "des", "ce", "cette", "ces", "mon", "ma", "mes", "ton", "ta",
    "tes", "son", "sa", "ses", "notre", "nos", "votre", "vos", "leur", "leurs", "du", "de", "à",
    "au", "aux", "en", "dans", "sur", "sous", "avec", "pour", "par", "et", "ou", "que", "qui",
    "quoi", "dont", "où", "comment", "pourquoi", "quand", "je", "tu", "il", "elle", "on", "nous",
    "vous", "ils", "elles", "est", "sont", "était", "étaient", "sera", "seront", "été", "être",
    "avoir", "fait", "faire", "plus", "moins", "peu", "très", "trop", "beaucoup", "pas", "ne",
    "non", "oui", "si", "alors", "mais", "car", "donc", "or", "ni", "cependant", "toutefois",
    "néanmoins", "ceci", "cela", "ça", "celui", "celle", "ceux", "celles", "celui-ci", "celle-ci",
    "est-ce", "qu'il", "qu'elle", "qu'on", "d'un", "d'une", "s'il", "s'ils", "peut", "peuvent",
    "pouvez", "merci", "bonjour", "bonsoir", "salut",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

/// Extract the `top_n` most frequent content words from the user messages of
/// the given transcripts.
///
/// Tokenization: Unicode lowercasing, every non-letter character becomes a
/// separator, tokens shorter than `min_word_length` (in characters) and stop
/// words are discarded. Ties between equal counts break deterministically by
/// first-encountered order in the concatenated text.
pub fn extract_topics<'a, I>(transcripts: I, top_n: usize, min_word_length: usize) -> Vec<(String, u64)>
where
    I: IntoIterator<Item = &'a [Message]>,
{
    let mut text = String::new();
    for messages in transcripts {
        for message in messages {
            if message.role == Role::User {
                text.push(' ');
                text.push_str(&message.content);
            }
        }
    }
    top_words(&text, top_n, min_word_length)
}

/// Frequency-rank the content words of a text. See [`extract_topics`].
pub fn top_words(text: &str, top_n: usize, min_word_length: usize) -> Vec<(String, u64)> {
    let lowered = text.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_alphabetic() { c } else { ' ' })
        .collect();

    // (count, first-encountered index) per word
    let mut counts: HashMap<&str, (u64, usize)> = HashMap::new();
    let mut next_index = 0usize;

    for word in cleaned.split_whitespace() {
        if word.chars().count() < min_word_length || is_stop_word(word) {
            continue;
        }
        let entry = counts.entry(word).or_insert_with(|| {
            let idx = next_index;
            next_index += 1;
            (0, idx)
        });
        entry.0 += 1;
    }

    let mut ranked: Vec<(&str, (u64, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(word, (count, _))| (word.to_string(), count))
        .collect()
}

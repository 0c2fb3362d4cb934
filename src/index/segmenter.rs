//! Word segmentation for Japanese text
//!
//! The dictionary-backed segmenter is expensive to build, so one instance is
//! created at startup and shared as `Arc<dyn Segmenter>`.

use jieba_rs::Jieba;

/// Splits text with no inter-word delimiters into word tokens
pub trait Segmenter: Send + Sync {
    /// Segments `text` into words; whitespace never appears in a token
    fn segment(&self, text: &str) -> Vec<String>;
}

/// Dictionary segmenter backed by jieba
///
/// Jieba segments kanji runs against its dictionary but emits kana one
/// character at a time, so consecutive single kana of the same script are
/// merged back into one word.
pub struct JiebaSegmenter {
    jieba: Jieba,
}

impl JiebaSegmenter {
    /// Loads the embedded dictionary
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }
}

impl Default for JiebaSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for JiebaSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        merge_kana_runs(self.jieba.cut(text, true))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kana {
    Hiragana,
    Katakana,
}

/// Returns the kana script of a one-character token
fn single_kana(token: &str) -> Option<Kana> {
    let mut chars = token.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match c {
        '\u{3041}'..='\u{309f}' => Some(Kana::Hiragana),
        '\u{30a0}'..='\u{30ff}' => Some(Kana::Katakana),
        _ => None,
    }
}

/// Drops whitespace tokens and joins runs of same-script single-kana tokens
fn merge_kana_runs<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut open_run: Option<Kana> = None;

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            open_run = None;
            continue;
        }

        let script = single_kana(token);
        match (script, open_run, words.last_mut()) {
            (Some(current), Some(open), Some(last)) if current == open => last.push_str(token),
            _ => words.push(token.to_string()),
        }
        open_run = script;
    }

    words
}

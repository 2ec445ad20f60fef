use crate::error::TalkError;
use log::trace;

/// Bias applied to merchant dialogue bytes before a word lookup
const MERCHANT_WORD_BIAS: u8 = 0x80;

/// The index ranges, as they appear in .TLK byte streams, that resolve to a
/// compressed word, and the offset that turns each raw index into a position
/// in the on-disk word list. The raw index space has gaps between the
/// ranges; these constants are reverse-engineered from the original data
/// files and cannot be derived from a formula.
const WORD_INDEX_RANGES: [(usize, usize, isize); 8] = [
    (1, 7, -1),
    (9, 27, -2),
    (29, 49, -3),
    (51, 64, -4),
    (66, 66, -5),
    (68, 69, -6),
    (71, 71, -7),
    (76, 129, -11),
];

lazy_static! {
    /// Raw index -> word list position, fully expanded so lookups are O(1).
    /// Indexes that fall in a gap stay `None`.
    static ref WORD_POSITIONS: [Option<u8>; 256] = {
        let mut positions = [None; 256];
        for &(start, end, offset) in WORD_INDEX_RANGES.iter() {
            for raw in start..=end {
                positions[raw] = Some((raw as isize + offset) as u8);
            }
        }
        positions
    };
}

/// The dictionary of multi-character words that .TLK byte streams reference
/// by single-byte index to save space.
///
/// The word list itself comes from the surrounding world data (DATA.OVL);
/// this type only owns the list and the index renumbering.
pub struct CompressedWordTable {
    words: Vec<String>,
}

impl CompressedWordTable {
    /// Build a table over an ordered word list
    pub fn new(words: Vec<String>) -> CompressedWordTable {
        trace!("compressed word table with {} words", words.len());
        CompressedWordTable { words }
    }

    /// Does the raw index resolve to a word? Cheap and side-effect free so
    /// the lexer can probe before every lookup.
    pub fn is_resolvable(&self, raw_index: usize) -> bool {
        raw_index < WORD_POSITIONS.len() && WORD_POSITIONS[raw_index].is_some()
    }

    /// Look up the word for a raw .TLK index, renumbering across the gaps.
    /// An index in a gap or past the word list is an error, never a
    /// placeholder: corrupt text on screen is worse than failing the load.
    pub fn resolve(&self, raw_index: usize) -> Result<&str, TalkError> {
        let position = WORD_POSITIONS
            .get(raw_index)
            .copied()
            .flatten()
            .ok_or_else(|| TalkError::DictionaryLookup {
                index: raw_index,
                reason: "index falls in a gap of the lookup table".to_string(),
            })?;

        match self.words.get(position as usize) {
            Some(word) => Ok(word),
            None => Err(TalkError::DictionaryLookup {
                index: raw_index,
                reason: format!(
                    "maps to position {} but the word list has only {} entries",
                    position,
                    self.words.len()
                ),
            }),
        }
    }

    /// Expand the compressed-word references inside a merchant dialogue
    /// string (shoppes.dat uses its own 0x80-biased encoding). Variable
    /// replacement symbols are left in place for the caller to substitute.
    pub fn expand_merchant_string(&self, raw: &str) -> Result<String, TalkError> {
        let mut expanded = String::new();
        let mut in_compressed_word = false;

        for c in raw.chars() {
            let byte = c as u32 as u8;
            let ch = byte as char;

            if is_plain_letter_or_digit(ch) || is_plain_punctuation(ch) || is_replacement_symbol(ch)
            {
                // back to plain characters, close off the word with a space
                if in_compressed_word {
                    expanded.push(' ');
                    in_compressed_word = false;
                }
                expanded.push(ch);
            } else {
                let raw_index = byte.wrapping_sub(MERCHANT_WORD_BIAS) as usize + 1;
                expanded.push(' ');
                expanded.push_str(self.resolve(raw_index)?);
                in_compressed_word = true;
            }
        }

        Ok(expanded)
    }
}

fn is_plain_letter_or_digit(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_uppercase() || ch.is_ascii_digit()
}

fn is_plain_punctuation(ch: char) -> bool {
    matches!(ch, ' ' | '"' | '!' | ',' | '\'' | '.' | '-' | '?' | '\n' | ';')
}

/// Symbols the merchant dialogue uses for runtime substitution:
/// % gold, & equipment, # business, $ merchant name, @ food or drink,
/// * location, ^ quantity. They pass through expansion untouched.
fn is_replacement_symbol(ch: char) -> bool {
    matches!(ch, '%' | '&' | '$' | '#' | '@' | '*' | '^')
}

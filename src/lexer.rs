use crate::compressed_words::CompressedWordTable;
use crate::error::TalkError;
use crate::script::ScriptItem;
use crate::talk_command::TalkCommand;
use crate::talk_script::TalkScript;
use log::trace;

/// Bias carried by literal text bytes in the stream
const TEXT_BIAS: u8 = 0x80;

/// First and last byte of the label window
const LABEL_BASE: u8 = 0x91;
const LABEL_TOP: u8 = 0x9A;

/// One response in the original data embeds a zero byte that plainly does
/// not end the line; whether that is a data bug or a rule nobody has
/// rediscovered, it is preserved here byte-for-byte rather than repaired.
const CHARITY_RESPONSE_TAIL: &str = "to give unto charity!";

/// How a single raw byte participates in the stream
#[derive(Debug, Clone, Copy, PartialEq)]
enum ByteClass {
    /// 0x00, ends the current line
    EndOfLine,
    /// Biased printable ASCII, typed out one character at a time
    Letter(char),
    /// A label marker carrying its 0-based number
    Label(u8),
    /// A compressed word reference, to be resolved through the dictionary
    Word(u8),
    /// A control command byte
    Command(u8),
}

/// Classify one byte. The word window ends at 0x80: the renumbering table
/// nominally covers index 0x81 as well, but playback never reaches it and
/// the byte always means the Avatar's name instead.
fn classify(byte: u8) -> ByteClass {
    match byte {
        0x00 => ByteClass::EndOfLine,
        0xA0..=0xA1 | 0xA5..=0xDA | 0xE1..=0xFA => {
            ByteClass::Letter((byte - TEXT_BIAS) as char)
        }
        LABEL_BASE..=LABEL_TOP => ByteClass::Label(byte - LABEL_BASE),
        0x01..=0x80 => ByteClass::Word(byte),
        _ => ByteClass::Command(byte),
    }
}

/// Decode one NPC's raw byte block into an unstructured script: ordered
/// lines of text fragments, commands and label markers.
///
/// Text comes back from two encodings at once: biased single characters and
/// dictionary words, with separating spaces inserted where the two meet so
/// adjacent runs do not glue together. A dictionary reference that falls in
/// a gap fails the whole decode; patched-over text would reach the player.
///
/// Every label marker is emitted as a definition here. Whether an
/// occurrence really defines the label or merely jumps to it is settled
/// later, once line boundaries are known.
///
/// The caller still runs `init_script()` to turn the lines into the
/// navigable form.
pub fn decode_script(
    bytes: &[u8],
    words: &CompressedWordTable,
) -> Result<TalkScript, TalkError> {
    let mut script = TalkScript::new();
    let mut build = String::new();
    let mut writing_single_chars = false;
    let mut gold_digits_left = 0u8;

    for &byte in bytes {
        match classify(byte) {
            ByteClass::EndOfLine if !build.ends_with(CHARITY_RESPONSE_TAIL) => {
                build.push('\n');
                script.add_item(ScriptItem::Text(std::mem::take(&mut build)));
                script.next_line();
                writing_single_chars = false;
            }
            ByteClass::EndOfLine => {
                // the known mid-response zero byte: flush what we have and
                // keep going on the same line
                if writing_single_chars {
                    writing_single_chars = false;
                    build.push(' ');
                }
                script.add_item(ScriptItem::Text(std::mem::take(&mut build)));
                script.add_item(ScriptItem::Text(String::new()));
            }
            ByteClass::Letter(ch) => {
                writing_single_chars = true;
                // '@' marks the end of printing and is never shown
                if ch == '@' {
                    continue;
                }
                build.push(ch);
                if gold_digits_left > 0 {
                    gold_digits_left -= 1;
                    if gold_digits_left == 0 {
                        // the three digits become their own fragment so the
                        // section splitter can pair them with the command
                        script.add_item(ScriptItem::Text(std::mem::take(&mut build)));
                    }
                }
            }
            ByteClass::Word(raw_index) => {
                if writing_single_chars {
                    writing_single_chars = false;
                    build.push(' ');
                }
                build.push_str(words.resolve(raw_index as usize)?);
                build.push(' ');
            }
            ByteClass::Label(number) => {
                if writing_single_chars {
                    writing_single_chars = false;
                    build.push(' ');
                }
                if !build.is_empty() {
                    script.add_item(ScriptItem::Text(std::mem::take(&mut build)));
                }
                script.add_item(ScriptItem::define_label(number)?);
            }
            ByteClass::Command(tag) => {
                if writing_single_chars {
                    writing_single_chars = false;
                    build.push(' ');
                }
                if !build.is_empty() {
                    script.add_item(ScriptItem::Text(std::mem::take(&mut build)));
                }
                let command = TalkCommand::from_raw_byte(tag);
                if command == TalkCommand::Gold {
                    // exactly three literal digits follow the gold command
                    gold_digits_left = 3;
                }
                script.add_item(ScriptItem::Command(command));
            }
        }
    }

    if !build.is_empty() {
        script.add_item(ScriptItem::Text(std::mem::take(&mut build)));
    }
    script.next_line();

    trace!("decoded {} bytes into {} lines", bytes.len(), script.number_of_lines());
    Ok(script)
}

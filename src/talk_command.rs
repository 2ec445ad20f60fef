use serde::{Deserialize, Serialize};

/// A zero-argument conversational control command.
///
/// The byte values up to 0xA2 are fixed by the .TLK file format. Values that
/// cannot appear in a raw byte stream (either because the lexer claims the
/// byte for text or labels, or because the value exceeds a byte) are only
/// ever produced by pre-structured custom dialogue and by the conversation
/// engine layered on top of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TalkCommand {
    /// 0x7E - the player's input matched nothing
    UserInputNotRecognized,
    /// 0x7F - prompt the player for their interest
    PromptUserForInterest,
    /// 0x80 - prompt the player after an NPC question
    PromptUserForQuestion,
    /// 0x81 - substitute the Avatar's name
    AvatarsName,
    /// 0x82 - the NPC ends the conversation
    EndConversation,
    /// 0x83 - pause output
    Pause,
    /// 0x84 - the NPC offers to join the party
    JoinParty,
    /// 0x85 - give gold; followed by exactly three literal digits
    Gold,
    /// 0x86 - swap an inventory item; followed by the item selector
    Change,
    /// 0x87 - joins two question keywords as synonyms
    Or,
    /// 0x88 - the NPC asks the player's name
    AskName,
    /// 0x89 - karma +1
    KarmaPlusOne,
    /// 0x8A - karma -1
    KarmaMinusOne,
    /// 0x8B - the NPC calls the guards
    CallGuards,
    /// 0x8C - branch depending on whether the NPC knows the Avatar
    IfElseKnowsName,
    /// 0x8D - line break in NPC speech
    NewLine,
    /// 0x8E - render the next text as runes
    Rune,
    /// 0x8F - wait for a key press
    KeyWait,
    /// 0x90 - begins a label definition line
    StartLabelDefinition,
    /// 0x9F - end of the whole script
    EndScript,
    /// 0xA2 - section break inside a line
    StartNewSection,
    /// 0xFF - a section that renders nothing
    DoNothingSection,
    /// 0x100 - placeholder for the guard extortion amount
    ExtortionAmount,
    /// 0x101 - throw the Avatar in jail
    GoToJail,
    /// 0x102 - pay the demanded extortion
    PayGenericExtortion,
    /// 0x103 - pay half the party's gold as extortion
    PayHalfGoldExtortion,
    /// 0x104 - create a horse next to the party
    MakeAHorse,
    /// A raw command byte with no known meaning; the tag is carried through
    Unknown(u8),
}

impl TalkCommand {
    /// Map a raw stream byte onto its command. Bytes the format leaves
    /// undefined are carried as `Unknown` rather than dropped.
    pub fn from_raw_byte(byte: u8) -> TalkCommand {
        match byte {
            0x81 => TalkCommand::AvatarsName,
            0x82 => TalkCommand::EndConversation,
            0x83 => TalkCommand::Pause,
            0x84 => TalkCommand::JoinParty,
            0x85 => TalkCommand::Gold,
            0x86 => TalkCommand::Change,
            0x87 => TalkCommand::Or,
            0x88 => TalkCommand::AskName,
            0x89 => TalkCommand::KarmaPlusOne,
            0x8A => TalkCommand::KarmaMinusOne,
            0x8B => TalkCommand::CallGuards,
            0x8C => TalkCommand::IfElseKnowsName,
            0x8D => TalkCommand::NewLine,
            0x8E => TalkCommand::Rune,
            0x8F => TalkCommand::KeyWait,
            0x90 => TalkCommand::StartLabelDefinition,
            0x9F => TalkCommand::EndScript,
            0xA2 => TalkCommand::StartNewSection,
            _ => TalkCommand::Unknown(byte),
        }
    }

    /// The numeric tag for this command. Raw-stream commands report their
    /// format byte; the out-of-band commands use values above 0xFF.
    pub fn value(&self) -> u16 {
        match self {
            TalkCommand::UserInputNotRecognized => 0x7E,
            TalkCommand::PromptUserForInterest => 0x7F,
            TalkCommand::PromptUserForQuestion => 0x80,
            TalkCommand::AvatarsName => 0x81,
            TalkCommand::EndConversation => 0x82,
            TalkCommand::Pause => 0x83,
            TalkCommand::JoinParty => 0x84,
            TalkCommand::Gold => 0x85,
            TalkCommand::Change => 0x86,
            TalkCommand::Or => 0x87,
            TalkCommand::AskName => 0x88,
            TalkCommand::KarmaPlusOne => 0x89,
            TalkCommand::KarmaMinusOne => 0x8A,
            TalkCommand::CallGuards => 0x8B,
            TalkCommand::IfElseKnowsName => 0x8C,
            TalkCommand::NewLine => 0x8D,
            TalkCommand::Rune => 0x8E,
            TalkCommand::KeyWait => 0x8F,
            TalkCommand::StartLabelDefinition => 0x90,
            TalkCommand::EndScript => 0x9F,
            TalkCommand::StartNewSection => 0xA2,
            TalkCommand::DoNothingSection => 0xFF,
            TalkCommand::ExtortionAmount => 0x100,
            TalkCommand::GoToJail => 0x101,
            TalkCommand::PayGenericExtortion => 0x102,
            TalkCommand::PayHalfGoldExtortion => 0x103,
            TalkCommand::MakeAHorse => 0x104,
            TalkCommand::Unknown(byte) => *byte as u16,
        }
    }
}

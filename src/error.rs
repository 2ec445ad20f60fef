use thiserror::Error;

/// Errors raised while decoding and structuring talk scripts.
///
/// Decode-time errors are fatal to the single NPC script being built; the
/// surrounding loader reports them and carries on with the remaining NPCs.
#[derive(Error, Debug)]
pub enum TalkError {
    /// A byte referenced the compressed-word list at an index with no
    /// defined mapping (a gap) or past the end of the word list.
    #[error("no compressed word at index {index}: {reason}")]
    DictionaryLookup { index: usize, reason: String },

    /// The structurer's cursor could not find an expected line (question
    /// after <or>, answer after a question, end-of-labels marker) where the
    /// format requires one.
    #[error("talk script structure is corrupt: {0}")]
    StructuralCorruption(String),

    /// A label number outside 0..=9.
    #[error("label number {0} is out of range (0-9)")]
    InvalidLabelNumber(i32),

    /// `answer()` was called for input that no registered keyword matches.
    /// Callers must probe with `answer_is_available()` first.
    #[error("no answer registered for \"{0}\"")]
    NoAnswer(String),

    /// The .TLK container's entry table or offsets do not fit the file.
    #[error("talk file container is malformed: {0}")]
    MalformedContainer(String),

    /// The custom dialogue document could not be deserialized.
    #[error("custom dialogue is unreadable: {0}")]
    CustomDialogue(#[from] serde_json::Error),
}

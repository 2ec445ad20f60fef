use crate::error::TalkError;
use crate::extortion::GuardExtortion;
use crate::talk_command::TalkCommand;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Error, Formatter};

/// Number of labels a script may define (label numbers are 0..=9)
pub const TOTAL_LABELS: usize = 10;

/// Is this piece of text a keyword the player types, as opposed to NPC
/// speech? The byte stream carries no marker; a short, space-free literal is
/// the only signal there is. Kept in one place so a stricter detector can be
/// swapped in without touching the structurer.
pub fn is_question_keyword(text: &str) -> bool {
    let trimmed = text.trim();
    (1..=6).contains(&trimmed.len()) && !text.contains(' ')
}

/// One decoded unit of a script line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptItem {
    /// A literal text fragment
    Text(String),
    /// A zero-argument control command
    Command(TalkCommand),
    /// Jump to a label
    GotoLabel(u8),
    /// Define a label
    DefineLabel(u8),
    /// Give gold, with the parsed amount (produced by section splitting)
    Gold(u16),
    /// Swap an item, payload is the selector tag (produced by splitting)
    ChangeItem(u16),
}

impl ScriptItem {
    /// A label definition item, rejecting numbers the format cannot encode
    pub fn define_label(number: u8) -> Result<ScriptItem, TalkError> {
        if (number as usize) < TOTAL_LABELS {
            Ok(ScriptItem::DefineLabel(number))
        } else {
            Err(TalkError::InvalidLabelNumber(number as i32))
        }
    }

    /// A goto-label item, rejecting numbers the format cannot encode
    pub fn goto_label(number: u8) -> Result<ScriptItem, TalkError> {
        if (number as usize) < TOTAL_LABELS {
            Ok(ScriptItem::GotoLabel(number))
        } else {
            Err(TalkError::InvalidLabelNumber(number as i32))
        }
    }

    /// Literal text, stripped of the stray double quotes the original data
    /// sprinkles around some lines
    pub fn text(&self) -> Option<&str> {
        match self {
            ScriptItem::Text(text) => Some(text.trim_matches('"')),
            _ => None,
        }
    }

    /// The command tag this item carries, if any; parametric items report
    /// the command they were split from
    pub fn command_tag(&self) -> Option<TalkCommand> {
        match self {
            ScriptItem::Command(command) => Some(*command),
            ScriptItem::Gold(_) => Some(TalkCommand::Gold),
            ScriptItem::ChangeItem(_) => Some(TalkCommand::Change),
            _ => None,
        }
    }

    /// Label number for either kind of label item
    pub fn label_number(&self) -> Option<u8> {
        match self {
            ScriptItem::GotoLabel(number) | ScriptItem::DefineLabel(number) => Some(*number),
            _ => None,
        }
    }

    /// Does this item read as a player-typed keyword?
    pub fn is_question(&self) -> bool {
        self.text().map_or(false, is_question_keyword)
    }

    /// The gold amount this item stands for, if any. The extortion
    /// placeholder has no baked-in value; it resolves through the injected
    /// evaluator at the moment it is asked for.
    pub fn amount(&self, extortion: &dyn GuardExtortion) -> Option<u16> {
        match self {
            ScriptItem::Gold(amount) => Some(*amount),
            ScriptItem::Command(TalkCommand::ExtortionAmount) => {
                Some(extortion.extortion_amount())
            }
            _ => None,
        }
    }
}

impl Display for ScriptItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            ScriptItem::Text(_) => write!(f, "{}", self.text().unwrap_or("").trim()),
            ScriptItem::Command(command) => write!(f, "<{command:?}>"),
            ScriptItem::GotoLabel(number) => write!(f, "<GotoLabel{number}>"),
            ScriptItem::DefineLabel(number) => write!(f, "<DefineLabel{number}>"),
            ScriptItem::Gold(amount) => write!(f, "<Gold:{amount}>"),
            ScriptItem::ChangeItem(selector) => write!(f, "<Change:{selector}>"),
        }
    }
}

/// One terminated unit of the original byte stream: an ordered run of
/// script items
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptLine {
    items: Vec<ScriptItem>,
}

impl ScriptLine {
    pub fn new() -> ScriptLine {
        ScriptLine::default()
    }

    pub fn add_item(&mut self, item: ScriptItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[ScriptItem] {
        &self.items
    }

    pub fn get(&self, index: usize) -> Option<&ScriptItem> {
        self.items.get(index)
    }

    pub fn first(&self) -> Option<&ScriptItem> {
        self.items.first()
    }

    pub fn number_of_items(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Is a particular command present anywhere in the line? Helpful when
    /// peeking for an <Or> joiner or an Avatar name branch.
    pub fn contains_command(&self, command: TalkCommand) -> bool {
        self.items
            .iter()
            .any(|item| item.command_tag() == Some(command))
    }

    /// Does the line open a label definition or the end-of-labels marker?
    pub fn starts_label_section(&self) -> bool {
        self.first() == Some(&ScriptItem::Command(TalkCommand::StartLabelDefinition))
    }

    /// Is this line a label definition (label start marker plus number)?
    pub fn is_label_definition(&self) -> bool {
        self.starts_label_section()
            && matches!(self.get(1), Some(ScriptItem::DefineLabel(_)))
    }

    /// The label number this line defines, if it is a definition line
    pub fn defined_label(&self) -> Option<u8> {
        if self.starts_label_section() {
            self.get(1).and_then(ScriptItem::label_number)
        } else {
            None
        }
    }

    /// Does the line close the label region (and with it the whole script)?
    pub fn is_end_of_label_section(&self) -> bool {
        self.starts_label_section()
            && self.get(1) == Some(&ScriptItem::Command(TalkCommand::EndScript))
    }

    /// Is this line a keyword the player would type?
    pub fn is_question(&self) -> bool {
        self.first().map_or(false, ScriptItem::is_question)
    }

    /// Break the line into its minimal renderable sections.
    ///
    /// Every side-effecting command becomes a section of its own so the
    /// presentation layer can step through them one at a time. Parametric
    /// commands swallow their inline payload here: give-gold consumes the
    /// three digit literal that follows it, change-item consumes the
    /// selector tag. Section break markers are dropped; empty sections are
    /// never emitted.
    pub fn split_into_sections(&self) -> Result<Vec<ScriptLine>, TalkError> {
        let mut sections: Vec<ScriptLine> = Vec::new();
        let mut current = ScriptLine::new();

        fn flush(sections: &mut Vec<ScriptLine>, current: &mut ScriptLine) {
            if !current.is_empty() {
                sections.push(std::mem::take(current));
            }
        }

        let mut index = 0;
        while index < self.items.len() {
            let item = &self.items[index];

            match item {
                ScriptItem::Command(TalkCommand::StartNewSection) => {
                    flush(&mut sections, &mut current);
                }
                ScriptItem::Command(TalkCommand::IfElseKnowsName)
                | ScriptItem::Command(TalkCommand::DoNothingSection)
                | ScriptItem::Command(TalkCommand::ExtortionAmount)
                | ScriptItem::GotoLabel(_)
                | ScriptItem::DefineLabel(_)
                | ScriptItem::Gold(_)
                | ScriptItem::ChangeItem(_) => {
                    flush(&mut sections, &mut current);
                    let mut section = ScriptLine::new();
                    section.add_item(item.clone());
                    sections.push(section);
                }
                ScriptItem::Command(TalkCommand::Gold) => {
                    flush(&mut sections, &mut current);
                    let digits = self
                        .items
                        .get(index + 1)
                        .and_then(ScriptItem::text)
                        .ok_or_else(|| {
                            TalkError::StructuralCorruption(
                                "give-gold is not followed by its digit literal".to_string(),
                            )
                        })?;
                    let amount = digits
                        .get(..3)
                        .and_then(|run| run.parse::<u16>().ok())
                        .ok_or_else(|| {
                            TalkError::StructuralCorruption(format!(
                                "give-gold amount \"{digits}\" is not three digits"
                            ))
                        })?;
                    let mut section = ScriptLine::new();
                    section.add_item(ScriptItem::Gold(amount));
                    sections.push(section);
                    index += 1;
                }
                ScriptItem::Command(TalkCommand::Change) => {
                    flush(&mut sections, &mut current);
                    let selector = self
                        .items
                        .get(index + 1)
                        .and_then(ScriptItem::command_tag)
                        .ok_or_else(|| {
                            TalkError::StructuralCorruption(
                                "change-item is not followed by its selector tag".to_string(),
                            )
                        })?;
                    let mut section = ScriptLine::new();
                    section.add_item(ScriptItem::ChangeItem(selector.value()));
                    sections.push(section);
                    index += 1;
                }
                ScriptItem::Command(TalkCommand::StartLabelDefinition) => {
                    flush(&mut sections, &mut current);
                    let label = self.items.get(index + 1).ok_or_else(|| {
                        TalkError::StructuralCorruption(
                            "label start marker ends the line".to_string(),
                        )
                    })?;
                    let mut section = ScriptLine::new();
                    section.add_item(item.clone());
                    section.add_item(label.clone());
                    sections.push(section);
                    index += 1;
                }
                _ => {
                    current.add_item(item.clone());
                }
            }

            index += 1;
        }

        flush(&mut sections, &mut current);
        Ok(sections)
    }
}

impl Display for ScriptLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for item in &self.items {
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

/// A set of synonymous question keywords bound to one answer line
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptQuestionAnswer {
    pub questions: Vec<String>,
    pub answer: ScriptLine,
}

impl ScriptQuestionAnswer {
    pub fn new(questions: Vec<String>, answer: ScriptLine) -> ScriptQuestionAnswer {
        ScriptQuestionAnswer { questions, answer }
    }
}

/// A keyword-indexed table of question/answer pairs, either an NPC's global
/// table or the local table of one label.
///
/// Lookup is deliberately primitive: case-insensitive, "does the input start
/// with this keyword", first registered keyword wins. Registration order is
/// therefore part of the contract, which is why the index keeps insertion
/// order.
#[derive(Debug, Clone, Default)]
pub struct ScriptQuestionAnswers {
    entries: Vec<ScriptQuestionAnswer>,
    by_keyword: IndexMap<String, usize>,
}

impl ScriptQuestionAnswers {
    pub fn new() -> ScriptQuestionAnswers {
        ScriptQuestionAnswers::default()
    }

    /// Register a question/answer pair. A keyword that is already bound
    /// keeps its first binding; the original data repeats keywords and the
    /// game favours the first occurrence.
    pub fn add(&mut self, qa: ScriptQuestionAnswer) {
        let entry = self.entries.len();
        for question in &qa.questions {
            let keyword = question.trim().to_string();
            if !keyword.is_empty() && !self.by_keyword.contains_key(&keyword) {
                self.by_keyword.insert(keyword, entry);
            }
        }
        self.entries.push(qa);
    }

    /// Would `answer()` succeed for this input? Side-effect free; callers
    /// are expected to probe with this before asking for the answer.
    pub fn answer_is_available(&self, input: &str) -> bool {
        self.matching_keyword(input).is_some()
    }

    /// The question/answer pair the input resolves to. Calling this without
    /// a successful `answer_is_available` probe is a caller bug, reported
    /// as an error rather than a panic.
    pub fn answer(&self, input: &str) -> Result<&ScriptQuestionAnswer, TalkError> {
        match self.matching_keyword(input) {
            Some(keyword) => Ok(&self.entries[self.by_keyword[keyword]]),
            None => Err(TalkError::NoAnswer(input.to_string())),
        }
    }

    /// All registered keywords, in registration order
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.by_keyword.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_keyword.is_empty()
    }

    fn matching_keyword(&self, input: &str) -> Option<&String> {
        let input = input.to_lowercase();
        self.by_keyword
            .keys()
            .find(|keyword| input.starts_with(&keyword.to_lowercase()))
    }
}

impl Display for ScriptQuestionAnswers {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        for qa in &self.entries {
            writeln!(f, "Questions: {}", qa.questions.join(" <OR> "))?;
            writeln!(f, "Answer: {}", qa.answer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extortion::FlatRate;

    fn text(s: &str) -> ScriptItem {
        ScriptItem::Text(s.to_string())
    }

    fn line(items: Vec<ScriptItem>) -> ScriptLine {
        let mut line = ScriptLine::new();
        for item in items {
            line.add_item(item);
        }
        line
    }

    #[test]
    fn short_space_free_literals_are_questions() {
        assert!(is_question_keyword("food"));
        assert!(is_question_keyword("bye\n"));
        assert!(is_question_keyword("a"));
        assert!(!is_question_keyword(""));
        assert!(!is_question_keyword("   \n"));
        assert!(is_question_keyword("mantra")); // 6 is the limit...
        assert!(!is_question_keyword("mantras")); // ...7 is past it
        assert!(!is_question_keyword("no food"));
    }

    #[test]
    fn question_line_looks_at_its_first_item() {
        assert!(line(vec![text("gold\n")]).is_question());
        assert!(!line(vec![text("Take all my gold!\n")]).is_question());
        assert!(!line(vec![ScriptItem::Command(TalkCommand::Pause), text("gold\n")]).is_question());
    }

    #[test]
    fn gold_section_carries_its_parsed_amount() {
        let line = line(vec![
            ScriptItem::Command(TalkCommand::Gold),
            text("100"),
            text(" for thy trouble\n"),
        ]);

        let sections = line.split_into_sections().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].items(), &[ScriptItem::Gold(100)]);
        assert_eq!(
            sections[0].items()[0].amount(&FlatRate(0)),
            Some(100),
        );
        assert_eq!(sections[1].items(), &[text(" for thy trouble\n")]);
    }

    #[test]
    fn gold_without_digits_is_corruption() {
        let line = line(vec![ScriptItem::Command(TalkCommand::Gold)]);
        assert!(matches!(
            line.split_into_sections(),
            Err(TalkError::StructuralCorruption(_))
        ));
    }

    #[test]
    fn change_item_consumes_the_selector_tag() {
        let line = line(vec![
            text("Take this. "),
            ScriptItem::Command(TalkCommand::Change),
            ScriptItem::Command(TalkCommand::Unknown(0xA7)),
        ]);

        let sections = line.split_into_sections().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].items(), &[ScriptItem::ChangeItem(0xA7)]);
    }

    #[test]
    fn section_breaks_split_and_vanish() {
        let line = line(vec![
            text("Before. "),
            ScriptItem::Command(TalkCommand::StartNewSection),
            text("After.\n"),
        ]);

        let sections = line.split_into_sections().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].items(), &[text("Before. ")]);
        assert_eq!(sections[1].items(), &[text("After.\n")]);
    }

    #[test]
    fn name_branch_and_labels_sit_alone() {
        let line = line(vec![
            ScriptItem::Command(TalkCommand::IfElseKnowsName),
            text("Well met again!\n"),
            ScriptItem::GotoLabel(3),
        ]);

        let sections = line.split_into_sections().unwrap();
        assert_eq!(
            sections[0].items(),
            &[ScriptItem::Command(TalkCommand::IfElseKnowsName)]
        );
        assert_eq!(sections[1].items(), &[text("Well met again!\n")]);
        assert_eq!(sections[2].items(), &[ScriptItem::GotoLabel(3)]);
    }

    #[test]
    fn label_definition_keeps_marker_and_number_together() {
        let line = line(vec![
            ScriptItem::Command(TalkCommand::StartLabelDefinition),
            ScriptItem::DefineLabel(2),
            text("Thou hast found the password.\n"),
        ]);

        let sections = line.split_into_sections().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(
            sections[0].items(),
            &[
                ScriptItem::Command(TalkCommand::StartLabelDefinition),
                ScriptItem::DefineLabel(2),
            ]
        );
    }

    #[test]
    fn extortion_placeholder_resolves_through_the_evaluator() {
        let line = line(vec![
            text("Pay up or else! "),
            ScriptItem::Command(TalkCommand::ExtortionAmount),
        ]);

        let sections = line.split_into_sections().unwrap();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].items()[0].amount(&FlatRate(40)), Some(40));
        assert_eq!(sections[1].items()[0].amount(&FlatRate(90)), Some(90));
    }

    #[test]
    fn first_keyword_binding_wins() {
        let mut table = ScriptQuestionAnswers::new();
        table.add(ScriptQuestionAnswer::new(
            vec!["food".to_string()],
            line(vec![text("We serve stew.\n")]),
        ));
        table.add(ScriptQuestionAnswer::new(
            vec!["food".to_string()],
            line(vec![text("The kitchen is closed.\n")]),
        ));

        let qa = table.answer("food").unwrap();
        assert_eq!(qa.answer, line(vec![text("We serve stew.\n")]));
    }

    #[test]
    fn lookup_is_prefix_based_and_case_insensitive() {
        let mut table = ScriptQuestionAnswers::new();
        table.add(ScriptQuestionAnswer::new(
            vec!["heal".to_string()],
            line(vec![text("I can heal thee.\n")]),
        ));

        assert!(table.answer_is_available("HEALING"));
        assert!(table.answer_is_available("heal"));
        assert!(!table.answer_is_available("hea"));
        assert!(matches!(
            table.answer("sword"),
            Err(TalkError::NoAnswer(_))
        ));
    }

    #[test]
    fn out_of_range_labels_are_rejected() {
        assert!(ScriptItem::define_label(9).is_ok());
        assert!(matches!(
            ScriptItem::define_label(10),
            Err(TalkError::InvalidLabelNumber(10))
        ));
        assert!(matches!(
            ScriptItem::goto_label(200),
            Err(TalkError::InvalidLabelNumber(200))
        ));
    }
}

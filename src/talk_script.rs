use crate::error::TalkError;
use crate::script::{
    ScriptItem, ScriptLine, ScriptQuestionAnswer, ScriptQuestionAnswers, TOTAL_LABELS,
};
use crate::talk_command::TalkCommand;
use log::{debug, warn};
use std::fmt::{Display, Error, Formatter};

/// Number of mandatory lines at the head of every script
pub const FIXED_LINES: usize = 5;

/// The fixed slots every talk script fills before any free-form content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedSlot {
    Name,
    Description,
    Greeting,
    Job,
    Bye,
}

impl FixedSlot {
    /// Line index of the slot
    pub fn index(&self) -> usize {
        match self {
            FixedSlot::Name => 0,
            FixedSlot::Description => 1,
            FixedSlot::Greeting => 2,
            FixedSlot::Job => 3,
            FixedSlot::Bye => 4,
        }
    }
}

/// One branch target of a script: the line that is always shown on arrival,
/// any uninvited follow-up lines, and the label's own question/answer table
#[derive(Debug, Clone)]
pub struct ScriptTalkLabel {
    /// The label reference number, 0..=9
    pub label_num: u8,
    /// Shown every time the conversation jumps here
    pub initial_line: ScriptLine,
    /// Spoken when no registered question matches (may be empty)
    pub default_answers: Vec<ScriptLine>,
    /// Questions only answerable while this label is active
    pub question_answers: ScriptQuestionAnswers,
}

impl ScriptTalkLabel {
    fn new(label_num: u8, initial_line: ScriptLine) -> ScriptTalkLabel {
        ScriptTalkLabel {
            label_num,
            initial_line,
            default_answers: Vec::new(),
            question_answers: ScriptQuestionAnswers::new(),
        }
    }
}

/// The full decoded conversation for one NPC.
///
/// A script is built exactly once, either from a raw byte decode or from a
/// pre-structured custom dialogue document; `add_item`/`next_line` are the
/// only mutation path and are used only while building. After
/// `init_script()` the script is read-only for the rest of the session.
pub struct TalkScript {
    lines: Vec<ScriptLine>,
    current: ScriptLine,
    question_answers: ScriptQuestionAnswers,
    labels: Vec<ScriptTalkLabel>,
}

impl TalkScript {
    pub fn new() -> TalkScript {
        TalkScript {
            lines: Vec::new(),
            current: ScriptLine::new(),
            question_answers: ScriptQuestionAnswers::new(),
            labels: Vec::new(),
        }
    }

    /// Adopt already-assembled lines (the custom dialogue path)
    pub fn from_lines(lines: Vec<ScriptLine>) -> TalkScript {
        let mut script = TalkScript::new();
        script.lines = lines;
        script
    }

    /// Append an item to the line under construction
    pub fn add_item(&mut self, item: ScriptItem) {
        self.current.add_item(item);
    }

    /// Finish the line under construction and start the next one
    pub fn next_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }

    pub fn number_of_lines(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    pub fn script_line(&self, index: usize) -> Option<&ScriptLine> {
        self.lines.get(index)
    }

    /// One of the five mandatory lines; present on any structured script
    pub fn fixed_line(&self, slot: FixedSlot) -> Option<&ScriptLine> {
        self.lines.get(slot.index())
    }

    /// The NPC's global question/answer table
    pub fn question_answers(&self) -> &ScriptQuestionAnswers {
        &self.question_answers
    }

    /// All labels, in file order
    pub fn labels(&self) -> &[ScriptTalkLabel] {
        &self.labels
    }

    /// The label with the given number, if the script defines it
    pub fn label(&self, number: u8) -> Option<&ScriptTalkLabel> {
        self.labels.iter().find(|label| label.label_num == number)
    }

    /// Index of the line defining the given label, for goto playback
    pub fn label_line_index(&self, number: u8) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.defined_label() == Some(number))
    }

    /// Process the assembled lines into the navigable form: seed the fixed
    /// slots, read the global question/answer region, then the labels.
    ///
    /// The five fixed lines and an end-of-labels marker are the minimum a
    /// script can carry; anything short of that, or a cursor running past
    /// the lines before the marker shows up, is structural corruption and
    /// kills the build of this one script.
    pub fn init_script(&mut self) -> Result<(), TalkError> {
        self.next_line();

        if self.lines.len() <= FIXED_LINES {
            return Err(TalkError::StructuralCorruption(format!(
                "script has only {} lines, the five fixed lines plus an end marker are required",
                self.lines.len()
            )));
        }

        // the farewell always ends the conversation, so hang the command on
        // it before anything takes a copy
        self.lines[FixedSlot::Bye.index()]
            .add_item(ScriptItem::Command(TalkCommand::EndConversation));

        // every NPC answers these even when the byte stream never spells
        // them out
        self.question_answers.add(ScriptQuestionAnswer::new(
            vec!["name".to_string()],
            self.lines[FixedSlot::Name.index()].clone(),
        ));
        self.question_answers.add(ScriptQuestionAnswer::new(
            vec!["job".to_string(), "work".to_string()],
            self.lines[FixedSlot::Job.index()].clone(),
        ));
        self.question_answers.add(ScriptQuestionAnswer::new(
            vec!["bye".to_string()],
            self.lines[FixedSlot::Bye.index()].clone(),
        ));

        let label_start = read_global_questions(&self.lines, &mut self.question_answers)?;
        read_labels(&self.lines, label_start, &mut self.labels)?;

        debug!(
            "structured script: {} lines, {} keywords, {} labels",
            self.lines.len(),
            self.question_answers.keywords().count(),
            self.labels.len()
        );
        Ok(())
    }
}

impl Default for TalkScript {
    fn default() -> TalkScript {
        TalkScript::new()
    }
}

impl Display for TalkScript {
    /// The comprehensive dump: fixed slots, global table, labels
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let slot = |slot: FixedSlot| {
            self.fixed_line(slot)
                .map(ScriptLine::to_string)
                .unwrap_or_default()
        };
        writeln!(f, "Name: {}", slot(FixedSlot::Name))?;
        writeln!(f, "Description: {}", slot(FixedSlot::Description))?;
        writeln!(f, "Greeting: {}", slot(FixedSlot::Greeting))?;
        writeln!(f, "Job: {}", slot(FixedSlot::Job))?;
        writeln!(f, "Bye: {}", slot(FixedSlot::Bye))?;
        writeln!(f)?;
        write!(f, "{}", self.question_answers)?;

        for label in &self.labels {
            writeln!(f)?;
            writeln!(f, "Label #{}", label.label_num)?;
            writeln!(f, "Initial: {}", label.initial_line)?;
            for line in &label.default_answers {
                writeln!(f, "Default: {line}")?;
            }
            write!(f, "{}", label.question_answers)?;
        }
        Ok(())
    }
}

/// Read question/(or-chain)/answer pairs into `table` until the label
/// region begins; returns the index of the first label-region line.
fn read_global_questions(
    lines: &[ScriptLine],
    table: &mut ScriptQuestionAnswers,
) -> Result<usize, TalkError> {
    let mut cursor = FIXED_LINES;
    loop {
        let line = lines.get(cursor).ok_or_else(|| {
            TalkError::StructuralCorruption(
                "ran out of lines before reaching the label region".to_string(),
            )
        })?;
        if line.starts_label_section() {
            return Ok(cursor);
        }

        let mut questions = vec![question_keyword(line)?];
        while next_line_is_or(lines, cursor) {
            cursor += 2;
            let synonym = lines.get(cursor).ok_or_else(|| {
                TalkError::StructuralCorruption("<or> joins to a missing question".to_string())
            })?;
            questions.push(question_keyword(synonym)?);
        }

        let answer = lines.get(cursor + 1).ok_or_else(|| {
            TalkError::StructuralCorruption(format!(
                "question \"{}\" has no answer line",
                questions.join("/")
            ))
        })?;
        table.add(ScriptQuestionAnswer::new(questions, answer.clone()));
        cursor += 2;
    }
}

/// Structure the label region. Two passes: first find every label boundary
/// and the end-of-labels marker, then attach each label's content. Forward
/// references and the actual definition of a label byte collapse naturally,
/// since only lines that open with the label-start marker count here.
fn read_labels(
    lines: &[ScriptLine],
    start: usize,
    labels: &mut Vec<ScriptTalkLabel>,
) -> Result<(), TalkError> {
    let mut boundaries = Vec::new();
    let mut terminal = None;
    for (index, line) in lines.iter().enumerate().skip(start) {
        if !line.starts_label_section() {
            continue;
        }
        if line.is_end_of_label_section() {
            terminal = Some(index);
            break;
        }
        boundaries.push(index);
    }

    let terminal = terminal.ok_or_else(|| {
        TalkError::StructuralCorruption(
            "script ran out before the end-of-labels marker".to_string(),
        )
    })?;
    if terminal != lines.len() - 1 {
        warn!(
            "{} trailing lines after the end-of-labels marker are ignored",
            lines.len() - 1 - terminal
        );
    }

    boundaries.push(terminal);
    for pair in boundaries.windows(2) {
        let (begin, end) = (pair[0], pair[1]);
        let definition = &lines[begin];
        let number = definition.defined_label().ok_or_else(|| {
            TalkError::StructuralCorruption(format!(
                "expected a label definition, found \"{definition}\""
            ))
        })?;
        if number as usize >= TOTAL_LABELS {
            return Err(TalkError::InvalidLabelNumber(number as i32));
        }

        let mut label = ScriptTalkLabel::new(number, definition.clone());
        attach_label_content(&lines[begin + 1..end], &mut label)?;
        labels.push(label);
    }
    Ok(())
}

/// Attach the lines between a label definition and the next boundary:
/// an optional default answer, then question/answer pairs scoped to the
/// label. A non-question line in question position is a further default
/// answer; a handful of NPCs speak two uninvited lines in a row.
fn attach_label_content(
    region: &[ScriptLine],
    label: &mut ScriptTalkLabel,
) -> Result<(), TalkError> {
    if region.is_empty() {
        // only the initial line is read when the conversation jumps here
        return Ok(());
    }

    label.default_answers.push(region[0].clone());

    let mut cursor = 1;
    while cursor < region.len() {
        let line = &region[cursor];
        if line.is_question() || next_line_is_or(region, cursor) {
            let mut questions = vec![question_keyword(line)?];
            while next_line_is_or(region, cursor) {
                cursor += 2;
                let synonym = region.get(cursor).ok_or_else(|| {
                    TalkError::StructuralCorruption(
                        "<or> joins to a missing question".to_string(),
                    )
                })?;
                questions.push(question_keyword(synonym)?);
            }
            let answer = region.get(cursor + 1).ok_or_else(|| {
                TalkError::StructuralCorruption(format!(
                    "label {} question \"{}\" has no answer line",
                    label.label_num,
                    questions.join("/")
                ))
            })?;
            label
                .question_answers
                .add(ScriptQuestionAnswer::new(questions, answer.clone()));
            cursor += 2;
        } else {
            label.default_answers.push(line.clone());
            cursor += 1;
        }
    }
    Ok(())
}

fn next_line_is_or(lines: &[ScriptLine], cursor: usize) -> bool {
    lines
        .get(cursor + 1)
        .map_or(false, |line| line.contains_command(TalkCommand::Or))
}

/// The keyword a question line registers: its leading literal, trimmed
fn question_keyword(line: &ScriptLine) -> Result<String, TalkError> {
    let keyword = line
        .first()
        .and_then(ScriptItem::text)
        .map(str::trim)
        .unwrap_or("");
    if keyword.is_empty() {
        Err(TalkError::StructuralCorruption(format!(
            "expected a question line, found \"{line}\""
        )))
    } else {
        Ok(keyword.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn text_line(text: &str) -> ScriptLine {
        let mut line = ScriptLine::new();
        line.add_item(ScriptItem::Text(text.to_string()));
        line
    }

    fn or_line() -> ScriptLine {
        let mut line = ScriptLine::new();
        line.add_item(ScriptItem::Command(TalkCommand::Or));
        line.add_item(ScriptItem::Text("\n".to_string()));
        line
    }

    fn label_line(number: u8, text: &str) -> ScriptLine {
        let mut line = ScriptLine::new();
        line.add_item(ScriptItem::Command(TalkCommand::StartLabelDefinition));
        line.add_item(ScriptItem::DefineLabel(number));
        if !text.is_empty() {
            line.add_item(ScriptItem::Text(text.to_string()));
        }
        line
    }

    fn end_line() -> ScriptLine {
        let mut line = ScriptLine::new();
        line.add_item(ScriptItem::Command(TalkCommand::StartLabelDefinition));
        line.add_item(ScriptItem::Command(TalkCommand::EndScript));
        line
    }

    fn fixed_five() -> Vec<ScriptLine> {
        vec![
            text_line("Iolo\n"),
            text_line("A cheery bard.\n"),
            text_line("Well met, friend!\n"),
            text_line("I sing and play.\n"),
            text_line("Fare thee well.\n"),
        ]
    }

    fn structured(lines: Vec<ScriptLine>) -> TalkScript {
        let mut script = TalkScript::from_lines(lines);
        script.init_script().unwrap();
        script
    }

    #[test]
    fn minimal_script_seeds_the_standard_keywords() {
        let mut lines = fixed_five();
        lines.push(end_line());
        let script = structured(lines);

        let table = script.question_answers();
        for probe in ["name", "job", "work", "bye"] {
            assert!(table.answer_is_available(probe), "{probe} should answer");
        }
        assert_eq!(
            table.answer("job").unwrap().answer,
            *script.fixed_line(FixedSlot::Job).unwrap()
        );
        assert!(script.labels().is_empty());
    }

    #[test]
    fn farewell_always_ends_the_conversation() {
        let mut lines = fixed_five();
        lines.push(end_line());
        let script = structured(lines);

        let bye = script.question_answers().answer("bye").unwrap();
        assert!(bye
            .answer
            .contains_command(TalkCommand::EndConversation));
        assert!(script
            .fixed_line(FixedSlot::Bye)
            .unwrap()
            .contains_command(TalkCommand::EndConversation));
    }

    #[test]
    fn or_chain_collects_synonyms_for_one_answer() {
        let mut lines = fixed_five();
        lines.push(text_line("food\n"));
        lines.push(or_line());
        lines.push(text_line("drink\n"));
        lines.push(text_line("The stew is hot and the ale is cold.\n"));
        lines.push(end_line());
        let script = structured(lines);

        let table = script.question_answers();
        let food = table.answer("food").unwrap();
        let drink = table.answer("drink").unwrap();
        assert_eq!(food, drink);
        assert_eq!(food.questions, vec!["food", "drink"]);
    }

    #[test]
    fn repeated_keyword_keeps_the_first_answer() {
        let mut lines = fixed_five();
        lines.push(text_line("food\n"));
        lines.push(text_line("We serve stew.\n"));
        lines.push(text_line("food\n"));
        lines.push(text_line("The kitchen is closed.\n"));
        lines.push(end_line());
        let script = structured(lines);

        let qa = script.question_answers().answer("food").unwrap();
        assert_eq!(qa.answer, text_line("We serve stew.\n"));
    }

    #[test]
    fn label_gets_default_answer_and_local_questions() {
        let mut lines = fixed_five();
        lines.push(label_line(0, "Thou hast found my secret.\n"));
        lines.push(text_line("Speak not of it.\n"));
        lines.push(text_line("secret\n"));
        lines.push(text_line("The password is sanctuary.\n"));
        lines.push(end_line());
        let script = structured(lines);

        assert_eq!(script.labels().len(), 1);
        let label = script.label(0).unwrap();
        assert_eq!(label.default_answers, vec![text_line("Speak not of it.\n")]);
        assert!(label.question_answers.answer_is_available("secret"));
        // label-scoped questions stay out of the global table
        assert!(!script.question_answers().answer_is_available("secret"));
    }

    #[test]
    fn back_to_back_labels_have_no_default_content() {
        let mut lines = fixed_five();
        lines.push(label_line(0, "First stop.\n"));
        lines.push(label_line(1, "Second stop.\n"));
        lines.push(text_line("A lone default line.\n"));
        lines.push(end_line());
        let script = structured(lines);

        assert!(script.label(0).unwrap().default_answers.is_empty());
        assert_eq!(
            script.label(1).unwrap().default_answers,
            vec![text_line("A lone default line.\n")]
        );
    }

    #[test]
    fn uninvited_second_line_extends_the_default_answer() {
        let mut lines = fixed_five();
        lines.push(label_line(4, "Listen well.\n"));
        lines.push(text_line("The first thing I must say.\n"));
        lines.push(text_line("And a second thing besides.\n"));
        lines.push(end_line());
        let script = structured(lines);

        let label = script.label(4).unwrap();
        assert_eq!(label.default_answers.len(), 2);
        assert!(label.question_answers.is_empty());
    }

    #[test]
    fn label_line_index_finds_definitions() {
        let mut lines = fixed_five();
        lines.push(label_line(2, "Over here.\n"));
        lines.push(text_line("Just this.\n"));
        lines.push(end_line());
        let script = structured(lines);

        assert_eq!(script.label_line_index(2), Some(5));
        assert_eq!(script.label_line_index(3), None);
    }

    #[test]
    fn missing_end_marker_is_corruption() {
        let mut script = TalkScript::from_lines(fixed_five());
        assert!(matches!(
            script.init_script(),
            Err(TalkError::StructuralCorruption(_))
        ));

        let mut lines = fixed_five();
        lines.push(text_line("food\n"));
        lines.push(text_line("We serve stew.\n"));
        let mut script = TalkScript::from_lines(lines);
        assert!(matches!(
            script.init_script(),
            Err(TalkError::StructuralCorruption(_))
        ));
    }

    #[test]
    fn question_without_answer_is_corruption() {
        let mut lines = fixed_five();
        lines.push(text_line("food\n"));
        let mut script = TalkScript::from_lines(lines);
        assert!(matches!(
            script.init_script(),
            Err(TalkError::StructuralCorruption(_))
        ));
    }

    #[test]
    fn label_number_outside_the_window_is_rejected() {
        let mut lines = fixed_five();
        let mut bad = ScriptLine::new();
        bad.add_item(ScriptItem::Command(TalkCommand::StartLabelDefinition));
        bad.add_item(ScriptItem::DefineLabel(10));
        lines.push(bad);
        lines.push(text_line("Should never be reached.\n"));
        lines.push(end_line());
        let mut script = TalkScript::from_lines(lines);
        assert!(matches!(
            script.init_script(),
            Err(TalkError::InvalidLabelNumber(10))
        ));
    }
}

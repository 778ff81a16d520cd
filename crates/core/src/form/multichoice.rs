//! Editing form of the ROI multiple-choice question.

use super::field::{DisabledIf, Field, FieldKind, FormDefinition, ParamType, SelectOption};
use super::repeat::{RepeatCounter, RepeatOptions, RepeatTemplate};

/// Largest image file the picker accepts, in bytes.
pub const FILE_PICKER_MAX_BYTES: u64 = 2048;

/// Answer groups shown for a new question; ROIs are added one at a time.
pub const INITIAL_ANSWERS: usize = 0;

/// Answer groups added per press of "add ROI answer".
pub const ANSWERS_PER_ADD: usize = 1;

/// Hint groups shown for a question without hints.
pub const INITIAL_HINTS: usize = 1;

/// Default penalty for each incorrect try.
pub const DEFAULT_PENALTY: &str = "0.3333333";

/// Positive grade fractions offered per answer, best first.
const GRADE_FRACTIONS: &[f64] = &[
    1.0, 0.9, 0.8333333, 0.8, 0.75, 0.7, 0.6666667, 0.6, 0.5, 0.4, 0.3333333, 0.3, 0.25, 0.2,
    0.1666667, 0.1428571, 0.125, 0.1111111, 0.1, 0.05,
];

const PENALTY_FRACTIONS: &[f64] = &[1.0, 0.5, 0.3333333, 0.25, 0.2, 0.1, 0.0];

/// What the previous request carried for the repeated groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmittedState {
    pub answer_count: Option<usize>,
    pub add_answers_pressed: bool,
    pub hint_count: Option<usize>,
    pub add_hints_pressed: bool,
}

/// Counter of the per-answer groups.
pub fn answer_counter() -> RepeatCounter {
    RepeatCounter::new("noanswers", "addanswers", ANSWERS_PER_ADD)
}

/// Counter of the hint groups.
pub fn hint_counter() -> RepeatCounter {
    RepeatCounter::new("numhints", "addhint", 1)
}

/// Build the field list. `existing_answers` / `existing_hints` are the counts
/// stored for an edited question, `None` for a new one.
pub fn build_definition(
    existing_answers: Option<usize>,
    existing_hints: Option<usize>,
    submitted: &SubmittedState,
) -> FormDefinition {
    let mut fields = vec![
        Field::new(
            "usefilereference",
            "File",
            FieldKind::FilePicker {
                max_bytes: FILE_PICKER_MAX_BYTES,
                accepted_types: vec!["*".to_string()],
            },
        ),
        Field::new("add-roi-answer", "Add ROI answer", FieldKind::Button),
        Field::new(
            "single",
            "One or multiple answers?",
            FieldKind::Select {
                options: vec![
                    SelectOption::new("0", "Multiple answers allowed"),
                    SelectOption::new("1", "One answer only"),
                ],
            },
        )
        .with_default("1"),
        Field::new("shuffleanswers", "Shuffle the choices?", FieldKind::Checkbox)
            .with_default("1")
            .with_help("shuffleanswers"),
        Field::new(
            "answernumbering",
            "Number the choices?",
            FieldKind::Select {
                options: numbering_styles(),
            },
        )
        .with_default("abc"),
        Field::new("answerhdr", "Answers", FieldKind::Header),
    ];

    let answers = answer_counter();
    let answer_repeats = answers.resolve(
        existing_answers.unwrap_or(INITIAL_ANSWERS),
        submitted.answer_count,
        submitted.add_answers_pressed,
    );
    fields.extend(answer_template().materialize(&answers, answer_repeats));

    fields.extend(combined_feedback_fields());

    fields.push(Field::new("multitriesheader", "Multiple tries", FieldKind::Header));
    fields.push(
        Field::new(
            "penalty",
            "Penalty for each incorrect try",
            FieldKind::Select {
                options: PENALTY_FRACTIONS
                    .iter()
                    .map(|f| SelectOption::new(format_fraction(*f), format_percent(*f)))
                    .collect(),
            },
        )
        .with_default(DEFAULT_PENALTY),
    );

    let hints = hint_counter();
    let hint_repeats = hints.resolve(
        existing_hints.unwrap_or(INITIAL_HINTS),
        submitted.hint_count,
        submitted.add_hints_pressed,
    );
    fields.extend(hint_template().materialize(&hints, hint_repeats));

    fields.push(
        Field::new("editing_mode", "", FieldKind::Hidden)
            .with_default("true")
            .with_type(ParamType::Bool),
    );

    FormDefinition {
        fields,
        no_submit_buttons: vec![answers.add_button_name, hints.add_button_name],
    }
}

/// Fields repeated once per ROI answer.
pub fn answer_template() -> RepeatTemplate {
    let grades = fraction_options_full();
    RepeatTemplate::new(vec![
        Field::new("description", "Choice {no}: ", FieldKind::Static),
        Field::new("roi", "", FieldKind::Select { options: vec![] }),
        Field::new("fraction", "Grade", FieldKind::Select { options: grades }),
        Field::new("feedback", "Feedback", FieldKind::Editor { rows: 1 }),
    ])
    .with_option(
        "roi",
        RepeatOptions {
            param_type: Some(ParamType::Raw),
            ..Default::default()
        },
    )
    .with_option(
        "fraction",
        RepeatOptions {
            default: Some("0".to_string()),
            ..Default::default()
        },
    )
}

/// Fields repeated once per hint.
pub fn hint_template() -> RepeatTemplate {
    let single_disables = || RepeatOptions {
        disabled_if: Some(DisabledIf {
            dependency: "single".to_string(),
            value: "1".to_string(),
        }),
        ..Default::default()
    };
    RepeatTemplate::new(vec![
        Field::new("hint", "Hint {no}", FieldKind::Editor { rows: 5 }),
        Field::new(
            "hintshownumcorrect",
            "Show the number of correct responses",
            FieldKind::Checkbox,
        ),
        Field::new("hintclearwrong", "Clear incorrect responses", FieldKind::Checkbox),
    ])
    .with_option(
        "hint",
        RepeatOptions {
            param_type: Some(ParamType::Raw),
            ..Default::default()
        },
    )
    .with_option("hintclearwrong", single_disables())
    .with_option("hintshownumcorrect", single_disables())
}

fn combined_feedback_fields() -> Vec<Field> {
    vec![
        Field::new("combinedfeedbackhdr", "Combined feedback", FieldKind::Header),
        Field::new("correctfeedback", "For any correct response", FieldKind::Editor { rows: 10 })
            .with_type(ParamType::Raw),
        Field::new(
            "partiallycorrectfeedback",
            "For any partially correct response",
            FieldKind::Editor { rows: 10 },
        )
        .with_type(ParamType::Raw),
        Field::new(
            "incorrectfeedback",
            "For any incorrect response",
            FieldKind::Editor { rows: 10 },
        )
        .with_type(ParamType::Raw),
        Field::new(
            "shownumcorrect",
            "Show the number of correct responses once the question has finished",
            FieldKind::Checkbox,
        )
        .disabled_if("single", "1"),
    ]
}

/// Grade menu: positive fractions, none, then the negated fractions.
pub fn fraction_options_full() -> Vec<SelectOption> {
    let mut options: Vec<SelectOption> = GRADE_FRACTIONS
        .iter()
        .map(|f| SelectOption::new(format_fraction(*f), format_percent(*f)))
        .collect();
    options.push(SelectOption::new("0.0", "None"));
    options.extend(
        GRADE_FRACTIONS
            .iter()
            .rev()
            .map(|f| SelectOption::new(format_fraction(-*f), format_percent(-*f))),
    );
    options
}

/// Choice numbering styles.
pub fn numbering_styles() -> Vec<SelectOption> {
    vec![
        SelectOption::new("abc", "a., b., c., ..."),
        SelectOption::new("ABCD", "A., B., C., ..."),
        SelectOption::new("123", "1., 2., 3., ..."),
        SelectOption::new("iii", "i., ii., iii., ..."),
        SelectOption::new("IIII", "I., II., III., ..."),
        SelectOption::new("none", "No numbering"),
    ]
}

fn format_fraction(fraction: f64) -> String {
    format!("{fraction:.7}")
}

/// `0.8333333` -> `83.33333%`.
fn format_percent(fraction: f64) -> String {
    let formatted = format!("{:.5}", fraction * 100.0);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    format!("{trimmed}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::repeat::MAX_REPEATS;

    #[test]
    fn new_question_has_no_answer_groups() {
        let form = build_definition(None, None, &SubmittedState::default());
        assert!(form.field("roi[0]").is_none());
        assert_eq!(form.field("noanswers").unwrap().default.as_deref(), Some("0"));
    }

    #[test]
    fn edited_question_renders_stored_answers() {
        let form = build_definition(Some(3), Some(2), &SubmittedState::default());
        for i in 0..3 {
            assert!(form.field(&format!("roi[{i}]")).is_some());
            assert!(form.field(&format!("fraction[{i}]")).is_some());
            assert!(form.field(&format!("feedback[{i}]")).is_some());
        }
        assert!(form.field("roi[3]").is_none());
        assert!(form.field("hint[1]").is_some());
        assert_eq!(form.field("description[2]").unwrap().label, "Choice 3: ");
    }

    #[test]
    fn add_button_adds_one_answer_group() {
        let submitted = SubmittedState {
            answer_count: Some(2),
            add_answers_pressed: true,
            ..Default::default()
        };
        let form = build_definition(None, None, &submitted);
        assert!(form.field("roi[2]").is_some());
        assert!(form.field("roi[3]").is_none());
        assert_eq!(form.field("noanswers").unwrap().default.as_deref(), Some("3"));
    }

    #[test]
    fn oversized_answer_counter_is_capped() {
        let submitted = SubmittedState {
            answer_count: Some(usize::MAX),
            add_answers_pressed: true,
            ..Default::default()
        };
        let form = build_definition(None, None, &submitted);
        let cap = MAX_REPEATS;
        assert!(form.field(&format!("roi[{}]", cap - 1)).is_some());
        assert!(form.field(&format!("roi[{cap}]")).is_none());
        assert_eq!(
            form.field("noanswers").unwrap().default.as_deref(),
            Some(cap.to_string().as_str())
        );
    }

    #[test]
    fn fraction_defaults_to_zero() {
        let form = build_definition(Some(1), None, &SubmittedState::default());
        assert_eq!(form.field("fraction[0]").unwrap().default.as_deref(), Some("0"));
    }

    #[test]
    fn hint_options_disabled_for_single_answer() {
        let form = build_definition(None, Some(1), &SubmittedState::default());
        let rule = form.field("hintclearwrong[0]").unwrap().disabled_if.as_ref().unwrap();
        assert_eq!(rule.dependency, "single");
        assert_eq!(rule.value, "1");
        assert!(form.field("shownumcorrect").unwrap().disabled_if.is_some());
    }

    #[test]
    fn fixed_fields_and_defaults() {
        let form = build_definition(None, None, &SubmittedState::default());
        assert_eq!(form.field("single").unwrap().default.as_deref(), Some("1"));
        assert_eq!(form.field("shuffleanswers").unwrap().default.as_deref(), Some("1"));
        assert_eq!(form.field("answernumbering").unwrap().default.as_deref(), Some("abc"));
        assert_eq!(form.field("editing_mode").unwrap().default.as_deref(), Some("true"));
        assert_eq!(form.no_submit_buttons, vec!["addanswers", "addhint"]);
    }

    #[test]
    fn grade_menu_is_symmetric() {
        let options = fraction_options_full();
        assert_eq!(options.len(), GRADE_FRACTIONS.len() * 2 + 1);
        assert_eq!(options[0].label, "100%");
        assert_eq!(options[2].label, "83.33333%");
        assert_eq!(options[GRADE_FRACTIONS.len()].label, "None");
        assert_eq!(options.last().unwrap().label, "-100%");
    }

    #[test]
    fn percent_formatting_trims_zeros() {
        assert_eq!(format_percent(0.5), "50%");
        assert_eq!(format_percent(0.05), "5%");
        assert_eq!(format_percent(0.0), "0%");
    }
}

//! Submission checks for the ROI multiple-choice form.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// A multiple-choice question needs at least this many ROI answers.
pub const MIN_ANSWERS: usize = 2;

/// Field name (indexed, e.g. `fraction[1]`) to error message.
pub type FormErrors = BTreeMap<String, String>;

/// The part of a submitted form the checks look at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiChoiceSubmission {
    #[serde(deserialize_with = "flag")]
    pub single: bool,
    /// Selected ROI id per answer group; empty when none was chosen.
    #[serde(default)]
    pub roi: Vec<String>,
    /// Grade fraction per answer group.
    #[serde(default)]
    pub fraction: Vec<f64>,
}

/// Check a submission, returning an empty map when it is valid.
pub fn validate(data: &MultiChoiceSubmission) -> FormErrors {
    let mut errors = FormErrors::new();
    let mut answer_count = 0;
    let mut total_fraction = 0.0;
    let mut max_fraction = -1.0_f64;

    for (i, roi) in data.roi.iter().enumerate() {
        let fraction = data.fraction.get(i).copied().unwrap_or(0.0);
        let roi = roi.trim();

        if roi.is_empty() && fraction == 0.0 {
            continue;
        }
        if roi.is_empty() {
            errors.insert(
                format!("fraction[{i}]"),
                "Grade set, but no ROI selected".to_string(),
            );
        }

        answer_count += 1;
        if fraction > 0.0 {
            total_fraction += fraction;
        }
        max_fraction = max_fraction.max(fraction);
    }

    let not_enough =
        || format!("This type of question requires at least {MIN_ANSWERS} ROI answers");
    match answer_count {
        0 => {
            errors.insert("answer[0]".to_string(), not_enough());
            errors.insert("answer[1]".to_string(), not_enough());
        }
        1 => {
            errors.insert("answer[1]".to_string(), not_enough());
        }
        _ => {}
    }

    if data.single {
        if answer_count > 0 && (max_fraction - 1.0).abs() > 1e-7 {
            errors.insert(
                "fraction[0]".to_string(),
                format!(
                    "One of the choices should be 100%, so that it is possible to get a full \
                     grade for this question. The best grade is {}%",
                    round2(max_fraction * 100.0)
                ),
            );
        }
    } else {
        let total = round2(total_fraction);
        if answer_count > 0 && (total - 1.0).abs() > 1e-9 {
            errors.insert(
                "fraction[0]".to_string(),
                format!(
                    "The positive grades you have chosen do not add up to 100%. Instead, they \
                     add up to {}%",
                    round2(total * 100.0)
                ),
            );
        }
    }

    errors
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Accept `true`/`false`, `0`/`1` and their string forms.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
        Flag::Str(s) => !matches!(s.trim(), "" | "0" | "false"),
    })
}

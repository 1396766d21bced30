use std::collections::BTreeMap;

use thiserror::Error;
use tracing::warn;

use crate::answers::{AnswerSet, AnswerValue};
use crate::spec::{Condition, ConditionalLogic, ExpectedValue, Field, FormSchema};

pub type VisibilityMap = BTreeMap<String, bool>;

/// Why a conditional rule could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisibilityFault {
    #[error("depends on unknown field '{0}'")]
    MissingParent(String),
    #[error("unknown condition '{0}'")]
    UnknownCondition(String),
    #[error("condition '{0}' needs an expected value")]
    MissingExpectedValue(&'static str),
}

/// Where a visibility decision came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilitySource {
    /// The field has no conditional rule.
    Unconditional,
    /// The rule evaluated cleanly.
    Rule,
    /// The rule was malformed and the field is shown anyway.
    Fallback(VisibilityFault),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visibility {
    pub visible: bool,
    pub source: VisibilitySource,
}

impl Visibility {
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, VisibilitySource::Fallback(_))
    }
}

/// Fail-open combinator: a faulty rule shows the field.
pub trait OrVisible {
    fn or_visible(self, field: &Field) -> Visibility;
}

impl OrVisible for Result<bool, VisibilityFault> {
    fn or_visible(self, field: &Field) -> Visibility {
        match self {
            Ok(visible) => Visibility {
                visible,
                source: VisibilitySource::Rule,
            },
            Err(fault) => {
                warn!(
                    field_id = %field.id,
                    label = %field.label,
                    error = %fault,
                    "conditional logic failed; showing field"
                );
                Visibility {
                    visible: true,
                    source: VisibilitySource::Fallback(fault),
                }
            }
        }
    }
}

/// Evaluates `field`'s rule against `answers`, reporting how the decision was
/// reached. Only the immediate parent's literal answer is consulted.
pub fn decide(field: &Field, answers: &AnswerSet, all_fields: &[Field]) -> Visibility {
    match field
        .conditional_logic
        .as_ref()
        .and_then(|logic| logic.parent().map(|parent| (logic, parent)))
    {
        None => Visibility {
            visible: true,
            source: VisibilitySource::Unconditional,
        },
        Some((logic, parent)) => evaluate_rule(logic, parent, answers, all_fields).or_visible(field),
    }
}

pub fn is_visible(field: &Field, answers: &AnswerSet, all_fields: &[Field]) -> bool {
    decide(field, answers, all_fields).visible
}

/// Strict evaluation of one rule; faults are returned, not swallowed.
pub fn evaluate_rule(
    logic: &ConditionalLogic,
    parent: &str,
    answers: &AnswerSet,
    all_fields: &[Field],
) -> Result<bool, VisibilityFault> {
    if !all_fields.iter().any(|field| field.id == parent) {
        return Err(VisibilityFault::MissingParent(parent.to_string()));
    }
    let answer = answers.get(parent);

    match &logic.condition {
        Condition::Equals => Ok(equals(answer, expected(logic, "equals")?)),
        Condition::NotEquals => Ok(match expected(logic, "not_equals")? {
            ExpectedValue::One(expected) => !strictly_equals(answer, expected),
            ExpectedValue::Many(_) => true,
        }),
        Condition::Answered => Ok(answers.is_answered(parent)),
        Condition::NotAnswered => Ok(!answers.is_answered(parent)),
        Condition::Unknown(name) => Err(VisibilityFault::UnknownCondition(name.clone())),
    }
}

fn expected<'a>(
    logic: &'a ConditionalLogic,
    condition: &'static str,
) -> Result<&'a ExpectedValue, VisibilityFault> {
    logic
        .expected_value
        .as_ref()
        .ok_or(VisibilityFault::MissingExpectedValue(condition))
}

fn equals(answer: Option<&AnswerValue>, expected: &ExpectedValue) -> bool {
    match expected {
        ExpectedValue::One(expected) => strictly_equals(answer, expected),
        ExpectedValue::Many(options) => match answer {
            Some(AnswerValue::List(selected)) => {
                selected.iter().any(|item| options.contains(item))
            }
            Some(scalar) => scalar
                .as_str()
                .is_some_and(|text| options.iter().any(|option| *option == *text)),
            None => false,
        },
    }
}

/// String-to-string equality; numbers and lists never equal a string.
fn strictly_equals(answer: Option<&AnswerValue>, expected: &str) -> bool {
    answer
        .and_then(AnswerValue::as_str)
        .is_some_and(|text| text == expected)
}

/// Visibility of every field in `schema`, keyed by field id.
pub fn resolve_visibility(schema: &FormSchema, answers: &AnswerSet) -> VisibilityMap {
    schema
        .fields
        .iter()
        .map(|field| {
            (
                field.id.clone(),
                is_visible(field, answers, &schema.fields),
            )
        })
        .collect()
}

/// Fields of `schema` that are currently shown, in schema order.
pub fn visible_fields<'a>(schema: &'a FormSchema, answers: &AnswerSet) -> Vec<&'a Field> {
    schema
        .fields
        .iter()
        .filter(|field| is_visible(field, answers, &schema.fields))
        .collect()
}

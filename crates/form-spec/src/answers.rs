use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single submitted value. Unanswered keys are simply absent from the
/// [`AnswerSet`].
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerValue {
    Text(String),
    List(Vec<String>),
    Number(f64),
    Date(NaiveDate),
}

impl AnswerValue {
    /// Decodes a JSON value, coercing shapes the engine does not model.
    /// `null` decodes to `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(AnswerValue::Text(text.clone())),
            Value::Number(number) => Some(match number.as_f64() {
                Some(float) => AnswerValue::Number(float),
                None => AnswerValue::Text(number.to_string()),
            }),
            Value::Bool(flag) => Some(AnswerValue::Text(flag.to_string())),
            Value::Array(items) => Some(AnswerValue::List(
                items
                    .iter()
                    .filter(|item| !item.is_null())
                    .map(coerce_item)
                    .collect(),
            )),
            Value::Object(_) => Some(AnswerValue::Text(value.to_string())),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            AnswerValue::Text(text) => Value::String(text.clone()),
            AnswerValue::List(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            AnswerValue::Number(number) => number_to_json(*number),
            AnswerValue::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
        }
    }

    /// String view of scalar values that travel as JSON strings (text and
    /// dates). Numbers and lists have none.
    pub fn as_str(&self) -> Option<Cow<'_, str>> {
        match self {
            AnswerValue::Text(text) => Some(Cow::Borrowed(text)),
            AnswerValue::Date(date) => Some(Cow::Owned(date.format(DATE_FORMAT).to_string())),
            AnswerValue::Number(_) | AnswerValue::List(_) => None,
        }
    }

    /// Loose string coercion: lists join with `,`, integral numbers drop the
    /// fraction.
    pub fn to_text(&self) -> String {
        match self {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::List(items) => items.join(","),
            AnswerValue::Number(number) => format_number(*number),
            AnswerValue::Date(date) => date.format(DATE_FORMAT).to_string(),
        }
    }

    /// Sequence view; scalars become a one-element list.
    pub fn to_list(&self) -> Vec<String> {
        match self {
            AnswerValue::List(items) => items.clone(),
            scalar => vec![scalar.to_text()],
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(number) => Some(*number),
            AnswerValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            AnswerValue::Date(date) => Some(*date),
            AnswerValue::Text(text) => NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok(),
            _ => None,
        }
    }

    /// Blank means "nothing entered": whitespace-only text or an empty list.
    pub fn is_blank(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.trim().is_empty(),
            AnswerValue::List(items) => items.is_empty(),
            AnswerValue::Number(_) | AnswerValue::Date(_) => false,
        }
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(value: Vec<String>) -> Self {
        AnswerValue::List(value)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(value: Vec<&str>) -> Self {
        AnswerValue::List(value.into_iter().map(str::to_string).collect())
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<NaiveDate> for AnswerValue {
    fn from(value: NaiveDate) -> Self {
        AnswerValue::Date(value)
    }
}

/// Text form of one list item; non-strings are coerced like answers.
pub(crate) fn coerce_item(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => AnswerValue::from_json(other)
            .map(|value| value.to_text())
            .unwrap_or_default(),
    }
}

fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

fn number_to_json(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        Value::Number(Number::from(number as i64))
    } else {
        Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Answers keyed by answer-key (`{fieldId}` or `{fieldId}_{part}`).
///
/// Decoding never fails: non-object JSON yields an empty set and odd values
/// are coerced by [`AnswerValue::from_json`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSet {
    values: BTreeMap<String, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: &Value) -> Self {
        let values = value
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .filter_map(|(key, value)| {
                        AnswerValue::from_json(value).map(|answer| (key.clone(), answer))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self { values }
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect();
        Value::Object(map)
    }

    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.values.get(key)
    }

    /// Inserts `value`, returning the set for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AnswerValue>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<AnswerValue> {
        self.values.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Present and not the empty string.
    pub fn is_answered(&self, key: &str) -> bool {
        match self.values.get(key) {
            None => false,
            Some(AnswerValue::Text(text)) => !text.is_empty(),
            Some(_) => true,
        }
    }
}

impl Serialize for AnswerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnswerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(AnswerSet::from_json(&value))
    }
}

/// Validation error metadata reported by [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_key: Option<String>,
    /// Translation key describing the problem, e.g. `validation.email`.
    pub code: String,
}

/// Result returned from [`crate::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ValidationError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_fields: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decoding_coerces_odd_shapes() {
        let answers = AnswerSet::from_json(&json!({
            "text": "hi",
            "flag": true,
            "list": ["a", 2, null, false],
            "rating": 4,
            "empty": null,
        }));
        assert_eq!(answers.get("text"), Some(&AnswerValue::Text("hi".into())));
        assert_eq!(answers.get("flag"), Some(&AnswerValue::Text("true".into())));
        assert_eq!(
            answers.get("list"),
            Some(&AnswerValue::List(vec!["a".into(), "2".into(), "false".into()]))
        );
        assert_eq!(answers.get("rating"), Some(&AnswerValue::Number(4.0)));
        assert!(answers.get("empty").is_none());
    }

    #[test]
    fn non_object_decodes_to_empty_set() {
        assert!(AnswerSet::from_json(&json!([1, 2])).is_empty());
        let parsed: AnswerSet = serde_json::from_str("\"nope\"").expect("lenient decode");
        assert!(parsed.is_empty());
    }

    #[test]
    fn text_coercion_matches_loose_string_rules() {
        assert_eq!(AnswerValue::Number(5.0).to_text(), "5");
        assert_eq!(AnswerValue::Number(2.5).to_text(), "2.5");
        assert_eq!(AnswerValue::from(vec!["a", "b"]).to_text(), "a,b");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(AnswerValue::Date(date).to_text(), "2024-03-09");
    }

    #[test]
    fn answered_means_present_and_not_empty_string() {
        let answers = AnswerSet::new()
            .with("blank", "")
            .with("space", " ")
            .with("list", Vec::<String>::new());
        assert!(!answers.is_answered("blank"));
        assert!(!answers.is_answered("missing"));
        assert!(answers.is_answered("space"));
        assert!(answers.is_answered("list"));
    }

    #[test]
    fn serializes_dates_as_iso_strings() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let answers = AnswerSet::new().with("d", date).with("n", 3.0);
        assert_eq!(answers.to_json(), json!({ "d": "2023-12-31", "n": 3 }));
    }
}

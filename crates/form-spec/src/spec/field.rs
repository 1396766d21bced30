use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::answers::coerce_item;

/// Supported field kinds. The tag is the wire name used in schema JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Select,
    Checkbox,
    Radio,
    Datetime,
    Email,
    Header,
    Rating,
    Ranking,
    File,
    Category,
    Fullname,
    Phone,
    Passport,
    Inn,
    Snils,
    Ogrn,
    Bik,
    Account,
    Country,
}

impl FieldType {
    /// Every field type, in declaration order.
    pub const ALL: [FieldType; 21] = [
        FieldType::Text,
        FieldType::Number,
        FieldType::Select,
        FieldType::Checkbox,
        FieldType::Radio,
        FieldType::Datetime,
        FieldType::Email,
        FieldType::Header,
        FieldType::Rating,
        FieldType::Ranking,
        FieldType::File,
        FieldType::Category,
        FieldType::Fullname,
        FieldType::Phone,
        FieldType::Passport,
        FieldType::Inn,
        FieldType::Snils,
        FieldType::Ogrn,
        FieldType::Bik,
        FieldType::Account,
        FieldType::Country,
    ];

    /// Position of this type inside [`FieldType::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::Datetime => "datetime",
            FieldType::Email => "email",
            FieldType::Header => "header",
            FieldType::Rating => "rating",
            FieldType::Ranking => "ranking",
            FieldType::File => "file",
            FieldType::Category => "category",
            FieldType::Fullname => "fullname",
            FieldType::Phone => "phone",
            FieldType::Passport => "passport",
            FieldType::Inn => "inn",
            FieldType::Snils => "snils",
            FieldType::Ogrn => "ogrn",
            FieldType::Bik => "bik",
            FieldType::Account => "account",
            FieldType::Country => "country",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == tag)
    }

    /// Types whose answers are picked from `options`.
    pub fn uses_options(self) -> bool {
        matches!(
            self,
            FieldType::Select
                | FieldType::Checkbox
                | FieldType::Radio
                | FieldType::Ranking
                | FieldType::Country
                | FieldType::Category
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison used by a conditional display rule.
///
/// Unrecognised condition names are kept as [`Condition::Unknown`] so a schema
/// written by a newer builder still loads and round-trips.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    #[default]
    Equals,
    NotEquals,
    Answered,
    NotAnswered,
    Unknown(String),
}

impl Condition {
    pub fn as_str(&self) -> &str {
        match self {
            Condition::Equals => "equals",
            Condition::NotEquals => "not_equals",
            Condition::Answered => "answered",
            Condition::NotAnswered => "not_answered",
            Condition::Unknown(other) => other,
        }
    }

    /// Translation key the UI resolves to a human label.
    pub fn label_key(&self) -> &'static str {
        match self {
            Condition::Equals => "logic.equals",
            Condition::NotEquals => "logic.not_equals",
            Condition::Answered => "logic.answered",
            Condition::NotAnswered => "logic.not_answered",
            Condition::Unknown(_) => "logic.unknown",
        }
    }

    /// Whether the rule compares against `expectedValue`.
    pub fn uses_expected_value(&self) -> bool {
        matches!(self, Condition::Equals | Condition::NotEquals)
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        match value.as_str() {
            "equals" => Condition::Equals,
            "not_equals" => Condition::NotEquals,
            "answered" => Condition::Answered,
            "not_answered" => Condition::NotAnswered,
            _ => Condition::Unknown(value),
        }
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        match value {
            Condition::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

/// Value a conditional rule compares the parent answer against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ExpectedValue {
    One(String),
    Many(Vec<String>),
}

/// Makes a field's visibility depend on another field's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalLogic {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    #[serde(default)]
    #[schemars(with = "String")]
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<ExpectedValue>,
}

impl ConditionalLogic {
    pub fn new(depends_on: impl Into<String>, condition: Condition) -> Self {
        Self {
            depends_on: Some(depends_on.into()),
            condition,
            expected_value: None,
        }
    }

    pub fn expecting(mut self, expected: ExpectedValue) -> Self {
        self.expected_value = Some(expected);
        self
    }

    /// Parent field id, if the rule names a non-empty one.
    pub fn parent(&self) -> Option<&str> {
        self.depends_on
            .as_deref()
            .filter(|depends_on| !depends_on.is_empty())
    }
}

/// One schema-defined input or display unit.
///
/// Type-specific attributes are optional and only consulted for the types they
/// belong to; see [`Field::attributes`] for the typed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_text: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<Vec<String>>")]
    pub options: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient_strings",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<Vec<String>>")]
    pub correct_answers: Option<Vec<String>>,
    #[serde(
        default,
        deserialize_with = "lenient_points",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<i64>")]
    pub points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rating: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_chars: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_decimals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_file_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_domains: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_categories: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_time: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_passport_series_number: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_passport_issued_by: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_passport_issue_date: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_passport_department_code: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_passport_birth_place: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inn_legal_entity: Option<bool>,
    /// Attributes this crate does not model, kept for lossless export.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// String lists written by hand or older builders may hold numbers or a
/// bare scalar; items are coerced to text and nulls dropped.
fn lenient_strings<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(coerce_item)
                .collect(),
        ),
        scalar => Some(vec![coerce_item(&scalar)]),
    })
}

/// Whole numbers (or numeric strings) are kept; anything else is dropped and
/// the field falls back to one point.
fn lenient_points<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let whole = |number: f64| {
        (number.is_finite() && number.fract() == 0.0 && number.abs() < 9.0e18)
            .then_some(number as i64)
    };
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().and_then(whole)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    })
}

impl Field {
    /// Creates a bare field with no optional attributes.
    pub fn new(id: impl Into<String>, kind: FieldType, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            placeholder: None,
            helper_text: None,
            required: false,
            options: None,
            correct_answers: None,
            points: None,
            conditional_logic: None,
            max_rating: None,
            max_chars: None,
            multiline: None,
            multiple: None,
            allow_decimals: None,
            max_file_size: None,
            accepted_file_types: None,
            allowed_domains: None,
            sub_categories: None,
            hide_date: None,
            hide_time: None,
            hide_passport_series_number: None,
            hide_passport_issued_by: None,
            hide_passport_issue_date: None,
            hide_passport_department_code: None,
            hide_passport_birth_place: None,
            inn_legal_entity: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn options(&self) -> &[String] {
        self.options.as_deref().unwrap_or_default()
    }

    /// Accepted answers, empty when the field is not graded.
    pub fn correct_answers(&self) -> &[String] {
        self.correct_answers.as_deref().unwrap_or_default()
    }

    pub fn is_gradable(&self) -> bool {
        !self.correct_answers().is_empty()
    }

    /// Typed view of the attributes that apply to this field's type.
    pub fn attributes(&self) -> FieldKind<'_> {
        match self.kind {
            FieldType::Text => FieldKind::Text {
                multiline: self.multiline.unwrap_or(false),
                max_chars: self.max_chars,
            },
            FieldType::Number => FieldKind::Number {
                allow_decimals: self.allow_decimals.unwrap_or(false),
            },
            FieldType::Select | FieldType::Radio | FieldType::Country | FieldType::Category => {
                FieldKind::Choice {
                    options: self.options(),
                    multiple: self.kind == FieldType::Select && self.multiple.unwrap_or(false),
                }
            }
            FieldType::Checkbox => FieldKind::Checkbox {
                options: self.options(),
            },
            FieldType::Ranking => FieldKind::Ranking {
                options: self.options(),
            },
            FieldType::Rating => FieldKind::Rating {
                max_rating: self.max_rating.filter(|max| *max > 0).unwrap_or(DEFAULT_MAX_RATING),
            },
            FieldType::Datetime => FieldKind::Datetime {
                show_date: !self.hide_date.unwrap_or(false),
                show_time: !self.hide_time.unwrap_or(false),
            },
            FieldType::Email => FieldKind::Email {
                allowed_domains: self.allowed_domains.as_deref().unwrap_or_default(),
            },
            FieldType::File => FieldKind::File {
                max_file_size_mb: self.max_file_size,
                accepted_file_types: self.accepted_file_types.as_deref().unwrap_or_default(),
            },
            FieldType::Fullname => FieldKind::Fullname,
            FieldType::Passport => FieldKind::Passport(PassportParts {
                series_number: !self.hide_passport_series_number.unwrap_or(false),
                issued_by: !self.hide_passport_issued_by.unwrap_or(false),
                issue_date: !self.hide_passport_issue_date.unwrap_or(false),
                department_code: !self.hide_passport_department_code.unwrap_or(false),
                birth_place: !self.hide_passport_birth_place.unwrap_or(false),
            }),
            FieldType::Inn => FieldKind::Inn {
                legal_entity: self.inn_legal_entity.unwrap_or(false),
            },
            FieldType::Phone
            | FieldType::Snils
            | FieldType::Ogrn
            | FieldType::Bik
            | FieldType::Account => FieldKind::Plain,
            FieldType::Header => FieldKind::Header,
        }
    }
}

/// Rating scale used when `maxRating` is absent.
pub const DEFAULT_MAX_RATING: u32 = 5;

/// Which passport sub-inputs are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassportParts {
    pub series_number: bool,
    pub issued_by: bool,
    pub issue_date: bool,
    pub department_code: bool,
    pub birth_place: bool,
}

/// Per-type payload derived from a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind<'a> {
    Text {
        multiline: bool,
        max_chars: Option<usize>,
    },
    Number {
        allow_decimals: bool,
    },
    Choice {
        options: &'a [String],
        multiple: bool,
    },
    Checkbox {
        options: &'a [String],
    },
    Ranking {
        options: &'a [String],
    },
    Rating {
        max_rating: u32,
    },
    Datetime {
        show_date: bool,
        show_time: bool,
    },
    Email {
        allowed_domains: &'a [String],
    },
    File {
        max_file_size_mb: Option<f64>,
        accepted_file_types: &'a [String],
    },
    Fullname,
    Passport(PassportParts),
    Inn {
        legal_entity: bool,
    },
    /// Free text with a placeholder only (phone, snils, ogrn, bik, account).
    Plain,
    Header,
}

/// Partial update applied by [`crate::spec::FormSchema::update_field`].
///
/// `id` and `type` are absent: they cannot change after creation.
/// Double options clear an attribute with `Some(None)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    pub label: Option<String>,
    pub placeholder: Option<Option<String>>,
    pub helper_text: Option<Option<String>>,
    pub required: Option<bool>,
    pub options: Option<Option<Vec<String>>>,
    pub correct_answers: Option<Option<Vec<String>>>,
    pub points: Option<Option<i64>>,
    pub conditional_logic: Option<Option<ConditionalLogic>>,
    pub max_rating: Option<Option<u32>>,
    pub max_chars: Option<Option<usize>>,
    pub multiline: Option<Option<bool>>,
    pub multiple: Option<Option<bool>>,
    pub allow_decimals: Option<Option<bool>>,
    pub max_file_size: Option<Option<f64>>,
    pub accepted_file_types: Option<Option<Vec<String>>>,
    pub allowed_domains: Option<Option<Vec<String>>>,
    pub sub_categories: Option<Option<BTreeMap<String, Vec<String>>>>,
    pub hide_date: Option<Option<bool>>,
    pub hide_time: Option<Option<bool>>,
    pub hide_passport_series_number: Option<Option<bool>>,
    pub hide_passport_issued_by: Option<Option<bool>>,
    pub hide_passport_issue_date: Option<Option<bool>>,
    pub hide_passport_department_code: Option<Option<bool>>,
    pub hide_passport_birth_place: Option<Option<bool>>,
    pub inn_legal_entity: Option<Option<bool>>,
}

impl FieldPatch {
    pub fn apply(self, field: &mut Field) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }

        set(&mut field.label, self.label);
        set(&mut field.placeholder, self.placeholder);
        set(&mut field.helper_text, self.helper_text);
        set(&mut field.required, self.required);
        set(&mut field.options, self.options);
        set(&mut field.correct_answers, self.correct_answers);
        set(&mut field.points, self.points);
        set(&mut field.conditional_logic, self.conditional_logic);
        set(&mut field.max_rating, self.max_rating);
        set(&mut field.max_chars, self.max_chars);
        set(&mut field.multiline, self.multiline);
        set(&mut field.multiple, self.multiple);
        set(&mut field.allow_decimals, self.allow_decimals);
        set(&mut field.max_file_size, self.max_file_size);
        set(&mut field.accepted_file_types, self.accepted_file_types);
        set(&mut field.allowed_domains, self.allowed_domains);
        set(&mut field.sub_categories, self.sub_categories);
        set(&mut field.hide_date, self.hide_date);
        set(&mut field.hide_time, self.hide_time);
        set(
            &mut field.hide_passport_series_number,
            self.hide_passport_series_number,
        );
        set(&mut field.hide_passport_issued_by, self.hide_passport_issued_by);
        set(&mut field.hide_passport_issue_date, self.hide_passport_issue_date);
        set(
            &mut field.hide_passport_department_code,
            self.hide_passport_department_code,
        );
        set(
            &mut field.hide_passport_birth_place,
            self.hide_passport_birth_place,
        );
        set(&mut field.inn_legal_entity, self.inn_legal_entity);
    }
}

use form_spec::{
    AnswerSet, Condition, ConditionalLogic, ExpectedValue, Field, FieldType, FormSchema,
    grade_visible, import_schema, resolve_visibility,
};

fn capital_quiz() -> FormSchema {
    import_schema(include_str!("fixtures/capital_quiz.json")).expect("fixture parses")
}

fn gated_schema(condition: Condition, expected: Option<ExpectedValue>) -> FormSchema {
    let mut parent = Field::new("a", FieldType::Select, "A");
    parent.options = Some(vec!["Yes".into(), "No".into()]);
    let mut child = Field::new("b", FieldType::Text, "B");
    let mut logic = ConditionalLogic::new("a", condition);
    logic.expected_value = expected;
    child.conditional_logic = Some(logic);

    let mut schema = FormSchema::new("Gated", None);
    schema.fields = vec![parent, child];
    schema
}

#[test]
fn equals_gate_follows_parent_answer() {
    let schema = gated_schema(Condition::Equals, Some(ExpectedValue::One("Yes".into())));

    let yes = resolve_visibility(&schema, &AnswerSet::new().with("a", "Yes"));
    assert_eq!(yes.get("b"), Some(&true));

    let no = resolve_visibility(&schema, &AnswerSet::new().with("a", "No"));
    assert_eq!(no.get("b"), Some(&false));

    let empty = resolve_visibility(&schema, &AnswerSet::new());
    assert_eq!(empty.get("b"), Some(&false));
    assert_eq!(empty.get("a"), Some(&true));
}

#[test]
fn answered_and_not_answered_are_complements() {
    let answered = gated_schema(Condition::Answered, None);
    let not_answered = gated_schema(Condition::NotAnswered, None);

    for answers in [
        AnswerSet::new(),
        AnswerSet::new().with("a", ""),
        AnswerSet::new().with("a", "No"),
    ] {
        let shown = resolve_visibility(&answered, &answers)["b"];
        let hidden = resolve_visibility(&not_answered, &answers)["b"];
        assert_ne!(shown, hidden);
    }
}

#[test]
fn dangling_parent_shows_field() {
    let mut schema = gated_schema(Condition::Equals, Some(ExpectedValue::One("Yes".into())));
    schema.fields.remove(0);
    let visibility = resolve_visibility(&schema, &AnswerSet::new());
    assert_eq!(visibility.get("b"), Some(&true));
}

#[test]
fn hidden_question_is_not_graded() {
    let schema = capital_quiz();

    let answers = AnswerSet::new()
        .with("travelled", "No")
        .with("capital", "paris")
        .with("fruits", vec!["Banana", "Apple"]);
    let report = grade_visible(&schema, &answers);
    assert_eq!(report.is_correct("capital"), None);
    assert_eq!(report.score, 2);
    assert_eq!(report.max_score, 2);
}

#[test]
fn visible_question_earns_its_points() {
    let schema = capital_quiz();

    let answers = AnswerSet::new()
        .with("travelled", "Yes")
        .with("capital", " PARIS ")
        .with("fruits", vec!["Apple"]);
    let report = grade_visible(&schema, &answers);
    assert_eq!(report.is_correct("capital"), Some(true));
    assert_eq!(report.is_correct("fruits"), Some(false));
    assert_eq!(report.score, 5);
    assert_eq!(report.max_score, 7);
    assert_eq!(report.percentage(), Some(71));
}

#![allow(missing_docs)]

pub mod answers;
pub mod grade;
pub mod io;
pub mod kinds;
pub mod mask;
pub mod preview;
pub mod spec;
pub mod store;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerSet, AnswerValue, ValidationError, ValidationResult};
pub use grade::{GradeReport, effective_points, grade, grade_field, grade_visible, quiz_enabled};
pub use io::{ImportError, export_file_name, export_schema, import_schema, merge_import};
pub use kinds::{AnswerKey, AnswerPart, answer_keys, locate_key, mask_for};
pub use mask::Mask;
pub use preview::{
    PreviewField, PreviewPayload, build_preview, initial_answers, render_json_ui, render_text,
};
pub use spec::{
    Condition, ConditionalLogic, Direction, EditHistory, ExpectedValue, Field, FieldKind, FieldPatch,
    FieldType, FormFolder, FormSchema,
};
pub use store::{FormRepository, KeyValueStore, MemoryStore, StoreError};
pub use validate::validate;
pub use visibility::{
    OrVisible, Visibility, VisibilityFault, VisibilityMap, is_visible, resolve_visibility,
    visible_fields,
};

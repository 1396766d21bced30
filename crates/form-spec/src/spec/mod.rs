pub mod field;
pub mod form;
pub mod history;

pub use field::{
    Condition, ConditionalLogic, DEFAULT_MAX_RATING, ExpectedValue, Field, FieldKind, FieldPatch,
    FieldType, PassportParts,
};
pub use form::{Direction, FormFolder, FormSchema, new_id, now_millis};
pub use history::{EditHistory, HISTORY_MERGE_WINDOW_MS, MAX_HISTORY};

//! Names shared by the logging macros, the error facility and the tests
//! that assert on captured events.

// Envelope carried by every `log_op_*` event
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";

// Metamodel coordinates
pub const FIELD_DEFINITION: &str = "definition";
pub const FIELD_PROPERTY: &str = "property";
pub const FIELD_RELATION: &str = "relation";
pub const FIELD_PATH: &str = "path";

// Counts reported on `end`
pub const FIELD_DEFINITION_COUNT: &str = "definition_count";
pub const FIELD_REASON_COUNT: &str = "reason_count";

// Reported on `end_error`
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";
pub const FIELD_ERR_DEFINITION: &str = "err.definition";
pub const FIELD_ERR_PROPERTY: &str = "err.property";

pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Operations
pub const OP_BUILD_DEFINITION_TREE: &str = "build_definition_tree";
pub const OP_RESOLVE_DEFAULT_VALUES: &str = "resolve_default_values";
pub const OP_LOAD_MANIFEST: &str = "load_manifest";
pub const OP_PARSE_MANIFEST: &str = "manifest_parse";
pub const OP_CONSTRAINT_ADD: &str = "constraint_add";
pub const OP_CONSTRAINT_MODIFY: &str = "constraint_modify";
pub const OP_CONSTRAINT_DELETE: &str = "constraint_delete";
pub const OP_CONSTRAINT_USABLE: &str = "constraint_usable";
pub const OP_CONSTRAINT_DELETE_ALLOWED: &str = "constraint_delete_allowed";

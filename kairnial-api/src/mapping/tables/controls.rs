use crate::mapping::{FieldDefault, FieldKind, FieldMapping as F, MappingTable};

pub static CONTROL: MappingTable = MappingTable {
    name: "control",
    fields: &[
        F::new("id", "ctrl_id", FieldKind::Int).required().read_only(),
        F::new("name", "ctrl_name", FieldKind::String).required(),
        F::new("template_id", "ctrl_tpl_id", FieldKind::Int),
        F::new("status", "ctrl_status", FieldKind::String),
        F::new("progress", "ctrl_progress", FieldKind::Int).default(FieldDefault::Int(0)),
        F::new("location", "ctrl_location", FieldKind::String),
        F::new("due_date", "ctrl_deadline", FieldKind::Date),
        F::new("created_at", "ctrl_creation", FieldKind::DateTime).read_only(),
    ],
};

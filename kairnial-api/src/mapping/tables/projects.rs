use crate::mapping::{FieldDefault, FieldKind, FieldMapping as F, MappingTable};

/// Projects as listed by the auth server and written through `projects.*`.
///
/// `rgoc` is the opaque identifier used as `project_id` in façade URLs.
pub static PROJECT: MappingTable = MappingTable {
    name: "project",
    fields: &[
        F::new("id", "project_id", FieldKind::Int).read_only(),
        F::new("uuid", "project_uuid", FieldKind::Uuid).required().read_only(),
        F::new("rgoc", "project_rgoc", FieldKind::String).read_only(),
        F::new("name", "project_name", FieldKind::String).required(),
        F::new("description", "project_description", FieldKind::String),
        F::new("address", "project_address", FieldKind::String),
        F::new("start_date", "project_start", FieldKind::Date),
        F::new("end_date", "project_end", FieldKind::Date),
        F::new("is_archived", "project_archived", FieldKind::Bool)
            .default(FieldDefault::Bool(false)),
        F::new("created_at", "project_created", FieldKind::DateTime).read_only(),
    ],
};

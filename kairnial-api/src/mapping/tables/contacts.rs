use crate::mapping::{FieldKind, FieldMapping as F, MappingTable};

pub static CONTACT: MappingTable = MappingTable {
    name: "contact",
    fields: &[
        F::new("id", "contact_id", FieldKind::Int).required().read_only(),
        F::new("first_name", "contact_firstname", FieldKind::String),
        F::new("last_name", "contact_lastname", FieldKind::String).required(),
        F::new("email", "contact_email", FieldKind::String),
        F::new("phone", "contact_phone", FieldKind::String),
        F::new("mobile", "contact_mobile", FieldKind::String),
        F::new("company", "contact_company", FieldKind::String),
        F::new("job_title", "contact_function", FieldKind::String),
        F::new("address", "contact_address", FieldKind::String),
        F::new("notes", "contact_notes", FieldKind::String),
        F::new("created_at", "contact_created", FieldKind::DateTime).read_only(),
    ],
};

//! `reserves` domain: defects ("fiches"), their templates and template elements.

use crate::mapping::{FieldDefault, FieldKind, FieldMapping as F, MappingTable};

pub static DEFECT: MappingTable = MappingTable {
    name: "defect",
    fields: &[
        F::new("id", "fiche_id", FieldKind::Int).required().read_only(),
        F::new("uuid", "fiche_guid", FieldKind::Uuid).read_only(),
        F::new("number", "fiche_num", FieldKind::Int).read_only(),
        F::new("title", "fiche_titre", FieldKind::String).required(),
        F::new("description", "fiche_desc", FieldKind::JsonString(None)),
        F::new("status", "fiche_statut", FieldKind::String),
        F::new("priority", "fiche_priorite", FieldKind::Int),
        F::new("emitter_id", "fiche_emetteur_id", FieldKind::Int),
        F::new("company", "fiche_entreprise", FieldKind::String),
        F::new("location", "fiche_localisation", FieldKind::String),
        F::new("is_closed", "fiche_cloturee", FieldKind::Bool).default(FieldDefault::Bool(false)),
        F::new("due_date", "fiche_echeance", FieldKind::Date),
        F::new("created_at", "fiche_creation", FieldKind::DateTime).read_only(),
        F::new("updated_at", "fiche_modification", FieldKind::DateTime).read_only(),
    ],
};

pub static TEMPLATE: MappingTable = MappingTable {
    name: "template",
    fields: &[
        F::new("id", "tpl_id", FieldKind::Int).required().read_only(),
        F::new("name", "tpl_name", FieldKind::String).required(),
        F::new("kind", "tpl_type", FieldKind::String),
        F::new("description", "tpl_desc", FieldKind::String),
        F::new("is_active", "tpl_active", FieldKind::Bool),
        F::new("fields", "tpl_fields", FieldKind::JsonString(None))
            .default(FieldDefault::EmptyList),
    ],
};

pub static TEMPLATE_ELEMENT: MappingTable = MappingTable {
    name: "template_element",
    fields: &[
        F::new("id", "elt_id", FieldKind::Int).required(),
        F::new("template_id", "elt_tpl_id", FieldKind::Int),
        F::new("label", "elt_label", FieldKind::String),
        F::new("kind", "elt_type", FieldKind::String),
        F::new("file_uuid", "elt_file_guid", FieldKind::Uuid),
        F::new("file_name", "elt_file_name", FieldKind::String),
        F::new("position", "elt_order", FieldKind::Int),
    ],
};

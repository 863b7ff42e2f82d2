//! `fichiers` domain: folders, documents, approval circuits and upload tickets.

use crate::mapping::{FieldDefault, FieldKind, FieldMapping as F, MappingTable};

pub static FOLDER: MappingTable = MappingTable {
    name: "folder",
    fields: &[
        F::new("id", "fcat_id", FieldKind::Int).required().read_only(),
        F::new("uuid", "fcat_guid", FieldKind::Uuid).read_only(),
        F::new("name", "fcat_name", FieldKind::String).required(),
        F::new("original_name", "fcat_originalName", FieldKind::String).read_only(),
        F::new("parent_id", "fcat_parent", FieldKind::Int).default(FieldDefault::Int(0)),
        F::new("description", "fcat_desc", FieldKind::JsonString(None)),
        F::new("position", "fcat_order", FieldKind::Int),
        F::new("is_archived", "fcat_archived", FieldKind::Bool).read_only(),
        F::new("file_count", "fcat_nbfiles", FieldKind::Int)
            .read_only()
            .default(FieldDefault::Int(0)),
        F::new("created_at", "fcat_creation", FieldKind::DateTime).read_only(),
        F::new("updated_at", "fcat_modification", FieldKind::DateTime).read_only(),
    ],
};

/// Document row as listed by `getFilesFromCat`.
pub static DOCUMENT: MappingTable = MappingTable {
    name: "document",
    fields: &[
        F::new("id", "files_id", FieldKind::Int).required().read_only(),
        F::new("uuid", "files_guid", FieldKind::Uuid).read_only(),
        F::new("folder_id", "files_fcat_id", FieldKind::Int),
        F::new("title", "files_title", FieldKind::String),
        F::new("file_name", "files_name", FieldKind::String).required(),
        F::new("extension", "files_ext", FieldKind::String),
        F::new("mime_type", "files_type", FieldKind::String),
        F::new("size", "files_size", FieldKind::Int),
        F::new("revision", "files_revision", FieldKind::String),
        F::new("status", "files_status", FieldKind::String),
        F::new("created_at", "files_creation", FieldKind::DateTime).read_only(),
        F::new("updated_at", "files_modification", FieldKind::DateTime).read_only(),
    ],
};

pub static DOCUMENT_HEADER: MappingTable = MappingTable {
    name: "document_header",
    fields: &[
        F::new("id", "entete_id", FieldKind::Int).required(),
        F::new("uuid", "entete_guid", FieldKind::Uuid),
        F::new("title", "entete_nom", FieldKind::String).required(),
        F::new("reference", "entete_ref", FieldKind::String),
        F::new("revision", "entete_indice", FieldKind::String),
        F::new("folder_id", "entete_fcat_id", FieldKind::Int),
        F::new("author", "entete_auteur", FieldKind::String),
        F::new("status", "entete_statut", FieldKind::String),
        F::new("description", "entete_desc", FieldKind::JsonString(None)),
        F::new("custom_fields", "entete_rfield", FieldKind::JsonString(None))
            .default(FieldDefault::EmptyObject),
        F::new("created_at", "entete_creation", FieldKind::DateTime),
        F::new("updated_at", "entete_modification", FieldKind::DateTime),
    ],
};

/// One step of an approval circuit attached to a document.
pub static VISA: MappingTable = MappingTable {
    name: "visa",
    fields: &[
        F::new("id", "visa_id", FieldKind::Int).required(),
        F::new("circuit_id", "visa_circuit_id", FieldKind::Int),
        F::new("user_uuid", "visa_user_uuid", FieldKind::Uuid),
        F::new("user_name", "visa_user_name", FieldKind::String),
        F::new("status", "visa_status", FieldKind::String),
        F::new("comment", "visa_comment", FieldKind::String),
        F::new("is_approved", "visa_approved", FieldKind::Bool),
        F::new("due_date", "visa_deadline", FieldKind::Date),
        F::new("signed_at", "visa_date", FieldKind::DateTime),
    ],
};

static VISA_KIND: FieldKind = FieldKind::Nested(&VISA);

/// Response of `getFilesHeaderAndVisas`.
pub static DOCUMENT_DETAIL: MappingTable = MappingTable {
    name: "document_detail",
    fields: &[
        F::new("header", "entete", FieldKind::Nested(&DOCUMENT_HEADER)).required(),
        F::new("visas", "visas", FieldKind::List(&VISA_KIND)).default(FieldDefault::EmptyList),
    ],
};

/// Metadata committed by `addFile` after a transfer.
pub static DOCUMENT_WRITE: MappingTable = MappingTable {
    name: "document_write",
    fields: &[
        F::new("folder_id", "fcat_id", FieldKind::Int).required(),
        F::new("title", "files_title", FieldKind::String),
        F::new("description", "files_desc", FieldKind::String),
        F::new("revision", "files_revision", FieldKind::String),
        F::new("rfield", "rfield", FieldKind::JsonString(None)).default(FieldDefault::EmptyList),
        F::new("linked_objects", "linkedObjects", FieldKind::JsonString(None))
            .default(FieldDefault::EmptyList),
        F::new("visas", "visas", FieldKind::JsonString(None)).default(FieldDefault::EmptyList),
    ],
};

pub static APPROVAL_CIRCUIT: MappingTable = MappingTable {
    name: "approval_circuit",
    fields: &[
        F::new("id", "circuit_id", FieldKind::Int).required().read_only(),
        F::new("name", "circuit_name", FieldKind::String).required(),
        F::new("description", "circuit_desc", FieldKind::String),
        F::new("step_count", "circuit_nbsteps", FieldKind::Int).default(FieldDefault::Int(0)),
        F::new("is_archived", "circuit_archived", FieldKind::Bool),
        F::new("steps", "circuit_steps", FieldKind::JsonString(None))
            .default(FieldDefault::EmptyList),
    ],
};

/// Shape check for the `prepareFileUpload` response.
pub static UPLOAD_TICKET: MappingTable = MappingTable {
    name: "upload_ticket",
    fields: &[
        F::new("uuid", "uuid", FieldKind::Uuid).required(),
        F::new("files_path", "files_path", FieldKind::String).required(),
        F::new("method", "method", FieldKind::String).required(),
        F::new("url", "url", FieldKind::String).required(),
    ],
};

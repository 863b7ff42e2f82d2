//! Users, groups and access-control tables (`users` and `aclmanager` domains).

use crate::mapping::{FieldDefault, FieldKind, FieldMapping as F, MappingTable};

pub static USER: MappingTable = MappingTable {
    name: "user",
    fields: &[
        F::new("id", "account_id", FieldKind::Int).required().read_only(),
        F::new("uuid", "account_uuid", FieldKind::Uuid).required(),
        F::new("first_name", "account_firstname", FieldKind::String),
        F::new("last_name", "account_lastname", FieldKind::String),
        F::new("email", "account_email", FieldKind::String),
        F::new("phone", "account_phone", FieldKind::String),
        F::new("company", "account_company", FieldKind::String),
        F::new("language", "account_language", FieldKind::String),
        F::new("is_active", "account_active", FieldKind::Bool),
        F::new("last_login", "account_lastlogin", FieldKind::DateTime).read_only(),
        F::new("created_at", "account_created", FieldKind::DateTime).read_only(),
    ],
};

pub static GROUP: MappingTable = MappingTable {
    name: "group",
    fields: &[
        F::new("id", "g_id", FieldKind::Int).required().read_only(),
        F::new("name", "g_nom", FieldKind::String).required(),
        F::new("description", "g_desc", FieldKind::String),
        F::new("is_default", "g_default", FieldKind::Bool).default(FieldDefault::Bool(false)),
        F::new("user_count", "g_nbusers", FieldKind::Int)
            .read_only()
            .default(FieldDefault::Int(0)),
        F::new("created_at", "g_creation", FieldKind::DateTime).read_only(),
    ],
};

/// A user as listed by `getUsersByGroup`.
pub static GROUP_MEMBER: MappingTable = MappingTable {
    name: "group_member",
    fields: &[
        F::new("user_id", "groups_user_id", FieldKind::Int).required(),
        F::new("user_uuid", "groups_user_uuid", FieldKind::Uuid),
        F::new("first_name", "groups_firstname", FieldKind::String),
        F::new("last_name", "groups_lastname", FieldKind::String),
        F::new("email", "groups_email", FieldKind::String),
        F::new("joined_at", "groups_date", FieldKind::DateTime),
    ],
};

/// Body of add/remove member requests.
pub static GROUP_MEMBERSHIP: MappingTable = MappingTable {
    name: "group_membership",
    fields: &[F::new("user_uuid", "groups_user_uuid", FieldKind::Uuid).required()],
};

pub static ACL_GRANT: MappingTable = MappingTable {
    name: "acl_grant",
    fields: &[
        F::new("code", "acl_code", FieldKind::String).required(),
        F::new("label", "acl_label", FieldKind::String),
        F::new("module", "acl_module", FieldKind::String),
        F::new("granted", "acl_granted", FieldKind::Bool),
    ],
};

pub static MODULE: MappingTable = MappingTable {
    name: "module",
    fields: &[
        F::new("id", "module_id", FieldKind::Int).required(),
        F::new("code", "module_code", FieldKind::String).required(),
        F::new("name", "module_name", FieldKind::String),
        F::new("is_enabled", "module_active", FieldKind::Bool),
        F::new("settings", "module_settings", FieldKind::JsonString(None))
            .default(FieldDefault::EmptyObject),
    ],
};

/// Users or companies allowed to emit defects.
pub static EMITTER: MappingTable = MappingTable {
    name: "emitter",
    fields: &[
        F::new("id", "emitter_id", FieldKind::Int).required(),
        F::new("name", "emitter_name", FieldKind::String),
        F::new("company", "emitter_company", FieldKind::String),
        F::new("kind", "emitter_type", FieldKind::String),
    ],
};

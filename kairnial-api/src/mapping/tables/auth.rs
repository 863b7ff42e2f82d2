use crate::mapping::{FieldKind, FieldMapping as F, MappingTable};

/// `user` object returned by the auth server alongside an access token.
pub static AUTH_USER: MappingTable = MappingTable {
    name: "auth_user",
    fields: &[
        F::new("uuid", "uuid", FieldKind::Uuid).required(),
        F::new("first_name", "first_name", FieldKind::String),
        F::new("last_name", "last_name", FieldKind::String),
        F::new("email", "email", FieldKind::String),
    ],
};

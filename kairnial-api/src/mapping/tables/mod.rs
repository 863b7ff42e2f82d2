//! Per-entity mapping tables.
//!
//! Upstream speaks several naming dialects (`account_*`, `g_*`, `fcat_*`,
//! `entete_*`, `fiche_*`, ...); each table pins one of them to the public
//! vocabulary.

pub mod admin;
pub mod auth;
pub mod contacts;
pub mod controls;
pub mod defects;
pub mod dms;
pub mod projects;

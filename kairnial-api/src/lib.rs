pub mod config;
pub mod dtos;
pub mod facets;
pub mod handlers;
pub mod mapping;
pub mod middleware;
pub mod services;
pub mod startup;

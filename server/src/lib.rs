//! Reference directory server: an in-memory store exposed over GraphQL.

pub mod config;
pub mod data;
pub mod graphql;
pub mod http;

pub use config::ServerConfig;
pub use data::DirectoryData;
pub use graphql::{DirectorySchema, build_schema};
pub use http::{AppState, ServeConfig, build_router, serve, serve_on};

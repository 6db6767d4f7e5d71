pub mod api;
pub mod client;
pub mod schema;

pub use client::NotionClient;

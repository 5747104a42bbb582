//! Backend HTTP client

pub mod client;
pub mod deployments;
pub mod inventory;
pub mod templates;

pub use client::HttpClient;
pub use templates::TemplateRef;

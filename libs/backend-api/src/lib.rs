//! Wire types for the deployment dashboard backend API.
//!
//! Only request/response envelopes live here. The deployment template itself
//! is part of the `ftdash` data model and is carried through these envelopes
//! as a type parameter.

pub mod models;

pub use models::*;

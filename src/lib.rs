//! Marketing copy generation for catalog products.
//!
//! The service half exposes `POST /autogen`: given a product title and feature
//! list it finds the closest QVC UK catalog product, pulls its full record, and
//! writes short-form marketing copy for it. The panel half is the interactive
//! front end that submits to that endpoint, normalizes whatever comes back, and
//! reveals the copy character by character.

pub mod catalog;
pub mod client;
pub mod copywriter;
pub mod models;
pub mod panel;
pub mod reveal;
pub mod routes;

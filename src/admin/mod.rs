// Admin panel front door

//! Routing of admin chat input: menu actions, wizard start triggers, and
//! everything else forwarded to the wizard engine.

pub mod router;

pub use router::{AdminRouter, Routed};

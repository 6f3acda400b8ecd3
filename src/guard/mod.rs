//! Route protection before and after a page has loaded.

pub mod client;
pub mod edge;
pub mod policy;

pub use client::{ClientDecision, ClientRouteGuard};
pub use edge::{edge_guard, EdgeDecision, EdgeRouteGuard};
pub use policy::{Access, GuardPolicy};

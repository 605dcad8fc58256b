//! servicectl library
//!
//! Idempotent service lifecycle management across init systems. A
//! [`reconcile::ServiceSpec`] describes the desired state; the
//! [`reconcile::Reconciler`] picks a backend, reads the current state and
//! runs only the primitives needed to get there.

pub mod backends;
pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod facts;
pub mod reconcile;
pub mod report;
pub mod validation;

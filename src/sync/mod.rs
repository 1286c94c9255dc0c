//! The role synchronization engine.
//!
//! [`reconcile::Reconciler`] drives one member through
//! resolution ([`crate::guild::resolve`]), [`mapping`], [`guard`] and [`mutator`];
//! [`batch`] runs it over many members.

pub(crate) mod batch;
pub(crate) mod guard;
pub(crate) mod mapping;
pub(crate) mod mutator;
pub(crate) mod reconcile;

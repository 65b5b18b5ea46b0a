//! Contains the in-memory entity graph.
//!
//! * [ids] translates between ADM ids and compact identifiers and numbers all other entities.
//! * [values] provides the typed attribute values.
//! * [entities] stores the attribute records per identifier.
//! * [relationships] stores the containment and reference edges between entities.
pub mod entities;
pub mod ids;
pub mod relationships;
pub mod values;

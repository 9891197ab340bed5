//! Classforge class-diagram IR
//!
//! This crate owns the *input side* of the generator:
//!
//! - `ir`: the normalized, immutable diagram representation (classes,
//!   relationships, association tables),
//! - `ingest`: JSON → IR, including attribute shorthand normalization,
//! - `digest`: deterministic synthetic ids.
//!
//! Everything downstream (classification, prediction, code generation) lives in
//! `classforge-codegen` and only ever sees the canonical IR defined here.

pub mod digest;
pub mod ingest;
pub mod ir;

pub use ingest::{parse_diagram, parse_diagram_value, ParseError};
pub use ir::{
    AssociationTable, Attribute, ClassId, ClassNode, Diagram, Multiplicity, Relationship,
    RelationshipKind, Stereotype, Visibility,
};

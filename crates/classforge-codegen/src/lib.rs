//! Classforge code generation
//!
//! Turns a [`Diagram`] into a layered Spring Boot / JPA backend: entities,
//! DTOs, mappers, repositories, services and controllers.
//!
//! The pipeline is a single synchronous pass:
//!
//! 1. [`model::Model::build`] resolves inheritance, classifies every edge and
//!    settles primary keys and attribute roles.
//! 2. [`metadata::Metadata::build`] plans every entity, join entity and DTO
//!    and predicts the accessor surface each of them will expose.
//! 3. The renderers emit artifacts. Any cross-artifact call they write is
//!    checked against the prediction first; unpredicted calls are dropped
//!    with a consistency diagnostic instead of producing code that does not
//!    compile.
//!
//! Generation never fails once the diagram has been parsed. Everything that
//! is ambiguous or inconsistent ends up in [`GenerationOutput::diagnostics`].

pub mod classify;
pub mod config;
pub mod controller;
pub mod diagnostics;
pub mod dto;
pub mod entity;
pub mod inheritance;
pub mod java_types;
pub mod join_entity;
pub mod mapper;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod repository;
pub mod service;
pub mod source;

pub use config::GeneratorConfig;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use metadata::{Accessor, Metadata, MethodSurface};
pub use model::Model;

use classforge_diagram::{parse_diagram, ClassId, Diagram, ParseError};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Entity,
    Dto,
    Mapper,
    Repository,
    Service,
    Controller,
}

impl ArtifactKind {
    /// Output directory, which is also the Java sub-package.
    pub fn directory(self) -> &'static str {
        match self {
            Self::Entity => "entities",
            Self::Dto => "dto",
            Self::Mapper => "mappers",
            Self::Repository => "repositories",
            Self::Service => "services",
            Self::Controller => "controllers",
        }
    }
}

/// One generated Java file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub relative_path: String,
    pub content: String,
}

impl Artifact {
    pub(crate) fn new(kind: ArtifactKind, type_name: &str, content: String) -> Self {
        Self {
            kind,
            relative_path: format!("{}/{type_name}.java", kind.directory()),
            content,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOutput {
    pub artifacts: Vec<Artifact>,
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    pub fn artifact(&self, relative_path: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.relative_path == relative_path)
    }

    pub fn of_kind(&self, kind: ArtifactKind) -> impl Iterator<Item = &Artifact> {
        self.artifacts.iter().filter(move |a| a.kind == kind)
    }
}

/// The accessor prediction on its own, as printed by `classforge surface`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceReport {
    pub surfaces: BTreeMap<ClassId, MethodSurface>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Generate every artifact for `diagram`, grouped by kind in directory order.
pub fn generate(diagram: &Diagram, config: &GeneratorConfig) -> GenerationOutput {
    let mut diags = Diagnostics::new();
    let model = Model::build(diagram, config, &mut diags);
    let metadata = Metadata::build(&model, &mut diags);
    let class_ids: Vec<&str> = diagram.classes.iter().map(|c| c.id.as_str()).collect();

    let mut artifacts = Vec::new();

    for id in &class_ids {
        if let Some(plan) = metadata.entity(id) {
            artifacts.push(entity::render(&model, &metadata, plan, &mut diags));
        }
    }
    for table in &diagram.association_tables {
        if let Some(plan) = metadata.join(table.id()) {
            artifacts.extend(join_entity::render(&model, &metadata, plan, &mut diags));
        }
    }

    for id in &class_ids {
        if let Some(plan) = metadata.dto(id) {
            artifacts.push(dto::render(&model, plan));
        }
    }

    for id in &class_ids {
        artifacts.extend(mapper::render(&model, &metadata, id, &mut diags));
    }

    for id in &class_ids {
        artifacts.extend(repository::render(&model, &metadata, id, &mut diags));
    }
    for table in &diagram.association_tables {
        if let Some(plan) = metadata.join(table.id()) {
            artifacts.push(repository::render_join(&model, &metadata, plan));
        }
    }

    for id in &class_ids {
        artifacts.extend(service::render(&model, &metadata, id, &mut diags));
    }

    for id in &class_ids {
        artifacts.extend(controller::render(&model, &metadata, id, &mut diags));
    }

    tracing::info!(
        artifacts = artifacts.len(),
        diagnostics = diags.len(),
        "generation finished"
    );
    GenerationOutput {
        artifacts,
        diagnostics: diags.into_vec(),
    }
}

/// Parse diagram JSON and generate. Parsing is the only step that can fail.
pub fn generate_from_json(text: &str, config: &GeneratorConfig) -> Result<GenerationOutput, ParseError> {
    let diagram = parse_diagram(text)?;
    Ok(generate(&diagram, config))
}

/// Run classification and prediction without rendering anything.
pub fn predict_surfaces(diagram: &Diagram, config: &GeneratorConfig) -> SurfaceReport {
    let mut diags = Diagnostics::new();
    let model = Model::build(diagram, config, &mut diags);
    let metadata = Metadata::build(&model, &mut diags);
    SurfaceReport {
        surfaces: metadata.surfaces().clone(),
        diagnostics: diags.into_vec(),
    }
}

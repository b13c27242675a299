//! Scene codec
//!
//! Layout of an encoded scene:
//!
//! ```text
//! { name: "Level", id: "<uuid>", entities: [
//!     { id: 0, Tag: { name: "Ship" }, Transform: { .. }, Hierarchy: { .. } },
//!     ..
//! ] }
//! ```
//!
//! Every registered component present on an entity gets a field named after
//! it. `TransformMatrixComponent` is derived and never stored.

use std::fmt;
use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

use crate::assets::{AssetHandle, AssetResolver, MemoryRepresentation};
use crate::core::config::SerializationConfig;
use crate::ecs::components::{HierarchyComponent, TransformMatrixComponent};
use crate::ecs::{ComponentRegistry, EntityId, Scene, SceneId, SerializableComponent};
use crate::serialization::{DecodeError, DecodePolicy, Field, FieldTree};

const ID_FIELD: &str = "id";
const NAME_FIELD: &str = "name";
const ENTITIES_FIELD: &str = "entities";

/// Scene (de)serialization errors
#[derive(Debug, Error)]
pub enum SerializationError {
    /// RON text could not be produced
    #[error("RON encode error: {0}")]
    RonEncode(#[from] ron::Error),

    /// RON text could not be parsed
    #[error("RON parse error: {0}")]
    RonParse(#[from] ron::error::SpannedError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The tree is not a scene
    #[error("scene tree has no '{0}' field")]
    MissingField(&'static str),
}

/// A problem found while loading that did not stop the load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadIssue {
    /// Entity being loaded, null if the record itself was unusable
    pub entity: EntityId,
    /// Component or field concerned
    pub component: Option<String>,
    /// What went wrong
    pub message: String,
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.component {
            Some(component) => write!(f, "{} [{}]: {}", self.entity, component, self.message),
            None => write!(f, "{}: {}", self.entity, self.message),
        }
    }
}

/// Result of a load: the entities created and everything that went wrong
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Entities created, in record order
    pub entities: Vec<EntityId>,
    /// Non-fatal problems
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    /// Whether the scene loaded without any issue
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Per-entity state handed to component decoders
pub struct DecodeContext<'a> {
    resolver: &'a dyn AssetResolver,
    entity: EntityId,
    issues: &'a mut Vec<LoadIssue>,
}

impl<'a> DecodeContext<'a> {
    /// Create a context for decoding `entity`
    pub fn new(resolver: &'a dyn AssetResolver, entity: EntityId, issues: &'a mut Vec<LoadIssue>) -> Self {
        Self { resolver, entity, issues }
    }

    /// Entity being decoded
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Resolve an asset reference and request `representation` of it.
    ///
    /// Unknown assets are reported and yield `None` so the field loads
    /// empty instead of dangling.
    pub fn resolve_asset(
        &mut self,
        field: &str,
        handle: AssetHandle,
        representation: MemoryRepresentation,
    ) -> Option<AssetHandle> {
        if !self.resolver.resolve(&handle) {
            self.report(field, format!("unresolved asset {handle}"));
            return None;
        }
        if !self.resolver.request(&handle, representation) {
            self.report(field, format!("{representation:?} representation of {handle} unavailable"));
        }
        Some(handle)
    }

    /// Record a non-fatal problem with this entity
    pub fn report(&mut self, component: &str, message: impl Into<String>) {
        push_issue(self.issues, self.entity, Some(component), message.into());
    }
}

fn push_issue(issues: &mut Vec<LoadIssue>, entity: EntityId, component: Option<&str>, message: String) {
    let issue = LoadIssue {
        entity,
        component: component.map(str::to_string),
        message,
    };
    log::warn!("Scene load: {}", issue);
    issues.push(issue);
}

/// Encodes scenes to field trees and back
#[derive(Debug, Clone)]
pub struct SceneSerializer {
    registry: ComponentRegistry,
    policy: DecodePolicy,
    pretty: bool,
}

impl Default for SceneSerializer {
    fn default() -> Self {
        Self::new(ComponentRegistry::with_builtin())
    }
}

impl SceneSerializer {
    /// Create a serializer over `registry` with the default decode policy
    pub fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry,
            policy: DecodePolicy::default(),
            pretty: true,
        }
    }

    /// Apply file and decode settings
    pub fn with_config(mut self, config: &SerializationConfig) -> Self {
        self.policy = config.decode_policy;
        self.pretty = config.pretty;
        self
    }

    /// Set the decode failure policy
    pub fn with_policy(mut self, policy: DecodePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Component registry
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Mutable component registry, for registering custom components
    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Encode every live entity of `scene`
    pub fn serialize(&self, scene: &Scene) -> FieldTree {
        let records: Vec<FieldTree> = scene
            .entities()
            .map(|entity| {
                let mut record = FieldTree::new().with(ID_FIELD, entity);
                for descriptor in self.registry.iter() {
                    if let Some(component) = descriptor.encode(scene, entity) {
                        record.set(descriptor.name(), component);
                    }
                }
                record
            })
            .collect();

        FieldTree::new()
            .with(NAME_FIELD, scene.name())
            .with(ID_FIELD, scene.id().uuid())
            .with(ENTITIES_FIELD, records)
    }

    /// Decode a scene tree into a new scene
    pub fn deserialize(
        &self,
        tree: &FieldTree,
        resolver: &dyn AssetResolver,
    ) -> Result<(Scene, LoadReport), SerializationError> {
        let id = match tree.get::<Uuid>(ID_FIELD) {
            Ok(uuid) => SceneId::from_uuid(uuid),
            Err(err) => {
                log::warn!("Scene tree has no usable id ({}), assigning a new one", err);
                SceneId::generate()
            }
        };
        let name = tree.get_or(NAME_FIELD, String::from("Untitled"))
            .unwrap_or_else(|_| String::from("Untitled"));

        let mut scene = Scene::with_id(id, name);
        let report = self.deserialize_into(tree, &mut scene, resolver)?;
        Ok((scene, report))
    }

    /// Decode the entity records of `tree` into `scene`.
    ///
    /// Entities keep their stored ids when those are free in `scene`.
    /// Malformed components are handled by the decode policy and never
    /// abort the load. Hierarchy links that do not form consistent rings
    /// are cleared and reported.
    pub fn deserialize_into(
        &self,
        tree: &FieldTree,
        scene: &mut Scene,
        resolver: &dyn AssetResolver,
    ) -> Result<LoadReport, SerializationError> {
        let records = tree
            .sequence(ENTITIES_FIELD)
            .ok_or(SerializationError::MissingField(ENTITIES_FIELD))?;

        let mut report = LoadReport::default();
        for record in records {
            let hint = match record.get::<EntityId>(ID_FIELD) {
                Ok(id) if id.is_valid() => id,
                Ok(_) => {
                    push_issue(&mut report.issues, EntityId::NULL, None, "record has a null id".into());
                    continue;
                }
                Err(err) => {
                    push_issue(&mut report.issues, EntityId::NULL, None, format!("record skipped: {err}"));
                    continue;
                }
            };

            let Some(entity) = scene.try_create_empty_entity(Some(hint)) else {
                push_issue(&mut report.issues, hint, None, "record skipped: no free entity id".into());
                continue;
            };
            if entity != hint {
                push_issue(
                    &mut report.issues,
                    entity,
                    None,
                    format!("stored id {hint} is taken or out of range; links to it now point elsewhere"),
                );
            }
            scene.insert(entity, TransformMatrixComponent::default());
            self.decode_components(record, scene, entity, resolver, &mut report.issues);
            report.entities.push(entity);
        }

        for (entity, violation) in scene.repair_hierarchy() {
            push_issue(
                &mut report.issues,
                entity,
                Some(HierarchyComponent::NAME),
                format!("{violation}; links cleared"),
            );
        }
        scene.propagate_transforms();
        log::info!(
            "Loaded {} entities into scene '{}' ({} issues)",
            report.entities.len(),
            scene.name(),
            report.issues.len()
        );
        Ok(report)
    }

    fn decode_components(
        &self,
        record: &FieldTree,
        scene: &mut Scene,
        entity: EntityId,
        resolver: &dyn AssetResolver,
        issues: &mut Vec<LoadIssue>,
    ) {
        for (name, field) in record.iter() {
            if name == ID_FIELD {
                continue;
            }
            let Some(descriptor) = self.registry.get(name) else {
                push_issue(issues, entity, Some(name), "unknown component ignored".into());
                continue;
            };

            let result = match field {
                Field::Tree(component) => {
                    let mut ctx = DecodeContext::new(resolver, entity, issues);
                    descriptor.decode(scene, entity, component, &mut ctx)
                }
                other => Err(DecodeError::TypeMismatch {
                    field: name.to_string(),
                    expected: "component tree",
                    found: other.kind(),
                }),
            };

            if let Err(err) = result {
                match self.policy {
                    DecodePolicy::DefaultInitialize => {
                        descriptor.insert_default(scene, entity);
                        push_issue(issues, entity, Some(name), format!("{err}; default used"));
                    }
                    DecodePolicy::SkipComponent => {
                        push_issue(issues, entity, Some(name), format!("{err}; component skipped"));
                    }
                }
            }
        }
    }

    /// Encode `scene` as RON text
    pub fn to_ron_string(&self, scene: &Scene) -> Result<String, SerializationError> {
        let tree = self.serialize(scene);
        let text = if self.pretty {
            ron::ser::to_string_pretty(&tree, ron::ser::PrettyConfig::default())?
        } else {
            ron::to_string(&tree)?
        };
        Ok(text)
    }

    /// Decode a scene from RON text
    pub fn from_ron_str(
        &self,
        text: &str,
        resolver: &dyn AssetResolver,
    ) -> Result<(Scene, LoadReport), SerializationError> {
        let tree: FieldTree = ron::from_str(text)?;
        self.deserialize(&tree, resolver)
    }

    /// Write `scene` to a RON file
    pub fn save_to_file(&self, scene: &Scene, path: impl AsRef<Path>) -> Result<(), SerializationError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_ron_string(scene)?)?;
        log::info!("Saved scene '{}' to {}", scene.name(), path.display());
        Ok(())
    }

    /// Read a scene from a RON file
    pub fn load_from_file(
        &self,
        path: impl AsRef<Path>,
        resolver: &dyn AssetResolver,
    ) -> Result<(Scene, LoadReport), SerializationError> {
        let text = std::fs::read_to_string(path)?;
        self.from_ron_str(&text, resolver)
    }
}

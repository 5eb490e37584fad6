//! An in-memory [`Host`] backed by the file system.

use std::path::PathBuf;

use indexmap::IndexSet;
use log::{debug, warn};

use animalab_core::{
    behaviour::{Schema, SchemaRegistry, TypeHandle},
    resource::{AssetRef, ResourceKind},
};
use animalab_parser::{Host, ObjectRef};

use crate::{config::AppConfig, error::AnimalabError};

/// A host that keeps everything it is handed.
///
/// Resource references are checked against an optional asset root: a plain
/// path (or the path part of `path#sub`) must name an existing file below
/// it, while `{guid}` references are accepted as they are. Without a root
/// every reference resolves.
#[derive(Debug, Default)]
pub struct MemoryHost {
    registry: SchemaRegistry,
    asset_root: Option<PathBuf>,
    persisted: Vec<(ObjectRef, String)>,
    dependencies: IndexSet<String>,
    warnings: Vec<String>,
}

impl MemoryHost {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Builds a host from the behaviour types and asset root of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AnimalabError::Config`] if the asset root is not a
    /// directory.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnimalabError> {
        let mut host = Self::new(config.schema_registry());
        if let Some(root) = config.assets().root() {
            if !root.is_dir() {
                return Err(AnimalabError::Config(format!(
                    "asset root `{}` is not a directory",
                    root.display()
                )));
            }
            host.asset_root = Some(root.to_path_buf());
        }
        Ok(host)
    }

    pub fn with_asset_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.asset_root = Some(root.into());
        self
    }

    pub fn registry_mut(&mut self) -> &mut SchemaRegistry {
        &mut self.registry
    }

    /// Objects in the order they were persisted, with their unique names.
    pub fn persisted(&self) -> &[(ObjectRef, String)] {
        &self.persisted
    }

    /// Every resource path the document resolved, without duplicates.
    pub fn dependencies(&self) -> impl Iterator<Item = &str> {
        self.dependencies.iter().map(String::as_str)
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Host for MemoryHost {
    fn resolve_resource(&mut self, reference: &str, kind: ResourceKind) -> Option<AssetRef> {
        let asset = AssetRef::new(reference, kind);
        if asset.guid().is_some() {
            self.dependencies.insert(reference.to_string());
            return Some(asset);
        }
        let (path, _) = asset.fragment();
        if path.is_empty() {
            return None;
        }
        if let Some(root) = &self.asset_root {
            let file = root.join(path.trim_start_matches("./"));
            if !file.is_file() {
                debug!(reference, kind:% = kind; "Resource not found");
                return None;
            }
        }
        self.dependencies.insert(path.to_string());
        Some(asset)
    }

    fn persist(&mut self, object: ObjectRef, unique_name: &str) {
        self.persisted.push((object, unique_name.to_string()));
    }

    fn resolve_behaviour_type(&self, name: &str) -> Option<TypeHandle> {
        self.registry.resolve(name)
    }

    fn introspect_schema(&self, handle: TypeHandle) -> Option<&Schema> {
        self.registry.schema(handle)
    }

    fn warn(&mut self, message: &str) {
        warn!(message; "Document warning");
        self.warnings.push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_references_without_root() {
        let mut host = MemoryHost::default();
        let clip = host.resolve_resource("Clips/run.anim", ResourceKind::AnimationClip);
        assert_eq!(clip.map(|c| c.reference().to_string()), Some("Clips/run.anim".into()));
        assert!(host.resolve_resource("", ResourceKind::Object).is_none());
        host.resolve_resource("Clips/run.anim#Run", ResourceKind::AnimationClip);
        assert_eq!(host.dependencies().collect::<Vec<_>>(), ["Clips/run.anim"]);
    }

    #[test]
    fn test_references_under_root() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::create_dir_all(dir.path().join("Clips")).expect("clips dir");
        fs::write(dir.path().join("Clips/idle.anim"), "").expect("clip file");

        let mut host = MemoryHost::default().with_asset_root(dir.path());
        assert!(host
            .resolve_resource("Clips/idle.anim", ResourceKind::AnimationClip)
            .is_some());
        assert!(host
            .resolve_resource("./Clips/idle.anim#Idle", ResourceKind::AnimationClip)
            .is_some());
        assert!(host
            .resolve_resource("Clips/walk.anim", ResourceKind::AnimationClip)
            .is_none());
        assert!(host
            .resolve_resource("{6f1c2a}", ResourceKind::AnimationClip)
            .is_some());
    }

    #[test]
    fn test_missing_root_is_config_error() {
        let config: AppConfig = toml::from_str("[assets]\nroot = \"/definitely/not/here\"")
            .expect("valid config");
        assert!(matches!(
            MemoryHost::from_config(&config),
            Err(AnimalabError::Config(_))
        ));
    }
}

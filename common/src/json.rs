//! JSON-backed system definition serialization.

use crate::model::{Node, SystemDefinition};
use crate::serializer::{SerializeError, SystemDefinitionSerializer};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores a node's system definition as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSystemDefinitionSerializer;

impl SystemDefinitionSerializer for JsonSystemDefinitionSerializer {
    fn save(&self, node: &Node, path: &Path) -> Result<Vec<PathBuf>, SerializeError> {
        let json =
            serde_json::to_string_pretty(node).map_err(|e| SerializeError::json(path, e))?;
        fs::write(path, json).map_err(|e| SerializeError::io(path, e))?;
        debug!("wrote system definition for node {} to {}", node.name(), path.display());
        Ok(vec![path.to_path_buf()])
    }

    fn load(&self, path: &Path) -> Result<Node, SerializeError> {
        let content = fs::read_to_string(path).map_err(|e| SerializeError::io(path, e))?;
        serde_json::from_str(&content).map_err(|e| SerializeError::json(path, e))
    }
}

/// Read a whole [`SystemDefinition`] from a JSON file.
///
/// This is the input format accepted by the `xcfg build` command.
///
/// # Errors
///
/// Returns [`SerializeError::Io`] if the file cannot be read and
/// [`SerializeError::Json`] if it is not a valid system definition.
pub fn read_system_definition(path: &Path) -> Result<SystemDefinition, SerializeError> {
    let content = fs::read_to_string(path).map_err(|e| SerializeError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| SerializeError::json(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().expect("temp dir creation succeeds")
    }

    #[rstest]
    fn save_then_load_preserves_node(temp_dir: TempDir) {
        let path = temp_dir.path().join("node.sysdef");
        let node = Node::new("ECU_A", "ESX3CM").with_property("bitrate", "250");

        let written = JsonSystemDefinitionSerializer
            .save(&node, &path)
            .expect("save succeeds");
        assert_eq!(written, vec![path.clone()]);

        let loaded = JsonSystemDefinitionSerializer.load(&path).expect("load");
        assert_eq!(loaded, node);
    }

    #[rstest]
    fn save_into_missing_directory_is_io_error(temp_dir: TempDir) {
        let path = temp_dir.path().join("missing").join("node.sysdef");
        let result = JsonSystemDefinitionSerializer.save(&Node::new("N", "T"), &path);
        assert!(matches!(result, Err(SerializeError::Io { .. })));
    }

    #[rstest]
    fn load_rejects_garbage(temp_dir: TempDir) {
        let path = temp_dir.path().join("node.sysdef");
        fs::write(&path, "not json").expect("write");
        let result = JsonSystemDefinitionSerializer.load(&path);
        assert!(matches!(result, Err(SerializeError::Json { .. })));
    }

    #[rstest]
    fn reads_system_definition_file(temp_dir: TempDir) {
        let path = temp_dir.path().join("system.json");
        fs::write(
            &path,
            r#"{"nodes":[{"name":"ECU_A","device_type":"ESX3CM"}],
                "devices":[{"device_type":"ESX3CM","description":"ctrl"}]}"#,
        )
        .expect("write");

        let system = read_system_definition(&path).expect("parse");
        assert!(system.find_node("ECU_A").is_some());
        assert_eq!(system.devices().len(), 1);
    }
}

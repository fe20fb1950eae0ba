//! Device definition index serialization.
//!
//! Device definitions are stored as one JSON file per device type
//! (`<device_type>.devdef`) next to an INI-style index listing them:
//!
//! ```text
//! [DEVICES]
//! NumberOfDevices=2
//! Device1=ESX3CM.devdef
//! Device2=ESX3CS.devdef
//! ```

use crate::model::DeviceDefinition;
use crate::serializer::{DeviceDefinitionSerializer, SerializeError};
use ini::Ini;
use log::debug;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension given to individual device definition files.
pub const DEVICE_FILE_EXTENSION: &str = "devdef";

const SECTION: &str = "DEVICES";
const COUNT_KEY: &str = "NumberOfDevices";
const ENTRY_PREFIX: &str = "Device";

/// Writes device definitions as an INI index plus JSON device files.
#[derive(Debug, Clone, Copy, Default)]
pub struct IniDeviceDefinitionSerializer;

impl DeviceDefinitionSerializer for IniDeviceDefinitionSerializer {
    fn save(
        &self,
        devices: &[DeviceDefinition],
        index_path: &Path,
    ) -> Result<Vec<PathBuf>, SerializeError> {
        let dir = index_path.parent().unwrap_or_else(|| Path::new("."));
        let file_names = device_file_names(devices)?;

        build_index(&file_names)
            .write_to_file(index_path)
            .map_err(|e| SerializeError::io(index_path, e))?;
        let mut written = vec![index_path.to_path_buf()];

        for (device, file_name) in devices.iter().zip(&file_names) {
            let path = dir.join(file_name);
            let json = serde_json::to_string_pretty(device)
                .map_err(|e| SerializeError::json(&path, e))?;
            fs::write(&path, json).map_err(|e| SerializeError::io(&path, e))?;
            written.push(path);
        }

        debug!(
            "wrote device index {} with {} device(s)",
            index_path.display(),
            devices.len()
        );
        Ok(written)
    }

    fn load(&self, index_path: &Path) -> Result<Vec<DeviceDefinition>, SerializeError> {
        let content =
            fs::read_to_string(index_path).map_err(|e| SerializeError::io(index_path, e))?;
        let dir = index_path.parent().unwrap_or_else(|| Path::new("."));

        parse_index(&content)
            .map_err(|reason| SerializeError::InvalidIndex {
                path: index_path.to_path_buf(),
                reason,
            })?
            .into_iter()
            .map(|file_name| {
                let path = dir.join(file_name);
                let json = fs::read_to_string(&path).map_err(|e| SerializeError::io(&path, e))?;
                serde_json::from_str(&json).map_err(|e| SerializeError::json(&path, e))
            })
            .collect()
    }
}

/// Derive one file name per device, refusing types that would collide.
fn device_file_names(devices: &[DeviceDefinition]) -> Result<Vec<String>, SerializeError> {
    let mut seen = HashSet::new();
    devices
        .iter()
        .map(|device| {
            let device_type = device.device_type();
            if !seen.insert(device_type) {
                return Err(SerializeError::DuplicateDeviceType(device_type.to_owned()));
            }
            device_file_name(device_type)
        })
        .collect()
}

/// Derive the device file name for a device type.
fn device_file_name(device_type: &str) -> Result<String, SerializeError> {
    let usable = !device_type.is_empty()
        && device_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !device_type.starts_with('.');
    if usable {
        Ok(format!("{device_type}.{DEVICE_FILE_EXTENSION}"))
    } else {
        Err(SerializeError::InvalidDeviceType(device_type.to_owned()))
    }
}

fn build_index(file_names: &[String]) -> Ini {
    let mut index = Ini::new();
    index
        .with_section(Some(SECTION))
        .set(COUNT_KEY, file_names.len().to_string());
    for (i, name) in file_names.iter().enumerate() {
        index
            .with_section(Some(SECTION))
            .set(format!("{ENTRY_PREFIX}{}", i + 1), name.as_str());
    }
    index
}

/// Parse the index body into the ordered list of referenced file names.
fn parse_index(content: &str) -> Result<Vec<String>, String> {
    let index = Ini::load_from_str(content).map_err(|e| e.to_string())?;
    let section = index
        .section(Some(SECTION))
        .ok_or_else(|| format!("missing [{SECTION}] section"))?;

    let mut count = None;
    let mut entries = Vec::new();
    for (key, value) in section.iter() {
        if key == COUNT_KEY {
            count = Some(
                value
                    .parse::<usize>()
                    .map_err(|_| format!("{COUNT_KEY} is not a number: \"{value}\""))?,
            );
        } else if let Some(number) = key.strip_prefix(ENTRY_PREFIX) {
            let number = number
                .parse::<usize>()
                .map_err(|_| format!("bad device key \"{key}\""))?;
            entries.push((number, value.to_owned()));
        } else {
            return Err(format!("unknown key \"{key}\""));
        }
    }

    let count = count.ok_or_else(|| format!("missing {COUNT_KEY}"))?;
    entries.sort_by_key(|(number, _)| *number);
    let expected: Vec<usize> = (1..=count).collect();
    let found: Vec<usize> = entries.iter().map(|(number, _)| *number).collect();
    if found != expected {
        return Err(format!(
            "expected {count} device entries numbered from 1, found {found:?}"
        ));
    }
    Ok(entries.into_iter().map(|(_, name)| name).collect())
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

    fn devices() -> Vec<DeviceDefinition> {
        vec![
            DeviceDefinition::new("ESX3CM", "main controller").with_property("flash", "2MB"),
            DeviceDefinition::new("ESX3CS", "satellite"),
        ]
    }

    #[rstest]
    fn save_writes_index_and_device_files(temp_dir: TempDir) {
        let index = temp_dir.path().join("devices.ini");
        let written = IniDeviceDefinitionSerializer
            .save(&devices(), &index)
            .expect("save succeeds");

        assert_eq!(
            written,
            vec![
                index.clone(),
                temp_dir.path().join("ESX3CM.devdef"),
                temp_dir.path().join("ESX3CS.devdef"),
            ]
        );
        let body = Ini::load_from_file(&index).expect("index is valid INI");
        let section = body.section(Some("DEVICES")).expect("DEVICES section");
        assert_eq!(section.get("NumberOfDevices"), Some("2"));
        assert_eq!(section.get("Device2"), Some("ESX3CS.devdef"));
    }

    #[rstest]
    fn load_restores_saved_devices(temp_dir: TempDir) {
        let index = temp_dir.path().join("devices.ini");
        IniDeviceDefinitionSerializer
            .save(&devices(), &index)
            .expect("save succeeds");
        let loaded = IniDeviceDefinitionSerializer.load(&index).expect("load");
        assert_eq!(loaded, devices());
    }

    #[rstest]
    fn empty_device_list_writes_empty_index(temp_dir: TempDir) {
        let index = temp_dir.path().join("devices.ini");
        let written = IniDeviceDefinitionSerializer
            .save(&[], &index)
            .expect("save succeeds");
        assert_eq!(written, vec![index.clone()]);
        assert!(
            IniDeviceDefinitionSerializer
                .load(&index)
                .expect("load")
                .is_empty()
        );
    }

    #[rstest]
    #[case::separator("../evil")]
    #[case::empty("")]
    #[case::hidden(".hidden")]
    fn rejects_unusable_device_types(temp_dir: TempDir, #[case] device_type: &str) {
        let index = temp_dir.path().join("devices.ini");
        let result = IniDeviceDefinitionSerializer
            .save(&[DeviceDefinition::new(device_type, "")], &index);
        assert!(matches!(result, Err(SerializeError::InvalidDeviceType(_))));
        assert!(!index.exists(), "nothing is written for invalid input");
    }

    #[rstest]
    #[case::no_section("NumberOfDevices=0\n")]
    #[case::no_count("[DEVICES]\nDevice1=a.devdef\n")]
    #[case::gap("[DEVICES]\nNumberOfDevices=2\nDevice1=a.devdef\nDevice3=b.devdef\n")]
    #[case::unknown_key("[DEVICES]\nNumberOfDevices=0\nColour=blue\n")]
    #[case::repeated_entry("[DEVICES]\nNumberOfDevices=2\nDevice1=a.devdef\nDevice1=b.devdef\n")]
    #[case::bad_count("[DEVICES]\nNumberOfDevices=two\n")]
    fn parse_index_rejects_broken_indices(#[case] body: &str) {
        assert!(parse_index(body).is_err(), "expected rejection of {body:?}");
    }

    #[test]
    fn parse_index_orders_entries_by_number() {
        let names = parse_index("[DEVICES]\nNumberOfDevices=2\nDevice2=b.devdef\nDevice1=a.devdef\n")
            .expect("valid index");
        assert_eq!(names, vec!["a.devdef", "b.devdef"]);
    }

    #[rstest]
    fn rejects_duplicate_device_types_before_writing(temp_dir: TempDir) {
        let index = temp_dir.path().join("devices.ini");
        let devices = vec![
            DeviceDefinition::new("ESX3CM", "first"),
            DeviceDefinition::new("ESX3CM", "second"),
        ];

        let result = IniDeviceDefinitionSerializer.save(&devices, &index);

        assert!(matches!(
            result,
            Err(SerializeError::DuplicateDeviceType(ref device_type)) if device_type == "ESX3CM"
        ));
        assert!(!index.exists(), "nothing is written for duplicate types");
        assert!(!temp_dir.path().join("ESX3CM.devdef").exists());
    }

    #[rstest]
    fn load_reports_missing_device_file(temp_dir: TempDir) {
        let index = temp_dir.path().join("devices.ini");
        fs::write(&index, "[DEVICES]\nNumberOfDevices=1\nDevice1=gone.devdef\n").expect("write");
        let result = IniDeviceDefinitionSerializer.load(&index);
        assert!(matches!(result, Err(SerializeError::Io { .. })));
    }
}

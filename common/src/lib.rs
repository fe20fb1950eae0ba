//! System and device definition model shared by the xcfg package engine,
//! together with the serializer traits the engine calls and the reference
//! JSON/INI implementations of them.

pub mod device_index;
pub mod json;
pub mod model;
pub mod serializer;

pub use device_index::{DEVICE_FILE_EXTENSION, IniDeviceDefinitionSerializer};
pub use json::{JsonSystemDefinitionSerializer, read_system_definition};
pub use model::{DeviceDefinition, Node, Properties, SystemDefinition};
pub use serializer::{DeviceDefinitionSerializer, SerializeError, SystemDefinitionSerializer};

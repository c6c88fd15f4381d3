use super::InterfaceGenerator;
use crate::spec::InterfaceKind;
use serde_json::Value;
use std::collections::BTreeMap;

/// Command line entry point reading flags and printing JSON
pub struct CliGenerator;

impl InterfaceGenerator for CliGenerator {
    fn kind(&self) -> InterfaceKind {
        InterfaceKind::Cli
    }

    fn default_config(&self) -> BTreeMap<String, Value> {
        BTreeMap::new()
    }
}

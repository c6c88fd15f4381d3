use super::InterfaceGenerator;
use crate::spec::InterfaceKind;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// HTTP/JSON server exposing one endpoint per function
pub struct RestGenerator;

impl InterfaceGenerator for RestGenerator {
    fn kind(&self) -> InterfaceKind {
        InterfaceKind::Rest
    }

    fn default_config(&self) -> BTreeMap<String, Value> {
        let mut config = BTreeMap::new();
        config.insert("port".to_string(), json!(8000));
        config.insert("host".to_string(), json!("0.0.0.0"));
        config
    }
}

use super::InterfaceGenerator;
use crate::spec::InterfaceKind;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// gRPC service: one .proto definition plus the server module
pub struct GrpcGenerator;

impl InterfaceGenerator for GrpcGenerator {
    fn kind(&self) -> InterfaceKind {
        InterfaceKind::Grpc
    }

    fn default_config(&self) -> BTreeMap<String, Value> {
        let mut config = BTreeMap::new();
        config.insert("port".to_string(), json!(50051));
        config
    }
}

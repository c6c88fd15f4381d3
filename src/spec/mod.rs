//! Specification model and parser
//!
//! A specification document (YAML or JSON) declares the functions to
//! generate, their typed signatures and behavior examples, and the
//! (language, interface) targets to emit. Parsing is pure: no I/O, no
//! completion calls, defaults applied so downstream code never sees
//! unset-but-defaulted fields.

mod model;
mod parser;

pub use model::{
    ExampleSpec, FunctionSpec, InterfaceKind, InterfaceSpec, Language, ParameterSpec, Priority,
    ProjectSpec, TypeTag,
};
pub use parser::{parse_project, SpecFormatError};

//! Custom MiniJinja filters for identifier casing and type mapping

use minijinja::Environment;

pub(crate) fn register_filters(env: &mut Environment<'static>) {
    env.add_filter("snake_case", snake_case);
    env.add_filter("pascal_case", pascal_case);
    env.add_filter("camel_case", camel_case);
    env.add_filter("py_type", py_type);
    env.add_filter("js_type", js_type);
    env.add_filter("go_type", go_type);
    env.add_filter("rust_type", rust_type);
    env.add_filter("proto_type", proto_type);
    env.add_filter("indent_lines", indent_lines);
}

fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for ch in input.chars() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '.' {
            if !current.is_empty() {
                words.push(current.clone());
                current.clear();
            }
            prev_lower = false;
        } else if ch.is_uppercase() && prev_lower {
            words.push(current.clone());
            current.clear();
            current.push(ch.to_ascii_lowercase());
            prev_lower = false;
        } else {
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            current.push(ch.to_ascii_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn snake_case(value: String) -> String {
    split_words(&value).join("_")
}

fn pascal_case(value: String) -> String {
    split_words(&value)
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn camel_case(value: String) -> String {
    let pascal = pascal_case(value);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Maps a spec type tag to a Python annotation
fn py_type(value: String) -> String {
    match value.as_str() {
        "string" => "str",
        "number" => "float",
        "integer" => "int",
        "boolean" => "bool",
        "bytes" => "bytes",
        "mapping" => "dict",
        "sequence" => "list",
        "null" => "None",
        other => other,
    }
    .to_string()
}

/// Maps a spec type tag to a JSDoc/TypeScript-style annotation
fn js_type(value: String) -> String {
    match value.as_str() {
        "string" => "string",
        "number" => "number",
        "integer" => "number",
        "boolean" => "boolean",
        "bytes" => "Buffer",
        "mapping" => "object",
        "sequence" => "Array",
        "null" => "null",
        other => other,
    }
    .to_string()
}

fn go_type(value: String) -> String {
    match value.as_str() {
        "string" => "string",
        "number" => "float64",
        "integer" => "int64",
        "boolean" => "bool",
        "bytes" => "[]byte",
        "mapping" => "map[string]interface{}",
        "sequence" => "[]interface{}",
        "null" => "interface{}",
        other => other,
    }
    .to_string()
}

fn rust_type(value: String) -> String {
    match value.as_str() {
        "string" => "String",
        "number" => "f64",
        "integer" => "i64",
        "boolean" => "bool",
        "bytes" => "Vec<u8>",
        "mapping" => "serde_json::Map<String, serde_json::Value>",
        "sequence" => "Vec<serde_json::Value>",
        "null" => "()",
        other => other,
    }
    .to_string()
}

fn proto_type(value: String) -> String {
    match value.as_str() {
        "string" => "string",
        "number" => "double",
        "integer" => "int64",
        "boolean" => "bool",
        "bytes" => "bytes",
        "mapping" => "string",
        "sequence" => "string",
        "null" => "string",
        other => other,
    }
    .to_string()
}

fn indent_lines(value: String, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    value
        .lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

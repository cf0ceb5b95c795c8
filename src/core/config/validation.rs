use serde_json::{Map, Value};

use crate::core::errors::ApiError;

const KNOWN_STRATEGIES: [&str; 2] = ["knowledge_base", "web_search"];
const KNOWN_BACKENDS: [&str; 2] = ["pinecone", "memory"];
const SEARCH_DEPTHS: [&str; 2] = ["basic", "advanced"];

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_u64_field(server, "server.max_body_mb", "max_body_mb", 1, 1024)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(providers) = expect_optional_object(root, "providers")? {
        validate_u64_field(providers, "providers.timeout_secs", "timeout_secs", 1, 600)?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.model", "model")?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_optional_string_field(embedding, "embedding.base_url", "base_url")?;
        validate_optional_string_field(embedding, "embedding.model", "model")?;
        validate_u64_field(embedding, "embedding.dimension", "dimension", 1, 65_536)?;
    }

    if let Some(store) = expect_optional_object(root, "vector_store")? {
        validate_enum_field(store, "vector_store.backend", "backend", &KNOWN_BACKENDS)?;
        validate_optional_string_field(store, "vector_store.index_host", "index_host")?;
        validate_optional_string_field(store, "vector_store.namespace", "namespace")?;
    }

    if let Some(search) = expect_optional_object(root, "web_search")? {
        validate_enum_field(
            search,
            "web_search.search_depth",
            "search_depth",
            &SEARCH_DEPTHS,
        )?;
        validate_u64_field(search, "web_search.max_results", "max_results", 1, 20)?;
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 100)?;
        validate_f64_field(
            retrieval,
            "retrieval.relevance_threshold",
            "relevance_threshold",
            -1.0,
            1.0,
        )?;
        validate_bool_field(retrieval, "retrieval.optimize_query", "optimize_query")?;
        validate_string_array_field(retrieval, "retrieval.strategies", "strategies")?;
        if let Some(items) = retrieval.get("strategies").and_then(|v| v.as_array()) {
            for (index, item) in items.iter().enumerate() {
                let name = item.as_str().unwrap_or_default();
                if !KNOWN_STRATEGIES.contains(&name) {
                    return Err(ApiError::Validation(format!(
                        "Invalid config at 'retrieval.strategies[{}]': unknown strategy '{}'",
                        index, name
                    )));
                }
            }
        }
    }

    if let Some(memory) = expect_optional_object(root, "memory")? {
        validate_u64_field(memory, "memory.max_entries", "max_entries", 1, 10_000)?;
        validate_u64_field(
            memory,
            "memory.max_conversations",
            "max_conversations",
            1,
            1_000_000,
        )?;
    }

    if let Some(ingest) = expect_optional_object(root, "ingest")? {
        validate_optional_string_field(ingest, "ingest.data_dir", "data_dir")?;
        validate_u64_field(ingest, "ingest.chunk_size", "chunk_size", 1, 1_000_000)?;
        validate_u64_field(ingest, "ingest.chunk_overlap", "chunk_overlap", 0, 1_000_000)?;
        validate_u64_field(ingest, "ingest.batch_size", "batch_size", 1, 1_000)?;
        let size = ingest.get("chunk_size").and_then(|v| v.as_u64()).unwrap_or(1000);
        let overlap = ingest.get("chunk_overlap").and_then(|v| v.as_u64()).unwrap_or(200);
        if overlap >= size {
            return Err(ApiError::Validation(format!(
                "Invalid config at 'ingest.chunk_overlap': must be smaller than chunk_size ({})",
                size
            )));
        }
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(ApiError::Validation(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(ApiError::Validation(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if !allowed.contains(&text) {
        return Err(ApiError::Validation(format!(
            "Invalid config at '{}': expected one of {}",
            path,
            allowed.join(", ")
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::Validation(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Validation(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}

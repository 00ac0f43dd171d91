use serde_json::{json, Value};

/// `{"status": "SUCCESS", "data": {"content": [...]}}`
pub fn data_page(content: Vec<Value>) -> Value {
    json!({
        "status": "SUCCESS",
        "data": { "content": content },
    })
}

pub fn org_item(identifier: &str) -> Value {
    json!({ "org": { "identifier": identifier, "name": identifier } })
}

pub fn project_item(org: &str, identifier: &str) -> Value {
    json!({
        "project": {
            "identifier": identifier,
            "orgIdentifier": org,
            "name": identifier,
        }
    })
}

pub fn pipeline_json(identifier: &str) -> Value {
    json!({
        "identifier": identifier,
        "name": identifier,
        "storeType": "INLINE",
    })
}

pub fn template_json(identifier: &str, org: &str, project: &str, version_label: &str) -> Value {
    json!({
        "identifier": identifier,
        "name": identifier,
        "org": org,
        "project": project,
        "version_label": version_label,
    })
}

pub fn service_item(identifier: &str, org: &str, project: &str) -> Value {
    json!({
        "service": {
            "identifier": identifier,
            "name": identifier,
            "org": org,
            "project": project,
        }
    })
}

pub fn service_item_with_yaml(identifier: &str, org: &str, project: &str, yaml: &str) -> Value {
    let mut item = service_item(identifier, org, project);
    item["service"]["yaml"] = Value::String(yaml.to_string());
    item
}

pub fn environment_item(identifier: &str) -> Value {
    json!({
        "environment": {
            "identifier": identifier,
            "name": identifier,
            "type": "Production",
        }
    })
}

pub fn service_override_json(environment: &str, service: &str, yaml: &str) -> Value {
    json!({
        "environmentRef": environment,
        "serviceRef": service,
        "yaml": yaml,
    })
}

pub fn file_node(identifier: &str, path: &str, kind: &str) -> Value {
    json!({
        "identifier": identifier,
        "path": path,
        "type": kind,
    })
}

pub fn connector_json(identifier: &str, kind: &str) -> Value {
    json!({
        "status": "SUCCESS",
        "data": {
            "connector": {
                "identifier": identifier,
                "name": identifier,
                "type": kind,
                "spec": { "url": "https://github.com/acme" },
            }
        }
    })
}

/// Error body the platform sends alongside a non-2xx status.
pub fn error_envelope(correlation_id: &str, messages: &[&str]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|message| json!({ "code": "INVALID_REQUEST", "level": "ERROR", "message": message }))
        .collect();

    json!({
        "status": "ERROR",
        "correlationId": correlation_id,
        "responseMessages": messages,
    })
}

//! Virtual device descriptors and the payload schema used to create and edit them

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// HTTP verbs a descriptor may use to actuate its device
pub const SUPPORTED_VERBS: [&str; 3] = ["get", "put", "post"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("contentBody is set but contentType is missing")]
    MissingContentType,
    #[error("contentBody is set but httpVerb is missing")]
    MissingHttpVerb,
    #[error("unsupported httpVerb: {0}")]
    UnsupportedHttpVerb(String),
}

/// Unique identifier for a descriptor, stable for its lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl DeviceId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// An empty id has not been assigned by the store yet
    pub fn is_unassigned(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Request body for creating or editing a descriptor.
///
/// Every field is optional on the wire; [`DescriptorPayload::validate`]
/// decides whether the combination is acceptable for a create.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptorPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub map_id: Option<String>,
    #[serde(default)]
    pub map_type: Option<String>,
    #[serde(default)]
    pub target_device: Option<String>,
    #[serde(default)]
    pub on_url: Option<String>,
    #[serde(default)]
    pub off_url: Option<String>,
    #[serde(default)]
    pub http_verb: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_body: Option<String>,
    #[serde(default)]
    pub content_body_off: Option<String>,
}

impl DescriptorPayload {
    /// Check the actuation payload invariant.
    ///
    /// A descriptor that carries a non-empty `contentBody` must also declare
    /// its `contentType` and an `httpVerb` from [`SUPPORTED_VERBS`] (compared
    /// case-insensitively). Without a body nothing is required.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if !is_set(&self.content_body) {
            return Ok(());
        }
        // An empty content type is still a declared one
        if self.content_type.is_none() {
            return Err(DescriptorError::MissingContentType);
        }
        let verb = match self.http_verb.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => return Err(DescriptorError::MissingHttpVerb),
        };
        if !SUPPORTED_VERBS.contains(&verb.to_lowercase().as_str()) {
            return Err(DescriptorError::UnsupportedHttpVerb(verb.to_string()));
        }
        Ok(())
    }
}

/// A registered virtual device and its on/off HTTP actions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub off_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_verb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_body_off: Option<String>,
}

impl DeviceDescriptor {
    /// Build a descriptor from a create payload.
    ///
    /// The id is left unassigned unless the payload carries one; the store
    /// fills it in on save.
    pub fn from_payload(payload: DescriptorPayload) -> Self {
        Self {
            id: payload.id.map(DeviceId).unwrap_or_default(),
            name: payload.name,
            device_type: payload.device_type,
            map_id: payload.map_id,
            map_type: payload.map_type,
            target_device: payload.target_device,
            on_url: payload.on_url,
            off_url: payload.off_url,
            http_verb: payload.http_verb.map(|v| v.to_lowercase()),
            content_type: payload.content_type,
            content_body: payload.content_body,
            content_body_off: payload.content_body_off,
        }
    }

    /// Merge an edit payload into this descriptor.
    ///
    /// Every field is replaced by the payload's value, including with
    /// nothing when the payload omits it. `deviceType` is only replaced by a
    /// non-empty value. The id never changes.
    // NOTE: deviceType is the only field that survives an omitted value.
    pub fn apply_update(&mut self, update: DescriptorPayload) {
        self.name = update.name;
        if is_set(&update.device_type) {
            self.device_type = update.device_type;
        }
        self.map_id = update.map_id;
        self.map_type = update.map_type;
        self.target_device = update.target_device;
        self.on_url = update.on_url;
        self.off_url = update.off_url;
        self.http_verb = update.http_verb.map(|v| v.to_lowercase());
        self.content_type = update.content_type;
        self.content_body = update.content_body;
        self.content_body_off = update.content_body_off;
    }
}

fn is_set(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> DescriptorPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_validate_without_body() {
        let p = payload(r#"{"name":"lamp","onUrl":"http://x/on"}"#);
        assert!(p.validate().is_ok());

        // Empty body counts as no body
        let p = payload(r#"{"name":"lamp","contentBody":""}"#);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_validate_body_requires_type_and_verb() {
        let p = payload(r#"{"contentBody":"{}","httpVerb":"post"}"#);
        assert_eq!(p.validate(), Err(DescriptorError::MissingContentType));

        let p = payload(r#"{"contentBody":"{}","contentType":"application/json"}"#);
        assert_eq!(p.validate(), Err(DescriptorError::MissingHttpVerb));

        let p = payload(
            r#"{"contentBody":"{}","contentType":"application/json","httpVerb":"patch"}"#,
        );
        assert_eq!(
            p.validate(),
            Err(DescriptorError::UnsupportedHttpVerb("patch".to_string()))
        );
    }

    #[test]
    fn test_validate_empty_content_type_accepted() {
        let p = payload(r#"{"contentBody":"on","contentType":"","httpVerb":"put"}"#);
        assert!(p.validate().is_ok());

        let p = payload(r#"{"contentBody":"on","contentType":"text/plain","httpVerb":""}"#);
        assert_eq!(p.validate(), Err(DescriptorError::MissingHttpVerb));
    }

    #[test]
    fn test_unnamed_descriptor_omits_name() {
        let d = DeviceDescriptor::from_payload(payload(r#"{"onUrl":"http://x/on"}"#));
        assert!(d.name.is_none());
        let json = serde_json::to_value(&d).unwrap();
        assert!(json.get("name").is_none());
    }

    #[test]
    fn test_validate_verb_case_insensitive() {
        for verb in ["GET", "Get", "get", "PUT", "Post"] {
            let p = DescriptorPayload {
                content_body: Some("on".to_string()),
                content_type: Some("text/plain".to_string()),
                http_verb: Some(verb.to_string()),
                ..Default::default()
            };
            assert!(p.validate().is_ok(), "verb {} should be accepted", verb);
        }
    }

    #[test]
    fn test_from_payload_normalizes_verb() {
        let p = payload(r#"{"name":"fan","httpVerb":"PUT","deviceType":"switch"}"#);
        let d = DeviceDescriptor::from_payload(p);
        assert!(d.id.is_unassigned());
        assert_eq!(d.name.as_deref(), Some("fan"));
        assert_eq!(d.http_verb.as_deref(), Some("put"));
        assert_eq!(d.device_type.as_deref(), Some("switch"));
    }

    #[test]
    fn test_apply_update_clears_and_preserves() {
        let mut existing = DeviceDescriptor {
            id: DeviceId::from("42"),
            name: Some("A".to_string()),
            device_type: Some("dimmer".to_string()),
            on_url: Some("u1".to_string()),
            off_url: Some("u2".to_string()),
            ..Default::default()
        };

        existing.apply_update(payload(r#"{"id":"99","name":"B","onUrl":""}"#));

        assert_eq!(existing.id.as_str(), "42");
        assert_eq!(existing.name.as_deref(), Some("B"));
        assert_eq!(existing.device_type.as_deref(), Some("dimmer"));
        assert_eq!(existing.on_url.as_deref(), Some(""));
        assert_eq!(existing.off_url, None);
    }

    #[test]
    fn test_apply_update_empty_device_type_preserved() {
        let mut existing = DeviceDescriptor {
            device_type: Some("dimmer".to_string()),
            ..Default::default()
        };
        existing.apply_update(payload(r#"{"deviceType":""}"#));
        assert_eq!(existing.device_type.as_deref(), Some("dimmer"));

        existing.apply_update(payload(r#"{"deviceType":"switch"}"#));
        assert_eq!(existing.device_type.as_deref(), Some("switch"));
    }

    #[test]
    fn test_descriptor_json_shape() {
        let d = DeviceDescriptor {
            id: DeviceId::from("1"),
            name: Some("lamp".to_string()),
            on_url: Some("http://x/on".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "1", "name": "lamp", "onUrl": "http://x/on"})
        );
    }
}

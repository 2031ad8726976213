//! Wire types for the project template API.
//!
//! Byte fields travel as standard base64 strings, the same way the server's
//! JSON gateway encodes them.

use serde::{Deserialize, Serialize};

/// Reference used to look up a single project template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    Id(String),
    Name(String),
}

/// A project template as stored by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectTemplate {
    pub id: String,
    pub name: String,
    pub summary: String,
    pub expanded_summary: String,
    #[serde(with = "base64_bytes")]
    pub readme_markdown_template: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoint_project: Option<WaypointProject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terraform_nocode_module: Option<TerraformNocodeModule>,
    pub tags: Vec<String>,
}

/// Embedded waypoint.hcl template for projects created from a template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaypointProject {
    #[serde(with = "base64_bytes")]
    pub waypoint_hcl_template: Vec<u8>,
}

/// Terraform no-code module used to provision infrastructure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformNocodeModule {
    pub source: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct GetProjectTemplateResponse {
    pub project_template: Option<ProjectTemplate>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProjectTemplateRequest<'a> {
    pub project_template: &'a ProjectTemplate,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

//! Upload specifications per repository format.

use serde::{Deserialize, Serialize};

/// Upload spec for one format (`GET /formats/{format}/upload-specs`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    #[serde(rename = "format")]
    pub name: String,
    #[serde(default)]
    pub multiple_upload: bool,
    #[serde(default)]
    pub component_fields: Vec<FormatField>,
    #[serde(default)]
    pub asset_fields: Vec<FormatField>,
}

impl Format {
    /// Names of component fields an upload must supply.
    pub fn required_component_fields(&self) -> Vec<&str> {
        self.component_fields
            .iter()
            .filter(|f| !f.optional)
            .map(|f| f.name.as_str())
            .collect()
    }

    /// Names of per-asset fields an upload must supply. The file part itself
    /// (`asset`) is not counted.
    pub fn required_asset_fields(&self) -> Vec<&str> {
        self.asset_fields
            .iter()
            .filter(|f| !f.optional && f.name != "asset")
            .map(|f| f.name.as_str())
            .collect()
    }
}

/// One field of an upload spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub group: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_required_fields() {
        let format: Format = serde_json::from_value(json!({
            "format": "maven2",
            "multipleUpload": true,
            "componentFields": [
                {"name": "groupId", "type": "STRING", "optional": false},
                {"name": "packaging", "type": "STRING", "optional": true}
            ],
            "assetFields": [
                {"name": "asset", "type": "FILE", "optional": false},
                {"name": "extension", "type": "STRING", "optional": false},
                {"name": "classifier", "type": "STRING", "optional": true}
            ]
        }))
        .unwrap();

        assert_eq!(format.name, "maven2");
        assert_eq!(format.required_component_fields(), vec!["groupId"]);
        assert_eq!(format.required_asset_fields(), vec!["extension"]);
    }
}

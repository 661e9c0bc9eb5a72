use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Component,
    Class,
    Function,
    Method,
    #[default]
    #[serde(other)]
    Unknown,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Class => "class",
            Self::Function => "function",
            Self::Method => "method",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Uses,
    Calls,
    Instantiates,
    Contains,
    Imports,
    Exports,
    Inherits,
    #[default]
    #[serde(other)]
    Unknown,
}

impl EdgeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Uses => "uses",
            Self::Calls => "calls",
            Self::Instantiates => "instantiates",
            Self::Contains => "contains",
            Self::Imports => "imports",
            Self::Exports => "exports",
            Self::Inherits => "inherits",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub file_path: Option<String>,
}

impl NodeRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            file_path: None,
        }
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "type", default)]
    pub kind: EdgeKind,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub context: Option<String>,
}

fn default_weight() -> f32 {
    1.0
}

impl EdgeRecord {
    pub fn new(source: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            kind,
            weight: default_weight(),
            context: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default, alias = "links")]
    pub edges: Vec<EdgeRecord>,
}

impl GraphData {
    pub fn from_json_str(raw: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let raw = fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::{EdgeKind, GraphData, NodeKind};

    #[test]
    fn parses_host_payload_with_defaults_and_unknown_kinds() {
        let data = GraphData::from_json_str(
            r#"{
                "nodes": [
                    {"id": "a", "name": "App", "type": "component", "filePath": "src/App.tsx"},
                    {"id": "b", "type": "widget"}
                ],
                "edges": [
                    {"source": "a", "target": "b", "type": "calls"},
                    {"source": "a", "target": "zzz", "type": "teleports", "weight": 3.0}
                ]
            }"#,
        )
        .expect("payload should parse");

        assert_eq!(data.nodes[0].kind, NodeKind::Component);
        assert_eq!(data.nodes[0].file_path.as_deref(), Some("src/App.tsx"));
        assert_eq!(data.nodes[1].kind, NodeKind::Unknown);
        assert_eq!(data.nodes[1].display_name(), "b");
        assert_eq!(data.edges[0].kind, EdgeKind::Calls);
        assert_eq!(data.edges[0].weight, 1.0);
        assert_eq!(data.edges[1].kind, EdgeKind::Unknown);
        assert_eq!(data.edges[1].weight, 3.0);
    }

    #[test]
    fn accepts_links_alias_for_edges() {
        let data = GraphData::from_json_str(
            r#"{"nodes": [{"id": "a"}], "links": [{"source": "a", "target": "a"}]}"#,
        )
        .expect("payload should parse");
        assert_eq!(data.edges.len(), 1);
        assert_eq!(data.edges[0].kind, EdgeKind::Unknown);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(GraphData::from_json_str("{\"nodes\": [").is_err());
    }
}

//! Investigation sessions and their entity summaries.
//!
//! A session is an ordered, append-only list of nodes, one per trace lookup. Entity
//! summaries are never stored; they are recomputed from the nodes on every call.

mod store;

pub use store::SessionStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entities::{Category, Entity, EntityData};
use crate::parser::{parse_trace_response, ParsedPersonDetailData};

/// Kind of recorded interaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Raw response of a trace API call.
    #[default]
    ApiResult,
    /// Parsed person-detail lookup.
    PeopleResult,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::ApiResult => write!(f, "api-result"),
            NodeType::PeopleResult => write!(f, "people-result"),
        }
    }
}

/// One recorded trace interaction within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    /// Unique node identifier.
    pub id: String,
    /// Kind of interaction.
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    /// Raw response payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Parsed person detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_data: Option<ParsedPersonDetailData>,
    /// Name of the API endpoint that produced the node.
    #[serde(default)]
    pub api_name: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
    /// Human readable description of the lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Node whose entity led to this lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_node_id: Option<String>,
}

impl NodeData {
    /// Node holding a raw API response.
    pub fn api_result(api_name: impl Into<String>, response: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_type: NodeType::ApiResult,
            response: Some(response),
            person_data: None,
            api_name: api_name.into(),
            timestamp: Utc::now().timestamp_millis(),
            query: None,
            parent_node_id: None,
        }
    }

    /// Node holding a parsed person detail.
    pub fn people_result(api_name: impl Into<String>, person_data: ParsedPersonDetailData) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            node_type: NodeType::PeopleResult,
            response: None,
            person_data: Some(person_data),
            api_name: api_name.into(),
            timestamp: Utc::now().timestamp_millis(),
            query: None,
            parent_node_id: None,
        }
    }

    /// Attach a description of the lookup.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Link to the node this lookup expanded from.
    pub fn with_parent(mut self, parent_node_id: impl Into<String>) -> Self {
        self.parent_node_id = Some(parent_node_id.into());
        self
    }

    /// Entities carried by the node.
    ///
    /// Parsed person data wins; otherwise the raw response is parsed on the fly.
    pub fn entities(&self) -> Vec<Entity> {
        if let Some(data) = &self.person_data {
            return data.entities.clone();
        }
        match &self.response {
            Some(raw) => parse_trace_response(raw).into_entities(),
            None => Vec::new(),
        }
    }
}

/// An ordered, user-named collection of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    /// Unique session identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Last time the session was loaded or modified, epoch milliseconds.
    pub last_accessed: i64,
    /// Recorded nodes in insertion order.
    #[serde(default)]
    pub nodes: Vec<NodeData>,
}

impl SessionData {
    /// New empty session. A blank name falls back to the creation timestamp.
    pub fn new(name: Option<String>) -> Self {
        let now = Utc::now();
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| default_session_name(now));

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            created_at: now.timestamp_millis(),
            last_accessed: now.timestamp_millis(),
            nodes: Vec::new(),
        }
    }

    /// Mark the session as accessed now.
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now().timestamp_millis();
    }
}

fn default_session_name(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Entity totals across a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    /// Addresses of any category.
    pub addresses: usize,
    /// Persons of any category.
    pub persons: usize,
    /// Properties.
    pub properties: usize,
    /// Phone lines.
    pub phones: usize,
    /// Email addresses.
    pub emails: usize,
    /// Sum of the fields above.
    pub total: usize,
}

impl EntitySummary {
    /// Count entities across all nodes.
    pub fn from_nodes(nodes: &[NodeData]) -> Self {
        let mut summary = Self::default();
        for entity in nodes.iter().flat_map(|node| node.entities()) {
            match entity.data {
                EntityData::Address(_) => summary.addresses += 1,
                EntityData::Person(_) => summary.persons += 1,
                EntityData::Property(_) => summary.properties += 1,
                EntityData::Phone(_) => summary.phones += 1,
                EntityData::Email(_) => summary.emails += 1,
                EntityData::Image(_) => {}
            }
        }
        summary.total =
            summary.addresses + summary.persons + summary.properties + summary.phones + summary.emails;
        summary
    }
}

/// Entities that are plausible next lookup targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionableEntities {
    /// Current addresses.
    pub current_addresses: usize,
    /// Previous addresses.
    pub previous_addresses: usize,
    /// Relatives of the subject.
    pub relatives: usize,
    /// Associates of the subject.
    pub associates: usize,
    /// Sum of the fields above.
    pub total: usize,
}

impl ActionableEntities {
    /// Count addresses and related persons across all nodes.
    ///
    /// The subject and search residents are not counted; only network expansion leads
    /// are.
    pub fn from_nodes(nodes: &[NodeData]) -> Self {
        let mut actionable = Self::default();
        for entity in nodes.iter().flat_map(|node| node.entities()) {
            match (&entity.data, entity.category) {
                (EntityData::Address(_), Some(Category::Current)) => {
                    actionable.current_addresses += 1
                }
                (EntityData::Address(_), Some(Category::Previous)) => {
                    actionable.previous_addresses += 1
                }
                (EntityData::Person(_), Some(Category::Relative)) => actionable.relatives += 1,
                (EntityData::Person(_), Some(Category::Associate)) => actionable.associates += 1,
                _ => {}
            }
        }
        actionable.total = actionable.current_addresses
            + actionable.previous_addresses
            + actionable.relatives
            + actionable.associates;
        actionable
    }
}

/// Self-contained export of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    /// The exported session with its nodes.
    pub session: SessionData,
    /// Entity counts.
    pub summary: EntitySummary,
    /// Lead counts.
    pub actionable: ActionableEntities,
    /// Entities of all nodes, in node order.
    pub entities: Vec<Entity>,
    /// Export time.
    pub exported_at: DateTime<Utc>,
}

impl SessionExport {
    /// Build an export snapshot.
    pub fn new(session: SessionData) -> Self {
        let summary = EntitySummary::from_nodes(&session.nodes);
        let actionable = ActionableEntities::from_nodes(&session.nodes);
        let entities = session.nodes.iter().flat_map(|node| node.entities()).collect();
        Self {
            session,
            summary,
            actionable,
            entities,
            exported_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_person_detail_response;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn detail_payload() -> Value {
        json!({
            "Source": "ProviderX",
            "Person Details": [{"Person_name": "Jane Doe", "Age": "34"}],
            "Current Address Details List": [{"street_address": "1 Main St", "address_locality": "Minneapolis"}],
            "Previous Address Details": [{"street_address": "2 Elm St"}, {"address_locality": "Duluth"}],
            "All Phone Details": [{"phone_number": "612-555-0100"}],
            "Email Addresses": ["jane@example.com"],
            "All Relatives": [{"Name": "Sam Doe"}],
            "All Associates": [{"Name": "Pat Roe"}, {"Name": "Lee Poe"}],
            "address": {"full": "1 Main St, Minneapolis, MN"},
        })
    }

    #[test]
    fn test_node_type_serialization() {
        assert_eq!(
            serde_json::to_value(NodeType::PeopleResult).unwrap(),
            json!("people-result")
        );
        assert_eq!(NodeType::ApiResult.to_string(), "api-result");
    }

    #[test]
    fn test_node_entities_prefer_person_data() {
        let parsed = parse_person_detail_response(&json!({"Email Addresses": ["a@b.co"]}));
        let mut node = NodeData::people_result("person-details", parsed);
        node.response = Some(json!({"Email Addresses": ["x@y.co", "z@y.co"]}));
        assert_eq!(node.entities().len(), 1);
    }

    #[test]
    fn test_node_entities_parse_raw_response() {
        let node = NodeData::api_result("search-by-name", json!({"PeopleDetails": [{"Name": "A"}]}));
        let entities = node.entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].category, Some(Category::Resident));
    }

    #[test]
    fn test_summary_and_actionable() {
        let nodes = vec![NodeData::api_result("person-details", detail_payload())];

        let summary = EntitySummary::from_nodes(&nodes);
        assert_eq!(summary.addresses, 3);
        assert_eq!(summary.persons, 4);
        assert_eq!(summary.phones, 1);
        assert_eq!(summary.emails, 1);
        assert_eq!(summary.properties, 0);
        assert_eq!(
            summary.total,
            summary.addresses + summary.persons + summary.properties + summary.phones + summary.emails
        );

        let actionable = ActionableEntities::from_nodes(&nodes);
        assert_eq!(
            actionable,
            ActionableEntities {
                current_addresses: 1,
                previous_addresses: 2,
                relatives: 1,
                associates: 2,
                total: 6,
            }
        );
        // The subject is a person but not a lead.
        assert!(actionable.relatives + actionable.associates < summary.persons);
    }

    #[test]
    fn test_session_default_name() {
        let session = SessionData::new(None);
        assert_eq!(session.name.len(), "2024-01-01 00:00:00".len());

        let session = SessionData::new(Some("  ".to_string()));
        assert!(!session.name.trim().is_empty());

        let session = SessionData::new(Some("Lake St duplex".to_string()));
        assert_eq!(session.name, "Lake St duplex");
    }

    #[test]
    fn test_session_json_shape() {
        let mut session = SessionData::new(Some("s".to_string()));
        session
            .nodes
            .push(NodeData::api_result("search", json!({})).with_query("Jane Doe"));
        let value = serde_json::to_value(&session).unwrap();

        assert!(value.get("createdAt").is_some());
        assert!(value.get("lastAccessed").is_some());
        let node = &value["nodes"][0];
        assert_eq!(node["type"], "api-result");
        assert_eq!(node["apiName"], "search");
        assert_eq!(node["query"], "Jane Doe");
        assert!(node.get("personData").is_none());
    }

    #[test]
    fn test_legacy_node_without_optional_fields_loads() {
        let node: NodeData = serde_json::from_value(json!({
            "id": "n1",
            "type": "people-result",
            "timestamp": 1700000000000_i64,
            "personData": {"entities": []},
        }))
        .unwrap();
        assert_eq!(node.node_type, NodeType::PeopleResult);
        assert!(node.entities().is_empty());
        assert!(node.api_name.is_empty());
    }

    #[test]
    fn test_export_collects_entities() {
        let mut session = SessionData::new(None);
        session
            .nodes
            .push(NodeData::api_result("person-details", detail_payload()));
        let export = SessionExport::new(session);
        // Summary excludes images; the export keeps them.
        assert_eq!(export.entities.len(), export.summary.total + 1);
    }
}

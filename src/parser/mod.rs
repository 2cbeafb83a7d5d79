//! Response parsers for the two trace endpoint shapes.
//!
//! Both parsers are total functions: any JSON value, including `null`, garbage or a
//! partial payload, produces a result. Unknown or mistyped sections contribute nothing,
//! and the raw payload is kept verbatim next to the extracted entities for export.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::entities::builders;
use crate::entities::{Entity, EntityCounts, EntityData, EntityKind, PersonEntity, UNKNOWN_SOURCE};
use crate::extract::{has_section, integer, lookup, opt_text, section, Field, Section};

/// Entities extracted from a person-detail response.
///
/// Missing fields deserialize to defaults so older persisted nodes still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParsedPersonDetailData {
    /// Provenance label applied to every entity.
    pub source: String,
    /// Extracted entities, degenerate records removed.
    pub entities: Vec<Entity>,
    /// Partition of `entities` by type.
    pub entity_counts: EntityCounts,
    /// Always `entities.len()`.
    pub total_entities: usize,
    /// The payload as received.
    pub raw_response: Value,
}

/// Entities extracted from a person-search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonResponse {
    /// Upstream status code, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
    /// Upstream status message, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Upstream record count, or the number of people found.
    pub records: usize,
    /// People found by the search, in response order.
    #[serde(default)]
    pub people: Vec<PersonEntity>,
    /// Provenance label applied to every entity.
    pub source: String,
    /// Extracted entities, degenerate records removed.
    pub entities: Vec<Entity>,
    /// Partition of `entities` by type.
    pub entity_counts: EntityCounts,
    /// Always `entities.len()`.
    pub total_entities: usize,
    /// The payload as received.
    pub raw_response: Value,
}

/// A payload parsed according to its detected shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ParsedTrace {
    /// Person-detail endpoint payload.
    Detail(ParsedPersonDetailData),
    /// Person-search endpoint payload.
    Search(PersonResponse),
}

impl ParsedTrace {
    /// Extracted entities.
    pub fn entities(&self) -> &[Entity] {
        match self {
            ParsedTrace::Detail(data) => &data.entities,
            ParsedTrace::Search(data) => &data.entities,
        }
    }

    /// Entity counts by type.
    pub fn entity_counts(&self) -> EntityCounts {
        match self {
            ParsedTrace::Detail(data) => data.entity_counts,
            ParsedTrace::Search(data) => data.entity_counts,
        }
    }

    /// Provenance label.
    pub fn source(&self) -> &str {
        match self {
            ParsedTrace::Detail(data) => &data.source,
            ParsedTrace::Search(data) => &data.source,
        }
    }

    /// Consume into the entity list.
    pub fn into_entities(self) -> Vec<Entity> {
        match self {
            ParsedTrace::Detail(data) => data.entities,
            ParsedTrace::Search(data) => data.entities,
        }
    }
}

/// Parse a person-detail payload. Never fails.
pub fn parse_person_detail_response(raw: &Value) -> ParsedPersonDetailData {
    let source = source_label(raw);
    let mut entities = Vec::new();

    for record in section(raw, Section::PersonDetails) {
        entities.push(builders::person_detail(record, &source));
    }
    for record in section(raw, Section::CurrentAddresses) {
        entities.push(builders::current_address(record, &source));
    }
    for record in section(raw, Section::PreviousAddresses) {
        entities.push(builders::previous_address(record, &source));
    }
    for record in section(raw, Section::Phones) {
        entities.push(builders::phone(record, &source));
    }
    for record in section(raw, Section::Emails) {
        entities.push(builders::email(record, &source));
    }
    for record in section(raw, Section::Relatives) {
        entities.push(builders::relative(record, &source));
    }
    for record in section(raw, Section::Associates) {
        entities.push(builders::associate(record, &source));
    }

    let properties = section(raw, Section::Properties);
    if properties.is_empty() {
        if describes_property(raw) {
            entities.push(builders::property(raw, &source));
        }
    } else {
        for record in properties {
            entities.push(builders::property(record, &source));
        }
    }

    for (index, record) in section(raw, Section::Photos).into_iter().enumerate() {
        entities.push(builders::photo(record, index, &source));
    }

    entities.retain(Entity::is_meaningful);

    if let Some(full) = full_address(raw) {
        entities.push(builders::street_view(&full, &source));
    }

    let entity_counts = EntityCounts::from_entities(&entities);
    debug!(
        source = %source,
        total = entities.len(),
        persons = entity_counts.persons,
        addresses = entity_counts.addresses,
        "Parsed person detail response"
    );

    ParsedPersonDetailData {
        source,
        total_entities: entities.len(),
        entity_counts,
        entities,
        raw_response: raw.clone(),
    }
}

/// Parse a person-search payload. Never fails.
pub fn parse_person_response(raw: &Value) -> PersonResponse {
    let source = source_label(raw);

    let entities: Vec<Entity> = section(raw, Section::People)
        .into_iter()
        .map(|record| builders::search_person(record, &source))
        .filter(Entity::is_meaningful)
        .collect();

    let people = entities
        .iter()
        .filter_map(|entity| match &entity.data {
            EntityData::Person(person) => Some(person.clone()),
            _ => None,
        })
        .collect();

    let records = integer(raw, Field::Records)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(entities.len());

    let entity_counts = EntityCounts::from_entities(&entities);
    debug!(
        source = %source,
        people = entity_counts.persons,
        records,
        "Parsed person search response"
    );

    PersonResponse {
        status: integer(raw, Field::Status),
        message: opt_text(raw, Field::Message),
        records,
        people,
        source,
        total_entities: entities.len(),
        entity_counts,
        entities,
        raw_response: raw.clone(),
    }
}

/// Parse a payload of either shape. Never fails.
///
/// A payload with a people section or a record count is a search result; everything
/// else is treated as a person detail.
pub fn parse_trace_response(raw: &Value) -> ParsedTrace {
    if is_search_payload(raw) {
        ParsedTrace::Search(parse_person_response(raw))
    } else {
        ParsedTrace::Detail(parse_person_detail_response(raw))
    }
}

/// Whether a payload has the person-search shape.
pub fn is_search_payload(raw: &Value) -> bool {
    has_section(raw, Section::People)
        || (lookup(raw, Field::Records).is_some() && !has_section(raw, Section::PersonDetails))
}

/// Top-level `Source` label, or [`UNKNOWN_SOURCE`].
///
/// Section-level source keys are ignored; one response has one provenance.
pub fn source_label(raw: &Value) -> String {
    opt_text(raw, Field::Source).unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

fn full_address(raw: &Value) -> Option<String> {
    if let Some(nested @ Value::Object(_)) = raw.get("address") {
        if let Some(full) = opt_text(nested, Field::FullAddress) {
            return Some(full);
        }
    }
    opt_text(raw, Field::FullAddress)
}

fn describes_property(raw: &Value) -> bool {
    [
        Field::Beds,
        Field::Baths,
        Field::Sqft,
        Field::YearBuilt,
        Field::LotSize,
        Field::PropertyType,
        Field::Estimate,
    ]
    .into_iter()
    .any(|field| lookup(raw, field).is_some())
}

/// Number of entities of a given kind.
pub fn count_kind(entities: &[Entity], kind: EntityKind) -> usize {
    entities.iter().filter(|e| e.kind() == kind).count()
}

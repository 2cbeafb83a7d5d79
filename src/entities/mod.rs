//! Canonical entity model produced from trace payloads.
//!
//! An [`Entity`] is one normalized fact (a property, an address, a phone, an email, a
//! person or an image). The `type` tag and the shared `source`/`category` fields are
//! flattened into one JSON object so exported entities read as a single record.

pub mod builders;

use serde::{Deserialize, Serialize};

/// Provenance label used when a response carries none.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// One normalized fact extracted from a trace response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Provenance label of the response the entity came from.
    pub source: String,
    /// Refinement of the entity's meaning within its type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Type-specific payload, tagged by `type`.
    #[serde(flatten)]
    pub data: EntityData,
}

/// Type-specific entity payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityData {
    /// A parcel with physical characteristics and a valuation.
    Property(PropertyEntity),
    /// A postal address a person is associated with.
    Address(AddressEntity),
    /// A phone line.
    Phone(PhoneEntity),
    /// An email address.
    Email(EmailEntity),
    /// A person, either the subject or someone connected to them.
    Person(PersonEntity),
    /// A photo or street view image.
    Image(ImageEntity),
}

/// Property characteristics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyEntity {
    /// Street line or single-line address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// ZIP code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    /// Bedroom count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beds: Option<f64>,
    /// Bathroom count; halves allowed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baths: Option<f64>,
    /// Living area in square feet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sqft: Option<f64>,
    /// Construction year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i64>,
    /// Lot size as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_size: Option<String>,
    /// Property type as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    /// Valuation estimate in dollars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
}

/// Postal address.
///
/// Current addresses carry `date_range`, previous addresses carry `timespan`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressEntity {
    /// Street line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    /// City.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// State.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal: Option<String>,
    /// County name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    /// Residency range of a current address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    /// Residency span of a previous address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timespan: Option<String>,
}

/// Phone line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneEntity {
    /// Phone number as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    /// Line type (wireless, landline, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<String>,
    /// Carrier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// When the line was last reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reported: Option<String>,
}

/// Email address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailEntity {
    /// Address; emitted only when it contains `@`.
    pub email: String,
}

/// Person record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonEntity {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Age in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// Birth date or year as reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born: Option<String>,
    /// Current city of residence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lives_in: Option<String>,
    /// Telephone on the summary record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephone: Option<String>,
    /// Provider link to the detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_link: Option<String>,
    /// Provider person identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
}

/// Image reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageEntity {
    /// Image URL.
    pub url: String,
    /// Caption or alt text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Display sequence; lower sorts first.
    pub order: i64,
}

/// Entity type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Property record.
    Property,
    /// Postal address.
    Address,
    /// Phone line.
    Phone,
    /// Email address.
    Email,
    /// Person.
    Person,
    /// Photo or street view.
    Image,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Property => write!(f, "property"),
            EntityKind::Address => write!(f, "address"),
            EntityKind::Phone => write!(f, "phone"),
            EntityKind::Email => write!(f, "email"),
            EntityKind::Person => write!(f, "person"),
            EntityKind::Image => write!(f, "image"),
        }
    }
}

/// Category refining an entity's meaning within its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Address the subject currently lives at.
    Current,
    /// Address the subject used to live at.
    Previous,
    /// Family member of the subject.
    Relative,
    /// Non-family associate of the subject.
    Associate,
    /// Person found living at a searched address or matching a search.
    Resident,
    /// Listing photo of a property.
    PropertyPhoto,
    /// Synthetic street view image of a known address.
    StreetView,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Current => write!(f, "current"),
            Category::Previous => write!(f, "previous"),
            Category::Relative => write!(f, "relative"),
            Category::Associate => write!(f, "associate"),
            Category::Resident => write!(f, "resident"),
            Category::PropertyPhoto => write!(f, "property_photo"),
            Category::StreetView => write!(f, "street_view"),
        }
    }
}

impl Entity {
    /// Create an entity with the given source and payload.
    pub fn new(source: impl Into<String>, data: EntityData) -> Self {
        Self {
            source: source.into(),
            category: None,
            data,
        }
    }

    /// Set the category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// The entity's type.
    pub fn kind(&self) -> EntityKind {
        match &self.data {
            EntityData::Property(_) => EntityKind::Property,
            EntityData::Address(_) => EntityKind::Address,
            EntityData::Phone(_) => EntityKind::Phone,
            EntityData::Email(_) => EntityKind::Email,
            EntityData::Person(_) => EntityKind::Person,
            EntityData::Image(_) => EntityKind::Image,
        }
    }

    /// Whether the entity carries enough data to be worth emitting.
    ///
    /// Builders never drop records; the parser applies this filter afterwards.
    pub fn is_meaningful(&self) -> bool {
        match &self.data {
            EntityData::Property(p) => {
                p.address.is_some()
                    || p.city.is_some()
                    || p.state.is_some()
                    || p.zip.is_some()
                    || p.beds.is_some()
                    || p.baths.is_some()
                    || p.sqft.is_some()
                    || p.year_built.is_some()
                    || p.lot_size.is_some()
                    || p.property_type.is_some()
                    || p.estimate.is_some()
            }
            EntityData::Address(a) => a.street.is_some() || a.city.is_some(),
            EntityData::Phone(p) => p.number.is_some(),
            EntityData::Email(e) => e.email.contains('@'),
            EntityData::Person(p) => match self.category {
                None => {
                    p.name.is_some()
                        || p.age.is_some()
                        || p.born.is_some()
                        || p.lives_in.is_some()
                        || p.telephone.is_some()
                }
                Some(_) => p.name.is_some(),
            },
            EntityData::Image(i) => !i.url.is_empty(),
        }
    }
}

/// Entity totals partitioned by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    /// Property entities.
    pub properties: usize,
    /// Address entities.
    pub addresses: usize,
    /// Phone entities.
    pub phones: usize,
    /// Email entities.
    pub emails: usize,
    /// Person entities.
    pub persons: usize,
    /// Image entities.
    pub images: usize,
}

impl EntityCounts {
    /// Count entities by type.
    pub fn from_entities(entities: &[Entity]) -> Self {
        let mut counts = Self::default();
        for entity in entities {
            counts.record(entity.kind());
        }
        counts
    }

    /// Increment the bucket for one entity type.
    pub fn record(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Property => self.properties += 1,
            EntityKind::Address => self.addresses += 1,
            EntityKind::Phone => self.phones += 1,
            EntityKind::Email => self.emails += 1,
            EntityKind::Person => self.persons += 1,
            EntityKind::Image => self.images += 1,
        }
    }

    /// Sum over all buckets.
    pub fn total(&self) -> usize {
        self.properties + self.addresses + self.phones + self.emails + self.persons + self.images
    }
}

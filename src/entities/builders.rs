//! One builder per raw record kind.
//!
//! Builders are pure and total: they always return exactly one entity, possibly a thin
//! one. Dropping degenerate entities is the caller's job (see [`Entity::is_meaningful`]).

use reqwest::Url;
use serde_json::Value;

use super::{
    AddressEntity, Category, EmailEntity, Entity, EntityData, ImageEntity, PersonEntity,
    PhoneEntity, PropertyEntity,
};
use crate::extract::{integer, number, opt_text, text, Field};

/// Display order of the synthetic street view image.
pub const STREET_VIEW_ORDER: i64 = 999;

const STREET_VIEW_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/streetview";
const STREET_VIEW_SIZE: &str = "640x400";

/// Build an address the subject currently lives at.
pub fn current_address(record: &Value, source: &str) -> Entity {
    let mut address = address_fields(record);
    address.date_range = opt_text(record, Field::DateRange);
    Entity::new(source, EntityData::Address(address)).with_category(Category::Current)
}

/// Build an address the subject used to live at.
pub fn previous_address(record: &Value, source: &str) -> Entity {
    let mut address = address_fields(record);
    address.timespan = opt_text(record, Field::Timespan);
    Entity::new(source, EntityData::Address(address)).with_category(Category::Previous)
}

fn address_fields(record: &Value) -> AddressEntity {
    AddressEntity {
        street: opt_text(record, Field::Street),
        city: opt_text(record, Field::City),
        state: opt_text(record, Field::State),
        postal: opt_text(record, Field::Postal),
        county: opt_text(record, Field::County),
        date_range: None,
        timespan: None,
    }
}

/// Build a phone line.
pub fn phone(record: &Value, source: &str) -> Entity {
    // Some providers list bare numbers instead of objects.
    let number = match record {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => opt_text(record, Field::PhoneNumber),
    };

    Entity::new(
        source,
        EntityData::Phone(PhoneEntity {
            number,
            phone_type: opt_text(record, Field::PhoneType),
            provider: opt_text(record, Field::Provider),
            last_reported: opt_text(record, Field::LastReported),
        }),
    )
}

/// Build an email from a bare string or an object with an email field.
pub fn email(record: &Value, source: &str) -> Entity {
    let email = match record {
        Value::String(s) => s.trim().to_string(),
        other => text(other, Field::Email),
    };
    Entity::new(source, EntityData::Email(EmailEntity { email }))
}

/// Build the primary person of a person-detail response.
pub fn person_detail(record: &Value, source: &str) -> Entity {
    Entity::new(source, EntityData::Person(person_fields(record)))
}

/// Build a relative of the primary person.
pub fn relative(record: &Value, source: &str) -> Entity {
    Entity::new(source, EntityData::Person(person_fields(record))).with_category(Category::Relative)
}

/// Build an associate of the primary person.
pub fn associate(record: &Value, source: &str) -> Entity {
    Entity::new(source, EntityData::Person(person_fields(record)))
        .with_category(Category::Associate)
}

/// Build a person returned by a person search.
pub fn search_person(record: &Value, source: &str) -> Entity {
    Entity::new(source, EntityData::Person(person_fields(record)))
        .with_category(Category::Resident)
}

fn person_fields(record: &Value) -> PersonEntity {
    PersonEntity {
        name: opt_text(record, Field::Name),
        age: integer(record, Field::Age).and_then(|age| u32::try_from(age).ok()),
        born: opt_text(record, Field::Born),
        lives_in: opt_text(record, Field::LivesIn),
        telephone: opt_text(record, Field::Telephone),
        person_link: opt_text(record, Field::PersonLink),
        person_id: opt_text(record, Field::PersonId),
    }
}

/// Build a listing photo. `index` is the photo's position in its section and is used
/// as the display order unless the record carries its own.
pub fn photo(record: &Value, index: usize, source: &str) -> Entity {
    let (url, caption, order) = match record {
        Value::String(s) => (s.trim().to_string(), None, None),
        other => (
            text(other, Field::Url),
            opt_text(other, Field::Caption),
            integer(other, Field::Order),
        ),
    };

    Entity::new(
        source,
        EntityData::Image(ImageEntity {
            url,
            caption,
            order: order.unwrap_or(index as i64),
        }),
    )
    .with_category(Category::PropertyPhoto)
}

/// Build a property.
///
/// Location fields are read from a nested `address` object when present, otherwise from
/// the record itself.
pub fn property(record: &Value, source: &str) -> Entity {
    let location = match record.get("address") {
        Some(nested @ Value::Object(_)) => nested,
        _ => record,
    };

    let address = opt_text(location, Field::Street).or_else(|| opt_text(location, Field::FullAddress));

    Entity::new(
        source,
        EntityData::Property(PropertyEntity {
            address,
            city: opt_text(location, Field::City),
            state: opt_text(location, Field::State),
            zip: opt_text(location, Field::Postal),
            beds: number(record, Field::Beds),
            baths: number(record, Field::Baths),
            sqft: number(record, Field::Sqft),
            year_built: integer(record, Field::YearBuilt),
            lot_size: opt_text(record, Field::LotSize),
            property_type: opt_text(record, Field::PropertyType),
            estimate: number(record, Field::Estimate),
        }),
    )
}

/// Build the synthetic street view image for a known address.
pub fn street_view(full_address: &str, source: &str) -> Entity {
    Entity::new(
        source,
        EntityData::Image(ImageEntity {
            url: street_view_url(full_address),
            caption: Some(format!("Street view of {}", full_address)),
            order: STREET_VIEW_ORDER,
        }),
    )
    .with_category(Category::StreetView)
}

fn street_view_url(full_address: &str) -> String {
    match Url::parse_with_params(
        STREET_VIEW_ENDPOINT,
        &[("size", STREET_VIEW_SIZE), ("location", full_address)],
    ) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}?size={}", STREET_VIEW_ENDPOINT, STREET_VIEW_SIZE),
    }
}

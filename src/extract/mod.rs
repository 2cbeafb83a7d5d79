//! Tolerant field extraction over untyped trace payloads.
//!
//! Trace providers spell the same field differently between endpoints, response
//! versions and even sections of one response (`Person_name`, `person_name`,
//! `Person Name`, `personName`). Every logical field owns an ordered alias list and a
//! single generic [`lookup`] walks it. All functions here are total: absence or a wrong
//! type yields `""`, `None` or an empty list, never an error.

use serde_json::Value;

/// Logical record fields understood by the entity builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Person display name.
    Name,
    /// Person age.
    Age,
    /// Birth date or year as reported.
    Born,
    /// Current city of residence.
    LivesIn,
    /// Person telephone on summary records.
    Telephone,
    /// Provider link to the person detail page.
    PersonLink,
    /// Provider person identifier.
    PersonId,
    /// Street line of an address.
    Street,
    /// City or locality.
    City,
    /// State or region.
    State,
    /// Postal code.
    Postal,
    /// County name.
    County,
    /// Residency range of a current address.
    DateRange,
    /// Residency span of a previous address.
    Timespan,
    /// Phone number.
    PhoneNumber,
    /// Phone line type (wireless, landline, ...).
    PhoneType,
    /// Phone carrier.
    Provider,
    /// When the phone was last reported.
    LastReported,
    /// Email address.
    Email,
    /// Image URL.
    Url,
    /// Image caption.
    Caption,
    /// Display order of an image.
    Order,
    /// Bedroom count.
    Beds,
    /// Bathroom count.
    Baths,
    /// Living area in square feet.
    Sqft,
    /// Construction year.
    YearBuilt,
    /// Lot size as reported.
    LotSize,
    /// Property type as reported.
    PropertyType,
    /// Valuation estimate.
    Estimate,
    /// Single-line postal address.
    FullAddress,
    /// Provenance label of the response.
    Source,
    /// Upstream status code.
    Status,
    /// Upstream status message.
    Message,
    /// Upstream record count.
    Records,
}

impl Field {
    /// Key spellings tried in order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Name => &[
                "Person_name",
                "person_name",
                "Person Name",
                "personName",
                "Name",
                "name",
                "full_name",
                "Full Name",
                "fullName",
            ],
            Field::Age => &["Age", "age"],
            Field::Born => &[
                "Born",
                "born",
                "birth_date",
                "birthDate",
                "Birth Date",
                "Date of Birth",
                "dob",
                "DOB",
            ],
            Field::LivesIn => &["Lives_in", "lives_in", "Lives in", "Lives In", "livesIn"],
            Field::Telephone => &["Telephone", "telephone", "Phone", "phone"],
            Field::PersonLink => &[
                "Person_link",
                "person_link",
                "Person Link",
                "personLink",
                "Link",
                "link",
            ],
            Field::PersonId => &[
                "Person_id",
                "person_id",
                "Person ID",
                "Person Id",
                "personId",
                "peo_id",
            ],
            Field::Street => &[
                "street_address",
                "Street_address",
                "Street Address",
                "streetAddress",
                "street",
                "Street",
                "address_line1",
                "address",
                "Address",
            ],
            Field::City => &[
                "address_locality",
                "Address_locality",
                "Address Locality",
                "addressLocality",
                "city",
                "City",
                "locality",
            ],
            Field::State => &[
                "address_region",
                "Address_region",
                "Address Region",
                "addressRegion",
                "state",
                "State",
                "region",
            ],
            Field::Postal => &[
                "postal_code",
                "Postal_code",
                "Postal Code",
                "postalCode",
                "zip",
                "Zip",
                "zipcode",
                "zip_code",
            ],
            Field::County => &["county", "County", "county_name", "countyName"],
            Field::DateRange => &["date_range", "Date_range", "Date Range", "dateRange"],
            Field::Timespan => &["timespan", "Timespan", "time_span", "Time Span", "timeSpan"],
            Field::PhoneNumber => &[
                "phone_number",
                "Phone_number",
                "Phone Number",
                "phoneNumber",
                "number",
                "Number",
                "phone",
                "Phone",
            ],
            Field::PhoneType => &["phone_type", "Phone_type", "Phone Type", "phoneType", "type"],
            Field::Provider => &[
                "provider",
                "Provider",
                "phone_provider",
                "phoneProvider",
                "carrier",
                "Carrier",
            ],
            Field::LastReported => &[
                "last_reported",
                "Last_reported",
                "Last Reported",
                "lastReported",
            ],
            Field::Email => &[
                "email",
                "Email",
                "email_address",
                "Email Address",
                "emailAddress",
            ],
            Field::Url => &["url", "URL", "Url", "image_url", "imageUrl", "src", "href"],
            Field::Caption => &["caption", "Caption", "title", "alt"],
            Field::Order => &["order", "Order", "position"],
            Field::Beds => &["beds", "Beds", "bedrooms", "Bedrooms"],
            Field::Baths => &["baths", "Baths", "bathrooms", "Bathrooms"],
            Field::Sqft => &[
                "sqft",
                "Sqft",
                "square_feet",
                "Square Feet",
                "squareFeet",
                "living_area",
                "livingArea",
            ],
            Field::YearBuilt => &["year_built", "Year_built", "Year Built", "yearBuilt"],
            Field::LotSize => &["lot_size", "Lot_size", "Lot Size", "lotSize"],
            Field::PropertyType => &[
                "property_type",
                "Property_type",
                "Property Type",
                "propertyType",
                "home_type",
                "homeType",
            ],
            Field::Estimate => &[
                "estimate",
                "Estimate",
                "estimated_value",
                "Estimated Value",
                "estimatedValue",
                "zestimate",
                "price",
            ],
            Field::FullAddress => &[
                "full",
                "Full",
                "full_address",
                "Full Address",
                "fullAddress",
                "formatted_address",
            ],
            Field::Source => &["Source", "source"],
            Field::Status => &["Status", "status"],
            Field::Message => &["Message", "message"],
            Field::Records => &["Records", "records", "total_records", "totalRecords"],
        }
    }
}

/// Array-valued sections of a trace payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Primary person summary records.
    PersonDetails,
    /// Email addresses (strings or objects).
    Emails,
    /// Phone records.
    Phones,
    /// Current address records.
    CurrentAddresses,
    /// Previous address records.
    PreviousAddresses,
    /// Relatives of the primary person.
    Relatives,
    /// Associates of the primary person.
    Associates,
    /// Property photos (strings or objects).
    Photos,
    /// Property records; a single object counts as one record.
    Properties,
    /// Person-search results.
    People,
}

impl Section {
    /// Key spellings tried in order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Section::PersonDetails => &[
                "Person Details",
                "Person_details",
                "person_details",
                "PersonDetails",
                "personDetails",
            ],
            Section::Emails => &[
                "Email Addresses",
                "Email_addresses",
                "email_addresses",
                "emailAddresses",
                "Emails",
                "emails",
            ],
            Section::Phones => &[
                "All Phone Details",
                "All_phone_details",
                "all_phone_details",
                "Phone Details",
                "phone_details",
                "phoneDetails",
                "Phones",
                "phones",
            ],
            Section::CurrentAddresses => &[
                "Current Address Details List",
                "Current_address_details_list",
                "current_address_details_list",
                "Current Addresses",
                "current_addresses",
                "currentAddresses",
            ],
            Section::PreviousAddresses => &[
                "Previous Address Details",
                "Previous_address_details",
                "previous_address_details",
                "Previous Addresses",
                "previous_addresses",
                "previousAddresses",
            ],
            Section::Relatives => &["All Relatives", "All_relatives", "all_relatives", "Relatives", "relatives"],
            Section::Associates => &[
                "All Associates",
                "All_associates",
                "all_associates",
                "Associates",
                "associates",
            ],
            Section::Photos => &["photos", "Photos", "images", "Images", "property_photos"],
            Section::Properties => &[
                "Property Details",
                "property_details",
                "propertyDetails",
                "properties",
                "Properties",
                "property",
                "Property",
            ],
            Section::People => &[
                "PeopleDetails",
                "People Details",
                "people_details",
                "peopleDetails",
                "People",
                "people",
            ],
        }
    }

    fn accepts_single_record(self) -> bool {
        matches!(self, Section::Properties)
    }
}

/// First usable value under the field's aliases.
///
/// `null`, arrays and objects are skipped so that e.g. an `address` object does not
/// shadow a later string alias.
pub fn lookup(record: &Value, field: Field) -> Option<&Value> {
    field.aliases().iter().find_map(|key| match record.get(*key) {
        None | Some(Value::Null) | Some(Value::Array(_)) | Some(Value::Object(_)) => None,
        Some(value) => Some(value),
    })
}

/// String value of a field, `""` when absent.
pub fn text(record: &Value, field: Field) -> String {
    match lookup(record, field) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// String value of a field, `None` when absent or blank.
pub fn opt_text(record: &Value, field: Field) -> Option<String> {
    let value = text(record, field);
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Numeric value of a field.
///
/// Accepts JSON numbers and numeric strings such as `"3"`, `"2.5"` or `"$350,000"`.
pub fn number(record: &Value, field: Field) -> Option<f64> {
    match lookup(record, field)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

/// Integer value of a field.
///
/// Strings contribute their first run of digits, so `"Age 34"` and `"34 years"` both
/// give `34`.
pub fn integer(record: &Value, field: Field) -> Option<i64> {
    match lookup(record, field)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        Value::String(s) => leading_digits(s),
        _ => None,
    }
}

/// Records of a section; empty when absent or not an array.
pub fn section(record: &Value, section: Section) -> Vec<&Value> {
    for key in section.aliases() {
        match record.get(*key) {
            Some(Value::Array(items)) => return items.iter().collect(),
            Some(value @ Value::Object(_)) if section.accepts_single_record() => {
                return vec![value]
            }
            _ => {}
        }
    }
    Vec::new()
}

/// Whether any of the section's aliases holds an array.
pub fn has_section(record: &Value, section: Section) -> bool {
    section
        .aliases()
        .iter()
        .any(|key| matches!(record.get(*key), Some(Value::Array(_))))
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn leading_digits(raw: &str) -> Option<i64> {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

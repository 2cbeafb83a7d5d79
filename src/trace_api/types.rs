use serde::{Deserialize, Serialize};

/// A lookup against the skip-trace provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TraceQuery {
    /// People matching a name, optionally narrowed by "City, ST" or ZIP.
    ByName {
        /// Full or partial name.
        name: String,
        /// "City, ST" or ZIP.
        citystatezip: Option<String>,
    },
    /// People associated with a street address.
    ByAddress {
        /// Street line.
        street: String,
        /// "City, ST" or ZIP.
        citystatezip: String,
    },
    /// People associated with a phone number.
    ByPhone {
        /// Phone number.
        phone: String,
    },
    /// People associated with an email address.
    ByEmail {
        /// Email address.
        email: String,
    },
    /// Full detail record of one person.
    Details {
        /// Provider person identifier.
        person_id: String,
    },
}

impl TraceQuery {
    /// Endpoint path relative to the provider base URL
    pub fn endpoint(&self) -> &'static str {
        match self {
            TraceQuery::ByName { .. } => "/search/byname",
            TraceQuery::ByAddress { .. } => "/search/byaddress",
            TraceQuery::ByPhone { .. } => "/search/byphone",
            TraceQuery::ByEmail { .. } => "/search/byemail",
            TraceQuery::Details { .. } => "/search/detailsbyID",
        }
    }

    /// Query string parameters
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            TraceQuery::ByName { name, citystatezip } => {
                let mut params = vec![("name", name.clone())];
                if let Some(csz) = citystatezip {
                    params.push(("citystatezip", csz.clone()));
                }
                params
            }
            TraceQuery::ByAddress {
                street,
                citystatezip,
            } => vec![
                ("street", street.clone()),
                ("citystatezip", citystatezip.clone()),
            ],
            TraceQuery::ByPhone { phone } => vec![("phoneno", phone.clone())],
            TraceQuery::ByEmail { email } => vec![("email", email.clone())],
            TraceQuery::Details { person_id } => vec![("peo_id", person_id.clone())],
        }
    }

    /// Name recorded on session nodes
    pub fn api_name(&self) -> &'static str {
        match self {
            TraceQuery::ByName { .. } => "search-by-name",
            TraceQuery::ByAddress { .. } => "search-by-address",
            TraceQuery::ByPhone { .. } => "search-by-phone",
            TraceQuery::ByEmail { .. } => "search-by-email",
            TraceQuery::Details { .. } => "person-details",
        }
    }

    /// Human readable description
    pub fn describe(&self) -> String {
        match self {
            TraceQuery::ByName {
                name,
                citystatezip: Some(csz),
            } => format!("{} ({})", name, csz),
            TraceQuery::ByName { name, .. } => name.clone(),
            TraceQuery::ByAddress {
                street,
                citystatezip,
            } => format!("{}, {}", street, citystatezip),
            TraceQuery::ByPhone { phone } => phone.clone(),
            TraceQuery::ByEmail { email } => email.clone(),
            TraceQuery::Details { person_id } => format!("person {}", person_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_params() {
        let query = TraceQuery::ByName {
            name: "Jane Doe".to_string(),
            citystatezip: None,
        };
        assert_eq!(query.params(), vec![("name", "Jane Doe".to_string())]);
        assert_eq!(query.describe(), "Jane Doe");

        let query = TraceQuery::ByName {
            name: "Jane Doe".to_string(),
            citystatezip: Some("Minneapolis, MN".to_string()),
        };
        assert_eq!(query.params().len(), 2);
        assert_eq!(query.describe(), "Jane Doe (Minneapolis, MN)");
    }

    #[test]
    fn test_details_endpoint() {
        let query = TraceQuery::Details {
            person_id: "px1".to_string(),
        };
        assert_eq!(query.endpoint(), "/search/detailsbyID");
        assert_eq!(query.params(), vec![("peo_id", "px1".to_string())]);
        assert_eq!(query.api_name(), "person-details");
    }
}

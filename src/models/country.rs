//! Country list models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which side of the country list an entry sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountryListKind {
    /// Offered to users
    Available,
    /// Hidden from users
    Disabled,
}

/// One country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// Display name
    pub name: String,
    /// ISO 3166-1 alpha-3 code
    pub code: String,
    /// ISO 3166-1 alpha-2 code
    pub code_short: String,
    /// International dialling code
    #[serde(default)]
    pub dial_code: Option<String>,
    /// Non-zero when offered to users
    #[serde(default)]
    pub available: i64,
}

impl Country {
    /// List this country belongs to.
    pub fn list(&self) -> CountryListKind {
        if self.available == 0 {
            CountryListKind::Disabled
        } else {
            CountryListKind::Available
        }
    }
}

/// The country list as cached by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryList {
    /// Number of countries
    #[serde(default)]
    pub count: u64,
    /// Countries keyed by alpha-3 code
    #[serde(default)]
    pub countries: BTreeMap<String, Country>,
    /// Whether the list was loaded
    #[serde(default)]
    pub available: Option<bool>,
    /// Unix time the list was cached
    #[serde(default)]
    pub cached_on: i64,
}

impl CountryList {
    /// Countries on one side of the list, ordered by code.
    pub fn of_kind(&self, kind: CountryListKind) -> impl Iterator<Item = &Country> {
        self.countries.values().filter(move |c| c.list() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_country_list_split() {
        let list: CountryList = serde_json::from_value(json!({
            "count": 2,
            "countries": {
                "PAK": {"name": "Pakistan", "code": "PAK", "codeShort": "PK", "dialCode": "92", "available": 1},
                "NOR": {"name": "Norway", "code": "NOR", "codeShort": "NO", "available": 0}
            },
            "cachedOn": 1700000000
        }))
        .unwrap();
        assert_eq!(list.count, 2);
        let available: Vec<&str> = list
            .of_kind(CountryListKind::Available)
            .map(|c| c.code.as_str())
            .collect();
        assert_eq!(available, ["PAK"]);
        assert_eq!(list.countries["NOR"].list(), CountryListKind::Disabled);
        assert_eq!(list.countries["NOR"].dial_code, None);
    }
}

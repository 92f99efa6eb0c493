use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Role;

/// Image host reference for a profile picture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Avatar {
    pub public_id: String,
    pub url: String,
}

/// Shipping or billing address embedded in a user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
}

impl Address {
    /// Gives an address posted without an id a fresh one.
    pub fn ensure_id(&mut self) {
        if self.id.is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
    }

    /// Copies every field present in `other` over this address.
    fn merge(&mut self, other: Address) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field;
                })*
            };
        }
        take!(country, city, address1, address2, zip_code, address_type);
    }
}

/// Profile columns written by `update-user-info`. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Persisted user account. The password hash is never part of this type;
/// it is read separately through the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Avatar,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub addresses: Vec<Address>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Builds the account a freshly activated registration turns into.
    pub fn from_new(new_user: &NewUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            avatar: new_user.avatar.clone(),
            phone_number: None,
            role: Role::default(),
            addresses: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn apply_profile(&mut self, changes: ProfileChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(email) = changes.email {
            self.email = email;
        }
        if changes.phone_number.is_some() {
            self.phone_number = changes.phone_number;
        }
    }

    /// Updates the address with a matching id, or appends a new one.
    /// An address without an id is always appended under a fresh id.
    pub fn upsert_address(&mut self, address: Address) -> &Address {
        let position = if address.id.is_empty() {
            None
        } else {
            self.addresses.iter().position(|a| a.id == address.id)
        };

        match position {
            Some(index) => {
                self.addresses[index].merge(address);
                &self.addresses[index]
            }
            None => {
                let mut address = address;
                address.ensure_id();
                self.addresses.push(address);
                &self.addresses[self.addresses.len() - 1]
            }
        }
    }

    /// Removes the address with `address_id`. Returns whether one was removed.
    pub fn remove_address(&mut self, address_id: &str) -> bool {
        let before = self.addresses.len();
        self.addresses.retain(|a| a.id != address_id);
        self.addresses.len() != before
    }
}

/// Input for persisting an activated registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Avatar,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User::from_new(&NewUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            avatar: Avatar::default(),
        })
    }

    fn address(id: &str, city: &str) -> Address {
        Address {
            id: id.to_string(),
            city: Some(city.to_string()),
            ..Address::default()
        }
    }

    #[test]
    fn test_new_user_defaults() {
        let user = user();
        assert_eq!(user.role, Role::User);
        assert!(user.addresses.is_empty());
        assert!(user.phone_number.is_none());
    }

    #[test]
    fn test_upsert_appends_unknown_address() {
        let mut user = user();
        user.upsert_address(address("a1", "Lisbon"));
        user.upsert_address(address("a2", "Porto"));

        assert_eq!(user.addresses.len(), 2);
        assert_eq!(user.addresses[1].city.as_deref(), Some("Porto"));
    }

    #[test]
    fn test_upsert_merges_matching_address() {
        let mut user = user();
        let mut first = address("a1", "Lisbon");
        first.country = Some("PT".to_string());
        user.upsert_address(first);

        user.upsert_address(address("a1", "Faro"));

        assert_eq!(user.addresses.len(), 1);
        assert_eq!(user.addresses[0].city.as_deref(), Some("Faro"));
        assert_eq!(user.addresses[0].country.as_deref(), Some("PT"));
    }

    #[test]
    fn test_upsert_assigns_id_when_missing() {
        let mut user = user();
        let id = user.upsert_address(address("", "Braga")).id.clone();

        assert!(!id.is_empty());
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_remove_unknown_address_is_noop() {
        let mut user = user();
        user.upsert_address(address("a1", "Lisbon"));

        assert!(!user.remove_address("missing"));
        assert_eq!(user.addresses.len(), 1);

        assert!(user.remove_address("a1"));
        assert!(user.addresses.is_empty());
    }

    #[test]
    fn test_address_accepts_legacy_id_and_numeric_zip() {
        let parsed: Address = serde_json::from_value(serde_json::json!({
            "_id": "abc",
            "zipCode": 1000,
            "addressType": "Home"
        }))
        .unwrap();

        assert_eq!(parsed.id, "abc");
        assert_eq!(parsed.zip_code.as_deref(), Some("1000"));
        assert_eq!(parsed.address_type.as_deref(), Some("Home"));
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let mut user = user();
        user.phone_number = Some("555".to_string());
        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["phoneNumber"], "555");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("passwordHash").is_none());
    }
}

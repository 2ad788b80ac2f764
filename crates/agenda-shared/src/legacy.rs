//! Document model of the legacy store.
//!
//! The legacy application kept relationships embedded in user documents
//! (social graph arrays, per-user item and note references) instead of
//! normalized foreign keys. These structs mirror the exported documents and
//! are only ever read: the relational store is the sole owner of migrated
//! state.

use serde::{Deserialize, Serialize};

/// A document that can be looked up by its legacy identifier.
pub trait LegacyDocument {
    /// Collection name, used in logs and error messages.
    const COLLECTION: &'static str;

    fn id(&self) -> &str;
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyUser {
    #[serde(rename = "_id", deserialize_with = "extended_json::string")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Password hash, carried over verbatim.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    /// Notification lead time in minutes. Stored as free text by the legacy
    /// client, so it may not parse.
    #[serde(default, deserialize_with = "extended_json::opt_lenient_string")]
    pub notify_before: Option<String>,
    #[serde(default)]
    pub social: LegacySocial,
    #[serde(default)]
    pub items: Vec<LegacyEntryRef>,
    #[serde(default)]
    pub notes: Vec<LegacyEntryRef>,
    #[serde(default, deserialize_with = "extended_json::opt_string")]
    pub created_at: Option<String>,
}

impl LegacyDocument for LegacyUser {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }
}

/// The three relationship arrays of a legacy user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacySocial {
    /// Accepted friends.
    #[serde(default, deserialize_with = "extended_json::string_vec")]
    pub friends: Vec<String>,
    /// Users who sent this user a request.
    #[serde(default, deserialize_with = "extended_json::string_vec")]
    pub incoming: Vec<String>,
    /// Users this user sent a request to.
    #[serde(default, deserialize_with = "extended_json::string_vec")]
    pub outgoing: Vec<String>,
}

/// Entry of a user's `items` or `notes` array. Array position is the user's
/// ordering of the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntryRef {
    #[serde(alias = "item", alias = "note", deserialize_with = "extended_json::string")]
    pub id: String,
    #[serde(default)]
    pub permission: Option<String>,
    #[serde(default)]
    pub pending: bool,
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyItem {
    #[serde(rename = "_id", deserialize_with = "extended_json::string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "extended_json::opt_string")]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    /// Duration in minutes.
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub repeat: Option<String>,
    /// Identifier of the recurring template this item was generated from.
    #[serde(default, deserialize_with = "extended_json::opt_string")]
    pub template: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default, deserialize_with = "extended_json::opt_string")]
    pub created_at: Option<String>,
}

impl LegacyItem {
    /// Template items stand on their own; instance items point at one.
    pub fn is_template(&self) -> bool {
        self.template.as_deref().map_or(true, str::is_empty)
    }
}

impl LegacyDocument for LegacyItem {
    const COLLECTION: &'static str = "items";

    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Note
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyNote {
    #[serde(rename = "_id", deserialize_with = "extended_json::string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "extended_json::opt_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "extended_json::opt_string")]
    pub updated_at: Option<String>,
}

impl LegacyDocument for LegacyNote {
    const COLLECTION: &'static str = "notes";

    fn id(&self) -> &str {
        &self.id
    }
}

// ---------------------------------------------------------------------------
// Extended JSON
// ---------------------------------------------------------------------------

/// Decoders for the export format, where identifiers and timestamps appear
/// either as plain strings or wrapped as `{"$oid": ..}` / `{"$date": ..}`.
mod extended_json {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wrapped {
        Plain(String),
        Oid {
            #[serde(rename = "$oid")]
            oid: String,
        },
        Date {
            #[serde(rename = "$date")]
            date: String,
        },
    }

    impl From<Wrapped> for String {
        fn from(value: Wrapped) -> Self {
            match value {
                Wrapped::Plain(s) => s,
                Wrapped::Oid { oid } => oid,
                Wrapped::Date { date } => date,
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Text(String),
        Integer(i64),
        Float(f64),
    }

    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Wrapped::deserialize(deserializer).map(String::from)
    }

    pub fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Wrapped>::deserialize(deserializer)?.map(String::from))
    }

    pub fn string_vec<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<String>, D::Error> {
        Ok(Vec::<Wrapped>::deserialize(deserializer)?
            .into_iter()
            .map(String::from)
            .collect())
    }

    pub fn opt_lenient_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<Lenient>::deserialize(deserializer)?.map(|value| match value {
            Lenient::Text(s) => s,
            Lenient::Integer(n) => n.to_string(),
            Lenient::Float(f) => f.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_extended_json_identifiers() {
        let raw = r#"{
            "_id": {"$oid": "64f0c0ffee"},
            "username": "ada",
            "notifyBefore": 10,
            "social": {"friends": [{"$oid": "64f0beef"}, "plain-id"]},
            "items": [{"item": {"$oid": "i1"}, "permission": "edit", "pending": true}],
            "notes": [{"note": "n1"}],
            "createdAt": {"$date": "2023-05-01T10:00:00Z"}
        }"#;

        let user: LegacyUser = serde_json::from_str(raw).unwrap();
        assert_eq!(user.id, "64f0c0ffee");
        assert_eq!(user.notify_before.as_deref(), Some("10"));
        assert_eq!(user.social.friends, vec!["64f0beef", "plain-id"]);
        assert!(user.social.incoming.is_empty());
        assert_eq!(user.items[0].id, "i1");
        assert!(user.items[0].pending);
        assert_eq!(user.notes[0].id, "n1");
        assert_eq!(user.created_at.as_deref(), Some("2023-05-01T10:00:00Z"));
    }

    #[test]
    fn item_without_template_is_a_template() {
        let raw = r#"[
            {"_id": "t1", "name": "Gym", "repeat": "weekly"},
            {"_id": "i1", "name": "Gym", "template": {"$oid": "t1"}, "date": "2024-01-01"}
        ]"#;

        let items: Vec<LegacyItem> = serde_json::from_str(raw).unwrap();
        assert!(items[0].is_template());
        assert!(!items[1].is_template());
        assert_eq!(items[1].template.as_deref(), Some("t1"));
    }

    #[test]
    fn serialized_documents_decode_again() {
        let user = LegacyUser {
            id: "a".into(),
            username: "ada".into(),
            items: vec![LegacyEntryRef {
                id: "i1".into(),
                permission: None,
                pending: false,
            }],
            ..Default::default()
        };

        let json = serde_json::to_string(&user).unwrap();
        let back: LegacyUser = serde_json::from_str(&json).unwrap();
        assert_eq!(back, user);
    }
}

//! Typed views over stored documents. Writes go through as the client sent
//! them; only the fields the service itself reads get a type here, and even
//! those accept any JSON value.

use common_auth::Role;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::store::{Document, StoreResult};

/// The parts of a user document that role checks read.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<Value>,
    /// Raw stored value; see [`User::role`].
    #[serde(default)]
    pub role: Option<Value>,
}

impl User {
    /// The user's role, or `None` when unset, not a string, or not a
    /// recognised lowercase role.
    pub fn role(&self) -> Option<Role> {
        self.role
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse().ok())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

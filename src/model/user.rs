use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Workflow roles. Contacts on a quote record are always resolved to one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Petitioner,
    Validator,
    Provider,
    Supervisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Petitioner => "PETITIONER",
            Role::Validator => "VALIDATOR",
            Role::Provider => "PROVIDER",
            Role::Supervisor => "SUPERVISOR",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "PETITIONER" => Some(Role::Petitioner),
            "VALIDATOR" => Some(Role::Validator),
            "PROVIDER" => Some(Role::Provider),
            "SUPERVISOR" => Some(Role::Supervisor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    /// 10-digit MX number, unique per user; quote contacts reference it
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    /// Absent when the account was created through an external provider
    pub password_hash: Option<String>,
    pub company: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

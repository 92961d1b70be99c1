use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::lifecycle::QuoteState;
use crate::model::user::Role;

/// Aggregate root: one per physical request (client/project/serial/company).
/// Created once; owns its revision history and provider links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteInformation {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub company: String,
    pub client: String,
    pub project: String,
    pub serial: String,
    pub brand: String,
    /// Phone of the petitioner-side contact
    pub request_contact: String,
    /// Phone of the validator-side contact
    pub approval_contact: String,
    /// Set once a provider has been selected for this request
    pub provider_contact: Option<String>,
    pub estimated_delivery_date: String,
    pub status: QuoteState,
    /// Terminal stamp; once set the record is read-only
    pub finalized_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl QuoteInformation {
    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    pub fn provider_bound(&self) -> bool {
        self.provider_contact.is_some()
    }
}

/// One immutable revision in a quote record's history. Never mutated after
/// creation except to stamp `rejected_at` when superseded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRevision {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub quote_information_id: ObjectId,
    /// Monotonically increasing per quote record; ordering does not depend on
    /// creation timestamps
    pub sequence: u32,
    pub created_by_role: Role,
    pub comment: Option<String>,
    pub rejected_at: Option<String>,
    /// Provider user that authored this revision, when it came in through the
    /// provider path
    pub provider_quote_user_id: Option<ObjectId>,
    pub entries: Vec<Entry>,
    pub created_at: Option<String>,
}

/// One priced line item within a revision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub sizes: String,
    pub concept: String,
    /// Quantity range, e.g. "10 piezas"
    pub range: String,
    pub material: String,
    pub material_subtype: Option<String>,
    #[serde(default)]
    pub unitary_cost: f64,
    #[serde(default)]
    pub unitary_price: f64,
    #[serde(default)]
    pub unitary_final_price: f64,
    /// Object-storage path of the uploaded reference image
    pub image_path: Option<String>,
}

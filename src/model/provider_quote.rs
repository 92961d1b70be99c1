use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Link between a quote record and one candidate provider. While no provider
/// is bound, several of these may exist for the same record, each pointing at
/// the provider's independently submitted revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderQuote {
    #[serde(rename = "_id")]
    pub id: Option<ObjectId>,
    pub quote_information_id: ObjectId,
    pub provider_user_id: ObjectId,
    /// Revision the provider submitted; None until their first submission
    pub revision_id: Option<ObjectId>,
    pub created_at: Option<String>,
}

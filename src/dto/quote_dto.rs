use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::model::provider_quote::ProviderQuote;
use crate::model::quote::{QuoteInformation, QuoteRevision};

/// Uploaded file carried through a multipart submission
#[derive(Debug, Clone)]
pub struct File {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
    pub size: usize,
}

/// Contacts are plain 10-digit MX numbers
pub fn validate_mx_phone(phone: &str) -> Result<(), ValidationError> {
    if phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("mx_phone"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EntryDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 100))]
    pub sizes: String,

    #[validate(length(min = 1, max = 500))]
    pub concept: String,

    #[validate(length(min = 1, max = 100))]
    pub range: String,

    #[validate(length(min = 1, max = 100))]
    pub material: String,

    pub material_subtype: Option<String>,

    #[serde(default)]
    pub unitary_cost: f64,

    #[serde(default)]
    pub unitary_price: f64,

    #[serde(default)]
    pub unitary_final_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuoteRequest {
    #[validate(length(min = 2, max = 100))]
    pub company: String,

    #[validate(length(min = 2, max = 100))]
    pub client: String,

    #[validate(length(min = 2, max = 100))]
    pub project: String,

    #[validate(length(min = 1, max = 50))]
    pub serial: String,

    #[validate(length(min = 1, max = 100))]
    pub brand: String,

    #[validate(custom(function = "validate_mx_phone"))]
    pub request_contact: String,

    #[validate(custom(function = "validate_mx_phone"))]
    pub approval_contact: String,

    #[validate(length(min = 1, max = 50))]
    pub estimated_delivery_date: String,

    #[validate(length(min = 1), nested)]
    pub entries: Vec<EntryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RejectQuoteRequest {
    #[validate(length(min = 2, max = 1000))]
    pub comment: String,

    /// Revised entries carried into the replacement revision; the current
    /// revision's entries are reused when omitted
    #[validate(nested)]
    pub entries: Option<Vec<EntryDto>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProviderRevisionRequest {
    #[validate(length(min = 1), nested)]
    pub entries: Vec<EntryDto>,

    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteDetailResponse {
    pub info: QuoteInformation,
    pub current: QuoteRevision,
    pub history: Vec<QuoteRevision>,
    /// Candidate provider links; the petitioner picks from these while no
    /// provider is bound
    pub providers: Vec<ProviderQuote>,
    /// Download links for the current revision's entry images
    pub image_links: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteListResponse {
    pub records: Vec<QuoteInformation>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> EntryDto {
        EntryDto {
            name: "Exhibidor".to_string(),
            sizes: "22cm x 33cm".to_string(),
            concept: "Exhibidor de piso para botanas".to_string(),
            range: "10 piezas".to_string(),
            material: "MDF".to_string(),
            material_subtype: None,
            unitary_cost: 0.0,
            unitary_price: 0.0,
            unitary_final_price: 0.0,
        }
    }

    fn create_request() -> CreateQuoteRequest {
        CreateQuoteRequest {
            company: "alquipop".to_string(),
            client: "Botanas MX".to_string(),
            project: "Exhibidores 2026".to_string(),
            serial: "S-104".to_string(),
            brand: "Crunchis".to_string(),
            request_contact: "5512345678".to_string(),
            approval_contact: "5587654321".to_string(),
            estimated_delivery_date: "2026-09-15".to_string(),
            entries: vec![entry()],
        }
    }

    #[test]
    fn test_valid_create_request() {
        assert!(create_request().validate().is_ok());
    }

    #[test]
    fn test_phone_must_be_ten_digits() {
        let mut req = create_request();
        req.approval_contact = "55123".to_string();
        assert!(req.validate().is_err());

        let mut req = create_request();
        req.request_contact = "55-1234-567".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_entries_must_not_be_empty() {
        let mut req = create_request();
        req.entries.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_nested_entry_validation() {
        let mut req = create_request();
        req.entries[0].name = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_reject_requires_comment() {
        let req = RejectQuoteRequest {
            comment: "x".to_string(),
            entries: None,
        };
        assert!(req.validate().is_err());

        let req = RejectQuoteRequest {
            comment: "faltan medidas del segundo módulo".to_string(),
            entries: None,
        };
        assert!(req.validate().is_ok());
    }
}

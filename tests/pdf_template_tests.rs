use bson::oid::ObjectId;

use renders_backend::model::lifecycle::QuoteState;
use renders_backend::model::quote::{Entry, QuoteInformation, QuoteRevision};
use renders_backend::model::user::Role;
use renders_backend::util::pdf::render_quote_html;

fn sample_info() -> QuoteInformation {
    QuoteInformation {
        id: Some(ObjectId::new()),
        company: "alquipop".to_string(),
        client: "Botanas MX".to_string(),
        project: "Exhibidores 2026".to_string(),
        serial: "S-104".to_string(),
        brand: "Crunchis".to_string(),
        request_contact: "5512345678".to_string(),
        approval_contact: "5587654321".to_string(),
        provider_contact: None,
        estimated_delivery_date: "2026-09-15".to_string(),
        status: QuoteState::Finalized,
        finalized_at: Some("2026-08-05T12:00:00+00:00".to_string()),
        created_at: Some("2026-08-01T09:00:00+00:00".to_string()),
        updated_at: Some("2026-08-05T12:00:00+00:00".to_string()),
    }
}

fn sample_revision(info: &QuoteInformation) -> QuoteRevision {
    QuoteRevision {
        id: Some(ObjectId::new()),
        quote_information_id: info.id.unwrap(),
        sequence: 3,
        created_by_role: Role::Petitioner,
        comment: None,
        rejected_at: None,
        provider_quote_user_id: None,
        entries: vec![
            Entry {
                name: "Exhibidor".to_string(),
                sizes: "22cm x 33cm".to_string(),
                concept: "Exhibidor de piso para botanas".to_string(),
                range: "10 piezas".to_string(),
                material: "MDF".to_string(),
                material_subtype: Some("12mm".to_string()),
                unitary_cost: 1000.0,
                unitary_price: 1500.0,
                unitary_final_price: 1850.5,
                image_path: None,
            },
            Entry {
                name: "Cabecera".to_string(),
                sizes: "60cm x 40cm".to_string(),
                concept: "Cabecera impresa".to_string(),
                range: "10 piezas".to_string(),
                material: "Cartón".to_string(),
                material_subtype: None,
                unitary_cost: 200.0,
                unitary_price: 300.0,
                unitary_final_price: 350.0,
                image_path: None,
            },
        ],
        created_at: Some("2026-08-04T10:00:00+00:00".to_string()),
    }
}

#[test]
fn test_rendered_html_carries_quote_data() {
    let info = sample_info();
    let revision = sample_revision(&info);
    let html = render_quote_html(&info, &revision).expect("render");

    assert!(html.contains("Exhibidores 2026"));
    assert!(html.contains("S-104"));
    assert!(html.contains("Revisión 3"));
    assert!(html.contains("Exhibidor"));
    assert!(html.contains("MDF / 12mm"));
}

#[test]
fn test_currency_and_date_filters_apply() {
    let info = sample_info();
    let revision = sample_revision(&info);
    let html = render_quote_html(&info, &revision).expect("render");

    // Locale-formatted currency with grouping
    assert!(html.contains("$1,850.50"));
    assert!(html.contains("$350.00"));
    // Total of final prices
    assert!(html.contains("$2,200.50"));
    // Spanish long dates
    assert!(html.contains("15 de septiembre de 2026"));
    assert!(html.contains("5 de agosto de 2026"));
}

#[test]
fn test_unselected_optionals_render_cleanly() {
    let mut info = sample_info();
    info.finalized_at = None;
    let revision = sample_revision(&info);
    let html = render_quote_html(&info, &revision).expect("render");

    assert!(!html.contains("Cerrada el"));
}

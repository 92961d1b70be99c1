pub mod quote_flow_service;
pub mod user_service;

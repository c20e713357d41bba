pub mod lead;
pub mod lead_email;
pub mod subscribe_payload;

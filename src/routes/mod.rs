mod health_check;
mod leads;
mod sitemap;
mod subscribe;

pub use health_check::health_check;
pub use leads::{handle_export_leads, leads_to_csv, ExportToken};
pub use sitemap::{handle_sitemap, SiteUrl};
pub use subscribe::{handle_subscribe, SubscribeError, SubscriptionReport};

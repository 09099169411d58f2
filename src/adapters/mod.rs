// Adapters layer: concrete clients for the vendor listings API and Google Maps.

pub mod maps;
pub mod vendor;

pub use maps::GoogleMapsClient;
pub use vendor::{FetchOutcome, StopReason, VendorClient};

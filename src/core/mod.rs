pub mod analyze;
pub mod etl;
pub mod fetch;
pub mod postprocess;
pub mod preprocess;
pub mod runner;
pub mod stage_io;
pub mod urls;

pub use crate::domain::model::{
    AmenityFlags, AnalyzedRental, GeoPoint, Place, RawListing, Rental,
};
pub use crate::domain::ports::{MapsClient, Pipeline, Storage};
pub use crate::utils::error::Result;

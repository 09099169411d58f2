// Domain layer: listing models and ports (storage, maps, pipeline stage).

pub mod model;
pub mod ports;

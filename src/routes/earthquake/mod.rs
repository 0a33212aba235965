mod handler;
mod model;

pub use handler::{get_earthquake, list_earthquakes};
pub use model::EarthquakeQuery;

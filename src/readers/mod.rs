pub mod footprint_reader;
pub mod precipitation_reader;

pub use footprint_reader::FootprintReader;
pub use precipitation_reader::PrecipitationReader;

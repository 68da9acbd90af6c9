pub mod chart_writer;
pub mod geojson_writer;
pub mod map_writer;
pub mod precipitation_writer;
pub mod report_writer;

pub use chart_writer::ChartWriter;
pub use geojson_writer::{DatasetFileInfo, GeoJsonWriter};
pub use map_writer::MapWriter;
pub use precipitation_writer::PrecipitationWriter;
pub use report_writer::ReportWriter;

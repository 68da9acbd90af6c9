pub mod category;
pub mod footprint;
pub mod precipitation;

pub use category::{CategoryThresholds, PotentialCategory};
pub use footprint::{ColumnSummary, Dataset, Footprint};
pub use precipitation::{PrecipitationRecord, PrecipitationSource};

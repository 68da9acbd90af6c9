pub mod rainwater_analyzer;

pub use rainwater_analyzer::{
    CategoryStats, ImpactAssumptions, ImpactEstimate, RainwaterAnalyzer, RainwaterReport,
    RankedFootprint,
};

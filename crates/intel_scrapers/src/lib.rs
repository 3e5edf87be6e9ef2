pub mod clean;
pub mod manager;
pub mod scrapers;

pub use manager::{PipelineManager, PipelineReport};
pub use scrapers::{available_sources, scraper_for_source, scraper_for_url, ScrapeConfig, Scraper};

pub mod prelude {
    pub use super::scrapers::{ScrapeConfig, Scraper};
    pub use super::{PipelineManager, PipelineReport};
    pub use intel_core::{Error, Result, ScrapedArticle};
}

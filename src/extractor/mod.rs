pub mod json_ld;
pub mod page_extractor;
pub mod robots;
pub mod sitemap;

pub use page_extractor::{ImageAltStats, PageExtractor};
pub use robots::{PathRule, RobotsGroup, RobotsTxt};
pub use sitemap::{parse_sitemap, SitemapDocument, SitemapFormat};

//! Configuration module

mod site;

pub use site::CmsConfig;
pub use site::HighlightConfig;
pub use site::ReadingConfig;
pub use site::ServerConfig;
pub use site::SiteConfig;
pub use site::ENDPOINT_ENV;

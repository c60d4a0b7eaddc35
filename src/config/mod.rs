//! Configuration module

mod cms;
mod site;

pub use cms::CmsConfig;
pub use cms::PaginationConfig;
pub use site::SiteConfig;

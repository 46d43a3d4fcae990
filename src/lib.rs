pub mod config;
pub mod error;
pub mod exclusion;
pub mod extract;
pub mod filter;
pub mod mbox;
pub mod pipeline;
pub mod report;
pub mod writer;

pub use config::{Config, FetchErrorPolicy};
pub use error::SiftError;
pub use exclusion::{ExclusionProvider, ExclusionSet};
pub use extract::{ContactRecord, DateField, MailAddr};
pub use mbox::MboxReader;
pub use report::RunReport;

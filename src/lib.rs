pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod form;
pub mod http;
pub mod invoice;
pub mod load_config;
pub mod render;
pub mod section;
pub mod types;
pub mod validate;

pub use client::CubicClient;
pub use config::ClientConfig;
pub use error::{CubicError, InvoiceError, RenderError};
pub use section::{normalize, SectionCategory};

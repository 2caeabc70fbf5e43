pub mod cli;
pub mod config;
pub mod error;
pub mod lsp;
pub mod output;
pub mod protocol;

pub use error::{ClientError, FramingError};
pub use lsp::{LspClient, LspSession, ServerCommand};

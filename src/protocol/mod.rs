pub mod lsp;

pub use lsp::{Incoming, LSPNotification, LSPRequest, LSPResponse, ResponseError};

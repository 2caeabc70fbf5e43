pub mod client;
pub mod connection;
pub mod framing;
pub mod session;

pub use client::{initialize_params, LspClient, SessionState, ShutdownReport, Step};
pub use connection::ServerCommand;
pub use framing::{read_message_from, write_message_to, FramedTransport};
pub use session::{CloseReport, LspSession};

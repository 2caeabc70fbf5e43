/// JSON-RPC version carried by every outgoing message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Default session deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Budget for the shutdown/exit handshake and waiting on the child.
pub const CLOSE_TIMEOUT_SECS: u64 = 5;

/// Largest message body the transport will allocate for.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Longest single header line the transport will buffer.
pub const MAX_HEADER_LINE: usize = 8 * 1024;

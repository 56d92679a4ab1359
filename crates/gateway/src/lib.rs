pub mod connection;
pub mod cursor;
pub mod error;
pub mod transport;

pub use connection::ShardConnection;
pub use cursor::ScatterGatherCursor;
pub use error::GatherError;
pub use transport::{HttpTransport, ShardTransport};

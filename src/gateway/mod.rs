pub mod http;
pub mod mock;
pub mod realtime;
pub mod traits;

pub use http::RestGateway;
pub use mock::MockGateway;
pub use realtime::MessageFeed;
pub use traits::DirectoryGateway;

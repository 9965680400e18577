pub mod forwarding;
pub mod handlers;
pub mod middleware;
pub mod retry;
pub mod server;
pub mod session;
pub mod upstream;

pub use forwarding::{CookieForwarder, ErpAuthHeaders, RequestContext};
pub use retry::RetryOrchestrator;
pub use upstream::client::ErpClient;
pub use upstream::UpstreamReply;

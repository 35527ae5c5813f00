pub mod bridge;
pub mod session;
pub mod traits;

pub use bridge::BridgeService;
pub use session::Session;
pub use traits::{ChatEvent, ChatService, Conversation, Message};

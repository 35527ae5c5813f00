#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::new_without_default
)]

pub mod chat;
pub mod config;
pub mod error;
pub mod policy;
pub mod sched;
pub mod util;

pub use chat::{ChatEvent, ChatService, Conversation, Message, Session};
pub use config::Config;
pub use error::KeeperError;

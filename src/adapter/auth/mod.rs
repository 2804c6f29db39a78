//! Authentication Module
//!
//! Microsoft identity platform の OAuth2 フローと認可コードの受け取り

pub mod code_receiver;
pub mod microsoft_identity;

pub use code_receiver::{CodeReceiver, LoopbackCodeReceiver, ManualCodeReceiver};
pub use microsoft_identity::{AuthPrompt, MicrosoftIdentityProvider};

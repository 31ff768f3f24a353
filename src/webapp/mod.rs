//! Telegram Mini App host integration.
//!
//! Models the `Telegram.WebApp` bridge the host client injects, derives the
//! request credentials from it and parses the signed `initData` string.

mod bridge;
mod init_data;

pub use bridge::{AuthContext, BridgeError, InitDataUnsafe, MiniAppBridge, WebAppUser};
pub use init_data::{InitData, InitDataError};

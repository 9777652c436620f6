pub mod client;
pub mod session;

pub use client::DriveClient;
pub use session::{SessionProvider, StaticTokenSession, TokenFileSession};

// hubctl-api: Async Rust client for the IoT control hub backend

pub mod auth;
pub mod client;
pub mod devices;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;
pub mod websocket;

pub use auth::LOGIN_FAILED;
pub use client::{HubClient, REQUEST_FAILED, UNKNOWN_ERROR};
pub use error::Error;
pub use models::{
    CreationKind, Device, DeviceCreationResult, DeviceRegistration, DeviceState, LoginResponse,
    NewDevice, UNNAMED_DEVICE,
};
pub use session::{MemoryTokenStore, Session, TOKEN_KEY, TokenStore};
pub use transport::{TlsMode, TransportConfig};
pub use websocket::DeviceStateStream;

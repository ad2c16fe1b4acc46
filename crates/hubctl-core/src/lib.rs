// hubctl-core: Dashboard logic between hubctl-api and the CLI.

pub mod board;
pub mod busy;
pub mod config;
pub mod error;
pub mod hub;
pub mod notify;
pub mod onboarding;
pub mod qr;
pub mod scan;
pub mod user;

// ── Primary re-exports ──────────────────────────────────────────────
pub use board::{DeviceBoard, DeviceSummary};
pub use busy::{Action, BusyGuard, BusyTracker};
pub use config::{DEFAULT_API_URL, HubConfig, TlsVerification};
pub use error::CoreError;
pub use hub::Hub;
pub use notify::{MemoryNotifier, Notification, Notifier, Severity, TracingNotifier};
pub use onboarding::{OnboardingFlow, OnboardingState, OnboardingStrategy};
pub use qr::ProvisioningQr;
pub use scan::{LineScanner, PayloadScanner};
pub use user::{PLACEHOLDER_USERNAME, TokenPresenceResolver, User, UserResolver};

// Wire types consumers need without depending on hubctl-api directly.
pub use hubctl_api::{
    Device, DeviceCreationResult, DeviceState, DeviceStateStream, MemoryTokenStore, TokenStore,
};

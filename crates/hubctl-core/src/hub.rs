// ── Hub facade ──
//
// The dashboard controller: every user action goes through here. Each
// action marks itself busy, awaits exactly one backend call, reloads the
// full device list after a mutation, and reports its outcome through
// the notifier.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use hubctl_api::{
    Device, DeviceCreationResult, DeviceState, DeviceStateStream, HubClient, Session, TokenStore,
};
use secrecy::SecretString;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::board::{DeviceBoard, DeviceSummary};
use crate::busy::{Action, BusyTracker};
use crate::config::HubConfig;
use crate::error::CoreError;
use crate::notify::{Notification, Notifier, TracingNotifier};
use crate::onboarding::OnboardingStrategy;
use crate::user::{TokenPresenceResolver, User, UserResolver};

/// Entry point for consumers.
///
/// Built explicitly from a config and a token store; there is no global
/// instance. Call [`restore`](Self::restore) once after construction to
/// pick up a persisted session.
pub struct Hub {
    config: HubConfig,
    client: HubClient,
    board: DeviceBoard,
    busy: BusyTracker,
    user: ArcSwapOption<User>,
    notifier: Arc<dyn Notifier>,
    resolver: Arc<dyn UserResolver>,
}

impl Hub {
    /// Read the persisted session from `store` and build the HTTP client.
    /// Does not contact the backend.
    pub fn new(config: HubConfig, store: Arc<dyn TokenStore>) -> Result<Self, CoreError> {
        let session = Arc::new(Session::restore(store)?);
        let client = HubClient::new(config.url.as_str(), session, &config.transport())?;
        Ok(Self::from_client(config, client))
    }

    /// Wrap an already-built client (shares its session).
    pub fn from_client(config: HubConfig, client: HubClient) -> Self {
        Self {
            config,
            client,
            board: DeviceBoard::new(),
            busy: BusyTracker::new(),
            user: ArcSwapOption::empty(),
            notifier: Arc::new(TracingNotifier),
            resolver: Arc::new(TokenPresenceResolver::new()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_user_resolver(mut self, resolver: Arc<dyn UserResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn client(&self) -> &HubClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        self.client.session()
    }

    pub fn board(&self) -> &DeviceBoard {
        &self.board
    }

    pub fn busy(&self) -> &BusyTracker {
        &self.busy
    }

    pub fn is_busy(&self, action: &Action) -> bool {
        self.busy.is_busy(action)
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    pub fn current_user(&self) -> Option<Arc<User>> {
        self.user.load_full()
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Resolve the current user from the restored session. Never
    /// contacts the backend.
    pub fn restore(&self) -> Option<User> {
        let user = self.resolver.resolve(self.session());
        self.user.store(user.clone().map(Arc::new));
        debug!(user = ?user.as_ref().map(|u| &u.username), "session restored");
        user
    }

    pub async fn login(&self, username: &str, password: &SecretString) -> Result<User, CoreError> {
        let _busy = self.busy.begin(Action::Login);
        match self.authenticate(username, password).await {
            Ok(user) => {
                self.notify(Notification::success(
                    "Welcome back!",
                    "Successfully logged in to your IoT dashboard.",
                ));
                Ok(user)
            }
            Err(e) => Err(self.fail("Login failed", e)),
        }
    }

    /// Create the account, then log in with the same credentials.
    pub async fn sign_up(&self, username: &str, password: &SecretString) -> Result<User, CoreError> {
        let _busy = self.busy.begin(Action::SignUp);
        match self.register_and_authenticate(username, password).await {
            Ok(user) => {
                self.notify(Notification::success(
                    "Account created",
                    format!("Welcome, {username}!"),
                ));
                Ok(user)
            }
            Err(e) => Err(self.fail("Sign up failed", e)),
        }
    }

    /// Forget the token, the user and the device board.
    pub fn logout(&self) -> Result<(), CoreError> {
        let cleared = self.client.logout();
        self.user.store(None);
        self.board.clear();
        match cleared {
            Ok(()) => {
                self.notify(Notification::success(
                    "Logged out",
                    "You have been successfully logged out.",
                ));
                Ok(())
            }
            Err(e) => Err(self.fail("Logout failed", e.into())),
        }
    }

    async fn authenticate(&self, username: &str, password: &SecretString) -> Result<User, CoreError> {
        self.client.login(username, password).await?;
        let user = User::new(username);
        self.user.store(Some(Arc::new(user.clone())));
        info!(username, "signed in");
        Ok(user)
    }

    async fn register_and_authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<User, CoreError> {
        self.client.register(username, password).await?;
        self.authenticate(username, password).await
    }

    // ── Devices ──────────────────────────────────────────────────────

    /// Replace the board with the server's current list. Silent on
    /// success.
    pub async fn refresh_devices(&self) -> Result<Arc<Vec<Device>>, CoreError> {
        let _busy = self.busy.begin(Action::Refresh);
        match self.client.list_devices().await {
            Ok(devices) => {
                let snapshot = self.board.replace(devices);
                debug!(count = snapshot.len(), "device board refreshed");
                Ok(snapshot)
            }
            Err(e) => Err(self.fail("Failed to load devices", e.into())),
        }
    }

    /// The board as of the last refresh.
    pub fn devices(&self) -> Arc<Vec<Device>> {
        self.board.snapshot()
    }

    pub fn device(&self, device_id: &str) -> Option<Device> {
        self.board.get(device_id)
    }

    pub fn summary(&self) -> DeviceSummary {
        self.board.summary()
    }

    /// Ask the backend to set `state`, then reload the board. The new
    /// state is only visible once the reload lands; a failed reload is
    /// reported as its own action and does not fail the toggle.
    pub async fn toggle(&self, device_id: &str, state: DeviceState) -> Result<Value, CoreError> {
        let _busy = self.busy.begin(Action::Toggle(device_id.to_owned()));
        match self.request_toggle(device_id, state).await {
            Ok(ack) => {
                self.reload_after_mutation().await;
                let name = self
                    .device(device_id)
                    .map_or_else(|| device_id.to_owned(), |d| d.display_name().to_owned());
                let verb = if state.is_on() { "activated" } else { "deactivated" };
                self.notify(Notification::success(
                    format!("Device {verb}"),
                    format!("{name} is now {state}"),
                ));
                Ok(ack)
            }
            Err(e) => Err(self.fail("Failed to toggle device", e)),
        }
    }

    /// Register a device by either strategy, then reload the board.
    pub async fn onboard(
        &self,
        strategy: &OnboardingStrategy,
    ) -> Result<DeviceCreationResult, CoreError> {
        let _busy = self.busy.begin(Action::Onboard);
        match strategy.submit(&self.client).await {
            Ok(result) => {
                info!(device_id = %result.device_id, topic = %result.topic, "device onboarded");
                self.reload_after_mutation().await;
                self.notify(strategy.success_notification());
                Ok(result)
            }
            Err(e) => Err(self.fail(strategy.failure_title(), e)),
        }
    }

    /// Stream live state changes for one device until `cancel` fires.
    pub async fn watch_device(
        &self,
        device_id: &str,
        cancel: CancellationToken,
    ) -> Result<DeviceStateStream, CoreError> {
        match self.client.watch_device_state(device_id, cancel).await {
            Ok(stream) => Ok(stream),
            Err(e) => Err(self.fail("Failed to watch device", e.into())),
        }
    }

    async fn request_toggle(&self, device_id: &str, state: DeviceState) -> Result<Value, CoreError> {
        if state == DeviceState::Unknown {
            return Err(CoreError::validation("state", "state must be ON or OFF"));
        }
        Ok(self.client.toggle_device(device_id, state).await?)
    }

    async fn reload_after_mutation(&self) {
        if let Err(e) = self.refresh_devices().await {
            debug!(error = %e, "reload after mutation failed");
        }
    }

    // ── Notifications ────────────────────────────────────────────────

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }

    /// Report a failed action once and hand the error back.
    fn fail(&self, title: &str, err: CoreError) -> CoreError {
        warn!(action = title, error = %err, "action failed");
        self.notify(Notification::error(title, &err.to_string()));
        err
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("url", &self.config.url.as_str())
            .field("authenticated", &self.is_authenticated())
            .field("devices", &self.board.snapshot().len())
            .finish_non_exhaustive()
    }
}

//! Client-side application state: who is logged in, which channel the views
//! work against, and the last niche and title results.
//!
//! Everything is held in cheaply cloneable containers that are passed to
//! whatever needs them. Reads go through getters and every change goes
//! through one setter, which also mirrors it into [`Storage`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::{
    client::{ApiClient, ApiError},
    models::{Channel, NewChannel, NicheChannel, SelectedChannel, SessionUser},
    storage::{self, Storage, StorageError, KEY_PREFIX},
    transport::Transport,
};

pub const SELECTED_CHANNEL_KEY: &str = "streamline_selected_channel";
pub const NICHE_QUERY_KEY: &str = "streamline_niche_query";
pub const NICHE_RESULTS_KEY: &str = "streamline_niche_results";
pub const TITLE_CHANNEL_KEY: &str = "streamline_title_channel";
pub const TITLE_IDEA_KEY: &str = "streamline_title_idea";
pub const TITLE_RESULTS_KEY: &str = "streamline_title_results";

#[derive(thiserror::Error, Debug)]
pub enum StateError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("channel {0} is not one of your channels")]
    UnknownChannel(String),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct AppState {
    pub session: SessionState,
    pub channels: ChannelState,
    pub results: SavedResults,
    storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            session: SessionState::new(),
            channels: ChannelState::new(storage.clone()),
            results: SavedResults::new(storage.clone()),
            storage,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Ends the session on the backend and forgets everything kept locally.
    /// A failing logout call is logged and otherwise ignored.
    pub async fn logout<T: Transport>(&self, client: &ApiClient<T>) -> Result<(), StateError> {
        if let Err(e) = client.logout().await {
            error!("Logout failed: {}", e);
        }
        self.session.set_user(None);
        self.channels.forget();
        let removed = storage::remove_prefixed(self.storage.as_ref(), KEY_PREFIX)?;
        debug!("Removed {} stored entries on logout", removed);
        Ok(())
    }
}

#[derive(Debug)]
struct Session {
    user: Option<SessionUser>,
    loading: bool,
}

/// The authenticated user, if any. Starts out loading until the first
/// [`check`](SessionState::check) settles.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<RwLock<Session>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Session {
                user: None,
                loading: true,
            })),
        }
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn loading(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .loading
    }

    pub fn set_user(&self, user: Option<SessionUser>) {
        let mut session = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        session.user = user;
        session.loading = false;
    }

    /// Asks `/auth/me` who is logged in. Any failure means nobody is.
    pub async fn check<T: Transport>(&self, client: &ApiClient<T>) -> Option<SessionUser> {
        let user = match client.me().await {
            Ok(user) => Some(user),
            Err(e) => {
                debug!("No active session: {}", e);
                None
            }
        };
        self.set_user(user.clone());
        user
    }
}

#[derive(Debug, Default)]
struct Channels {
    list: Vec<Channel>,
    selected: Option<SelectedChannel>,
}

/// The user's connected channels and the one currently selected.
#[derive(Clone)]
pub struct ChannelState {
    inner: Arc<Mutex<Channels>>,
    storage: Arc<dyn Storage>,
}

impl ChannelState {
    /// Starts with the selection persisted by a previous run. It is only
    /// trusted until the next [`sync`](ChannelState::sync).
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let selected = storage::load(storage.as_ref(), SELECTED_CHANNEL_KEY);
        Self {
            inner: Arc::new(Mutex::new(Channels {
                list: Vec::new(),
                selected,
            })),
            storage,
        }
    }

    pub fn channels(&self) -> Vec<Channel> {
        lock(&self.inner).list.clone()
    }

    pub fn selected(&self) -> Option<SelectedChannel> {
        lock(&self.inner).selected.clone()
    }

    pub fn selected_id(&self) -> Option<String> {
        lock(&self.inner).selected.as_ref().map(|c| c.channel_id.clone())
    }

    /// Fetches the channel list and restores the selection from it.
    pub async fn sync<T: Transport>(
        &self,
        client: &ApiClient<T>,
    ) -> Result<Option<SelectedChannel>, StateError> {
        let list = client.list_channels().await?;
        self.restore(list)
    }

    /// Replaces the channel list. The persisted selection is kept when it is
    /// still listed, otherwise the first channel is selected, or nothing
    /// when the list is empty.
    pub fn restore(&self, list: Vec<Channel>) -> Result<Option<SelectedChannel>, StateError> {
        let saved: Option<SelectedChannel> =
            storage::load(self.storage.as_ref(), SELECTED_CHANNEL_KEY);
        let next = saved
            .and_then(|s| list.iter().find(|c| c.channel_id == s.channel_id))
            .or_else(|| list.first())
            .map(SelectedChannel::from);

        lock(&self.inner).list = list;
        self.set_selected(next.clone())?;
        Ok(next)
    }

    pub fn select(&self, channel_id: &str) -> Result<SelectedChannel, StateError> {
        let channel = lock(&self.inner)
            .list
            .iter()
            .find(|c| c.channel_id == channel_id)
            .map(SelectedChannel::from)
            .ok_or_else(|| StateError::UnknownChannel(channel_id.to_string()))?;
        self.set_selected(Some(channel.clone()))?;
        Ok(channel)
    }

    pub fn clear(&self) -> Result<(), StateError> {
        self.set_selected(None)
    }

    /// Connects a channel and refreshes the list.
    pub async fn add<T: Transport>(
        &self,
        client: &ApiClient<T>,
        channel: &NewChannel,
    ) -> Result<Option<SelectedChannel>, StateError> {
        client.add_channel(channel).await?;
        self.sync(client).await
    }

    /// Disconnects a channel. Removing the selected one moves the selection
    /// to the first remaining channel.
    pub async fn remove<T: Transport>(
        &self,
        client: &ApiClient<T>,
        channel_id: &str,
    ) -> Result<Option<SelectedChannel>, StateError> {
        client.remove_channel(channel_id).await?;

        let (was_selected, first) = {
            let mut channels = lock(&self.inner);
            channels.list.retain(|c| c.channel_id != channel_id);
            let was_selected = channels
                .selected
                .as_ref()
                .is_some_and(|s| s.channel_id == channel_id);
            (was_selected, channels.list.first().map(SelectedChannel::from))
        };

        if was_selected {
            self.set_selected(first)?;
        }
        Ok(self.selected())
    }

    fn forget(&self) {
        let mut channels = lock(&self.inner);
        channels.list.clear();
        channels.selected = None;
    }

    fn set_selected(&self, next: Option<SelectedChannel>) -> Result<(), StateError> {
        let storage = self.storage.as_ref();
        let previous: Option<SelectedChannel> = storage::load(storage, SELECTED_CHANNEL_KEY);

        // memory only follows once storage has accepted the change
        match &next {
            Some(channel) => storage::store(storage, SELECTED_CHANNEL_KEY, channel)?,
            None => storage.remove(SELECTED_CHANNEL_KEY)?,
        }

        let changed =
            previous.map(|p| p.channel_id) != next.as_ref().map(|n| n.channel_id.clone());
        if changed {
            // niche results belong to the channel they were searched from
            storage.remove(NICHE_QUERY_KEY)?;
            storage.remove(NICHE_RESULTS_KEY)?;
        }

        lock(&self.inner).selected = next;
        Ok(())
    }
}

/// Last niche search and title generation, kept so that revisiting a view
/// shows them again.
#[derive(Clone)]
pub struct SavedResults {
    storage: Arc<dyn Storage>,
}

impl SavedResults {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn save_niche(&self, query: &str, results: &[NicheChannel]) -> Result<(), StorageError> {
        let storage = self.storage.as_ref();
        storage.set(NICHE_QUERY_KEY, query)?;
        storage::store(storage, NICHE_RESULTS_KEY, results)
    }

    pub fn niche(&self) -> Option<(String, Vec<NicheChannel>)> {
        let query = self.storage.get(NICHE_QUERY_KEY)?;
        let results = storage::load(self.storage.as_ref(), NICHE_RESULTS_KEY)?;
        Some((query, results))
    }

    pub fn save_titles(
        &self,
        channel_id: &str,
        idea: &str,
        titles: &[String],
    ) -> Result<(), StorageError> {
        let storage = self.storage.as_ref();
        storage.set(TITLE_CHANNEL_KEY, channel_id)?;
        storage.set(TITLE_IDEA_KEY, idea)?;
        storage::store(storage, TITLE_RESULTS_KEY, titles)
    }

    /// The last idea and titles, only if they were generated for `channel_id`.
    pub fn titles_for(&self, channel_id: &str) -> Option<(String, Vec<String>)> {
        if self.storage.get(TITLE_CHANNEL_KEY)? != channel_id {
            return None;
        }
        let idea = self.storage.get(TITLE_IDEA_KEY)?;
        let titles = storage::load(self.storage.as_ref(), TITLE_RESULTS_KEY)?;
        Some((idea, titles))
    }
}

use std::sync::Arc;

use flatmap_shared::{DEFAULT_MARKERS, MapTarget};
use futures::lock::Mutex;
use thiserror::Error;

/// An open map in the viewer.
pub(crate) trait MapSession {
    fn close(&mut self);
    fn add_marker(&mut self, feature_id: &str);
}

/// Factory for map sessions.
pub(crate) trait MapLoader {
    type Session: MapSession;

    async fn load_map(&self, target: &MapTarget) -> Result<Self::Session, String>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum SelectorError {
    #[error("a map is already being opened")]
    SwitchInProgress,
    #[error("failed to open map '{target}': {message}")]
    Load { target: String, message: String },
}

/// Owner of the single active map session.
pub(crate) struct MapSelector<L: MapLoader> {
    loader: L,
    active: Option<L::Session>,
}

impl<L: MapLoader> MapSelector<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            active: None,
        }
    }

    pub fn active_mut(&mut self) -> Option<&mut L::Session> {
        self.active.as_mut()
    }

    pub fn close_active(&mut self) {
        if let Some(mut session) = self.active.take() {
            session.close();
        }
    }

    /// Close the current map, then open `target` and drop the default
    /// markers on it. A failed open leaves no active session.
    pub async fn switch_to(&mut self, target: &MapTarget) -> Result<(), SelectorError> {
        self.close_active();

        let mut session =
            self.loader
                .load_map(target)
                .await
                .map_err(|message| SelectorError::Load {
                    target: target.as_str().to_string(),
                    message,
                })?;

        for feature_id in DEFAULT_MARKERS {
            session.add_marker(feature_id);
        }
        self.active = Some(session);
        Ok(())
    }
}

/// [`MapSelector`] shared between UI callbacks. Only one switch may be in
/// flight; overlapping requests are rejected, not queued.
pub(crate) struct SharedSelector<L: MapLoader> {
    inner: Arc<Mutex<MapSelector<L>>>,
}

impl<L: MapLoader + 'static> SharedSelector<L> {
    pub fn new(loader: L) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MapSelector::new(loader))),
        }
    }

    /// Reserve the selector for a switch to `target`. The reservation is
    /// taken before this returns, so a second call fails with
    /// `SwitchInProgress` until the returned future completes.
    /// `on_switched` runs only once the new map is open.
    pub fn begin_switch<F>(
        &self,
        target: MapTarget,
        on_switched: F,
    ) -> Result<impl Future<Output = Result<(), SelectorError>> + use<L, F>, SelectorError>
    where
        F: FnOnce(&MapTarget) + 'static,
    {
        let Some(mut selector) = self.inner.try_lock_owned() else {
            return Err(SelectorError::SwitchInProgress);
        };
        Ok(async move {
            selector.switch_to(&target).await?;
            on_switched(&target);
            Ok(())
        })
    }

    /// Run `f` against the active session. `None` while no map is open or a
    /// switch is in flight.
    pub fn with_active<R>(&self, f: impl FnOnce(&mut L::Session) -> R) -> Option<R> {
        let mut selector = self.inner.try_lock()?;
        selector.active_mut().map(f)
    }
}

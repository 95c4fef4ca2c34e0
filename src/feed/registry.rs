use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{FeedPage, VideoId, VideoRecord};
use crate::player::{AdaptiveEngineFactory, ItemController, ItemHandle, MediaElement};
use crate::utils::ControllerError;

/// Supplies the media element an item renders into when it is mounted
pub trait ElementProvider: Send + Sync {
    fn create_element(&self, id: VideoId) -> Arc<dyn MediaElement>;
}

struct FeedEntry {
    record: VideoRecord,
    handle: Option<ItemHandle>,
}

/// Ordered list of feed records and the only owner of the active id.
///
/// Items near the active one are mounted (each with its own controller);
/// items outside the mount window are shut down, which releases their
/// transport. At most one item is ever active.
pub struct FeedRegistry {
    config: Config,
    elements: Arc<dyn ElementProvider>,
    engines: Arc<dyn AdaptiveEngineFactory>,
    entries: Vec<FeedEntry>,
    index_by_id: HashMap<VideoId, usize>,
    active: Option<VideoId>,
}

impl FeedRegistry {
    pub fn new(
        config: Config,
        elements: Arc<dyn ElementProvider>,
        engines: Arc<dyn AdaptiveEngineFactory>,
    ) -> Self {
        Self {
            config,
            elements,
            engines,
            entries: Vec::new(),
            index_by_id: HashMap::new(),
            active: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &VideoRecord> {
        self.entries.iter().map(|entry| &entry.record)
    }

    pub fn active_id(&self) -> Option<VideoId> {
        self.active
    }

    pub fn active_index(&self) -> Option<usize> {
        self.active
            .and_then(|id| self.index_by_id.get(&id).copied())
    }

    pub fn item(&self, index: usize) -> Option<&ItemHandle> {
        self.entries.get(index).and_then(|entry| entry.handle.as_ref())
    }

    pub fn item_for(&self, id: VideoId) -> Option<&ItemHandle> {
        self.index_by_id
            .get(&id)
            .and_then(|&index| self.item(index))
    }

    pub fn is_mounted(&self, index: usize) -> bool {
        self.item(index).is_some()
    }

    /// Append the records of `page` that are not in the feed yet, keeping their order.
    ///
    /// Returns the number of records added.
    pub async fn append_page(&mut self, page: FeedPage) -> Result<usize, ControllerError> {
        let before = self.entries.len();

        for record in page.data {
            if self.index_by_id.contains_key(&record.id) {
                debug!("Skipping duplicate video {}", record.id);
                continue;
            }
            self.index_by_id.insert(record.id, self.entries.len());
            self.entries.push(FeedEntry {
                record,
                handle: None,
            });
        }

        let added = self.entries.len() - before;
        info!("Appended {} videos to the feed ({} total)", added, self.entries.len());

        if self.active.is_none() && !self.entries.is_empty() {
            self.activate(0).await?;
        } else {
            self.sync_mounts().await;
        }
        Ok(added)
    }

    /// Index of the item filling the viewport for a scroll offset
    pub fn index_for_scroll(&self, scroll_top: f64, viewport_height: f64) -> Option<usize> {
        if self.entries.is_empty() || !(viewport_height > 0.0) || !scroll_top.is_finite() {
            return None;
        }
        let index = (scroll_top / viewport_height).round().max(0.0) as usize;
        Some(index.min(self.entries.len() - 1))
    }

    /// Re-target the active item after a scroll; returns whether it changed
    pub async fn on_scroll(
        &mut self,
        scroll_top: f64,
        viewport_height: f64,
    ) -> Result<bool, ControllerError> {
        let Some(index) = self.index_for_scroll(scroll_top, viewport_height) else {
            return Ok(false);
        };
        if self.active_index() == Some(index) {
            return Ok(false);
        }
        self.activate(index).await?;
        Ok(true)
    }

    /// Make the item at `index` the active one.
    ///
    /// The previous item is deactivated before the new one is activated.
    pub async fn activate(&mut self, index: usize) -> Result<(), ControllerError> {
        let Some(entry) = self.entries.get(index) else {
            warn!("Cannot activate index {} of {}", index, self.entries.len());
            return Ok(());
        };
        let id = entry.record.id;
        if self.active == Some(id) {
            return Ok(());
        }

        if let Some(previous) = self.active.and_then(|previous| self.item_for(previous))
            && let Err(e) = previous.set_active(false).await
        {
            warn!("Failed to deactivate previous video: {}", e);
        }

        info!("Activating video {} at index {}", id, index);
        self.active = Some(id);
        self.sync_mounts().await;

        match self.item(index) {
            Some(handle) => handle.set_active(true).await,
            None => Err(ControllerError::Disconnected),
        }
    }

    /// Whether the active item is close enough to the end to fetch another page
    pub fn should_load_more(&self) -> bool {
        match self.active_index() {
            Some(index) => self.entries.len() - 1 - index <= self.config.feed.prefetch_threshold,
            None => true,
        }
    }

    /// Shut down every mounted item
    pub async fn shutdown(&mut self) {
        let handles: Vec<ItemHandle> = self
            .entries
            .iter_mut()
            .filter_map(|entry| entry.handle.take())
            .collect();
        debug!("Shutting down {} mounted videos", handles.len());

        for result in join_all(handles.iter().map(|handle| handle.shutdown())).await {
            if let Err(e) = result {
                warn!("Failed to shut down video: {}", e);
            }
        }
        self.active = None;
    }

    fn in_window(&self, index: usize) -> bool {
        self.active_index()
            .is_some_and(|active| index.abs_diff(active) <= self.config.feed.mount_window)
    }

    /// Mount items inside the window around the active one and unmount the rest
    async fn sync_mounts(&mut self) {
        let mut released = Vec::new();

        for index in 0..self.entries.len() {
            let keep = self.in_window(index);
            let entry = &mut self.entries[index];

            match (keep, entry.handle.is_some()) {
                (true, false) => {
                    debug!("Mounting video {}", entry.record.id);
                    let element = self.elements.create_element(entry.record.id);
                    entry.handle = Some(ItemController::spawn(
                        entry.record.clone(),
                        element,
                        self.engines.clone(),
                        &self.config,
                    ));
                }
                (false, true) => {
                    debug!("Unmounting video {}", entry.record.id);
                    released.extend(entry.handle.take());
                }
                _ => {}
            }
        }

        for result in join_all(released.iter().map(|handle| handle.shutdown())).await {
            if let Err(e) = result {
                warn!("Failed to release unmounted video: {}", e);
            }
        }
    }
}

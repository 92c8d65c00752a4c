// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded cache of decoded room images, keyed by path.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use image::RgbaImage;
use tracing::debug;
use wallframe_core::error::Result;
use wallframe_render::ImageProcessor;

pub const DEFAULT_ROOM_CACHE_CAPACITY: usize = 16;

/// First-in first-out eviction once `capacity` rooms are held.
#[derive(Debug)]
pub struct RoomCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    rooms: HashMap<PathBuf, Arc<RgbaImage>>,
    order: VecDeque<PathBuf>,
}

impl Default for RoomCache {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_CACHE_CAPACITY)
    }
}

impl RoomCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Return the cached room or decode it. Decoding happens outside the
    /// lock, so two workers may race to load the same room; the first
    /// insert wins.
    pub fn get_or_load(&self, path: &Path) -> Result<Arc<RgbaImage>> {
        if let Some(room) = self.lock().rooms.get(path) {
            return Ok(Arc::clone(room));
        }

        let decoded = Arc::new(ImageProcessor::open(path)?.into_rgba());
        let mut inner = self.lock();
        if let Some(existing) = inner.rooms.get(path) {
            return Ok(Arc::clone(existing));
        }
        while inner.order.len() >= self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.rooms.remove(&evicted);
                debug!(path = %evicted.display(), "room evicted from cache");
            }
        }
        inner.order.push_back(path.to_path_buf());
        inner.rooms.insert(path.to_path_buf(), Arc::clone(&decoded));
        debug!(path = %path.display(), cached = inner.order.len(), "room cached");
        Ok(decoded)
    }

    pub fn len(&self) -> usize {
        self.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Server state and configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::printer::PrinterConfig;
use crate::render::Bitmap;
use crate::render::normalize::NormalizeOptions;
use crate::sink::SinkConfig;
use crate::topics::TopicSource;

/// Seconds a rendered banner stays available after its last access.
pub const BANNER_TTL_SECS: u64 = 600;

/// Maximum number of cached banners.
pub const BANNER_CAPACITY: usize = 64;

/// Interval of the background cache sweep.
pub const SWEEP_INTERVAL_SECS: u64 = 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8000")
    pub listen_addr: String,
    /// Printer opened for every job
    pub sink: SinkConfig,
    pub printer: PrinterConfig,
    pub normalize: NormalizeOptions,
    /// Times each job is printed
    pub copies: u32,
    pub banner_ttl: Duration,
    pub banner_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let printer = PrinterConfig::default();
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            sink: SinkConfig::Dummy { output: None },
            printer,
            normalize: NormalizeOptions::for_printer(&printer),
            copies: 1,
            banner_ttl: Duration::from_secs(BANNER_TTL_SECS),
            banner_capacity: BANNER_CAPACITY,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub topics: Arc<dyn TopicSource>,
    pub banners: RwLock<BannerCache>,
}

impl AppState {
    pub fn new(config: ServerConfig, topics: Arc<dyn TopicSource>) -> Self {
        let banners = BannerCache::new(config.banner_ttl, config.banner_capacity);
        Self {
            config,
            topics,
            banners: RwLock::new(banners),
        }
    }
}

/// A rendered banner.
#[derive(Debug, Clone)]
pub struct Banner {
    pub text: String,
    pub bitmap: Arc<Bitmap>,
}

struct BannerEntry {
    banner: Banner,
    last_accessed: Instant,
}

/// Rendered banners keyed by token, with idle expiry and a size cap.
///
/// Methods taking `now` exist so expiry can be tested without sleeping.
pub struct BannerCache {
    entries: HashMap<Uuid, BannerEntry>,
    ttl: Duration,
    capacity: usize,
}

impl BannerCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, banner: Banner) -> Uuid {
        self.insert_at(banner, Instant::now())
    }

    /// Store a banner, evicting expired entries and then the least recently
    /// used one if the cache is full.
    pub fn insert_at(&mut self, banner: Banner, now: Instant) -> Uuid {
        self.sweep_at(now);
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(id, _)| *id)
            else {
                break;
            };
            self.entries.remove(&oldest);
        }

        let id = Uuid::new_v4();
        self.entries.insert(
            id,
            BannerEntry {
                banner,
                last_accessed: now,
            },
        );
        id
    }

    pub fn get(&mut self, id: &Uuid) -> Option<Banner> {
        self.get_at(id, Instant::now())
    }

    /// Look up a banner and refresh its access time. Expired entries are
    /// removed and reported as missing.
    pub fn get_at(&mut self, id: &Uuid, now: Instant) -> Option<Banner> {
        let expired = now.duration_since(self.entries.get(id)?.last_accessed) >= self.ttl;
        if expired {
            self.entries.remove(id);
            return None;
        }

        let entry = self.entries.get_mut(id)?;
        entry.last_accessed = now;
        Some(entry.banner.clone())
    }

    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    /// Drop expired entries, returning how many were removed.
    pub fn sweep_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.duration_since(entry.last_accessed) < ttl);
        before - self.entries.len()
    }
}

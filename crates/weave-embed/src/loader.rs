//! Protocol-aware content loading through the cache.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use weave_cache::{CacheEntry, CacheKey, ContentCache};
use weave_config::Settings;
use weave_storage::{FileSystem, Transport};

use crate::resolver::{ResolvedLocation, Scheme};

/// Document served in place of remote content while network access is off.
pub const NETWORK_DISABLED_PLACEHOLDER: &str = "**Remote content blocked:** weave cannot access the internet \
     because network access is disabled. Enable `allow_network_access` to load it.";

/// Fetches local and remote content, optionally converting HTML to markdown.
///
/// [`load`](Self::load) never fails: missing local files load as empty
/// content, remote content behind the network switch loads as
/// [`NETWORK_DISABLED_PLACEHOLDER`], and every other failure is logged and
/// reported as `None` (abandoned).
pub struct ContentLoader {
    fs: Arc<dyn FileSystem>,
    transport: Arc<dyn Transport>,
    cache: Arc<dyn ContentCache>,
    settings: Arc<Settings>,
}

impl ContentLoader {
    /// Create a loader over the given adapters, cache and settings.
    #[must_use]
    pub fn new(
        fs: Arc<dyn FileSystem>,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn ContentCache>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            fs,
            transport,
            cache,
            settings,
        }
    }

    /// The cache this loader reads through.
    #[must_use]
    pub fn cache(&self) -> &dyn ContentCache {
        self.cache.as_ref()
    }

    /// Load the content at `location`.
    ///
    /// With `convert` set, fetched HTML is turned into markdown before it is
    /// cached and returned. Converted and raw content are cached separately.
    pub async fn load(&self, location: &ResolvedLocation, convert: bool) -> Option<String> {
        let settings = self.settings.current();
        let key = CacheKey::new(location.to_string(), convert);
        let cacheable = !location.is_local() || settings.cache_local_files;
        let window = Duration::from_millis(settings.cache_refresh_ms);

        if cacheable
            && let Some(entry) = self.cache.get(&key)
            && entry.is_fresh(window, SystemTime::now())
        {
            tracing::debug!(location = %key.location, convert, "Cache hit");
            return Some(entry.content);
        }

        // Captured before any I/O so a clear during the fetch wins.
        let generation = self.cache.generation();

        let fetched = match &location.scheme {
            Scheme::File => self.read_local(location).await?,
            Scheme::Http | Scheme::Https => {
                if !settings.allow_network_access {
                    tracing::debug!(location = %key.location, "Network access disabled");
                    return Some(NETWORK_DISABLED_PLACEHOLDER.to_owned());
                }
                self.fetch_remote(&key.location).await?
            }
            Scheme::Other(scheme) => {
                tracing::warn!(location = %key.location, scheme, "Unsupported scheme for loading");
                return None;
            }
        };

        let content = if convert {
            html2md::parse_html(&fetched)
        } else {
            fetched
        };

        if cacheable {
            tracing::debug!(location = %key.location, convert, "Cache store");
            self.cache
                .put(&key, CacheEntry::now(content.clone()), generation);
        }
        Some(content)
    }

    async fn read_local(&self, location: &ResolvedLocation) -> Option<String> {
        let Some(path) = location.store_path(self.fs.base_path()) else {
            tracing::warn!(%location, "Local reference outside the store, loading as empty");
            return Some(String::new());
        };

        if !self.fs.exists(&path).await {
            tracing::debug!(path, "Missing local file, loading as empty");
            return Some(String::new());
        }

        match self.fs.read(&path).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if e.is_not_found() => Some(String::new()),
            Err(e) => {
                tracing::error!(path, error = %e, "Failed to read local file");
                None
            }
        }
    }

    async fn fetch_remote(&self, url: &str) -> Option<String> {
        match self.transport.request(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                tracing::error!(url, error = %e, "Failed to fetch remote content");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use weave_cache::{MemoryCache, NullCache};
    use weave_config::RenderSettings;
    use weave_storage::{MockStorage, MockTransport};

    use super::*;

    const PAGE: &str = "https://example.com/page.html";

    struct Fixture {
        fs: Arc<MockStorage>,
        transport: Arc<MockTransport>,
        cache: Arc<MemoryCache>,
        loader: ContentLoader,
    }

    fn fixture(settings: RenderSettings) -> Fixture {
        let fs = Arc::new(
            MockStorage::new("/vault")
                .with_file("notes.md", "Hello World")
                .with_file("page.html", "<h1>Local</h1>")
                .with_unreadable("locked.md"),
        );
        let transport = Arc::new(
            MockTransport::new()
                .with_response(PAGE, "<h1>Title</h1><p>Body</p>")
                .with_status("https://example.com/down", 500),
        );
        let cache = Arc::new(MemoryCache::new());
        let loader = ContentLoader::new(
            Arc::clone(&fs) as Arc<dyn FileSystem>,
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&cache) as Arc<dyn ContentCache>,
            Arc::new(Settings::in_memory(settings)),
        );
        Fixture {
            fs,
            transport,
            cache,
            loader,
        }
    }

    fn online() -> RenderSettings {
        RenderSettings {
            allow_network_access: true,
            ..RenderSettings::default()
        }
    }

    fn remote(url: &str) -> ResolvedLocation {
        ResolvedLocation::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_local_read() {
        let f = fixture(RenderSettings::default());
        let content = f
            .loader
            .load(&ResolvedLocation::file("/vault/notes.md"), false)
            .await;
        assert_eq!(content.as_deref(), Some("Hello World"));
    }

    #[tokio::test]
    async fn test_missing_local_file_is_empty() {
        let f = fixture(RenderSettings::default());
        let content = f
            .loader
            .load(&ResolvedLocation::file("/vault/nope.md"), false)
            .await;
        assert_eq!(content.as_deref(), Some(""));
        assert_eq!(f.fs.read_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_local_file_is_abandoned() {
        let f = fixture(RenderSettings::default());
        let content = f
            .loader
            .load(&ResolvedLocation::file("/vault/locked.md"), false)
            .await;
        assert_eq!(content, None);
    }

    #[tokio::test]
    async fn test_local_files_not_cached_by_default() {
        let f = fixture(RenderSettings::default());
        let location = ResolvedLocation::file("/vault/notes.md");

        f.loader.load(&location, false).await;
        f.loader.load(&location, false).await;

        assert_eq!(f.fs.read_count(), 2);
        assert!(f.cache.is_empty());
    }

    #[tokio::test]
    async fn test_local_files_cached_when_enabled() {
        let f = fixture(RenderSettings {
            cache_local_files: true,
            ..RenderSettings::default()
        });
        let location = ResolvedLocation::file("/vault/notes.md");

        let first = f.loader.load(&location, false).await;
        f.fs.set_file("notes.md", "Changed");
        let second = f.loader.load(&location, false).await;

        assert_eq!(f.fs.read_count(), 1);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_network_disabled_placeholder() {
        let f = fixture(RenderSettings::default());

        let content = f.loader.load(&remote(PAGE), true).await.unwrap();

        assert!(content.contains("cannot access the internet"));
        assert_eq!(f.transport.request_count(), 0);
        assert!(f.cache.is_empty());
    }

    #[tokio::test]
    async fn test_remote_fetch_converts_and_caches() {
        let f = fixture(online());

        let first = f.loader.load(&remote(PAGE), true).await.unwrap();
        let second = f.loader.load(&remote(PAGE), true).await.unwrap();

        assert!(first.contains("Title"));
        assert!(!first.contains("<h1>"));
        assert_eq!(first, second);
        assert_eq!(f.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_converted_and_raw_are_cached_separately() {
        let f = fixture(online());

        let converted = f.loader.load(&remote(PAGE), true).await.unwrap();
        let raw = f.loader.load(&remote(PAGE), false).await.unwrap();

        assert_eq!(raw, "<h1>Title</h1><p>Body</p>");
        assert_ne!(converted, raw);
        assert_eq!(f.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let f = fixture(RenderSettings {
            cache_refresh_ms: 0,
            ..online()
        });

        f.loader.load(&remote(PAGE), false).await;
        f.loader.load(&remote(PAGE), false).await;

        assert_eq!(f.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_clear_forces_fresh_fetch() {
        let f = fixture(online());

        f.loader.load(&remote(PAGE), false).await;
        f.cache.clear();
        f.loader.load(&remote(PAGE), false).await;

        assert_eq!(f.transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_failure_is_abandoned() {
        let f = fixture(online());

        let content = f.loader.load(&remote("https://example.com/down"), false).await;

        assert_eq!(content, None);
        assert!(f.cache.is_empty());
    }

    #[tokio::test]
    async fn test_other_scheme_is_abandoned() {
        let f = fixture(online());
        assert_eq!(f.loader.load(&remote("ftp://host/x"), false).await, None);
    }

    #[tokio::test]
    async fn test_null_cache_always_fetches() {
        let transport = Arc::new(MockTransport::new().with_response(PAGE, "x"));
        let loader = ContentLoader::new(
            Arc::new(MockStorage::new("/vault")),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(NullCache),
            Arc::new(Settings::in_memory(online())),
        );

        loader.load(&remote(PAGE), false).await;
        loader.load(&remote(PAGE), false).await;

        assert_eq!(transport.request_count(), 2);
    }
}

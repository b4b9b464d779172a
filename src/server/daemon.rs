//! Index server
//!
//! Keeps one engine loaded in memory and serves requests over TCP. Searches
//! run against a snapshot `Arc` of the current engine without holding any
//! lock; a reload builds the replacement off to the side and swaps it in.

use crate::index::{Engine, IndexConfig, load_engine};
use crate::query::{SearchError, run_perf};
use crate::server::protocol::{
    Request, Response, SearchResponse, StatusResponse, is_frame_too_large, read_message,
    write_message,
};
use ahash::RandomState;
use anyhow::{Context, Result};
use lru::LruCache;
use roaring::RoaringBitmap;
use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Connection timeout
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Cached search outcome: ids of the matching lines, `None` when the phrase
/// was not found. Lines are resolved against the engine on every answer.
type CachedResult = Option<Arc<RoaringBitmap>>;

/// Settings for an [`IndexServer`]
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Used when rebuilding on reload
    pub index: IndexConfig,
    pub cache_size: usize,
    pub progress_every: usize,
    /// Most threads a remote `Perf` request may start
    pub max_perf_threads: usize,
    /// Most searches per thread a remote `Perf` request may run
    pub max_perf_searches: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let cores = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        Self {
            index: IndexConfig::default(),
            cache_size: 128,
            progress_every: 100,
            max_perf_threads: cores * 4,
            max_perf_searches: 1_000_000,
        }
    }
}

/// An engine together with the cache of results computed against it
struct LoadedEngine {
    engine: Arc<Engine>,
    source: Option<PathBuf>,
    query_cache: Option<Mutex<LruCache<String, CachedResult, RandomState>>>,
}

impl LoadedEngine {
    fn new(engine: Engine, source: Option<PathBuf>, cache_size: usize) -> Self {
        Self {
            engine: Arc::new(engine),
            source,
            query_cache: NonZeroUsize::new(cache_size)
                .map(|cap| Mutex::new(LruCache::with_hasher(cap, RandomState::new()))),
        }
    }

    fn cached(&self, phrase: &str) -> Option<CachedResult> {
        let cache = self.query_cache.as_ref()?;
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(phrase).cloned()
    }

    fn remember(&self, phrase: &str, result: CachedResult) {
        if let Some(cache) = &self.query_cache {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.put(phrase.to_string(), result);
        }
    }
}

/// Statistics for the server
struct ServerStats {
    start_time: Instant,
    queries_served: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    reloads: AtomicU64,
}

impl ServerStats {
    fn new() -> Self {
        Self {
            start_time: Instant::now(),
            queries_served: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
        }
    }

    fn cache_hit_rate(&self) -> f32 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}

/// The index server
pub struct IndexServer {
    current: RwLock<Arc<LoadedEngine>>,
    config: ServerConfig,
    stats: ServerStats,
    shutdown: AtomicBool,
    local_addr: OnceLock<SocketAddr>,
}

impl IndexServer {
    /// Create a server over an already built engine
    pub fn new(engine: Engine, source: Option<PathBuf>, config: ServerConfig) -> Arc<Self> {
        let loaded = LoadedEngine::new(engine, source, config.cache_size);
        Arc::new(Self {
            current: RwLock::new(Arc::new(loaded)),
            config,
            stats: ServerStats::new(),
            shutdown: AtomicBool::new(false),
            local_addr: OnceLock::new(),
        })
    }

    /// Engine currently answering queries
    pub fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.snapshot().engine)
    }

    fn snapshot(&self) -> Arc<LoadedEngine> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }

    /// Bind to `addr` and serve until shutdown (blocking)
    pub fn run(self: &Arc<Self>, addr: impl ToSocketAddrs) -> Result<()> {
        let listener = TcpListener::bind(addr).context("Failed to bind server socket")?;
        self.serve(listener)
    }

    /// Serve connections from an already bound listener until shutdown (blocking)
    pub fn serve(self: &Arc<Self>, listener: TcpListener) -> Result<()> {
        let addr = listener.local_addr()?;
        let _ = self.local_addr.set(addr);
        info!("Listening on {}", addr);

        for stream in listener.incoming() {
            if self.shutdown.load(Ordering::Relaxed) {
                break;
            }

            match stream {
                Ok(stream) => {
                    let _ = stream.set_read_timeout(Some(CONNECTION_TIMEOUT));
                    let _ = stream.set_write_timeout(Some(CONNECTION_TIMEOUT));

                    let server = Arc::clone(self);
                    thread::spawn(move || {
                        if let Err(e) = server.handle_connection(stream) {
                            warn!("Connection error: {:#}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }

        info!("Server stopped");
        Ok(())
    }

    /// Handle a single client connection
    fn handle_connection(&self, stream: TcpStream) -> Result<()> {
        let peer = stream.peer_addr().ok();
        let mut reader = BufReader::new(stream.try_clone()?);
        let mut writer = BufWriter::new(stream);

        loop {
            let request: Request = match read_message(&mut reader) {
                Ok(req) => req,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    // Client disconnected
                    break;
                }
                Err(e) if is_frame_too_large(&e) => {
                    // The body was never read, so nothing after it can be framed
                    warn!(?peer, "Closing connection: {}", e);
                    let resp = Response::Error {
                        message: format!("Invalid request: {}", e),
                    };
                    write_message(&mut writer, &resp)?;
                    break;
                }
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    let resp = Response::Error {
                        message: format!("Invalid request: {}", e),
                    };
                    write_message(&mut writer, &resp)?;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            debug!(?peer, ?request, "Request");
            let response = self.handle_request(request);
            write_message(&mut writer, &response)?;

            if matches!(response, Response::ShuttingDown) {
                self.wake_listener();
                break;
            }
        }

        Ok(())
    }

    /// Unblock the accept loop so it can observe the shutdown flag
    fn wake_listener(&self) {
        if let Some(addr) = self.local_addr.get() {
            let _ = TcpStream::connect_timeout(addr, Duration::from_secs(1));
        }
    }

    /// Handle a single request
    pub fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::Search { phrase } => self.handle_search(&phrase),

            Request::GetLine { line } => self.handle_get_line(line),

            Request::Status => self.handle_status(),

            Request::Reload { path } => self.handle_reload(path),

            Request::Perf {
                phrase,
                threads,
                searches,
            } => self.handle_perf(&phrase, threads, searches),

            Request::Shutdown => {
                self.shutdown.store(true, Ordering::Relaxed);
                Response::ShuttingDown
            }

            Request::Ping => Response::Pong,
        }
    }

    fn handle_search(&self, phrase: &str) -> Response {
        let start = Instant::now();
        let loaded = self.snapshot();
        self.stats.queries_served.fetch_add(1, Ordering::Relaxed);

        let (result, cached) = match loaded.cached(phrase) {
            Some(hit) => {
                self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
                (hit, true)
            }
            None => {
                self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
                let result = loaded
                    .engine
                    .search(phrase)
                    .ok()
                    .map(|m| Arc::new(m.bitmap().clone()));
                loaded.remember(phrase, result.clone());
                (result, false)
            }
        };

        match result {
            Some(ids) => Response::Search(SearchResponse {
                count: ids.len(),
                lines: ids
                    .iter()
                    .filter_map(|id| loaded.engine.line(id).map(str::to_string))
                    .collect(),
                duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                cached,
            }),
            None => Response::NotFound {
                message: SearchError::NotFound {
                    phrase: phrase.to_string(),
                }
                .to_string(),
            },
        }
    }

    fn handle_get_line(&self, line: u32) -> Response {
        let engine = self.engine();
        match engine.line(line) {
            Some(text) => Response::Line {
                line,
                text: text.to_string(),
            },
            None => Response::NotFound {
                message: format!(
                    "Can't find line {}. Read only {} lines.",
                    line,
                    engine.corpus().len()
                ),
            },
        }
    }

    fn handle_status(&self) -> Response {
        let loaded = self.snapshot();
        let stats = loaded.engine.stats();

        Response::Status(StatusResponse {
            uptime_secs: self.stats.start_time.elapsed().as_secs(),
            source: loaded.source.clone(),
            lines: stats.lines,
            trie_nodes: stats.nodes,
            max_phrase_len: loaded.engine.config().max_phrase_len.map(NonZeroUsize::get),
            queries_served: self.stats.queries_served.load(Ordering::Relaxed),
            cache_hit_rate: self.stats.cache_hit_rate(),
            reloads: self.stats.reloads.load(Ordering::Relaxed),
        })
    }

    fn handle_reload(&self, path: Option<PathBuf>) -> Response {
        let source = match path.or_else(|| self.snapshot().source.clone()) {
            Some(p) => p,
            None => {
                return Response::Reloaded {
                    success: false,
                    message: "No corpus file to reload from".to_string(),
                };
            }
        };

        info!("Reloading index from '{}'", source.display());
        // Built without any lock held; readers keep using the old engine
        let engine = match load_engine(
            &source,
            self.config.index.clone(),
            self.config.progress_every,
            true,
        ) {
            Ok(engine) => engine,
            Err(e) => {
                warn!("Reload failed: {:#}", e);
                return Response::Reloaded {
                    success: false,
                    message: format!("{:#}", e),
                };
            }
        };

        let lines = engine.corpus().len();
        let loaded = Arc::new(LoadedEngine::new(
            engine,
            Some(source.clone()),
            self.config.cache_size,
        ));
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = loaded;
        self.stats.reloads.fetch_add(1, Ordering::Relaxed);

        Response::Reloaded {
            success: true,
            message: format!("Indexed {} lines from '{}'", lines, source.display()),
        }
    }

    fn handle_perf(&self, phrase: &str, threads: usize, searches: usize) -> Response {
        if threads > self.config.max_perf_threads || searches > self.config.max_perf_searches {
            return Response::Error {
                message: format!(
                    "Perf run too large: {} threads x {} searches (limit {} x {})",
                    threads, searches, self.config.max_perf_threads, self.config.max_perf_searches
                ),
            };
        }

        let engine = self.engine();
        match run_perf(&engine, phrase, threads, searches) {
            Ok(report) => {
                info!(
                    "Perf: {} searches of '{}' in {:.0}ms ({}/s)",
                    report.total_searches, phrase, report.elapsed_ms, report.searches_per_sec
                );
                Response::Perf(report)
            }
            Err(e) => Response::NotFound {
                message: e.to_string(),
            },
        }
    }
}

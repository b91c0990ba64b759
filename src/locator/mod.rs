//! Encoder acquisition.
//!
//! [`EncoderLocator`] hands out the encoder matching the detected [`Environment`]:
//!
//! - in [`Environment::Server`] the host-provided [`BufferEncoder`] is returned as is;
//! - in [`Environment::Browser`] the encoder is the page global defined by the
//!   loader script. If the global is missing, the locator reuses an encoder
//!   `<script>` already in the document or injects one, then waits for it.
//!
//! Concurrent browser requests share a single load attempt. The attempt lives in
//! the locator as a [`Shared`] future, so every caller awaits the same outcome and
//! only one `<script>` is injected. A successful load is cached for the life of
//! the locator; a failed one is dropped so the next request starts over.

pub mod browser;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::{LoaderConfig, QrConfig};
use crate::encoder::{BufferEncoder, DataUrlEncoder};
use crate::environment::{Environment, HostProbe};
use crate::error::{DependencyLoadError, EnvironmentError, QrError};
use crate::render::PngQrEncoder;
use browser::{BrowserHost, CrossOrigin};

type LoadOutcome = Result<Arc<dyn DataUrlEncoder>, DependencyLoadError>;
type PendingLoad = Shared<BoxFuture<'static, LoadOutcome>>;

/// Observable lifecycle of the browser encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderState {
    /// Nothing loaded and no load in flight.
    Absent,
    /// A script load is in flight.
    Loading,
    /// The encoder is cached.
    Ready,
}

enum Slot {
    Absent,
    Loading(PendingLoad),
    Ready(Arc<dyn DataUrlEncoder>),
}

impl Slot {
    fn state(&self) -> EncoderState {
        match self {
            Slot::Absent => EncoderState::Absent,
            Slot::Loading(_) => EncoderState::Loading,
            Slot::Ready(_) => EncoderState::Ready,
        }
    }

    /// Collapses a `Loading` slot whose attempt has already finished.
    ///
    /// A finished attempt can outlive its waiters: if they were dropped, or have
    /// not been scheduled yet, nobody has moved the slot on. The pending load is
    /// polled once without waiting so that a script error fired in the meantime
    /// is observed here.
    fn refresh(&mut self) {
        let Slot::Loading(pending) = self else {
            return;
        };
        let outcome = match pending.peek() {
            Some(outcome) => Some(outcome.clone()),
            None => pending.clone().now_or_never(),
        };
        match outcome {
            Some(Ok(encoder)) => *self = Slot::Ready(encoder),
            Some(Err(error)) => {
                tracing::debug!(%error, "discarding failed QR encoder load");
                *self = Slot::Absent;
            }
            None => {}
        }
    }
}

/// Provides the encoder for the environment the crate runs in.
pub struct EncoderLocator {
    environment: Environment,
    server: Arc<dyn BufferEncoder>,
    browser: Option<Arc<dyn BrowserHost>>,
    loader: LoaderConfig,
    slot: Mutex<Slot>,
}

impl EncoderLocator {
    /// Creates a locator for an already detected environment.
    ///
    /// The server encoder defaults to [`PngQrEncoder`] with `config.render`. A
    /// browser locator needs a page, see [`EncoderLocator::with_browser_host`].
    pub fn new(environment: Environment, config: &QrConfig) -> Self {
        Self {
            environment,
            server: Arc::new(PngQrEncoder::new(config.render)),
            browser: None,
            loader: config.loader.clone(),
            slot: Mutex::new(Slot::Absent),
        }
    }

    /// Detects the environment from `probe` and creates a locator for it.
    pub fn detect<P: HostProbe + ?Sized>(probe: &P, config: &QrConfig) -> Self {
        Self::new(Environment::detect(probe), config)
    }

    /// Replaces the server encoder.
    pub fn with_server_encoder(mut self, encoder: Arc<dyn BufferEncoder>) -> Self {
        self.server = encoder;
        self
    }

    /// Attaches the page used to obtain the browser encoder.
    pub fn with_browser_host(mut self, host: Arc<dyn BrowserHost>) -> Self {
        self.browser = Some(host);
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The host-provided encoder. Never touches the network.
    pub fn server_encoder(&self) -> Result<Arc<dyn BufferEncoder>, EnvironmentError> {
        if self.environment != Environment::Server {
            return Err(EnvironmentError::WrongEnvironment {
                operation: "server_encoder",
                required: Environment::Server,
                detected: self.environment,
            });
        }
        Ok(Arc::clone(&self.server))
    }

    /// The page encoder, loading its script first when the global is missing.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "payme_qr.locator.browser_encoder", skip_all, err)
    )]
    pub async fn browser_encoder(&self) -> Result<Arc<dyn DataUrlEncoder>, QrError> {
        if self.environment != Environment::Browser {
            return Err(EnvironmentError::WrongEnvironment {
                operation: "browser_encoder",
                required: Environment::Browser,
                detected: self.environment,
            }
            .into());
        }
        let host = self.browser.as_ref().ok_or(EnvironmentError::NoBrowserPage)?;

        let pending = {
            let mut slot = self.lock_slot();
            slot.refresh();
            let in_flight = match &*slot {
                Slot::Ready(encoder) => return Ok(Arc::clone(encoder)),
                Slot::Loading(pending) => Some(pending.clone()),
                Slot::Absent => None,
            };
            match in_flight {
                Some(pending) => {
                    tracing::debug!("joining in-flight QR encoder load");
                    pending
                }
                None => {
                    if let Some(encoder) = host.global_encoder() {
                        *slot = Slot::Ready(Arc::clone(&encoder));
                        return Ok(encoder);
                    }
                    let pending = load_encoder(Arc::clone(host), self.loader.clone())
                        .boxed()
                        .shared();
                    *slot = Slot::Loading(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.clone().await;
        self.settle(&pending, &outcome);
        Ok(outcome?)
    }

    /// Current lifecycle state of the browser encoder.
    pub fn state(&self) -> EncoderState {
        let mut slot = self.lock_slot();
        slot.refresh();
        slot.state()
    }

    /// Forgets the cached encoder or in-flight load.
    pub fn reset(&self) {
        *self.lock_slot() = Slot::Absent;
    }

    /// Moves the slot out of `Loading` once `pending` has resolved, unless the slot
    /// has been reset or taken over by another attempt meanwhile.
    fn settle(&self, pending: &PendingLoad, outcome: &LoadOutcome) {
        let mut slot = self.lock_slot();
        let current = matches!(&*slot, Slot::Loading(active) if active.ptr_eq(pending));
        if !current {
            return;
        }
        *slot = match outcome {
            Ok(encoder) => Slot::Ready(Arc::clone(encoder)),
            Err(_) => Slot::Absent,
        };
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        // The slot is always left in a valid state, so a poisoned lock is still usable.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for EncoderLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderLocator")
            .field("environment", &self.environment)
            .field("browser", &self.browser.is_some())
            .field("loader", &self.loader)
            .field("state", &self.lock_slot().state())
            .finish()
    }
}

async fn load_encoder(host: Arc<dyn BrowserHost>, loader: LoaderConfig) -> LoadOutcome {
    // A tag whose error already fired never fires again, so it cannot be reused.
    let existing = host
        .find_script(&loader.script_marker)
        .filter(|tag| !tag.has_failed());
    let injected = existing.is_none();
    let tag = match existing {
        Some(tag) => {
            tracing::debug!(src = tag.src(), "waiting on existing QR encoder script");
            tag
        }
        None => {
            tracing::info!(src = %loader.url.as_str(), "injecting QR encoder script");
            host.append_script(&loader.url, CrossOrigin::Anonymous)
        }
    };

    let src = tag.src().to_string();
    if let Err(reason) = tag.settled().await {
        tracing::warn!(%src, %reason, "QR encoder script failed to load");
        return Err(if injected {
            DependencyLoadError::Injected { src, reason }
        } else {
            DependencyLoadError::Existing { src, reason }
        });
    }

    host.global_encoder().ok_or_else(|| {
        tracing::warn!(%src, "QR encoder script loaded without defining the encoder");
        DependencyLoadError::MissingGlobal { src }
    })
}

#[cfg(test)]
mod tests {
    use super::browser::{ScriptEvents, ScriptTag};
    use super::*;
    use crate::error::EncoderError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use url::Url;

    struct StubEncoder;

    #[async_trait]
    impl DataUrlEncoder for StubEncoder {
        async fn to_data_url(&self, text: &str) -> Result<String, EncoderError> {
            Ok(format!("data:image/png;base64,{}", text.len()))
        }
    }

    /// In-memory page: records injected scripts and lets the test fire their events.
    #[derive(Default)]
    struct FakePage {
        global: Mutex<Option<Arc<dyn DataUrlEncoder>>>,
        scripts: Mutex<Vec<ScriptTag>>,
        events: Mutex<Vec<ScriptEvents>>,
        injections: AtomicUsize,
        last_cross_origin: Mutex<Option<CrossOrigin>>,
    }

    impl FakePage {
        fn with_script(src: &str) -> (Arc<Self>, ScriptEvents) {
            let page = Arc::new(FakePage::default());
            let (tag, events) = ScriptTag::pending(src);
            page.scripts.lock().unwrap().push(tag);
            (page, events)
        }

        fn define_global(&self) {
            *self.global.lock().unwrap() = Some(Arc::new(StubEncoder));
        }

        fn finish_loading(&self) {
            self.define_global();
            for events in self.events.lock().unwrap().iter() {
                events.load();
            }
        }

        fn fail_loading(&self, reason: &str) {
            for events in self.events.lock().unwrap().drain(..) {
                events.error(reason);
            }
        }

        fn injections(&self) -> usize {
            self.injections.load(Ordering::SeqCst)
        }
    }

    impl BrowserHost for FakePage {
        fn global_encoder(&self) -> Option<Arc<dyn DataUrlEncoder>> {
            self.global.lock().unwrap().clone()
        }

        fn find_script(&self, marker: &str) -> Option<ScriptTag> {
            self.scripts
                .lock()
                .unwrap()
                .iter()
                .find(|tag| tag.src().contains(marker))
                .cloned()
        }

        fn append_script(&self, src: &Url, cross_origin: CrossOrigin) -> ScriptTag {
            self.injections.fetch_add(1, Ordering::SeqCst);
            *self.last_cross_origin.lock().unwrap() = Some(cross_origin);
            let (tag, events) = ScriptTag::pending(src.as_str());
            self.scripts.lock().unwrap().push(tag.clone());
            self.events.lock().unwrap().push(events);
            tag
        }
    }

    fn browser_locator(page: &Arc<FakePage>) -> Arc<EncoderLocator> {
        let locator = EncoderLocator::new(Environment::Browser, &QrConfig::default())
            .with_browser_host(page.clone());
        Arc::new(locator)
    }

    /// Yields to spawned tasks until `condition` holds, failing after a few seconds.
    async fn eventually(mut condition: impl FnMut() -> bool) {
        let wait = async {
            while !condition() {
                tokio::task::yield_now().await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("condition not reached in time");
    }

    async fn wait_for_injections(page: &FakePage, count: usize) {
        eventually(|| page.injections() >= count).await;
    }

    fn spawn_request(locator: &Arc<EncoderLocator>) -> tokio::task::JoinHandle<Result<(), QrError>> {
        let locator = Arc::clone(locator);
        tokio::spawn(async move { locator.browser_encoder().await.map(|_| ()) })
    }

    #[test]
    fn test_server_encoder_requires_server() {
        let server = EncoderLocator::new(Environment::Server, &QrConfig::default());
        assert!(server.server_encoder().is_ok());

        let browser = EncoderLocator::new(Environment::Browser, &QrConfig::default());
        assert_eq!(
            browser.server_encoder().err(),
            Some(EnvironmentError::WrongEnvironment {
                operation: "server_encoder",
                required: Environment::Server,
                detected: Environment::Browser,
            })
        );
    }

    #[tokio::test]
    async fn test_browser_encoder_requires_page() {
        let locator = EncoderLocator::new(Environment::Browser, &QrConfig::default());
        let error = locator.browser_encoder().await.map(|_| ()).unwrap_err();
        assert!(matches!(error, QrError::Environment(EnvironmentError::NoBrowserPage)));

        let server = EncoderLocator::new(Environment::Server, &QrConfig::default());
        assert!(matches!(
            server.browser_encoder().await,
            Err(QrError::Environment(EnvironmentError::WrongEnvironment { .. }))
        ));
    }

    #[tokio::test]
    async fn test_existing_global_skips_injection() {
        let page = Arc::new(FakePage::default());
        page.define_global();
        let locator = browser_locator(&page);

        locator.browser_encoder().await.unwrap();
        assert_eq!(page.injections(), 0);
        assert_eq!(locator.state(), EncoderState::Ready);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_injection() {
        let page = Arc::new(FakePage::default());
        let locator = browser_locator(&page);

        let first = tokio::spawn({
            let locator = locator.clone();
            async move { locator.browser_encoder().await.map(|_| ()) }
        });
        wait_for_injections(&page, 1).await;
        assert_eq!(locator.state(), EncoderState::Loading);

        let second = tokio::spawn({
            let locator = locator.clone();
            async move { locator.browser_encoder().await.map(|_| ()) }
        });
        tokio::task::yield_now().await;
        page.finish_loading();

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(page.injections(), 1);
        assert_eq!(locator.state(), EncoderState::Ready);
        assert_eq!(
            *page.last_cross_origin.lock().unwrap(),
            Some(CrossOrigin::Anonymous)
        );

        // cached: no further page interaction
        locator.browser_encoder().await.unwrap();
        assert_eq!(page.injections(), 1);
    }

    #[tokio::test]
    async fn test_injected_script_uses_loader_url() {
        let page = Arc::new(FakePage::default());
        let locator = browser_locator(&page);

        let request = tokio::spawn({
            let locator = locator.clone();
            async move { locator.browser_encoder().await.map(|_| ()) }
        });
        wait_for_injections(&page, 1).await;
        let tag = page.find_script("qrcode.min.js").unwrap();
        assert_eq!(
            tag.src(),
            "https://cdnjs.cloudflare.com/ajax/libs/qrcode/1.5.1/qrcode.min.js"
        );
        page.finish_loading();
        request.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let page = Arc::new(FakePage::default());
        let locator = browser_locator(&page);

        let request = tokio::spawn({
            let locator = locator.clone();
            async move { locator.browser_encoder().await.map(|_| ()) }
        });
        wait_for_injections(&page, 1).await;
        page.fail_loading("net::ERR_BLOCKED_BY_CSP");

        let error = request.await.unwrap().unwrap_err();
        match error {
            QrError::DependencyLoad(DependencyLoadError::Injected { reason, .. }) => {
                assert_eq!(reason, "net::ERR_BLOCKED_BY_CSP");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(locator.state(), EncoderState::Absent);

        // the failed tag is skipped and a fresh one is injected
        let retry = tokio::spawn({
            let locator = locator.clone();
            async move { locator.browser_encoder().await.map(|_| ()) }
        });
        wait_for_injections(&page, 2).await;
        page.finish_loading();
        retry.await.unwrap().unwrap();
        assert_eq!(page.injections(), 2);
    }

    #[tokio::test]
    async fn test_existing_script_is_reused() {
        let (page, events) = FakePage::with_script("https://static.example.com/vendor/qrcode.min.js");
        let locator = browser_locator(&page);

        let request = tokio::spawn({
            let locator = locator.clone();
            async move { locator.browser_encoder().await.map(|_| ()) }
        });
        eventually(|| locator.state() == EncoderState::Loading).await;
        page.define_global();
        events.load();

        request.await.unwrap().unwrap();
        assert_eq!(page.injections(), 0);
    }

    #[tokio::test]
    async fn test_existing_script_error() {
        let (page, events) = FakePage::with_script("https://static.example.com/qrcode.min.js");
        let locator = browser_locator(&page);

        let request = tokio::spawn({
            let locator = locator.clone();
            async move { locator.browser_encoder().await.map(|_| ()) }
        });
        eventually(|| locator.state() == EncoderState::Loading).await;
        events.error("404");

        let error = request.await.unwrap().unwrap_err();
        assert!(matches!(
            error,
            QrError::DependencyLoad(DependencyLoadError::Existing { .. })
        ));
        assert_eq!(page.injections(), 0);
    }

    #[tokio::test]
    async fn test_loaded_script_without_global() {
        let (page, events) = FakePage::with_script("qrcode.min.js");
        events.load();
        let locator = browser_locator(&page);

        let error = locator.browser_encoder().await.map(|_| ()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "QRCode library loaded from qrcode.min.js but did not define the global encoder"
        );
        assert_eq!(locator.state(), EncoderState::Absent);
    }

    #[tokio::test]
    async fn test_reset() {
        let page = Arc::new(FakePage::default());
        page.define_global();
        let locator = browser_locator(&page);

        locator.browser_encoder().await.unwrap();
        assert_eq!(locator.state(), EncoderState::Ready);
        locator.reset();
        assert_eq!(locator.state(), EncoderState::Absent);
    }

    #[tokio::test]
    async fn test_abandoned_wait_keeps_load_in_flight() {
        let page = Arc::new(FakePage::default());
        let locator = browser_locator(&page);

        let request = spawn_request(&locator);
        wait_for_injections(&page, 1).await;
        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());
        assert_eq!(locator.state(), EncoderState::Loading);

        page.finish_loading();
        locator.browser_encoder().await.unwrap();
        assert_eq!(page.injections(), 1);
        assert_eq!(locator.state(), EncoderState::Ready);
    }

    #[tokio::test]
    async fn test_failure_without_waiters_is_not_reused() {
        let page = Arc::new(FakePage::default());
        let locator = browser_locator(&page);

        let request = spawn_request(&locator);
        wait_for_injections(&page, 1).await;
        request.abort();
        assert!(request.await.unwrap_err().is_cancelled());

        page.fail_loading("net::ERR_FAILED");
        assert_eq!(locator.state(), EncoderState::Absent);

        let retry = spawn_request(&locator);
        wait_for_injections(&page, 2).await;
        page.finish_loading();
        retry.await.unwrap().unwrap();
        assert_eq!(page.injections(), 2);
        assert_eq!(locator.state(), EncoderState::Ready);
    }

    #[tokio::test]
    async fn test_new_caller_after_failure_starts_over_before_waiters_run() {
        let page = Arc::new(FakePage::default());
        let locator = browser_locator(&page);

        let first = spawn_request(&locator);
        wait_for_injections(&page, 1).await;
        page.fail_loading("net::ERR_FAILED");

        // `first` may not have observed the error yet
        let retry = spawn_request(&locator);
        wait_for_injections(&page, 2).await;
        page.finish_loading();

        assert!(matches!(
            first.await.unwrap(),
            Err(QrError::DependencyLoad(DependencyLoadError::Injected { .. }))
        ));
        retry.await.unwrap().unwrap();
        assert_eq!(page.injections(), 2);
        assert_eq!(locator.state(), EncoderState::Ready);
    }

    #[test]
    fn test_detect() {
        use crate::environment::HostCapabilities;
        let locator = EncoderLocator::detect(&HostCapabilities::native(), &QrConfig::default());
        assert_eq!(locator.environment(), Environment::Server);
    }
}

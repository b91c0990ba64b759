//! Browser page contract.
//!
//! In the browser the QR encoder is not linked into the program: it is a page
//! global defined by a loader script fetched from a CDN. [`BrowserHost`] is the
//! narrow view of the page the locator needs:
//!
//! - read the global encoder, if any
//! - find an encoder `<script>` already present in the document
//! - append a new `<script>` to the document head
//!
//! A `<script>` is represented by a [`ScriptTag`] handle. The page keeps the paired
//! [`ScriptEvents`] and fires `load` or `error` once the fetch completes; every clone
//! of the handle observes the same outcome.

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use url::Url;

use crate::encoder::DataUrlEncoder;

/// The page hosting the browser encoder.
pub trait BrowserHost: Send + Sync {
    /// The encoder global, once the loader script has defined it.
    fn global_encoder(&self) -> Option<Arc<dyn DataUrlEncoder>>;

    /// The first `<script>` whose `src` contains `marker`.
    fn find_script(&self, marker: &str) -> Option<ScriptTag>;

    /// Creates a `<script src=… crossorigin=…>`, appends it to the document head and
    /// starts fetching it.
    fn append_script(&self, src: &Url, cross_origin: CrossOrigin) -> ScriptTag;
}

/// The `crossorigin` attribute of an injected script.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CrossOrigin {
    #[default]
    Anonymous,
    UseCredentials,
}

impl CrossOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrossOrigin::Anonymous => "anonymous",
            CrossOrigin::UseCredentials => "use-credentials",
        }
    }
}

/// Load progress of a `<script>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptState {
    Pending,
    Loaded,
    Failed(String),
}

/// Handle to a `<script>` element.
#[derive(Clone)]
pub struct ScriptTag {
    src: String,
    state: watch::Receiver<ScriptState>,
}

/// Sending half of a [`ScriptTag`], held by the page.
#[derive(Debug)]
pub struct ScriptEvents {
    state: watch::Sender<ScriptState>,
}

impl ScriptTag {
    /// Creates a pending script handle and the events used to settle it.
    pub fn pending(src: impl Into<String>) -> (Self, ScriptEvents) {
        let (tx, rx) = watch::channel(ScriptState::Pending);
        let tag = ScriptTag {
            src: src.into(),
            state: rx,
        };
        (tag, ScriptEvents { state: tx })
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    /// Current state without waiting.
    pub fn state(&self) -> ScriptState {
        self.state.borrow().clone()
    }

    /// Whether the `error` event has already fired.
    pub fn has_failed(&self) -> bool {
        matches!(*self.state.borrow(), ScriptState::Failed(_))
    }

    /// Waits for the `load` or `error` event, returning the failure reason on error.
    ///
    /// Returns immediately when the script has already settled. If the page drops
    /// the events without firing either, the script is reported as failed.
    pub async fn settled(&self) -> Result<(), String> {
        let mut state = self.state.clone();
        let outcome = match state.wait_for(|s| *s != ScriptState::Pending).await {
            Ok(settled) => settled.clone(),
            Err(_) => ScriptState::Failed("script element was removed before it finished loading".to_string()),
        };
        match outcome {
            ScriptState::Failed(reason) => Err(reason),
            ScriptState::Loaded | ScriptState::Pending => Ok(()),
        }
    }
}

impl fmt::Debug for ScriptTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptTag")
            .field("src", &self.src)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl ScriptEvents {
    /// Fires the `load` event.
    pub fn load(&self) {
        self.settle(ScriptState::Loaded);
    }

    /// Fires the `error` event.
    pub fn error(&self, reason: impl Into<String>) {
        self.settle(ScriptState::Failed(reason.into()));
    }

    fn settle(&self, outcome: ScriptState) {
        // A script settles once; later events are ignored.
        self.state.send_if_modified(|state| {
            if *state == ScriptState::Pending {
                *state = outcome;
                true
            } else {
                false
            }
        });
    }
}

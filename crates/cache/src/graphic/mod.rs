//! Managed graphics
//!
//! [`Graphic`] is a cloneable handle to a registered graphic payload. The
//! shared implementation is what the manager's registry holds; the handle
//! owns the [`Registration`] so the graphic is unregistered when its last
//! handle is dropped.
//!
//! Lock order is manager then graphic: the manager queries graphic state under
//! its lock, so a graphic always releases its own lock before notifying the
//! manager of a size change.

mod factory;
pub mod payload;
mod swap;

use crate::manager::{CacheManager, Registration, WeakManager};
use crate::traits::{GraphicId, ManagedObject};
use gfxswap_core::{Error, Result};
use parking_lot::Mutex;
use payload::{ExternalLink, GfxLink, GraphicKind, GraphicPayload};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use swap::SwapFile;

/// Where a swapped-out payload can be restored from
#[derive(Debug)]
enum Backing {
    None,
    /// Original encoded data; swapping out just drops the materialised copy
    Link {
        link: GfxLink,
        page_index: Option<i32>,
    },
    SwapFile(SwapFile),
}

#[derive(Debug)]
struct GraphicState {
    kind: GraphicKind,
    payload: Option<Arc<GraphicPayload>>,
    backing: Backing,
    external_link: Option<ExternalLink>,
    swapped_out: bool,
    last_used: Instant,
}

impl GraphicState {
    fn empty() -> Self {
        Self {
            kind: GraphicKind::Empty,
            payload: None,
            backing: Backing::None,
            external_link: None,
            swapped_out: false,
            last_used: Instant::now(),
        }
    }

    fn with_payload(payload: GraphicPayload) -> Self {
        Self {
            kind: payload.kind(),
            payload: Some(Arc::new(payload)),
            ..Self::empty()
        }
    }

    fn with_external_link(link: ExternalLink) -> Self {
        Self {
            kind: GraphicKind::ExternalLink,
            external_link: Some(link),
            ..Self::empty()
        }
    }

    /// Prepared from a link: swapped out until first use
    fn prepared(link: GfxLink, page_index: Option<i32>) -> Self {
        Self {
            kind: link.kind(),
            backing: Backing::Link { link, page_index },
            swapped_out: true,
            ..Self::empty()
        }
    }

    fn is_available(&self) -> bool {
        !self.swapped_out && self.payload.is_some()
    }

    fn size_bytes(&self) -> i64 {
        match &self.payload {
            Some(payload) if !self.swapped_out => payload.size_bytes(),
            _ => 0,
        }
    }
}

/// Shared graphic implementation held by the manager's registry
pub(crate) struct GraphicImpl {
    id: GraphicId,
    manager: WeakManager,
    state: Mutex<GraphicState>,
    active_operations: AtomicUsize,
}

impl GraphicImpl {
    fn new(id: GraphicId, manager: WeakManager, state: GraphicState) -> Self {
        Self {
            id,
            manager,
            state: Mutex::new(state),
            active_operations: AtomicUsize::new(0),
        }
    }

    fn swap_out_payload(&self) -> Result<bool> {
        if self.active_operations.load(Ordering::Acquire) > 0 {
            return Ok(false);
        }

        let freed = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if state.swapped_out {
                return Ok(false);
            }
            let Some(payload) = state.payload.as_ref() else {
                return Ok(false);
            };
            let size = payload.size_bytes();

            if !matches!(state.backing, Backing::Link { .. }) {
                state.backing = Backing::SwapFile(SwapFile::write(payload.as_ref())?);
            }
            state.payload = None;
            state.swapped_out = true;
            size
        };

        self.notify_swapped_out(freed);
        Ok(true)
    }

    fn swap_in_payload(&self) -> Result<bool> {
        let restored = {
            let mut state = self.state.lock();
            self.restore_locked(&mut state)?
        };

        match restored {
            Some(size) => {
                self.notify_swapped_in(size);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Materialise a swapped-out payload. Returns the restored size, which
    /// the caller reports once the graphic lock is released.
    fn restore_locked(&self, state: &mut GraphicState) -> Result<Option<i64>> {
        if !state.swapped_out {
            return Ok(None);
        }

        let payload = match &mut state.backing {
            Backing::SwapFile(file) => file.read()?,
            Backing::Link { link, page_index } => link.materialize(*page_index),
            Backing::None => return Err(Error::not_available(self.id.get())),
        };
        if matches!(state.backing, Backing::SwapFile(_)) {
            state.backing = Backing::None;
        }

        let size = payload.size_bytes();
        state.kind = payload.kind();
        state.payload = Some(Arc::new(payload));
        state.swapped_out = false;
        state.last_used = Instant::now();
        Ok(Some(size))
    }

    fn notify_swapped_in(&self, size: i64) {
        if let Some(manager) = self.manager.upgrade() {
            manager.notify_swapped_in(self.id, size);
        }
    }

    fn notify_swapped_out(&self, size: i64) {
        if let Some(manager) = self.manager.upgrade() {
            manager.notify_swapped_out(self.id, size);
        }
    }

    /// State for a deep copy, reading the swap file if needed
    fn duplicate_state(&self) -> Result<GraphicState> {
        let mut state = self.state.lock();

        if let Some(payload) = &state.payload {
            return Ok(GraphicState::with_payload(GraphicPayload::clone(payload)));
        }
        if let Some(link) = &state.external_link {
            return Ok(GraphicState::with_external_link(link.clone()));
        }
        match &mut state.backing {
            Backing::Link { link, page_index } => {
                Ok(GraphicState::prepared(link.clone(), *page_index))
            }
            Backing::SwapFile(file) => Ok(GraphicState::with_payload(file.read()?)),
            Backing::None => Ok(GraphicState::empty()),
        }
    }
}

impl ManagedObject for GraphicImpl {
    fn is_swapped_out(&self) -> bool {
        self.state.lock().swapped_out
    }

    fn is_available(&self) -> bool {
        self.state.lock().is_available()
    }

    fn size_bytes(&self) -> i64 {
        self.state.lock().size_bytes()
    }

    fn swap_out(&self) {
        if let Err(e) = self.swap_out_payload() {
            tracing::warn!(id = %self.id, "Failed to swap out graphic: {e}");
        }
    }

    fn last_used(&self) -> Instant {
        self.state.lock().last_used
    }

    fn has_active_operation(&self) -> bool {
        self.active_operations.load(Ordering::Acquire) > 0
    }
}

/// Handle to a graphic registered with a [`crate::CacheManager`]
///
/// Clones share the same graphic. The graphic is unregistered when the last
/// clone is dropped.
#[derive(Clone)]
pub struct Graphic {
    inner: Arc<GraphicImpl>,
    registration: Arc<Registration>,
}

impl Graphic {
    pub fn id(&self) -> GraphicId {
        self.inner.id
    }

    pub fn kind(&self) -> GraphicKind {
        self.inner.state.lock().kind
    }

    pub fn is_swapped_out(&self) -> bool {
        self.inner.is_swapped_out()
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    /// Materialised size, 0 when unavailable
    pub fn size_bytes(&self) -> i64 {
        self.inner.size_bytes()
    }

    pub fn last_used(&self) -> Instant {
        self.inner.last_used()
    }

    /// Mark the graphic as used now
    pub fn touch(&self) {
        self.mark_used_at(Instant::now());
    }

    /// Override the last-use time, e.g. when restoring an idle document
    pub fn mark_used_at(&self, at: Instant) {
        self.inner.state.lock().last_used = at;
    }

    /// External link target, for [`GraphicKind::ExternalLink`] graphics
    pub fn external_link(&self) -> Option<ExternalLink> {
        self.inner.state.lock().external_link.clone()
    }

    /// Whether an operation guard is currently held
    pub fn has_active_operation(&self) -> bool {
        self.inner.has_active_operation()
    }

    /// Swap the payload out to its backing store
    ///
    /// Returns `Ok(false)` when already swapped out, when there is nothing to
    /// swap, or while an operation guard is held.
    pub fn swap_out(&self) -> Result<bool> {
        self.inner.swap_out_payload()
    }

    /// Restore a swapped-out payload. Returns `Ok(false)` if already in.
    pub fn swap_in(&self) -> Result<bool> {
        self.inner.swap_in_payload()
    }

    /// Run `f` on the payload, swapping it in first if needed
    ///
    /// The graphic cannot be evicted while `f` runs. `f` runs without any
    /// cache lock held, so it may create or drop graphics on the same manager.
    pub fn with_payload<R>(&self, f: impl FnOnce(&GraphicPayload) -> R) -> Result<R> {
        let _operation = self.begin_operation();

        let (payload, restored) = {
            let mut state = self.inner.state.lock();
            state.last_used = Instant::now();
            let restored = self.inner.restore_locked(&mut state)?;
            (state.payload.clone(), restored)
        };

        if let Some(size) = restored {
            self.inner.notify_swapped_in(size);
        }
        match payload {
            Some(payload) => Ok(f(&payload)),
            None => Err(Error::not_available(self.inner.id.get())),
        }
    }

    /// Replace the payload in place, e.g. after more data was decoded
    pub fn replace_payload(&self, payload: GraphicPayload) {
        let old_size = {
            let mut state = self.inner.state.lock();
            let old_size = state.size_bytes();
            state.kind = payload.kind();
            state.payload = Some(Arc::new(payload));
            state.backing = Backing::None;
            state.external_link = None;
            state.swapped_out = false;
            state.last_used = Instant::now();
            old_size
        };

        if let Some(manager) = self.inner.manager.upgrade() {
            manager.notify_resized(self.inner.id, old_size);
        }
    }

    /// Hold the graphic busy; it is never swapped out while the guard lives
    pub fn begin_operation(&self) -> OperationGuard {
        self.inner.active_operations.fetch_add(1, Ordering::AcqRel);
        OperationGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Bytes of the swap file currently backing the graphic, if any
    pub fn swap_file_len(&self) -> Option<u64> {
        match &self.inner.state.lock().backing {
            Backing::SwapFile(file) => Some(file.len()),
            _ => None,
        }
    }

    /// Manager the graphic is registered with
    pub fn manager(&self) -> &CacheManager {
        self.registration.manager()
    }
}

impl fmt::Debug for Graphic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Graphic")
            .field("id", &self.inner.id)
            .field("kind", &state.kind)
            .field("swapped_out", &state.swapped_out)
            .field("size_bytes", &state.size_bytes())
            .finish()
    }
}

/// Marks an external operation on a graphic; see [`Graphic::begin_operation`]
pub struct OperationGuard {
    inner: Arc<GraphicImpl>,
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.inner.active_operations.fetch_sub(1, Ordering::AcqRel);
    }
}

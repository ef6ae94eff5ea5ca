//! Script execution seam.
//!
//! A frame does not interpret JavaScript itself. Each `<script>` element's
//! text is handed, in document order, to a `ScriptEngine` together with a
//! `FrameScope` through which the script defines remote functions, adds
//! event listeners and emits events to the host.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::registry::{FrameMeta, FrameRegistry, HandlerFuture, RegistryError};
use crate::protocol::{FrameEvent, FrameId, HostChannel, RemoteError};

/// Whether a script finished synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptStatus {
    Settled,
    /// The script keeps the document loading (a pending resource). The
    /// frame never reaches `complete` and never reports `load`.
    Suspended,
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("uncaught: {0}")]
    Thrown(String),
}

pub trait ScriptEngine: Send + Sync {
    /// Run one script body.
    ///
    /// An error aborts this script only; later scripts still run.
    fn run(&self, source: &str, scope: &mut FrameScope<'_>) -> Result<ScriptStatus, ScriptError>;
}

/// Engine for documents whose scripts are inert.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScripts;

impl ScriptEngine for NoScripts {
    fn run(&self, _source: &str, _scope: &mut FrameScope<'_>) -> Result<ScriptStatus, ScriptError> {
        Ok(ScriptStatus::Settled)
    }
}

/// Closure-backed engine, see [`scripts`].
pub struct ScriptFn<F>(F);

impl<F> ScriptEngine for ScriptFn<F>
where
    F: Fn(&str, &mut FrameScope<'_>) -> Result<ScriptStatus, ScriptError> + Send + Sync,
{
    fn run(&self, source: &str, scope: &mut FrameScope<'_>) -> Result<ScriptStatus, ScriptError> {
        (self.0)(source, scope)
    }
}

/// Build a script engine from a closure.
///
/// ```ignore
/// let engine = scripts(|source, scope| {
///     if source.contains("clock") {
///         scope.define("now", |_| async { Ok(json!(42)) })?;
///     }
///     Ok(ScriptStatus::Settled)
/// });
/// ```
pub fn scripts<F>(f: F) -> Arc<dyn ScriptEngine>
where
    F: Fn(&str, &mut FrameScope<'_>) -> Result<ScriptStatus, ScriptError> + Send + Sync + 'static,
{
    Arc::new(ScriptFn(f))
}

// =============================================================================
// Emitter
// =============================================================================

/// Posts frame events under the frame's current identity.
///
/// The identity is read at send time, so a reply produced after a swap is
/// routed under the rebound id.
#[derive(Clone)]
pub struct Emitter {
    channel: HostChannel,
    meta: FrameMeta,
}

impl Emitter {
    pub(crate) fn new(channel: HostChannel, meta: FrameMeta) -> Self {
        Self { channel, meta }
    }

    pub fn frame_id(&self) -> FrameId {
        self.meta.read().clone()
    }

    /// Emit a user event to the host.
    pub fn emit(&self, name: impl Into<String>, data: Value) {
        self.send(FrameEvent::Custom {
            name: name.into(),
            data,
        });
    }

    pub(crate) fn send(&self, event: FrameEvent) {
        let envelope = event.into_envelope(&self.frame_id());
        self.channel.post(envelope);
    }
}

// =============================================================================
// FrameScope
// =============================================================================

/// What a running script can reach.
pub struct FrameScope<'a> {
    registry: &'a mut FrameRegistry,
    emitter: &'a Emitter,
}

impl<'a> FrameScope<'a> {
    pub(crate) fn new(registry: &'a mut FrameRegistry, emitter: &'a Emitter) -> Self {
        Self { registry, emitter }
    }

    /// Define a remote function callable by the host.
    pub fn define<F, Fut>(&mut self, name: &str, f: F) -> Result<(), RegistryError>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, RemoteError>> + Send + 'static,
    {
        self.registry
            .define(name, Arc::new(move |data| Box::pin(f(data)) as HandlerFuture))
    }

    pub fn add_event_listener<F>(&mut self, name: &str, f: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.registry.add_event_listener(name, Arc::new(f));
    }

    pub fn emit(&self, name: impl Into<String>, data: Value) {
        self.emitter.emit(name, data);
    }

    /// An emitter the script can keep, e.g. inside a listener.
    pub fn emitter(&self) -> Emitter {
        self.emitter.clone()
    }
}

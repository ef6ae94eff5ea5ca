//! Per-frame registry of remote functions and event listeners.
//!
//! Owned by one frame runtime. A full document write clears functions and
//! listeners; the frame identity (`meta`) survives every write and is only
//! changed by `setFrameId`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::{FrameId, RemoteError, names};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, RemoteError>> + Send>>;

/// A function callable from the host as `fn:<name>`.
pub type FunctionHandler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// A listener for host-emitted user events.
pub type EventListener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("remote function \"{0}\" is already defined")]
    AlreadyDefined(String),
}

/// Identity shared between the runtime and everything that emits for it.
pub type FrameMeta = Arc<RwLock<FrameId>>;

pub struct FrameRegistry {
    functions: FxHashMap<String, FunctionHandler>,
    listeners: FxHashMap<String, Vec<EventListener>>,
    meta: FrameMeta,
}

impl FrameRegistry {
    pub fn new(frame_id: FrameId) -> Self {
        Self {
            functions: FxHashMap::default(),
            listeners: FxHashMap::default(),
            meta: Arc::new(RwLock::new(frame_id)),
        }
    }

    pub fn meta(&self) -> FrameMeta {
        Arc::clone(&self.meta)
    }

    pub fn frame_id(&self) -> FrameId {
        self.meta.read().clone()
    }

    pub fn set_frame_id(&self, frame_id: FrameId) {
        *self.meta.write() = frame_id;
    }

    /// Register `name`. Defining the same name twice is an error.
    pub fn define(&mut self, name: &str, handler: FunctionHandler) -> Result<(), RegistryError> {
        let key = format!("{}{name}", names::FN_PREFIX);
        if self.functions.contains_key(&key) {
            return Err(RegistryError::AlreadyDefined(name.to_string()));
        }
        self.functions.insert(key, handler);
        Ok(())
    }

    /// Handler for a plain function name.
    pub fn function(&self, name: &str) -> Option<FunctionHandler> {
        self.functions
            .get(&format!("{}{name}", names::FN_PREFIX))
            .cloned()
    }

    pub fn add_event_listener(&mut self, name: &str, listener: EventListener) {
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(listener);
    }

    /// Listeners for `name`, in registration order.
    pub fn listeners(&self, name: &str) -> Vec<EventListener> {
        self.listeners.get(name).cloned().unwrap_or_default()
    }

    /// Forget every function and listener.
    pub fn reset_registries(&mut self) {
        self.functions.clear();
        self.listeners.clear();
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }
}

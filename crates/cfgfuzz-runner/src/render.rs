use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Arc;

use cfgfuzz_core::GeneratedValue;
use serde::{Deserialize, Serialize};

/// Payload of an abnormal termination captured while rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message", rename_all = "lowercase")]
pub enum FaultPayload {
    /// A plain text payload, kept verbatim.
    Text(String),
    /// An error value; its message is kept.
    Error(String),
    /// A payload of a type that carries no readable message.
    Unknown,
}

impl FaultPayload {
    pub fn from_panic(panic: Box<dyn Any + Send>) -> Self {
        if let Some(message) = panic.downcast_ref::<&str>() {
            FaultPayload::Text((*message).to_string())
        } else if let Some(message) = panic.downcast_ref::<String>() {
            FaultPayload::Text(message.clone())
        } else if let Some(err) = panic.downcast_ref::<Box<dyn std::error::Error + Send + Sync>>() {
            FaultPayload::Error(err.to_string())
        } else if let Some(err) = panic.downcast_ref::<std::io::Error>() {
            FaultPayload::Error(err.to_string())
        } else {
            FaultPayload::Unknown
        }
    }
}

impl fmt::Display for FaultPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPayload::Text(message) | FaultPayload::Error(message) => f.write_str(message),
            FaultPayload::Unknown => f.write_str("unknown panic type"),
        }
    }
}

/// What a renderer reports for one candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<FaultPayload>,
}

impl RenderResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn fault(payload: FaultPayload) -> Self {
        Self {
            fault: Some(payload),
            ..Self::default()
        }
    }

    /// Neither success, error nor fault.
    pub fn unclassified() -> Self {
        Self::default()
    }

    pub fn is_unclassified(&self) -> bool {
        !self.success && self.error_text.is_none() && self.fault.is_none()
    }
}

/// A rendered candidate together with its response.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutcome {
    pub value: GeneratedValue,
    pub response: RenderResponse,
}

/// Something that turns a candidate configuration into output, or fails.
pub trait Renderer {
    fn render(&mut self, values: &GeneratedValue) -> RenderResponse;
}

impl<F> Renderer for F
where
    F: FnMut(&GeneratedValue) -> RenderResponse,
{
    fn render(&mut self, values: &GeneratedValue) -> RenderResponse {
        self(values)
    }
}

/// Render `value`, converting a panic raised by the renderer into a fault
/// response. A fault always clears `success`.
pub fn render_guarded<R: Renderer + ?Sized>(renderer: &mut R, value: GeneratedValue) -> RenderOutcome {
    let was_rendering = RENDERING.with(|flag| flag.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(|| renderer.render(&value)));
    RENDERING.with(|flag| flag.set(was_rendering));
    let mut response = match result {
        Ok(response) => response,
        Err(panic) => RenderResponse::fault(FaultPayload::from_panic(panic)),
    };
    if response.fault.is_some() {
        response.success = false;
    }
    RenderOutcome { value, response }
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

thread_local! {
    static RENDERING: Cell<bool> = const { Cell::new(false) };
}

/// Silences panics raised inside [`render_guarded`] while alive. Panics
/// anywhere else still reach the previous hook, which is reinstated on drop.
pub struct QuietPanics {
    previous: Arc<PanicHook>,
}

impl QuietPanics {
    pub fn install() -> Self {
        let previous: Arc<PanicHook> = Arc::new(panic::take_hook());
        let forward = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            if !RENDERING.with(Cell::get) {
                forward(info);
            }
        }));
        Self { previous }
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        // `set_hook` cannot run on a panicking thread; the installed hook
        // already forwards everything outside the render barrier.
        if std::thread::panicking() {
            return;
        }
        let previous = Arc::clone(&self.previous);
        panic::set_hook(Box::new(move |info| previous(info)));
    }
}

impl fmt::Debug for QuietPanics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuietPanics").finish_non_exhaustive()
    }
}

//! Call stack capture for system failures
//!
//! A trace is captured once, where a failure is first observed. Only raw
//! instruction pointers are recorded, at most [`CAPTURE_LIMIT`] of them.
//! Symbol resolution happens lazily, the first time the trace is rendered.

use std::fmt;
use std::sync::OnceLock;

/// Maximum number of frames kept when a trace is rendered
pub const MAX_FRAMES: usize = 32;

/// Headroom for the capture machinery and failure constructors that sit
/// on top of the caller's frames
const INTERNAL_FRAMES: usize = 16;

/// Maximum number of raw frames recorded per capture
pub const CAPTURE_LIMIT: usize = MAX_FRAMES + INTERNAL_FRAMES;

/// Frames belonging to failure construction itself are not interesting
const INTERNAL_PREFIXES: &[&str] = &[
    "backtrace::",
    "dusted_fault::stack::Trace::",
    "dusted_fault::system::SystemFailure::",
    "<dusted_fault::system::SystemFailure",
    "dusted_fault::ext::",
    "<core::result::Result<T,E> as dusted_fault::ext::ResultExt",
    "core::result::Result<T,E>::map_err",
    "dusted_fault::Failure::system",
];

/// A single resolved stack frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub function: String,
    pub location: Option<String>,
}

/// Call stack snapshot taken at the innermost construction site
pub struct Trace {
    // Instruction pointers, innermost first
    raw: Vec<usize>,
    frames: OnceLock<Vec<Frame>>,
}

impl Trace {
    /// Record the current call stack, innermost first, without resolving
    /// symbols
    pub fn capture() -> Self {
        let mut raw = Vec::with_capacity(CAPTURE_LIMIT);
        backtrace::trace(|frame| {
            raw.push(frame.ip() as usize);
            raw.len() < CAPTURE_LIMIT
        });

        Self {
            raw,
            frames: OnceLock::new(),
        }
    }

    /// Number of raw frames recorded at capture time
    pub fn captured(&self) -> usize {
        self.raw.len()
    }

    /// Resolved frames, innermost first, bounded by [`MAX_FRAMES`]
    pub fn frames(&self) -> &[Frame] {
        self.frames.get_or_init(|| {
            self.raw
                .iter()
                .flat_map(resolve)
                .skip_while(|frame| is_internal(&frame.function))
                .take(MAX_FRAMES)
                .collect()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.frames().is_empty()
    }
}

/// One entry per symbol; inlined functions share a raw frame
fn resolve(ip: &usize) -> Vec<Frame> {
    let mut frames = Vec::new();

    // Return addresses point past the call instruction
    let address = ip.saturating_sub(1) as *mut std::ffi::c_void;
    backtrace::resolve(address, |symbol| {
        let function = symbol
            .name()
            .map(|name| format!("{name:#}"))
            .unwrap_or_else(|| format!("{ip:#x}"));
        let location = match (symbol.filename(), symbol.lineno()) {
            (Some(file), Some(line)) => Some(format!("{}:{line}", file.display())),
            (Some(file), None) => Some(file.display().to_string()),
            _ => None,
        };
        frames.push(Frame { function, location });
    });

    if frames.is_empty() {
        frames.push(Frame {
            function: format!("{ip:#x}"),
            location: None,
        });
    }
    frames
}

fn is_internal(function: &str) -> bool {
    INTERNAL_PREFIXES
        .iter()
        .any(|prefix| function.starts_with(prefix))
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in self.frames() {
            write!(
                f,
                "\nat {}\n   --> {}",
                frame.location.as_deref().unwrap_or("<unknown>"),
                frame.function
            )?;
        }
        Ok(())
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("captured", &self.raw.len())
            .finish_non_exhaustive()
    }
}

//! System failures
//!
//! A system failure is caused by an internal fault which only the
//! application itself can handle, e.g. a failed database connection, an IO
//! error or an unexpected HTTP response. In a web context it would result in
//! a 5xx status code.
//!
//! Every layer that propagates a system failure wraps it with a new
//! `component.operation: message` line. The rendered error nests the earlier
//! lines underneath, indented three spaces further per level:
//!
//! ```text
//! g.h: i
//!    d.e: f
//!       a.b: c
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use crate::stack::Trace;
use crate::Failure;

const PADDING: &str = "   ";

type BoxError = Box<dyn StdError + Send + Sync>;

/// An internal failure with its full causal context
#[derive(Clone)]
pub struct SystemFailure {
    rendered: String,
    // Innermost first, one entry per layer
    messages: Vec<String>,
    source: Option<Source>,
    trace: Arc<Trace>,
}

#[derive(Clone)]
enum Source {
    System(Arc<SystemFailure>),
    Foreign(Arc<dyn StdError + Send + Sync>),
}

fn headline(component: &str, operation: &str, message: &str) -> String {
    format!("{component}.{operation}: {message}")
}

impl SystemFailure {
    /// Create a failure at the point where the problem was first detected,
    /// capturing the current call stack.
    pub fn new(component: &str, operation: &str, message: impl Into<String>) -> Self {
        let message = headline(component, operation, &message.into());
        Self {
            rendered: message.clone(),
            messages: vec![message],
            source: None,
            trace: Arc::new(Trace::capture()),
        }
    }

    /// Wrap a cause with one more line of context.
    ///
    /// Wrapping an existing system failure keeps its message history and
    /// its stack trace. Any other error starts a new history made of the
    /// cause's message and the new line.
    pub fn wrap<E>(cause: E, component: &str, operation: &str, message: impl Into<String>) -> Self
    where
        E: Into<BoxError>,
    {
        let message = headline(component, operation, &message.into());

        let cause: BoxError = cause.into();
        let cause = match cause.downcast::<SystemFailure>() {
            Ok(system) => return Self::wrap_system(*system, message),
            Err(other) => other,
        };

        match cause.downcast::<Failure>() {
            Ok(failure) => match *failure {
                Failure::System(system) => Self::wrap_system(system, message),
                Failure::User(user) => Self::wrap_foreign(Box::new(user), message),
            },
            Err(other) => Self::wrap_foreign(other, message),
        }
    }

    fn wrap_system(cause: SystemFailure, message: String) -> Self {
        let mut rendered = message.clone();
        let mut pad = String::from(PADDING);
        for earlier in cause.messages.iter().rev() {
            rendered.push('\n');
            rendered.push_str(&pad);
            rendered.push_str(earlier);
            pad.push_str(PADDING);
        }

        let mut messages = cause.messages.clone();
        messages.push(message);

        Self {
            rendered,
            messages,
            trace: Arc::clone(&cause.trace),
            source: Some(Source::System(Arc::new(cause))),
        }
    }

    fn wrap_foreign(cause: BoxError, message: String) -> Self {
        let cause_message = cause.to_string();
        Self {
            rendered: format!("{message}\n{PADDING}{cause_message}"),
            messages: vec![cause_message, message],
            source: Some(Source::Foreign(Arc::from(cause))),
            trace: Arc::new(Trace::capture()),
        }
    }

    /// Outermost `component.operation: message` line
    pub fn summary(&self) -> &str {
        self.messages
            .last()
            .map(String::as_str)
            .unwrap_or(self.rendered.as_str())
    }

    /// Full nested message chain, outermost first. Same as `Display`.
    pub fn error(&self) -> &str {
        &self.rendered
    }

    /// Message history, innermost first
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// The nested message chain followed by the frames captured where the
    /// failure was first created. Intended for logs, never for end users.
    pub fn stack_trace(&self) -> String {
        format!("{}{}", self.rendered, self.trace)
    }

    /// The call stack captured at the innermost construction site
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// The foreign error at the root of the chain, if the chain started
    /// from one rather than from [`SystemFailure::new`].
    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        match &self.source {
            Some(Source::Foreign(err)) => Some(err.as_ref()),
            Some(Source::System(inner)) => SystemFailure::cause(inner),
            None => None,
        }
    }
}

/// `{}` renders the nested message chain, `{:#}` adds the stack trace.
impl fmt::Display for SystemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str(&self.stack_trace())
        } else {
            f.write_str(&self.rendered)
        }
    }
}

impl fmt::Debug for SystemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemFailure")
            .field("messages", &self.messages)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

impl StdError for SystemFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.source {
            Some(Source::System(inner)) => Some(inner.as_ref()),
            Some(Source::Foreign(err)) => Some(err.as_ref()),
            None => None,
        }
    }
}

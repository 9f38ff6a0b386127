//! Stream entry points.
//!
//! [`Sass`] configures a stream and turns into one of two transforms:
//!
//! - [`SyncTransform`]: each unit is compiled before `write` returns, so
//!   events come out in input order.
//! - [`AsyncTransform`]: each unit is handed to the compiler's asynchronous
//!   entry point and `write` returns immediately. Events come out in
//!   completion order; [`End`](Event::End) is only sent once every in-flight
//!   unit has been emitted.
//!
//! # Example
//!
//! ```ignore
//! let (stream, events) = Sass::default()
//!     .with_options(Options::builder().include_path("vendor").build())
//!     .into_async();
//!
//! stream.write_all(files);
//! stream.end();
//!
//! for event in events {
//!     match event {
//!         Event::Data(file) => write_output(file),
//!         Event::Error(err) => eprintln!("{err}"),
//!         Event::End => unreachable!(),
//!     }
//! }
//! ```

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "async")]
use parking_lot::Mutex;

use crate::compiler::Compiler;
use crate::config::Options;
use crate::diagnostic::{ErrorHook, LogError, StreamError};
use crate::unit::Unit;

use super::filter::{classify, Filter};
use super::invoke::{compile_options, invoke};
#[cfg(feature = "async")]
use super::invoke::invoke_async;
use super::mapper::finish;

// =============================================================================
// Events
// =============================================================================

/// Something a stream emits.
#[derive(Debug)]
pub enum Event<U> {
    /// A unit, either passed through or compiled.
    Data(U),
    /// A unit failed; it is not emitted as data.
    Error(StreamError),
    /// Every unit written before `end()` has been emitted.
    End,
}

impl<U> Event<U> {
    /// The unit, if this is a data event.
    pub fn into_data(self) -> Option<U> {
        match self {
            Self::Data(unit) => Some(unit),
            _ => None,
        }
    }

    /// The error, if this is an error event.
    pub fn as_error(&self) -> Option<&StreamError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// Receiving side of a stream.
///
/// Iterating yields data and error events and stops at [`Event::End`] (or
/// when every sender is gone).
#[derive(Debug)]
pub struct Events<U> {
    rx: Receiver<Event<U>>,
    done: bool,
}

impl<U> Events<U> {
    fn new(rx: Receiver<Event<U>>) -> Self {
        Self { rx, done: false }
    }

    /// Block for the next event. `None` once the stream is gone.
    pub fn recv(&self) -> Option<Event<U>> {
        self.rx.recv().ok()
    }

    /// Block for the next event, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Event<U>> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Collect every event up to (not including) `End`.
    pub fn collect_until_end(self) -> Vec<Event<U>> {
        self.collect()
    }
}

impl<U> Iterator for Events<U> {
    type Item = Event<U>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.rx.recv() {
            Ok(Event::End) | Err(_) => {
                self.done = true;
                None
            }
            Ok(event) => Some(event),
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Stream configuration.
///
/// # Example
///
/// ```ignore
/// // Ordered output, errors printed to stderr instead of emitted
/// let (stream, events) = Sass::new(GrassCompiler)
///     .log_errors()
///     .into_sync();
/// ```
pub struct Sass {
    compiler: Arc<dyn Compiler>,
    options: Options,
    hook: Option<Arc<dyn ErrorHook>>,
}

#[cfg(feature = "grass")]
impl Default for Sass {
    fn default() -> Self {
        Self::new(crate::compiler::GrassCompiler)
    }
}

impl Sass {
    /// Use `compiler` for every unit.
    pub fn new(compiler: impl Compiler) -> Self {
        Self::from_shared(Arc::new(compiler))
    }

    /// Use a compiler shared with other streams.
    pub fn from_shared(compiler: Arc<dyn Compiler>) -> Self {
        Self {
            compiler,
            options: Options::default(),
            hook: None,
        }
    }

    /// Replace the options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Route errors to `hook` instead of the event channel.
    pub fn with_error_hook(mut self, hook: impl ErrorHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Route errors to the default [`LogError`] hook.
    pub fn log_errors(self) -> Self {
        self.with_error_hook(LogError::default())
    }

    /// Build a transform that preserves input order.
    pub fn into_sync<U: Unit>(self) -> (SyncTransform<U>, Events<U>) {
        let (core, events) = self.into_core();
        (SyncTransform { core }, events)
    }

    /// Build a transform that compiles concurrently.
    #[cfg(feature = "async")]
    pub fn into_async<U: Unit>(self) -> (AsyncTransform<U>, Events<U>) {
        let (core, events) = self.into_core();
        let transform = AsyncTransform {
            core: Arc::new(core),
            drain: Arc::new(Mutex::new(Drain::default())),
        };
        (transform, events)
    }

    fn into_core<U: Unit>(self) -> (Core<U>, Events<U>) {
        let (tx, rx) = mpsc::channel();
        let core = Core {
            compiler: self.compiler,
            options: self.options,
            hook: self.hook,
            tx,
        };
        (core, Events::new(rx))
    }
}

// =============================================================================
// Transforms
// =============================================================================

/// Write side of a stream.
pub trait Transform<U: Unit> {
    /// Submit one unit.
    fn write(&self, unit: U);

    /// Signal end of input. [`Event::End`] follows once every submitted
    /// unit has been emitted.
    fn end(self)
    where
        Self: Sized;

    /// Submit units in order.
    fn write_all<I>(&self, units: I)
    where
        I: IntoIterator<Item = U>,
        Self: Sized,
    {
        for unit in units {
            self.write(unit);
        }
    }
}

/// State shared by both transforms.
struct Core<U> {
    compiler: Arc<dyn Compiler>,
    options: Options,
    hook: Option<Arc<dyn ErrorHook>>,
    tx: Sender<Event<U>>,
}

impl<U: Unit> Core<U> {
    /// Emit pass-through and unsupported units. Returns units to compile.
    fn filter(&self, unit: U) -> Option<U> {
        match classify(&unit) {
            Filter::Compile => Some(unit),
            Filter::PassThrough => {
                tracing::debug!(path = %unit.path().display(), "pass through");
                self.emit(Ok(unit));
                None
            }
            Filter::Unsupported => {
                tracing::debug!(path = %unit.path().display(), "streaming unit rejected");
                self.emit(Err(StreamError::unsupported(unit.path(), &self.options.cwd)));
                None
            }
        }
    }

    fn emit(&self, outcome: Result<U, StreamError>) {
        match outcome {
            Ok(unit) => self.send(Event::Data(unit)),
            Err(error) => match &self.hook {
                Some(hook) => hook.report(&error),
                None => self.send(Event::Error(error)),
            },
        }
    }

    fn send(&self, event: Event<U>) {
        if self.tx.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}

/// Transform that compiles each unit before accepting the next.
pub struct SyncTransform<U> {
    core: Core<U>,
}

impl<U: Unit> Transform<U> for SyncTransform<U> {
    fn write(&self, unit: U) {
        let Some(unit) = self.core.filter(unit) else {
            return;
        };
        let options = compile_options(&unit, &self.core.options);
        let result = invoke(self.core.compiler.as_ref(), &options);
        self.core.emit(finish(unit, result, &self.core.options));
    }

    fn end(self) {
        self.core.send(Event::End);
    }
}

/// In-flight bookkeeping for [`AsyncTransform`].
#[cfg(feature = "async")]
#[derive(Debug, Default)]
struct Drain {
    in_flight: usize,
    ending: bool,
    ended: bool,
}

#[cfg(feature = "async")]
impl Drain {
    /// Whether `End` should be sent now; marks it sent.
    fn take_end(&mut self) -> bool {
        if self.ending && self.in_flight == 0 && !self.ended {
            self.ended = true;
            true
        } else {
            false
        }
    }
}

/// Transform that compiles units concurrently.
///
/// Compilation runs on the compiler's asynchronous entry point (the rayon
/// pool by default), so concurrency is bounded by that pool.
#[cfg(feature = "async")]
pub struct AsyncTransform<U> {
    core: Arc<Core<U>>,
    drain: Arc<Mutex<Drain>>,
}

#[cfg(feature = "async")]
impl<U: Unit> AsyncTransform<U> {
    /// Number of units currently compiling.
    pub fn in_flight(&self) -> usize {
        self.drain.lock().in_flight
    }
}

#[cfg(feature = "async")]
impl<U: Unit> Transform<U> for AsyncTransform<U> {
    fn write(&self, unit: U) {
        let Some(unit) = self.core.filter(unit) else {
            return;
        };
        let options = compile_options(&unit, &self.core.options);
        self.drain.lock().in_flight += 1;

        let core = Arc::clone(&self.core);
        let drain = Arc::clone(&self.drain);
        invoke_async(Arc::clone(&self.core.compiler), options, move |result| {
            core.emit(finish(unit, result, &core.options));
            let send_end = {
                let mut drain = drain.lock();
                drain.in_flight -= 1;
                drain.take_end()
            };
            if send_end {
                core.send(Event::End);
            }
        });
    }

    fn end(self) {
        let send_end = {
            let mut drain = self.drain.lock();
            drain.ending = true;
            drain.take_end()
        };
        if send_end {
            self.core.send(Event::End);
        }
    }
}

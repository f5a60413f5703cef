//! Guarded region emission.
//!
//! Emission walks commands in registry order and wraps runs of adjacent
//! commands that share a guard in one region. Only adjacency matters: guards
//! `[X, X, Y, X]` produce three regions, never two. Filtered passes run the
//! same walk over an order-preserving subsequence.
//!
//! The concrete conditional syntax belongs to the [`TextSink`]; the emitter
//! only guarantees that `open_region` and `close_region` alternate, starting
//! with an open and ending with a close.
//!
//! # Examples
//!
//! ```
//! use vk_loadgen_core::{Guard, RegionEmitter, SinkEvent};
//!
//! let x = Guard::defined("X");
//! let y = Guard::defined("Y");
//! let mut events: Vec<SinkEvent> = Vec::new();
//!
//! let mut emitter = RegionEmitter::new(&mut events);
//! for (guard, name) in [(&x, "a"), (&x, "b"), (&y, "c"), (&x, "d")] {
//!     emitter.item(guard, |sink| sink.push(SinkEvent::Fragment(name.into())));
//! }
//! assert_eq!(emitter.finish(), 3);
//! assert_eq!(events.iter().filter(|e| matches!(e, SinkEvent::Open(_))).count(), 3);
//! ```

use crate::condition::Guard;
use crate::types::{Command, CommandFilter};

/// Receiver of emitted text and region markers.
pub trait TextSink {
    /// Appends an already formatted fragment.
    fn fragment(&mut self, text: &str);
    /// Opens a region compiled only when `guard` holds.
    fn open_region(&mut self, guard: &Guard);
    /// Closes the currently open region.
    fn close_region(&mut self);
}

/// A recorded [`TextSink`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Fragment(String),
    Open(Guard),
    Close,
}

impl TextSink for Vec<SinkEvent> {
    fn fragment(&mut self, text: &str) {
        self.push(SinkEvent::Fragment(text.to_string()));
    }

    fn open_region(&mut self, guard: &Guard) {
        self.push(SinkEvent::Open(guard.clone()));
    }

    fn close_region(&mut self) {
        self.push(SinkEvent::Close);
    }
}

/// Streaming run-length grouping of items by guard.
pub struct RegionEmitter<'s, S: TextSink + ?Sized> {
    sink: &'s mut S,
    open: Option<Guard>,
    regions: usize,
}

impl<'s, S: TextSink + ?Sized> RegionEmitter<'s, S> {
    pub fn new(sink: &'s mut S) -> Self {
        Self {
            sink,
            open: None,
            regions: 0,
        }
    }

    /// Emits one item under `guard`, switching regions if the guard differs
    /// from the one currently open. `write` produces the item's text.
    pub fn item(&mut self, guard: &Guard, write: impl FnOnce(&mut S)) {
        if self.open.as_ref() != Some(guard) {
            if self.open.is_some() {
                self.sink.close_region();
            }
            self.sink.open_region(guard);
            self.open = Some(guard.clone());
            self.regions += 1;
        }
        write(&mut *self.sink);
    }

    /// Closes the last region, if any, and returns how many were opened.
    /// An empty sequence emits no markers at all.
    pub fn finish(mut self) -> usize {
        if self.open.take().is_some() {
            self.sink.close_region();
        }
        self.regions
    }
}

/// Emits every command matching `filter`, in order, grouped by guard.
///
/// Returns the number of regions opened.
pub fn emit_commands<'c, S, F>(
    commands: impl IntoIterator<Item = &'c Command>,
    filter: CommandFilter,
    sink: &mut S,
    mut write: F,
) -> usize
where
    S: TextSink + ?Sized,
    F: FnMut(&Command, &mut S),
{
    let mut emitter = RegionEmitter::new(sink);
    for command in commands.into_iter().filter(|command| filter.matches(command)) {
        emitter.item(&command.requirements, |sink| write(command, sink));
    }
    emitter.finish()
}

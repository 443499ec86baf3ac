//! Ordered callback registry
//!
//! Dispatch is synchronous and runs in subscription order. A handler only
//! owns its captured state, so it cannot reach back into the registry (or
//! the object that owns it) while a dispatch is walking the list.

/// Handle returned by [`Callbacks::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// A list of observers for events of type `E`
pub struct Callbacks<E> {
    handlers: Vec<(CallbackId, Handler<E>)>,
    next_id: u64,
}

impl<E> Default for Callbacks<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Callbacks<E> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }

    /// Register a handler. Returns an id usable with [`Callbacks::unsubscribe`].
    pub fn subscribe(&mut self, handler: impl FnMut(&E) + 'static) -> CallbackId {
        let id = CallbackId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns false if the id was unknown.
    pub fn unsubscribe(&mut self, id: CallbackId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| *h != id);
        before != self.handlers.len()
    }

    /// Number of live handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke every handler with `event`, in subscription order
    pub fn dispatch(&mut self, event: &E) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(event);
        }
    }
}

impl<E> std::fmt::Debug for Callbacks<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

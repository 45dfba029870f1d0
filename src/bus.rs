// SPDX-License-Identifier: Apache-2.0
//! Typed publish/subscribe message bus.
//!
//! Delivery is single-threaded, synchronous, and reentrancy-safe: a handler
//! invoked while a batch is draining may publish further messages, which
//! are appended to the same FIFO and drained before the outermost
//! `publish_bulk` call returns. This mirrors the ledger/queue discipline of
//! an append-only inbox — messages are never dropped or reordered, only
//! appended and later drained.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::ident::{AttrId, EffectId, ItemId};
use crate::item::ItemState;

/// A discrete item state transition, used by [`Message::StatesActivated`]
/// and [`Message::StatesDeactivated`] to announce which states are now
/// included/excluded for an item.
pub type StateSet = Vec<ItemState>;

/// The core message taxonomy.
#[derive(Debug, Clone)]
pub enum Message {
    /// An item finished loading (its type resolved, autocharges attached).
    ItemLoaded {
        /// The item that loaded.
        item: ItemId,
    },
    /// An item was unloaded (its cache cleared).
    ItemUnloaded {
        /// The item that unloaded.
        item: ItemId,
    },
    /// The given discrete states are now included for the item.
    StatesActivated {
        /// The item whose states changed.
        item: ItemId,
        /// The states newly included.
        states: StateSet,
    },
    /// The given discrete states are no longer included for the item.
    StatesDeactivated {
        /// The item whose states changed.
        item: ItemId,
        /// The states newly excluded.
        states: StateSet,
    },
    /// Loaded-item variant of [`Self::StatesActivated`], emitted only when
    /// the item is loaded at the time of the transition.
    StatesActivatedLoaded {
        /// The item whose states changed.
        item: ItemId,
        /// The states newly included.
        states: StateSet,
    },
    /// Loaded-item variant of [`Self::StatesDeactivated`].
    StatesDeactivatedLoaded {
        /// The item whose states changed.
        item: ItemId,
        /// The states newly excluded.
        states: StateSet,
    },
    /// The given effects started running on the item.
    EffectsStarted {
        /// The item the effects run on.
        item: ItemId,
        /// The effects that started.
        effect_ids: Vec<EffectId>,
    },
    /// The given effects stopped running on the item.
    EffectsStopped {
        /// The item the effects run on.
        item: ItemId,
        /// The effects that stopped.
        effect_ids: Vec<EffectId>,
    },
    /// The modified value of each listed attribute on `item` may have
    /// changed; caches for those `(item, attr)` pairs must be invalidated
    /// and override callbacks consulted on next read.
    AttrsValueChanged {
        /// The item whose attributes changed.
        item: ItemId,
        /// The affected attribute ids.
        attrs: Vec<AttrId>,
    },
    /// Masked variant of [`Self::AttrsValueChanged`]: invalidates caches
    /// without notifying override callbacks. Used by override producers to
    /// report changes to their own backing attributes without re-triggering
    /// themselves.
    AttrsValueChangedMasked {
        /// The item whose attributes changed.
        item: ItemId,
        /// The affected attribute ids.
        attrs: Vec<AttrId>,
    },
}

/// A subscriber registered on a [`MessageBus`].
///
/// Implementors receive every published message in registration order and
/// may call back into the bus (via the `bus` argument) to publish further
/// messages; such republication is queued and drained by the outermost
/// `publish`/`publish_bulk` call, never recursively.
pub trait Subscriber {
    /// Handles one message, with the bus available for republication.
    fn handle(&mut self, msg: &Message, bus: &mut MessageBus);
}

/// Synchronous, reentrancy-safe publish/subscribe bus owned by a [`crate::fit::Fit`].
#[derive(Default)]
pub struct MessageBus {
    subscribers: Vec<Rc<RefCell<dyn Subscriber>>>,
    queue: VecDeque<Message>,
    draining: bool,
}

impl MessageBus {
    /// Creates an empty bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a subscriber. Subscribers are dispatched to in registration
    /// order for every message, for the lifetime of the bus.
    pub fn subscribe(&mut self, subscriber: Rc<RefCell<dyn Subscriber>>) {
        self.subscribers.push(subscriber);
    }

    /// Publishes a single message.
    pub fn publish(&mut self, msg: Message) {
        self.publish_bulk(std::iter::once(msg));
    }

    /// Publishes a batch of messages atomically: no handler for a later
    /// message in the batch runs before all handlers for an earlier message
    /// have completed. Messages published by handlers during the drain are
    /// appended to the same FIFO and drained before this call returns.
    pub fn publish_bulk<I: IntoIterator<Item = Message>>(&mut self, msgs: I) {
        self.queue.extend(msgs);
        if self.draining {
            // Reentrant call from within a handler: just enqueue. The
            // outermost call owns the drain loop.
            return;
        }
        self.draining = true;
        while let Some(msg) = self.queue.pop_front() {
            // Clone the subscriber list so the dispatch loop does not hold
            // a borrow of `self.subscribers` while handlers mutate `self`
            // (e.g. by republishing).
            let subscribers = self.subscribers.clone();
            for subscriber in &subscribers {
                subscriber.borrow_mut().handle(&msg, self);
            }
        }
        self.draining = false;
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, MessageBus, Subscriber};
    use crate::ident::ItemId;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        seen: Vec<String>,
    }

    impl Subscriber for Recorder {
        fn handle(&mut self, msg: &Message, bus: &mut MessageBus) {
            if let Message::ItemLoaded { item } = msg {
                self.seen.push(format!("loaded:{item}"));
                if item.value() == 1 {
                    // Republish during drain; must not run before the
                    // current message's handlers finish for all subscribers.
                    bus.publish(Message::ItemLoaded {
                        item: ItemId(2),
                    });
                }
            }
        }
    }

    #[test]
    fn reentrant_publish_drains_in_fifo_order() {
        let recorder = Rc::new(RefCell::new(Recorder { seen: Vec::new() }));
        let mut bus = MessageBus::new();
        bus.subscribe(recorder.clone());
        bus.publish(Message::ItemLoaded { item: ItemId(1) });
        assert_eq!(recorder.borrow().seen, vec!["loaded:1", "loaded:2"]);
    }

    #[test]
    fn publish_bulk_dispatches_all_subscribers_per_message_before_advancing() {
        let order = Rc::new(RefCell::new(Vec::<String>::new()));

        struct Tagged {
            tag: &'static str,
            order: Rc<RefCell<Vec<String>>>,
        }
        impl Subscriber for Tagged {
            fn handle(&mut self, msg: &Message, _bus: &mut MessageBus) {
                if let Message::ItemLoaded { item } = msg {
                    self.order
                        .borrow_mut()
                        .push(format!("{}:{item}", self.tag));
                }
            }
        }

        let mut bus = MessageBus::new();
        bus.subscribe(Rc::new(RefCell::new(Tagged {
            tag: "a",
            order: order.clone(),
        })));
        bus.subscribe(Rc::new(RefCell::new(Tagged {
            tag: "b",
            order: order.clone(),
        })));
        bus.publish_bulk(vec![
            Message::ItemLoaded { item: ItemId(1) },
            Message::ItemLoaded { item: ItemId(2) },
        ]);
        assert_eq!(
            *order.borrow(),
            vec!["a:item#1", "b:item#1", "a:item#2", "b:item#2"]
        );
    }
}

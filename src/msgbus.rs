use crate::{
    debug::Debug,
    mutex::{MainCtx, MainCtxCell},
    ring::Ring,
};

/// Message ids. One namespace for the whole system.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum MsgId {
    ChangeLed = 0,
    Change7Seg = 1,
    KeyPressed = 2,
    KeyReleased = 3,
    NewActualRps = 4,
    NewDemandRps = 5,
    NewRpsKeypad = 6,
    Encoder = 9,
}

/// Message with its payload. The payload type follows from the id.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Message {
    ChangeLed(bool),
    /// Seven segment value: 0-9, `b`, `E` or a blank code.
    Change7Seg(u8),
    KeyPressed(u8),
    KeyReleased(u8),
    NewActualRps(u16),
    NewDemandRps(u16),
    /// Demand from the keypad entry, before the control clamp.
    NewRpsKeypad(u16),
    /// One encoder detent, +1 or -1.
    Encoder(i8),
}

impl Message {
    pub const fn id(&self) -> MsgId {
        match self {
            Self::ChangeLed(_) => MsgId::ChangeLed,
            Self::Change7Seg(_) => MsgId::Change7Seg,
            Self::KeyPressed(_) => MsgId::KeyPressed,
            Self::KeyReleased(_) => MsgId::KeyReleased,
            Self::NewActualRps(_) => MsgId::NewActualRps,
            Self::NewDemandRps(_) => MsgId::NewDemandRps,
            Self::NewRpsKeypad(_) => MsgId::NewRpsKeypad,
            Self::Encoder(_) => MsgId::Encoder,
        }
    }
}

/// Message sink for the task side components.
pub trait Publish {
    fn publish(&self, m: &MainCtx<'_>, msg: Message);
}

/// Subscriber callback. `C` is the context object that owns the bus.
pub type Handler<C> = fn(&MainCtx<'_>, &C, Message);

struct Subscription<C> {
    id: MsgId,
    handler: Handler<C>,
}

impl<C> Clone for Subscription<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Subscription<C> {}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SubscribeError {
    Full,
}

/// Synchronous publish/subscribe dispatcher.
///
/// Subscribers of an id run in subscription order.
/// A message posted from within a handler is queued and delivered after
/// the running dispatch has completed.
pub struct Bus<C, const SUBS: usize, const QUEUE: usize> {
    subs: [MainCtxCell<Option<Subscription<C>>>; SUBS],
    queue: Ring<Message, QUEUE>,
    dispatching: MainCtxCell<bool>,
    drops: MainCtxCell<u16>,
}

impl<C, const SUBS: usize, const QUEUE: usize> Bus<C, SUBS, QUEUE> {
    pub const fn new() -> Self {
        Self {
            subs: [const { MainCtxCell::new(None) }; SUBS],
            queue: Ring::new(),
            dispatching: MainCtxCell::new(false),
            drops: MainCtxCell::new(0),
        }
    }

    pub fn subscribe(
        &self,
        m: &MainCtx<'_>,
        id: MsgId,
        handler: Handler<C>,
    ) -> Result<(), SubscribeError> {
        for sub in &self.subs {
            if sub.get(m).is_none() {
                sub.set(m, Some(Subscription { id, handler }));
                return Ok(());
            }
        }
        Err(SubscribeError::Full)
    }

    pub fn post(&self, m: &MainCtx<'_>, ctx: &C, msg: Message) {
        if self.dispatching.get(m) {
            if !self.queue.insert(m, msg) {
                let drops = self.drops.get(m).saturating_add(1);
                self.drops.set(m, drops);
                Debug::BusDrops.log_u16(drops);
            }
            return;
        }

        self.dispatching.set(m, true);
        self.deliver(m, ctx, msg);
        while let Some(msg) = self.queue.get(m) {
            self.deliver(m, ctx, msg);
        }
        self.dispatching.set(m, false);
    }

    /// Number of messages lost to a full queue.
    pub fn drops(&self, m: &MainCtx<'_>) -> u16 {
        self.drops.get(m)
    }

    fn deliver(&self, m: &MainCtx<'_>, ctx: &C, msg: Message) {
        let id = msg.id();
        for sub in &self.subs {
            match sub.get(m) {
                Some(sub) if sub.id == id => (sub.handler)(m, ctx, msg),
                Some(_) => (),
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use core::cell::{Cell, RefCell};

    struct Ctx {
        bus: Bus<Ctx, 6, 2>,
        trace: RefCell<[(u8, Message); 16]>,
        len: Cell<usize>,
    }

    impl Ctx {
        fn new() -> Self {
            Self {
                bus: Bus::new(),
                trace: RefCell::new([(0, Message::ChangeLed(false)); 16]),
                len: Cell::new(0),
            }
        }

        fn record(&self, who: u8, msg: Message) {
            let len = self.len.get();
            self.trace.borrow_mut()[len] = (who, msg);
            self.len.set(len + 1);
        }

        fn trace(&self) -> std::vec::Vec<(u8, Message)> {
            self.trace.borrow()[..self.len.get()].to_vec()
        }
    }

    fn handler_a(_m: &MainCtx<'_>, ctx: &Ctx, msg: Message) {
        ctx.record(1, msg);
    }

    fn handler_b(_m: &MainCtx<'_>, ctx: &Ctx, msg: Message) {
        ctx.record(2, msg);
    }

    fn handler_c(_m: &MainCtx<'_>, ctx: &Ctx, msg: Message) {
        ctx.record(3, msg);
    }

    fn handler_repost(m: &MainCtx<'_>, ctx: &Ctx, msg: Message) {
        ctx.record(4, msg);
        if let Message::KeyPressed(v) = msg {
            ctx.bus.post(m, ctx, Message::NewDemandRps(v as u16 * 10));
            ctx.bus.post(m, ctx, Message::NewActualRps(v as u16));
        }
    }

    #[test]
    fn test_post_only_reaches_subscribers_of_id() {
        let m = unsafe { MainCtx::new() };
        let ctx = Ctx::new();
        ctx.bus.subscribe(&m, MsgId::NewActualRps, handler_a).unwrap();
        ctx.bus.subscribe(&m, MsgId::NewDemandRps, handler_b).unwrap();
        ctx.bus.subscribe(&m, MsgId::NewActualRps, handler_c).unwrap();

        ctx.bus.post(&m, &ctx, Message::NewActualRps(77));
        assert_eq!(
            ctx.trace(),
            [(1, Message::NewActualRps(77)), (3, Message::NewActualRps(77))]
        );
    }

    #[test]
    fn test_post_without_subscribers() {
        let m = unsafe { MainCtx::new() };
        let ctx = Ctx::new();
        ctx.bus.subscribe(&m, MsgId::NewActualRps, handler_a).unwrap();
        ctx.bus.post(&m, &ctx, Message::Encoder(1));
        assert!(ctx.trace().is_empty());
    }

    #[test]
    fn test_subscribe_full() {
        let m = unsafe { MainCtx::new() };
        let ctx = Ctx::new();
        for _ in 0..6 {
            assert_eq!(ctx.bus.subscribe(&m, MsgId::Encoder, handler_a), Ok(()));
        }
        assert_eq!(
            ctx.bus.subscribe(&m, MsgId::Encoder, handler_a),
            Err(SubscribeError::Full)
        );
    }

    #[test]
    fn test_nested_post_is_deferred() {
        let m = unsafe { MainCtx::new() };
        let ctx = Ctx::new();
        ctx.bus.subscribe(&m, MsgId::KeyPressed, handler_repost).unwrap();
        ctx.bus.subscribe(&m, MsgId::KeyPressed, handler_a).unwrap();
        ctx.bus.subscribe(&m, MsgId::NewDemandRps, handler_b).unwrap();
        ctx.bus.subscribe(&m, MsgId::NewActualRps, handler_c).unwrap();

        ctx.bus.post(&m, &ctx, Message::KeyPressed(5));
        assert_eq!(
            ctx.trace(),
            [
                (4, Message::KeyPressed(5)),
                (1, Message::KeyPressed(5)),
                (2, Message::NewDemandRps(50)),
                (3, Message::NewActualRps(5)),
            ]
        );
        assert_eq!(ctx.bus.drops(&m), 0);
    }

    fn handler_flood(m: &MainCtx<'_>, ctx: &Ctx, msg: Message) {
        ctx.record(5, msg);
        for i in 0..3 {
            ctx.bus.post(m, ctx, Message::NewActualRps(i));
        }
    }

    #[test]
    fn test_queue_overflow_drops() {
        let m = unsafe { MainCtx::new() };
        let ctx = Ctx::new();
        ctx.bus.subscribe(&m, MsgId::Encoder, handler_flood).unwrap();
        ctx.bus.subscribe(&m, MsgId::NewActualRps, handler_a).unwrap();

        ctx.bus.post(&m, &ctx, Message::Encoder(-1));
        assert_eq!(
            ctx.trace(),
            [
                (5, Message::Encoder(-1)),
                (1, Message::NewActualRps(0)),
                (1, Message::NewActualRps(1)),
            ]
        );
        assert_eq!(ctx.bus.drops(&m), 1);
    }

    #[test]
    fn test_message_ids() {
        assert_eq!(Message::ChangeLed(true).id() as u8, 0);
        assert_eq!(Message::Change7Seg(3).id() as u8, 1);
        assert_eq!(Message::KeyPressed(3).id() as u8, 2);
        assert_eq!(Message::KeyReleased(3).id() as u8, 3);
        assert_eq!(Message::NewActualRps(3).id() as u8, 4);
        assert_eq!(Message::NewDemandRps(3).id() as u8, 5);
        assert_eq!(Message::NewRpsKeypad(3).id() as u8, 6);
        assert_eq!(Message::Encoder(-1).id() as u8, 9);
    }
}

// vim: ts=4 sw=4 expandtab

use crate::{
    control::Control,
    display::Display,
    encoder::Encoder,
    keypad::Keypad,
    msgbus::{Bus, Handler, Message, MsgId, Publish},
    mutex::{IrqCtx, MainCtx, unwrap_result},
    periph::Board,
    pinchange::{PIN_ENC_B, PinChange},
    sseg::sseg_show,
    tacho::Tacho,
    timer::Timestamp,
};

const NR_SUBS: usize = 8;
const QUEUE_LEN: usize = 8;

type SysBus<B> = Bus<System<B>, NR_SUBS, QUEUE_LEN>;

pub struct System<B: Board> {
    board: B,
    bus: SysBus<B>,
    pinchange: PinChange,
    tacho: Tacho<B::SampleIrq>,
    encoder: Encoder<B::PinChangeIrq>,
    control: Control<B::SampleIrq>,
    keypad: Keypad,
    display: Display,
}

fn led_handler<B: Board>(m: &MainCtx<'_>, s: &System<B>, msg: Message) {
    if let Message::ChangeLed(on) = msg {
        s.board.set_led(m, on);
    }
}

fn sseg_handler<B: Board>(m: &MainCtx<'_>, s: &System<B>, msg: Message) {
    if let Message::Change7Seg(value) = msg {
        sseg_show(m, &s.board, value);
    }
}

fn key_pressed_handler<B: Board>(m: &MainCtx<'_>, s: &System<B>, msg: Message) {
    if let Message::KeyPressed(value) = msg {
        s.display.on_key_pressed(m, &s.board, value);
    }
}

fn actual_rps_handler<B: Board>(m: &MainCtx<'_>, s: &System<B>, msg: Message) {
    if let Message::NewActualRps(rps) = msg {
        s.display.on_actual_rps(m, &s.board, rps);
    }
}

fn demand_rps_handler<B: Board>(m: &MainCtx<'_>, s: &System<B>, msg: Message) {
    if let Message::NewDemandRps(rps) = msg {
        s.display.on_demand_rps(m, &s.board, rps);
    }
}

fn keypad_rps_handler<B: Board>(m: &MainCtx<'_>, s: &System<B>, msg: Message) {
    if let Message::NewRpsKeypad(rps) = msg {
        s.control.on_keypad_rps(m, s, rps);
    }
}

fn encoder_handler<B: Board>(m: &MainCtx<'_>, s: &System<B>, msg: Message) {
    if let Message::Encoder(delta) = msg {
        s.control.on_encoder(m, s, delta);
    }
}

impl<B: Board> System<B> {
    pub const fn new(board: B) -> Self {
        Self {
            board,
            bus: Bus::new(),
            pinchange: PinChange::new(),
            tacho: Tacho::new(),
            encoder: Encoder::new(),
            control: Control::new(),
            keypad: Keypad::new(),
            display: Display::new(),
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    /// Subscribe all handlers and bring up the screens.
    /// Must run before the interrupts are enabled.
    pub fn init(&self, m: &MainCtx<'_>, now: Timestamp) {
        let subs: [(MsgId, Handler<Self>); 7] = [
            (MsgId::ChangeLed, led_handler::<B>),
            (MsgId::Change7Seg, sseg_handler::<B>),
            (MsgId::KeyPressed, key_pressed_handler::<B>),
            (MsgId::NewActualRps, actual_rps_handler::<B>),
            (MsgId::NewDemandRps, demand_rps_handler::<B>),
            (MsgId::NewRpsKeypad, keypad_rps_handler::<B>),
            (MsgId::Encoder, encoder_handler::<B>),
        ];
        for (id, handler) in subs {
            unwrap_result(self.bus.subscribe(m, id, handler));
        }

        self.display.init(m, &self.board);
        self.control.init(m, self, now);
    }

    /// One pass of the main loop.
    pub fn run(&self, m: &MainCtx<'_>, now: Timestamp) {
        self.encoder.run(m, self);
        self.control.run(m, self, now, self.tacho.display_rps(m));
        self.keypad.run(m, self, &self.board, now);
        self.display.run(m, self, &self.board, now);
    }

    /// Pin change interrupt of the tachometer and encoder lines.
    pub fn irq_pinchange(&self, c: &IrqCtx<'_>, pins: u8) {
        let edges = self.pinchange.sample(c, pins);
        if edges.tacho() {
            self.tacho.pulse(c);
        }
        if edges.encoder() {
            self.encoder.edge(c, pins & PIN_ENC_B != 0);
        }
    }

    /// Sample timer interrupt.
    pub fn irq_sample(&self, c: &IrqCtx<'_>) {
        let rate = self.tacho.sample(c);
        let duty = self.control.sample(c, rate);
        self.board.write_duty(c, duty);
    }
}

impl<B: Board> Publish for System<B> {
    fn publish(&self, m: &MainCtx<'_>, msg: Message) {
        self.bus.post(m, self, msg);
    }
}


// vim: ts=4 sw=4 expandtab

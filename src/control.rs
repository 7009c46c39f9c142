// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::{
    debug::Debug,
    fixpt::{Fixpt, fixpt},
    msgbus::{Message, Publish},
    mutex::{IrqCtx, IrqGuardedCell, IrqSource, MainCtx, MainCtxCell},
    pi::{Pi, PiParams, duty},
    timer::{RelTimestamp, SwTimer, Timestamp},
};

pub const RPS_MIN: u16 = 20;
pub const RPS_MAX: u16 = 300;

const PI_PARAMS: PiParams = PiParams {
    a1: fixpt!(4 / 100),
    a0: fixpt!(1 / 100),
};

const LED_PERIOD: RelTimestamp = RelTimestamp::from_millis(750);
const REPORT_PERIOD: RelTimestamp = RelTimestamp::from_millis(250);

pub fn clamp_rps(rps: i32) -> u16 {
    rps.clamp(RPS_MIN.into(), RPS_MAX.into()) as u16
}

/// Motor speed control.
///
/// `S` is the sample timer interrupt. The demand speed is handed over to it
/// through an [IrqGuardedCell], so a demand update only masks that one source.
pub struct Control<S> {
    /// Demand speed as seen by the sample interrupt.
    demand: IrqGuardedCell<u16, S>,
    /// Main context copy of the demand speed.
    demand_main: MainCtxCell<u16>,
    pi: Pi,
    /// Last actuator duty cycle, for the debug channel.
    duty: IrqGuardedCell<u8, S>,
    led: MainCtxCell<bool>,
    led_timer: SwTimer,
    report_timer: SwTimer,
}

impl<S: IrqSource> Control<S> {
    pub const fn new() -> Self {
        Self {
            demand: IrqGuardedCell::new(RPS_MIN),
            demand_main: MainCtxCell::new(RPS_MIN),
            pi: Pi::new(),
            duty: IrqGuardedCell::new(0),
            led: MainCtxCell::new(false),
            led_timer: SwTimer::new(LED_PERIOD),
            report_timer: SwTimer::new(REPORT_PERIOD),
        }
    }

    pub fn init(&self, m: &MainCtx<'_>, out: &impl Publish, now: Timestamp) {
        self.led_timer.set(m, now);
        self.report_timer.set(m, now);
        self.write_demand(m, out, self.demand_main.get(m));
    }

    /// Control task. `actual_rps` is the display path speed estimate.
    pub fn run(&self, m: &MainCtx<'_>, out: &impl Publish, now: Timestamp, actual_rps: u16) {
        if self.led_timer.is_expired(m, now) {
            let led = !self.led.get(m);
            self.led.set(m, led);
            out.publish(m, Message::ChangeLed(led));
            self.led_timer.set(m, now);
        }

        if self.report_timer.is_expired(m, now) {
            Debug::ActualRps.log_u16(actual_rps);
            Debug::PiOutput.log_u8(self.duty.read(m));
            out.publish(m, Message::NewActualRps(actual_rps));
            self.report_timer.set(m, now);
        }
    }

    /// Encoder tick handler.
    pub fn on_encoder(&self, m: &MainCtx<'_>, out: &impl Publish, delta: i8) {
        let rps = clamp_rps(i32::from(self.demand_main.get(m)) + i32::from(delta));
        self.write_demand(m, out, rps);
    }

    /// Handler of a validated keypad entry.
    pub fn on_keypad_rps(&self, m: &MainCtx<'_>, out: &impl Publish, rps: u16) {
        self.write_demand(m, out, clamp_rps(rps.into()));
    }

    fn write_demand(&self, m: &MainCtx<'_>, out: &impl Publish, rps: u16) {
        self.demand_main.set(m, rps);
        out.publish(m, Message::NewDemandRps(rps));
        self.demand.write(m, rps);
        Debug::DemandRps.log_u16(rps);
    }

    pub fn demand(&self, m: &MainCtx<'_>) -> u16 {
        self.demand_main.get(m)
    }

    /// Duty cycle of the last controller step.
    pub fn duty(&self, m: &MainCtx<'_>) -> u8 {
        self.duty.read(m)
    }

    /// One controller step. Sample timer interrupt.
    ///
    /// Returns the actuator duty cycle.
    pub fn sample(&self, c: &IrqCtx<'_>, rate: Fixpt) -> u8 {
        let sp = Fixpt::from(self.demand.get_irq(c));
        let y = self.pi.run(c, &PI_PARAMS, sp, rate);
        let duty = duty(y);
        self.duty.set_irq(c, duty);
        duty
    }
}


// vim: ts=4 sw=4 expandtab

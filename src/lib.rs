#![no_std]

#[cfg(test)]
extern crate std;

pub mod control;
pub mod debug;
pub mod display;
pub mod encoder;
pub mod fixpt;
pub mod keypad;
pub mod msgbus;
pub mod mutex;
pub mod periph;
pub mod pi;
pub mod pinchange;
pub mod ring;
pub mod sseg;
pub mod system;
pub mod tacho;
pub mod timer;

#[cfg(target_arch = "avr")]
pub mod board;
#[cfg(target_arch = "avr")]
pub mod hw;
#[cfg(target_arch = "avr")]
pub mod ports;
#[cfg(target_arch = "avr")]
pub mod systick;
#[cfg(target_arch = "avr")]
pub mod twi;
#[cfg(all(target_arch = "avr", feature = "debug"))]
pub mod usart;

#[cfg(test)]
mod testutil;

// vim: ts=4 sw=4 expandtab

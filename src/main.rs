#![cfg_attr(target_arch = "avr", no_std)]
#![cfg_attr(target_arch = "avr", no_main)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]
#![cfg_attr(target_arch = "avr", feature(asm_experimental_arch))]

#[cfg(target_arch = "avr")]
mod firmware {
    use rpsctl::{
        board::AvrBoard,
        hw::{DP, Dp, Peripherals, interrupt},
        mutex::{IrqCtx, MainCtx, reset_system, unwrap_option},
        ports::{pinc_read, ports_init},
        system::System,
        systick::{irq_handler_tick, systick_init, timer_get},
        twi::twi_init,
    };

    static SYSTEM: System<AvrBoard> = System::new(AvrBoard::new());

    macro_rules! define_isr {
        ($name:ident, $handler:expr) => {
            #[avr_device::interrupt(atmega328p)]
            fn $name() {
                // SAFETY: We are inside of an interrupt handler.
                // Therefore, it is safe to construct an `IrqCtx`.
                let c = unsafe { IrqCtx::new() };
                $handler(&c);
            }
        };
    }

    fn irq_handler_pinchange(c: &IrqCtx<'_>) {
        #[cfg(feature = "timing-pin")]
        timing_pin(c, true);

        SYSTEM.irq_pinchange(c, pinc_read(&c.to_any()));

        #[cfg(feature = "timing-pin")]
        timing_pin(c, false);
    }

    #[cfg(feature = "timing-pin")]
    #[inline(always)]
    fn timing_pin(c: &IrqCtx<'_>, high: bool) {
        use rpsctl::ports::{PD_TIMING, portd_set};
        portd_set(&c.to_any(), PD_TIMING, high);
    }

    fn irq_handler_sample(c: &IrqCtx<'_>) {
        SYSTEM.irq_sample(c);
    }

    define_isr!(PCINT1, irq_handler_pinchange);
    define_isr!(TIMER1_COMPA, irq_handler_sample);
    define_isr!(TIMER2_COMPA, irq_handler_tick);
    #[cfg(feature = "debug")]
    define_isr!(USART_TX, rpsctl::usart::irq_handler_tx);

    fn wdt_init() {
        // SAFETY: The asm code only accesses the WDT registers
        //         which are not accessed from anywhere else in the program.
        //         Interrupts are still disabled, so the timed sequence holds.
        unsafe {
            // Enable WDT with timeout 250 ms
            core::arch::asm!(
                "wdr",
                "ldi {tmp}, 0x18", // WDCE=1, WDE=1
                "sts {WDTCSR}, {tmp}",
                "ldi {tmp}, 0x0C", // WDE=1, WDP2=1, WDP1=0, WDP0=0
                "sts {WDTCSR}, {tmp}",
                tmp = out(reg_upper) _,
                WDTCSR = const 0x60,
                options(nostack, preserves_flags)
            );
        }
    }

    #[avr_device::entry]
    fn main() -> ! {
        wdt_init();

        let dp = unwrap_option(Peripherals::take());

        let hwp = Dp {
            TC0: dp.TC0,
            TC1: dp.TC1,
            TC2: dp.TC2,
            EXINT: dp.EXINT,
            PORTB: dp.PORTB,
            PORTC: dp.PORTC,
            PORTD: dp.PORTD,
            TWI: dp.TWI,
            USART0: dp.USART0,
        };

        let init_static_vars = |ctx| {
            DP.init(ctx, hwp);
        };

        // # SAFETY
        //
        // This is the context handle for the main() function.
        // Holding a reference to this object proves that the holder
        // is running in main() context.
        let m = unsafe { MainCtx::new_with_init(init_static_vars) };

        ports_init(&m);
        twi_init(&m);
        systick_init(&m);
        SYSTEM.board().init(&m);
        SYSTEM.init(&m, timer_get(&m));
        #[cfg(feature = "debug")]
        rpsctl::usart::usart_init(&m);

        // SAFETY: This must be after construction of MainCtx
        //         and after initialization of static MainInit variables.
        unsafe { interrupt::enable() };

        loop {
            SYSTEM.run(&m, timer_get(&m));
            avr_device::asm::wdr();
        }
    }

    #[inline(always)]
    #[panic_handler]
    fn panic(_: &core::panic::PanicInfo) -> ! {
        reset_system();
    }
}

#[cfg(not(target_arch = "avr"))]
fn main() {}

// vim: ts=4 sw=4 expandtab

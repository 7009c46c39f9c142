// -*- coding: utf-8 -*-
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::{
    cell::{Cell, UnsafeCell},
    marker::PhantomData,
    mem::MaybeUninit,
};

pub use critical_section::{CriticalSection, Mutex};

macro_rules! define_context {
    ($name:ident) => {
        pub struct $name<'cs>(CriticalSection<'cs>);

        impl<'cs> $name<'cs> {
            /// Create a new context.
            ///
            /// # SAFETY
            ///
            /// This may only be called from the corresponding context.
            /// `MainCtx` may only be constructed from `main()`
            /// and `IrqCtx` may only be constructed from ISRs.
            #[inline(always)]
            pub unsafe fn new() -> Self {
                // SAFETY: This cs is only used to unlock the cells of this module.
                //         The IRQ safety is upheld by the context machinery instead:
                //         A `MainCtxCell` can only be accessed with a `MainCtx` and
                //         an `IrqCtxCell` can only be accessed with an `IrqCtx`.
                //         Cells shared between both contexts are `IrqGuardedCell`s,
                //         which mask their interrupt source on main context access.
                //         With this mechanism the main context runs with IRQs enabled.
                let cs = unsafe { CriticalSection::new() };
                fence();
                Self(cs)
            }

            /// Get the `CriticalSection` that belongs to this context.
            #[inline(always)]
            pub fn cs(&self) -> CriticalSection<'cs> {
                self.0
            }

            /// Convert this to a generic context.
            #[inline(always)]
            pub fn to_any(&self) -> AnyCtx {
                AnyCtx(())
            }
        }

        impl<'cs> Drop for $name<'cs> {
            #[inline(always)]
            fn drop(&mut self) {
                fence();
            }
        }
    };
}

define_context!(MainCtx);
define_context!(IrqCtx);

/// Main context initialization marker.
///
/// This marker does not have a pub constructor.
/// It is only created by [MainCtx::new_with_init].
pub struct MainInitCtx(());

impl<'cs> MainCtx<'cs> {
    /// # SAFETY
    ///
    /// The safety contract of [MainCtx::new] must be upheld.
    /// Interrupts must be disabled.
    #[inline(always)]
    pub unsafe fn new_with_init<F: FnOnce(&MainInitCtx)>(f: F) -> Self {
        f(&MainInitCtx(()));
        // SAFETY: Safety contract of MainCtx::new is upheld by the caller.
        unsafe { Self::new() }
    }
}

/// Generic context.
///
/// Only obtainable from a [MainCtx] or an [IrqCtx].
/// Holding one proves that the [MainInitCtx] phase is over.
pub struct AnyCtx(());

/// Lazy initialization of static variables.
pub struct LazyMainInit<T>(UnsafeCell<MaybeUninit<T>>);

impl<T> LazyMainInit<T> {
    /// # SAFETY
    ///
    /// It must be ensured that the returned instance is initialized
    /// with a call to [Self::init] during construction of the [MainCtx].
    /// See [MainCtx::new_with_init].
    ///
    /// Using this object in any way before initializing it will
    /// result in Undefined Behavior.
    #[inline(always)]
    pub const unsafe fn uninit() -> Self {
        Self(UnsafeCell::new(MaybeUninit::uninit()))
    }

    #[inline(always)]
    pub fn init(&self, _m: &MainInitCtx, inner: T) {
        // SAFETY: There is no concurrent access during the MainInitCtx phase.
        unsafe { *self.0.get() = MaybeUninit::new(inner) };
    }

    #[inline(always)]
    pub fn deref(&self, _a: &AnyCtx) -> &T {
        // SAFETY: the `Self::uninit` safety contract ensures that `Self::init` is called
        //         before any `AnyCtx` can exist.
        unsafe { (*self.0.get()).assume_init_ref() }
    }
}

// SAFETY: If T is Send, then we can Send the whole object. The object only contains T state.
unsafe impl<T: Send> Send for LazyMainInit<T> {}

// SAFETY: After initialization only shared references are handed out.
//         Initialization happens before any other context exists.
unsafe impl<T> Sync for LazyMainInit<T> {}

/// Optimization and reordering fence.
#[inline(always)]
pub fn fence() {
    core::sync::atomic::fence(core::sync::atomic::Ordering::SeqCst);
}

macro_rules! define_ctx_cell {
    ($name:ident, $ctx:ident) => {
        /// Cell that is owned by exactly one execution context.
        pub struct $name<T> {
            inner: Mutex<Cell<T>>,
        }

        impl<T> $name<T> {
            #[inline]
            pub const fn new(inner: T) -> Self {
                Self {
                    inner: Mutex::new(Cell::new(inner)),
                }
            }

            #[inline]
            pub fn replace(&self, c: &$ctx<'_>, inner: T) -> T {
                self.inner.borrow(c.cs()).replace(inner)
            }
        }

        impl<T: Copy> $name<T> {
            #[inline]
            pub fn get(&self, c: &$ctx<'_>) -> T {
                self.inner.borrow(c.cs()).get()
            }

            #[inline]
            pub fn set(&self, c: &$ctx<'_>, inner: T) {
                self.inner.borrow(c.cs()).set(inner);
            }
        }
    };
}

define_ctx_cell!(MainCtxCell, MainCtx);
define_ctx_cell!(IrqCtxCell, IrqCtx);

/// One interrupt source that can be masked individually.
pub trait IrqSource {
    /// Mask the interrupt source.
    fn disable(m: &MainCtx<'_>);

    /// Unmask the interrupt source.
    fn enable(m: &MainCtx<'_>);
}

/// Cell shared between the main context and the ISR of the interrupt source `S`.
///
/// Main context accesses mask `S` for the duration of the access.
/// Global interrupts are never touched.
/// Main context accesses must not be nested.
pub struct IrqGuardedCell<T, S> {
    inner: Mutex<Cell<T>>,
    _src: PhantomData<fn() -> S>,
}

impl<T, S: IrqSource> IrqGuardedCell<T, S> {
    #[inline]
    pub const fn new(inner: T) -> Self {
        Self {
            inner: Mutex::new(Cell::new(inner)),
            _src: PhantomData,
        }
    }

    #[inline]
    fn masked<R>(&self, m: &MainCtx<'_>, f: impl FnOnce(&Cell<T>) -> R) -> R {
        S::disable(m);
        fence();
        let ret = f(self.inner.borrow(m.cs()));
        fence();
        S::enable(m);
        ret
    }

    /// Replace the value from main context.
    #[inline]
    pub fn replace(&self, m: &MainCtx<'_>, inner: T) -> T {
        self.masked(m, |cell| cell.replace(inner))
    }
}

impl<T: Copy, S: IrqSource> IrqGuardedCell<T, S> {
    /// Read the value from main context.
    #[inline]
    pub fn read(&self, m: &MainCtx<'_>) -> T {
        self.masked(m, |cell| cell.get())
    }

    /// Write the value from main context.
    #[inline]
    pub fn write(&self, m: &MainCtx<'_>, inner: T) {
        self.masked(m, |cell| cell.set(inner));
    }

    /// Read the value from interrupt context.
    #[inline]
    pub fn get_irq(&self, c: &IrqCtx<'_>) -> T {
        self.inner.borrow(c.cs()).get()
    }

    /// Write the value from interrupt context.
    #[inline]
    pub fn set_irq(&self, c: &IrqCtx<'_>, inner: T) {
        self.inner.borrow(c.cs()).set(inner);
    }
}

impl<T: Copy + Default, S: IrqSource> IrqGuardedCell<T, S> {
    /// Take the value out from main context and leave the default behind.
    #[inline]
    pub fn take(&self, m: &MainCtx<'_>) -> T {
        self.replace(m, T::default())
    }
}

/// Cheaper Option::unwrap() alternative.
///
/// This is cheaper, because it doesn't call into the panic unwind path.
/// Therefore, it does not impose caller-saves overhead onto the calling function.
#[inline(always)]
pub fn unwrap_option<T>(value: Option<T>) -> T {
    match value {
        Some(value) => value,
        None => reset_system(),
    }
}

/// Cheaper Result::unwrap() alternative.
///
/// This is cheaper, because it doesn't call into the panic unwind path.
/// Therefore, it does not impose caller-saves overhead onto the calling function.
#[inline(always)]
pub fn unwrap_result<T, E>(value: Result<T, E>) -> T {
    match value {
        Ok(value) => value,
        Err(_) => reset_system(),
    }
}

/// Reset the system.
#[inline(always)]
#[allow(clippy::empty_loop)]
pub fn reset_system() -> ! {
    loop {
        // Wait for the watchdog timer to trigger and reset the system.
        // We don't need to disable interrupts here.
        // No interrupt will reset the watchdog timer.
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::thread_local;

    thread_local! {
        static MASKED: Cell<bool> = const { Cell::new(false) };
        static TRANSITIONS: Cell<u8> = const { Cell::new(0) };
    }

    struct TrackedIrq;

    impl IrqSource for TrackedIrq {
        fn disable(_m: &MainCtx<'_>) {
            MASKED.with(|masked| {
                assert!(!masked.get(), "nested masking");
                masked.set(true);
            });
            TRANSITIONS.with(|t| t.set(t.get() + 1));
        }

        fn enable(_m: &MainCtx<'_>) {
            MASKED.with(|masked| {
                assert!(masked.get(), "unmask without mask");
                masked.set(false);
            });
            TRANSITIONS.with(|t| t.set(t.get() + 1));
        }
    }

    fn is_masked() -> bool {
        MASKED.with(|masked| masked.get())
    }

    #[test]
    fn test_main_ctx_cell() {
        let m = unsafe { MainCtx::new() };
        let cell = MainCtxCell::new(5_u16);
        assert_eq!(cell.get(&m), 5);
        cell.set(&m, 7);
        assert_eq!(cell.get(&m), 7);
        assert_eq!(cell.replace(&m, 9), 7);
        assert_eq!(cell.get(&m), 9);
    }

    #[test]
    fn test_guarded_write_masks_source() {
        let m = unsafe { MainCtx::new() };
        let c = unsafe { IrqCtx::new() };
        let cell: IrqGuardedCell<u16, TrackedIrq> = IrqGuardedCell::new(20);

        cell.write(&m, 150);
        assert!(!is_masked());
        assert_eq!(TRANSITIONS.with(|t| t.get()), 2);
        assert_eq!(cell.get_irq(&c), 150);

        let seen = cell.masked(&m, |inner| {
            assert!(is_masked());
            inner.get()
        });
        assert_eq!(seen, 150);
        assert!(!is_masked());
    }

    #[test]
    fn test_guarded_take() {
        let m = unsafe { MainCtx::new() };
        let c = unsafe { IrqCtx::new() };
        let cell: IrqGuardedCell<i8, TrackedIrq> = IrqGuardedCell::new(0);

        cell.set_irq(&c, -3);
        assert_eq!(cell.take(&m), -3);
        assert_eq!(cell.read(&m), 0);
        assert!(!is_masked());
    }

    #[test]
    fn test_lazy_init() {
        static LAZY: LazyMainInit<u32> = unsafe { LazyMainInit::uninit() };
        let m = unsafe {
            MainCtx::new_with_init(|init| {
                LAZY.init(init, 0xC0FFEE);
            })
        };
        assert_eq!(*LAZY.deref(&m.to_any()), 0xC0FFEE);
    }
}

// vim: ts=4 sw=4 expandtab

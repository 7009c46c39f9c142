use crate::mutex::{MainCtx, MainCtxCell};

/// Fixed size FIFO owned by the main context.
pub struct Ring<T, const SIZE: usize> {
    buf: [MainCtxCell<Option<T>>; SIZE],
    wr: MainCtxCell<u8>,
    rd: MainCtxCell<u8>,
}

impl<T, const SIZE: usize> Ring<T, SIZE> {
    const MASK: u8 = (SIZE - 1) as u8;

    pub const fn new() -> Self {
        const {
            assert!(SIZE.is_power_of_two());
            assert!(SIZE <= 128);
        }
        Self {
            buf: [const { MainCtxCell::new(None) }; SIZE],
            wr: MainCtxCell::new(0),
            rd: MainCtxCell::new(0),
        }
    }
}

impl<T: Copy, const SIZE: usize> Ring<T, SIZE> {
    pub fn count(&self, m: &MainCtx<'_>) -> u8 {
        let wr = self.wr.get(m);
        let rd = self.rd.get(m);
        wr.wrapping_sub(rd)
    }

    fn is_full(&self, m: &MainCtx<'_>) -> bool {
        self.count(m) >= SIZE as _
    }

    fn is_empty(&self, m: &MainCtx<'_>) -> bool {
        self.count(m) == 0
    }

    /// Append a value. Returns false, if the ring is full.
    pub fn insert(&self, m: &MainCtx<'_>, value: T) -> bool {
        if self.is_full(m) {
            false
        } else {
            let wr = self.wr.get(m);
            self.buf[(wr & Self::MASK) as usize].set(m, Some(value));
            self.wr.set(m, wr.wrapping_add(1));
            true
        }
    }

    /// Remove the oldest value.
    pub fn get(&self, m: &MainCtx<'_>) -> Option<T> {
        if self.is_empty(m) {
            None
        } else {
            let rd = self.rd.get(m);
            let value = self.buf[(rd & Self::MASK) as usize].replace(m, None);
            self.rd.set(m, rd.wrapping_add(1));
            value
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let m = unsafe { MainCtx::new() };
        let ring: Ring<u16, 4> = Ring::new();

        assert_eq!(ring.get(&m), None);
        assert!(ring.insert(&m, 1));
        assert!(ring.insert(&m, 2));
        assert!(ring.insert(&m, 3));
        assert_eq!(ring.count(&m), 3);
        assert_eq!(ring.get(&m), Some(1));
        assert_eq!(ring.get(&m), Some(2));
        assert_eq!(ring.get(&m), Some(3));
        assert_eq!(ring.get(&m), None);
    }

    #[test]
    fn test_full_and_wrap() {
        let m = unsafe { MainCtx::new() };
        let ring: Ring<u8, 2> = Ring::new();

        for round in 0..300_u16 {
            let v = round as u8;
            assert!(ring.insert(&m, v));
            assert!(ring.insert(&m, v.wrapping_add(1)));
            assert!(!ring.insert(&m, 0xAA));
            assert_eq!(ring.get(&m), Some(v));
            assert_eq!(ring.get(&m), Some(v.wrapping_add(1)));
            assert_eq!(ring.get(&m), None);
        }
    }
}

// vim: ts=4 sw=4 expandtab

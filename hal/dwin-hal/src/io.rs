//! Adapter from `embedded-io` serial drivers
//!
//! Most chip HALs expose their UARTs through `embedded-io`. Wrapping one
//! in [`IoUart`] gives it the non-blocking [`UartRx`]/[`UartTx`] shape the
//! link expects: a read only happens when the driver reports data ready.

use embedded_io::{Read, ReadReady, Write};

use crate::uart::{UartRx, UartTx};

/// `embedded-io` serial port as a link UART
#[derive(Debug)]
pub struct IoUart<T> {
    inner: T,
}

impl<T> IoUart<T> {
    /// Wrap a serial driver
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// Borrow the wrapped driver
    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Recover the wrapped driver
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + ReadReady> UartRx for IoUart<T> {
    type Error = T::Error;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() || !self.inner.read_ready()? {
            return Ok(0);
        }
        self.inner.read(buf)
    }
}

impl<T: Write> UartTx for IoUart<T> {
    type Error = T::Error;

    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_io::ErrorType;

    #[derive(Default)]
    struct Port {
        rx: std::vec::Vec<u8>,
        tx: std::vec::Vec<u8>,
    }

    impl ErrorType for Port {
        type Error = Infallible;
    }

    impl Read for Port {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let n = buf.len().min(self.rx.len());
            buf[..n].copy_from_slice(&self.rx[..n]);
            self.rx.drain(..n);
            Ok(n)
        }
    }

    impl ReadReady for Port {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(!self.rx.is_empty())
        }
    }

    impl Write for Port {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
            self.tx.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn test_read_nothing_when_idle() {
        let mut uart = IoUart::new(Port::default());
        let mut buf = [0u8; 8];
        assert_eq!(uart.read_available(&mut buf), Ok(0));
    }

    #[test]
    fn test_read_drains_pending_bytes() {
        let mut uart = IoUart::new(Port {
            rx: std::vec![0x5A, 0xA5, 0x00],
            ..Port::default()
        });
        let mut buf = [0u8; 8];
        assert_eq!(uart.read_available(&mut buf), Ok(3));
        assert_eq!(&buf[..3], &[0x5A, 0xA5, 0x00]);
        assert_eq!(uart.read_available(&mut buf), Ok(0));
    }

    #[test]
    fn test_write_passes_through() {
        let mut uart = IoUart::new(Port::default());
        uart.write_all(&[1, 2, 3]).unwrap();
        uart.flush().unwrap();
        assert_eq!(uart.into_inner().tx, std::vec![1, 2, 3]);
    }
}

//! Test doubles for the hardware traits the service is generic over.

use core::convert::Infallible;
use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial;

use crate::sampler::AnalogInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockAdcError;

/// Returns canned raw values in a cycle and records every line it was asked for
#[derive(Debug, Default)]
pub struct MockAdc {
    values: Vec<u16>,
    fail_after: Option<usize>,
    pub reads: Vec<u8>,
}

impl MockAdc {
    pub fn with_values(values: &[u16]) -> Self {
        Self {
            values: values.to_vec(),
            ..Default::default()
        }
    }

    pub fn constant(value: u16) -> Self {
        Self::with_values(&[value])
    }

    pub fn failing_after(ok_reads: usize) -> Self {
        Self {
            values: vec![512],
            fail_after: Some(ok_reads),
            reads: Vec::new(),
        }
    }
}

impl AnalogInput for MockAdc {
    type Error = MockAdcError;

    fn read_raw(&mut self, line: u8) -> Result<u16, Self::Error> {
        let n = self.reads.len();
        self.reads.push(line);
        if self.fail_after.is_some_and(|ok| n >= ok) {
            return Err(MockAdcError);
        }
        Ok(self.values[n % self.values.len()])
    }
}

/// Records requested delays instead of sleeping
#[derive(Debug, Default)]
pub struct MockDelay {
    pub delays_ns: Vec<u64>,
}

impl MockDelay {
    pub fn total_ms(&self) -> u64 {
        self.delays_ns.iter().sum::<u64>() / 1_000_000
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_ns.push(ns as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays_ns.push(ms as u64 * 1_000_000);
    }
}

/// In-memory serial port: bytes queued in `rx` are read, writes land in `tx`
#[derive(Debug, Default)]
pub struct MockSerial {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    pub fail_writes: bool,
}

impl MockSerial {
    pub fn with_input(input: &[u8]) -> Self {
        Self {
            rx: input.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn push_input(&mut self, input: &[u8]) {
        self.rx.extend(input);
    }

    pub fn output(&self) -> &str {
        core::str::from_utf8(&self.tx).unwrap()
    }
}

impl serial::ErrorType for MockSerial {
    type Error = serial::ErrorKind;
}

impl serial::Read<u8> for MockSerial {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl serial::Write<u8> for MockSerial {
    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if self.fail_writes {
            return Err(nb::Error::Other(serial::ErrorKind::Other));
        }
        self.tx.push(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}

/// SPI bus that answers each transfer with the next canned frame
#[derive(Debug, Default)]
pub struct MockSpi {
    replies: VecDeque<[u8; 3]>,
    pub sent: Vec<[u8; 3]>,
}

impl MockSpi {
    pub fn replying(frames: &[[u8; 3]]) -> Self {
        Self {
            replies: frames.iter().copied().collect(),
            sent: Vec::new(),
        }
    }
}

impl embedded_hal::spi::ErrorType for MockSpi {
    type Error = Infallible;
}

impl embedded_hal::spi::SpiBus for MockSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut frame = [0u8; 3];
        frame.copy_from_slice(&write[..3]);
        self.transfer_in_place(&mut frame)?;
        read[..3].copy_from_slice(&frame);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut sent = [0u8; 3];
        sent.copy_from_slice(&words[..3]);
        self.sent.push(sent);
        let reply = self.replies.pop_front().unwrap_or([0; 3]);
        words[..3].copy_from_slice(&reply);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Output pin that remembers every level it was driven to
#[derive(Debug, Default)]
pub struct MockPin {
    pub history: Vec<bool>,
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.history.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.history.push(true);
        Ok(())
    }
}

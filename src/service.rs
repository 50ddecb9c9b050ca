use embedded_hal::delay::DelayNs;
use embedded_hal_nb::serial;

use crate::channel::Channel;
use crate::config::ServiceConfig;
use crate::error::Error;
use crate::protocol::{QueryParser, Reply};
use crate::sampler::{self, AnalogInput};

/// The temperature acquisition service.
/// Owns the serial port, the ADC and the delay source and answers `T<n>`
/// queries one at a time from a single polling loop.
pub struct TempSensService<S, A, D> {
    serial: S,
    adc: A,
    delay: D,
    config: ServiceConfig,
    parser: QueryParser,
    idle_polls: u32,
}

impl<S, A, D> TempSensService<S, A, D>
where
    S: serial::Read<u8> + serial::Write<u8>,
    A: AnalogInput,
    D: DelayNs,
{
    pub fn new(serial: S, adc: A, delay: D) -> Self {
        Self::with_config(serial, adc, delay, ServiceConfig::DEFAULT)
    }

    pub fn with_config(serial: S, adc: A, delay: D, config: ServiceConfig) -> Self {
        Self {
            serial,
            adc,
            delay,
            config,
            parser: QueryParser::new(),
            idle_polls: 0,
        }
    }

    pub fn release(self) -> (S, A, D) {
        (self.serial, self.adc, self.delay)
    }

    /// Non-blocking check for a received byte
    /// returns None if nothing is pending
    pub fn poll_input(&mut self) -> Option<u8> {
        match self.serial.read() {
            Ok(byte) => Some(byte),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(_)) => {
                warn!("Serial receive error, byte dropped");
                None
            }
        }
    }

    /// Samples and converts one channel.
    /// Out of range channels get the sentinel without touching the ADC.
    /// param channel: Requested channel index, unvalidated
    pub fn read_channel(&mut self, channel: i32) -> Reply {
        let Some(valid) = Channel::new(channel) else {
            debug!("Channel {} out of range", channel);
            return Reply::Sentinel;
        };

        let line = self.config.channels.line(valid);
        match sampler::average_raw(
            &mut self.adc,
            &mut self.delay,
            line,
            self.config.samples,
            self.config.sample_delay_ms,
        ) {
            Ok(avg) => {
                let celsius = self.config.thermistor.celsius(avg);
                debug!("Channel {}: raw {} -> {} C", channel, avg, celsius);
                Reply::Temperature(celsius)
            }
            // Already logged by the sampler; the host only ever sees the sentinel
            Err(_) => Reply::Sentinel,
        }
    }

    /// Runs one iteration of the dispatch loop.
    /// Reads at most one byte and serves the query it completes, if any.
    /// returns the reply that was written
    pub fn poll(&mut self) -> Result<Option<Reply>, Error> {
        let channel = match self.poll_input() {
            Some(byte) => {
                self.idle_polls = 0;
                self.parser.feed(byte)
            }
            None if self.parser.is_reading() => {
                self.idle_polls += 1;
                if self.idle_polls >= self.config.query_timeout_polls() {
                    self.idle_polls = 0;
                    self.parser.expire()
                } else {
                    self.delay.delay_ms(self.config.idle_poll_ms);
                    None
                }
            }
            None => None,
        };

        let Some(channel) = channel else {
            return Ok(None);
        };

        let reply = self.read_channel(channel);
        self.send(&reply)?;
        Ok(Some(reply))
    }

    /// Serves queries forever
    pub fn dispatch_loop(&mut self) -> ! {
        info!("Waiting for queries");
        loop {
            if let Err(e) = self.poll() {
                error!("Failed to serve query: {}", e);
            }
        }
    }

    fn send(&mut self, reply: &Reply) -> Result<(), Error> {
        let line = reply.encode()?;
        for byte in line.as_bytes() {
            nb::block!(self.serial.write(*byte)).map_err(|_| Error::Serial)?;
        }
        nb::block!(self.serial.flush()).map_err(|_| Error::Serial)
    }
}

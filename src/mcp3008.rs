//! MCP3008 8-channel 10-bit SPI ADC.
//!
//! Each conversion is one 3-byte full-duplex transfer with chip select held
//! low: start bit, single-ended flag plus channel, then a clocking byte. The
//! result comes back in the low two bits of the second byte and the whole
//! third byte.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::channel::CHANNEL_COUNT;
use crate::sampler::AnalogInput;

const START_BIT: u8 = 0x01;
const SINGLE_ENDED: u8 = 0x80;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mcp3008Error<S, P> {
    Spi(S),
    ChipSelect(P),
    /// The MCP3008 only has inputs 0..8
    InvalidLine(u8),
}

pub struct Mcp3008<SPI, CS> {
    spi: SPI,
    cs: CS,
}

impl<SPI, CS> Mcp3008<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    /// Takes ownership of the bus and drives chip select high
    pub fn new(spi: SPI, mut cs: CS) -> Result<Self, Mcp3008Error<SPI::Error, CS::Error>> {
        cs.set_high().map_err(Mcp3008Error::ChipSelect)?;
        Ok(Self { spi, cs })
    }

    pub fn release(self) -> (SPI, CS) {
        (self.spi, self.cs)
    }

    fn convert(&mut self, line: u8) -> Result<u16, Mcp3008Error<SPI::Error, CS::Error>> {
        if line as usize >= CHANNEL_COUNT {
            return Err(Mcp3008Error::InvalidLine(line));
        }

        let mut frame = command(line);
        self.cs.set_low().map_err(Mcp3008Error::ChipSelect)?;
        let transfer = self
            .spi
            .transfer_in_place(&mut frame)
            .and_then(|_| self.spi.flush());
        // Release the chip even if the transfer failed
        self.cs.set_high().map_err(Mcp3008Error::ChipSelect)?;
        transfer.map_err(Mcp3008Error::Spi)?;

        Ok(decode(&frame))
    }
}

impl<SPI, CS> AnalogInput for Mcp3008<SPI, CS>
where
    SPI: SpiBus,
    CS: OutputPin,
{
    type Error = Mcp3008Error<SPI::Error, CS::Error>;

    fn read_raw(&mut self, line: u8) -> Result<u16, Self::Error> {
        self.convert(line)
    }
}

fn command(line: u8) -> [u8; 3] {
    [START_BIT, SINGLE_ENDED | (line << 4), 0x00]
}

fn decode(frame: &[u8; 3]) -> u16 {
    (((frame[1] & 0x03) as u16) << 8) | frame[2] as u16
}

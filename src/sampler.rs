//! Raw ADC access and averaging.
//!
//! The service never touches ADC hardware directly; it goes through
//! [`AnalogInput`] so the same averaging runs against the MCP3008 on the
//! board and against mocks in tests.

use embedded_hal::delay::DelayNs;

use crate::error::Error;

/// Largest value a 10-bit ADC can return
pub const RAW_MAX: u16 = 1023;

/// Port for single-ended analog reads
pub trait AnalogInput {
    type Error: core::fmt::Debug;

    /// Reads one raw sample from an input line
    fn read_raw(&mut self, line: u8) -> Result<u16, Self::Error>;
}

/// Takes `samples` raw reads from one line, each followed by a settling delay, and averages them.
/// param adc: ADC instance
/// param delay: Delay instance
/// param line: Physical input line
/// param samples: Number of raw reads
/// param delay_ms: Settling delay after each read
/// returns the mean raw value
pub fn average_raw<A: AnalogInput, D: DelayNs>(
    adc: &mut A,
    delay: &mut D,
    line: u8,
    samples: u8,
    delay_ms: u32,
) -> Result<f32, Error> {
    let samples = samples.max(1);
    let mut sum: u32 = 0;

    for _ in 0..samples {
        let raw = adc.read_raw(line).map_err(|_| {
            error!("ADC read failed on line {}", line);
            Error::Adc
        })?;
        if raw > RAW_MAX {
            error!("Raw value {} on line {} exceeds 10 bits", raw, line);
            return Err(Error::RawOutOfRange(raw));
        }
        sum += raw as u32;
        delay.delay_ms(delay_ms);
    }

    let avg = sum as f32 / samples as f32;
    trace!("Line {} averaged {} over {} samples", line, avg, samples);
    Ok(avg)
}

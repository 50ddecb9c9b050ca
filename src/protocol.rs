//! Wire protocol: `T<n>` queries in, two-decimal ASCII lines out.
//!
//! Requests carry no separator, so `T0T1` is two queries. A query is finished
//! by the first byte that is not part of the number, or by the service when
//! the line goes quiet for the query timeout.

use heapless::String;
use ufmt::uwrite;

use crate::error::Error;

/// Byte that opens every query
pub const QUERY_DELIMITER: u8 = b'T';

/// Maximum encoded reply length, newline included
pub const REPLY_CAPACITY: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum State {
    Idle,
    ReadingChannel {
        negative: bool,
        value: Option<i32>,
    },
}

/// Two-state query parser, fed one byte at a time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueryParser {
    state: State,
}

impl QueryParser {
    pub const fn new() -> Self {
        Self { state: State::Idle }
    }

    /// If a delimiter has been seen and the query is not yet complete
    pub fn is_reading(&self) -> bool {
        matches!(self.state, State::ReadingChannel { .. })
    }

    /// Feeds one received byte
    /// returns the requested channel index when this byte completed a query
    pub fn feed(&mut self, byte: u8) -> Option<i32> {
        match self.state {
            State::Idle => {
                if byte == QUERY_DELIMITER {
                    self.state = Self::open();
                } else {
                    trace!("Ignoring byte {} outside a query", byte);
                }
                None
            }
            State::ReadingChannel { negative, value } => match byte {
                b'0'..=b'9' => {
                    let digit = (byte - b'0') as i32;
                    let value = value
                        .unwrap_or(0)
                        .saturating_mul(10)
                        .saturating_add(digit);
                    self.state = State::ReadingChannel {
                        negative,
                        value: Some(value),
                    };
                    None
                }
                b'-' if !negative && value.is_none() => {
                    self.state = State::ReadingChannel {
                        negative: true,
                        value: None,
                    };
                    None
                }
                _ => {
                    let channel = self.finish();
                    if byte == QUERY_DELIMITER {
                        self.state = Self::open();
                    }
                    channel
                }
            },
        }
    }

    /// Completes a pending query because no more bytes arrived
    /// returns the requested channel index if the query held any digits
    pub fn expire(&mut self) -> Option<i32> {
        self.finish()
    }

    fn open() -> State {
        State::ReadingChannel {
            negative: false,
            value: None,
        }
    }

    fn finish(&mut self) -> Option<i32> {
        let state = core::mem::replace(&mut self.state, State::Idle);
        match state {
            State::ReadingChannel {
                negative,
                value: Some(value),
            } => Some(if negative { -value } else { value }),
            State::ReadingChannel { value: None, .. } => {
                debug!("Dropping query without a channel number");
                None
            }
            State::Idle => None,
        }
    }
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Answer to a single query
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Temperature in Celsius
    Temperature(f32),
    /// Channel out of range or the channel could not be read
    Sentinel,
}

impl Reply {
    pub const SENTINEL_VALUE: f32 = 999.0;

    /// Numeric value as the host will parse it
    pub fn value(&self) -> f32 {
        match self {
            Reply::Temperature(t) => *t,
            Reply::Sentinel => Self::SENTINEL_VALUE,
        }
    }

    /// Formats the reply with two decimals and a trailing newline
    pub fn encode(&self) -> Result<String<REPLY_CAPACITY>, Error> {
        let mut line: String<REPLY_CAPACITY> = String::new();
        write_fixed2(&mut line, self.value())?;
        line.push('\n').map_err(|_| Error::Format)?;
        Ok(line)
    }
}

/// Writes a value with exactly two decimal places
/// NOTE: Values beyond +/-21 million are clamped by the i32 conversion
fn write_fixed2<const N: usize>(out: &mut String<N>, value: f32) -> Result<(), Error> {
    let centi = libm::roundf(value * 100.0) as i32;
    let magnitude = centi.unsigned_abs();

    if centi < 0 {
        out.push('-').map_err(|_| Error::Format)?;
    }
    uwrite!(
        out,
        "{}.{}",
        magnitude / 100,
        pad_number((magnitude % 100) as u8).as_str()
    )
    .map_err(|_| Error::Format)
}

/// Pads a number with a zero before it if < 10
/// NOTE: Only supports values <100
/// param num: number to be padded
/// returns: String with formatted value
fn pad_number(num: u8) -> String<2> {
    let mut padded = String::new();
    if num < 10 {
        let _ = uwrite!(padded, "0{}", num);
    } else {
        let _ = uwrite!(padded, "{}", num);
    }
    padded
}

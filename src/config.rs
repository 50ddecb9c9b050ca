use crate::channel::ChannelMap;
use crate::thermistor::Thermistor;

pub const BAUD_RATE: u32 = 9600;
pub const SAMPLE_COUNT: u8 = 5;
pub const SAMPLE_DELAY_MS: u32 = 10; // settling time between raw reads
pub const QUERY_TIMEOUT_MS: u32 = 1000; // a half-received query gives up after this
pub const IDLE_POLL_MS: u32 = 1;

/// ServiceConfig holds the wiring and timing of the board, fixed at startup.
/// thermistor: Divider and thermistor parameters shared by all channels
/// channels: Logical channel to ADC input line mapping
/// samples: Raw reads averaged per query
/// sample_delay_ms: Settling delay after each raw read
/// query_timeout_ms: How long a half-received query may stay idle before it completes
/// idle_poll_ms: Delay per empty poll while a query is pending
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceConfig {
    pub thermistor: Thermistor,
    pub channels: ChannelMap,
    pub samples: u8,
    pub sample_delay_ms: u32,
    pub query_timeout_ms: u32,
    pub idle_poll_ms: u32,
}

impl ServiceConfig {
    pub const DEFAULT: Self = Self {
        thermistor: Thermistor::NTC_10K_3950,
        channels: ChannelMap::IDENTITY,
        samples: SAMPLE_COUNT,
        sample_delay_ms: SAMPLE_DELAY_MS,
        query_timeout_ms: QUERY_TIMEOUT_MS,
        idle_poll_ms: IDLE_POLL_MS,
    };

    /// Number of consecutive empty polls after which a pending query completes
    pub fn query_timeout_polls(&self) -> u32 {
        (self.query_timeout_ms / self.idle_poll_ms.max(1)).max(1)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Number of thermistor channels on the board
pub const CHANNEL_COUNT: usize = 8;

/// A validated thermistor channel in [0, 8)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    /// Validates a requested channel index
    /// Returns None for anything outside [0, 8)
    pub fn new(index: i32) -> Option<Channel> {
        if (0..CHANNEL_COUNT as i32).contains(&index) {
            Some(Channel(index as u8))
        } else {
            None
        }
    }

    pub const fn index(&self) -> u8 {
        self.0
    }
}

/// Maps each logical channel to the physical input line it is wired to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap {
    lines: [u8; CHANNEL_COUNT],
}

impl ChannelMap {
    /// Channel n is wired to input line n
    pub const IDENTITY: Self = Self {
        lines: [0, 1, 2, 3, 4, 5, 6, 7],
    };

    pub const fn new(lines: [u8; CHANNEL_COUNT]) -> Self {
        Self { lines }
    }

    /// Gets the input line for a channel
    pub fn line(&self, channel: Channel) -> u8 {
        self.lines[channel.index() as usize]
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

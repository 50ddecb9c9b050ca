//! Host side driver for the sensor board.
//!
//! Talks to the board over anything that is `Read + Write` (normally a
//! `serialport` handle with a read timeout). Several channels are requested in
//! one concatenated command and one reply line is read back per channel.

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read, Write};

use crate::protocol::{Reply, QUERY_DELIMITER};

/// Channel index used to check the link; it is always out of range
pub const PROBE_CHANNEL: i32 = 100;

/// Range an NTC thermistor can plausibly report, in Celsius
pub const NTC_LIMITS: (f32, f32) = (-55.0, 125.0);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Serial I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("No reply from the temperature sensor board")]
    NoReply,

    #[error("Unexpected reply to connection probe: {0:?}")]
    UnexpectedProbeReply(String),
}

pub struct TempSensClient<P> {
    port: BufReader<P>,
    ntc_limits: (f32, f32),
    /// Bytes of a reply line that has not been terminated yet
    pending: Vec<u8>,
    /// Reply lines the board still owes for commands already sent
    owed: usize,
}

impl<P: Read + Write> TempSensClient<P> {
    pub fn new(port: P) -> Self {
        Self {
            port: BufReader::new(port),
            ntc_limits: NTC_LIMITS,
            pending: Vec::new(),
            owed: 0,
        }
    }

    /// Overrides the plausible temperature range used for warnings
    pub fn with_ntc_limits(mut self, low: f32, high: f32) -> Self {
        self.ntc_limits = (low, high);
        self
    }

    pub fn into_inner(self) -> P {
        self.port.into_inner()
    }

    /// Checks the board is answering by asking for a channel that does not exist.
    /// A live board replies with the sentinel.
    pub fn probe(&mut self) -> Result<(), Error> {
        self.resync()?;
        self.send(&[PROBE_CHANNEL])?;

        let line = self.read_reply()?.ok_or(Error::NoReply)?;
        self.owed -= 1;
        if parse_reply(&line) == Some(Reply::SENTINEL_VALUE) {
            debug!("Serial connection to temperature sensor board established");
            Ok(())
        } else {
            error!("No valid reply on serial connection to temperature sensor board");
            Err(Error::UnexpectedProbeReply(line))
        }
    }

    /// Reads the temperature of each requested channel.
    /// Channels that time out or report the sentinel are left out of the result.
    /// A timeout ends the batch; its late replies are discarded before the next command.
    /// param channels: Channel indices to query, in order
    /// returns temperatures in Celsius keyed by channel
    pub fn get_temp(&mut self, channels: &[i32]) -> Result<BTreeMap<i32, f32>, Error> {
        let mut temps = BTreeMap::new();
        if channels.is_empty() {
            return Ok(temps);
        }

        self.resync()?;
        self.send(channels)?;

        for &channel in channels {
            let Some(line) = self.read_reply()? else {
                error!("Timeout for reading of temperature sensor {}", channel);
                break;
            };
            self.owed -= 1;

            let value = parse_reply(&line).unwrap_or(Reply::SENTINEL_VALUE);

            if value == Reply::SENTINEL_VALUE {
                error!("Temperature sensor {} could not be read", channel);
                continue;
            }

            let (low, high) = self.ntc_limits;
            if value < low {
                warn!(
                    "Temperature sensor {} reads extremely low temperature ({}). Is the thermistor connected correctly?",
                    channel,
                    value
                );
            } else if value > high {
                warn!(
                    "Temperature sensor {} reads extremely high temperature ({}). Is the thermistor connected correctly?",
                    channel,
                    value
                );
            }

            temps.insert(channel, value);
        }

        Ok(temps)
    }

    fn send(&mut self, channels: &[i32]) -> Result<(), Error> {
        let command = build_command(channels);
        trace!("Sending {} byte query", command.len());

        let port = self.port.get_mut();
        port.write_all(&command)?;
        port.flush()?;
        self.owed += channels.len();
        Ok(())
    }

    /// Reads and drops replies left over from an interrupted batch.
    /// If the board stays silent the leftovers are given up on.
    fn resync(&mut self) -> Result<(), Error> {
        while self.owed > 0 {
            match self.read_reply()? {
                Some(_) => {
                    debug!("Discarding late reply, {} more owed", self.owed - 1);
                    self.owed -= 1;
                }
                None => {
                    warn!("Board never sent {} replies, giving up on them", self.owed);
                    self.owed = 0;
                    self.pending.clear();
                }
            }
        }
        Ok(())
    }

    /// Partial lines are kept across calls so a timeout mid-line is resumed later.
    /// returns None if the port timed out or closed before a full line arrived
    fn read_reply(&mut self) -> Result<Option<String>, Error> {
        match self.port.read_until(b'\n', &mut self.pending) {
            Ok(_) if self.pending.ends_with(b"\n") => {
                let line = String::from_utf8_lossy(&self.pending).trim().to_owned();
                self.pending.clear();
                Ok(Some(line))
            }
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Builds one command for several channels, e.g. `T0T3T7\n`.
/// The newline ends the last query without waiting for the board's timeout.
pub fn build_command(channels: &[i32]) -> Vec<u8> {
    let mut command = Vec::with_capacity(channels.len() * 2 + 1);
    for channel in channels {
        command.push(QUERY_DELIMITER);
        command.extend_from_slice(channel.to_string().as_bytes());
    }
    command.push(b'\n');
    command
}

fn parse_reply(line: &str) -> Option<f32> {
    line.trim().parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    enum Chunk {
        Data(Vec<u8>),
        TimedOut,
    }

    /// Replays canned board output and captures what the client sends
    struct ScriptedPort {
        replies: VecDeque<Chunk>,
        sent: Vec<u8>,
    }

    impl ScriptedPort {
        fn new(replies: &str) -> Self {
            Self::chunks(vec![Chunk::Data(replies.as_bytes().to_vec())])
        }

        fn chunks(replies: Vec<Chunk>) -> Self {
            Self {
                replies: replies.into(),
                sent: Vec::new(),
            }
        }
    }

    impl Read for ScriptedPort {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.replies.pop_front() {
                Some(Chunk::Data(mut data)) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    if n < data.len() {
                        self.replies.push_front(Chunk::Data(data.split_off(n)));
                    }
                    Ok(n)
                }
                Some(Chunk::TimedOut) => Err(io::ErrorKind::TimedOut.into()),
                None => Ok(0),
            }
        }
    }

    impl Write for ScriptedPort {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.sent.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn command_for_several_channels() {
        assert_eq!(build_command(&[0, 3, 7]), b"T0T3T7\n");
        assert_eq!(build_command(&[100]), b"T100\n");
        assert_eq!(build_command(&[-1]), b"T-1\n");
    }

    #[test]
    fn reads_one_line_per_channel() {
        let mut client = TempSensClient::new(ScriptedPort::new("23.47\r\n19.02\r\n"));

        let temps = client.get_temp(&[2, 5]).unwrap();

        assert_eq!(temps.len(), 2);
        assert_eq!(temps[&2], 23.47);
        assert_eq!(temps[&5], 19.02);
        assert_eq!(client.into_inner().sent, b"T2T5\n");
    }

    #[test]
    fn sentinel_channels_are_dropped() {
        let mut client = TempSensClient::new(ScriptedPort::new("21.50\n999.00\n999\n"));

        let temps = client.get_temp(&[0, 8, 9]).unwrap();

        assert_eq!(temps.into_iter().collect::<Vec<_>>(), vec![(0, 21.5)]);
    }

    #[test]
    fn missing_replies_are_dropped() {
        let mut client = TempSensClient::new(ScriptedPort::new("20.00\n"));

        let temps = client.get_temp(&[1, 2, 3]).unwrap();

        assert_eq!(temps.keys().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn timed_out_reply_does_not_shift_channels() {
        let mut client = TempSensClient::new(ScriptedPort::chunks(vec![
            Chunk::Data(b"23.".to_vec()),
            Chunk::TimedOut,
            Chunk::Data(b"47\n19.00\n".to_vec()),
            Chunk::Data(b"20.00\n21.00\n".to_vec()),
        ]));

        // Board stalls mid-line: nothing is attributed
        assert!(client.get_temp(&[0, 1]).unwrap().is_empty());

        // Late "23.47" and "19.00" belong to the first batch and are skipped
        let temps = client.get_temp(&[0, 1]).unwrap();
        assert_eq!(temps.into_iter().collect::<Vec<_>>(), vec![(0, 20.0), (1, 21.0)]);
        assert_eq!(client.into_inner().sent, b"T0T1\nT0T1\n");
    }

    #[test]
    fn silent_board_is_given_up_on() {
        let mut client = TempSensClient::new(ScriptedPort::chunks(vec![
            Chunk::TimedOut,
            Chunk::TimedOut,
            Chunk::Data(b"999.00\n".to_vec()),
        ]));

        assert!(client.get_temp(&[4]).unwrap().is_empty());
        client.probe().unwrap();

        assert_eq!(client.into_inner().sent, b"T4\nT100\n");
    }

    #[test]
    fn garbage_reply_counts_as_unread() {
        let mut client = TempSensClient::new(ScriptedPort::new("ovf\n22.10\n"));

        let temps = client.get_temp(&[1, 2]).unwrap();

        assert_eq!(temps.keys().copied().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn implausible_values_are_kept() {
        let mut client =
            TempSensClient::new(ScriptedPort::new("-273.15\n130.00\n")).with_ntc_limits(-55.0, 125.0);

        let temps = client.get_temp(&[0, 1]).unwrap();

        assert_eq!(temps[&0], -273.15);
        assert_eq!(temps[&1], 130.0);
    }

    #[test]
    fn no_channels_sends_nothing() {
        let mut client = TempSensClient::new(ScriptedPort::new(""));

        assert!(client.get_temp(&[]).unwrap().is_empty());
        assert!(client.into_inner().sent.is_empty());
    }

    #[test]
    fn link_check_accepts_sentinel() {
        let mut client = TempSensClient::new(ScriptedPort::new("999.00\n"));

        client.probe().unwrap();

        assert_eq!(client.into_inner().sent, b"T100\n");
    }

    #[test]
    fn link_check_without_reply() {
        let mut client = TempSensClient::new(ScriptedPort::new(""));

        assert!(matches!(client.probe(), Err(Error::NoReply)));
    }

    #[test]
    fn link_check_with_wrong_reply() {
        let mut client = TempSensClient::new(ScriptedPort::new("24.00\n"));

        match client.probe() {
            Err(Error::UnexpectedProbeReply(line)) => assert_eq!(line, "24.00"),
            other => panic!("unexpected result {other:?}"),
        }
    }
}

/// Errors raised while serving a query.
/// None of these reach the wire; the service answers with the sentinel instead.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[error("Serial port error")]
    Serial,

    #[error("ADC read failed")]
    Adc,

    #[error("Raw ADC value {0} is outside the 10-bit range")]
    RawOutOfRange(u16),

    #[error("Reply did not fit the output buffer")]
    Format,
}

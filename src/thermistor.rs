use libm::logf;

/// Offset between degrees Celsius and Kelvin
pub const KELVIN_OFFSET: f32 = 273.15;

/// Full scale of the 10-bit ADC
pub const ADC_FULL_SCALE: f32 = 1023.0;

/// Thermistor and voltage divider parameters.
/// r_ref: Fixed resistor in series with the thermistor, in ohms
/// r_nominal: Thermistor resistance at t_nominal_c, in ohms
/// t_nominal_c: Temperature at which r_nominal is specified, in Celsius
/// beta: Beta coefficient of the thermistor
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Thermistor {
    pub r_ref: f32,
    pub r_nominal: f32,
    pub t_nominal_c: f32,
    pub beta: f32,
}

impl Thermistor {
    /// 10k NTC with B=3950 against a 10k reference resistor
    pub const NTC_10K_3950: Self = Self {
        r_ref: 10_000.0,
        r_nominal: 10_000.0,
        t_nominal_c: 25.0,
        beta: 3950.0,
    };

    pub const fn new(r_ref: f32, r_nominal: f32, t_nominal_c: f32, beta: f32) -> Self {
        Self {
            r_ref,
            r_nominal,
            t_nominal_c,
            beta,
        }
    }

    /// Gets the thermistor resistance in ohms
    /// param avg_raw: Averaged ADC reading across the thermistor
    pub fn resistance(&self, avg_raw: f32) -> f32 {
        self.r_ref / (ADC_FULL_SCALE / avg_raw - 1.0)
    }

    /// Gets the temperature in Celsius for a resistance
    /// param resistance: Thermistor resistance in ohms
    pub fn celsius_from_resistance(&self, resistance: f32) -> f32 {
        let inv_t = 1.0 / (self.t_nominal_c + KELVIN_OFFSET)
            + (1.0 / self.beta) * logf(resistance / self.r_nominal);
        1.0 / inv_t - KELVIN_OFFSET
    }

    /// Gets the temperature in Celsius for an averaged ADC reading
    /// param avg_raw: Averaged ADC reading across the thermistor
    pub fn celsius(&self, avg_raw: f32) -> f32 {
        self.celsius_from_resistance(self.resistance(avg_raw))
    }
}

impl Default for Thermistor {
    fn default() -> Self {
        Self::NTC_10K_3950
    }
}

pub(crate) const LIGHTSPEED: f64 = 299_792_458.0;
pub(crate) const MM_TO_M: f64 = 1e-3;
pub(crate) const M_TO_MM: f64 = 1e3;

// Radar front-end defaults for the 77 GHz FMCW board.
pub(crate) const CARRIER_FREQUENCY_HZ: f64 = 77e9;
pub(crate) const CHIRP_RATE_HZ_PER_S: f64 = 63.343e12;
pub(crate) const SAMPLE_RATE_HZ: f64 = 9121e3;
pub(crate) const INSTRUMENT_DELAY_S: f64 = 4.5225e-10;

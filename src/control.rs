//! Declarative get/set bindings for scalar instrument settings.
//!
//! Each setting is described once as a [`Measurement`] (query only) or a
//! [`Control`] (query plus set template) carrying its encode/decode
//! strategy. One generic accessor runs them all, which keeps reply parsing
//! out of the channel and scope methods.

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Placeholder in command templates replaced by the channel id.
const CHANNEL_SLOT: &str = "{ch}";
/// Placeholder in set templates replaced by the encoded value.
const VALUE_SLOT: &str = "{val}";

/// A read-only binding: query command plus reply decoder.
pub(crate) struct Measurement<T> {
    pub query: &'static str,
    pub decode: fn(&str) -> Result<T>,
}

impl<T> Measurement<T> {
    pub fn get(&self, transport: &mut impl Transport, ch: &str) -> Result<T> {
        transport.write_command(&with_channel(self.query, ch))?;
        let reply = transport.read_formatted_string()?;
        (self.decode)(&reply)
    }
}

/// A read/write binding: a [`Measurement`] plus the set template and value
/// encoder. Encoders apply the setting's validation (range truncation,
/// value mapping) before the command is formatted.
pub(crate) struct Control<T> {
    pub read: Measurement<T>,
    pub set: &'static str,
    pub encode: fn(&T) -> String,
}

impl<T> Control<T> {
    pub fn get(&self, transport: &mut impl Transport, ch: &str) -> Result<T> {
        self.read.get(transport, ch)
    }

    pub fn set(&self, transport: &mut impl Transport, ch: &str, value: &T) -> Result<()> {
        let encoded = (self.encode)(value);
        let command = with_channel(self.set, ch).replace(VALUE_SLOT, &encoded);
        transport.write_command(&command)
    }
}

/// Substitute the channel id into a command template.
pub(crate) fn with_channel(template: &str, ch: &str) -> String {
    template.replace(CHANNEL_SLOT, ch)
}

/// Split an instrument reply into its command echo and payload.
///
/// Replies echo the command mnemonic before the value, e.g.
/// `C1:VDIV 2.00E+00V`.
pub(crate) fn payload(reply: &str) -> Result<&str> {
    reply
        .split_once(' ')
        .map(|(_, rest)| rest.trim())
        .ok_or_else(|| Error::MissingDelimiter {
            reply: reply.to_string(),
        })
}

/// Parse a number that carries a trailing unit mnemonic, e.g. `2.00E+00V`
/// or `1.00E-03S`.
pub(crate) fn suffixed_float(text: &str) -> Result<f64> {
    let digits = text.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse().map_err(|_| Error::BadNumber {
        text: text.to_string(),
    })
}

/// Format a value the way the instrument expects numbers: `%.2e` with an
/// explicit two-digit exponent, e.g. `5.00e-01`.
pub(crate) fn scientific(value: f64) -> String {
    let formatted = format!("{value:.2e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.abs())
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_matches_the_wire_convention() {
        assert_eq!(scientific(2.0), "2.00e+00");
        assert_eq!(scientific(0.001), "1.00e-03");
        assert_eq!(scientific(0.5), "5.00e-01");
        assert_eq!(scientific(-0.5), "-5.00e-01");
        assert_eq!(scientific(0.0), "0.00e+00");
        assert_eq!(scientific(50.0), "5.00e+01");
    }

    #[test]
    fn payload_strips_the_command_echo() {
        assert_eq!(payload("C1:VDIV 2.00E+00V").unwrap(), "2.00E+00V");
        assert_eq!(payload("TRSE EDGE,SR,EX,HT,TI,HV,100NS").unwrap(), "EDGE,SR,EX,HT,TI,HV,100NS");
    }

    #[test]
    fn payload_without_delimiter_is_an_error() {
        assert!(matches!(
            payload("SAST"),
            Err(Error::MissingDelimiter { .. })
        ));
    }

    #[test]
    fn suffixed_float_drops_unit_mnemonics() {
        assert_eq!(suffixed_float("2.00E+00V").unwrap(), 2.0);
        assert_eq!(suffixed_float("1.00E-03S").unwrap(), 0.001);
        assert_eq!(suffixed_float("5.00E-01V").unwrap(), 0.5);
    }

    #[test]
    fn suffixed_float_rejects_garbage() {
        assert!(matches!(
            suffixed_float("POS"),
            Err(Error::BadNumber { .. })
        ));
    }
}

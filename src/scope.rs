//! Top-level scope object: transport ownership, channels, timebase and
//! acquisition state.

use crate::channel::{ChannelId, VoltageChannel};
use crate::control::{self, Control, Measurement};
use crate::error::Result;
use crate::transport::{SerialTransport, Transport};
use crate::trigger::{TriggerChannel, TriggerState};

/// Timebase bounds in seconds per division.
const TDIV_RANGE: (f64, f64) = (5e-9, 50.0);

const TIME_DIVISION: Control<f64> = Control {
    read: Measurement {
        query: ":TDIV?",
        decode: decode_seconds,
    },
    set: ":TDIV {val}",
    encode: encode_tdiv,
};

const STATUS: Measurement<String> = Measurement {
    query: "SAST?",
    decode: decode_payload_string,
};

const INTERNAL_STATE: Measurement<String> = Measurement {
    query: "INR?",
    decode: decode_payload_string,
};

const TEMPLATE: Measurement<String> = Measurement {
    query: "TMP?",
    decode: decode_raw_string,
};

fn decode_seconds(reply: &str) -> Result<f64> {
    control::suffixed_float(control::payload(reply)?)
}

fn encode_tdiv(seconds: &f64) -> String {
    format!(
        "{}S",
        control::scientific(seconds.clamp(TDIV_RANGE.0, TDIV_RANGE.1))
    )
}

fn decode_payload_string(reply: &str) -> Result<String> {
    Ok(control::payload(reply)?.to_string())
}

fn decode_raw_string(reply: &str) -> Result<String> {
    Ok(reply.to_string())
}

/// Driver for the SIGLENT SDS1072CML two-channel oscilloscope.
///
/// Owns the transport. All traffic is blocking request/response over a
/// half-duplex link, and the driver assumes it is the transport's only
/// user; the channel and trigger accessors borrow the scope mutably so no
/// two logical operations can interleave.
pub struct Sds1072Cml<T: Transport> {
    transport: T,
    trigger: TriggerState,
}

impl Sds1072Cml<SerialTransport> {
    /// Open the scope on a serial port.
    pub fn open(port: &str, baud_rate: u32) -> Result<Self> {
        Ok(Self::new(SerialTransport::open(port, baud_rate)?))
    }
}

impl<T: Transport> Sds1072Cml<T> {
    /// Build the driver over an already-connected transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            trigger: TriggerState::default(),
        }
    }

    /// Hand the transport back, dropping the driver.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Borrow one of the analog input channels.
    pub fn channel(&mut self, id: ChannelId) -> VoltageChannel<'_, T> {
        VoltageChannel {
            transport: &mut self.transport,
            id,
        }
    }

    pub fn channel_1(&mut self) -> VoltageChannel<'_, T> {
        self.channel(ChannelId::Ch1)
    }

    pub fn channel_2(&mut self) -> VoltageChannel<'_, T> {
        self.channel(ChannelId::Ch2)
    }

    /// Borrow the trigger system.
    pub fn trigger(&mut self) -> TriggerChannel<'_, T> {
        TriggerChannel {
            transport: &mut self.transport,
            state: &mut self.trigger,
        }
    }

    /// Horizontal timebase in seconds per division.
    pub fn time_division(&mut self) -> Result<f64> {
        TIME_DIVISION.get(&mut self.transport, "")
    }

    /// Set the timebase. The instrument rounds to the closest possible
    /// value; requests outside 5 ns..50 s per division are truncated to the
    /// nearest bound.
    pub fn set_time_division(&mut self, seconds: f64) -> Result<()> {
        TIME_DIVISION.set(&mut self.transport, "", &seconds)
    }

    /// Sampling status as reported by the scope: `Stop`, `Ready`, `Trig'd`
    /// or `Armed`.
    pub fn status(&mut self) -> Result<String> {
        STATUS.get(&mut self.transport, "")
    }

    /// Internal state change register. Reading clears it on the instrument.
    pub fn internal_state(&mut self) -> Result<String> {
        INTERNAL_STATE.get(&mut self.transport, "")
    }

    /// Whether the scope can accept the next acquisition.
    pub fn is_ready(&mut self) -> Result<bool> {
        let status = self.status()?;
        Ok(matches!(status.as_str(), "Stop" | "Ready" | "Armed"))
    }

    /// Hold off further command processing until the current acquisition
    /// completes, at most `seconds`.
    pub fn wait(&mut self, seconds: u32) -> Result<()> {
        self.transport.write_command(&format!("WAIT {seconds}"))
    }

    /// Ready the scope for the next single acquisition.
    ///
    /// Guarded: nothing is written when the scope reports itself busy, and
    /// `false` comes back without any command on the wire. A `true` return
    /// only means the arm command was sent after a passing readiness check;
    /// the instrument's acceptance is not re-verified.
    pub fn arm(&mut self) -> Result<bool> {
        if self.is_ready()? {
            self.transport.write_command("ARM")?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// The template dump describing the logical entities of a complete
    /// waveform, descriptor variables included.
    pub fn template(&mut self) -> Result<String> {
        TEMPLATE.get(&mut self.transport, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;

    #[test]
    fn time_division_round_trip() {
        let fake = FakeTransport::new()
            .expect(":TDIV?", "TDIV 1.00E-03S")
            .expect_write(":TDIV 1.00e-03S");
        let mut scope = Sds1072Cml::new(fake);

        assert_eq!(scope.time_division().unwrap(), 0.001);
        scope.set_time_division(0.001).unwrap();
        scope.into_transport().finish();
    }

    #[test]
    fn time_division_out_of_range_is_truncated() {
        let fake = FakeTransport::new().expect_write(":TDIV 5.00e+01S");
        let mut scope = Sds1072Cml::new(fake);
        scope.set_time_division(100.0).unwrap();
        scope.into_transport().finish();
    }

    #[test]
    fn readiness_follows_the_status_string() {
        for (status, ready) in [
            ("Stop", true),
            ("Ready", true),
            ("Armed", true),
            ("Trig'd", false),
            ("Auto", false),
        ] {
            let fake = FakeTransport::new().expect("SAST?", &format!("SAST {status}"));
            let mut scope = Sds1072Cml::new(fake);
            assert_eq!(scope.is_ready().unwrap(), ready, "status {status:?}");
            scope.into_transport().finish();
        }
    }

    #[test]
    fn arm_writes_only_when_ready() {
        let fake = FakeTransport::new()
            .expect("SAST?", "SAST Ready")
            .expect_write("ARM");
        let mut scope = Sds1072Cml::new(fake);
        assert!(scope.arm().unwrap());
        scope.into_transport().finish();
    }

    #[test]
    fn arm_is_refused_while_acquiring() {
        let fake = FakeTransport::new().expect("SAST?", "SAST Trig'd");
        let mut scope = Sds1072Cml::new(fake);
        assert!(!scope.arm().unwrap());
        scope.into_transport().finish();
    }

    #[test]
    fn wait_is_write_only() {
        let fake = FakeTransport::new().expect_write("WAIT 5");
        let mut scope = Sds1072Cml::new(fake);
        scope.wait(5).unwrap();
        scope.into_transport().finish();
    }

    #[test]
    fn status_and_internal_state_return_the_payload() {
        let fake = FakeTransport::new()
            .expect("SAST?", "SAST Trig'd")
            .expect("INR?", "INR 8193");
        let mut scope = Sds1072Cml::new(fake);
        assert_eq!(scope.status().unwrap(), "Trig'd");
        assert_eq!(scope.internal_state().unwrap(), "8193");
        scope.into_transport().finish();
    }

    #[test]
    fn template_returns_the_raw_reply() {
        let fake = FakeTransport::new().expect("TMP?", "TMP WAVEDESC: BLOCK");
        let mut scope = Sds1072Cml::new(fake);
        assert_eq!(scope.template().unwrap(), "TMP WAVEDESC: BLOCK");
        scope.into_transport().finish();
    }
}

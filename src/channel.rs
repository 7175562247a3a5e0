//! Per-channel vertical controls and waveform acquisition.

use crate::control::{self, Control, Measurement};
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::waveform::{self, Waveform, WaveformDescriptor};

/// Analog input channels on the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelId {
    Ch1,
    Ch2,
}

impl ChannelId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ch1 => "1",
            Self::Ch2 => "2",
        }
    }
}

/// Input coupling. Shared by the analog channels and the trigger path; the
/// wire form differs per command and lives with the command that uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coupling {
    Ac,
    Dc,
}

impl Coupling {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ac => "AC",
            Self::Dc => "DC",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<Self> {
        match token {
            "AC" => Some(Self::Ac),
            "DC" => Some(Self::Dc),
            _ => None,
        }
    }

    /// Single-letter form used by the `CPL` set command.
    fn wire_letter(&self) -> &'static str {
        match self {
            Self::Ac => "A",
            Self::Dc => "D",
        }
    }
}

impl std::str::FromStr for Coupling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(&s.to_ascii_uppercase()).ok_or_else(|| Error::Validation {
            name: "coupling",
            value: s.to_string(),
        })
    }
}

/// Vertical sensitivity bounds in volts per division.
const VDIV_RANGE: (f64, f64) = (2e-3, 10.0);

const VERTICAL_DIVISION: Control<f64> = Control {
    read: Measurement {
        query: "C{ch}:VDIV?",
        decode: decode_suffixed,
    },
    set: "C{ch}:VDIV {val}",
    encode: encode_vdiv,
};

// The set command carries the scope's fixed 1 MOhm termination suffix.
const COUPLING: Control<Coupling> = Control {
    read: Measurement {
        query: "C{ch}:CPL?",
        decode: decode_coupling,
    },
    set: "C{ch}:CPL {val}1M",
    encode: encode_coupling,
};

fn decode_suffixed(reply: &str) -> Result<f64> {
    control::suffixed_float(control::payload(reply)?)
}

fn encode_vdiv(volts: &f64) -> String {
    format!("{}V", control::scientific(volts.clamp(VDIV_RANGE.0, VDIV_RANGE.1)))
}

fn decode_coupling(reply: &str) -> Result<Coupling> {
    match control::payload(reply)?.chars().next() {
        Some('A') => Ok(Coupling::Ac),
        Some('D') => Ok(Coupling::Dc),
        _ => Err(Error::UnknownToken {
            name: "coupling",
            token: reply.to_string(),
        }),
    }
}

fn encode_coupling(coupling: &Coupling) -> String {
    coupling.wire_letter().to_string()
}

/// Borrowed view over one analog channel.
///
/// Obtained from [`crate::Sds1072Cml::channel`]; it holds the scope's
/// transport for the duration of the borrow, which keeps the two-round-trip
/// waveform fetch free of interleaved commands.
pub struct VoltageChannel<'a, T: Transport> {
    pub(crate) transport: &'a mut T,
    pub(crate) id: ChannelId,
}

impl<T: Transport> VoltageChannel<'_, T> {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Vertical sensitivity in volts per division.
    pub fn vertical_division(&mut self) -> Result<f64> {
        VERTICAL_DIVISION.get(&mut *self.transport, self.id.as_str())
    }

    /// Set the vertical sensitivity. Values outside 2 mV..10 V per division
    /// are truncated to the nearest bound.
    pub fn set_vertical_division(&mut self, volts: f64) -> Result<()> {
        VERTICAL_DIVISION.set(&mut *self.transport, self.id.as_str(), &volts)
    }

    pub fn coupling(&mut self) -> Result<Coupling> {
        COUPLING.get(&mut *self.transport, self.id.as_str())
    }

    pub fn set_coupling(&mut self, coupling: Coupling) -> Result<()> {
        COUPLING.set(&mut *self.transport, self.id.as_str(), &coupling)
    }

    /// Query the descriptor for the next waveform transfer.
    pub fn descriptor(&mut self) -> Result<WaveformDescriptor> {
        self.transport
            .write_command(&control::with_channel("C{ch}:WF? DESC", self.id.as_str()))?;
        let raw = self.transport.read_terminated_bytes()?;
        waveform::parse_descriptor(&raw)
    }

    /// Fetch and calibrate the waveform currently displayed on this channel.
    ///
    /// Two round-trips in a fixed order: the descriptor first, then the
    /// sample block it describes.
    pub fn waveform(&mut self) -> Result<Waveform> {
        let descriptor = self.descriptor()?;
        self.transport
            .write_command(&control::with_channel("C{ch}:WF? DAT2", self.id.as_str()))?;
        let raw = self.transport.read_terminated_bytes()?;
        waveform::decode_samples(&descriptor, &raw)
    }
}

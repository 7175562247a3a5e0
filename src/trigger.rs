//! Trigger state: five sub-queries merged into one configuration, and the
//! diff-based partial update that writes it back.

use crate::channel::Coupling;
use crate::control;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Condition that starts an acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerType {
    Edge,
    Slew,
    Glitch,
    Interval,
    Runt,
    Dropout,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edge => "EDGE",
            Self::Slew => "SLEW",
            Self::Glitch => "GLIT",
            Self::Interval => "INTV",
            Self::Runt => "RUNT",
            Self::Dropout => "DROP",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "EDGE" => Some(Self::Edge),
            "SLEW" => Some(Self::Slew),
            "GLIT" => Some(Self::Glitch),
            "INTV" => Some(Self::Interval),
            "RUNT" => Some(Self::Runt),
            "DROP" => Some(Self::Dropout),
            _ => None,
        }
    }
}

impl std::str::FromStr for TriggerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(&s.to_ascii_uppercase()).ok_or_else(|| Error::Validation {
            name: "trigger type",
            value: s.to_string(),
        })
    }
}

/// Signal the trigger watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Ex,
    ExDiv5,
    C1,
    C2,
}

impl TriggerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ex => "EX",
            Self::ExDiv5 => "EX/5",
            Self::C1 => "C1",
            Self::C2 => "C2",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "EX" => Some(Self::Ex),
            "EX/5" => Some(Self::ExDiv5),
            "C1" => Some(Self::C1),
            "C2" => Some(Self::C2),
            _ => None,
        }
    }
}

impl std::str::FromStr for TriggerSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(&s.to_ascii_uppercase()).ok_or_else(|| Error::Validation {
            name: "trigger source",
            value: s.to_string(),
        })
    }
}

/// Edge direction, or window mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSlope {
    Positive,
    Negative,
    Window,
}

impl TriggerSlope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "POS",
            Self::Negative => "NEG",
            Self::Window => "WINDOW",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "POS" => Some(Self::Positive),
            "NEG" => Some(Self::Negative),
            "WINDOW" => Some(Self::Window),
            _ => None,
        }
    }
}

impl std::str::FromStr for TriggerSlope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(&s.to_ascii_uppercase()).ok_or_else(|| Error::Validation {
            name: "trigger slope",
            value: s.to_string(),
        })
    }
}

/// Behavior after a triggering event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Normal,
    Auto,
    Single,
    Stop,
}

impl TriggerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORM",
            Self::Auto => "AUTO",
            Self::Single => "SINGLE",
            Self::Stop => "STOP",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "NORM" => Some(Self::Normal),
            "AUTO" => Some(Self::Auto),
            "SINGLE" => Some(Self::Single),
            "STOP" => Some(Self::Stop),
            _ => None,
        }
    }
}

impl std::str::FromStr for TriggerMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_token(&s.to_ascii_uppercase()).ok_or_else(|| Error::Validation {
            name: "trigger mode",
            value: s.to_string(),
        })
    }
}

/// One merged snapshot of the five trigger sub-states.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    pub trigger_type: TriggerType,
    pub source: TriggerSource,
    pub hold_type: String,
    pub hold_value1: String,
    /// Level in volts at which the trigger fires.
    pub level: f64,
    pub slope: TriggerSlope,
    pub mode: TriggerMode,
    pub coupling: Coupling,
}

impl TriggerConfig {
    /// This snapshot with an update's fields applied on top.
    fn merged(&self, update: &TriggerUpdate) -> Self {
        Self {
            trigger_type: update.trigger_type.unwrap_or(self.trigger_type),
            source: update.source.unwrap_or(self.source),
            hold_type: update
                .hold_type
                .clone()
                .unwrap_or_else(|| self.hold_type.clone()),
            hold_value1: update
                .hold_value1
                .clone()
                .unwrap_or_else(|| self.hold_value1.clone()),
            level: update.level.unwrap_or(self.level),
            slope: update.slope.unwrap_or(self.slope),
            mode: update.mode.unwrap_or(self.mode),
            coupling: update.coupling.unwrap_or(self.coupling),
        }
    }
}

/// Partial update for [`TriggerChannel::write`]. Absent fields keep their
/// current instrument value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerUpdate {
    pub trigger_type: Option<TriggerType>,
    pub source: Option<TriggerSource>,
    pub hold_type: Option<String>,
    pub hold_value1: Option<String>,
    pub level: Option<f64>,
    pub slope: Option<TriggerSlope>,
    pub mode: Option<TriggerMode>,
    pub coupling: Option<Coupling>,
}

impl TriggerUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger_type(mut self, value: TriggerType) -> Self {
        self.trigger_type = Some(value);
        self
    }

    pub fn source(mut self, value: TriggerSource) -> Self {
        self.source = Some(value);
        self
    }

    pub fn hold_type(mut self, value: impl Into<String>) -> Self {
        self.hold_type = Some(value.into());
        self
    }

    pub fn hold_value1(mut self, value: impl Into<String>) -> Self {
        self.hold_value1 = Some(value.into());
        self
    }

    pub fn level(mut self, volts: f64) -> Self {
        self.level = Some(volts);
        self
    }

    pub fn slope(mut self, value: TriggerSlope) -> Self {
        self.slope = Some(value);
        self
    }

    pub fn mode(mut self, value: TriggerMode) -> Self {
        self.mode = Some(value);
        self
    }

    pub fn coupling(mut self, value: Coupling) -> Self {
        self.coupling = Some(value);
        self
    }
}

/// Trigger-session state owned by the scope: the cached configuration and
/// the source the per-channel commands currently address. Mutated only by
/// [`TriggerChannel::read`] and [`TriggerChannel::write`]; not safe for
/// unsynchronized sharing.
#[derive(Debug, Default)]
pub(crate) struct TriggerState {
    cache: Option<TriggerConfig>,
    source: Option<TriggerSource>,
}

/// Borrowed view over the trigger system, from [`crate::Sds1072Cml::trigger`].
pub struct TriggerChannel<'a, T: Transport> {
    pub(crate) transport: &'a mut T,
    pub(crate) state: &'a mut TriggerState,
}

impl<T: Transport> TriggerChannel<'_, T> {
    /// Query the five trigger sub-states and merge them into one
    /// configuration, refreshing the cache and the active source context.
    pub fn read(&mut self) -> Result<TriggerConfig> {
        // TRLV/TRSL/TRCP each re-report which channel they describe; the
        // merge keeps the last one, matching the query order.
        let (trigger_type, _, hold_type, hold_value1) = parse_setup(&self.query("TRSE?")?)?;
        let (_, level) = parse_level(&self.query("TRLV?")?)?;
        let (_, slope) = parse_slope(&self.query("TRSL?")?)?;
        let mode = parse_mode(&self.query("TRMD?")?)?;
        let (source, coupling) = parse_coupling(&self.query("TRCP?")?)?;

        let config = TriggerConfig {
            trigger_type,
            source,
            hold_type,
            hold_value1,
            level,
            slope,
            mode,
            coupling,
        };
        self.state.source = Some(config.source);
        self.state.cache = Some(config.clone());
        Ok(config)
    }

    /// Last configuration observed by [`read`](Self::read), if any.
    pub fn cached(&self) -> Option<&TriggerConfig> {
        self.state.cache.as_ref()
    }

    /// Apply a partial update as one read-modify-write transaction.
    ///
    /// Re-reads the instrument for a baseline, writes one command per dirty
    /// command group using the merged post-update state, then re-reads and
    /// compares against the prediction. `Ok(true)` means the instrument
    /// converged to the requested configuration; `Ok(false)` reports a
    /// partial or rejected application, an expected outcome left to the
    /// caller to retry.
    pub fn write(&mut self, update: &TriggerUpdate) -> Result<bool> {
        let baseline = self.read()?;

        if let Some(source) = update.source {
            // Moves before any command is formatted: the source context
            // decides which channel the per-channel commands address.
            self.state.source = Some(source);
        }

        let predicted = baseline.merged(update);
        let source = self.state.source.unwrap_or(predicted.source);

        let setup_dirty = predicted.trigger_type != baseline.trigger_type
            || predicted.source != baseline.source
            || predicted.hold_type != baseline.hold_type
            || predicted.hold_value1 != baseline.hold_value1;
        let level_dirty = predicted.level != baseline.level;
        let coupling_dirty = predicted.coupling != baseline.coupling;
        let slope_dirty = predicted.slope != baseline.slope;
        let mode_dirty = predicted.mode != baseline.mode;

        if predicted.source != baseline.source
            && !(level_dirty && slope_dirty && coupling_dirty)
        {
            // The grouping table ties the source to the setup command only,
            // so level/slope/coupling not named in this update keep
            // addressing the previous source.
            log::warn!(
                "trigger source moved to {}; level/slope/coupling not in this update still follow {}",
                source.as_str(),
                baseline.source.as_str()
            );
        }

        if setup_dirty {
            self.transport.write_command(&format!(
                "TRSE {},SR,{},HT,{},HV,{}",
                predicted.trigger_type.as_str(),
                source.as_str(),
                predicted.hold_type,
                predicted.hold_value1
            ))?;
        }
        if level_dirty {
            self.transport.write_command(&format!(
                "{}:TRLV {}V",
                source.as_str(),
                control::scientific(predicted.level)
            ))?;
        }
        if coupling_dirty {
            self.transport.write_command(&format!(
                "{}:TRCP {}",
                source.as_str(),
                predicted.coupling.as_str()
            ))?;
        }
        if slope_dirty {
            self.transport.write_command(&format!(
                "{}:TRSL {}",
                source.as_str(),
                predicted.slope.as_str()
            ))?;
        }
        if mode_dirty {
            self.transport
                .write_command(&format!("TRMD {}", predicted.mode.as_str()))?;
        }

        let observed = self.read()?;
        Ok(observed == predicted)
    }

    fn query(&mut self, command: &str) -> Result<String> {
        self.transport.write_command(command)?;
        self.transport.read_formatted_string()
    }
}

/// `TRSE EDGE,SR,EX,HT,TI,HV,100NS` → (type, source, hold_type, hold_value1).
fn parse_setup(reply: &str) -> Result<(TriggerType, TriggerSource, String, String)> {
    let body = control::payload(reply)?;
    let fields: Vec<&str> = body.split(',').map(str::trim).collect();
    if fields.len() < 7 {
        return Err(Error::MissingDelimiter {
            reply: reply.to_string(),
        });
    }
    Ok((
        TriggerType::from_token(fields[0]).ok_or_else(|| unknown("trigger type", fields[0]))?,
        TriggerSource::from_token(fields[2]).ok_or_else(|| unknown("trigger source", fields[2]))?,
        fields[4].to_string(),
        fields[6].to_string(),
    ))
}

/// `C1:TRLV 5.00E-01V` → (source, level in volts).
fn parse_level(reply: &str) -> Result<(TriggerSource, f64)> {
    let source = parse_source_prefix(reply)?;
    let level = control::suffixed_float(control::payload(reply)?)?;
    Ok((source, level))
}

/// `C1:TRSL POS` → (source, slope).
fn parse_slope(reply: &str) -> Result<(TriggerSource, TriggerSlope)> {
    let source = parse_source_prefix(reply)?;
    let token = control::payload(reply)?;
    Ok((
        source,
        TriggerSlope::from_token(token).ok_or_else(|| unknown("trigger slope", token))?,
    ))
}

/// `TRMD AUTO` → mode.
fn parse_mode(reply: &str) -> Result<TriggerMode> {
    let token = control::payload(reply)?;
    TriggerMode::from_token(token).ok_or_else(|| unknown("trigger mode", token))
}

/// `C1:TRCP DC` → (source, coupling).
fn parse_coupling(reply: &str) -> Result<(TriggerSource, Coupling)> {
    let source = parse_source_prefix(reply)?;
    let token = control::payload(reply)?;
    Ok((
        source,
        Coupling::from_token(token).ok_or_else(|| unknown("trigger coupling", token))?,
    ))
}

fn parse_source_prefix(reply: &str) -> Result<TriggerSource> {
    let (prefix, _) = reply.split_once(':').ok_or_else(|| Error::MissingDelimiter {
        reply: reply.to_string(),
    })?;
    TriggerSource::from_token(prefix).ok_or_else(|| unknown("trigger source", prefix))
}

fn unknown(name: &'static str, token: &str) -> Error {
    Error::UnknownToken {
        name,
        token: token.to_string(),
    }
}

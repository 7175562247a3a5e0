//! # SDS1072CML driver
//!
//! A Rust library for driving the SIGLENT SDS1072CML oscilloscope over its
//! SCPI-like ASCII command set.
//!
//! The scope's settings are exposed as typed read/write controls; on top of
//! those sit the two composite operations that need real logic: decoding
//! the fixed-layout binary waveform descriptor into calibrated
//! time/voltage data, and the trigger configuration transaction that
//! merges five sub-states, writes a minimal diff, and verifies the
//! instrument converged.
//!
//! ## Features
//!
//! - **Typed controls**: vertical/time division, coupling, status and
//!   friends as declarative command bindings with validation
//! - **Waveform acquisition**: descriptor-then-data fetch with byte-exact
//!   decoding of the instrument's descriptor template
//! - **Trigger transactions**: partial updates diffed against a fresh
//!   baseline, grouped into the instrument's command granularity, and
//!   verified by re-read
//! - **Pluggable transport**: a serial-port implementation plus a trait
//!   seam for scripted test doubles
//!
//! ## Examples
//!
//! ### Capture a waveform
//!
//! ```rust,no_run
//! use sds1072cml_rs::Sds1072Cml;
//!
//! let mut scope = Sds1072Cml::open("/dev/ttyUSB0", 9600)?;
//!
//! let mut channel = scope.channel_1();
//! let waveform = channel.waveform()?;
//! println!("captured {} samples", waveform.len());
//! # Ok::<(), sds1072cml_rs::Error>(())
//! ```
//!
//! ### Reconfigure the trigger
//!
//! ```rust,no_run
//! use sds1072cml_rs::{Sds1072Cml, TriggerMode, TriggerSlope, TriggerUpdate};
//!
//! let mut scope = Sds1072Cml::open("/dev/ttyUSB0", 9600)?;
//!
//! let update = TriggerUpdate::new()
//!     .slope(TriggerSlope::Positive)
//!     .level(0.5)
//!     .mode(TriggerMode::Single);
//! if !scope.trigger().write(&update)? {
//!     eprintln!("scope did not adopt every field");
//! }
//! # Ok::<(), sds1072cml_rs::Error>(())
//! ```
//!
//! ### Arm for a single acquisition
//!
//! ```rust,no_run
//! use sds1072cml_rs::Sds1072Cml;
//!
//! let mut scope = Sds1072Cml::open("/dev/ttyUSB0", 9600)?;
//! if scope.arm()? {
//!     println!("armed; status: {}", scope.status()?);
//! }
//! # Ok::<(), sds1072cml_rs::Error>(())
//! ```

pub mod channel;
mod control;
pub mod error;
pub mod scope;
pub mod transport;
pub mod trigger;
pub mod waveform;

// Re-export the main types for convenience
pub use channel::{ChannelId, Coupling, VoltageChannel};
pub use error::{Error, Result};
pub use scope::Sds1072Cml;
pub use transport::{SerialTransport, Transport};
pub use trigger::{
    TriggerChannel, TriggerConfig, TriggerMode, TriggerSlope, TriggerSource, TriggerType,
    TriggerUpdate,
};
pub use waveform::{Waveform, WaveformDescriptor, DESCRIPTOR_OFFSET};

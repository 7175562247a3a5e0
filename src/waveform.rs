//! Binary waveform descriptor and sample decoding.
//!
//! `WF?` replies are framed as an ASCII header (`C1:WF ALL,#9000000346`)
//! followed by a binary block. Nothing in the block is self-describing:
//! every field sits at a hard-coded offset from the end of the header, per
//! this instrument's descriptor template.

use bytes::Buf;

use crate::error::{Error, Result};

/// Byte length of the `C{ch}:WF ALL,#9...` header preceding the block.
pub const DESCRIPTOR_OFFSET: usize = 21;

// Field offsets relative to `DESCRIPTOR_OFFSET`.
const NUM_DATA_POINTS: usize = 60;
const VERTICAL_GAIN: usize = 156;
const VERTICAL_OFFSET: usize = 160;
const HORIZ_INTERVAL: usize = 176;
const HORIZ_OFFSET: usize = 180;

/// Descriptor bytes required past the header; the last field is the f64 at
/// +180.
const DESCRIPTOR_LEN: usize = HORIZ_OFFSET + 8;

/// Calibration metadata for one capture, decoded from a `WF? DESC` reply.
///
/// Created fresh on every descriptor query and never cached: the scope is
/// free to change its acquisition settings between captures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveformDescriptor {
    /// Number of samples in the upcoming transfer.
    pub num_data_points: i32,
    /// Volts per raw code unit.
    pub vertical_gain: f32,
    /// Volts subtracted after scaling.
    pub vertical_offset: f32,
    /// Seconds per sample.
    pub horiz_interval: f32,
    /// Seconds added to the first sample's time.
    pub horiz_offset: f64,
    /// Where the binary payload starts within a raw reply.
    pub descriptor_offset: usize,
}

/// A calibrated capture: sample times in seconds, voltages in volts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Waveform {
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
}

impl Waveform {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Decode the descriptor block of a raw `WF? DESC` reply.
pub fn parse_descriptor(raw: &[u8]) -> Result<WaveformDescriptor> {
    let needed = DESCRIPTOR_OFFSET + DESCRIPTOR_LEN;
    if raw.len() < needed {
        return Err(Error::BufferTooShort {
            needed,
            got: raw.len(),
        });
    }

    Ok(WaveformDescriptor {
        num_data_points: i32_at(raw, DESCRIPTOR_OFFSET + NUM_DATA_POINTS),
        vertical_gain: f32_at(raw, DESCRIPTOR_OFFSET + VERTICAL_GAIN),
        vertical_offset: f32_at(raw, DESCRIPTOR_OFFSET + VERTICAL_OFFSET),
        horiz_interval: f32_at(raw, DESCRIPTOR_OFFSET + HORIZ_INTERVAL),
        horiz_offset: f64_at(raw, DESCRIPTOR_OFFSET + HORIZ_OFFSET),
        descriptor_offset: DESCRIPTOR_OFFSET,
    })
}

/// Convert a raw `WF? DAT2` reply into a calibrated waveform.
///
/// The sample block is `num_data_points` signed 8-bit codes starting at
/// `descriptor_offset`; each code scales to volts through the descriptor's
/// gain and offset, and the time axis is an arithmetic sequence at the
/// descriptor's sample interval.
pub fn decode_samples(descriptor: &WaveformDescriptor, raw: &[u8]) -> Result<Waveform> {
    let count = usize::try_from(descriptor.num_data_points).map_err(|_| {
        Error::BadSampleCount {
            count: descriptor.num_data_points,
        }
    })?;
    let needed = descriptor.descriptor_offset + count;
    if raw.len() < needed {
        return Err(Error::BufferTooShort {
            needed,
            got: raw.len(),
        });
    }

    let gain = f64::from(descriptor.vertical_gain);
    let offset = f64::from(descriptor.vertical_offset);
    let interval = f64::from(descriptor.horiz_interval);

    let mut time = Vec::with_capacity(count);
    let mut voltage = Vec::with_capacity(count);
    for (i, &code) in raw[descriptor.descriptor_offset..needed].iter().enumerate() {
        voltage.push(f64::from(code as i8) * gain - offset);
        time.push(i as f64 * interval + descriptor.horiz_offset);
    }

    Ok(Waveform { time, voltage })
}

fn i32_at(raw: &[u8], offset: usize) -> i32 {
    let mut field = &raw[offset..];
    field.get_i32_le()
}

fn f32_at(raw: &[u8], offset: usize) -> f32 {
    let mut field = &raw[offset..];
    field.get_f32_le()
}

fn f64_at(raw: &[u8], offset: usize) -> f64 {
    let mut field = &raw[offset..];
    field.get_f64_le()
}

/// Synthesize a descriptor reply with the given field values.
#[cfg(test)]
pub(crate) fn synth_descriptor(
    num_data_points: i32,
    vertical_gain: f32,
    vertical_offset: f32,
    horiz_interval: f32,
    horiz_offset: f64,
) -> Vec<u8> {
    let mut raw = vec![0u8; DESCRIPTOR_OFFSET + DESCRIPTOR_LEN];
    raw[..DESCRIPTOR_OFFSET].copy_from_slice(b"C1:WF ALL,#9000000346");
    raw[DESCRIPTOR_OFFSET + NUM_DATA_POINTS..][..4]
        .copy_from_slice(&num_data_points.to_le_bytes());
    raw[DESCRIPTOR_OFFSET + VERTICAL_GAIN..][..4].copy_from_slice(&vertical_gain.to_le_bytes());
    raw[DESCRIPTOR_OFFSET + VERTICAL_OFFSET..][..4]
        .copy_from_slice(&vertical_offset.to_le_bytes());
    raw[DESCRIPTOR_OFFSET + HORIZ_INTERVAL..][..4].copy_from_slice(&horiz_interval.to_le_bytes());
    raw[DESCRIPTOR_OFFSET + HORIZ_OFFSET..][..8].copy_from_slice(&horiz_offset.to_le_bytes());
    raw
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> WaveformDescriptor {
        WaveformDescriptor {
            num_data_points: 3,
            vertical_gain: 0.01,
            vertical_offset: 0.5,
            horiz_interval: 1e-6,
            horiz_offset: -5e-4,
            descriptor_offset: DESCRIPTOR_OFFSET,
        }
    }

    #[test]
    fn descriptor_round_trips_through_the_fixed_layout() {
        let raw = synth_descriptor(346, 0.01, 0.5, 1e-6, -5e-4);
        let decoded = parse_descriptor(&raw).unwrap();

        assert_eq!(decoded.num_data_points, 346);
        assert_eq!(decoded.vertical_gain, 0.01);
        assert_eq!(decoded.vertical_offset, 0.5);
        assert_eq!(decoded.horiz_interval, 1e-6);
        assert_eq!(decoded.horiz_offset, -5e-4);
        assert_eq!(decoded.descriptor_offset, DESCRIPTOR_OFFSET);
    }

    #[test]
    fn truncated_descriptor_is_rejected() {
        let raw = synth_descriptor(346, 0.01, 0.5, 1e-6, -5e-4);
        let result = parse_descriptor(&raw[..100]);
        assert!(matches!(
            result,
            Err(Error::BufferTooShort { needed, got: 100 })
                if needed == DESCRIPTOR_OFFSET + DESCRIPTOR_LEN
        ));
    }

    #[test]
    fn sample_scaling_is_linear_in_the_raw_code() {
        let mut raw = vec![0u8; DESCRIPTOR_OFFSET];
        raw.extend_from_slice(&[0x80, 0x00, 0x7f]); // -128, 0, 127

        let waveform = decode_samples(&descriptor(), &raw).unwrap();

        let gain = f64::from(0.01_f32);
        let expected = [-128.0 * gain - 0.5, -0.5, 127.0 * gain - 0.5];
        assert_eq!(waveform.len(), 3);
        for (got, want) in waveform.voltage.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn time_axis_is_arithmetic_from_the_horizontal_offset() {
        let mut desc = descriptor();
        desc.num_data_points = 4;
        let mut raw = vec![0u8; DESCRIPTOR_OFFSET];
        raw.extend_from_slice(&[0, 0, 0, 0]);

        let waveform = decode_samples(&desc, &raw).unwrap();

        for (i, t) in waveform.time.iter().enumerate() {
            let want = i as f64 * 1e-6 - 5e-4;
            assert!((t - want).abs() < 1e-9, "{t} != {want}");
        }
        assert!(waveform.time.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn short_sample_buffer_is_rejected_before_decoding() {
        let raw = vec![0u8; DESCRIPTOR_OFFSET + 2]; // descriptor promises 3
        assert!(matches!(
            decode_samples(&descriptor(), &raw),
            Err(Error::BufferTooShort { needed, got })
                if needed == DESCRIPTOR_OFFSET + 3 && got == DESCRIPTOR_OFFSET + 2
        ));
    }

    #[test]
    fn negative_sample_count_is_rejected() {
        let mut desc = descriptor();
        desc.num_data_points = -1;
        let raw = vec![0u8; DESCRIPTOR_OFFSET + 8];
        assert!(matches!(
            decode_samples(&desc, &raw),
            Err(Error::BadSampleCount { count: -1 })
        ));
    }
}

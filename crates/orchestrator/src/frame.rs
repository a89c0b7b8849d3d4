//! Binary frame encoding for external renderers.
//!
//! Layout, all little-endian:
//! ```text
//! version   u64
//! sim_time  f64
//! count     u32
//! count * (x f32, y f32, z f32, scalar f32)
//! ```

use sph_kernel::Snapshot;

/// Size of the fixed frame header in bytes.
pub const HEADER_BYTES: usize = 8 + 8 + 4;

/// Bytes per particle record.
pub const PARTICLE_BYTES: usize = 4 * 4;

/// Encode a snapshot as a binary frame.
pub fn encode_frame(snapshot: &Snapshot) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_BYTES + PARTICLE_BYTES * snapshot.len());
    buf.extend_from_slice(&snapshot.version.to_le_bytes());
    buf.extend_from_slice(&snapshot.sim_time.to_le_bytes());
    buf.extend_from_slice(&(snapshot.len() as u32).to_le_bytes());
    for sample in &snapshot.particles {
        for v in sample.position {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        buf.extend_from_slice(&sample.scalar.to_le_bytes());
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use sph_kernel::ParticleSample;

    #[test]
    fn test_empty_frame_is_header_only() {
        let frame = encode_frame(&Snapshot::default());
        assert_eq!(frame.len(), HEADER_BYTES);
        assert!(frame.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_frame_layout() {
        let snapshot = Snapshot {
            version: 7,
            sim_time: 0.35,
            particles: vec![ParticleSample {
                position: [1.0, -2.0, 0.5],
                scalar: 210.0,
                color: [1.0, 0.0, 0.0],
                scale: 0.02,
            }],
        };
        let frame = encode_frame(&snapshot);
        assert_eq!(frame.len(), HEADER_BYTES + PARTICLE_BYTES);
        assert_eq!(&frame[0..8], &7u64.to_le_bytes());
        assert_eq!(&frame[8..16], &0.35f64.to_le_bytes());
        assert_eq!(&frame[16..20], &1u32.to_le_bytes());
        assert_eq!(&frame[20..24], &1.0f32.to_le_bytes());
        assert_eq!(&frame[24..28], &(-2.0f32).to_le_bytes());
        assert_eq!(&frame[28..32], &0.5f32.to_le_bytes());
        assert_eq!(&frame[32..36], &210.0f32.to_le_bytes());
    }
}

//! Fixed-record binary splat files
//!
//! One little-endian 32-byte record per splat: 3×f32 position, 3×f32 scale,
//! u32 packed RGBA color, u32 packed orientation. No header; the file length
//! must be an exact multiple of the record size.

use crate::error::IoError;
use rand::Rng;
use splatsort_core::{pack_color, pack_rotation, Splat, SplatSet, SPLAT_RECORD_SIZE};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Decode a whole file's bytes into a splat set
pub fn parse_splats(bytes: &[u8]) -> Result<SplatSet, IoError> {
    if bytes.len() % SPLAT_RECORD_SIZE != 0 {
        return Err(IoError::InvalidLength {
            len: bytes.len() as u64,
            record_size: SPLAT_RECORD_SIZE,
        });
    }

    // the byte buffer carries no alignment guarantee, so copy record by record
    Ok(bytes
        .chunks_exact(SPLAT_RECORD_SIZE)
        .map(bytemuck::pod_read_unaligned::<Splat>)
        .map(from_little_endian)
        .collect())
}

/// Read a splat file.
///
/// Nothing is returned unless the whole file decoded, so a failed load never
/// leaves a partial dataset behind.
pub fn read_splat_file<P: AsRef<Path>>(path: P) -> Result<SplatSet, IoError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IoError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => IoError::Io(e),
    })?;

    let splats = parse_splats(&bytes)?;
    log::info!("Loaded {} ({} splats)", path.display(), splats.len());
    Ok(splats)
}

/// Encode splats into the record layout
pub fn encode_splats(splats: &SplatSet) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(splats.len() * SPLAT_RECORD_SIZE);
    for splat in splats {
        bytes.extend_from_slice(bytemuck::bytes_of(&to_little_endian(*splat)));
    }
    bytes
}

/// Write a splat file, replacing any existing file
pub fn write_splat_file<P: AsRef<Path>>(splats: &SplatSet, path: P) -> Result<(), IoError> {
    let mut file = fs::File::create(path.as_ref())?;
    file.write_all(&encode_splats(splats))?;
    file.flush()?;
    Ok(())
}

/// Random splats inside a cube of half-width `extent`, for test datasets
pub fn random_splats<R: Rng>(rng: &mut R, count: usize, extent: f32) -> SplatSet {
    (0..count)
        .map(|_| {
            let axis = nalgebra::Vector3::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5);
            let rotation = nalgebra::UnitQuaternion::from_scaled_axis(axis * std::f32::consts::PI);
            Splat {
                position: [
                    rng.gen_range(-extent..=extent),
                    rng.gen_range(-extent..=extent),
                    rng.gen_range(-extent..=extent),
                ],
                scale: [rng.gen_range(0.01..0.1), rng.gen_range(0.01..0.1), rng.gen_range(0.01..0.1)],
                color: pack_color(rng.gen()),
                rotation: pack_rotation(&rotation),
            }
        })
        .collect()
}

fn from_little_endian(s: Splat) -> Splat {
    Splat {
        position: s.position.map(|v| f32::from_bits(u32::from_le(v.to_bits()))),
        scale: s.scale.map(|v| f32::from_bits(u32::from_le(v.to_bits()))),
        color: u32::from_le(s.color),
        rotation: u32::from_le(s.rotation),
    }
}

fn to_little_endian(s: Splat) -> Splat {
    Splat {
        position: s.position.map(|v| f32::from_bits(v.to_bits().to_le())),
        scale: s.scale.map(|v| f32::from_bits(v.to_bits().to_le())),
        color: s.color.to_le(),
        rotation: s.rotation.to_le(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("splatsort_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_exact_multiple_loads_every_record() {
        let mut rng = StdRng::seed_from_u64(5);
        let splats = random_splats(&mut rng, 7, 2.0);
        let bytes = encode_splats(&splats);
        assert_eq!(bytes.len(), 7 * SPLAT_RECORD_SIZE);

        let parsed = parse_splats(&bytes).unwrap();
        assert_eq!(parsed.len(), 7);
        assert_eq!(parsed, splats);
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut bytes = encode_splats(&random_splats(&mut rng, 4, 1.0));
        bytes.extend_from_slice(&[0, 1, 2]);
        let err = parse_splats(&bytes).unwrap_err();
        assert!(matches!(err, IoError::InvalidLength { len: 131, .. }));
    }

    #[test]
    fn test_record_field_layout() {
        let mut record = Vec::new();
        for v in [1.0f32, 2.0, 3.0, 0.5, 0.25, 0.125] {
            record.extend_from_slice(&v.to_le_bytes());
        }
        record.extend_from_slice(&0xAABBCCDDu32.to_le_bytes());
        record.extend_from_slice(&0x80808080u32.to_le_bytes());

        let set = parse_splats(&record).unwrap();
        assert_eq!(set[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(set[0].scale, [0.5, 0.25, 0.125]);
        assert_eq!(set[0].rgba(), [0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(set[0].rotation, 0x80808080);
    }

    #[test]
    fn test_empty_file_is_an_empty_set() {
        assert!(parse_splats(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_file_roundtrip_and_missing_file() {
        let path = temp_path("roundtrip.splat");
        let mut rng = StdRng::seed_from_u64(8);
        let splats = random_splats(&mut rng, 33, 4.0);
        write_splat_file(&splats, &path).unwrap();
        assert_eq!(read_splat_file(&path).unwrap(), splats);
        let _ = fs::remove_file(&path);

        let missing = read_splat_file(temp_path("does_not_exist.splat")).unwrap_err();
        assert!(matches!(missing, IoError::FileNotFound { .. }));
    }

    #[test]
    fn test_bad_length_file_converts_to_core_error() {
        let path = temp_path("truncated.splat");
        fs::write(&path, vec![0u8; SPLAT_RECORD_SIZE * 2 + 3]).unwrap();
        let err: splatsort_core::Error = read_splat_file(&path).unwrap_err().into();
        assert!(matches!(err, splatsort_core::Error::InvalidData(_)));
        let _ = fs::remove_file(&path);
    }
}

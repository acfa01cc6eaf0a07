use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::nifti::{DataType, parse_header, parse_nifti};
use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_segeval_input_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

struct Fixture<'a> {
    shape: &'a [usize],
    spacing: &'a [f32],
    datatype: i16,
    bitpix: i16,
    payload: Vec<u8>,
    big_endian: bool,
    slope: f32,
    inter: f32,
}

impl Fixture<'_> {
    fn encode(&self) -> Vec<u8> {
        let be = self.big_endian;
        let i16b = |v: i16| if be { v.to_be_bytes() } else { v.to_le_bytes() };
        let i32b = |v: i32| if be { v.to_be_bytes() } else { v.to_le_bytes() };
        let f32b = |v: f32| if be { v.to_be_bytes() } else { v.to_le_bytes() };

        let mut h = vec![0u8; 352];
        h[0..4].copy_from_slice(&i32b(348));
        h[40..42].copy_from_slice(&i16b(self.shape.len() as i16));
        for (i, &d) in self.shape.iter().enumerate() {
            let off = 42 + 2 * i;
            h[off..off + 2].copy_from_slice(&i16b(d as i16));
        }
        h[70..72].copy_from_slice(&i16b(self.datatype));
        h[72..74].copy_from_slice(&i16b(self.bitpix));
        h[76..80].copy_from_slice(&f32b(1.0));
        for (i, &s) in self.spacing.iter().enumerate() {
            let off = 80 + 4 * i;
            h[off..off + 4].copy_from_slice(&f32b(s));
        }
        h[108..112].copy_from_slice(&f32b(352.0));
        h[112..116].copy_from_slice(&f32b(self.slope));
        h[116..120].copy_from_slice(&f32b(self.inter));
        h[344..348].copy_from_slice(b"n+1\0");
        h.extend_from_slice(&self.payload);
        h
    }
}

fn u8_fixture<'a>(shape: &'a [usize], values: &[u8]) -> Fixture<'a> {
    Fixture {
        shape,
        spacing: &[1.0, 1.0, 1.0],
        datatype: 2,
        bitpix: 8,
        payload: values.to_vec(),
        big_endian: false,
        slope: 0.0,
        inter: 0.0,
    }
}

fn write_nii(path: &Path, bytes: &[u8]) {
    if path.to_string_lossy().ends_with(".gz") {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        fs::write(path, enc.finish().unwrap()).unwrap();
    } else {
        fs::write(path, bytes).unwrap();
    }
}

#[test]
fn test_parse_u8_little_endian() {
    let values = [0u8, 1, 2, 0, 1, 1, 0, 2];
    let bytes = u8_fixture(&[2, 2, 2], &values).encode();
    let header = parse_header(&bytes).unwrap();
    assert_eq!(header.datatype, DataType::U8);
    assert!(!header.big_endian);
    assert_eq!(header.vox_offset, 352);

    let vol = parse_nifti(&bytes).unwrap();
    assert_eq!(vol.shape(), &[2, 2, 2]);
    assert_eq!(
        vol.data(),
        &[0.0, 1.0, 2.0, 0.0, 1.0, 1.0, 0.0, 2.0]
    );
}

#[test]
fn test_parse_i16_big_endian_with_spacing() {
    let values: [i16; 4] = [0, 3, -1, 300];
    let payload = values.iter().flat_map(|v| v.to_be_bytes()).collect();
    let fixture = Fixture {
        shape: &[4, 1],
        spacing: &[0.5, -2.0],
        datatype: 4,
        bitpix: 16,
        payload,
        big_endian: true,
        slope: 0.0,
        inter: 0.0,
    };
    let vol = parse_nifti(&fixture.encode()).unwrap();
    assert_eq!(vol.shape(), &[4, 1]);
    assert_eq!(vol.spacing(), &[0.5, 2.0]);
    assert_eq!(vol.data(), &[0.0, 3.0, -1.0, 300.0]);
}

#[test]
fn test_parse_f32_applies_scaling() {
    let values: [f32; 3] = [0.0, 1.0, 2.0];
    let payload = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    let fixture = Fixture {
        shape: &[3],
        spacing: &[1.0],
        datatype: 16,
        bitpix: 32,
        payload,
        big_endian: false,
        slope: 2.0,
        inter: 1.0,
    };
    let vol = parse_nifti(&fixture.encode()).unwrap();
    assert_eq!(vol.data(), &[1.0, 3.0, 5.0]);
}

#[test]
fn test_parse_rejects_truncated_data() {
    let mut bytes = u8_fixture(&[2, 2, 2], &[1u8; 8]).encode();
    bytes.truncate(bytes.len() - 1);
    let err = parse_nifti(&bytes).unwrap_err();
    assert!(err.to_string().contains("truncated"));
}

#[test]
fn test_parse_rejects_bad_magic_and_datatype() {
    let mut bytes = u8_fixture(&[2], &[0, 1]).encode();
    bytes[344..348].copy_from_slice(b"ni1\0");
    assert!(matches!(
        parse_header(&bytes),
        Err(InputError::InvalidInput(_))
    ));

    let mut fixture = u8_fixture(&[2], &[0, 1]);
    fixture.datatype = 128;
    let err = parse_header(&fixture.encode()).unwrap_err();
    assert!(err.to_string().contains("datatype code 128"));
}

#[test]
fn test_load_volume_plain_and_gz() {
    let dir = make_temp_dir();
    let values = [0u8, 0, 1, 1, 2, 2, 0, 0];
    let bytes = u8_fixture(&[2, 2, 2], &values).encode();

    let plain = dir.join("sub-01_seg.nii");
    let gz = dir.join("sub-01_seg.nii.gz");
    write_nii(&plain, &bytes);
    write_nii(&gz, &bytes);

    let a = load_volume(&plain).unwrap();
    let b = load_volume(&gz).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.data()[4], 2.0);
}

#[test]
fn test_load_volume_missing_input() {
    let dir = make_temp_dir();
    let path = dir.join("absent.nii.gz");
    match load_volume(&path) {
        Err(InputError::MissingInput(p)) => assert_eq!(p, path),
        other => panic!("expected MissingInput, got {other:?}"),
    }
}

#[test]
fn test_is_volume_file() {
    assert!(is_volume_file(Path::new("a/sub-01.nii.gz")));
    assert!(is_volume_file(Path::new("sub-01.nii")));
    assert!(!is_volume_file(Path::new("sub-01.json")));
    assert!(!is_volume_file(Path::new(".sub-01.nii.gz")));
}

#[test]
fn test_resolve_pairs_directories_sorted() {
    let root = make_temp_dir();
    let pred = root.join("pred");
    let reference = root.join("ref");
    fs::create_dir_all(&pred).unwrap();
    fs::create_dir_all(&reference).unwrap();
    for name in ["sub-02_pred.nii.gz", "sub-01_pred.nii.gz"] {
        fs::write(pred.join(name), b"").unwrap();
    }
    for name in ["sub-02_seg.nii.gz", "sub-01_seg.nii.gz", "notes.txt"] {
        fs::write(reference.join(name), b"").unwrap();
    }

    let pairs = resolve_pairs(&pred, &reference).unwrap();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0].prediction, pred.join("sub-01_pred.nii.gz"));
    assert_eq!(pairs[0].reference, reference.join("sub-01_seg.nii.gz"));
    assert_eq!(pairs[1].prediction, pred.join("sub-02_pred.nii.gz"));
}

#[test]
fn test_resolve_pairs_count_mismatch() {
    let root = make_temp_dir();
    let pred = root.join("pred");
    let reference = root.join("ref");
    fs::create_dir_all(&pred).unwrap();
    fs::create_dir_all(&reference).unwrap();
    fs::write(pred.join("a.nii.gz"), b"").unwrap();
    fs::write(reference.join("a.nii.gz"), b"").unwrap();
    fs::write(reference.join("b.nii.gz"), b"").unwrap();

    match resolve_pairs(&pred, &reference) {
        Err(InputError::PairCountMismatch {
            prediction,
            reference,
        }) => {
            assert_eq!(prediction, 1);
            assert_eq!(reference, 2);
        }
        other => panic!("expected PairCountMismatch, got {other:?}"),
    }
}

#[test]
fn test_resolve_pairs_single_files() {
    let pairs = resolve_pairs(Path::new("pred.nii.gz"), Path::new("seg.nii.gz")).unwrap();
    assert_eq!(
        pairs,
        vec![SubjectPair {
            reference: PathBuf::from("seg.nii.gz"),
            prediction: PathBuf::from("pred.nii.gz"),
        }]
    );
}

#[test]
fn test_expand_tilde_resolves_home() {
    assert_eq!(
        expand_tilde(Path::new("/data/seg.nii.gz")),
        PathBuf::from("/data/seg.nii.gz")
    );
    assert_eq!(
        expand_tilde(Path::new("seg~1.nii.gz")),
        PathBuf::from("seg~1.nii.gz")
    );
    if let Some(home) = std::env::var_os("HOME").filter(|h| !h.is_empty()) {
        assert_eq!(
            expand_tilde(Path::new("~/scans/seg.nii.gz")),
            Path::new(&home).join("scans").join("seg.nii.gz")
        );
    }
}

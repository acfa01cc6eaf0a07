use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use memmap2::Mmap;

use crate::input::InputError;
use crate::model::Volume;

pub const HEADER_SIZE: usize = 348;
const NIFTI2_HEADER_SIZE: i32 = 540;
const MAX_DIMS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    U8,
    I8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl DataType {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            2 => Some(DataType::U8),
            4 => Some(DataType::I16),
            8 => Some(DataType::I32),
            16 => Some(DataType::F32),
            64 => Some(DataType::F64),
            256 => Some(DataType::I8),
            512 => Some(DataType::U16),
            768 => Some(DataType::U32),
            1024 => Some(DataType::I64),
            1280 => Some(DataType::U64),
            _ => None,
        }
    }

    pub fn size(self) -> usize {
        match self {
            DataType::U8 | DataType::I8 => 1,
            DataType::I16 | DataType::U16 => 2,
            DataType::I32 | DataType::U32 | DataType::F32 => 4,
            DataType::I64 | DataType::U64 | DataType::F64 => 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NiftiHeader {
    pub shape: Vec<usize>,
    pub spacing: Vec<f64>,
    pub datatype: DataType,
    pub vox_offset: usize,
    pub scl_slope: f64,
    pub scl_inter: f64,
    pub big_endian: bool,
}

impl NiftiHeader {
    pub fn n_voxels(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }

    fn applies_scaling(&self) -> bool {
        self.scl_slope.is_finite()
            && self.scl_slope != 0.0
            && !(self.scl_slope == 1.0 && self.scl_inter == 0.0)
    }
}

/// Reads a single-file NIfTI-1 image (`.nii` or `.nii.gz`).
pub fn read_nifti(path: &Path) -> Result<Volume, InputError> {
    let is_gzipped = path.extension().is_some_and(|ext| ext == "gz");
    if is_gzipped {
        let file = File::open(path)?;
        let mut decoder = MultiGzDecoder::new(BufReader::new(file));
        let mut bytes = Vec::new();
        decoder.read_to_end(&mut bytes).map_err(|e| {
            InputError::InvalidInput(format!(
                "gzip failed to decompress {}: {e}",
                path.display()
            ))
        })?;
        parse_nifti(&bytes)
    } else {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        parse_nifti(&mmap[..])
    }
}

pub fn parse_nifti(bytes: &[u8]) -> Result<Volume, InputError> {
    let header = parse_header(bytes)?;
    let n_voxels = header
        .n_voxels()
        .ok_or_else(|| InputError::InvalidInput("voxel count overflow".to_string()))?;
    let byte_len = n_voxels
        .checked_mul(header.datatype.size())
        .ok_or_else(|| InputError::InvalidInput("data size overflow".to_string()))?;
    let end = header
        .vox_offset
        .checked_add(byte_len)
        .ok_or_else(|| InputError::InvalidInput("data size overflow".to_string()))?;
    if end > bytes.len() {
        return Err(InputError::InvalidInput(format!(
            "image data truncated: expected {} bytes from offset {}, file has {}",
            byte_len,
            header.vox_offset,
            bytes.len()
        )));
    }

    let raw = &bytes[header.vox_offset..end];
    let mut data = decode_samples(raw, header.datatype, header.big_endian);
    if header.applies_scaling() {
        let inter = if header.scl_inter.is_finite() {
            header.scl_inter
        } else {
            0.0
        };
        for v in &mut data {
            *v = *v * header.scl_slope + inter;
        }
    }

    let volume = Volume::new(header.shape, data)?.with_spacing(header.spacing)?;
    Ok(volume)
}

pub fn parse_header(bytes: &[u8]) -> Result<NiftiHeader, InputError> {
    if bytes.len() < HEADER_SIZE {
        return Err(InputError::InvalidInput(format!(
            "file too small for a NIfTI-1 header: {} bytes",
            bytes.len()
        )));
    }

    let le_size = i32::from_le_bytes(array_at(bytes, 0));
    let be_size = i32::from_be_bytes(array_at(bytes, 0));
    let big_endian = if le_size == HEADER_SIZE as i32 {
        false
    } else if be_size == HEADER_SIZE as i32 {
        true
    } else if le_size == NIFTI2_HEADER_SIZE || be_size == NIFTI2_HEADER_SIZE {
        return Err(InputError::InvalidInput(
            "NIfTI-2 images are not supported".to_string(),
        ));
    } else {
        return Err(InputError::InvalidInput(format!(
            "invalid sizeof_hdr; expected {HEADER_SIZE}"
        )));
    };
    let r = HeaderReader { bytes, big_endian };

    match &bytes[344..348] {
        b"n+1\0" => {}
        b"ni1\0" => {
            return Err(InputError::InvalidInput(
                "two-file NIfTI (.hdr/.img) images are not supported".to_string(),
            ));
        }
        _ => {
            return Err(InputError::InvalidInput(
                "invalid magic; expected n+1".to_string(),
            ));
        }
    }

    let ndim = r.i16(40);
    if ndim < 1 || (ndim as usize) > MAX_DIMS {
        return Err(InputError::InvalidInput(format!(
            "invalid dim[0]: {ndim}"
        )));
    }
    let ndim = ndim as usize;
    let mut shape = Vec::with_capacity(ndim);
    let mut spacing = Vec::with_capacity(ndim);
    for axis in 1..=ndim {
        let dim = r.i16(40 + 2 * axis);
        if dim < 1 {
            return Err(InputError::InvalidInput(format!(
                "invalid dim[{axis}]: {dim}"
            )));
        }
        shape.push(dim as usize);
        let pixdim = (r.f32(76 + 4 * axis) as f64).abs();
        spacing.push(if pixdim.is_finite() && pixdim > 0.0 {
            pixdim
        } else {
            1.0
        });
    }

    let code = r.i16(70);
    let datatype = DataType::from_code(code).ok_or_else(|| {
        InputError::InvalidInput(format!("unsupported NIfTI datatype code {code}"))
    })?;

    let vox_offset = r.f32(108);
    if !vox_offset.is_finite() || vox_offset < HEADER_SIZE as f32 {
        return Err(InputError::InvalidInput(format!(
            "invalid vox_offset: {vox_offset}"
        )));
    }

    Ok(NiftiHeader {
        shape,
        spacing,
        datatype,
        vox_offset: vox_offset as usize,
        scl_slope: r.f32(112) as f64,
        scl_inter: r.f32(116) as f64,
        big_endian,
    })
}

struct HeaderReader<'a> {
    bytes: &'a [u8],
    big_endian: bool,
}

impl HeaderReader<'_> {
    fn i16(&self, offset: usize) -> i16 {
        let raw = array_at(self.bytes, offset);
        if self.big_endian {
            i16::from_be_bytes(raw)
        } else {
            i16::from_le_bytes(raw)
        }
    }

    fn f32(&self, offset: usize) -> f32 {
        let raw = array_at(self.bytes, offset);
        if self.big_endian {
            f32::from_be_bytes(raw)
        } else {
            f32::from_le_bytes(raw)
        }
    }
}

// Callers stay within the fixed-size header that was length-checked up front.
fn array_at<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

macro_rules! decode_as {
    ($raw:expr, $big:expr, $ty:ty) => {{
        const N: usize = std::mem::size_of::<$ty>();
        $raw.chunks_exact(N)
            .map(|chunk| {
                let mut buf = [0u8; N];
                buf.copy_from_slice(chunk);
                let v = if $big {
                    <$ty>::from_be_bytes(buf)
                } else {
                    <$ty>::from_le_bytes(buf)
                };
                v as f64
            })
            .collect::<Vec<f64>>()
    }};
}

fn decode_samples(raw: &[u8], datatype: DataType, big_endian: bool) -> Vec<f64> {
    match datatype {
        DataType::U8 => decode_as!(raw, big_endian, u8),
        DataType::I8 => decode_as!(raw, big_endian, i8),
        DataType::I16 => decode_as!(raw, big_endian, i16),
        DataType::U16 => decode_as!(raw, big_endian, u16),
        DataType::I32 => decode_as!(raw, big_endian, i32),
        DataType::U32 => decode_as!(raw, big_endian, u32),
        DataType::I64 => decode_as!(raw, big_endian, i64),
        DataType::U64 => decode_as!(raw, big_endian, u64),
        DataType::F32 => decode_as!(raw, big_endian, f32),
        DataType::F64 => decode_as!(raw, big_endian, f64),
    }
}

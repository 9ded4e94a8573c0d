// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use core::fmt;
use std::str::FromStr;

/// Four character pixel format code, as used by V4L2.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct FourCC(pub [u8; 4]);

/// RGB 24-bit pixel format (8 bits per channel, no alpha)
pub const RGB3: FourCC = FourCC(*b"RGB3");

/// RGBX 32-bit pixel format (8 bits per channel, unused alpha)
pub const RGBX: FourCC = FourCC(*b"RGBX");

/// RGBA 32-bit pixel format (8 bits per channel, with alpha)
pub const RGBA: FourCC = FourCC(*b"RGBA");

/// RGB565 16-bit pixel format (typical framebuffer format)
pub const RGBP: FourCC = FourCC(*b"RGBP");

/// YUYV 4:2:2 YUV packed format (common camera output format)
pub const YUYV: FourCC = FourCC(*b"YUYV");

/// NV12 4:2:0 YUV semi-planar format
pub const NV12: FourCC = FourCC(*b"NV12");

impl From<FourCC> for u32 {
    fn from(value: FourCC) -> Self {
        u32::from_le_bytes(value.0)
    }
}

impl From<u32> for FourCC {
    fn from(value: u32) -> Self {
        FourCC(value.to_le_bytes())
    }
}

impl FromStr for FourCC {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes: [u8; 4] = s
            .as_bytes()
            .try_into()
            .map_err(|_| format!("fourcc must be 4 characters: {:?}", s))?;
        Ok(FourCC(bytes))
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FourCC({})", self)
    }
}

/// Bytes per row of a tightly packed image, `None` for unknown formats or
/// on overflow.
pub const fn format_row_stride(format: FourCC, width: usize) -> Option<usize> {
    let bpp = match format.0 {
        [b'R', b'G', b'B', b'3'] => 3,
        [b'R', b'G', b'B', b'X'] | [b'R', b'G', b'B', b'A'] => 4,
        [b'R', b'G', b'B', b'P'] | [b'Y', b'U', b'Y', b'V'] => 2,
        [b'N', b'V', b'1', b'2'] => 1,
        _ => return None,
    };
    width.checked_mul(bpp)
}

/// Geometry and format of the frames on one side of the transcoder.
///
/// `image_size` is what sizes the bounce buffer. The remaining fields
/// describe the frame for diagnostics, the codec is not configured with them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImageDescription {
    pub width: usize,
    pub height: usize,
    pub line_length: usize,
    pub image_size: usize,
    pub format: FourCC,
}

impl ImageDescription {
    /// Describes a tightly packed image of a known format, `None` if the
    /// format is unknown or the size does not fit in `usize`.
    pub fn packed(width: usize, height: usize, format: FourCC) -> Option<Self> {
        let line_length = format_row_stride(format, width)?;
        let luma = line_length.checked_mul(height)?;
        // NV12 carries a half height chroma plane after the luma plane.
        let image_size = if format == NV12 {
            luma.checked_add(line_length.checked_mul(height.div_ceil(2))?)?
        } else {
            luma
        };
        Some(Self {
            width,
            height,
            line_length,
            image_size,
            format,
        })
    }
}

impl fmt::Display for ImageDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}x{} {} stride:{} size:{}",
            self.width, self.height, self.format, self.line_length, self.image_size
        )
    }
}

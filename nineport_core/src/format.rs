// Copyright 2026 the Nineport Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! API surface formats, native pixel formats, and the table between them.
//!
//! [`Format`] is the application-facing enumeration; discriminants are the
//! wire values applications pass in. [`PixelFormat`] is what the window system
//! reports for display modes. [`to_native`] and [`to_api`] translate through a
//! single static table. Anything missing from the table maps to the
//! respective `Unknown` and logs a warning.

/// Builds a four-character code the way the API packs them.
#[must_use]
pub const fn fourcc(code: [u8; 4]) -> u32 {
    u32::from_le_bytes(code)
}

/// Application-facing surface formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u32)]
pub enum Format {
    /// Unspecified or unmappable.
    #[default]
    Unknown = 0,
    /// 24-bit RGB.
    R8G8B8 = 20,
    /// 32-bit ARGB.
    A8R8G8B8 = 21,
    /// 32-bit RGB with an unused byte.
    X8R8G8B8 = 22,
    /// 16-bit RGB 5:6:5.
    R5G6B5 = 23,
    /// 16-bit RGB 5:5:5 with an unused bit.
    X1R5G5B5 = 24,
    /// 16-bit ARGB 1:5:5:5.
    A1R5G5B5 = 25,
    /// 16-bit ARGB 4:4:4:4.
    A4R4G4B4 = 26,
    /// 8-bit RGB 3:3:2.
    R3G3B2 = 27,
    /// 16-bit RGB 4:4:4 with unused bits.
    X4R4G4B4 = 30,
    /// 32-bit ABGR.
    A8B8G8R8 = 32,
    /// 32-bit BGR with an unused byte.
    X8B8G8R8 = 33,
    /// 32-bit ARGB 2:10:10:10.
    A2R10G10B10 = 35,
    /// 32-bit depth.
    D32 = 71,
    /// 24-bit depth, 8-bit stencil.
    D24S8 = 75,
    /// 24-bit depth with unused bits.
    D24X8 = 77,
    /// 16-bit depth.
    D16 = 80,
    /// Packed YUV 4:2:2, `UYVY` order.
    Uyvy = fourcc(*b"UYVY"),
    /// Packed YUV 4:2:2, `YUY2` order.
    Yuy2 = fourcc(*b"YUY2"),
    /// Planar YUV 4:2:0 with interleaved chroma.
    Nv12 = fourcc(*b"NV12"),
}

impl Format {
    /// Returns the raw API value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self as u32
    }
}

/// Native pixel formats reported by the window system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Unspecified or unmappable.
    #[default]
    Unknown,
    /// 8-bit palette index.
    Index8,
    /// 8-bit RGB 3:3:2.
    Rgb332,
    /// 12-bit RGB.
    Rgb444,
    /// 15-bit RGB.
    Rgb555,
    /// 16-bit ARGB 4:4:4:4.
    Argb4444,
    /// 16-bit ABGR 1:5:5:5.
    Abgr1555,
    /// 16-bit RGB 5:6:5.
    Rgb565,
    /// 24-bit RGB in a 32-bit word.
    Rgb888,
    /// 32-bit RGBX.
    Rgbx8888,
    /// 32-bit BGRX.
    Bgrx8888,
    /// 32-bit ARGB.
    Argb8888,
    /// 32-bit ABGR.
    Abgr8888,
    /// 32-bit ARGB 2:10:10:10.
    Argb2101010,
    /// Packed YUV 4:2:2, `UYVY` order.
    Uyvy,
    /// Packed YUV 4:2:2, `YUY2` order.
    Yuy2,
    /// Planar YUV 4:2:0 with interleaved chroma.
    Nv12,
}

const FORMAT_TABLE: [(Format, PixelFormat); 16] = [
    (Format::Unknown, PixelFormat::Unknown),
    (Format::R3G3B2, PixelFormat::Rgb332),
    (Format::X4R4G4B4, PixelFormat::Rgb444),
    (Format::X1R5G5B5, PixelFormat::Rgb555),
    (Format::A4R4G4B4, PixelFormat::Argb4444),
    (Format::A1R5G5B5, PixelFormat::Abgr1555),
    (Format::R5G6B5, PixelFormat::Rgb565),
    (Format::R8G8B8, PixelFormat::Rgb888),
    (Format::X8R8G8B8, PixelFormat::Rgbx8888),
    (Format::X8B8G8R8, PixelFormat::Bgrx8888),
    (Format::A8R8G8B8, PixelFormat::Argb8888),
    (Format::A8B8G8R8, PixelFormat::Abgr8888),
    (Format::A2R10G10B10, PixelFormat::Argb2101010),
    (Format::Uyvy, PixelFormat::Uyvy),
    (Format::Yuy2, PixelFormat::Yuy2),
    (Format::Nv12, PixelFormat::Nv12),
];

/// Maps an API format to the native pixel format.
#[must_use]
pub fn to_native(format: Format) -> PixelFormat {
    match FORMAT_TABLE.iter().find(|(api, _)| *api == format) {
        Some(&(_, native)) => native,
        None => {
            log::warn!("No matching native pixel format for format {format:?}.");
            PixelFormat::Unknown
        }
    }
}

/// Maps a native pixel format to the API format.
#[must_use]
pub fn to_api(format: PixelFormat) -> Format {
    match FORMAT_TABLE.iter().find(|(_, native)| *native == format) {
        Some(&(api, _)) => api,
        None => {
            log::warn!("No matching API format for pixel format {format:?}.");
            Format::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FORMAT_TABLE, Format, PixelFormat, fourcc, to_api, to_native};

    #[test]
    fn wire_values_match_the_api() {
        assert_eq!(Format::X8R8G8B8.raw(), 22);
        assert_eq!(Format::A2R10G10B10.raw(), 35);
        assert_eq!(Format::Uyvy.raw(), 0x5956_5955);
        assert_eq!(fourcc(*b"NV12"), Format::Nv12.raw());
    }

    #[test]
    fn table_is_a_bijection() {
        for (i, (api, native)) in FORMAT_TABLE.iter().enumerate() {
            for (other_api, other_native) in &FORMAT_TABLE[i + 1..] {
                assert_ne!(api, other_api, "duplicate API entry");
                assert_ne!(native, other_native, "duplicate native entry");
            }
            assert_eq!(to_native(*api), *native);
            assert_eq!(to_api(*native), *api);
        }
    }

    #[test]
    fn common_display_formats() {
        assert_eq!(to_native(Format::X8R8G8B8), PixelFormat::Rgbx8888);
        assert_eq!(to_api(PixelFormat::Rgb565), Format::R5G6B5);
    }

    #[test]
    fn unmapped_formats_fall_back_to_unknown() {
        assert_eq!(to_native(Format::D24S8), PixelFormat::Unknown);
        assert_eq!(to_api(PixelFormat::Index8), Format::Unknown);
    }
}

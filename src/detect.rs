//! Content-based image detection.
//!
//! File extensions are never consulted: a file is an image when its header
//! matches one of the known magic-byte signatures below. Signatures follow
//! https://www.garykessler.net/library/file_sigs.html.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Enough header to reach the DICOM preamble marker at offset 128.
const HEADER_LEN: u64 = 262;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Jpeg2000,
    JpegXl,
    Png,
    Gif,
    Webp,
    Cr2,
    Tiff,
    Bmp,
    JpegXr,
    Psd,
    Ico,
    Heif,
    Avif,
    Dicom,
    Xcf,
    Dwg,
}

impl ImageKind {
    /// Match order matters where signatures overlap: CR2 is a TIFF container.
    pub const ALL: [ImageKind; 17] = [
        ImageKind::Jpeg,
        ImageKind::Jpeg2000,
        ImageKind::JpegXl,
        ImageKind::Png,
        ImageKind::Gif,
        ImageKind::Webp,
        ImageKind::Cr2,
        ImageKind::Tiff,
        ImageKind::Bmp,
        ImageKind::JpegXr,
        ImageKind::Psd,
        ImageKind::Ico,
        ImageKind::Heif,
        ImageKind::Avif,
        ImageKind::Dicom,
        ImageKind::Xcf,
        ImageKind::Dwg,
    ];

    fn matches(self, buf: &[u8]) -> bool {
        match self {
            ImageKind::Jpeg => buf.starts_with(&[0xFF, 0xD8, 0xFF]),
            ImageKind::Jpeg2000 => {
                buf.starts_with(&[
                    0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
                ]) || buf.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
            }
            ImageKind::JpegXl => {
                buf.starts_with(&[0xFF, 0x0A])
                    || buf.starts_with(&[
                        0x00, 0x00, 0x00, 0x0C, 0x4A, 0x58, 0x4C, 0x20, 0x0D, 0x0A, 0x87, 0x0A,
                    ])
            }
            ImageKind::Png => {
                buf.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
            }
            ImageKind::Gif => buf.starts_with(b"GIF87a") || buf.starts_with(b"GIF89a"),
            ImageKind::Webp => buf.starts_with(b"RIFF") && at(buf, 8, b"WEBP"),
            ImageKind::Cr2 => {
                (buf.starts_with(b"II*\0") || buf.starts_with(b"MM\0*")) && at(buf, 8, b"CR")
            }
            ImageKind::Tiff => buf.starts_with(b"II*\0") || buf.starts_with(b"MM\0*"),
            ImageKind::Bmp => buf.starts_with(b"BM"),
            ImageKind::JpegXr => buf.starts_with(&[0x49, 0x49, 0xBC]),
            ImageKind::Psd => buf.starts_with(b"8BPS"),
            ImageKind::Ico => buf.starts_with(&[0x00, 0x00, 0x01, 0x00]),
            ImageKind::Heif => {
                at(buf, 4, b"ftyp")
                    && [b"heic", b"heix", b"hevc", b"hevx", b"mif1", b"msf1"]
                        .iter()
                        .any(|brand| at(buf, 8, *brand))
            }
            ImageKind::Avif => {
                at(buf, 4, b"ftyp") && (at(buf, 8, b"avif") || at(buf, 8, b"avis"))
            }
            ImageKind::Dicom => at(buf, 128, b"DICM"),
            ImageKind::Xcf => buf.starts_with(b"gimp xcf"),
            ImageKind::Dwg => buf.starts_with(b"AC10"),
        }
    }
}

fn at(buf: &[u8], offset: usize, needle: &[u8]) -> bool {
    buf.get(offset..offset + needle.len()) == Some(needle)
}

/// Identifies the image kind of an in-memory header, if any.
pub fn sniff(header: &[u8]) -> Option<ImageKind> {
    ImageKind::ALL.into_iter().find(|kind| kind.matches(header))
}

/// Reads the start of `path` and identifies its image kind.
pub fn image_kind(path: &Path) -> io::Result<Option<ImageKind>> {
    let mut header = Vec::with_capacity(HEADER_LEN as usize);
    File::open(path)?.take(HEADER_LEN).read_to_end(&mut header)?;
    Ok(sniff(&header))
}

pub fn is_image(path: &Path) -> io::Result<bool> {
    Ok(image_kind(path)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), Some(ImageKind::Jpeg));
        assert_eq!(
            sniff(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR"),
            Some(ImageKind::Png)
        );
        assert_eq!(sniff(b"GIF89a\x01\x00"), Some(ImageKind::Gif));
        assert_eq!(sniff(b"RIFF\x10\0\0\0WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(sniff(b"BM\x36\0\0\0"), Some(ImageKind::Bmp));
        assert_eq!(sniff(b"\0\0\0\x18ftypheic\0\0\0\0"), Some(ImageKind::Heif));
        assert_eq!(sniff(b"\0\0\0\x1cftypavif\0\0\0\0"), Some(ImageKind::Avif));
    }

    #[test]
    fn cr2_wins_over_plain_tiff() {
        assert_eq!(sniff(b"II*\0\x10\0\0\0CR\x02\0"), Some(ImageKind::Cr2));
        assert_eq!(sniff(b"MM\0*\0\0\0\x08\0\0"), Some(ImageKind::Tiff));
    }

    #[test]
    fn dicom_marker_sits_after_preamble() {
        let mut header = vec![0u8; 128];
        header.extend_from_slice(b"DICM");
        assert_eq!(sniff(&header), Some(ImageKind::Dicom));
        assert_eq!(sniff(&header[..130]), None);
    }

    #[test]
    fn is_image_reads_content_not_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let disguised = tmp.path().join("photo.dat");
        let liar = tmp.path().join("photo.png");
        std::fs::write(&disguised, b"GIF87a\x01\x00\x01\x00").unwrap();
        std::fs::write(&liar, b"plain text").unwrap();

        assert!(is_image(&disguised).unwrap());
        assert!(!is_image(&liar).unwrap());
        assert!(is_image(&tmp.path().join("missing")).is_err());
    }

    #[test]
    fn rejects_non_images() {
        assert_eq!(sniff(b""), None);
        assert_eq!(sniff(b"hello world"), None);
        assert_eq!(sniff(b"%PDF-1.7"), None);
        assert_eq!(sniff(b"PK\x03\x04"), None);
        assert_eq!(sniff(b"RIFF\x10\0\0\0WAVEfmt "), None);
        assert_eq!(sniff(&[0xFF, 0xD8]), None);
    }
}

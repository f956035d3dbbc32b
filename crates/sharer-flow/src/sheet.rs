//! Printable recovery sheet
//!
//! Two parts, one per QR code. Each part repeats the security code in clear
//! (it is never inside a QR code), the recovery steps, and a short technical
//! note. Security rests on the secrecy of the shares and the code, not on
//! hiding the algorithm, so the note names it.
//!
//! Rendering QR images and laying out the document are left to
//! [`QrRenderer`] and [`SheetRenderer`] implementations.

use std::fmt::Write;

use sharer_core::Half;

use crate::seal::SealedSecret;

pub const TITLE: &str = "Confidential Information Document";

pub const WHAT_IS_THIS: &str = "This document contains important passwords and confidential \
information. The information is split between two parts for security - both parts are needed \
to access it.";

pub const INSTRUCTIONS: [&str; 6] = [
    "Open your phone camera and point it at the QR code above",
    "Tap the notification to open the website",
    "The website will ask you to scan the second QR code",
    "Get the other part of this document and scan its QR code",
    "Enter the security code shown above when prompted",
    "The information will be displayed on the screen",
];

pub const KEEP_APART: &str = "This part and the other part must be kept in different locations. \
Both parts and the security code (printed above) are required to access the information.";

/// One printed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetPart {
    /// 1 or 2
    pub number: u8,
    pub half: Half,
    /// What the main QR code encodes (the carrier URL)
    pub qr_payload: String,
    /// Bare payload for scanners without URL support
    pub fallback_payload: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecoverySheet {
    pub parts: [SheetPart; 2],
    security_code: String,
    pub technical_note: String,
}

impl RecoverySheet {
    pub fn new(sealed: &SealedSecret, pbkdf2_iterations: u32) -> Self {
        let part = |number: u8, half: Half| SheetPart {
            number,
            half,
            qr_payload: sealed.payloads.url(half).to_string(),
            fallback_payload: sealed.payloads.bare(half).map(str::to_string),
        };

        Self {
            parts: [part(1, Half::Data), part(2, Half::Key)],
            security_code: sealed.security_code.expose().to_string(),
            technical_note: technical_note(pbkdf2_iterations),
        }
    }

    /// The code printed on both parts.
    pub fn security_code(&self) -> &str {
        &self.security_code
    }

    /// Render every QR image the document needs.
    pub fn qr_images<R: QrRenderer + ?Sized>(&self, renderer: &R) -> anyhow::Result<QrImageSet> {
        let [data, key] = &self.parts;
        let fallback = |part: &SheetPart| {
            part.fallback_payload
                .as_deref()
                .map(|payload| renderer.render(payload))
                .transpose()
        };

        Ok(QrImageSet {
            data_qr: renderer.render(&data.qr_payload)?,
            key_qr: renderer.render(&key.qr_payload)?,
            data_only_qr: fallback(data)?,
            key_only_qr: fallback(key)?,
        })
    }
}

impl Drop for RecoverySheet {
    fn drop(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.security_code);
    }
}

fn technical_note(iterations: u32) -> String {
    format!(
        "Technical details: Data encrypted with AES-256-GCM (IV: first 12 bytes), compressed \
         with gzip, encoded in base64. One QR contains the encrypted data, the other contains \
         the base encryption key. The security code is combined with the base key using \
         PBKDF2-HMAC-SHA256 ({iterations} iterations) to derive the final encryption key."
    )
}

/// Encoded QR images, e.g. PNG bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImageSet {
    pub data_qr: Vec<u8>,
    pub key_qr: Vec<u8>,
    pub data_only_qr: Option<Vec<u8>>,
    pub key_only_qr: Option<Vec<u8>>,
}

/// Turns a payload string into a QR image.
pub trait QrRenderer {
    fn render(&self, payload: &str) -> anyhow::Result<Vec<u8>>;
}

/// Lays out a recovery sheet as a document.
pub trait SheetRenderer {
    type Output;

    fn render(&self, sheet: &RecoverySheet) -> anyhow::Result<Self::Output>;
}

/// Plain-text layout, pages separated by a form feed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextSheetRenderer;

impl SheetRenderer for TextSheetRenderer {
    type Output = String;

    fn render(&self, sheet: &RecoverySheet) -> anyhow::Result<String> {
        let mut out = String::new();
        for (i, part) in sheet.parts.iter().enumerate() {
            if i > 0 {
                out.push('\u{c}');
                out.push('\n');
            }
            write_part(&mut out, sheet, part)?;
        }
        Ok(out)
    }
}

fn write_part(out: &mut String, sheet: &RecoverySheet, part: &SheetPart) -> std::fmt::Result {
    writeln!(out, "{TITLE}")?;
    writeln!(out, "Part {} of 2", part.number)?;
    writeln!(out)?;
    writeln!(out, "What is this?")?;
    writeln!(out, "{WHAT_IS_THIS}")?;
    writeln!(out)?;
    writeln!(out, "QR code ({}):", part.half)?;
    writeln!(out, "{}", part.qr_payload)?;
    if let Some(fallback) = &part.fallback_payload {
        writeln!(out, "Without URL support, scan this instead:")?;
        writeln!(out, "{fallback}")?;
    }
    writeln!(out)?;
    writeln!(out, "SECURITY CODE: {}", sheet.security_code())?;
    writeln!(out)?;
    writeln!(out, "How to access the information:")?;
    for (n, step) in INSTRUCTIONS.iter().enumerate() {
        writeln!(out, "  {}. {step}", n + 1)?;
    }
    writeln!(out)?;
    writeln!(out, "Important: Both parts and the security code are required!")?;
    writeln!(out, "{KEEP_APART}")?;
    writeln!(out)?;
    writeln!(out, "The other QR code is located at: ______________________________")?;
    writeln!(out)?;
    writeln!(out, "{}", sheet.technical_note)
}

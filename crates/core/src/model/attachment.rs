use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttachmentError {
    #[error("attachment name cannot be empty")]
    EmptyName,

    #[error("cannot attach {name:?}: only PNG, JPG and PDF files are supported")]
    Unsupported { name: String },

    #[error("attachment data is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

//
// ─── CODEC ─────────────────────────────────────────────────────────────────────
//

/// Encode raw file bytes for embedding in a snapshot (standard alphabet, padded).
#[must_use]
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Inverse of [`encode`].
///
/// # Errors
///
/// Returns `AttachmentError::Decode` on non-alphabet characters or bad padding.
pub fn decode(text: &str) -> Result<Vec<u8>, AttachmentError> {
    Ok(STANDARD.decode(text)?)
}

/// Rendering strategy for an attachment, picked from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
    Unsupported,
}

impl AttachmentKind {
    #[must_use]
    pub fn classify(file_name: &str) -> Self {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return AttachmentKind::Unsupported;
        };
        match ext.to_ascii_lowercase().as_str() {
            "png" | "jpg" | "jpeg" => AttachmentKind::Image,
            "pdf" => AttachmentKind::Pdf,
            _ => AttachmentKind::Unsupported,
        }
    }
}

//
// ─── ATTACHMENT RECORD ─────────────────────────────────────────────────────────
//

/// A user-uploaded file stored inline as encoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(rename = "b64")]
    pub encoded: String,
}

impl Attachment {
    /// Build an attachment from an upload, rejecting file kinds that cannot
    /// be previewed.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::EmptyName` or `AttachmentError::Unsupported`.
    pub fn from_upload(name: impl Into<String>, bytes: &[u8]) -> Result<Self, AttachmentError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AttachmentError::EmptyName);
        }
        if AttachmentKind::classify(&name) == AttachmentKind::Unsupported {
            return Err(AttachmentError::Unsupported { name });
        }
        Ok(Self {
            encoded: encode(bytes),
            name,
        })
    }

    #[must_use]
    pub fn kind(&self) -> AttachmentKind {
        AttachmentKind::classify(&self.name)
    }

    /// Decode the stored payload.
    ///
    /// # Errors
    ///
    /// Returns `AttachmentError::Decode` if the stored text is malformed.
    pub fn bytes(&self) -> Result<Vec<u8>, AttachmentError> {
        decode(&self.encoded)
    }

    /// Prepare this attachment for display. Never fails: a payload that does
    /// not decode becomes [`AttachmentPreview::Broken`].
    #[must_use]
    pub fn preview(&self) -> AttachmentPreview {
        match self.kind() {
            AttachmentKind::Unsupported => AttachmentPreview::Unsupported,
            AttachmentKind::Image => match self.bytes() {
                Ok(bytes) => AttachmentPreview::Image { bytes },
                Err(err) => AttachmentPreview::Broken {
                    reason: err.to_string(),
                },
            },
            // PDFs are embedded as a data URI; still verify the payload decodes.
            AttachmentKind::Pdf => match self.bytes() {
                Ok(_) => AttachmentPreview::Pdf {
                    data_uri: format!("data:application/pdf;base64,{}", self.encoded),
                },
                Err(err) => AttachmentPreview::Broken {
                    reason: err.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachmentPreview {
    Image { bytes: Vec<u8> },
    Pdf { data_uri: String },
    Unsupported,
    Broken { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_roundtrips_arbitrary_bytes() {
        let bytes: Vec<u8> = (0..=255u8).chain([0, 0, 255]).collect();
        let text = encode(&bytes);
        assert_eq!(decode(&text).unwrap(), bytes);
        assert_eq!(encode(b""), "");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn codec_matches_standard_alphabet_with_padding() {
        assert_eq!(encode(b"hi"), "aGk=");
        assert_eq!(encode(&[0xfb, 0xff]), "+/8=");
    }

    #[test]
    fn decode_rejects_malformed_input() {
        assert!(matches!(decode("not base64!"), Err(AttachmentError::Decode(_))));
        assert!(matches!(decode("aGk"), Err(AttachmentError::Decode(_))));
        assert!(matches!(decode("a=Gk"), Err(AttachmentError::Decode(_))));
    }

    #[test]
    fn classify_uses_extension_case_insensitively() {
        assert_eq!(AttachmentKind::classify("diagram.PNG"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::classify("notes.final.jpeg"), AttachmentKind::Image);
        assert_eq!(AttachmentKind::classify("scan.Pdf"), AttachmentKind::Pdf);
        assert_eq!(AttachmentKind::classify("notes.txt"), AttachmentKind::Unsupported);
        assert_eq!(AttachmentKind::classify("README"), AttachmentKind::Unsupported);
    }

    #[test]
    fn from_upload_rejects_unsupported_and_unnamed_files() {
        assert_eq!(
            Attachment::from_upload("  ", b"x").unwrap_err(),
            AttachmentError::EmptyName
        );
        assert!(matches!(
            Attachment::from_upload("a.docx", b"x"),
            Err(AttachmentError::Unsupported { .. })
        ));
        let ok = Attachment::from_upload("dfa.png", b"\x89PNG").unwrap();
        assert_eq!(ok.bytes().unwrap(), b"\x89PNG");
    }

    #[test]
    fn preview_marks_broken_payloads_without_failing() {
        let broken = Attachment {
            name: "a.png".into(),
            encoded: "%%%".into(),
        };
        assert!(matches!(broken.preview(), AttachmentPreview::Broken { .. }));

        let pdf = Attachment {
            name: "sol.pdf".into(),
            encoded: encode(b"%PDF-1.4"),
        };
        assert_eq!(
            pdf.preview(),
            AttachmentPreview::Pdf {
                data_uri: format!("data:application/pdf;base64,{}", encode(b"%PDF-1.4")),
            }
        );

        let other = Attachment {
            name: "a.zip".into(),
            encoded: "%%%".into(),
        };
        assert_eq!(other.preview(), AttachmentPreview::Unsupported);
    }
}

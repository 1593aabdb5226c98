//! Text encoding and decoding for file content.

use crate::diagnostic::VfsError;

/// Character encoding used to read or write a file's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// UTF-8. Text is stored and returned as written, byte-order mark included.
    #[default]
    Utf8,
    /// ISO-8859-1: one byte per character, U+0000..=U+00FF.
    Latin1,
}

impl Encoding {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf8",
            Self::Latin1 => "latin1",
        }
    }
}

/// Decode stored bytes as text.
pub fn decode(path: &str, bytes: &[u8], encoding: Encoding) -> Result<String, VfsError> {
    match encoding {
        Encoding::Utf8 => std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| VfsError::Encoding {
                path: path.into(),
                encoding: encoding.name(),
            }),
        Encoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
    }
}

/// Encode text into bytes for storage.
pub fn encode(path: &str, text: &str, encoding: Encoding) -> Result<Vec<u8>, VfsError> {
    match encoding {
        Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
        Encoding::Latin1 => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| VfsError::Encoding {
                path: path.into(),
                encoding: encoding.name(),
            }),
    }
}

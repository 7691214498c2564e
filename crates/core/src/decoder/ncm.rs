//! NCM container decryption.
//!
//! Container layout (all integers little-endian):
//!
//! ```text
//! "CTENFDAM" | 2 gap | key_len u32 | key (xor 0x64, AES-128-ECB)
//!            | meta_len u32 | meta (xor 0x63, base64, AES-128-ECB)
//!            | crc u32 | 5 gap | image_len u32 | image
//!            | audio (masked with the key box)
//! ```

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, KeyInit};
use aes::Aes128;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

use super::error::DecodeError;
use super::traits::Decoder;
use crate::conversion::MetadataRecord;

pub(crate) const MAGIC: &[u8; 8] = b"CTENFDAM";
pub(crate) const CORE_KEY: [u8; 16] = *b"hzHRAmso5kInbaxW";
pub(crate) const META_KEY: [u8; 16] = *b"#14ljk_!\\]&0U<'(";
pub(crate) const KEY_XOR: u8 = 0x64;
pub(crate) const META_XOR: u8 = 0x63;
pub(crate) const KEY_PREFIX: &[u8] = b"neteasecloudmusic";
pub(crate) const META_PREFIX: &[u8] = b"163 key(Don't modify):";
pub(crate) const META_JSON_PREFIX: &[u8] = b"music:";

/// Upper bound for the key and metadata sections.
const MAX_HEADER_SECTION: u32 = 16 * 1024 * 1024;
const CHUNK_SIZE: usize = 0x8000;

/// Decoder for NetEase Cloud Music `.ncm` containers.
#[derive(Debug, Clone, Default)]
pub struct NcmDecoder;

impl NcmDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decrypts `source` into `target` on the current thread.
    pub fn decode_file(source: &Path, target: &Path) -> Result<MetadataRecord, DecodeError> {
        let mut reader = BufReader::new(File::open(source)?);
        let header = Header::read(&mut reader)?;

        let mut writer = BufWriter::new(File::create(target)?);
        let written = header.key_box.unmask_stream(&mut reader, &mut writer)?;
        writer.flush()?;

        debug!(
            source = %source.display(),
            bytes = written,
            format = header.audio_format.as_deref().unwrap_or("unknown"),
            "Decrypted audio stream"
        );
        if header.audio_format.as_deref() == Some("mp3") {
            warn!(
                source = %source.display(),
                "Container holds an MP3 stream; lossless output keeps it as-is"
            );
        }

        Ok(header.metadata)
    }
}

#[async_trait]
impl Decoder for NcmDecoder {
    fn name(&self) -> &str {
        "ncm"
    }

    async fn decode(&self, source: &Path, target: &Path) -> Result<MetadataRecord, DecodeError> {
        let source = source.to_path_buf();
        let target = target.to_path_buf();
        tokio::task::spawn_blocking(move || Self::decode_file(&source, &target))
            .await
            .map_err(|e| DecodeError::Other(format!("decoder task failed: {e}")))?
    }
}

/// Everything in front of the audio stream.
struct Header {
    key_box: KeyBox,
    metadata: MetadataRecord,
    audio_format: Option<String>,
}

impl Header {
    fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let magic = read_section(reader, MAGIC.len(), "magic")?;
        if magic != MAGIC {
            return Err(DecodeError::InvalidMagic);
        }
        skip(reader, 2, "header gap")?;

        let key_len = read_len(reader, "key length")?;
        let mut key = read_section(reader, key_len, "key")?;
        key.iter_mut().for_each(|b| *b ^= KEY_XOR);
        aes_ecb_decrypt(&CORE_KEY, &mut key, "key")?;
        let key = key
            .strip_prefix(KEY_PREFIX)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DecodeError::crypto("key", "missing key prefix"))?;
        let key_box = KeyBox::new(key);

        let meta_len = read_len(reader, "metadata length")?;
        let (metadata, audio_format) = if meta_len == 0 {
            (MetadataRecord::default(), None)
        } else {
            let raw = read_section(reader, meta_len, "metadata")?;
            parse_metadata(raw)?
        };

        // crc32 followed by an unused gap
        skip(reader, 9, "crc")?;
        let image_len = read_u32(reader, "image length")?;
        skip(reader, u64::from(image_len), "cover image")?;

        Ok(Self {
            key_box,
            metadata,
            audio_format,
        })
    }
}

/// Keystream table derived from the container key.
#[derive(Clone)]
pub(crate) struct KeyBox([u8; 256]);

impl KeyBox {
    pub(crate) fn new(key: &[u8]) -> Self {
        let mut table = [0u8; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut last = 0usize;
        for i in 0..256 {
            let swap = table[i];
            let c = (swap as usize + last + key[i % key.len()] as usize) & 0xff;
            table[i] = table[c];
            table[c] = swap;
            last = c;
        }
        Self(table)
    }

    fn mask(&self, offset: usize) -> u8 {
        let j = (offset + 1) & 0xff;
        let a = self.0[j] as usize;
        self.0[(a + self.0[(a + j) & 0xff] as usize) & 0xff]
    }

    /// Xors `buf` with the keystream starting at stream offset `start`.
    pub(crate) fn apply(&self, buf: &mut [u8], start: usize) {
        for (i, b) in buf.iter_mut().enumerate() {
            *b ^= self.mask(start + i);
        }
    }

    fn unmask_stream<R: Read, W: Write>(&self, reader: &mut R, writer: &mut W) -> io::Result<u64> {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut offset = 0usize;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            self.apply(&mut buf[..n], offset);
            writer.write_all(&buf[..n])?;
            offset += n;
        }
        Ok(offset as u64)
    }
}

fn parse_metadata(mut raw: Vec<u8>) -> Result<(MetadataRecord, Option<String>), DecodeError> {
    raw.iter_mut().for_each(|b| *b ^= META_XOR);
    let encoded = raw
        .strip_prefix(META_PREFIX)
        .ok_or_else(|| DecodeError::crypto("metadata", "missing metadata prefix"))?;
    let mut decoded = STANDARD
        .decode(encoded)
        .map_err(|e| DecodeError::crypto("metadata", e.to_string()))?;
    aes_ecb_decrypt(&META_KEY, &mut decoded, "metadata")?;
    let json = decoded
        .strip_prefix(META_JSON_PREFIX)
        .ok_or_else(|| DecodeError::crypto("metadata", "missing music prefix"))?;

    let value: Value = serde_json::from_slice(json)?;
    Ok((metadata_from_json(&value), string_field(&value, "format")))
}

fn metadata_from_json(value: &Value) -> MetadataRecord {
    let artist = value.get("artist").and_then(Value::as_array).and_then(|artists| {
        let names: Vec<&str> = artists
            .iter()
            .filter_map(|a| a.get(0).and_then(Value::as_str))
            .collect();
        (!names.is_empty()).then(|| names.join("/"))
    });

    MetadataRecord {
        title: string_field(value, "musicName"),
        artist,
        album: string_field(value, "album"),
        track: value.get("track").and_then(|t| match t {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }),
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn aes_ecb_decrypt(key: &[u8; 16], data: &mut Vec<u8>, section: &'static str) -> Result<(), DecodeError> {
    if data.is_empty() || data.len() % 16 != 0 {
        return Err(DecodeError::crypto(section, "length is not a whole number of blocks"));
    }

    let cipher = Aes128::new(GenericArray::from_slice(key));
    for block in data.chunks_exact_mut(16) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }

    let pad = data[data.len() - 1] as usize;
    if pad == 0 || pad > 16 || data[data.len() - pad..].iter().any(|&b| b as usize != pad) {
        return Err(DecodeError::crypto(section, "invalid padding"));
    }
    data.truncate(data.len() - pad);
    Ok(())
}

fn truncated(e: io::Error, section: &'static str) -> DecodeError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        DecodeError::Truncated { section }
    } else {
        DecodeError::Io(e)
    }
}

fn read_section<R: Read>(reader: &mut R, len: usize, section: &'static str) -> Result<Vec<u8>, DecodeError> {
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).map_err(|e| truncated(e, section))?;
    Ok(buf)
}

fn read_u32<R: Read>(reader: &mut R, section: &'static str) -> Result<u32, DecodeError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| truncated(e, section))?;
    Ok(u32::from_le_bytes(buf))
}

fn read_len<R: Read>(reader: &mut R, section: &'static str) -> Result<usize, DecodeError> {
    let len = read_u32(reader, section)?;
    if len > MAX_HEADER_SECTION {
        return Err(DecodeError::crypto(section, format!("{len} bytes exceeds limit")));
    }
    Ok(len as usize)
}

fn skip<R: Read>(reader: &mut R, len: u64, section: &'static str) -> Result<(), DecodeError> {
    let copied = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if copied != len {
        return Err(DecodeError::Truncated { section });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{ncm_container, NcmFixture};
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, fixture: &NcmFixture) -> std::path::PathBuf {
        let path = dir.path().join("song.ncm");
        std::fs::write(&path, ncm_container(fixture)).unwrap();
        path
    }

    #[test]
    fn test_decode_roundtrip_audio_and_metadata() {
        let dir = TempDir::new().unwrap();
        let audio: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let fixture = NcmFixture {
            audio: audio.clone(),
            metadata_json: Some(
                r#"{"musicName":"Song","artist":[["A",1],["B",2]],"album":"LP","format":"flac"}"#
                    .to_string(),
            ),
            cover: vec![1, 2, 3, 4],
            ..NcmFixture::default()
        };
        let source = write_fixture(&dir, &fixture);
        let target = dir.path().join("song.flac");

        let metadata = NcmDecoder::decode_file(&source, &target).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), audio);
        assert_eq!(metadata.title.as_deref(), Some("Song"));
        assert_eq!(metadata.artist.as_deref(), Some("A/B"));
        assert_eq!(metadata.album.as_deref(), Some("LP"));
        assert_eq!(metadata.track, None);
    }

    #[test]
    fn test_decode_without_metadata() {
        let dir = TempDir::new().unwrap();
        let fixture = NcmFixture {
            audio: b"fLaC-data".to_vec(),
            metadata_json: None,
            ..NcmFixture::default()
        };
        let source = write_fixture(&dir, &fixture);
        let target = dir.path().join("song.flac");

        let metadata = NcmDecoder::decode_file(&source, &target).unwrap();
        assert!(metadata.is_empty());
        assert_eq!(std::fs::read(&target).unwrap(), b"fLaC-data");
    }

    #[test]
    fn test_numeric_track_is_kept() {
        let value: Value = serde_json::from_str(r#"{"musicName":"T","track":7}"#).unwrap();
        let metadata = metadata_from_json(&value);
        assert_eq!(metadata.track.as_deref(), Some("7"));
        assert_eq!(metadata.album, None);
    }

    #[test]
    fn test_bad_magic() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("bad.ncm");
        std::fs::write(&source, b"ID3\x04not an ncm file at all").unwrap();

        let result = NcmDecoder::decode_file(&source, &dir.path().join("bad.flac"));
        assert!(matches!(result, Err(DecodeError::InvalidMagic)));
    }

    #[test]
    fn test_truncated_header() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("short.ncm");
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&[0, 0, 128, 0, 0, 0, 1, 2]);
        std::fs::write(&source, bytes).unwrap();

        let result = NcmDecoder::decode_file(&source, &dir.path().join("short.flac"));
        assert!(matches!(result, Err(DecodeError::Truncated { section: "key" })));
    }

    #[test]
    fn test_keybox_is_symmetric() {
        let key_box = KeyBox::new(b"some key material");
        let original = b"hello world".to_vec();
        let mut data = original.clone();
        key_box.apply(&mut data, 300);
        assert_ne!(data, original);
        key_box.apply(&mut data, 300);
        assert_eq!(data, original);
    }

    #[tokio::test]
    async fn test_async_decode() {
        let dir = TempDir::new().unwrap();
        let fixture = NcmFixture::default();
        let source = write_fixture(&dir, &fixture);
        let target = dir.path().join("song.flac");

        let decoder = NcmDecoder::new();
        assert_eq!(decoder.name(), "ncm");
        decoder.decode(&source, &target).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), fixture.audio);
    }
}

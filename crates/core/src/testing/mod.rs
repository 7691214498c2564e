//! Testing utilities and mock implementations.
//!
//! Mocks stand in for the three external seams of a conversion (the
//! container decoder, the ffmpeg transcoder and the tag writer) so batches
//! can be driven end to end without real `.ncm` files or an ffmpeg binary.
//!
//! # Example
//!
//! ```rust,ignore
//! use ncmconv_core::testing::{MockDecoder, MockTagger, MockTranscoder};
//!
//! let decoder = MockDecoder::new();
//! let transcoder = MockTranscoder::new();
//! let tagger = MockTagger::new();
//!
//! // Configure failures
//! decoder.fail_for("/music/broken.ncm").await;
//! transcoder.set_delay(Duration::from_millis(20)).await;
//!
//! // Use in a ConversionUnit...
//! ```

mod mock_decoder;
mod mock_tagger;
mod mock_transcoder;

pub use mock_decoder::MockDecoder;
pub use mock_tagger::MockTagger;
pub use mock_transcoder::{MockTranscoder, RecordedTranscode};

/// Test fixtures and helper functions.
pub mod fixtures {
    use aes::cipher::generic_array::GenericArray;
    use aes::cipher::{BlockEncrypt, KeyInit};
    use aes::Aes128;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    use crate::decoder::ncm::{
        KeyBox, CORE_KEY, KEY_PREFIX, KEY_XOR, MAGIC, META_JSON_PREFIX, META_KEY, META_PREFIX,
        META_XOR,
    };

    /// Inputs for a synthetic `.ncm` container.
    #[derive(Debug, Clone)]
    pub struct NcmFixture {
        /// Key material for the audio keystream.
        pub key: Vec<u8>,
        /// Plain audio bytes; stored masked.
        pub audio: Vec<u8>,
        /// Metadata JSON without the `music:` prefix. `None` writes an empty section.
        pub metadata_json: Option<String>,
        /// Cover image bytes.
        pub cover: Vec<u8>,
    }

    impl Default for NcmFixture {
        fn default() -> Self {
            Self {
                key: b"1234567890123456789012345678901234567890".to_vec(),
                audio: b"fLaC\x00\x00\x00\x22fixture audio frames".to_vec(),
                metadata_json: Some(
                    r#"{"musicName":"Fixture Song","artist":[["Fixture Artist",1]],"album":"Fixture Album","format":"flac"}"#
                        .to_string(),
                ),
                cover: Vec::new(),
            }
        }
    }

    /// Serializes `fixture` into container bytes.
    pub fn ncm_container(fixture: &NcmFixture) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        out.extend_from_slice(&[0, 0]);

        let mut key = KEY_PREFIX.to_vec();
        key.extend_from_slice(&fixture.key);
        let mut key = aes_ecb_encrypt(&CORE_KEY, &key);
        key.iter_mut().for_each(|b| *b ^= KEY_XOR);
        push_section(&mut out, &key);

        match &fixture.metadata_json {
            Some(json) => {
                let mut plain = META_JSON_PREFIX.to_vec();
                plain.extend_from_slice(json.as_bytes());
                let encoded = STANDARD.encode(aes_ecb_encrypt(&META_KEY, &plain));

                let mut meta = META_PREFIX.to_vec();
                meta.extend_from_slice(encoded.as_bytes());
                meta.iter_mut().for_each(|b| *b ^= META_XOR);
                push_section(&mut out, &meta);
            }
            None => out.extend_from_slice(&0u32.to_le_bytes()),
        }

        // crc32 (unchecked) and gap
        out.extend_from_slice(&[0u8; 9]);
        push_section(&mut out, &fixture.cover);

        let mut audio = fixture.audio.clone();
        KeyBox::new(&fixture.key).apply(&mut audio, 0);
        out.extend_from_slice(&audio);
        out
    }

    fn push_section(out: &mut Vec<u8>, bytes: &[u8]) {
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }

    fn aes_ecb_encrypt(key: &[u8; 16], plain: &[u8]) -> Vec<u8> {
        let pad = 16 - plain.len() % 16;
        let mut data = plain.to_vec();
        data.extend(std::iter::repeat(pad as u8).take(pad));

        let cipher = Aes128::new(GenericArray::from_slice(key));
        for block in data.chunks_exact_mut(16) {
            cipher.encrypt_block(GenericArray::from_mut_slice(block));
        }
        data
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! PCM to WAV wrapping for synthesized speech

/// Sample rate the speech model answers with when the mime type omits it
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

const BITS_PER_SAMPLE: u16 = 16;

/// Parse `rate=` from a mime type like `audio/L16;codec=pcm;rate=24000`
pub fn sample_rate_from_mime(mime: &str) -> u32 {
    mime.split(';')
        .filter_map(|part| part.trim().strip_prefix("rate="))
        .find_map(|rate| rate.parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// True for mime types already carrying a playable container
pub fn is_wav(mime: &str) -> bool {
    let base = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    matches!(base.as_str(), "audio/wav" | "audio/x-wav" | "audio/wave")
}

/// Wrap little-endian 16-bit PCM samples in a RIFF/WAVE header
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32, channels: u16) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(BITS_PER_SAMPLE) / 8;
    let block_align = channels * BITS_PER_SAMPLE / 8;
    let data_size = pcm.len() as u32;

    let mut buf = Vec::with_capacity(44 + pcm.len());
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    // fmt chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    // data chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    buf.extend_from_slice(pcm);
    buf
}

/// Turn a speech payload into WAV bytes, wrapping raw PCM when needed
pub fn to_wav(data: Vec<u8>, mime: &str) -> Vec<u8> {
    if is_wav(mime) {
        data
    } else {
        pcm16_to_wav(&data, sample_rate_from_mime(mime), 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let pcm = vec![0u8; 480];
        let wav = pcm16_to_wav(&pcm, 24_000, 1);

        assert_eq!(wav.len(), 44 + 480);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + 480);
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24_000);
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 48_000);
        assert_eq!(&wav[36..40], b"data");
    }

    #[test]
    fn test_rate_from_mime() {
        assert_eq!(sample_rate_from_mime("audio/L16;codec=pcm;rate=16000"), 16_000);
        assert_eq!(sample_rate_from_mime("audio/L16; rate=44100"), 44_100);
        assert_eq!(sample_rate_from_mime("audio/L16"), DEFAULT_SAMPLE_RATE);
        assert_eq!(sample_rate_from_mime("audio/L16;rate=abc"), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_wav_passthrough() {
        let data = b"RIFF....WAVE".to_vec();
        assert_eq!(to_wav(data.clone(), "audio/wav"), data);
        assert_eq!(to_wav(vec![1, 2], "audio/L16;rate=8000").len(), 46);
    }
}

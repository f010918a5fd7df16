//! Embedded keepalive signal.
//!
//! A one-second silent PCM WAV, generated at runtime and looped at very low
//! volume while a session runs so the output device never idles between
//! cues.

/// Sample rate of the keepalive signal.
pub const KEEPALIVE_SAMPLE_RATE: u32 = 8_000;

/// Length of the WAV header emitted by [`silent_keepalive_wav`].
const WAV_HEADER_LEN: usize = 44;

/// Builds the keepalive signal: mono, 16-bit PCM, one second of silence.
#[must_use]
pub fn silent_keepalive_wav() -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let byte_rate = KEEPALIVE_SAMPLE_RATE * u32::from(block_align);
    let data_len = KEEPALIVE_SAMPLE_RATE * u32::from(block_align);

    let mut wav = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
    // RIFF header
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&CHANNELS.to_le_bytes());
    wav.extend_from_slice(&KEEPALIVE_SAMPLE_RATE.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(WAV_HEADER_LEN + data_len as usize, 0);
    wav
}

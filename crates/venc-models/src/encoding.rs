//! Fixed encoder defaults and reserved flags.

/// Input file flag; may repeat.
pub const FLAG_INPUT: &str = "-i";
/// Output flag. FFmpeg treats `-y` as "overwrite", so `-y <path>` reads as
/// overwrite followed by the positional output file.
pub const FLAG_OUTPUT: &str = "-y";

pub const FLAG_AUDIO_BITRATE: &str = "-ab";
pub const FLAG_AUDIO_SAMPLE_RATE: &str = "-ar";
pub const FLAG_AUDIO_CODEC: &str = "-acodec";
pub const FLAG_VIDEO_CODEC: &str = "-vcodec";
pub const FLAG_PIXEL_FORMAT: &str = "-pix_fmt";
pub const FLAG_FRAME_RATE: &str = "-r";

/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Default audio sample rate
pub const DEFAULT_AUDIO_SAMPLE_RATE: &str = "44100";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default pixel format
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";
/// Default frame rate
pub const DEFAULT_FRAME_RATE: &str = "25";

/// Suffix replacing the input extension on encoded files.
pub const ENCODED_SUFFIX: &str = "-encoded.mp4";
/// Number of trailing characters treated as the input extension (".mov").
pub const INPUT_EXTENSION_LEN: usize = 4;

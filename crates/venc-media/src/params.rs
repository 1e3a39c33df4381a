//! Encoder argument building.
//!
//! Arguments are assembled from three layers of flag/value pairs (base
//! defaults, derived defaults, caller overrides) and flattened into the
//! token list handed to the encoder. The output flag is always forced last.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::info;

use venc_models::encoding::{
    DEFAULT_AUDIO_BITRATE, DEFAULT_AUDIO_CODEC, DEFAULT_AUDIO_SAMPLE_RATE, DEFAULT_FRAME_RATE,
    DEFAULT_PIXEL_FORMAT, DEFAULT_VIDEO_CODEC, FLAG_AUDIO_BITRATE, FLAG_AUDIO_CODEC,
    FLAG_AUDIO_SAMPLE_RATE, FLAG_FRAME_RATE, FLAG_INPUT, FLAG_OUTPUT, FLAG_PIXEL_FORMAT,
    FLAG_VIDEO_CODEC,
};
use venc_models::Job;

/// Value of an encoder flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Emitted once as `flag value`
    Single(String),
    /// Emitted as one `flag value` pair per element, in order
    Multi(Vec<String>),
}

impl ParamValue {
    /// All values in emission order.
    pub fn into_values(self) -> Vec<String> {
        match self {
            ParamValue::Single(v) => vec![v],
            ParamValue::Multi(vs) => vs,
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multi(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Insertion-ordered flag → value mapping. Flag names are unique; setting an
/// existing flag replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeParameters {
    entries: Vec<(String, ParamValue)>,
}

impl EncodeParameters {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag (builder form).
    pub fn with(mut self, flag: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(flag, value);
        self
    }

    /// Set a flag, replacing any existing value at its current position.
    pub fn set(&mut self, flag: impl Into<String>, value: impl Into<ParamValue>) {
        let flag = flag.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(f, _)| *f == flag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((flag, value)),
        }
    }

    /// Get the value of a flag.
    pub fn get(&self, flag: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(f, _)| f == flag).map(|(_, v)| v)
    }

    /// Remove a flag, returning its value.
    pub fn remove(&mut self, flag: &str) -> Option<ParamValue> {
        let idx = self.entries.iter().position(|(f, _)| f == flag)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.get(flag).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate flags in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v))
    }

    /// Apply a higher-precedence layer on top of this one.
    pub fn merge(&mut self, layer: EncodeParameters) {
        for (flag, value) in layer.entries {
            self.set(flag, value);
        }
    }

    /// Flatten into `flag value` tokens.
    pub fn to_args(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|(flag, value)| {
                value
                    .clone()
                    .into_values()
                    .into_iter()
                    .flat_map(move |v| [flag.clone(), v])
            })
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for EncodeParameters
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = EncodeParameters::new();
        for (flag, value) in iter {
            params.set(flag, value);
        }
        params
    }
}

impl Serialize for EncodeParameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (flag, value) in &self.entries {
            map.serialize_entry(flag, value)?;
        }
        map.end()
    }
}

// Keeps document order, which a plain map type would not.
impl<'de> Deserialize<'de> for EncodeParameters {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParamsVisitor;

        impl<'de> Visitor<'de> for ParamsVisitor {
            type Value = EncodeParameters;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of encoder flags to a string or list of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut params = EncodeParameters::new();
                while let Some((flag, value)) = access.next_entry::<String, ParamValue>()? {
                    params.set(flag, value);
                }
                Ok(params)
            }
        }

        deserializer.deserialize_map(ParamsVisitor)
    }
}

/// Derived defaults layer: codecs, pixel format and frame rate.
fn derived_defaults() -> EncodeParameters {
    EncodeParameters::new()
        .with(FLAG_AUDIO_CODEC, DEFAULT_AUDIO_CODEC)
        .with(FLAG_VIDEO_CODEC, DEFAULT_VIDEO_CODEC)
        .with(FLAG_PIXEL_FORMAT, DEFAULT_PIXEL_FORMAT)
        .with(FLAG_FRAME_RATE, DEFAULT_FRAME_RATE)
}

/// Merge all layers into the final parameter mapping.
///
/// Extra inputs may be passed in `overrides` under `-i`; they follow the
/// primary input in order. Relative inputs resolve against the job workpath.
pub fn build_parameters(
    job: &Job,
    input: &str,
    output: &str,
    mut overrides: EncodeParameters,
) -> EncodeParameters {
    let mut inputs = vec![input.to_string()];
    if let Some(extra) = overrides.remove(FLAG_INPUT) {
        inputs.extend(extra.into_values());
    }

    let inputs: Vec<String> = inputs
        .iter()
        .map(|i| job.resolve_path(i).to_string_lossy().into_owned())
        .collect();

    info!(job_id = %job.uid, "action-encode: input file {}", inputs[0]);
    info!(job_id = %job.uid, "action-encode: output file {}", output);

    let mut params = EncodeParameters::new()
        .with(FLAG_INPUT, inputs)
        .with(FLAG_AUDIO_BITRATE, DEFAULT_AUDIO_BITRATE)
        .with(FLAG_AUDIO_SAMPLE_RATE, DEFAULT_AUDIO_SAMPLE_RATE);
    params.merge(derived_defaults());
    params.merge(overrides);

    params.remove(FLAG_OUTPUT);
    params.set(FLAG_OUTPUT, output);

    params
}

/// Build the flattened encoder argument list.
pub fn build_params(
    job: &Job,
    input: &str,
    output: &str,
    overrides: EncodeParameters,
) -> Vec<String> {
    build_parameters(job, input, output, overrides).to_args()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new("/work/job-1")
    }

    fn pairs(args: &[String], flag: &str) -> Vec<String> {
        args.chunks(2)
            .filter(|pair| pair[0] == flag)
            .map(|pair| pair[1].clone())
            .collect()
    }

    #[test]
    fn test_default_args() {
        let args = build_params(&job(), "in.mov", "in-encoded.mp4", EncodeParameters::new());
        assert_eq!(
            args,
            vec![
                "-i", "/work/job-1/in.mov", "-ab", "128k", "-ar", "44100", "-acodec", "aac",
                "-vcodec", "libx264", "-pix_fmt", "yuv420p", "-r", "25", "-y", "in-encoded.mp4",
            ]
        );
    }

    #[test]
    fn test_absolute_input_kept() {
        let args = build_params(&job(), "/media/in.mov", "out.mp4", EncodeParameters::new());
        assert_eq!(pairs(&args, "-i"), vec!["/media/in.mov"]);
    }

    #[test]
    fn test_override_cannot_replace_output() {
        let overrides = EncodeParameters::new()
            .with("-y", "/tmp/elsewhere.mp4")
            .with("-crf", "18");
        let args = build_params(&job(), "in.mov", "in-encoded.mp4", overrides);

        assert_eq!(pairs(&args, "-y"), vec!["in-encoded.mp4"]);
        assert_eq!(&args[args.len() - 2..], ["-y", "in-encoded.mp4"]);
        assert_eq!(pairs(&args, "-crf"), vec!["18"]);
    }

    #[test]
    fn test_override_replaces_defaults_in_place() {
        let overrides = EncodeParameters::new()
            .with("-vcodec", "libx265")
            .with("-ab", "320k");
        let args = build_params(&job(), "in.mov", "out.mp4", overrides);

        assert_eq!(pairs(&args, "-vcodec"), vec!["libx265"]);
        assert_eq!(pairs(&args, "-ab"), vec!["320k"]);
        assert!(!args.contains(&"libx264".to_string()));
        assert_eq!(args[2], "-ab");
    }

    #[test]
    fn test_extra_inputs_keep_order() {
        let overrides = EncodeParameters::new().with("-i", vec!["b.wav", "/abs/c.png"]);
        let args = build_params(&job(), "a.mov", "out.mp4", overrides);

        assert_eq!(
            pairs(&args, "-i"),
            vec!["/work/job-1/a.mov", "/work/job-1/b.wav", "/abs/c.png"]
        );
        assert_eq!(&args[..6], ["-i", "/work/job-1/a.mov", "-i", "/work/job-1/b.wav", "-i", "/abs/c.png"]);
    }

    #[test]
    fn test_single_extra_input() {
        let overrides = EncodeParameters::new().with("-i", "music.mp3");
        let args = build_params(&job(), "a.mov", "out.mp4", overrides);
        assert_eq!(pairs(&args, "-i"), vec!["/work/job-1/a.mov", "/work/job-1/music.mp3"]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let make = || {
            EncodeParameters::new()
                .with("-preset", "slow")
                .with("-movflags", "+faststart")
        };
        let a = build_params(&job(), "a.mov", "out.mp4", make());
        let b = build_params(&job(), "a.mov", "out.mp4", make());
        assert_eq!(a, b);
    }

    #[test]
    fn test_set_replaces_and_remove() {
        let mut params = EncodeParameters::new().with("-r", "25").with("-ab", "128k");
        params.set("-r", "30");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("-r"), Some(&ParamValue::from("30")));
        assert_eq!(params.iter().next().map(|(f, _)| f), Some("-r"));

        assert_eq!(params.remove("-r"), Some(ParamValue::from("30")));
        assert!(!params.contains("-r"));
        assert_eq!(params.remove("-r"), None);
    }

    #[test]
    fn test_deserialize_keeps_document_order() {
        let params: EncodeParameters =
            serde_json::from_str(r#"{"-vf": "scale=1280:-2", "-i": ["x.wav", "y.wav"], "-crf": "20"}"#)
                .unwrap();
        let flags: Vec<&str> = params.iter().map(|(f, _)| f).collect();
        assert_eq!(flags, vec!["-vf", "-i", "-crf"]);
        assert_eq!(params.get("-i"), Some(&ParamValue::from(vec!["x.wav", "y.wav"])));

        let json = serde_json::to_string(&params).unwrap();
        assert!(json.starts_with(r#"{"-vf":"scale=1280:-2""#));
    }
}

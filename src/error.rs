use std::fmt;

#[derive(Debug)]
pub enum TiltKeysError {
    Config(ConfigError),
    #[cfg(feature = "samples")]
    Sample(SampleError),
}

#[derive(Debug)]
pub enum ConfigError {
    Json { message: String },
    NonFinite { field: &'static str },
    NonPositive { field: &'static str },
    InvertedRange { field: &'static str, low: f64, high: f64 },
}

#[cfg(feature = "samples")]
#[derive(Debug)]
pub enum SampleError {
    Wav { message: String },
    Mp3 { message: String },
    EmptyAudio,
}

impl fmt::Display for TiltKeysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiltKeysError::Config(e) => write!(f, "Config error: {e}"),
            #[cfg(feature = "samples")]
            TiltKeysError::Sample(e) => write!(f, "Sample error: {e}"),
        }
    }
}

impl std::error::Error for TiltKeysError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Json { message } => write!(f, "Invalid config JSON: {message}"),
            ConfigError::NonFinite { field } => write!(f, "Field '{field}' must be finite"),
            ConfigError::NonPositive { field } => write!(f, "Field '{field}' must be positive"),
            ConfigError::InvertedRange { field, low, high } => {
                write!(f, "Range '{field}' is inverted: low {low} > high {high}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(feature = "samples")]
impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleError::Wav { message } => write!(f, "WAV decode failed: {message}"),
            SampleError::Mp3 { message } => write!(f, "MP3 decode failed: {message}"),
            SampleError::EmptyAudio => write!(f, "Decoded audio contains no samples"),
        }
    }
}

#[cfg(feature = "samples")]
impl std::error::Error for SampleError {}

impl From<ConfigError> for TiltKeysError {
    fn from(e: ConfigError) -> Self {
        TiltKeysError::Config(e)
    }
}

#[cfg(feature = "samples")]
impl From<SampleError> for TiltKeysError {
    fn from(e: SampleError) -> Self {
        TiltKeysError::Sample(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_wraps_and_formats() {
        let err: TiltKeysError = ConfigError::NonFinite { field: "mapping.pitch_sensitivity" }.into();
        let text = format!("{err}");
        assert!(text.contains("mapping.pitch_sensitivity"), "got: {text}");
    }

    #[cfg(feature = "samples")]
    #[test]
    fn sample_error_wraps_and_formats() {
        let err: TiltKeysError = SampleError::EmptyAudio.into();
        let text = format!("{err}");
        assert!(text.contains("no samples"), "got: {text}");
    }
}

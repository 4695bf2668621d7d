use json::{array, object, JsonValue};
use nalgebra::Matrix3;
use std::fmt;
use std::fs::read_to_string;
use std::str::FromStr;
use thiserror::Error;

/// Index of the background medium in a [MediaSet]
pub const BACKGROUND: usize = 0;
/// Index of the rod medium in a [MediaSet]
pub const ROD: usize = 1;
/// Number of media in a [MediaSet]
pub const NUM_MEDIA: usize = 2;

/// Material parameters of one medium
///
/// * `p`: inverse-permeability-like tensor (enters the differential terms)
/// * `q`: permittivity-like tensor (enters the mass term)
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub p: Matrix3<f64>,
    pub q: Matrix3<f64>,
    /// Display color (RGB)
    pub color: [u8; 3],
}

impl MediaInfo {
    /// Free space: `P = Q = I`
    pub fn vacuum() -> Self {
        Self {
            p: Matrix3::identity(),
            q: Matrix3::identity(),
            color: [255, 255, 255],
        }
    }

    /// Non-magnetic isotropic dielectric with relative permittivity `eps_r`
    pub fn isotropic(eps_r: f64, color: [u8; 3]) -> Self {
        Self {
            p: Matrix3::identity(),
            q: Matrix3::identity() * eps_r,
            color,
        }
    }

    fn from_json(media_json: &JsonValue, index: usize) -> Result<Self, MediaError> {
        let color = if media_json["color"].is_null() {
            [0, 0, 0]
        } else {
            parse_color(&media_json["color"], index)?
        };

        Ok(Self {
            p: parse_tensor(&media_json["p"], index, "p")?,
            q: parse_tensor(&media_json["q"], index, "q")?,
            color,
        })
    }

    fn to_json(&self) -> JsonValue {
        object! {
            "p": tensor_to_json(&self.p),
            "q": tensor_to_json(&self.q),
            "color": array![self.color[0], self.color[1], self.color[2]],
        }
    }
}

/// The two media of a photonic-crystal drawing: background (index `0`) and rod (index `1`)
#[derive(Debug, Clone, PartialEq)]
pub struct MediaSet {
    media: [MediaInfo; NUM_MEDIA],
}

impl MediaSet {
    pub fn new(background: MediaInfo, rod: MediaInfo) -> Self {
        Self {
            media: [background, rod],
        }
    }

    /// Look up a medium by index; `None` for anything but `0` or `1`
    pub fn get(&self, index: usize) -> Option<&MediaInfo> {
        self.media.get(index)
    }

    pub fn background(&self) -> &MediaInfo {
        &self.media[BACKGROUND]
    }

    pub fn rod(&self) -> &MediaInfo {
        &self.media[ROD]
    }

    /// Replace one of the two media (configuration only; assembly never mutates media)
    pub fn set(&mut self, index: usize, info: MediaInfo) -> Result<(), MediaError> {
        match self.media.get_mut(index) {
            Some(slot) => {
                *slot = info;
                Ok(())
            }
            None => Err(MediaError::IndexOutOfRange(index)),
        }
    }

    /// Load a MediaSet from a JSON file with the following format:
    ///
    /// ```Text
    /// {
    ///     "Media": [
    ///         { "p": [[3x3]], "q": [[3x3]], "color": [r, g, b] },
    ///         { "p": [[3x3]], "q": [[3x3]], "color": [r, g, b] }
    ///     ]
    /// }
    /// ```
    ///
    /// The first entry is the background and the second the rod.
    pub fn from_file(path: impl AsRef<str>) -> Result<Self, MediaError> {
        let media_file_contents = read_to_string(path.as_ref())?;
        let media = Self::from_json(&json::parse(&media_file_contents)?)?;
        log::info!("Loaded media '{}'", path.as_ref());
        Ok(media)
    }

    pub fn from_json(media_json: &JsonValue) -> Result<Self, MediaError> {
        let entries = &media_json["Media"];
        if !entries.is_array() {
            return Err(MediaError::Format("Media must be an Array!".into()));
        }
        if entries.len() != NUM_MEDIA {
            return Err(MediaError::WrongCount(entries.len()));
        }

        let background = MediaInfo::from_json(&entries[BACKGROUND], BACKGROUND)?;
        let rod = MediaInfo::from_json(&entries[ROD], ROD)?;

        for (index, info) in [&background, &rod].iter().enumerate() {
            if info.q[(2, 2)] == 0.0 {
                log::warn!("Medium {} has Q_zz = 0; its mass term will vanish", index);
            }
        }

        Ok(Self::new(background, rod))
    }

    pub fn to_json(&self) -> JsonValue {
        object! {
            "Media": array![self.media[BACKGROUND].to_json(), self.media[ROD].to_json()],
        }
    }
}

impl Default for MediaSet {
    fn default() -> Self {
        Self::new(MediaInfo::vacuum(), MediaInfo::vacuum())
    }
}

/// Field polarization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveMode {
    /// Transverse electric: solve for `Ez`
    TE,
    /// Transverse magnetic: solve for `Hz`
    TM,
}

impl fmt::Display for WaveMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TE => write!(f, "TE"),
            Self::TM => write!(f, "TM"),
        }
    }
}

impl FromStr for WaveMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TE" => Ok(Self::TE),
            "TM" => Ok(Self::TM),
            _ => Err(MediaError::Format(format!("Unknown wave mode '{}'", s))),
        }
    }
}

/// Maps (wavenumber, medium, mode) to the `(P, Q)` tensors used by the Helmholtz element matrix
pub trait HelmholtzMedia {
    fn helmholtz_tensors(
        &self,
        k0: f64,
        media: &MediaInfo,
        mode: WaveMode,
    ) -> Result<(Matrix3<f64>, Matrix3<f64>), MediaError>;
}

/// Non-dispersive lookup
///
/// * TE: `(P, Q)` as stored
/// * TM: `(Q⁻¹, P⁻¹)` (the roles of the two tensors swap, and each is inverted)
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMedia;

impl HelmholtzMedia for StandardMedia {
    fn helmholtz_tensors(
        &self,
        _k0: f64,
        media: &MediaInfo,
        mode: WaveMode,
    ) -> Result<(Matrix3<f64>, Matrix3<f64>), MediaError> {
        match mode {
            WaveMode::TE => Ok((media.p, media.q)),
            WaveMode::TM => {
                let q_inv = media
                    .q
                    .try_inverse()
                    .ok_or(MediaError::Singular { tensor: "q" })?;
                let p_inv = media
                    .p
                    .try_inverse()
                    .ok_or(MediaError::Singular { tensor: "p" })?;
                Ok((q_inv, p_inv))
            }
        }
    }
}

fn parse_tensor(
    tensor_json: &JsonValue,
    index: usize,
    name: &str,
) -> Result<Matrix3<f64>, MediaError> {
    let malformed = || {
        MediaError::Format(format!(
            "Medium {}'s '{}' must be a 3x3 Array of numbers!",
            index, name
        ))
    };

    if !tensor_json.is_array() || tensor_json.len() != 3 {
        return Err(malformed());
    }

    let mut tensor = Matrix3::zeros();
    for (r, row_json) in tensor_json.members().enumerate() {
        if !row_json.is_array() || row_json.len() != 3 {
            return Err(malformed());
        }
        for (c, value_json) in row_json.members().enumerate() {
            tensor[(r, c)] = value_json.as_f64().ok_or_else(malformed)?;
        }
    }
    Ok(tensor)
}

fn parse_color(color_json: &JsonValue, index: usize) -> Result<[u8; 3], MediaError> {
    let malformed = || {
        MediaError::Format(format!(
            "Medium {}'s color must be an Array of three bytes!",
            index
        ))
    };

    if !color_json.is_array() || color_json.len() != 3 {
        return Err(malformed());
    }
    let mut color = [0; 3];
    for (channel, channel_json) in color.iter_mut().zip(color_json.members()) {
        *channel = channel_json.as_u8().ok_or_else(malformed)?;
    }
    Ok(color)
}

fn tensor_to_json(tensor: &Matrix3<f64>) -> JsonValue {
    JsonValue::from(
        (0..3)
            .map(|r| array![tensor[(r, 0)], tensor[(r, 1)], tensor[(r, 2)]])
            .collect::<Vec<_>>(),
    )
}

/// Errors produced by media configuration and lookup
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Unable to read media file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse media file as JSON: {0}")]
    Parse(#[from] json::Error),
    #[error("Invalid media description: {0}")]
    Format(String),
    #[error("Expected exactly 2 media (background, rod); found {0}")]
    WrongCount(usize),
    #[error("Media index {0} is out of range (expected 0 or 1)")]
    IndexOutOfRange(usize),
    #[error("Tensor '{tensor}' is singular; cannot invert for TM mode!")]
    Singular { tensor: &'static str },
}

/// Global assembly of the ordinary Helmholtz system
pub mod assembly;
/// Local (6x6) quadratic-triangle matrices
pub mod element_matrix;
/// Periodic-cell (K, C, M) assembly for the propagation-constant eigenproblem
pub mod periodic;

use crate::domain::media::{MediaError, WaveMode};

use json::{object, JsonValue};
use std::f64::consts::PI;
use std::fmt;
use std::fs::read_to_string;
use std::str::FromStr;
use thiserror::Error;

/// Axis along which a periodic cell repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicAxis {
    X,
    Y,
}

impl fmt::Display for PeriodicAxis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::Y => write!(f, "Y"),
        }
    }
}

impl FromStr for PeriodicAxis {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            _ => Err(SettingsError::Format(format!("Unknown periodic axis '{}'", s))),
        }
    }
}

/// Parameters of one Helmholtz assembly
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelmholtzSettings {
    /// Free-space wavelength (same length unit as the mesh)
    pub wavelength: f64,
    pub mode: WaveMode,
    /// Only used by periodic assembly
    pub periodic_axis: PeriodicAxis,
    /// Build the damping and mass matrices of the slowly-varying-envelope formulation
    pub svea: bool,
}

impl HelmholtzSettings {
    pub fn new(wavelength: f64, mode: WaveMode) -> Self {
        assert!(
            wavelength > 0.0,
            "Wavelength must be positive ({}); cannot construct HelmholtzSettings!",
            wavelength
        );
        Self {
            wavelength,
            mode,
            periodic_axis: PeriodicAxis::X,
            svea: false,
        }
    }

    pub fn periodic(mut self, axis: PeriodicAxis, svea: bool) -> Self {
        self.periodic_axis = axis;
        self.svea = svea;
        self
    }

    /// Free-space wavenumber `k0 = 2π/λ`
    pub fn k0(&self) -> f64 {
        2.0 * PI / self.wavelength
    }

    /// Load settings from a JSON file with the following format:
    ///
    /// ```Text
    /// {
    ///     "wavelength": 1.55,
    ///     "mode": "TE",
    ///     "periodic_axis": "X",
    ///     "svea": true
    /// }
    /// ```
    ///
    /// `periodic_axis` defaults to `"X"` and `svea` to `false`.
    pub fn from_file(path: impl AsRef<str>) -> Result<Self, SettingsError> {
        let settings_file_contents = read_to_string(path.as_ref())?;
        Self::from_json(&json::parse(&settings_file_contents)?)
    }

    pub fn from_json(settings_json: &JsonValue) -> Result<Self, SettingsError> {
        let wavelength = settings_json["wavelength"]
            .as_f64()
            .filter(|wl| *wl > 0.0)
            .ok_or_else(|| SettingsError::Format("wavelength must be a positive number".into()))?;

        let mode = settings_json["mode"]
            .as_str()
            .ok_or_else(|| SettingsError::Format("mode must be \"TE\" or \"TM\"".into()))?
            .parse::<WaveMode>()?;

        let periodic_axis = match settings_json["periodic_axis"].as_str() {
            Some(axis) => axis.parse::<PeriodicAxis>()?,
            None => PeriodicAxis::X,
        };

        let svea = if settings_json["svea"].is_null() {
            false
        } else {
            settings_json["svea"]
                .as_bool()
                .ok_or_else(|| SettingsError::Format("svea must be a boolean".into()))?
        };

        Ok(Self {
            wavelength,
            mode,
            periodic_axis,
            svea,
        })
    }

    pub fn to_json(&self) -> JsonValue {
        object! {
            "wavelength": self.wavelength,
            "mode": self.mode.to_string(),
            "periodic_axis": self.periodic_axis.to_string(),
            "svea": self.svea,
        }
    }
}

/// Errors produced while loading [HelmholtzSettings]
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Unable to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse settings file as JSON: {0}")]
    Parse(#[from] json::Error),
    #[error("Invalid settings: {0}")]
    Format(String),
    #[error(transparent)]
    Media(#[from] MediaError),
}

/// Errors which abort the assembly of a global or periodic system
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("Element {element} has a non-positive area ({area:e}); mesh is inverted or degenerate!")]
    DegenerateElement { element: usize, area: f64 },
    #[error("Element {element} references node {node}, which does not exist!")]
    NodeOutOfRange { element: usize, node: usize },
    #[error("Element {element} references media index {media}, which does not exist!")]
    MediaOutOfRange { element: usize, media: usize },
    #[error("Media lookup failed for element {element}: {source}")]
    Media {
        element: usize,
        #[source]
        source: MediaError,
    },
}

use serde::Deserialize;

use super::RenderError;

/// One labelled rectangle. All four coordinates are percentages: `x` and `w`
/// of the image width, `y` and `h` of the image height.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub text: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RenderSpec {
    pub annotations: Vec<Annotation>,
}

impl RenderSpec {
    pub fn from_json(raw: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(raw)?)
    }
}

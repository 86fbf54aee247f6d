use std::fmt;
use std::str::FromStr;

use crate::domain::model::model_kind_trait::ModelKind;
use crate::domain::model::model_kinds::{BewareKind, Delft3dFmKind, HurryWaveKind, SfincsKind, Ww3Kind, XBeachKind};
use crate::error::ConversionError;

/// The simulation engines a scenario can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelType {
    Sfincs,
    HurryWave,
    Delft3dFm,
    XBeach,
    Beware,
    Ww3,
}

impl ModelType {
    pub const ALL: [ModelType; 6] =
        [ModelType::Sfincs, ModelType::HurryWave, ModelType::Delft3dFm, ModelType::XBeach, ModelType::Beware, ModelType::Ww3];

    /// Factory method to return the lifecycle implementation of this model type.
    pub fn get_instance(&self) -> Box<dyn ModelKind> {
        match self {
            ModelType::Sfincs => Box::new(SfincsKind::new()),
            ModelType::HurryWave => Box::new(HurryWaveKind::new()),
            ModelType::Delft3dFm => Box::new(Delft3dFmKind::new()),
            ModelType::XBeach => Box::new(XBeachKind::new()),
            ModelType::Beware => Box::new(BewareKind::new()),
            ModelType::Ww3 => Box::new(Ww3Kind::new()),
        }
    }

    /// Returns `(produces_flow, produces_wave)` for models that do not override the flags.
    pub fn default_capabilities(&self) -> (bool, bool) {
        match self {
            ModelType::Sfincs | ModelType::Delft3dFm => (true, false),
            ModelType::HurryWave | ModelType::Ww3 => (false, true),
            ModelType::XBeach | ModelType::Beware => (true, true),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Sfincs => "sfincs",
            ModelType::HurryWave => "hurrywave",
            ModelType::Delft3dFm => "delft3dfm",
            ModelType::XBeach => "xbeach",
            ModelType::Beware => "beware",
            ModelType::Ww3 => "ww3",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ConversionError;

    fn from_str(model_type: &str) -> Result<ModelType, Self::Err> {
        match model_type.to_lowercase().as_str() {
            "sfincs" => Ok(ModelType::Sfincs),
            "hurrywave" => Ok(ModelType::HurryWave),
            "delft3dfm" => Ok(ModelType::Delft3dFm),
            "xbeach" => Ok(ModelType::XBeach),
            "beware" => Ok(ModelType::Beware),
            "ww3" => Ok(ModelType::Ww3),
            _ => Err(ConversionError::UnknownModelType(model_type.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!(ModelType::from_str("SFINCS").unwrap(), ModelType::Sfincs);
        assert_eq!(ModelType::from_str("HurryWave").unwrap(), ModelType::HurryWave);
        assert_eq!(ModelType::from_str("beware").unwrap(), ModelType::Beware);
        assert_eq!(ModelType::from_str("adcirc"), Err(ConversionError::UnknownModelType("adcirc".to_string())));
    }

    #[test]
    fn test_factory_returns_matching_kind() {
        for model_type in ModelType::ALL {
            assert_eq!(model_type.get_instance().model_type(), model_type);
        }
    }
}

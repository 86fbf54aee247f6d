use crate::domain::model::model::{BoundaryKind, Model};
use crate::domain::model::model_kind_base::ModelKindBase;
use crate::domain::model::model_kind_trait::{ModelKind, NestingSource};
use crate::domain::model::model_type::ModelType;
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct SfincsKind {
    base: ModelKindBase,
}

impl SfincsKind {
    pub fn new() -> Self {
        SfincsKind { base: ModelKindBase::new(ModelType::Sfincs).with_restart_prefix(BoundaryKind::Flow, "sfincs") }
    }
}

impl ModelKind for SfincsKind {
    fn get_base(&self) -> &ModelKindBase {
        &self.base
    }
}

#[derive(Debug)]
pub struct HurryWaveKind {
    base: ModelKindBase,
}

impl HurryWaveKind {
    pub fn new() -> Self {
        HurryWaveKind { base: ModelKindBase::new(ModelType::HurryWave).with_restart_prefix(BoundaryKind::Wave, "hurrywave") }
    }
}

impl ModelKind for HurryWaveKind {
    fn get_base(&self) -> &ModelKindBase {
        &self.base
    }
}

#[derive(Debug)]
pub struct Delft3dFmKind {
    base: ModelKindBase,
}

impl Delft3dFmKind {
    pub fn new() -> Self {
        Delft3dFmKind {
            base: ModelKindBase::new(ModelType::Delft3dFm)
                .with_restart_prefix(BoundaryKind::Flow, "flow_rst")
                .with_timeseries_extensions(&["csv", "tim"]),
        }
    }
}

impl ModelKind for Delft3dFmKind {
    fn get_base(&self) -> &ModelKindBase {
        &self.base
    }
}

/// XBeach runs short storm windows and never writes restart files.
#[derive(Debug)]
pub struct XBeachKind {
    base: ModelKindBase,
}

impl XBeachKind {
    pub fn new() -> Self {
        XBeachKind { base: ModelKindBase::new(ModelType::XBeach) }
    }
}

impl ModelKind for XBeachKind {
    fn get_base(&self) -> &ModelKindBase {
        &self.base
    }
}

/// BEWARE is a lookup model, it needs nearshore boundary data to run at all.
#[derive(Debug)]
pub struct BewareKind {
    base: ModelKindBase,
}

impl BewareKind {
    pub fn new() -> Self {
        BewareKind { base: ModelKindBase::new(ModelType::Beware) }
    }
}

impl ModelKind for BewareKind {
    fn get_base(&self) -> &ModelKindBase {
        &self.base
    }

    fn pre_process(&self, model: &Model, nesting: &[NestingSource<'_>], cycle: &str) -> Result<()> {
        if nesting.is_empty() {
            return Err(Error::PreProcessError {
                model: model.id.to_string(),
                reason: "BEWARE model is not nested in any other model".to_string(),
            });
        }
        self.base.prepare_workspace(model, nesting, cycle)
    }
}

#[derive(Debug)]
pub struct Ww3Kind {
    base: ModelKindBase,
}

impl Ww3Kind {
    pub fn new() -> Self {
        Ww3Kind {
            base: ModelKindBase::new(ModelType::Ww3).with_restart_prefix(BoundaryKind::Wave, "restart").with_timeseries_extensions(&["csv", "spec"]),
        }
    }
}

impl ModelKind for Ww3Kind {
    fn get_base(&self) -> &ModelKindBase {
        &self.base
    }
}

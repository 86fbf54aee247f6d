use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::api::argo_dto::{SubmitOptionsDto, WorkflowDto, WorkflowSubmitRequestDto};
use crate::domain::backend::execution_backend_trait::{ExecutionBackend, JobHandle, JobLocator, JobPoll, JobSpec};
use crate::domain::backend::run_mode::RunMode;
use crate::domain::config::CloudConfig;
use crate::domain::model::model::Model;
use crate::error::{Error, Result};

const WORKFLOW_TEMPLATE_KIND: &str = "WorkflowTemplate";

/// Phases in which a workflow is still considered running.
const ACTIVE_PHASES: [&str; 3] = ["", "Pending", "Running"];

/// Submits every job as a workflow built from a template on an Argo style workflow server.
#[derive(Debug)]
pub struct CloudBackend {
    pub config: CloudConfig,
    client: reqwest::Client,
}

impl CloudBackend {
    pub fn new(config: CloudConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::ConfigurationError(format!("Invalid cloud token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(CloudBackend { config, client })
    }

    pub fn submit_url(&self) -> String {
        format!("{}/api/v1/workflows/{}/submit", self.config.server_url, self.config.namespace)
    }

    pub fn workflow_url(&self, name: &str) -> String {
        format!("{}/api/v1/workflows/{}/{}", self.config.server_url, self.config.namespace, name)
    }

    pub fn submit_request(&self, spec: &JobSpec) -> WorkflowSubmitRequestDto {
        WorkflowSubmitRequestDto {
            namespace: self.config.namespace.clone(),
            resource_kind: WORKFLOW_TEMPLATE_KIND.to_string(),
            resource_name: self.config.workflow_template.clone(),
            submit_options: SubmitOptionsDto {
                generate_name: generate_name(spec.model.as_str()),
                parameters: spec.parameters.iter().map(|(key, value)| format!("{}={}", key, value)).collect(),
            },
        }
    }

    fn backend_error(model: &Model, reason: String) -> Error {
        Error::ExecutionBackendError { model: model.id.to_string(), reason }
    }
}

/// Workflow names must be lowercase DNS labels, the server appends a random suffix.
pub fn generate_name(model: &str) -> String {
    format!("{}-", model.to_lowercase().replace('_', "-"))
}

pub fn is_phase_done(phase: Option<&str>) -> bool {
    !ACTIVE_PHASES.contains(&phase.unwrap_or(""))
}

#[async_trait]
impl ExecutionBackend for CloudBackend {
    fn run_mode(&self) -> RunMode {
        RunMode::Cloud
    }

    async fn submit(&self, model: &Model, spec: &JobSpec) -> Result<JobHandle> {
        let request = self.submit_request(spec);
        let response = self.client.post(self.submit_url()).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await?;
            return Err(Self::backend_error(
                model,
                format!("Workflow submission was not successful. Server-URL: <<{}>> Response-Status-Code: <<{}>> Response-Body: <<{}>>", self.submit_url(), status, body_text),
            ));
        }

        let workflow: WorkflowDto = response.json().await?;
        log::info!("Submitted model {} as workflow {}.", model.id, workflow.metadata.name);

        Ok(JobHandle { model: model.id.clone(), run_mode: RunMode::Cloud, locator: JobLocator::Workflow { name: workflow.metadata.name } })
    }

    async fn poll(&self, handle: &JobHandle) -> Result<JobPoll> {
        let name = match &handle.locator {
            JobLocator::Workflow { name } => name,
            JobLocator::Workspace(path) => {
                return Err(Error::ExecutionBackendError {
                    model: handle.model.to_string(),
                    reason: format!("job folder {} is not a workflow", path.display()),
                });
            }
        };

        let response = self.client.get(self.workflow_url(name)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::ExecutionBackendError {
                model: handle.model.to_string(),
                reason: format!("Polling workflow {} returned {}", name, status),
            });
        }

        let workflow: WorkflowDto = response.json().await?;
        let phase = workflow.status.and_then(|s| s.phase);

        if !is_phase_done(phase.as_deref()) {
            return Ok(JobPoll::Running);
        }

        if let Some(phase @ ("Failed" | "Error")) = phase.as_deref() {
            log::warn!("Workflow {} of model {} ended in phase {}.", name, handle.model, phase);
        }

        Ok(JobPoll::Done { worker: Some(format!("argo:{}", name)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::model_type::ModelType;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn backend() -> CloudBackend {
        CloudBackend::new(CloudConfig {
            server_url: "https://argo.example.org".to_string(),
            namespace: "forecast".to_string(),
            workflow_template: "run-model".to_string(),
            token: Some("secret".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_submit_request() {
        let mut parameters = BTreeMap::new();
        parameters.insert("cycle".to_string(), "20240101_00z".to_string());
        parameters.insert("model".to_string(), "Coast_SF".to_string());

        let spec = JobSpec {
            model: "Coast_SF".into(),
            model_type: ModelType::Sfincs,
            job_path: PathBuf::from("/jobs/coast_sf"),
            run_script: "run.sh".to_string(),
            ensemble: false,
            parameters,
        };

        let backend = backend();
        let request = backend.submit_request(&spec);

        assert_eq!(backend.submit_url(), "https://argo.example.org/api/v1/workflows/forecast/submit");
        assert_eq!(request.resource_kind, "WorkflowTemplate");
        assert_eq!(request.resource_name, "run-model");
        assert_eq!(request.submit_options.generate_name, "coast-sf-");
        assert_eq!(request.submit_options.parameters, vec!["cycle=20240101_00z", "model=Coast_SF"]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["resourceKind"], "WorkflowTemplate");
        assert_eq!(json["submitOptions"]["generateName"], "coast-sf-");
    }

    #[test]
    fn test_phase_done() {
        assert!(!is_phase_done(None));
        assert!(!is_phase_done(Some("Pending")));
        assert!(!is_phase_done(Some("Running")));
        assert!(is_phase_done(Some("Succeeded")));
        assert!(is_phase_done(Some("Failed")));
        assert!(is_phase_done(Some("Error")));
    }
}

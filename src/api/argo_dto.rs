use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/workflows/{namespace}/submit`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSubmitRequestDto {
    pub namespace: String,
    pub resource_kind: String,
    pub resource_name: String,
    pub submit_options: SubmitOptionsDto,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOptionsDto {
    pub generate_name: String,

    /// Named template parameters as `key=value`.
    pub parameters: Vec<String>,
}

/// Subset of a workflow object returned by the workflow server.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WorkflowDto {
    pub metadata: WorkflowMetadataDto,

    #[serde(default)]
    pub status: Option<WorkflowStatusDto>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WorkflowMetadataDto {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WorkflowStatusDto {
    #[serde(default)]
    pub phase: Option<String>,
}

pub mod argo_dto;
pub mod config_dto;
pub mod cycle_info_dto;
pub mod job_dto;
pub mod scenario_dto;

pub mod boundary_value;
pub mod boundary_value_mock;
pub mod cluster;
pub mod cluster_admission;

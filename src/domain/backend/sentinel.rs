use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Written into the job workspace once the simulation is done.
/// The first line is `finished`, the optional second line names the worker.
pub const FINISHED_FILE: &str = "finished.txt";

pub fn finished_path(job_path: &Path) -> PathBuf {
    job_path.join(FINISHED_FILE)
}

/// Reads the completion sentinel of a job workspace.
///
/// # Returns
/// `None` while the sentinel does not exist, otherwise the worker named on its second line
/// (`Some(None)` when the worker did not identify itself).
pub fn read_finished(job_path: &Path) -> Result<Option<Option<String>>> {
    match fs::read_to_string(finished_path(job_path)) {
        Ok(content) => {
            let worker = content.lines().nth(1).map(str::trim).filter(|line| !line.is_empty()).map(str::to_string);
            Ok(Some(worker))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn write_finished(job_path: &Path, worker: &str) -> Result<()> {
    fs::write(finished_path(job_path), format!("finished\n{}\n", worker))?;
    Ok(())
}

/// Marks a model as done for this cycle in the job list. A restarted orchestrator skips
/// every model that has such a sentinel.
pub fn write_job_list_sentinel(path: &Path, worker: Option<&str>) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let content = match worker {
        Some(worker) => format!("finished by {}", worker),
        None => "finished".to_string(),
    };
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_sentinel() {
        let job = std::env::temp_dir().join(format!("sentinel_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&job).unwrap();

        assert_eq!(read_finished(&job).unwrap(), None);

        fs::write(finished_path(&job), "finished\n").unwrap();
        assert_eq!(read_finished(&job).unwrap(), Some(None));

        write_finished(&job, "node-07").unwrap();
        assert_eq!(read_finished(&job).unwrap(), Some(Some("node-07".to_string())));

        let list_entry = job.join("job_list").join("sf.finished");
        write_job_list_sentinel(&list_entry, Some("node-07")).unwrap();
        assert_eq!(fs::read_to_string(&list_entry).unwrap(), "finished by node-07");

        fs::remove_dir_all(job).unwrap();
    }
}

use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;

/// Coarse job state reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Started,
    /// Finished successfully, with a one-line summary.
    Completed(String),
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Started)
    }
}

/// Handle to a job running on its own thread.
pub struct JobHandle {
    name: String,
    rx: Receiver<JobStatus>,
    thread: Option<JoinHandle<()>>,
}

impl JobHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Status channel, for callers polling from an event loop.
    pub fn status(&self) -> &Receiver<JobStatus> {
        &self.rx
    }

    /// Blocks until the job ends, passing every status to `on_status`.
    ///
    /// A job that dies without reporting (a panic) yields `Failed`.
    pub fn wait(mut self, mut on_status: impl FnMut(&JobStatus)) -> JobStatus {
        let mut last = None;
        for status in self.rx.iter() {
            on_status(&status);
            if status.is_terminal() {
                last = Some(status);
                break;
            }
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }

        last.unwrap_or_else(|| {
            let status = JobStatus::Failed(format!("{} job exited unexpectedly", self.name));
            on_status(&status);
            status
        })
    }
}

/// Runs `job` on a background thread and reports its status over a channel.
pub fn spawn<F>(name: &str, job: F) -> JobHandle
where
    F: FnOnce() -> Result<String, Box<dyn std::error::Error>> + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded::<JobStatus>();
    let job_name = name.to_string();

    let thread = thread::spawn(move || {
        let _ = tx.send(JobStatus::Started);
        log::info!("{job_name} job started");
        let status = match job() {
            Ok(summary) => {
                log::info!("{job_name} job completed: {summary}");
                JobStatus::Completed(summary)
            }
            Err(e) => {
                log::error!("{job_name} job failed: {e}");
                JobStatus::Failed(e.to_string())
            }
        };
        let _ = tx.send(status);
    });

    JobHandle {
        name: name.to_string(),
        rx,
        thread: Some(thread),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_job_reports_started_then_completed() {
        let mut seen = Vec::new();
        let handle = spawn("demo", || Ok("3 items".to_string()));
        assert_eq!(handle.name(), "demo");

        let last = handle.wait(|s| seen.push(s.clone()));

        assert_eq!(last, JobStatus::Completed("3 items".into()));
        assert_eq!(seen, vec![JobStatus::Started, JobStatus::Completed("3 items".into())]);
    }

    #[test]
    fn test_failing_job_reports_message() {
        let last = spawn("demo", || Err("artifact missing".into())).wait(|_| {});
        assert_eq!(last, JobStatus::Failed("artifact missing".into()));
    }

    #[test]
    fn test_panicking_job_reports_failure() {
        let last = spawn("demo", || panic!("boom")).wait(|_| {});
        assert!(matches!(last, JobStatus::Failed(msg) if msg.contains("demo")));
    }

    #[test]
    fn test_status_channel_can_be_polled() {
        let handle = spawn("demo", || Ok(String::new()));
        let first = handle.status().recv().unwrap();
        assert_eq!(first, JobStatus::Started);
        assert_eq!(handle.wait(|_| {}), JobStatus::Completed(String::new()));
    }
}

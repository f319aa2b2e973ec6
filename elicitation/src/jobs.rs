//! Hand-off of accepted briefs to the document generator.
//!
//! Each job is one JSON file under the queue directory; the downstream
//! generator picks files up on its own schedule.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::model::{Answer, FinalBrief, Topic};

/// Payload consumed by the document generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentJob {
    pub job_id: String,
    pub session_id: String,
    pub topic: Topic,
    pub brief: FinalBrief,
    pub transcript: Vec<Answer>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    pub job_id: String,
}

#[derive(Debug, Clone)]
pub struct FileJobQueue {
    dir: PathBuf,
}

impl FileJobQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes a new job file and returns its ticket.
    #[instrument(skip_all, fields(session_id = %session_id))]
    pub async fn enqueue(
        &self,
        session_id: &str,
        topic: Topic,
        brief: FinalBrief,
        transcript: Vec<Answer>,
    ) -> Result<JobTicket, StoreError> {
        let job = DocumentJob {
            job_id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            topic,
            brief,
            transcript,
            created_at: Utc::now(),
        };

        fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(format!("{}.json", job.job_id));
        let tmp = self.dir.join(format!(".{}.tmp", job.job_id));
        fs::write(&tmp, serde_json::to_vec_pretty(&job)?).await?;
        fs::rename(&tmp, &path).await?;

        info!(job_id = %job.job_id, "document job enqueued");
        Ok(JobTicket { job_id: job.job_id })
    }

    /// Reads a job back by id; `None` when it does not exist.
    pub async fn load(&self, job_id: &str) -> Result<Option<DocumentJob>, StoreError> {
        if Uuid::parse_str(job_id).is_err() {
            return Ok(None);
        }
        match fs::read(self.dir.join(format!("{job_id}.json"))).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

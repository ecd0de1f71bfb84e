use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, header};

use super::{RemoteError, base_url, checked};
use crate::api::ErrorCode;
use crate::api::models::{IdResponse, ReadyResponse};
use crate::coordinator::{CoordinatorError, Result, SubmissionApi, WorkSource};
use crate::ledger::{LedgerError, Task, TaskId};
use crate::storage::{Stage, StorageError};

/// [`SubmissionApi`] and [`WorkSource`] over HTTP, talking to the `coordinator` role
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    client: Client,
    base: String,
}

/// Which call failed, so a bare error code can be given its typed meaning
#[derive(Debug, Clone, Copy)]
enum Call {
    Submit,
    Ready(TaskId),
    Fetch(TaskId),
    Lease,
    Finished(TaskId),
}

impl CoordinatorClient {
    pub fn new(client: Client, address: &str) -> Self {
        Self {
            client,
            base: base_url(address),
        }
    }
}

fn coordinator_error(err: RemoteError, call: Call) -> CoordinatorError {
    let message = match &err {
        RemoteError::Api { message, .. } => message.clone(),
        other => other.to_string(),
    };

    match (err.code(), call) {
        (Some(ErrorCode::InvalidInput), _) => CoordinatorError::InvalidInput(message),
        (Some(ErrorCode::PayloadTooLarge), _) => CoordinatorError::PayloadTooLarge(message),
        (Some(ErrorCode::NoWorkAvailable), _) => LedgerError::NoWorkAvailable.into(),
        (Some(ErrorCode::NotFound), Call::Ready(id)) => LedgerError::NotFound(id).into(),
        (Some(ErrorCode::NotFound), Call::Fetch(id)) => StorageError::NotFound {
            id,
            stage: Stage::Finished,
        }
        .into(),
        (Some(ErrorCode::NotFound), Call::Finished(id)) => LedgerError::NotFound(id).into(),
        (Some(ErrorCode::InvalidStateTransition), Call::Finished(id)) => {
            LedgerError::InvalidStateTransition(id).into()
        }
        _ => CoordinatorError::UpstreamUnavailable(err.to_string()),
    }
}

#[async_trait]
impl SubmissionApi for CoordinatorClient {
    async fn submit(&self, data: Bytes) -> Result<TaskId> {
        let result = async {
            let response = self
                .client
                .post(format!("{}/submit", self.base))
                .header(header::CONTENT_TYPE, "image/png")
                .body(data)
                .send()
                .await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<IdResponse>().await?.id)
        }
        .await;
        result.map_err(|err| coordinator_error(err, Call::Submit))
    }

    async fn is_ready(&self, id: TaskId) -> Result<bool> {
        let result = async {
            let response = self
                .client
                .get(format!("{}/tasks/{}/ready", self.base, id))
                .send()
                .await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<ReadyResponse>().await?.ready)
        }
        .await;
        result.map_err(|err| coordinator_error(err, Call::Ready(id)))
    }

    async fn fetch(&self, id: TaskId) -> Result<Bytes> {
        let result = async {
            let response = self
                .client
                .get(format!("{}/tasks/{}/result", self.base, id))
                .send()
                .await?;
            Ok::<_, RemoteError>(checked(response).await?.bytes().await?)
        }
        .await;
        result.map_err(|err| coordinator_error(err, Call::Fetch(id)))
    }
}

#[async_trait]
impl WorkSource for CoordinatorClient {
    async fn lease_next(&self) -> Result<Task> {
        let result = async {
            let response = self.client.post(format!("{}/lease", self.base)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<Task>().await?)
        }
        .await;
        result.map_err(|err| coordinator_error(err, Call::Lease))
    }

    async fn report_finished(&self, id: TaskId) -> Result<()> {
        let result = async {
            let response = self
                .client
                .post(format!("{}/tasks/{}/finished", self.base, id))
                .send()
                .await?;
            checked(response).await?;
            Ok::<_, RemoteError>(())
        }
        .await;
        result.map_err(|err| coordinator_error(err, Call::Finished(id)))
    }
}

use async_trait::async_trait;
use reqwest::Client;

use super::{RemoteError, base_url, checked};
use crate::api::ErrorCode;
use crate::api::models::IdResponse;
use crate::ledger::{LedgerApi, LedgerError, Result, Task, TaskId};

/// [`LedgerApi`] over HTTP, talking to the `ledger` role
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    base: String,
}

impl LedgerClient {
    pub fn new(client: Client, address: &str) -> Self {
        Self {
            client,
            base: base_url(address),
        }
    }

    async fn post_task(&self, path: &str, id: Option<TaskId>) -> Result<Task> {
        let result = async {
            let response = self.client.post(format!("{}{}", self.base, path)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<Task>().await?)
        }
        .await;
        result.map_err(|err| ledger_error(err, id))
    }
}

/// Map a remote failure back onto the ledger's own error kinds
fn ledger_error(err: RemoteError, id: Option<TaskId>) -> LedgerError {
    match (err.code(), id) {
        (Some(ErrorCode::NoWorkAvailable), _) => LedgerError::NoWorkAvailable,
        (Some(ErrorCode::NotFound), Some(id)) => LedgerError::NotFound(id),
        (Some(ErrorCode::InvalidStateTransition), Some(id)) => LedgerError::InvalidStateTransition(id),
        _ => LedgerError::Unavailable(err.to_string()),
    }
}

#[async_trait]
impl LedgerApi for LedgerClient {
    async fn create_task(&self) -> Result<TaskId> {
        let result = async {
            let response = self.client.post(format!("{}/tasks", self.base)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<IdResponse>().await?.id)
        }
        .await;
        result.map_err(|err| ledger_error(err, None))
    }

    async fn get_task(&self, id: TaskId) -> Result<Task> {
        let result = async {
            let response = self.client.get(format!("{}/tasks/{}", self.base, id)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<Task>().await?)
        }
        .await;
        result.map_err(|err| ledger_error(err, Some(id)))
    }

    async fn assign_next(&self) -> Result<Task> {
        self.post_task("/tasks/lease", None).await
    }

    async fn complete(&self, id: TaskId) -> Result<Task> {
        self.post_task(&format!("/tasks/{}/complete", id), Some(id)).await
    }

    async fn list(&self) -> Result<Vec<Task>> {
        let result = async {
            let response = self.client.get(format!("{}/tasks", self.base)).send().await?;
            Ok::<_, RemoteError>(checked(response).await?.json::<Vec<Task>>().await?)
        }
        .await;
        result.map_err(|err| ledger_error(err, None))
    }
}

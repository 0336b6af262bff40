//! HTTP client for the OneThing server's task and briefing endpoints

use async_trait::async_trait;
use log::debug;
use onething_core::briefing::BriefingCommitter;
use onething_core::{DailyReview, OneThingError, OneThingResult, Task};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http_client(&self) -> reqwest::Client {
        self.client.clone()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    pub async fn list_tasks(&self) -> OneThingResult<Vec<Task>> {
        read_json(self.request(Method::GET, "/api/tasks").send().await?).await
    }

    pub async fn create_task(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> OneThingResult<Task> {
        let body = json!({ "title": title, "description": description });
        read_json(
            self.request(Method::POST, "/api/tasks")
                .json(&body)
                .send()
                .await?,
        )
        .await
    }

    pub async fn toggle_task(&self, id: &str) -> OneThingResult<Task> {
        let path = format!("/api/tasks/{}/toggle", id);
        read_json(self.request(Method::POST, &path).send().await?).await
    }

    pub async fn delete_task(&self, id: &str) -> OneThingResult<()> {
        let path = format!("/api/tasks/{}", id);
        check_status(self.request(Method::DELETE, &path).send().await?).await?;
        Ok(())
    }

    pub async fn update_tier(&self, id: &str, tier: &str) -> OneThingResult<Task> {
        let path = format!("/api/tasks/{}/tier", id);
        read_json(
            self.request(Method::PUT, &path)
                .json(&json!({ "tier": tier }))
                .send()
                .await?,
        )
        .await
    }

    pub async fn todays_briefing(&self) -> OneThingResult<Option<DailyReview>> {
        read_json(self.request(Method::GET, "/api/briefing/today").send().await?).await
    }

    pub async fn complete_briefing(
        &self,
        task_id: &str,
        goal: &str,
    ) -> OneThingResult<DailyReview> {
        debug!("Committing briefing: task_id={}", task_id);
        read_json(
            self.request(Method::POST, "/api/briefing/complete")
                .json(&json!({ "taskId": task_id, "goal": goal }))
                .send()
                .await?,
        )
        .await
    }
}

#[async_trait]
impl BriefingCommitter for ApiClient {
    async fn complete_briefing(&self, task_id: &str, goal: &str) -> OneThingResult<()> {
        ApiClient::complete_briefing(self, task_id, goal).await?;
        Ok(())
    }
}

async fn check_status(response: Response) -> OneThingResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("status={}", status));

    Err(match status {
        StatusCode::NOT_FOUND => OneThingError::NotFound(message),
        StatusCode::BAD_REQUEST => OneThingError::Validation(message),
        _ => OneThingError::Transport(message),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> OneThingResult<T> {
    let response = check_status(response).await?;
    Ok(response.json::<T>().await?)
}

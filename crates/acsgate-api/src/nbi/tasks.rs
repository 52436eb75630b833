// Task submission
//
// `POST /devices/{id}/tasks`. The controller answers 200 when it reached
// the device and ran the task inline, 202 when the task was queued for
// the next inform. Any other status is a failure.

use reqwest::StatusCode;
use tracing::{debug, warn};

use super::client::NbiClient;
use super::models::{Task, TaskAck, TaskOptions, TaskStatus};
use crate::error::Error;

impl NbiClient {
    /// Submit a task for a device.
    pub async fn submit_task(
        &self,
        device_id: &str,
        task: &Task,
        options: TaskOptions,
    ) -> Result<TaskAck, Error> {
        let url = self.url(&["devices", device_id, "tasks"])?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if options.connection_request {
            params.push(("connection_request", String::new()));
            if let Some(ms) = options.timeout_ms {
                params.push(("timeout", ms.to_string()));
            }
        }

        debug!(
            device_id,
            task = task.name(),
            connection_request = options.connection_request,
            "submitting task"
        );

        let (status, body) = self.post_json(url, &params, task).await?;
        let status = match status {
            StatusCode::OK => TaskStatus::Completed,
            StatusCode::ACCEPTED => TaskStatus::Queued,
            other => {
                return Err(Error::Upstream {
                    status: other.as_u16(),
                    body,
                });
            }
        };

        let mut ack = if body.trim().is_empty() {
            TaskAck::default()
        } else {
            match Self::decode::<TaskAck>(&body) {
                Ok(ack) => ack,
                Err(e) => {
                    warn!(error = %e, "task acknowledged with an unrecognised body");
                    TaskAck::default()
                }
            }
        };
        ack.status = status;
        if ack.name.is_none() {
            ack.name = Some(task.name().to_owned());
        }
        if ack.device.is_none() {
            ack.device = Some(device_id.to_owned());
        }
        Ok(ack)
    }
}

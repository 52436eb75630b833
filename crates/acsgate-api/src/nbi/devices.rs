// Device endpoints
//
// `GET /devices` with a JSON query is the only read primitive the NBI
// offers; lookups by id, paged listings, counts, and the health probe are
// all expressed through it.

use serde_json::Value;
use tracing::debug;

use super::client::NbiClient;
use super::models::DeviceCount;
use super::query::{DeviceQuery, Filter};
use crate::error::Error;

/// Response header some controller versions set with the unpaged match count.
pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";

impl NbiClient {
    /// Fetch a single device document by id.
    ///
    /// Returns `Ok(None)` when no device matches. An empty `projection`
    /// returns the full document.
    pub async fn find_device(
        &self,
        device_id: &str,
        projection: &[&str],
    ) -> Result<Option<Value>, Error> {
        let query = DeviceQuery::new(Filter::by_id(device_id))
            .projection(projection.iter().copied())
            .limit(1);
        let mut docs = self.query_devices(&query).await?;
        Ok(if docs.is_empty() {
            None
        } else {
            Some(docs.swap_remove(0))
        })
    }

    /// Run a device query and return the raw documents.
    pub async fn query_devices(&self, query: &DeviceQuery) -> Result<Vec<Value>, Error> {
        let (docs, _) = self.query_devices_with_headers(query).await?;
        Ok(docs)
    }

    async fn query_devices_with_headers(
        &self,
        query: &DeviceQuery,
    ) -> Result<(Vec<Value>, reqwest::header::HeaderMap), Error> {
        let url = self.url(&["devices"])?;
        let params = query.to_params();
        let (docs, headers): (Vec<Value>, _) = self.get_json(url, &params).await?;
        debug!(count = docs.len(), "devices query returned");
        Ok((docs, headers))
    }

    /// Count devices matching `filter`.
    ///
    /// Uses the `X-Total-Count` header when the controller provides it.
    /// Otherwise falls back to fetching up to `cap` ids; a result that
    /// reaches the cap is reported as inexact.
    pub async fn count_devices(&self, filter: &Filter, cap: u32) -> Result<DeviceCount, Error> {
        let probe = DeviceQuery::new(filter.clone())
            .projection(["_id"])
            .limit(1);
        let (docs, headers) = self.query_devices_with_headers(&probe).await?;

        if let Some(total) = headers
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            return Ok(DeviceCount {
                value: total,
                exact: true,
            });
        }

        if docs.is_empty() {
            return Ok(DeviceCount {
                value: 0,
                exact: true,
            });
        }

        let capped = DeviceQuery::new(filter.clone())
            .projection(["_id"])
            .limit(cap);
        let docs = self.query_devices(&capped).await?;
        let value = u64::try_from(docs.len()).unwrap_or(u64::MAX);
        Ok(DeviceCount {
            value,
            exact: value < u64::from(cap),
        })
    }

    /// Cheapest possible round-trip: `GET /devices?limit=1&projection=_id`.
    pub async fn ping(&self) -> Result<(), Error> {
        let probe = DeviceQuery::new(Filter::all()).projection(["_id"]).limit(1);
        self.query_devices(&probe).await.map(|_| ())
    }
}

//! VLO item methods: repair, publication and handle registration.

use tracing::debug;

use crate::cmdi::{RepairOutcome, XmlSource};
use crate::error::Result;
use crate::model::{Publishable, VloItem, VloItemSummary};
use crate::pid::{register_pid, PidRegistration};
use crate::publish::{PublicationState, PublishReport};
use crate::CollbankApi;

impl CollbankApi {
    pub fn list_vlo_items(&self, orphans_only: bool) -> Result<Vec<VloItemSummary>> {
        self.store.list_vlo_items(orphans_only)
    }

    pub fn get_vlo_item(&self, id: i64) -> Result<VloItem> {
        self.store.get_vlo_item(id)
    }

    /// Store a new VLO item whose document comes from `source`.
    pub fn create_vlo_item(
        &self,
        abbr: &str,
        title: &str,
        source: XmlSource,
        collection_id: Option<i64>,
    ) -> Result<i64> {
        let mut item = VloItem::new(abbr, title, source.load()?);
        item.collection_id = collection_id;
        self.store.save_vlo_item(&mut item)
    }

    /// Repair an item's document.
    ///
    /// Without an explicit `self_link` the item's own handle is used, when
    /// it has one.
    pub fn repair_item(&self, id: i64, self_link: Option<&str>) -> Result<RepairOutcome> {
        let own_link = match self_link {
            Some(_) => None,
            None => self.store.get_vlo_item(id)?.pid.self_link(),
        };
        self.store.repair_item(id, self_link.or(own_link.as_deref()))
    }

    pub fn evaluate_item(&self, id: i64) -> Result<PublicationState> {
        let item = self.store.get_vlo_item(id)?;
        let state = self.tracker.evaluate(&item);
        debug!("VLO item {} is {}", id, state);
        Ok(state)
    }

    pub fn publish_item(&self, id: i64) -> Result<PublishReport> {
        let item = self.store.get_vlo_item(id)?;
        self.tracker.publish_item(&item)
    }

    /// Obtain or refresh the handle of a VLO item and store it.
    ///
    /// Service failures come back as an error status; only store failures
    /// are returned as `Err`.
    pub async fn register_pid(&self, id: i64) -> Result<PidRegistration> {
        let mut item = self.store.get_vlo_item(id)?;
        let Some(service) = self.pid_service.as_deref() else {
            return Ok(PidRegistration::failed("PID service not configured"));
        };

        let target_url = self.tracker.target_url(&item);
        let registration = register_pid(service, &mut item, &target_url).await;
        if registration.changed {
            self.store.update_pid(item.record_kind(), id, &item.pid)?;
        }
        Ok(registration)
    }
}

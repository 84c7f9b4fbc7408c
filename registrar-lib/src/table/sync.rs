//! Server synchronization for one table

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::sync::MutexGuard;

use super::ConfirmPrompt;
use super::Confirmation;
use super::LoadingFlag;
use super::LogNotifier;
use super::Notice;
use super::Notifier;
use super::TableModel;
use crate::RegistrarClient;
use crate::api::GroupDetail;
use crate::api::Resource;
use crate::error::MutationKind;
use crate::error::SyncError;
use crate::model::Patch;
use crate::model::Row;
use crate::model::RowId;
use crate::render::FormState;

/// Keeps a [`TableModel`] in step with one REST resource.
///
/// Cheap to clone (uses `Arc` internally). The model lock is only held
/// between network calls, so operations may overlap; each one reports its
/// own outcome while sharing the one [`LoadingFlag`].
///
/// Every failure is logged, sent to the [`Notifier`] and returned. After a
/// successful mutation the table is refetched; if that refetch fails the
/// mutation still counts as successful and the failure is only reported.
///
/// # Example
///
/// ```ignore
/// let engine = SyncEngine::new(client, Resource::STUDENT, TableModel::new(schema, PageSize::default()));
/// engine.fetch().await?;
///
/// engine
///     .model()
///     .await
///     .apply(TableEvent::CellEdited { id: 5.into(), key: "entrance".into(), value: "true".into() })?;
/// engine.save().await?;
/// ```
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<SyncEngineInner>,
}

struct SyncEngineInner {
    client: RegistrarClient,
    resource: Resource,
    model: Mutex<TableModel>,
    loading: LoadingFlag,
    notifier: Arc<dyn Notifier>,
}

impl SyncEngine {
    /// Creates an engine that reports to the log.
    pub fn new(client: RegistrarClient, resource: Resource, model: TableModel) -> Self {
        Self::with_collaborators(client, resource, model, Arc::new(LogNotifier), LoadingFlag::new())
    }

    /// Creates an engine with a custom notifier and a loading flag that may
    /// be shared with other engines.
    pub fn with_collaborators(
        client: RegistrarClient,
        resource: Resource,
        model: TableModel,
        notifier: Arc<dyn Notifier>,
        loading: LoadingFlag,
    ) -> Self {
        Self {
            inner: Arc::new(SyncEngineInner {
                client,
                resource,
                model: Mutex::new(model),
                loading,
                notifier,
            }),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.inner.resource
    }

    pub fn loading(&self) -> &LoadingFlag {
        &self.inner.loading
    }

    pub fn client(&self) -> &RegistrarClient {
        &self.inner.client
    }

    /// Locks the model for reading or applying UI events.
    ///
    /// Do not hold the guard across a call to another engine method.
    pub async fn model(&self) -> MutexGuard<'_, TableModel> {
        self.inner.model.lock().await
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Reloads all rows. Returns the number of rows fetched.
    ///
    /// On failure the previous rows stay in place.
    pub async fn fetch(&self) -> Result<usize, SyncError> {
        let _loading = self.inner.loading.begin();
        let resource = &self.inner.resource;

        match self.inner.client.list(resource.clone()).await {
            Ok(rows) => {
                let count = rows.len();
                self.model().await.replace_rows(rows);
                log::debug!("Fetched {} {} rows", count, resource);
                Ok(count)
            }
            Err(e) => Err(self.fail(SyncError::fetch(resource.name(), e))),
        }
    }

    /// Looks up one group and its students.
    pub async fn group_detail(&self, id: &RowId) -> Result<Option<GroupDetail>, SyncError> {
        let _loading = self.inner.loading.begin();
        self.inner
            .client
            .group_detail(id)
            .await
            .map_err(|e| self.fail(SyncError::fetch(Resource::GROUP.name(), e)))
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Submits an add form.
    ///
    /// On success the form is closed and the table refetched. On failure the
    /// form stays open with its values.
    pub async fn create(&self, form: &mut FormState) -> Result<Option<Row>, SyncError> {
        let payload = {
            let model = self.model().await;
            form.payload(model.form_schema())
        };
        let payload = payload.map_err(|e| self.fail(e.into()))?;

        let _loading = self.inner.loading.begin();
        let resource = &self.inner.resource;
        let created = self
            .inner
            .client
            .create(resource, &payload)
            .await
            .map_err(|e| self.fail(SyncError::mutation(MutationKind::Create, resource.name(), e)))?;

        form.close();
        self.notify(Notice::success(format!("Created {} record", resource)));
        self.refresh().await;
        Ok(created)
    }

    /// Sends every pending edit as one batch. Returns the number of rows
    /// updated; zero means nothing differed and no request was sent.
    pub async fn save(&self) -> Result<usize, SyncError> {
        let batch = {
            let model = self.model().await;
            model.edits().build_batch(model.store(), model.schema())
        };
        let batch = batch.map_err(|e| self.fail(e.into()))?;
        self.update(batch).await
    }

    /// Sends a batch of patches.
    ///
    /// On success the sent edits are cleared and the table refetched; fields
    /// edited again while the request was in flight stay pending. On failure every edit is kept so the batch can be retried.
    pub async fn update(&self, batch: Vec<Patch>) -> Result<usize, SyncError> {
        if batch.is_empty() {
            log::debug!("Nothing to update for {}", self.inner.resource);
            return Ok(0);
        }

        let _loading = self.inner.loading.begin();
        let resource = &self.inner.resource;
        self.inner
            .client
            .update(resource, &batch)
            .await
            .map_err(|e| self.fail(SyncError::mutation(MutationKind::Update, resource.name(), e)))?;

        {
            let mut model = self.model().await;
            let schema = model.schema().clone();
            model.edits_mut().clear_sent(&batch, &schema);
        }
        self.notify(Notice::success(format!("Saved {} {} rows", batch.len(), resource)));
        self.refresh().await;
        Ok(batch.len())
    }

    /// Deletes rows by id.
    ///
    /// On success the rows disappear from the table at once, the table is
    /// refetched, and the ids leave the selection. On failure the selection
    /// is left as it was.
    pub async fn delete(&self, ids: Vec<RowId>) -> Result<usize, SyncError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let _loading = self.inner.loading.begin();
        let resource = &self.inner.resource;
        self.inner
            .client
            .delete(resource, &ids)
            .await
            .map_err(|e| self.fail(SyncError::mutation(MutationKind::Delete, resource.name(), e)))?;

        self.model().await.store_mut().remove_optimistic(&ids);
        self.refresh().await;
        {
            let mut model = self.model().await;
            model.selection_mut().remove_all(&ids);
            model.edits_mut().clear_rows(&ids);
        }
        self.notify(Notice::success(format!("Deleted {} {} rows", ids.len(), resource)));
        Ok(ids.len())
    }

    /// Deletes the selected rows after the user confirms.
    ///
    /// Returns zero without sending anything if the selection is empty or
    /// the user declines.
    pub async fn delete_selected(&self, confirmation: &dyn Confirmation) -> Result<usize, SyncError> {
        let ids = self.model().await.selection().ids();
        if ids.is_empty() {
            return Ok(0);
        }

        let prompt = ConfirmPrompt::new(format!("Delete {} selected record(s)?", ids.len()))
            .title(format!("Delete from {}", self.inner.resource));
        if !confirmation.confirm(&prompt).await {
            log::debug!("Deletion of {} rows cancelled", ids.len());
            return Ok(0);
        }

        self.delete(ids).await
    }

    /// Assigns a student to a group, then refetches.
    pub async fn add_student_to_group(&self, student_id: &RowId, group_id: &RowId) -> Result<(), SyncError> {
        let _loading = self.inner.loading.begin();
        self.inner
            .client
            .add_student_to_group(student_id, group_id)
            .await
            .map_err(|e| self.fail(SyncError::mutation(MutationKind::Link, Resource::GROUP.name(), e)))?;

        self.notify(Notice::success(format!(
            "Student {} added to group {}",
            student_id, group_id
        )));
        self.refresh().await;
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Refetch after a mutation. Failures are already reported by `fetch`.
    async fn refresh(&self) {
        if let Err(e) = self.fetch().await {
            log::debug!("Refresh after mutation failed: {}", e);
        }
    }

    fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    fn fail(&self, err: SyncError) -> SyncError {
        log::warn!("{}: {}", self.inner.resource, err);
        let notice = match &err {
            SyncError::Auth(auth) => Notice::error("Sign in required").body(auth.to_string()),
            SyncError::Validation(validation) => {
                Notice::warning("Some fields need attention").body(validation.to_string())
            }
            SyncError::Fetch { resource, source } => {
                Notice::error(format!("Failed to load {}", resource)).body(source.to_string())
            }
            SyncError::Mutation {
                operation,
                resource,
                source,
            } => Notice::error(format!("Failed to {} {}", operation, resource)).body(source.to_string()),
        };
        self.notify(notice);
        err
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("resource", &self.inner.resource)
            .field("loading", &self.inner.loading.is_loading())
            .finish_non_exhaustive()
    }
}

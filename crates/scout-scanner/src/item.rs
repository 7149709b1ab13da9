//! Item extractor: assembles one [`PatentRecord`] from a detail view.

use crate::error::Result;
use crate::pane::{FieldRead, PaneReader};
use crate::sink::RecordSink;
use crate::table::read_table;
use scout_browser::{BrowserActions, Surface};
use scout_core::{
    AppConfig, Bibliographic, Claims, Classifications, DetailAddress, FieldSet, PatentRecord,
};
use std::sync::Arc;

const LIST_JOINER: &str = ", ";
const DESCRIPTION_JOINER: &str = "\n";
const CLAIMS_JOINER: &str = " ";

/// Extracts the record behind one detail address.
#[async_trait::async_trait]
pub trait Extract: Send + Sync {
    /// Produce the record for `address`.
    async fn extract(&self, address: DetailAddress) -> Result<PatentRecord>;
}

/// Closes the view when dropped without an explicit release, e.g. when the
/// extraction task is aborted or times out.
struct ViewGuard {
    view: Option<Arc<dyn BrowserActions>>,
}

impl ViewGuard {
    async fn release(mut self, address: &DetailAddress) {
        if let Some(view) = self.view.take() {
            if let Err(e) = view.close().await {
                tracing::warn!("Failed to close detail view {}: {}", address, e);
            }
        }
    }
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        if let Some(view) = self.view.take() {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = view.close().await {
                        tracing::warn!("Failed to close abandoned detail view: {}", e);
                    }
                });
            }
        }
    }
}

struct FieldSets {
    citations: FieldSet,
    legal_events: FieldSet,
    family: FieldSet,
}

/// Opens each detail address in its own view and reads every pane.
pub struct ItemExtractor {
    surface: Arc<dyn Surface>,
    config: Arc<AppConfig>,
    sink: Arc<dyn RecordSink>,
    fields: FieldSets,
}

impl ItemExtractor {
    /// Create an extractor. Fails if a configured field set is empty.
    pub fn new(
        surface: Arc<dyn Surface>,
        config: Arc<AppConfig>,
        sink: Arc<dyn RecordSink>,
    ) -> Result<Self> {
        let fields = FieldSets {
            citations: FieldSet::new(config.fields.citations.clone())?,
            legal_events: FieldSet::new(config.fields.legal_events.clone())?,
            family: FieldSet::new(config.fields.family.clone())?,
        };

        Ok(Self {
            surface,
            config,
            sink,
            fields,
        })
    }

    async fn read_record(
        &self,
        view: &dyn BrowserActions,
        address: &DetailAddress,
    ) -> Result<PatentRecord> {
        let sel = &self.config.selectors;
        let pane = PaneReader::new(view, &self.config.retry, &sel.error_container);

        if !view
            .is_visible(&sel.number, self.config.retry.reveal_timeout())
            .await?
        {
            tracing::warn!("Detail header of {} not visible, reading anyway", address);
        }

        let number = pane.read_field(&sel.number, FieldRead::First).await?;
        let title = pane.read_field(&sel.title, FieldRead::First).await?;
        let bibliographic = self.read_bibliographic(&pane).await?;
        let description = pane
            .read_pane(&sel.description_tab, &sel.content_pane, DESCRIPTION_JOINER)
            .await?;
        let claims = self.read_claims(&pane).await?;
        let citations = read_table(
            &pane,
            &sel.citations_tab,
            &sel.table_cell,
            &self.fields.citations,
        )
        .await?;
        let legal_events = read_table(
            &pane,
            &sel.legal_events_tab,
            &sel.table_cell,
            &self.fields.legal_events,
        )
        .await?;
        let family = read_table(&pane, &sel.family_tab, &sel.table_cell, &self.fields.family).await?;

        Ok(PatentRecord {
            number,
            title,
            bibliographic,
            description,
            claims,
            citations,
            legal_events,
            family,
            source_url: address.clone(),
            extracted_at: chrono::Utc::now(),
        })
    }

    async fn read_bibliographic(&self, pane: &PaneReader<'_>) -> Result<Bibliographic> {
        let sel = &self.config.selectors;
        let joined = FieldRead::Joined(LIST_JOINER);

        let classifications = Classifications {
            ipc: pane.read_field(&sel.ipc, joined).await?,
            cpc: pane.read_field(&sel.cpc, joined).await?,
            priorities: pane.read_field(&sel.priorities, joined).await?,
            application: pane.read_field(&sel.application, FieldRead::First).await?,
            publication: pane.read_field(&sel.publication, joined).await?,
            published_as: pane.read_field(&sel.published_as, joined).await?,
        };

        Ok(Bibliographic {
            applicants: pane.read_field(&sel.applicants, FieldRead::First).await?,
            inventors: pane.read_field(&sel.inventors, FieldRead::First).await?,
            abstract_text: pane.read_field(&sel.abstract_text, FieldRead::First).await?,
            classifications,
        })
    }

    async fn read_claims(&self, pane: &PaneReader<'_>) -> Result<Claims> {
        let sel = &self.config.selectors;

        let original = pane
            .read_pane(&sel.claims_original_tab, &sel.content_pane, CLAIMS_JOINER)
            .await?;
        if original.is_empty() {
            return Ok(Claims::new(original, None));
        }

        let tree = pane
            .read_pane(&sel.claims_tree_tab, &sel.content_pane, CLAIMS_JOINER)
            .await?;
        Ok(Claims::new(original, Some(tree)))
    }
}

#[async_trait::async_trait]
impl Extract for ItemExtractor {
    async fn extract(&self, address: DetailAddress) -> Result<PatentRecord> {
        let view: Arc<dyn BrowserActions> =
            Arc::from(self.surface.open_view(address.as_str()).await?);
        let guard = ViewGuard {
            view: Some(Arc::clone(&view)),
        };

        let result = self.read_record(view.as_ref(), &address).await;
        drop(view);
        guard.release(&address).await;

        let record = result?;
        self.sink.emit(&record)?;
        tracing::info!(number = %record.number, "Extracted {}", address);
        Ok(record)
    }
}

mod common;

use common::{fast_config, FakeSurface, Reveal};
use scout_core::{AppConfig, DetailAddress};
use scout_scanner::{Extract, ItemExtractor, MemorySink, ScanError};
use std::sync::Arc;

const ADDRESS: &str = "https://scout.test/detail/US2008179419A1";

/// Script a complete detail view with the default selectors.
fn script_detail(surface: &FakeSurface, config: &AppConfig, original_claims: &[&str]) {
    let sel = &config.selectors;
    let view = &surface.view;

    view.visible(&sel.number, &[true])
        .text(&sel.number, &["US2008179419A1"])
        .text(&sel.title, &["Catheter with sensor"])
        .text(&sel.applicants, &["ACME CORP [US]"])
        .text(&sel.inventors, &["DOE JOHN [US]"])
        .text(&sel.abstract_text, &["A catheter is disclosed."])
        .text(&sel.ipc, &["A61B5/00", "A61M25/00"])
        .text(&sel.cpc, &["A61B5/6852"])
        .text(&sel.application, &["US20070656153"])
        .text(&sel.publication, &["US2008179419A1"]);

    for tab in [
        &sel.description_tab,
        &sel.claims_original_tab,
        &sel.claims_tree_tab,
        &sel.citations_tab,
        &sel.legal_events_tab,
        &sel.family_tab,
    ] {
        view.visible(tab, &[true]);
    }

    view.on_click(
        &sel.description_tab,
        Reveal::default()
            .shows(&sel.content_pane, &[true])
            .with_text(&sel.content_pane, &["Field of the invention", "Background"]),
    )
    .on_click(
        &sel.claims_original_tab,
        Reveal::default()
            .shows(&sel.content_pane, &[true])
            .with_text(&sel.content_pane, original_claims),
    )
    .on_click(
        &sel.claims_tree_tab,
        Reveal::default()
            .shows(&sel.content_pane, &[true])
            .with_text(&sel.content_pane, &["1.", "2. dependent on 1"]),
    )
    .on_click(
        &sel.citations_tab,
        Reveal::default()
            .shows(&sel.table_cell, &[true])
            .with_text(&sel.table_cell, &["Applicant", "US5000000A", "Probe", "1990-01-01",
                "1991-01-01", "BETA INC", "A61B", "A61B5/00"]),
    )
    .on_click(
        &sel.legal_events_tab,
        Reveal::default()
            .shows(&sel.table_cell, &[false])
            .shows(&sel.error_container, &[true]),
    )
    .on_click(
        &sel.family_tab,
        Reveal::default()
            .shows(&sel.error_container, &[false])
            .shows(&sel.table_cell, &[true])
            .with_text(&sel.table_cell, &["US2008179419A1", "US20070656153", "Catheter",
                "2008-07-31", "ACME CORP", "WO2008093030A1", "IB2008050290", "Catheter",
                "2008-08-07", "ACME CORP"]),
    );
}

fn extractor(surface: &FakeSurface, config: AppConfig, sink: Arc<MemorySink>) -> ItemExtractor {
    ItemExtractor::new(Arc::new(surface.clone()), Arc::new(config), sink).expect("extractor")
}

#[tokio::test]
async fn test_extract_full_record() {
    let config = fast_config();
    let surface = FakeSurface::default();
    script_detail(&surface, &config, &["1. A catheter", "2. The catheter of claim 1"]);
    let sink = Arc::new(MemorySink::new());

    let record = extractor(&surface, config, sink.clone())
        .extract(DetailAddress::new(ADDRESS))
        .await
        .expect("extract record");

    assert_eq!(record.number, "US2008179419A1");
    assert_eq!(record.title, "Catheter with sensor");
    assert_eq!(record.bibliographic.applicants, "ACME CORP [US]");
    assert_eq!(record.bibliographic.classifications.ipc, "A61B5/00, A61M25/00");
    assert_eq!(record.bibliographic.classifications.priorities, "");
    assert_eq!(record.description, "Field of the invention\nBackground");
    assert_eq!(record.claims.original, "1. A catheter 2. The catheter of claim 1");
    assert_eq!(record.claims.tree.as_deref(), Some("1. 2. dependent on 1"));

    let citations = record.citations.as_ref().expect("citations");
    assert_eq!(citations.len(), 1);
    assert_eq!(citations.row(1).unwrap().get("Publication"), Some("US5000000A"));
    assert_eq!(citations.row(1).unwrap().get("CPCSort"), Some("A61B5/00"));

    assert!(record.legal_events.is_none());

    let family = record.family.as_ref().expect("family");
    assert_eq!(family.len(), 2);
    assert_eq!(family.row(2).unwrap().get("Application number"), Some("IB2008050290"));

    assert_eq!(record.source_url.as_str(), ADDRESS);
    assert_eq!(surface.opened.lock().unwrap().as_slice(), [ADDRESS.to_string()]);
    assert_eq!(surface.view.snapshot(|s| s.closed), 1);
    assert_eq!(sink.records().len(), 1);
}

#[tokio::test]
async fn test_empty_original_claims_skip_tree() {
    let config = fast_config();
    let tree_tab = config.selectors.claims_tree_tab.clone();
    let surface = FakeSurface::default();
    script_detail(&surface, &config, &[]);
    let sink = Arc::new(MemorySink::new());

    let record = extractor(&surface, config, sink)
        .extract(DetailAddress::new(ADDRESS))
        .await
        .expect("extract record");

    assert_eq!(record.claims.original, "");
    assert!(record.claims.tree.is_none());
    assert!(!surface.view.snapshot(|s| s.clicks.contains(&tree_tab)));

    let json = serde_json::to_value(&record).expect("serialize record");
    assert!(json["claims"].get("tree").is_none());
}

#[tokio::test]
async fn test_view_closed_when_extraction_fails() {
    let mut config = fast_config();
    config.retry.reveal_attempts = 1;
    let surface = FakeSurface::default();
    // Nothing scripted: the description tab never becomes visible.
    let sink = Arc::new(MemorySink::new());

    let err = extractor(&surface, config, sink.clone())
        .extract(DetailAddress::new(ADDRESS))
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::PaneTimeout { .. }));
    assert_eq!(surface.view.snapshot(|s| s.closed), 1);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_empty_field_set_is_rejected() {
    let mut config = fast_config();
    config.fields.legal_events.clear();
    let result = ItemExtractor::new(
        Arc::new(FakeSurface::default()),
        Arc::new(config),
        Arc::new(MemorySink::new()),
    );
    assert!(result.is_err());
}

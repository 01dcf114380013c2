use catalog_browser::data::{Record, StaticCatalogSource};
use catalog_browser::search_filter::{FilterEngine, FilterMode, FilterOptions};
use catalog_browser::state::{
    BrowserConfig, BrowserEvent, BrowserObserver, CatalogBrowser, LoadState, SelectionSnapshot,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn unseeded(prefetch_pages: usize) -> BrowserConfig {
    BrowserConfig {
        page_size: 5,
        initial_selection: 0,
        prefetch_pages,
        ..BrowserConfig::default()
    }
}

async fn loaded(
    count: usize,
    config: BrowserConfig,
) -> (Arc<StaticCatalogSource>, CatalogBrowser<StaticCatalogSource>) {
    let source = Arc::new(StaticCatalogSource::generated(count));
    let mut browser = CatalogBrowser::new(source.clone(), config);
    browser.initial_load().await.unwrap();
    (source, browser)
}

fn checked_ids(browser: &mut CatalogBrowser<StaticCatalogSource>) -> Vec<u64> {
    browser
        .view()
        .rows
        .iter()
        .filter(|row| row.checked)
        .map(|row| row.record.id)
        .collect()
}

#[test]
fn empty_term_returns_records_unchanged() {
    let records = vec![
        Record::new(3, "Bed", "furniture", 1899.99, 47),
        Record::new(1, "Mascara", "beauty", 9.99, 5),
    ];
    assert_eq!(FilterEngine::apply(&records, ""), records);
}

#[tokio::test]
async fn toggling_twice_restores_selection() {
    let (_source, mut browser) = loaded(12, unseeded(1)).await;

    assert_eq!(browser.toggle(3), Some(true));
    assert_eq!(checked_ids(&mut browser), vec![3]);
    assert_eq!(browser.toggle(3), Some(false));
    assert!(browser.selection().is_empty());
}

#[tokio::test]
async fn toggling_unknown_record_is_ignored() {
    let (_source, mut browser) = loaded(12, unseeded(1)).await;
    assert_eq!(browser.toggle(999), None);
    assert!(browser.selection().is_empty());
}

#[tokio::test]
async fn selection_survives_page_changes() {
    let (_source, mut browser) = loaded(12, unseeded(1)).await;
    browser.toggle(2);

    browser.go_to(3).await.unwrap();
    assert!(checked_ids(&mut browser).is_empty());
    assert!(browser.selection().contains(2));

    browser.go_to(1).await.unwrap();
    assert_eq!(checked_ids(&mut browser), vec![2]);
}

#[tokio::test]
async fn search_filters_every_cached_page() {
    let (source, mut browser) = loaded(100, unseeded(20)).await;
    let calls = source.call_count();

    browser.search("laptops").await.unwrap();
    let view = browser.view();
    assert_eq!(view.matches, Some(16));
    assert_eq!(view.total_pages, 4);
    assert_eq!(view.page, 1);
    assert!(view.rows.iter().all(|row| row.record.category == "laptops"));

    // Filtered pages come from the cache
    browser.go_to(4).await.unwrap();
    let view = browser.view();
    assert_eq!(view.page, 4);
    assert_eq!(view.rows.len(), 1);
    assert_eq!(source.call_count(), calls);
}

#[tokio::test]
async fn search_is_case_insensitive_over_name_and_category() {
    let (_source, mut browser) = loaded(12, unseeded(3)).await;

    browser.search("MASCARA").await.unwrap();
    let ids: Vec<u64> = browser.view().rows.iter().map(|r| r.record.id).collect();
    assert_eq!(ids, vec![1, 11]);

    browser.search("Fragrances").await.unwrap();
    let ids: Vec<u64> = browser.view().rows.iter().map(|r| r.record.id).collect();
    assert_eq!(ids, vec![2, 8]);
}

#[tokio::test]
async fn new_search_term_resets_to_first_page() {
    let (_source, mut browser) = loaded(12, unseeded(3)).await;
    browser.go_to(3).await.unwrap();

    browser.search("e").await.unwrap();
    assert_eq!(browser.filter_state().page_index, 0);

    browser.go_to(2).await.unwrap();
    assert_eq!(browser.filter_state().page_index, 1);
    browser.search("es").await.unwrap();
    assert_eq!(browser.filter_state().page_index, 0);
}

#[tokio::test]
async fn clearing_search_returns_to_remote_paging() {
    let (source, mut browser) = loaded(12, unseeded(3)).await;
    let calls = source.call_count();

    browser.search("bed").await.unwrap();
    assert_eq!(browser.view().matches, Some(1));

    browser.search("").await.unwrap();
    let view = browser.view();
    assert_eq!(view.matches, None);
    assert_eq!(view.page, 1);
    assert_eq!(view.total_pages, 3);
    assert_eq!(view.rows.len(), 5);
    assert_eq!(source.call_count(), calls);
}

#[tokio::test]
async fn selection_survives_filtering() {
    let (_source, mut browser) = loaded(12, unseeded(3)).await;
    browser.toggle(4);

    browser.search("mascara").await.unwrap();
    assert_eq!(browser.toggle(11), Some(true));
    assert_eq!(checked_ids(&mut browser), vec![11]);

    browser.search("").await.unwrap();
    assert_eq!(checked_ids(&mut browser), vec![4]);
    assert_eq!(browser.selection().ids(), &[4, 11]);
}

#[tokio::test]
async fn regex_mode_with_invalid_pattern_matches_nothing() {
    let (_source, mut browser) = loaded(12, unseeded(3)).await;
    browser.set_filter_options(FilterOptions {
        mode: FilterMode::Regex,
        include_numeric_fields: false,
    });

    browser.search("^(apple|wooden)").await.unwrap();
    assert_eq!(browser.view().matches, Some(2));

    browser.search("(unclosed").await.unwrap();
    let view = browser.view();
    assert_eq!(view.matches, Some(0));
    assert!(view.rows.is_empty());
    assert_eq!(view.load_state, LoadState::Idle);
}

#[derive(Clone, Default)]
struct LoadCounter {
    changes: Arc<AtomicUsize>,
    selections: Arc<AtomicUsize>,
}

impl BrowserObserver for LoadCounter {
    fn on_selection_changed(&mut self, _records: &[Record]) {
        self.selections.fetch_add(1, Ordering::SeqCst);
    }

    fn on_load_state_changed(&mut self, _state: &LoadState) {
        self.changes.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "load-counter"
    }
}

#[tokio::test]
async fn observers_follow_selection_and_load_state() {
    let source = Arc::new(StaticCatalogSource::generated(12));
    let mut browser = CatalogBrowser::new(source, BrowserConfig::default());
    let snapshot = SelectionSnapshot::new();
    let counter = LoadCounter::default();
    browser.subscribe(Box::new(snapshot.clone()));
    browser.subscribe(Box::new(counter.clone()));

    browser.initial_load().await.unwrap();
    assert_eq!(snapshot.len(), 5);
    // Loading(0) then Idle
    assert_eq!(counter.changes.load(Ordering::SeqCst), 2);

    browser.toggle(1);
    let ids: Vec<u64> = snapshot.records().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 3, 4, 5]);

    browser.clear_selection();
    assert!(snapshot.is_empty());
    assert_eq!(counter.selections.load(Ordering::SeqCst), 3);

    let events = browser.recent_events(1);
    assert_eq!(events, vec![BrowserEvent::SelectionChanged { selected: 0 }]);
}

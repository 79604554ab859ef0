mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use grid_bootstrap::config::SeedWriteMode;
use grid_bootstrap::query::MappingCatalog;
use grid_bootstrap::reference::{FinancialStatus, MarketCategory, StaticReferenceSource};
use grid_bootstrap::seed::SeedDataLoader;
use grid_bootstrap::storage::KvStoresRegistry;

const CALLERS: usize = 8;

#[test]
fn concurrent_coordinators_converge_to_one_run() {
    let reference = KvStoresRegistry::new();
    let reference_catalog = Arc::new(MappingCatalog::new());
    assert!(coordinator(Arc::new(reference.clone()), reference_catalog.clone()).run());

    let reg = KvStoresRegistry::new();
    let catalog = Arc::new(MappingCatalog::new());
    let results: Vec<bool> = thread::scope(|s| {
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let storage = Arc::new(reg.clone());
                let engine = catalog.clone();
                s.spawn(move || coordinator(storage, engine).run())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|ok| *ok), "results: {:?}", results);
    assert_eq!(dump(&reg), dump(&reference));
    assert_eq!(catalog.definitions(), reference_catalog.definitions());
    grid_bootstrap::tprintln!("catalog saw {} statements from {} callers", catalog.statements_executed(), CALLERS);
}

fn racing_loaders(mode: SeedWriteMode) -> KvStoresRegistry {
    let reg = KvStoresRegistry::new();
    let source = Arc::new(
        StaticReferenceSource::default()
            .with("AAA", "Alpha Corp", MarketCategory::Normal, FinancialStatus::Current)
            .with("BBB", "Beta Holdings", MarketCategory::CapitalMarket, FinancialStatus::Deficient),
    );
    thread::scope(|s| {
        for _ in 0..CALLERS {
            let loader = SeedDataLoader::new(Arc::new(reg.clone()), source.clone()).with_write_mode(mode);
            s.spawn(move || loader.load_seed("cfg", "sym", ADDRESS).unwrap());
        }
    });
    reg
}

#[test]
fn racing_seed_loaders_write_identical_values() {
    let overwrite = racing_loaders(SeedWriteMode::Overwrite);
    let guarded = racing_loaders(SeedWriteMode::PutIfAbsent);
    assert_eq!(dump(&overwrite), dump(&guarded));
    assert_eq!(overwrite.get_store("sym").len(), 2);
    assert_eq!(overwrite.get_store("cfg").len(), 3);
}

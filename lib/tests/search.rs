use cagen_lib::{
    BruteForceParams, BruteForceSearch, Error as CaError, Grid, Hrot, LruCache, PatternKind, Rule,
    RuleSearch, RuleSearchParams, SearchProgram, ShipSearch, ShipSearchParams, ShipSymmetry,
    Status, Symmetry,
};
use std::{collections::HashSet, error::Error, thread};

#[test]
fn exhaustive_soups() -> Result<(), Box<dyn Error>> {
    let search = BruteForceSearch::new(BruteForceParams::new(Hrot::life(), 3, 3))?;
    assert_eq!(search.search(u64::MAX), Status::Completed);
    assert_eq!(search.num_enumerated(), 512);
    assert!(search.num_searched() < 512);

    let results = search.results();
    assert!(results.iter().any(|r| r.kind == PatternKind::Spaceship));
    assert!(results.iter().any(|r| r.kind == PatternKind::Oscillator));
    assert!(results.iter().all(|r| r.kind != PatternKind::StillLife));
    Ok(())
}

#[test]
fn threads_see_every_soup() -> Result<(), Box<dyn Error>> {
    for &threads in &[3, 4] {
        let search = BruteForceSearch::new(BruteForceParams::new(Hrot::life(), 3, 3))?;
        assert_eq!(search.search_threaded(u64::MAX, threads), Status::Completed);
        assert_eq!(search.num_enumerated(), 512);
        assert!(search
            .results()
            .iter()
            .any(|r| r.kind == PatternKind::Spaceship));
    }
    Ok(())
}

#[test]
fn random_soups() -> Result<(), Box<dyn Error>> {
    let params = BruteForceParams::new(Hrot::life(), 8, 8)
        .set_random(Symmetry::D2Row, 50)
        .set_seed(42u64)
        .set_max_period(50);
    let search = BruteForceSearch::new(params)?;
    assert_eq!(search.search_threaded(40, 2), Status::Completed);
    assert_eq!(search.num_searched(), 40);
    Ok(())
}

#[test]
fn stopped_before_start() -> Result<(), Box<dyn Error>> {
    let search = BruteForceSearch::new(BruteForceParams::new(Hrot::life(), 3, 3))?;
    search.stop();
    assert!(search.is_stopped());
    assert_eq!(search.search(u64::MAX), Status::Stopped);
    assert_eq!(search.num_searched(), 0);

    search.resume();
    assert_eq!(search.search(u64::MAX), Status::Completed);
    assert!(search.num_searched() > 0);
    Ok(())
}

#[test]
fn stopped_from_another_thread() -> Result<(), Box<dyn Error>> {
    let search = BruteForceSearch::new(BruteForceParams::new(Hrot::life(), 4, 4))?;
    let status = thread::scope(|s| {
        s.spawn(|| {
            while search.num_enumerated() < 200 {
                thread::yield_now();
            }
            search.stop();
        });
        search.search_threaded(u64::MAX, 2)
    });
    assert_eq!(status, Status::Stopped);
    assert!(search.num_enumerated() < 1 << 16);

    let results = search.results();
    assert!(!results.is_empty());
    let hashes: HashSet<u64> = results.iter().map(|r| r.hash).collect();
    assert_eq!(hashes.len(), results.len());
    assert!(results.iter().all(|r| r.kind != PatternKind::StillLife));
    Ok(())
}

#[test]
fn results_are_written() -> Result<(), Box<dyn Error>> {
    let search = BruteForceSearch::new(BruteForceParams::new(Hrot::life(), 2, 2))?;
    search.search(u64::MAX);
    let mut out = Vec::new();
    search.write_results(&mut out)?;
    let text = String::from_utf8(out)?;
    assert!(text.starts_with("# Rule: B3/S23"));
    Ok(())
}

#[test]
fn rule_search_needs_ranges() -> Result<(), Box<dyn Error>> {
    let glider: Grid = ".o./..o/ooo".parse()?;
    let params = RuleSearchParams::new(glider, Hrot::moore(&[3, 6], &[]), Hrot::life());
    assert_eq!(RuleSearch::new(params).err(), Some(CaError::InvalidRuleRange));
    Ok(())
}

#[test]
fn rule_search() -> Result<(), Box<dyn Error>> {
    let glider: Grid = ".o./..o/ooo".parse()?;
    let min = Hrot::moore(&[3], &[2, 3]);
    let max = Hrot::moore(&[3, 5, 6, 7, 8], &[2, 3, 4, 5, 6, 7, 8]);
    let params = RuleSearchParams::new(glider, min.clone(), max.clone())
        .set_seed(7u64)
        .set_max_period(20)
        .set_high_period(3);
    let search = RuleSearch::new(params)?;
    assert_eq!(search.search_threaded(30, 2), Status::Completed);
    assert_eq!(search.num_searched(), 30);

    let results = search.results();
    for result in &results {
        assert!(result.rule.between(&min, &max)?);
        assert_ne!(result.kind, PatternKind::StillLife);
    }
    for result in search.interesting() {
        assert_eq!(result.kind, PatternKind::Spaceship);
    }
    Ok(())
}

#[test]
fn lwss_by_glide_symmetry() -> Result<(), Box<dyn Error>> {
    let params = ShipSearchParams::new(Hrot::life(), 5, 1, 2).set_symmetry(ShipSymmetry::Glide);
    let search = ShipSearch::new(params)?;
    assert_eq!(search.search(u64::MAX), Status::Completed);

    let results = search.results();
    assert_eq!(results.len(), 1);
    let ship = &results[0];
    assert_eq!(ship.kind, PatternKind::Spaceship);
    assert_eq!(ship.period, 4);
    assert_eq!(ship.displacement.x, 0);
    assert_eq!(ship.displacement.y.abs(), 2);
    Ok(())
}

#[test]
fn ship_search_with_deepening() -> Result<(), Box<dyn Error>> {
    let params = ShipSearchParams::new(Hrot::life(), 5, 1, 2)
        .set_symmetry(ShipSymmetry::Glide)
        .set_max_queue_size(16);
    let search = ShipSearch::new(params)?;
    assert_eq!(search.search_threaded(u64::MAX, 2), Status::Completed);
    assert_eq!(search.results().len(), 1);
    Ok(())
}

#[test]
fn deepening_keeps_the_search_moving() -> Result<(), Box<dyn Error>> {
    let params = ShipSearchParams::new(Hrot::life(), 10, 1, 3).set_max_queue_size(64);
    let search = ShipSearch::new(params)?;
    match search.search(2000) {
        Status::Searching => assert!(search.num_searched() >= 2000),
        status => assert_eq!(status, Status::Completed),
    }
    Ok(())
}

#[test]
fn ship_search_is_stoppable() -> Result<(), Box<dyn Error>> {
    let params = ShipSearchParams::new(Hrot::life(), 5, 1, 2).set_symmetry(ShipSymmetry::Glide);
    let search = ShipSearch::new(params)?;
    search.stop();
    assert_eq!(search.search(u64::MAX), Status::Stopped);
    assert_eq!(search.num_searched(), 0);
    search.resume();
    assert_eq!(search.search(u64::MAX), Status::Completed);
    Ok(())
}

#[test]
fn lru_eviction() {
    let mut cache = LruCache::new(2);
    cache.put('A', 1);
    cache.put('B', 2);
    assert_eq!(cache.get(&'A'), Some(&1));
    assert_eq!(cache.put('C', 3), Some(('B', 2)));
    assert!(cache.contains(&'A'));
    assert!(!cache.contains(&'B'));
    assert_eq!(cache.len(), 2);
}

#[test]
fn lru_forgets_the_oldest_entry() {
    let mut cache = LruCache::new(2);
    cache.put('A', 1);
    cache.put('B', 2);
    cache.put('C', 3);
    assert_eq!(cache.get(&'A'), None);
    assert_eq!(cache.get(&'B'), Some(&2));
    assert_eq!(cache.get(&'C'), Some(&3));
}

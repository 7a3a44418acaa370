use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::error::LoadError;
use super::loader::DataSource;
use super::model::{Character, RankingData, RankingEntry};

// ---------------------------------------------------------------------------
// DataStore – loads each collection once and hands out shared copies
// ---------------------------------------------------------------------------

/// Session cache over a [`DataSource`].
///
/// Each collection is read from the source on first use and shared as an
/// `Arc<[T]>` afterwards. The cache slot stays locked while the source is
/// being read, so concurrent first calls wait for the one in-flight load
/// instead of starting their own.
pub struct DataStore {
    source: Box<dyn DataSource>,
    characters: Mutex<Option<Arc<[Character]>>>,
    rankings: Mutex<Option<Arc<[RankingEntry]>>>,
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while loading leaves the slot empty, which is a valid state.
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DataStore {
    pub fn new(source: impl DataSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            characters: Mutex::new(None),
            rankings: Mutex::new(None),
        }
    }

    pub fn source(&self) -> &dyn DataSource {
        self.source.as_ref()
    }

    /// The full roster, read from the source on first call.
    pub fn load_characters(&self) -> Result<Arc<[Character]>, LoadError> {
        let mut slot = lock(&self.characters);
        if let Some(cached) = slot.as_ref() {
            log::debug!("Characters served from cache");
            return Ok(Arc::clone(cached));
        }
        let loaded: Arc<[Character]> = self.source.read_characters()?.into();
        log::info!(
            "Loaded {} characters from {}",
            loaded.len(),
            self.source.describe()
        );
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Every ranking observation, read from the source on first call.
    pub fn load_rankings(&self) -> Result<Arc<[RankingEntry]>, LoadError> {
        let mut slot = lock(&self.rankings);
        if let Some(cached) = slot.as_ref() {
            log::debug!("Rankings served from cache");
            return Ok(Arc::clone(cached));
        }
        let loaded: Arc<[RankingEntry]> = self.source.read_rankings()?.into();
        log::info!(
            "Loaded {} ranking entries from {}",
            loaded.len(),
            self.source.describe()
        );
        *slot = Some(Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Load both collections concurrently and join them.
    pub fn load_all(&self) -> Result<RankingData, LoadError> {
        let (characters, rankings) = std::thread::scope(|s| {
            let characters = s.spawn(|| self.load_characters());
            let rankings = self.load_rankings();
            let characters = characters
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (characters, rankings)
        });
        Ok(RankingData {
            characters: characters?,
            rankings: rankings?,
        })
    }

    /// Drop both cached collections; the next load re-reads the source.
    pub fn clear_cache(&self) {
        *lock(&self.characters) = None;
        *lock(&self.rankings) = None;
        log::debug!("Data cache cleared");
    }

    pub fn character_by_id(&self, id: &str) -> Result<Option<Character>, LoadError> {
        Ok(self.load_characters()?.iter().find(|c| c.id == id).cloned())
    }

    /// Entries of one character, oldest year first.
    pub fn rankings_by_character(&self, character_id: &str) -> Result<Vec<RankingEntry>, LoadError> {
        let mut entries: Vec<RankingEntry> = self
            .load_rankings()?
            .iter()
            .filter(|e| e.character_id == character_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.year);
        Ok(entries)
    }

    /// Entries of one year, best rank first.
    pub fn rankings_by_year(&self, year: i32) -> Result<Vec<RankingEntry>, LoadError> {
        let mut entries: Vec<RankingEntry> = self
            .load_rankings()?
            .iter()
            .filter(|e| e.year == year)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.rank);
        Ok(entries)
    }

    /// Distinct years with at least one entry, ascending.
    pub fn available_years(&self) -> Result<Vec<i32>, LoadError> {
        let years: BTreeSet<i32> = self.load_rankings()?.iter().map(|e| e.year).collect();
        Ok(years.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// In-memory source counting how often each document is read.
    #[derive(Default)]
    struct CountingSource {
        character_reads: Arc<AtomicUsize>,
        ranking_reads: Arc<AtomicUsize>,
        fail_rankings: bool,
    }

    fn character(id: &str) -> Character {
        Character {
            id: id.to_string(),
            name: id.to_uppercase(),
            name_en: None,
            description: String::new(),
            debut_year: 1980,
            color: "#123456".to_string(),
            image_url: None,
        }
    }

    fn entry(id: &str, year: i32, rank: u32) -> RankingEntry {
        RankingEntry {
            character_id: id.to_string(),
            year,
            rank,
            votes: None,
        }
    }

    impl DataSource for CountingSource {
        fn describe(&self) -> String {
            "counting source".to_string()
        }

        fn read_characters(&self) -> Result<Vec<Character>, LoadError> {
            self.character_reads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok(vec![character("a"), character("b")])
        }

        fn read_rankings(&self) -> Result<Vec<RankingEntry>, LoadError> {
            self.ranking_reads.fetch_add(1, Ordering::SeqCst);
            if self.fail_rankings {
                return Err(LoadError::invalid("rankings.json", "broken"));
            }
            Ok(vec![
                entry("b", 2001, 3),
                entry("a", 2001, 1),
                entry("a", 2000, 2),
                entry("b", 1999, 5),
            ])
        }
    }

    #[test]
    fn second_load_is_served_from_cache() {
        let source = CountingSource::default();
        let reads = Arc::clone(&source.character_reads);
        let store = DataStore::new(source);

        let first = store.load_characters().unwrap();
        let second = store.load_characters().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_cache_forces_reread() {
        let source = CountingSource::default();
        let reads = Arc::clone(&source.ranking_reads);
        let store = DataStore::new(source);

        store.load_rankings().unwrap();
        store.clear_cache();
        store.load_rankings().unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_first_loads_share_one_read() {
        let source = CountingSource::default();
        let reads = Arc::clone(&source.character_reads);
        let store = DataStore::new(source);

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| store.load_characters().unwrap());
            }
        });
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let source = CountingSource {
            fail_rankings: true,
            ..Default::default()
        };
        let reads = Arc::clone(&source.ranking_reads);
        let store = DataStore::new(source);

        assert!(store.load_all().is_err());
        assert!(store.load_rankings().is_err());
        assert_eq!(reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn accessors_sort_their_results() {
        let store = DataStore::new(CountingSource::default());

        let data = store.load_all().unwrap();
        assert_eq!(data.characters.len(), 2);
        assert_eq!(data.rankings.len(), 4);

        let years: Vec<i32> = store
            .rankings_by_character("a")
            .unwrap()
            .iter()
            .map(|e| e.year)
            .collect();
        assert_eq!(years, vec![2000, 2001]);

        let ranks: Vec<u32> = store
            .rankings_by_year(2001)
            .unwrap()
            .iter()
            .map(|e| e.rank)
            .collect();
        assert_eq!(ranks, vec![1, 3]);

        assert_eq!(store.available_years().unwrap(), vec![1999, 2000, 2001]);
        assert_eq!(store.character_by_id("b").unwrap().map(|c| c.id), Some("b".into()));
        assert_eq!(store.character_by_id("zzz").unwrap(), None);
    }
}

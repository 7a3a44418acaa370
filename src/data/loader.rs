use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::error::LoadError;
use super::model::{Character, RankingEntry};
use super::processor::MAX_RANK;

// ---------------------------------------------------------------------------
// DataSource – where the two documents come from
// ---------------------------------------------------------------------------

/// A static, read-only origin of the roster and the ranking observations.
pub trait DataSource: Send + Sync {
    /// Human readable origin, shown in the status bar and in logs.
    fn describe(&self) -> String;

    fn read_characters(&self) -> Result<Vec<Character>, LoadError>;

    fn read_rankings(&self) -> Result<Vec<RankingEntry>, LoadError>;

    /// Turn a character's `imageUrl` into a URI egui's loaders understand.
    fn resolve_image(&self, _image_url: &str) -> Option<String> {
        None
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn read_characters(&self) -> Result<Vec<Character>, LoadError> {
        (**self).read_characters()
    }

    fn read_rankings(&self) -> Result<Vec<RankingEntry>, LoadError> {
        (**self).read_rankings()
    }

    fn resolve_image(&self, image_url: &str) -> Option<String> {
        (**self).resolve_image(image_url)
    }
}

// ---------------------------------------------------------------------------
// Bundled dataset
// ---------------------------------------------------------------------------

const BUNDLED_CHARACTERS: &str = include_str!("../../data/characters.json");
const BUNDLED_RANKINGS: &str = include_str!("../../data/rankings.json");

/// The dataset compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedSource;

impl DataSource for EmbeddedSource {
    fn describe(&self) -> String {
        "bundled dataset".to_string()
    }

    fn read_characters(&self) -> Result<Vec<Character>, LoadError> {
        parse_characters(BUNDLED_CHARACTERS, "characters.json")
    }

    fn read_rankings(&self) -> Result<Vec<RankingEntry>, LoadError> {
        parse_rankings(BUNDLED_RANKINGS, "rankings.json")
    }
}

// ---------------------------------------------------------------------------
// Directory on disk
// ---------------------------------------------------------------------------

/// A data directory with the layout:
///
/// ```text
/// <root>/characters.json
/// <root>/rankings.json          one array with every year, or
/// <root>/rankings.csv           characterId,year,rank[,votes], or
/// <root>/rankings/<year>.json   one array per year
/// ```
///
/// The first ranking layout found wins, in the order listed.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DataSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn read_characters(&self) -> Result<Vec<Character>, LoadError> {
        let path = self.root.join("characters.json");
        parse_characters(&read_text(&path)?, &path.display().to_string())
    }

    fn read_rankings(&self) -> Result<Vec<RankingEntry>, LoadError> {
        let json = self.root.join("rankings.json");
        if json.is_file() {
            return parse_rankings(&read_text(&json)?, &json.display().to_string());
        }

        let csv_path = self.root.join("rankings.csv");
        if csv_path.is_file() {
            return parse_rankings_csv(&read_text(&csv_path)?, &csv_path.display().to_string());
        }

        let shard_dir = self.root.join("rankings");
        if shard_dir.is_dir() {
            return read_year_shards(&shard_dir);
        }

        Err(LoadError::MissingRankings(self.root.clone()))
    }

    fn resolve_image(&self, image_url: &str) -> Option<String> {
        if image_url.contains("://") {
            return Some(image_url.to_string());
        }
        let path = self.root.join(image_url);
        let path = std::fs::canonicalize(&path).unwrap_or(path);
        Some(format!("file://{}", path.display()))
    }
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Concatenate `<dir>/<year>.json` shards in ascending year order.
/// Files whose stem is not a year are ignored.
fn read_year_shards(dir: &Path) -> Result<Vec<RankingEntry>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut shards: Vec<(i32, PathBuf)> = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| LoadError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse::<i32>().ok())
        {
            Some(year) => shards.push((year, path)),
            None => log::debug!("Skipping non-year shard {}", path.display()),
        }
    }
    shards.sort_by_key(|(year, _)| *year);
    log::debug!("Found {} yearly ranking shards in {}", shards.len(), dir.display());

    let mut rankings = Vec::new();
    for (year, path) in shards {
        let document = path.display().to_string();
        let shard = parse_rankings(&read_text(&path)?, &document)?;
        if let Some(stray) = shard.iter().find(|e| e.year != year) {
            return Err(LoadError::invalid(
                &document,
                format!(
                    "entry for '{}' has year {} in the {year} shard",
                    stray.character_id, stray.year
                ),
            ));
        }
        rankings.extend(shard);
    }
    Ok(rankings)
}

// ---------------------------------------------------------------------------
// Parsing + validation
// ---------------------------------------------------------------------------

/// Parse a `Character[]` document. Ids must be non-empty and unique.
pub fn parse_characters(text: &str, document: &str) -> Result<Vec<Character>, LoadError> {
    let characters: Vec<Character> =
        serde_json::from_str(text).map_err(|source| LoadError::Json {
            document: document.to_string(),
            source,
        })?;

    let mut seen = HashSet::with_capacity(characters.len());
    for (i, c) in characters.iter().enumerate() {
        if c.id.is_empty() {
            return Err(LoadError::invalid(document, format!("character {i} has an empty id")));
        }
        if !seen.insert(c.id.as_str()) {
            return Err(LoadError::invalid(
                document,
                format!("duplicate character id '{}'", c.id),
            ));
        }
    }
    Ok(characters)
}

/// Parse a `RankingEntry[]` document.
pub fn parse_rankings(text: &str, document: &str) -> Result<Vec<RankingEntry>, LoadError> {
    let rankings: Vec<RankingEntry> =
        serde_json::from_str(text).map_err(|source| LoadError::Json {
            document: document.to_string(),
            source,
        })?;
    validate_rankings(&rankings, document)?;
    Ok(rankings)
}

/// Parse rankings from CSV with a `characterId,year,rank[,votes]` header.
pub fn parse_rankings_csv(text: &str, document: &str) -> Result<Vec<RankingEntry>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let rankings = reader
        .deserialize::<RankingEntry>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Csv {
            document: document.to_string(),
            source,
        })?;
    validate_rankings(&rankings, document)?;
    Ok(rankings)
}

fn validate_rankings(rankings: &[RankingEntry], document: &str) -> Result<(), LoadError> {
    match rankings
        .iter()
        .position(|e| !(1..=MAX_RANK).contains(&e.rank))
    {
        Some(i) => Err(LoadError::invalid(
            document,
            format!(
                "entry {i} ('{}', {}) has rank {}; ranks run from 1 to {MAX_RANK}",
                rankings[i].character_id, rankings[i].year, rankings[i].rank
            ),
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHARACTERS: &str = r##"[
        {"id":"kitty","name":"ハローキティ","nameEn":"Hello Kitty","description":"","debutYear":1974,"color":"#ff0000"},
        {"id":"melody","name":"マイメロディ","description":"","debutYear":1975,"color":"#ffc0cb"}
    ]"##;

    fn write(dir: &Path, name: &str, contents: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn bundled_dataset_is_valid() {
        let characters = EmbeddedSource.read_characters().unwrap();
        let rankings = EmbeddedSource.read_rankings().unwrap();
        assert!(!characters.is_empty());
        assert!(!rankings.is_empty());
    }

    #[test]
    fn rejects_duplicate_character_ids() {
        let text = r##"[
            {"id":"a","name":"A","description":"","debutYear":1990,"color":"#000000"},
            {"id":"a","name":"B","description":"","debutYear":1991,"color":"#000000"}
        ]"##;
        let err = parse_characters(text, "characters.json").unwrap_err();
        assert!(matches!(err, LoadError::Invalid { .. }));
    }

    #[test]
    fn rejects_wrong_shape_and_zero_rank() {
        assert!(matches!(
            parse_rankings(r#"{"not":"an array"}"#, "rankings.json"),
            Err(LoadError::Json { .. })
        ));
        assert!(matches!(
            parse_rankings(r#"[{"characterId":"a","year":2000,"rank":0}]"#, "rankings.json"),
            Err(LoadError::Invalid { .. })
        ));
        assert!(matches!(
            parse_rankings(r#"[{"characterId":"a","year":2000,"rank":-1}]"#, "rankings.json"),
            Err(LoadError::Json { .. })
        ));
    }

    #[test]
    fn rejects_ranks_beyond_the_cap() {
        assert!(matches!(
            parse_rankings(
                r#"[{"characterId":"a","year":2000,"rank":4294967295}]"#,
                "rankings.json"
            ),
            Err(LoadError::Invalid { .. })
        ));
        assert!(matches!(
            parse_rankings_csv("characterId,year,rank\na,2000,100001\n", "rankings.csv"),
            Err(LoadError::Invalid { .. })
        ));
        assert!(parse_rankings(
            r#"[{"characterId":"a","year":2000,"rank":100000}]"#,
            "rankings.json"
        )
        .is_ok());
    }

    #[test]
    fn parses_csv_with_optional_votes() {
        let text = "characterId,year,rank,votes\nkitty,2000,1,1200\nmelody,2000,2,\n";
        let rankings = parse_rankings_csv(text, "rankings.csv").unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[0].votes, Some(1200.0));
        assert_eq!(rankings[1].votes, None);
    }

    #[test]
    fn directory_with_single_rankings_document() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "characters.json", CHARACTERS);
        write(
            dir.path(),
            "rankings.json",
            r#"[{"characterId":"kitty","year":2000,"rank":1}]"#,
        );
        let source = DirectorySource::new(dir.path());
        assert_eq!(source.read_characters().unwrap().len(), 2);
        assert_eq!(source.read_rankings().unwrap().len(), 1);
    }

    #[test]
    fn directory_with_year_shards_concatenates_in_year_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "characters.json", CHARACTERS);
        write(
            dir.path(),
            "rankings/2001.json",
            r#"[{"characterId":"kitty","year":2001,"rank":2}]"#,
        );
        write(
            dir.path(),
            "rankings/2000.json",
            r#"[{"characterId":"kitty","year":2000,"rank":1},{"characterId":"melody","year":2000,"rank":2}]"#,
        );
        write(dir.path(), "rankings/README.json", "not a shard");

        let rankings = DirectorySource::new(dir.path()).read_rankings().unwrap();
        let years: Vec<i32> = rankings.iter().map(|e| e.year).collect();
        assert_eq!(years, vec![2000, 2000, 2001]);
    }

    #[test]
    fn shard_with_foreign_year_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "rankings/2000.json",
            r#"[{"characterId":"kitty","year":1999,"rank":1}]"#,
        );
        let err = DirectorySource::new(dir.path()).read_rankings().unwrap_err();
        assert!(matches!(err, LoadError::Invalid { .. }));
    }

    #[test]
    fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let source = DirectorySource::new(dir.path());
        assert!(matches!(source.read_characters(), Err(LoadError::Io { .. })));
        assert!(matches!(source.read_rankings(), Err(LoadError::MissingRankings(_))));
    }
}

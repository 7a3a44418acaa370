//! Writes a deterministic sample data directory:
//!
//! ```text
//! generate_sample [OUT_DIR] [--shards]
//! ```
//!
//! `OUT_DIR` defaults to `sample_data`. With `--shards` the rankings are
//! written as one `rankings/<year>.json` file per year instead of a single
//! `rankings.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};

const FIRST_YEAR: i32 = 1986;
const LAST_YEAR: i32 = 2024;
/// Ranked places published per year.
const PLACES: usize = 12;

/// (id, name, English name, debut year, colour, base popularity)
const ROSTER: &[(&str, &str, &str, i32, &str, f64)] = &[
    ("milk-panda", "ミルクパンダ", "Milk Panda", 1976, "#f4a6c1", 9.0),
    ("star-bunny", "スターバニー", "Star Bunny", 1981, "#7ec8e3", 8.0),
    ("pudding-dog", "プリンドッグ", "Pudding Dog", 1996, "#f6d55c", 8.5),
    ("cloud-puppy", "クラウドパピー", "Cloud Puppy", 2001, "#a7d8f0", 9.5),
    ("night-imp", "ナイトインプ", "Night Imp", 2005, "#5b4a6b", 8.2),
    ("choco-mouse", "チョコマウス", "Choco Mouse", 1978, "#8b5a3c", 6.0),
    ("sea-otter", "シーオッター", "Sea Otter", 1985, "#3caea3", 5.5),
    ("lemon-chick", "レモンチック", "Lemon Chick", 1990, "#fff06a", 6.5),
    ("berry-fox", "ベリーフォックス", "Berry Fox", 1988, "#e4572e", 5.0),
    ("sleepy-egg", "ねむたまご", "Sleepy Egg", 2013, "#fbe7a1", 7.0),
    ("mint-frog", "ミントフロッグ", "Mint Frog", 1992, "#98d7a5", 5.2),
    ("snow-seal", "スノーシール", "Snow Seal", 1999, "#dde8f0", 5.8),
    ("cocoa-bear", "ココアベア", "Cocoa Bear", 2009, "#a0785a", 6.2),
    ("peach-penguin", "ピーチペンギン", "Peach Penguin", 1995, "#ffb7a5", 5.6),
    ("tiny-dragon", "タイニードラゴン", "Tiny Dragon", 2018, "#6bbf59", 6.8),
    ("ribbon-lamb", "リボンラム", "Ribbon Lamb", 1983, "#f9d3e3", 4.8),
    ("jelly-cat", "ゼリーキャット", "Jelly Cat", 2020, "#c39bd3", 6.4),
];

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn characters() -> Value {
    ROSTER
        .iter()
        .map(|&(id, name, name_en, debut, color, _)| {
            json!({
                "id": id,
                "name": name,
                "nameEn": name_en,
                "description": format!("{name_en} first appeared in {debut}."),
                "debutYear": debut,
                "color": color,
            })
        })
        .collect()
}

/// Each year every debuted character draws a score around its popularity,
/// which drifts slowly; the best `PLACES` are ranked.
fn rankings(rng: &mut SimpleRng) -> Vec<(i32, Vec<Value>)> {
    let mut popularity: Vec<f64> = ROSTER.iter().map(|r| r.5).collect();
    let mut years = Vec::new();

    for year in FIRST_YEAR..=LAST_YEAR {
        let mut scores: Vec<(usize, f64)> = ROSTER
            .iter()
            .enumerate()
            .filter(|(_, r)| r.3 <= year)
            .map(|(i, _)| (i, rng.gauss(popularity[i], 1.2)))
            .collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1));

        let entries: Vec<Value> = scores
            .iter()
            .take(PLACES)
            .enumerate()
            .map(|(place, &(i, score))| {
                json!({
                    "characterId": ROSTER[i].0,
                    "year": year,
                    "rank": place + 1,
                    "votes": (score.max(0.5) * 10_000.0).round(),
                })
            })
            .collect();
        years.push((year, entries));

        for p in &mut popularity {
            *p += rng.gauss(0.0, 0.25);
        }
    }
    years
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let mut out_dir = PathBuf::from("sample_data");
    let mut shards = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--shards" => shards = true,
            other => out_dir = PathBuf::from(other),
        }
    }

    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    write_json(&out_dir.join("characters.json"), &characters())?;

    let mut rng = SimpleRng::new(42);
    let years = rankings(&mut rng);
    let total: usize = years.iter().map(|(_, e)| e.len()).sum();

    if shards {
        let shard_dir = out_dir.join("rankings");
        std::fs::create_dir_all(&shard_dir)
            .with_context(|| format!("creating {}", shard_dir.display()))?;
        for (year, entries) in years {
            write_json(&shard_dir.join(format!("{year}.json")), &Value::Array(entries))?;
        }
    } else {
        let all: Vec<Value> = years.into_iter().flat_map(|(_, e)| e).collect();
        write_json(&out_dir.join("rankings.json"), &Value::Array(all))?;
    }

    println!(
        "Wrote {} characters and {total} ranking entries to {}",
        ROSTER.len(),
        out_dir.display()
    );
    Ok(())
}

//! Player record persistence, one JSON file per serial key.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ff_rs_game::player::PlayerRecord;
use tracing::{info, warn};

/// Where player records live between sessions.
pub trait PlayerStore {
    /// Saved record for a login key, if any.
    fn load(&self, serial_key: i64) -> Option<PlayerRecord>;

    fn save(&self, record: &PlayerRecord) -> std::io::Result<()>;

    /// Fresh character with a newly assigned player id.
    fn create(&mut self, serial_key: i64) -> PlayerRecord;
}

pub struct JsonPlayerStore {
    dir: PathBuf,
    next_id: i32,
}

impl JsonPlayerStore {
    /// Open (creating if needed) a record directory and resume id assignment
    /// after the highest id found in it.
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        let mut max_id = 0;
        let mut count = 0;
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(record) = read_record(&path) {
                max_id = max_id.max(record.id);
                count += 1;
            }
        }
        info!("Player store at {} holds {count} records", dir.display());
        Ok(Self {
            dir,
            next_id: max_id + 1,
        })
    }

    fn path_for(&self, serial_key: i64) -> PathBuf {
        self.dir.join(format!("{serial_key}.json"))
    }
}

fn read_record(path: &Path) -> Option<PlayerRecord> {
    let data = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&data) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Failed to parse player record {}: {e}", path.display());
            None
        }
    }
}

impl PlayerStore for JsonPlayerStore {
    fn load(&self, serial_key: i64) -> Option<PlayerRecord> {
        read_record(&self.path_for(serial_key))
    }

    fn save(&self, record: &PlayerRecord) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(record).map_err(std::io::Error::other)?;
        std::fs::write(self.path_for(record.serial_key), json)
    }

    fn create(&mut self, serial_key: i64) -> PlayerRecord {
        let id = self.next_id;
        self.next_id += 1;
        PlayerRecord::new(id, serial_key)
    }
}

/// Seconds since the Unix epoch, stamped into saved records.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ff_rs_players_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn record_roundtrip() {
        let dir = temp_dir();
        let mut store = JsonPlayerStore::open(&dir).unwrap();
        let mut record = store.create(4242);
        record.money = 1234;
        record.x = -77;
        store.save(&record).unwrap();

        let loaded = store.load(4242).unwrap();
        assert_eq!(loaded, record);
        assert!(store.load(1).is_none());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn ids_resume_after_existing_records() {
        let dir = temp_dir();
        {
            let mut store = JsonPlayerStore::open(&dir).unwrap();
            let a = store.create(1);
            let b = store.create(2);
            assert_eq!((a.id, b.id), (1, 2));
            store.save(&b).unwrap();
        }
        let mut store = JsonPlayerStore::open(&dir).unwrap();
        assert_eq!(store.create(3).id, 3);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_record_is_skipped() {
        let dir = temp_dir();
        std::fs::write(dir.join("9.json"), "{ not json").unwrap();
        let mut store = JsonPlayerStore::open(&dir).unwrap();
        assert!(store.load(9).is_none());
        assert_eq!(store.create(10).id, 1);

        std::fs::remove_dir_all(&dir).ok();
    }
}

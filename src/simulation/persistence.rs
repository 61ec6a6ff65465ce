//! Scenario-set files: bincode inside a zstd stream.
//!
//! Persisting decouples expensive simulation from repeated optimization.
//! Saving, loading and saving again yields byte-identical files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::scenarios::{ScenarioKey, ScenarioSet};
use crate::error::{HoneypotError, Result};

const FORMAT_VERSION: u32 = 1;
const ZSTD_LEVEL: i32 = 3;

#[derive(Serialize, Deserialize)]
struct PersistedScenarioSet {
    format_version: u32,
    set: ScenarioSet,
}

fn serialization_error(path: &Path, reason: impl ToString) -> HoneypotError {
    HoneypotError::Serialization {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Conventional file name for a key, e.g. `net_repeated_attempt_T10_R100_fn0.1_p0.3.scn.zst`
pub fn file_name(key: &ScenarioKey) -> String {
    format!(
        "{}_{}_T{}_R{}_fn{}_p{}.scn.zst",
        key.network, key.model, key.time_steps, key.repetitions, key.false_negative, key.transmissibility
    )
}

impl ScenarioSet {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| HoneypotError::io(path, e))?;
        let mut encoder = zstd::Encoder::new(BufWriter::new(file), ZSTD_LEVEL)
            .map_err(|e| HoneypotError::io(path, e))?;

        let record = PersistedScenarioSet {
            format_version: FORMAT_VERSION,
            set: self.clone(),
        };
        bincode::serialize_into(&mut encoder, &record).map_err(|e| serialization_error(path, e))?;

        let mut writer = encoder.finish().map_err(|e| HoneypotError::io(path, e))?;
        writer.flush().map_err(|e| HoneypotError::io(path, e))?;
        log::debug!("Saved scenario set {} to {}", self.key(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<ScenarioSet> {
        let file = File::open(path).map_err(|e| HoneypotError::io(path, e))?;
        let decoder = zstd::Decoder::new(BufReader::new(file)).map_err(|e| HoneypotError::io(path, e))?;

        let record: PersistedScenarioSet =
            bincode::deserialize_from(decoder).map_err(|e| serialization_error(path, e))?;
        if record.format_version != FORMAT_VERSION {
            return Err(serialization_error(
                path,
                format!("unsupported format version {}", record.format_version),
            ));
        }
        record.set.check_shape()?;
        log::debug!("Loaded scenario set {} from {}", record.set.key(), path.display());
        Ok(record.set)
    }

    /// Save under `dir` using [`file_name`]; returns the written path
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| HoneypotError::io(dir, e))?;
        let path = dir.join(file_name(self.key()));
        self.save(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::generators;
    use crate::params::Parameters;
    use crate::simulation::{ScenarioGenerator, SpreadModel, StreamSeed};
    use tempfile::TempDir;

    fn sample_set() -> ScenarioSet {
        let g = generators::circulant(12, &[1, 3]).unwrap();
        let params = Parameters {
            network: g.name().to_string(),
            model: SpreadModel::NeighborThreshold,
            honeypots: 2,
            repetitions: 15,
            target_fraction: 0.8,
            false_negative: 0.3,
            time_steps: 4,
            transmissibility: 0.4,
        };
        ScenarioGenerator::new(&g)
            .generate(&params, StreamSeed::new(21))
            .unwrap()
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let set = sample_set();

        let first = set.save_in(dir.path()).unwrap();
        let loaded = ScenarioSet::load(&first).unwrap();
        assert_eq!(loaded, set);
        assert_eq!(loaded.key(), set.key());

        let second = dir.path().join("again.scn.zst");
        loaded.save(&second).unwrap();
        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    #[test]
    fn test_garbage_file_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("junk.scn.zst");
        std::fs::write(&path, b"not zstd at all").unwrap();
        assert!(ScenarioSet::load(&path).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = ScenarioSet::load(Path::new("/no/such/set.scn.zst")).unwrap_err();
        assert!(matches!(err, HoneypotError::Io { .. }));
        assert!(err.to_string().contains("/no/such/set.scn.zst"));
    }
}

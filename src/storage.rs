use crate::model::Planning;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge un planning (roster + calendrier) depuis un support.
    fn load(&self) -> anyhow::Result<Planning>;
    /// Sauvegarde de manière atomique.
    fn save(&self, planning: &Planning) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl Storage for JsonStorage {
    /// Les compteurs lus ne sont pas fiables : passer par
    /// [`crate::Scheduler::from_planning`] pour les reconstruire.
    fn load(&self) -> anyhow::Result<Planning> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let planning: Planning = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(planning)
    }

    fn save(&self, planning: &Planning) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(planning)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}

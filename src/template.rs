use crate::calendar::DaySelector;
use crate::clock::ClockTime;
use crate::model::MealPeriod;
use crate::scheduler::Scheduler;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Gabarit hebdomadaire de créneaux, appliqué à un mois entier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub slots: Vec<TemplateSlot>,
}

impl Template {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("template id cannot be empty");
        }
        if self.id.contains(['/', '\\']) {
            bail!("template id cannot contain path separators: {}", self.id);
        }
        if self.name.trim().is_empty() {
            bail!("template name cannot be empty");
        }
        if self.slots.is_empty() {
            bail!("template must contain at least one slot");
        }
        for slot in &self.slots {
            slot.validate()?;
        }
        validate_slot_overlaps(&self.slots)?;
        Ok(())
    }
}

/// Créneaux d'un service à ces heures, chaque jour de semaine listé (lundi = 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlot {
    pub meal: MealPeriod,
    pub times: Vec<ClockTime>,
    pub weekdays: Vec<u8>,
}

impl TemplateSlot {
    fn validate(&self) -> Result<()> {
        if self.times.is_empty() {
            bail!("{} slot must define at least one time", self.meal);
        }
        if self.weekdays.is_empty() {
            bail!("{} slot must define at least one weekday", self.meal);
        }
        if let Some(bad) = self.weekdays.iter().find(|d| **d > 6) {
            bail!("weekday out of range (0 = Monday .. 6 = Sunday): {bad}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TemplateInfo {
    pub template: Template,
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

/// Gestion simple des gabarits persistés sur disque.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    base_dir: PathBuf,
}

impl TemplateStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            base_dir: dir.as_ref().to_path_buf(),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("creating template directory {}", self.base_dir.display()))
    }

    pub fn save(&self, template: &Template) -> Result<PathBuf> {
        template.validate()?;
        self.ensure_dir()?;
        let path = self.base_dir.join(format!("{}.json", template.id));
        let json = serde_json::to_string_pretty(template)?;
        fs::write(&path, json).with_context(|| format!("writing template {}", path.display()))?;
        Ok(path)
    }

    pub fn load(&self, id: &str) -> Result<Template> {
        let path = self.base_dir.join(format!("{}.json", id));
        load_template_from_file(&path)
    }

    pub fn list(&self) -> Result<Vec<TemplateInfo>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }
        let mut infos = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let data = fs::read(&path)?;
            let template: Template = match serde_json::from_slice(&data) {
                Ok(t) => t,
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping unreadable template");
                    continue;
                }
            };
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .ok()
                .map(DateTime::<Utc>::from);
            infos.push(TemplateInfo {
                template,
                path,
                modified,
            });
        }
        infos.sort_by(|a, b| a.template.id.cmp(&b.template.id));
        Ok(infos)
    }
}

/// Crée les créneaux du gabarit sur chaque jour du mois correspondant.
/// Renvoie le nombre de créneaux réellement créés (les existants sont gardés).
pub fn apply_template(scheduler: &mut Scheduler, template: &Template) -> Result<usize> {
    template.validate()?;
    let mut created = 0;
    for slot in &template.slots {
        let selector = DaySelector::weekdays(slot.weekdays.iter().copied());
        created += scheduler
            .create_slots(&selector, slot.meal, &slot.times)
            .with_context(|| format!("applying template {}", template.id))?;
    }
    debug!(template = %template.id, created, "template applied");
    Ok(created)
}

pub fn export_template_json<P: AsRef<Path>>(path: P, template: &Template) -> Result<()> {
    let json = serde_json::to_string_pretty(template)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_template_from_file<P: AsRef<Path>>(path: P) -> Result<Template> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading template {}", path.display()))?;
    let template: Template = serde_json::from_slice(&data)
        .with_context(|| format!("parsing template {}", path.display()))?;
    template.validate()?;
    Ok(template)
}

/// Deux motifs du même service ne doivent pas déclarer la même heure sur un
/// même jour de semaine.
fn validate_slot_overlaps(slots: &[TemplateSlot]) -> Result<()> {
    for (i, a) in slots.iter().enumerate() {
        for b in slots.iter().skip(i + 1) {
            if a.meal != b.meal {
                continue;
            }
            let shared_day = a.weekdays.iter().find(|d| b.weekdays.contains(d));
            let shared_time = a.times.iter().find(|t| b.times.contains(t));
            if let (Some(day), Some(time)) = (shared_day, shared_time) {
                bail!(
                    "template declares {} {} twice on weekday {}",
                    a.meal,
                    time,
                    day
                );
            }
        }
    }
    Ok(())
}

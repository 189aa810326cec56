use crate::calendar::MonthCalendar;
use crate::model::{Planning, Worker};
use crate::rule::WEEKDAY_NAMES;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Import d'employés depuis CSV : header `name,priority` (priorité 0 si vide).
///
/// Les employés importés n'ont aucune règle ; les ajouter ensuite.
pub fn import_workers_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Worker>> {
    let path = path.as_ref();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let name = rec.get(0).context("missing name")?.trim();
        if name.is_empty() {
            bail!("invalid worker row {} (empty name)", line + 2);
        }
        let priority = match rec.get(1).map(str::trim) {
            None | Some("") => 0,
            Some(raw) => raw
                .parse::<i32>()
                .with_context(|| format!("invalid priority for worker {name}: {raw}"))?,
        };
        out.push(Worker::new(name, priority));
    }
    Ok(out)
}

/// Export CSV du calendrier : header `day,weekday,meal,time,worker`.
///
/// Une ligne par créneau, dans l'ordre du calendrier (jour, midi puis soir,
/// heure croissante) ; `worker` est vide pour un créneau libre.
pub fn export_schedule_csv<W: Write>(writer: W, calendar: &MonthCalendar) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_writer(writer);
    w.write_record(["day", "weekday", "meal", "time", "worker"])?;
    for day in calendar.days() {
        let day_num = day.day_of_month().to_string();
        let weekday = WEEKDAY_NAMES
            .get(usize::from(day.weekday()))
            .copied()
            .unwrap_or("?");
        for (meal, time, worker) in day.all_slots() {
            let time = time.to_string();
            w.write_record([
                day_num.as_str(),
                weekday,
                meal.as_str(),
                time.as_str(),
                worker.map_or("", |id| id.as_str()),
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Export JSON du planning (jolie mise en forme)
pub fn export_planning_json<P: AsRef<Path>>(path: P, planning: &Planning) -> anyhow::Result<()> {
    let s = serde_json::to_string_pretty(planning)?;
    fs::write(path, s)?;
    Ok(())
}

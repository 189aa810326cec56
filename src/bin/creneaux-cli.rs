#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use creneaux::{
    apply_template, io, load_template_from_file,
    rule::WEEKDAY_NAMES,
    storage::{JsonStorage, Storage},
    Availability, ClockTime, DaySelector, MealPeriod, Rule, RunOutcome, Scheduler, SlotQuery,
    TemplateStore, Worker, WorkerId,
};
use std::path::PathBuf;
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de remplissage des créneaux midi/soir (fichier JSON, sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`, filtre via RUST_LOG)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du planning
    #[arg(long, global = true, default_value = "planning.json")]
    planning: PathBuf,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer un planning vide pour un mois
    Init {
        #[arg(long)]
        month: u32,
        #[arg(long)]
        year: i32,
        /// Écrase un planning existant
        #[arg(long)]
        force: bool,
    },

    /// Ajouter un employé
    AddWorker {
        name: String,
        /// Plus petit = planifié en premier
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        priority: i32,
    },

    /// Importer des employés depuis un CSV (`name,priority`)
    ImportWorkers {
        #[arg(long)]
        csv: PathBuf,
    },

    /// Retirer un employé (ses créneaux sont libérés)
    RemoveWorker { name: String },

    /// Changer la priorité d'un employé
    SetPriority {
        name: String,
        #[arg(allow_negative_numbers = true)]
        priority: i32,
    },

    /// Ajouter une règle à un employé
    AddRule {
        name: String,
        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Retirer la règle d'index donné (voir `list`)
    RemoveRule { name: String, index: usize },

    /// Créer des créneaux vides
    CreateSlot {
        #[command(flatten)]
        target: SlotArgs,
    },

    /// Supprimer des créneaux
    DeleteSlot {
        #[command(flatten)]
        target: SlotArgs,
    },

    /// Assigner manuellement des créneaux existants (règles ignorées)
    Assign {
        #[command(flatten)]
        target: SlotArgs,
        #[arg(long)]
        worker: String,
    },

    /// Vider des créneaux (tous ceux du service si `--times` est absent)
    Clear {
        #[command(flatten)]
        days: DaysArgs,
        #[arg(long)]
        meal: MealPeriod,
        #[arg(long)]
        times: Option<String>,
    },

    /// Un employé pourrait-il tenir ce créneau ?
    Query {
        name: String,
        #[arg(long)]
        meal: Option<MealPeriod>,
        #[arg(long)]
        time: Option<ClockTime>,
        /// Jour du mois ; complète `--weekday` et `--week` depuis le calendrier
        #[arg(long)]
        day: Option<u8>,
        #[arg(long)]
        weekday: Option<String>,
        #[arg(long)]
        week: Option<u8>,
    },

    /// Remplir le calendrier (recherche exhaustive)
    Run {
        /// Borne le nombre d'étapes (le calendrier peut rester partiel)
        #[arg(long)]
        budget: Option<u64>,
    },

    /// Afficher employés et calendrier
    List {
        /// N'afficher que les créneaux de cet employé
        #[arg(long)]
        worker: Option<String>,
    },

    /// Auditer le calendrier (créneaux vides, indisponibilités, quotas)
    Check {
        /// Export CSV des anomalies (optionnel)
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Appliquer un gabarit de créneaux
    ApplyTemplate {
        /// Fichier JSON du gabarit
        #[arg(long, conflicts_with = "id")]
        file: Option<PathBuf>,
        /// Identifiant d'un gabarit du répertoire `--dir`
        #[arg(long, requires = "dir")]
        id: Option<String>,
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Exporter le calendrier (CSV, `-` pour stdout) et/ou le planning (JSON)
    Export {
        #[arg(long)]
        csv: Option<String>,
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct DaysArgs {
    /// Jours du mois : "1,2,10-15"
    #[arg(long)]
    days: Option<String>,
    /// Jours de semaine : "mon,wed" ou "0,2" (lundi = 0)
    #[arg(long)]
    weekdays: Option<String>,
}

impl DaysArgs {
    fn selector(&self) -> Result<DaySelector> {
        match (&self.days, &self.weekdays) {
            (Some(days), _) => Ok(DaySelector::days(parse_numbers(days)?)),
            (None, Some(weekdays)) => Ok(DaySelector::weekdays(parse_weekdays(weekdays)?)),
            (None, None) => bail!("either --days or --weekdays is required"),
        }
    }
}

#[derive(Args, Debug)]
struct SlotArgs {
    #[command(flatten)]
    days: DaysArgs,
    #[arg(long)]
    meal: MealPeriod,
    /// Heures de début : "11:00,11:30"
    #[arg(long)]
    times: String,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct RuleKind {
    /// Quota mensuel
    #[arg(long)]
    monthly_cap: Option<u32>,
    /// Quota hebdomadaire
    #[arg(long)]
    weekly_cap: Option<u32>,
    /// Jours du mois exclus : "3,4"
    #[arg(long)]
    exclude: Option<String>,
    /// Disponibilité à partir de cette heure
    #[arg(long)]
    from: Option<ClockTime>,
}

#[derive(Args, Debug)]
struct RuleArgs {
    #[command(flatten)]
    kind: RuleKind,
    /// Service visé (les deux si absent)
    #[arg(long)]
    meal: Option<MealPeriod>,
    /// Disponibilité : jours du mois
    #[arg(long, conflicts_with_all = ["weekdays", "weeks"])]
    days: Option<String>,
    /// Disponibilité : jours de semaine
    #[arg(long)]
    weekdays: Option<String>,
    /// Disponibilité : semaines du mois (1..=5)
    #[arg(long)]
    weeks: Option<String>,
    /// Remplace un quota existant au lieu de refuser le doublon
    #[arg(long)]
    replace: bool,
}

impl RuleArgs {
    fn to_rule(&self) -> Result<Rule> {
        let kind = &self.kind;
        if let Some(max) = kind.monthly_cap {
            return Ok(Rule::monthly_cap(max));
        }
        if let Some(max) = kind.weekly_cap {
            return Ok(Rule::weekly_cap(max));
        }
        if let Some(days) = &kind.exclude {
            return Ok(Rule::exclude(parse_numbers(days)?, self.meal)?);
        }
        let Some(from) = kind.from else {
            bail!("one of --monthly-cap, --weekly-cap, --exclude or --from is required");
        };
        let weekdays = self.weekdays.as_deref().map(parse_weekdays).transpose()?;
        let weeks = self.weeks.as_deref().map(parse_numbers).transpose()?;
        let availability = match (&self.days, weekdays, weeks) {
            (Some(days), _, _) => Availability::by_day_of_month(parse_numbers(days)?, from)?,
            (None, Some(weekdays), weeks) => Availability::by_weekday(weekdays, weeks, from)?,
            (None, None, Some(weeks)) => Availability::by_week_of_month(weeks, None, from)?,
            (None, None, None) => Availability::every_day(from),
        };
        Ok(match self.meal {
            Some(meal) => availability.for_meal(meal).into(),
            None => availability.into(),
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.planning)?;

    if let Commands::Init { month, year, force } = cli.cmd {
        if storage.exists() && !force {
            bail!(
                "{} already exists (use --force to overwrite)",
                storage.path().display()
            );
        }
        let scheduler = Scheduler::new(month, year)?;
        storage.save(&scheduler.to_planning())?;
        println!("Planning {month:02}/{year} created in {}", storage.path().display());
        std::process::exit(0);
    }

    if !storage.exists() {
        bail!(
            "no planning at {} (run `init` first)",
            storage.path().display()
        );
    }
    let mut scheduler = Scheduler::from_planning(storage.load()?)
        .with_context(|| format!("loading {}", storage.path().display()))?;

    let code = match cli.cmd {
        Commands::Init { .. } => 0,
        Commands::AddWorker { name, priority } => {
            scheduler.add_worker(Worker::new(&name, priority))?;
            storage.save(&scheduler.to_planning())?;
            0
        }
        Commands::ImportWorkers { csv } => {
            let workers = io::import_workers_csv(&csv)?;
            let count = workers.len();
            scheduler.add_workers(workers)?;
            storage.save(&scheduler.to_planning())?;
            println!("{count} worker(s) imported");
            0
        }
        Commands::RemoveWorker { name } => {
            let removed = scheduler.remove_worker(&WorkerId::new(&name))?;
            storage.save(&scheduler.to_planning())?;
            println!("{} removed", removed.id);
            0
        }
        Commands::SetPriority { name, priority } => {
            scheduler.set_priority(&WorkerId::new(&name), priority)?;
            storage.save(&scheduler.to_planning())?;
            0
        }
        Commands::AddRule { name, rule } => {
            let id = WorkerId::new(&name);
            match (rule.replace, rule.kind.monthly_cap, rule.kind.weekly_cap) {
                (true, Some(max), _) => scheduler.set_monthly_cap(&id, max)?,
                (true, _, Some(max)) => scheduler.set_weekly_cap(&id, max)?,
                _ => scheduler.add_rule(&id, rule.to_rule()?)?,
            }
            storage.save(&scheduler.to_planning())?;
            0
        }
        Commands::RemoveRule { name, index } => {
            let removed = scheduler.remove_rule(&WorkerId::new(&name), index)?;
            storage.save(&scheduler.to_planning())?;
            println!("removed: {removed}");
            0
        }
        Commands::CreateSlot { target } => {
            let selector = target.days.selector()?;
            let times = parse_times(&target.times)?;
            let created = scheduler.create_slots(&selector, target.meal, &times)?;
            storage.save(&scheduler.to_planning())?;
            println!("{created} slot(s) created");
            0
        }
        Commands::DeleteSlot { target } => {
            let selector = target.days.selector()?;
            let times = parse_times(&target.times)?;
            let deleted = scheduler.delete_slots(&selector, target.meal, &times)?;
            storage.save(&scheduler.to_planning())?;
            println!("{deleted} slot(s) deleted");
            0
        }
        Commands::Assign { target, worker } => {
            let selector = target.days.selector()?;
            let times = parse_times(&target.times)?;
            let assigned =
                scheduler.assign_slots(&selector, target.meal, &times, &WorkerId::new(&worker))?;
            storage.save(&scheduler.to_planning())?;
            println!("{assigned} slot(s) assigned to {worker}");
            0
        }
        Commands::Clear { days, meal, times } => {
            let selector = days.selector()?;
            let times = times.as_deref().map(parse_times).transpose()?;
            let cleared = scheduler.clear_slots(&selector, meal, times.as_deref())?;
            storage.save(&scheduler.to_planning())?;
            println!("{cleared} slot(s) cleared");
            0
        }
        Commands::Query {
            name,
            meal,
            time,
            day,
            weekday,
            week,
        } => {
            let mut builder = SlotQuery::builder();
            if let Some(meal) = meal {
                builder = builder.meal(meal);
            }
            if let Some(time) = time {
                builder = builder.time(time);
            }
            if let Some(d) = day.and_then(|d| scheduler.calendar().day(d)) {
                builder = builder
                    .weekday(d.weekday())
                    .week_of_month(d.week_of_month());
            }
            if let Some(d) = day {
                builder = builder.day_of_month(d);
            }
            if let Some(raw) = weekday {
                let parsed = parse_weekdays(&raw)?;
                let [single] = parsed.as_slice() else {
                    bail!("--weekday expects exactly one day");
                };
                builder = builder.weekday(*single);
            }
            if let Some(week) = week {
                builder = builder.week_of_month(week);
            }
            let ok = scheduler.query(&WorkerId::new(&name), builder)?;
            println!("{}", if ok { "yes" } else { "no" });
            0
        }
        Commands::Run { budget } => {
            let report = scheduler.run(budget)?;
            storage.save(&scheduler.to_planning())?;
            match report.outcome {
                RunOutcome::Complete => {
                    println!(
                        "OK: all {} slot(s) filled ({} steps, {} backtracks)",
                        scheduler.calendar().slot_count(),
                        report.steps,
                        report.backtracks
                    );
                    0
                }
                RunOutcome::BudgetExhausted => {
                    println!(
                        "Budget exhausted after {} steps: calendar left partial ({} empty slot(s))",
                        report.steps,
                        scheduler.calendar().empty_slot_count()
                    );
                    0
                }
                RunOutcome::Infeasible => {
                    eprintln!(
                        "No complete schedule exists for these rules ({} steps)",
                        report.steps
                    );
                    2
                }
            }
        }
        Commands::List { worker } => {
            print_listing(&scheduler, worker.as_deref());
            0
        }
        Commands::Check { report } => {
            let conflicts = scheduler.audit();
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                for c in &conflicts {
                    eprintln!("  {c}");
                }
                if let Some(path) = report {
                    let mut w = csv::Writer::from_path(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    w.write_record(["kind", "worker", "detail"])?;
                    for c in &conflicts {
                        let detail = c.to_string();
                        w.write_record([
                            c.kind().as_str(),
                            c.worker().map_or("", |w| w.as_str()),
                            detail.as_str(),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::ApplyTemplate { file, id, dir } => {
            let template = match (file, id, dir) {
                (Some(file), _, _) => load_template_from_file(file)?,
                (None, Some(id), Some(dir)) => TemplateStore::new(dir).load(&id)?,
                _ => bail!("either --file or --id with --dir is required"),
            };
            let created = apply_template(&mut scheduler, &template)?;
            storage.save(&scheduler.to_planning())?;
            println!("{created} slot(s) created from template {}", template.id);
            0
        }
        Commands::Export { csv, json } => {
            if csv.is_none() && json.is_none() {
                bail!("nothing to export (use --csv and/or --json)");
            }
            match csv.as_deref() {
                Some("-") => io::export_schedule_csv(std::io::stdout().lock(), scheduler.calendar())?,
                Some(path) => {
                    let file = std::fs::File::create(path)
                        .with_context(|| format!("creating {path}"))?;
                    io::export_schedule_csv(file, scheduler.calendar())?;
                }
                None => {}
            }
            if let Some(path) = json {
                io::export_planning_json(path, &scheduler.to_planning())?;
            }
            0
        }
    };

    std::process::exit(code);
}

fn print_listing(scheduler: &Scheduler, only: Option<&str>) {
    let calendar = scheduler.calendar();
    println!(
        "{:02}/{} - {} day(s), {} slot(s), {} empty",
        calendar.month(),
        calendar.year(),
        calendar.num_days(),
        calendar.slot_count(),
        calendar.empty_slot_count()
    );

    for w in scheduler.roster().iter() {
        if only.is_some_and(|name| name != w.id.as_str()) {
            continue;
        }
        println!(
            "{} (priority {}) | month {} | weeks {:?}",
            w.id,
            w.priority,
            w.shifts_this_month(),
            w.shifts_per_week()
        );
        for (i, rule) in w.rules().iter().enumerate() {
            println!("  [{i}] {rule}");
        }
    }

    for day in calendar.days() {
        let weekday = WEEKDAY_NAMES
            .get(usize::from(day.weekday()))
            .copied()
            .unwrap_or("?");
        for (meal, time, assignee) in day.all_slots() {
            if let Some(name) = only {
                if assignee.map(|id| id.as_str()) != Some(name) {
                    continue;
                }
            }
            println!(
                "{:>2} {} w{} | {:<6} {:>7} | {}",
                day.day_of_month(),
                weekday,
                day.week_of_month(),
                meal.as_str(),
                time.display_12h(),
                assignee.map_or("-", |id| id.as_str())
            );
        }
    }
}

/// "1,2,10-15" -> [1, 2, 10, 11, ..., 15]
fn parse_numbers(raw: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for chunk in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        match chunk.split_once('-') {
            Some((lo, hi)) => {
                let lo: u8 = lo.trim().parse().with_context(|| format!("invalid number: {lo}"))?;
                let hi: u8 = hi.trim().parse().with_context(|| format!("invalid number: {hi}"))?;
                if hi < lo {
                    bail!("invalid range: {chunk}");
                }
                out.extend(lo..=hi);
            }
            None => out.push(
                chunk
                    .parse()
                    .with_context(|| format!("invalid number: {chunk}"))?,
            ),
        }
    }
    if out.is_empty() {
        bail!("empty list: {raw:?}");
    }
    Ok(out)
}

/// Noms anglais abrégés ("mon") ou numéros (lundi = 0).
fn parse_weekdays(raw: &str) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for chunk in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let by_name = WEEKDAY_NAMES
            .iter()
            .position(|n| chunk.get(..3).is_some_and(|head| n.eq_ignore_ascii_case(head)));
        match by_name {
            Some(idx) => out.push(idx as u8),
            None => out.extend(parse_numbers(chunk)?),
        }
    }
    if out.is_empty() {
        bail!("empty weekday list: {raw:?}");
    }
    Ok(out)
}

fn parse_times(raw: &str) -> Result<Vec<ClockTime>> {
    let times = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<ClockTime>().map_err(anyhow::Error::from))
        .collect::<Result<Vec<_>>>()?;
    if times.is_empty() {
        bail!("empty time list: {raw:?}");
    }
    Ok(times)
}


// src/filler.rs
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::absence_client::{AbsenceClient, AbsenceError};
use crate::calendar::{DayClass, DayFilter};
use crate::config::WorkEntryTemplate;

/// What happened to a single date during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DayOutcome {
    Written { timespan_id: Option<String> },
    AbsenceExists { count: u64 },
    BankHoliday,
    ExcludedWeekday,
}

impl DayOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DayOutcome::Written { .. } => "written",
            DayOutcome::AbsenceExists { .. } => "absence",
            DayOutcome::BankHoliday => "bank_holiday",
            DayOutcome::ExcludedWeekday => "excluded_weekday",
        }
    }

    pub fn detail(&self) -> String {
        match self {
            DayOutcome::Written { timespan_id } => timespan_id.clone().unwrap_or_default(),
            DayOutcome::AbsenceExists { count } => format!("{} absence(s)", count),
            DayOutcome::BankHoliday | DayOutcome::ExcludedWeekday => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FillSummary {
    pub outcomes: Vec<(NaiveDate, DayOutcome)>,
}

impl FillSummary {
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::Written { .. }))
    }

    pub fn skipped_absence(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::AbsenceExists { .. }))
    }

    pub fn skipped_bank_holiday(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::BankHoliday))
    }

    pub fn skipped_weekday(&self) -> usize {
        self.count(|o| matches!(o, DayOutcome::ExcludedWeekday))
    }

    fn count(&self, pred: impl Fn(&DayOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub struct WorkFiller {
    client: AbsenceClient,
    filter: DayFilter,
    entry: WorkEntryTemplate,
}

impl WorkFiller {
    pub fn new(client: AbsenceClient, filter: DayFilter, entry: WorkEntryTemplate) -> Self {
        Self {
            client,
            filter,
            entry,
        }
    }

    /// Processes `dates` in order, one request at a time. The first error
    /// (including rejected credentials) aborts the run.
    pub async fn run(&self, dates: &[NaiveDate]) -> Result<FillSummary, AbsenceError> {
        info!(
            "Filling {} business day(s) for user {}",
            dates.len(),
            self.client.user_id()
        );
        let mut summary = FillSummary::default();
        for &day in dates {
            let outcome = self.fill_day(day).await?;
            summary.outcomes.push((day, outcome));
        }
        info!(
            "Done: {} written, {} skipped because of holiday, {} skipped because of bank holiday, {} excluded",
            summary.written(),
            summary.skipped_absence(),
            summary.skipped_bank_holiday(),
            summary.skipped_weekday()
        );
        Ok(summary)
    }

    pub async fn fill_day(&self, day: NaiveDate) -> Result<DayOutcome, AbsenceError> {
        match self.filter.classify(day) {
            DayClass::BankHoliday => {
                info!("{}: skipped because of bank holiday", day);
                return Ok(DayOutcome::BankHoliday);
            }
            DayClass::ExcludedWeekday => {
                debug!("{}: skipped because {} is excluded", day, day.format("%A"));
                return Ok(DayOutcome::ExcludedWeekday);
            }
            DayClass::Fill => {}
        }

        self.client.verify_user().await?;

        let absences = self.client.find_absences(day).await?;
        if absences.count > 0 {
            info!("{}: skipped because of holiday", day);
            for absence in &absences.data {
                debug!(
                    "{}: covered by absence {} ({} - {})",
                    day,
                    absence.id.as_deref().unwrap_or("?"),
                    absence.start.as_deref().unwrap_or("?"),
                    absence.end.as_deref().unwrap_or("?")
                );
            }
            return Ok(DayOutcome::AbsenceExists {
                count: absences.count,
            });
        }

        info!("{}: write work time entry", day);
        let created = self.client.create_timespan(day, &self.entry).await?;
        Ok(DayOutcome::Written {
            timespan_id: created.id,
        })
    }
}

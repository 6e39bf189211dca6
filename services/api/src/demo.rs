use crate::infra::Services;
use chrono::{Duration, Utc};
use clap::Args;
use job_board::clock::{Clock, ManualClock};
use job_board::config::PolicyConfig;
use job_board::error::AppError;
use job_board::outcome::Outcome;
use job_board::store::EntityStore;
use job_board::workflows::users::UserAccount;
use job_board::workflows::vacancy::applications::ApplicationRequest;
use job_board::workflows::vacancy::{NewVacancy, Vacancy, VacancyStatus};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Hours an applicant must wait between applications.
    #[arg(long, default_value_t = 24)]
    pub(crate) rate_limit_hours: u64,
    /// Days to fast-forward before running the expiry sweep.
    #[arg(long, default_value_t = 3)]
    pub(crate) advance_days: i64,
    /// Print the sweep report as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        rate_limit_hours,
        advance_days,
        json,
    } = args;

    let policy = PolicyConfig {
        rate_limit_hours,
        ..PolicyConfig::default()
    };
    let clock = ManualClock::new(Utc::now());
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let services = Services::in_memory(&policy, shared);

    println!("Job board demo");
    let employer = services
        .users
        .add(UserAccount::employer("Priya", "Raman"))
        .into_result()?;
    let applicant = services
        .users
        .add(UserAccount::applicant("Diego", "Salas"))
        .into_result()?;
    let late_applicant = services
        .users
        .add(UserAccount::applicant("Mei", "Tanaka"))
        .into_result()?;
    println!(
        "- Employer {} | applicants {}, {}",
        employer.display_name(),
        applicant.display_name(),
        late_applicant.display_name()
    );

    let backend = open_vacancy(&services, &employer, "Backend Engineer", 2, Duration::days(14))?;
    let internship = open_vacancy(&services, &employer, "Summer Intern", 1, Duration::days(1))?;

    println!("\nApplications");
    let application = services
        .applications
        .apply_to_vacancy(ApplicationRequest {
            vacancy_id: backend.id,
            applicant_id: applicant.id,
        })
        .into_result()?;
    println!(
        "- {} applied to {} -> {}",
        application.applicant_name, backend.title, application.status
    );

    clock.advance(Duration::hours(1));
    let retry = ApplicationRequest {
        vacancy_id: internship.id,
        applicant_id: applicant.id,
    };
    match services.applications.apply_to_vacancy(retry) {
        Outcome::Success(application) => println!(
            "- {} also applied to {} -> {}",
            application.applicant_name, internship.title, application.status
        ),
        Outcome::Failure(failure) => println!(
            "- {} refused for {} one hour later: {}",
            applicant.display_name(),
            internship.title,
            failure
        ),
    }

    let today = services
        .applications
        .count_applications_today(&applicant.id)
        .into_result()?;
    println!("- {} applications today: {}", applicant.display_name(), today);

    println!("\nLifecycle");
    let closed = services.lifecycle.deactivate(&backend.id).into_result()?;
    println!("- {} deactivated -> {}", closed.title, closed.status);
    let admission = services
        .applications
        .assess(&backend.id, &late_applicant.id)
        .into_result()?;
    println!(
        "- {} checking {}: {}",
        late_applicant.display_name(),
        closed.title,
        admission.summary()
    );

    println!("\nExpiry sweep after {advance_days} day(s)");
    clock.advance(Duration::days(advance_days));
    let expired = services.lifecycle.expired_vacancies().into_result()?;
    println!("- {} vacancies past expiry", expired.len());
    let report = services.lifecycle.sweep_expired().into_result()?;
    println!("- {}", report.summary());
    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(payload) => println!("{payload}"),
            Err(err) => println!("  Sweep report unavailable: {err}"),
        }
    }
    let rerun = services.lifecycle.sweep_expired().into_result()?;
    println!("- second run: {}", rerun.summary());

    Ok(())
}

fn open_vacancy(
    services: &Services,
    employer: &UserAccount,
    title: &str,
    max_applications: u32,
    open_for: Duration,
) -> Result<Vacancy, AppError> {
    let draft = services
        .vacancies
        .create_vacancy(NewVacancy {
            title: title.to_string(),
            description: format!("{title} at a growing payments company"),
            employer_id: employer.id,
            max_applications,
            expiry_date: Utc::now() + open_for,
            status: Some(VacancyStatus::Draft),
        })
        .into_result()?;
    let posted = services.lifecycle.post(&draft.id).into_result()?;
    println!(
        "- Posted {} ({} slots, expires {})",
        posted.title,
        posted.max_applications,
        posted.expiry_date.format("%Y-%m-%d")
    );
    Ok(posted)
}

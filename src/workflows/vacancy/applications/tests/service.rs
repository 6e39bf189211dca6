use std::sync::Arc;
use std::thread;

use chrono::Duration;

use super::common::*;
use crate::clock::{Clock, ManualClock};
use crate::outcome::{Failure, FailureKind, Outcome};
use crate::store::EntityStore;
use crate::workflows::users::{InMemoryUserStore, UserAccount};
use crate::workflows::vacancy::applications::domain::{
    Application, ApplicationId, ApplicationRequest, ApplicationStatus,
};
use crate::workflows::vacancy::applications::repository::InMemoryApplicationRepository;
use crate::workflows::vacancy::applications::{ApplicationService, EligibilityPolicy};
use crate::workflows::vacancy::domain::{VacancyId, VacancyStatus, VacancyUpdate};
use crate::workflows::vacancy::{AdmissionLocks, VacancyService};

fn request(vacancy_id: VacancyId, applicant: &UserAccount) -> ApplicationRequest {
    ApplicationRequest {
        vacancy_id,
        applicant_id: applicant.id,
    }
}

#[test]
fn apply_records_pending_application_and_bumps_counter() {
    let fixture = fixture();
    let target = fixture.seed(vacancy(VacancyStatus::Active, 3));

    let application = fixture
        .service
        .apply_to_vacancy(request(target.id, &fixture.applicant))
        .into_value();

    assert_eq!(application.status, ApplicationStatus::Pending);
    assert_eq!(application.application_date, opening_time());
    assert_eq!(application.applicant_name, "Amina Haddad");
    assert_eq!(
        fixture.vacancies.get_by_id(&target.id).into_value().current_applications,
        1
    );
    assert_eq!(
        fixture.service.get_application(&application.id),
        Outcome::success(application)
    );
}

#[test]
fn second_apply_within_a_day_is_refused_as_not_found() {
    let fixture = fixture();
    let first = fixture.seed(vacancy(VacancyStatus::Active, 3));
    let second = fixture.seed(vacancy(VacancyStatus::Active, 3));

    fixture
        .service
        .apply_to_vacancy(request(first.id, &fixture.applicant))
        .into_value();
    fixture.clock.advance(Duration::hours(1));

    match fixture
        .service
        .apply_to_vacancy(request(second.id, &fixture.applicant))
    {
        Outcome::Failure(Failure::NotFound { message }) => {
            assert!(message.starts_with("cannot apply to vacancy"));
        }
        other => panic!("expected refusal, got {other:?}"),
    }
    assert_eq!(
        fixture.vacancies.get_by_id(&second.id).into_value().current_applications,
        0
    );
}

#[test]
fn inactive_vacancy_refuses_applications() {
    let fixture = fixture();
    let closed = fixture.seed(vacancy(VacancyStatus::Inactive, 3));

    assert_eq!(
        fixture
            .service
            .apply_to_vacancy(request(closed.id, &fixture.applicant))
            .kind(),
        Some(FailureKind::NotFound)
    );
    assert!(fixture.applications.is_empty());
}

#[test]
fn failed_counter_update_rolls_back_the_application() {
    let vacancies = Arc::new(FlakyVacancies::default());
    let fixture = fixture_with(vacancies.clone(), EligibilityPolicy::default());
    let target = fixture.seed(vacancy(VacancyStatus::Active, 3));
    vacancies.fail_updates();

    let outcome = fixture
        .service
        .apply_to_vacancy(request(target.id, &fixture.applicant));

    assert_eq!(outcome.kind(), Some(FailureKind::Error));
    assert!(fixture.applications.is_empty());
    assert_eq!(
        fixture.service.can_apply(&target.id, &fixture.applicant.id),
        Outcome::success(true)
    );
}

#[test]
fn listings_for_applicant_and_vacancy() {
    let fixture = fixture();
    let target = fixture.seed(vacancy(VacancyStatus::Active, 3));

    assert_eq!(
        fixture.service.applications_by_applicant(&fixture.applicant.id),
        Outcome::success(Vec::new())
    );
    assert_eq!(
        fixture.service.applicants_for_vacancy(&VacancyId::new()).kind(),
        Some(FailureKind::NotFound)
    );

    let application = fixture
        .service
        .apply_to_vacancy(request(target.id, &fixture.applicant))
        .into_value();

    assert_eq!(
        fixture.service.applications_by_applicant(&fixture.applicant.id),
        Outcome::success(vec![application.clone()])
    );
    assert_eq!(
        fixture.service.applicants_for_vacancy(&target.id),
        Outcome::success(vec![application])
    );
}

#[test]
fn missing_application_is_not_found() {
    let fixture = fixture();
    assert_eq!(
        fixture.service.get_application(&ApplicationId::new()).kind(),
        Some(FailureKind::NotFound)
    );
}

#[test]
fn counts_only_applications_from_the_current_day() {
    let fixture = fixture();
    let target = fixture.seed(vacancy(VacancyStatus::Active, 10));
    for offset in [Duration::hours(-1), Duration::hours(-8), Duration::hours(-30)] {
        fixture
            .applications
            .add(Application::pending(
                target.id,
                fixture.applicant.id,
                fixture.applicant.display_name(),
                opening_time() + offset,
            ))
            .into_value();
    }

    assert_eq!(
        fixture.service.count_applications_today(&fixture.applicant.id),
        Outcome::success(2)
    );
}

#[test]
fn concurrent_applies_by_one_applicant_admit_exactly_one() {
    let fixture = fixture();
    let targets: Vec<_> = (0..8)
        .map(|_| fixture.seed(vacancy(VacancyStatus::Active, 5)))
        .collect();

    let admitted = thread::scope(|scope| {
        let handles: Vec<_> = targets
            .iter()
            .map(|target| {
                let service = &fixture.service;
                let applicant = &fixture.applicant;
                scope.spawn(move || service.apply_to_vacancy(request(target.id, applicant)))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("apply thread finished"))
            .filter(Outcome::is_success)
            .count()
    });

    assert_eq!(admitted, 1);
    assert_eq!(fixture.applications.len(), 1);
}

#[test]
fn concurrent_applies_never_overrun_capacity() {
    let fixture = fixture();
    let target = fixture.seed(vacancy(VacancyStatus::Active, 3));
    let applicants: Vec<_> = (0..10).map(|_| fixture.second_applicant()).collect();

    let admitted = thread::scope(|scope| {
        let handles: Vec<_> = applicants
            .iter()
            .map(|applicant| {
                let service = &fixture.service;
                scope.spawn(move || service.apply_to_vacancy(request(target.id, applicant)))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("apply thread finished"))
            .filter(Outcome::is_success)
            .count()
    });

    assert_eq!(admitted, 3);
    let stored = fixture.vacancies.get_by_id(&target.id).into_value();
    assert_eq!(stored.current_applications, 3);
    assert_eq!(fixture.service.applicants_for_vacancy(&target.id).into_value().len(), 3);
}

#[test]
fn edit_racing_an_admission_keeps_the_counter_bump() {
    let store = Arc::new(GatedVacancies::new());
    let target = store.add(vacancy(VacancyStatus::Active, 3)).into_value();
    let applicant = applicant();
    let users = Arc::new(InMemoryUserStore::with_rows([applicant.clone()]));
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(opening_time()));
    let locks = Arc::new(AdmissionLocks::new());
    let editor = VacancyService::new(store.clone()).with_locks(locks.clone());
    let service = ApplicationService::new(
        store.clone(),
        Arc::new(InMemoryApplicationRepository::new()),
        users,
        clock,
        EligibilityPolicy::default(),
    )
    .with_locks(locks);
    let update = VacancyUpdate {
        title: "Senior Payments Platform Engineer".to_string(),
        description: target.description.clone(),
        max_applications: target.max_applications,
        expiry_date: target.expiry_date,
    };

    store.pause_next_read();
    thread::scope(|scope| {
        let edit = scope.spawn(|| editor.update_vacancy(&target.id, update));
        store.wait_until_paused();
        let apply = scope.spawn(|| service.apply_to_vacancy(request(target.id, &applicant)));
        thread::sleep(std::time::Duration::from_millis(20));
        store.resume();

        assert!(edit.join().expect("edit finished").is_success());
        assert!(apply.join().expect("apply finished").is_success());
    });

    let stored = store.get_by_id(&target.id).into_value();
    assert_eq!(stored.title, "Senior Payments Platform Engineer");
    assert_eq!(stored.current_applications, 1);
}

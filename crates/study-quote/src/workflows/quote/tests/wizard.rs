use super::common::*;
use crate::workflows::quote::calculator::PricingCalculator;
use crate::workflows::quote::domain::{AccommodationType, Contact, Money, SelectionIssue};
use crate::workflows::quote::wizard::{
    start_date_window, DurationPreset, QuoteWizard, StartDatePreset, StepInput, StepRejection,
    WizardEnv, WizardStep,
};

fn through_accommodation(env: &WizardEnv<'_>) -> QuoteWizard {
    QuoteWizard::start()
        .next(StepInput::Duration { weeks: 12 }, env)
        .expect("duration accepted")
        .next(
            StepInput::StartDate {
                start_date: early_start(),
            },
            env,
        )
        .expect("start date accepted")
        .next(
            StepInput::Accommodation {
                accommodation_type: AccommodationType::Homestay,
                options: options(&[]),
            },
            env,
        )
        .expect("accommodation accepted")
}

#[test]
fn walks_every_step_and_lands_on_the_result() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };

    let wizard = through_accommodation(&env);
    assert_eq!(wizard.step(), WizardStep::Contact);
    assert!(wizard.result().is_none());

    let finished = wizard
        .next(StepInput::Contact(contact()), &env)
        .expect("contact accepted");
    assert!(finished.is_complete());
    assert_eq!(finished.selection().contact, Some(contact()));
    let result = finished.result().expect("result computed");
    assert_eq!(result.total(), Money(1_529_500));
}

#[test]
fn transitions_leave_the_receiver_untouched() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };

    let start = QuoteWizard::start();
    let advanced = start
        .next(StepInput::Duration { weeks: 4 }, &env)
        .expect("duration accepted");

    assert_eq!(start, QuoteWizard::start());
    assert_eq!(advanced.step(), WizardStep::StartDate);
    assert_eq!(advanced.selection().weeks, Some(4));
}

#[test]
fn contact_can_be_skipped_and_clears_earlier_input() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };

    let with_contact = through_accommodation(&env)
        .next(StepInput::Contact(contact()), &env)
        .expect("contact accepted")
        .back()
        .expect("back to contact");
    assert_eq!(with_contact.step(), WizardStep::Contact);
    assert_eq!(with_contact.draft(), Some(StepInput::Contact(contact())));

    let skipped = with_contact.skip(&env).expect("contact skipped");
    assert!(skipped.is_complete());
    assert!(skipped.selection().contact.is_none());
    assert!(skipped.result().is_some());
}

#[test]
fn only_the_contact_step_is_skippable() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };

    assert_eq!(
        QuoteWizard::start().skip(&env),
        Err(StepRejection::SkipNotAllowed(WizardStep::Duration))
    );
}

#[test]
fn back_from_result_discards_the_result_and_recomputes_on_return() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };

    let finished = through_accommodation(&env)
        .skip(&env)
        .expect("contact skipped");
    let back = finished.back().expect("back allowed");
    assert_eq!(back.step(), WizardStep::Contact);
    assert!(back.result().is_none());

    let back = back
        .back()
        .and_then(|wizard| wizard.back())
        .expect("back to start date");
    assert_eq!(back.step(), WizardStep::StartDate);
    let later = back
        .next(
            StepInput::StartDate {
                start_date: late_start(),
            },
            &env,
        )
        .expect("start date accepted");
    assert_eq!(
        later.draft(),
        Some(StepInput::Accommodation {
            accommodation_type: AccommodationType::Homestay,
            options: options(&[]),
        })
    );

    let recomputed = later
        .next(later.draft().expect("draft kept"), &env)
        .and_then(|wizard| wizard.skip(&env))
        .expect("finishes again");
    let result = recomputed.result().expect("result recomputed");
    assert_eq!(result.discounts(), Money::ZERO);
    assert_eq!(result.total(), Money(1_610_000));
}

#[test]
fn back_from_the_first_step_is_rejected() {
    assert_eq!(QuoteWizard::start().back(), Err(StepRejection::AtFirstStep));
}

#[test]
fn invalid_step_input_is_rejected_without_advancing() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };
    let start = QuoteWizard::start();

    assert_eq!(
        start.next(StepInput::Duration { weeks: 0 }, &env),
        Err(StepRejection::Invalid(SelectionIssue::WeeksOutOfRange(0)))
    );
    assert!(!start.can_advance(&StepInput::Duration { weeks: 53 }, &env));
    assert!(start.can_advance(&StepInput::Duration { weeks: 52 }, &env));

    assert_eq!(
        start.next(
            StepInput::StartDate {
                start_date: early_start()
            },
            &env
        ),
        Err(StepRejection::WrongStep {
            current: WizardStep::Duration,
            received: WizardStep::StartDate,
        })
    );
}

#[test]
fn start_date_must_fall_inside_the_booking_window() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };
    let (earliest, latest) = start_date_window(today());
    assert_eq!(earliest, date(2027, 1, 11));
    assert_eq!(latest, date(2028, 1, 10));

    let at_start_date = QuoteWizard::start()
        .next(StepInput::Duration { weeks: 4 }, &env)
        .expect("duration accepted");

    assert_eq!(
        at_start_date.next(StepInput::StartDate { start_date: today() }, &env),
        Err(StepRejection::Invalid(SelectionIssue::StartDateTooEarly {
            earliest
        }))
    );
    assert_eq!(
        at_start_date.next(
            StepInput::StartDate {
                start_date: date(2028, 1, 11)
            },
            &env
        ),
        Err(StepRejection::Invalid(SelectionIssue::StartDateTooLate { latest }))
    );
    assert!(at_start_date.can_advance(&StepInput::StartDate { start_date: latest }, &env));
}

#[test]
fn unknown_options_and_bad_email_are_rejected() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };

    let at_accommodation = QuoteWizard::start()
        .next(StepInput::Duration { weeks: 4 }, &env)
        .and_then(|wizard| {
            wizard.next(
                StepInput::StartDate {
                    start_date: early_start(),
                },
                &env,
            )
        })
        .expect("reaches accommodation");
    assert!(!at_accommodation.can_advance(
        &StepInput::Accommodation {
            accommodation_type: AccommodationType::Dormitory,
            options: options(&["health_cover"]),
        },
        &env
    ));

    let at_contact = through_accommodation(&env);
    let missing = Contact {
        email: "  ".to_string(),
        ..Contact::default()
    };
    assert_eq!(
        at_contact.next(StepInput::Contact(missing), &env),
        Err(StepRejection::Invalid(SelectionIssue::MissingEmail))
    );
    let malformed = Contact {
        email: "hana.sato@".to_string(),
        ..Contact::default()
    };
    assert!(matches!(
        at_contact.next(StepInput::Contact(malformed), &env),
        Err(StepRejection::Invalid(SelectionIssue::MalformedEmail(_)))
    ));
}

#[test]
fn finished_wizard_refuses_input_until_started_over() {
    let catalog = maple_leaf();
    let calculator = PricingCalculator::default();
    let env = WizardEnv {
        catalog: &catalog,
        calculator: &calculator,
        today: today(),
    };

    let finished = through_accommodation(&env).skip(&env).expect("finished");
    assert_eq!(
        finished.next(StepInput::Duration { weeks: 4 }, &env),
        Err(StepRejection::Finished)
    );

    let fresh = finished.start_over();
    assert_eq!(fresh, QuoteWizard::start());
    assert_eq!(fresh.step().number(), 1);
}

#[test]
fn presets_resolve_to_weeks_and_dates() {
    let weeks: Vec<u32> = DurationPreset::all()
        .into_iter()
        .map(DurationPreset::weeks)
        .collect();
    assert_eq!(weeks, vec![4, 13, 26, 52]);

    let dates: Vec<_> = StartDatePreset::all()
        .into_iter()
        .filter_map(|preset| preset.resolve(today()))
        .collect();
    assert_eq!(
        dates,
        vec![
            date(2027, 2, 10),
            date(2027, 3, 10),
            date(2027, 4, 10),
            date(2027, 7, 10)
        ]
    );
}

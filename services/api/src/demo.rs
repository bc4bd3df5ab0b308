use crate::infra::{load_catalogs, option_set, InMemoryQuoteStore};
use chrono::NaiveDate;
use clap::Args;
use std::sync::Arc;
use study_quote::config::AppConfig;
use study_quote::error::AppError;
use study_quote::workflows::quote::{
    format_money, AccommodationType, CalculationResult, CatalogDirectory, Contact, DisplayModel,
    DurationPreset, EstimateRequest, Locale, OptionPricing, QuoteService, QuoteSubmission,
    QuoteWizard, SaveOutcome, SchoolId, StartDatePreset, StepInput, MAPLE_LEAF_ID,
};

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// School identifier, as listed by the `catalog` command
    #[arg(long)]
    pub(crate) school: String,
    /// Program length in weeks (1-52)
    #[arg(long)]
    pub(crate) weeks: u32,
    /// homestay, dormitory, apartment or none
    #[arg(long, value_parser = crate::infra::parse_accommodation)]
    pub(crate) accommodation: AccommodationType,
    /// Add-on option key; repeat for several
    #[arg(long = "option")]
    pub(crate) options: Vec<String>,
    /// Program start date (YYYY-MM-DD). Early booking needs one.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start_date: Option<NaiveDate>,
    /// Override the pricing date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Display locale (en or ja); defaults to QUOTE_LOCALE
    #[arg(long, value_parser = parse_locale)]
    pub(crate) locale: Option<Locale>,
    /// Print the raw calculation result as JSON as well
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// School to quote (defaults to the built-in Vancouver program)
    #[arg(long)]
    pub(crate) school: Option<String>,
    /// Override the pricing date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the optional contact step
    #[arg(long)]
    pub(crate) skip_contact: bool,
    /// Display locale (en or ja); defaults to QUOTE_LOCALE
    #[arg(long, value_parser = parse_locale)]
    pub(crate) locale: Option<Locale>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogArgs {
    /// Print catalogs as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

fn parse_locale(raw: &str) -> Result<Locale, String> {
    Locale::parse(raw).ok_or_else(|| format!("unknown locale '{raw}' (en or ja)"))
}

fn build_service(
    config: &AppConfig,
    catalogs: CatalogDirectory,
    locale: Option<Locale>,
) -> QuoteService<InMemoryQuoteStore> {
    let mut display = config.quote.display();
    if let Some(locale) = locale {
        display.locale = locale;
    }
    QuoteService::new(
        catalogs,
        config.quote.discount.clone(),
        Arc::new(InMemoryQuoteStore::default()),
        display,
    )
    .with_clock(config.quote.clock())
}

pub(crate) fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let catalogs = load_catalogs(&config.quote)?;
    let service = build_service(&config, catalogs, args.locale);
    let today = args.today.unwrap_or_else(|| service.today());

    let request = EstimateRequest {
        school_id: SchoolId::new(args.school),
        weeks: args.weeks,
        accommodation_type: args.accommodation,
        options: option_set(&args.options),
        start_date: args.start_date,
    };
    let estimate = service.estimate(&request, today)?;

    let catalog = service.catalog(&request.school_id)?;
    println!("Estimate for {} (as of {today})", catalog.school_name);
    render_display(&estimate.display);

    if args.json {
        match serde_json::to_string_pretty(&estimate.result) {
            Ok(json) => println!("\n{json}"),
            Err(err) => println!("\nResult payload unavailable: {err}"),
        }
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        school,
        today,
        skip_contact,
        locale,
    } = args;

    let config = AppConfig::load()?;
    let catalogs = load_catalogs(&config.quote)?;
    let service = build_service(&config, catalogs, locale);
    let today = today.unwrap_or_else(|| service.today());
    let school = SchoolId::new(school.unwrap_or_else(|| MAPLE_LEAF_ID.to_string()));
    let env = service.wizard_env(&school, today)?;

    println!("Quote wizard demo: {} (as of {today})", env.catalog.school_name);

    let duration = DurationPreset::ThreeMonths;
    let start_preset = StartDatePreset::InSixMonths;
    let Some(start_date) = start_preset.resolve(today) else {
        println!("  Start date preset is out of range for {today}");
        return Ok(());
    };
    let options = env
        .catalog
        .options
        .iter()
        .find(|option| matches!(option.pricing, OptionPricing::Flat(_)))
        .map(|option| vec![option.key.clone()])
        .unwrap_or_default();

    let inputs = [
        StepInput::Duration {
            weeks: duration.weeks(),
        },
        StepInput::StartDate { start_date },
        StepInput::Accommodation {
            accommodation_type: AccommodationType::Homestay,
            options: options.into_iter().collect(),
        },
    ];

    let mut wizard = QuoteWizard::start();
    for input in inputs {
        let step = wizard.step();
        wizard = match wizard.next(input, &env) {
            Ok(next) => next,
            Err(rejection) => {
                println!("  Step {} rejected: {rejection}", step.number());
                return Ok(());
            }
        };
        println!("- Step {} ({}) complete", step.number(), step.label());
    }

    let finished = if skip_contact {
        println!("- Step 4 (contact) skipped");
        wizard.skip(&env)
    } else {
        let contact = Contact {
            email: "demo.student@example.com".to_string(),
            name: Some("Demo Student".to_string()),
            phone: None,
        };
        println!("- Step 4 (contact) complete");
        wizard.next(StepInput::Contact(contact), &env)
    };
    let wizard = match finished {
        Ok(wizard) => wizard,
        Err(rejection) => {
            println!("  Quote could not be completed: {rejection}");
            return Ok(());
        }
    };
    let Some(result) = wizard.result() else {
        println!("  Wizard finished without a result");
        return Ok(());
    };

    println!();
    render_display(&service.present(result, wizard.selection()));
    render_component_check(result);

    let mut submission = QuoteSubmission::new();
    match service
        .save(&mut submission, result, wizard.selection(), today)
        .await
    {
        SaveOutcome::Saved {
            quote_id,
            valid_until,
        } => println!("\nSaved quote {quote_id} (valid until {valid_until})"),
        SaveOutcome::Failed { notice, error } => println!("\n{notice} ({error})"),
        SaveOutcome::AlreadySaved { quote_id } => println!("\nAlready saved as {quote_id}"),
        SaveOutcome::InFlight => println!("\nSave already in progress"),
    }

    if let SaveOutcome::AlreadySaved { quote_id } = service
        .save(&mut submission, result, wizard.selection(), today)
        .await
    {
        println!("Repeat submit answered locally with {quote_id}");
    }

    Ok(())
}

pub(crate) fn run_catalog(args: CatalogArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let catalogs = load_catalogs(&config.quote)?;

    if args.json {
        let all: Vec<_> = catalogs.catalogs().collect();
        match serde_json::to_string_pretty(&all) {
            Ok(json) => println!("{json}"),
            Err(err) => println!("Catalog payload unavailable: {err}"),
        }
        return Ok(());
    }

    println!("{} program(s) loaded", catalogs.len());
    for catalog in catalogs.catalogs() {
        let money = |amount| format_money(amount, catalog.currency);
        println!(
            "\n{} [{}] ({}, 1 {} = {} {})",
            catalog.school_name,
            catalog.school_id,
            catalog.currency,
            catalog.currency,
            catalog.exchange_rate.normalize(),
            config.quote.home_currency
        );
        println!("  Tuition: {} / week", money(catalog.base_price_per_week));
        for accommodation in AccommodationType::ordered() {
            if accommodation == AccommodationType::None {
                continue;
            }
            println!(
                "  {}: {} / week",
                accommodation.label(),
                money(catalog.accommodation.weekly_rate(accommodation))
            );
        }
        for (name, amount) in catalog.fixed_fees.entries() {
            println!("  {name}: {}", money(amount));
        }
        for option in &catalog.options {
            let price = match option.pricing {
                OptionPricing::Flat(amount) => money(amount),
                OptionPricing::PerWeek(rate) => format!("{} / week", money(rate)),
            };
            println!("  + {} [{}]: {price}", option.name, option.key);
        }
    }

    Ok(())
}

fn render_display(display: &DisplayModel) {
    println!("{} | {}", display.weeks_label, display.accommodation);
    if let Some(start_date) = &display.start_date {
        println!("Start date: {start_date}");
    }
    for category in &display.categories {
        println!("{}: {}", category.label, category.subtotal);
        for item in &category.items {
            match &item.detail {
                Some(detail) => println!("  - {}: {} ({detail})", item.name, item.amount),
                None => println!("  - {}: {}", item.name, item.amount),
            }
        }
    }
    println!("Subtotal: {}", display.subtotal);
    for discount in &display.discounts {
        println!("{}: {}", discount.name, discount.amount);
        if let Some(notes) = &discount.detail {
            println!("  ({notes})");
        }
    }
    println!("Total: {}", display.total);
    if let Some(home) = &display.home_currency_total {
        match &display.exchange_note {
            Some(note) => println!("  {home} at {note}"),
            None => println!("  {home}"),
        }
    }
}

fn render_component_check(result: &CalculationResult) {
    let components = result.tuition() + result.accommodation() + result.fees() + result.options();
    println!(
        "\nComponents {} - discounts {} = {}",
        format_money(components, result.currency()),
        format_money(result.discounts(), result.currency()),
        format_money(result.total(), result.currency())
    );
}

use crate::infra::load_catalog;
use clap::{Args, ValueEnum};
use housing_lookup::catalog::{CatalogKind, CatalogSource, HttpCatalogClient};
use housing_lookup::config::AppConfig;
use housing_lookup::error::AppError;
use housing_lookup::lookup::{
    Candidate, CandidateId, CandidateSource, LookupController, LookupOptions, ScopeFilter,
    ViewState,
};
use housing_lookup::telemetry;
use housing_lookup::workflows::{property_submission_wizard, PropertyKind, RoomDraft};
use std::sync::Arc;
use std::time::Duration;

const CITY_FIRST_HINT: &str = "Select a city first";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum LookupKind {
    City,
    Institution,
}

impl From<LookupKind> for CatalogKind {
    fn from(kind: LookupKind) -> Self {
        match kind {
            LookupKind::City => CatalogKind::City,
            LookupKind::Institution => CatalogKind::Institution,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct LookupArgs {
    /// Which catalog collection the field searches
    #[arg(long, value_enum, default_value_t = LookupKind::City)]
    pub(crate) kind: LookupKind,
    /// City id scoping an institution lookup
    #[arg(long)]
    pub(crate) city_id: Option<u32>,
    /// Catalog service base URL (defaults to CATALOG_API_URL)
    #[arg(long)]
    pub(crate) api_url: Option<String>,
    /// Delay between replayed keystrokes
    #[arg(long, default_value_t = 100)]
    pub(crate) interval_ms: u64,
    /// Commit the candidate with this id once results settle
    #[arg(long)]
    pub(crate) select: Option<String>,
    /// Print view states as JSON
    #[arg(long)]
    pub(crate) json: bool,
    /// Successive field values, e.g. `Bog Bogo Bogot`
    #[arg(required = true)]
    pub(crate) keystrokes: Vec<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Text typed into the city field
    #[arg(long, default_value = "medel")]
    pub(crate) city: String,
    /// Text typed into the nearest-institution field
    #[arg(long, default_value = "univ")]
    pub(crate) institution: String,
    /// Delay between simulated keystrokes
    #[arg(long, default_value_t = 80)]
    pub(crate) interval_ms: u64,
    /// Print view states as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run_lookup(args: LookupArgs) -> Result<(), AppError> {
    let LookupArgs {
        kind,
        city_id,
        api_url,
        interval_ms,
        select,
        json,
        keystrokes,
    } = args;

    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;
    if let Some(url) = api_url {
        config.catalog.api_url = url;
    }

    let client = HttpCatalogClient::from_config(&config.catalog)?;
    println!("Catalog: {}", client.base_url());

    let mut field = LookupController::new(
        Arc::new(client.source(kind.into())),
        field_options(&config, kind),
    );
    if let Some(city_id) = city_id {
        field.set_scope(Some(ScopeFilter(city_id.to_string())));
    }

    let interval = Duration::from_millis(interval_ms);
    for text in &keystrokes {
        field.on_input(text);
        print_view(&format!("typed {text:?}"), &field.view(), json);
        tokio::time::sleep(interval).await;
    }

    field.settled().await;
    print_view("settled", &field.view(), json);

    if let Some(id) = select {
        let picked = field.select(&CandidateId(id))?;
        print_view("selected", &field.view(), json);
        tracing::debug!(id = %picked.id, "lookup selection committed");
    }

    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        city,
        institution,
        interval_ms,
        json,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;
    let store = Arc::new(load_catalog(&config.catalog)?);
    let interval = Duration::from_millis(interval_ms);

    println!("Listing submission demo");
    let mut wizard = property_submission_wizard();
    wizard.draft_mut().title = "Habitación amoblada para estudiantes".to_string();
    wizard.draft_mut().kind = Some(PropertyKind::Room);
    let next = wizard.advance()?;
    println!("Basics complete, now on step '{next}'");

    let mut city_field = LookupController::new(
        Arc::new(CatalogSource::new(Arc::clone(&store), CatalogKind::City)),
        field_options(&config, LookupKind::City),
    );
    let mut institution_field = LookupController::new(
        Arc::new(CatalogSource::new(Arc::clone(&store), CatalogKind::Institution)),
        field_options(&config, LookupKind::Institution),
    );

    println!("\nNearest institution field before a city is chosen");
    print_view("initial", &institution_field.view(), json);

    println!("\nCity field");
    let Some(city_pick) = type_and_pick(&mut city_field, &city, interval, json).await? else {
        println!("No city matched {city:?}; nothing left to demo.");
        return Ok(());
    };
    institution_field.set_scope(Some(ScopeFilter::from(&city_pick.id)));
    wizard.draft_mut().set_city(city_pick);

    println!("\nNearest institution field");
    let Some(institution_pick) =
        type_and_pick(&mut institution_field, &institution, interval, json).await?
    else {
        println!("No institution matched {institution:?}; nothing left to demo.");
        return Ok(());
    };
    wizard.draft_mut().set_nearest_institution(institution_pick);
    wizard.draft_mut().address = "Calle 10 #43-12".to_string();

    match wizard.advance() {
        Ok(step) => println!("\nLocation complete, now on step '{step}'"),
        Err(err) => {
            println!("\nLocation step rejected: {err}");
            for field_error in err.field_errors() {
                println!("  - {}: {}", field_error.field, field_error.message);
            }
            return Ok(());
        }
    }

    let draft = wizard.draft_mut();
    draft.monthly_rent = Some(950_000);
    draft.deposit = Some(950_000);
    draft.rooms.push(RoomDraft::new("Habitación principal", 1));

    let submitted = wizard.submit()?;
    println!("\nSubmitted draft:");
    match serde_json::to_string_pretty(submitted) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => println!("(unable to render draft: {err})"),
    }

    city_field.dispose();
    institution_field.dispose();
    Ok(())
}

fn field_options(config: &AppConfig, kind: LookupKind) -> LookupOptions {
    let options = LookupOptions::from_config(&config.lookup);
    match kind {
        LookupKind::City => options,
        LookupKind::Institution => options.scoped(CITY_FIRST_HINT),
    }
}

/// Type `text` one character at a time, wait for results, and commit the first suggestion.
async fn type_and_pick<S>(
    field: &mut LookupController<S>,
    text: &str,
    interval: Duration,
    json: bool,
) -> Result<Option<Candidate>, AppError>
where
    S: CandidateSource + ?Sized + 'static,
{
    for (offset, ch) in text.char_indices() {
        let typed = &text[..offset + ch.len_utf8()];
        field.on_input(typed);
        print_view(&format!("typed {typed:?}"), &field.view(), json);
        tokio::time::sleep(interval).await;
    }

    let snapshot = field.settled().await;
    print_view("settled", &field.view(), json);

    let Some(first) = snapshot.results.first() else {
        return Ok(None);
    };
    let picked = field.select(&first.id)?;
    print_view("selected", &field.view(), json);
    Ok(Some(picked))
}

fn print_view(step: &str, view: &ViewState, json: bool) {
    if json {
        match serde_json::to_string(view) {
            Ok(rendered) => println!("{step}: {rendered}"),
            Err(err) => println!("{step}: (unable to render view: {err})"),
        }
        return;
    }

    println!("{step}: {}", describe_view(view));
    if let ViewState::Populated { entries } = view {
        for entry in entries {
            match &entry.secondary {
                Some(secondary) => println!("    [{}] {} ({secondary})", entry.id, entry.primary),
                None => println!("    [{}] {}", entry.id, entry.primary),
            }
        }
    }
}

fn describe_view(view: &ViewState) -> String {
    match view {
        ViewState::Idle { hint: Some(hint) } => format!("idle ({hint})"),
        ViewState::Idle { hint: None } => "idle".to_string(),
        ViewState::Loading => "loading".to_string(),
        ViewState::Empty { message } | ViewState::Failed { message } => {
            format!("{} ({message})", view.label())
        }
        ViewState::Populated { entries } => format!("{} suggestion(s)", entries.len()),
        ViewState::Selected { candidate } => {
            format!("selected {} [{}]", candidate.name, candidate.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use housing_lookup::lookup::ResultEntry;

    #[test]
    fn lookup_kind_maps_to_catalog_kind() {
        assert_eq!(CatalogKind::from(LookupKind::City), CatalogKind::City);
        assert_eq!(
            CatalogKind::from(LookupKind::Institution),
            CatalogKind::Institution
        );
    }

    #[test]
    fn describes_each_view_state() {
        assert_eq!(
            describe_view(&ViewState::Idle {
                hint: Some(CITY_FIRST_HINT.to_string())
            }),
            "idle (Select a city first)"
        );
        assert_eq!(
            describe_view(&ViewState::Failed {
                message: "try again".to_string()
            }),
            "failed (try again)"
        );
        assert_eq!(
            describe_view(&ViewState::Populated {
                entries: vec![ResultEntry {
                    id: CandidateId::from(5001u32),
                    primary: "Medellín".to_string(),
                    secondary: Some("Antioquia".to_string()),
                }]
            }),
            "1 suggestion(s)"
        );
        assert_eq!(
            describe_view(&ViewState::Selected {
                candidate: Candidate::new(42u32, "Medellín")
            }),
            "selected Medellín [42]"
        );
    }

    #[tokio::test]
    async fn demo_walks_the_builtin_catalog() {
        let args = DemoArgs {
            city: "medel".to_string(),
            institution: "eafit".to_string(),
            interval_ms: 1,
            json: true,
        };
        run_demo(args).await.expect("demo completes");
    }
}

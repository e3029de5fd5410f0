use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::lookup::domain::{Candidate, LookupQuery};
use crate::lookup::source::{CandidateSource, SourceError};

pub(super) fn bogota() -> Candidate {
    Candidate::new(11001u32, "Bogotá").with_parent("Bogotá D.C.")
}

pub(super) fn bogota_alt() -> Candidate {
    Candidate::new(11002u32, "Bogotá D.C. alt").with_parent("Cundinamarca")
}

pub(super) fn medellin() -> Candidate {
    Candidate::new(42u32, "Medellín").with_parent("Antioquia")
}

#[derive(Clone)]
struct Scripted {
    delay: Duration,
    outcome: Result<Vec<Candidate>, SourceError>,
}

/// Source answering per query text after a scripted delay; unknown queries resolve to `[]`.
#[derive(Default)]
pub(super) struct ScriptedSource {
    scripts: HashMap<String, Scripted>,
    calls: Mutex<Vec<LookupQuery>>,
}

impl ScriptedSource {
    pub(super) fn respond(mut self, text: &str, delay_ms: u64, results: Vec<Candidate>) -> Self {
        self.scripts.insert(
            text.to_string(),
            Scripted {
                delay: Duration::from_millis(delay_ms),
                outcome: Ok(results),
            },
        );
        self
    }

    pub(super) fn fail(mut self, text: &str, delay_ms: u64, error: SourceError) -> Self {
        self.scripts.insert(
            text.to_string(),
            Scripted {
                delay: Duration::from_millis(delay_ms),
                outcome: Err(error),
            },
        );
        self
    }

    pub(super) fn calls(&self) -> Vec<LookupQuery> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }

    pub(super) fn call_texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|query| query.text).collect()
    }
}

#[async_trait]
impl CandidateSource for ScriptedSource {
    async fn search(&self, query: &LookupQuery) -> Result<Vec<Candidate>, SourceError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(query.clone());

        let scripted = self.scripts.get(&query.text).cloned().unwrap_or(Scripted {
            delay: Duration::ZERO,
            outcome: Ok(Vec::new()),
        });

        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.outcome
    }
}

pub(super) async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

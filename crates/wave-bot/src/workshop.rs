// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};
use wave_config::Config;

use crate::responder::call_with_timeout;
use crate::{
    explanation_fallback, mutation_fallback, validation_fallback, HttpResponder, KeyValueStore, Responder,
    ResponderRequest, StoreError, MUTATION_TEMPLATE_COUNT,
};

/// Store key holding the idea the user typed.
pub const IDEA_TEXT_KEY: &str = "ideaText";
/// Store key holding the mutation chosen for building.
pub const MUTATED_IDEA_KEY: &str = "mutatedIdea";

/// The idea-mutation flow: enhance an idea, rethink the mutation, explain
/// it, validate it, and hand the result on through the store.
///
/// Every step asks the responder first and falls back to local templates,
/// so each one always produces text.
pub struct IdeaWorkshop {
    responder: Option<Arc<dyn Responder>>,
    store: Arc<dyn KeyValueStore>,
    timeout: Duration,
    rng: Mutex<StdRng>,
    idea: String,
    mutated: Option<String>,
}

impl IdeaWorkshop {
    /// Offline workshop: every step uses the local templates.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            responder: None,
            store,
            timeout: Duration::from_secs(10),
            rng: Mutex::new(StdRng::from_entropy()),
            idea: String::new(),
            mutated: None,
        }
    }

    /// Workshop backed by the configured HTTP backend, when enabled.
    pub fn from_config(config: &Config, store: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let mut workshop = Self::new(store).with_timeout(Duration::from_secs(config.responder.timeout_secs));
        if config.responder.enabled {
            workshop = workshop.with_responder(Arc::new(HttpResponder::from_config(&config.responder)?));
        }
        if let Some(seed) = config.bot.seed {
            workshop = workshop.seeded(seed);
        }
        Ok(workshop)
    }

    pub fn with_responder(mut self, responder: Arc<dyn Responder>) -> Self {
        self.responder = Some(responder);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn seeded(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn set_idea(&mut self, idea: impl Into<String>) {
        self.idea = idea.into();
        self.mutated = None;
    }

    /// Current mutation, if one was produced.
    pub fn mutated(&self) -> Option<&str> {
        self.mutated.as_deref()
    }

    /// Load the stored idea text.  Returns it, or `None` when nothing was
    /// stored.
    pub fn load_idea(&mut self) -> Result<Option<String>, StoreError> {
        let stored = self.store.get(IDEA_TEXT_KEY)?;
        if let Some(idea) = &stored {
            self.set_idea(idea.clone());
        }
        Ok(stored)
    }

    /// Load the mutation saved by [`build`](Self::build) as the current one.
    pub fn load_mutation(&mut self) -> Result<Option<String>, StoreError> {
        let stored = self.store.get(MUTATED_IDEA_KEY)?.filter(|m| !m.trim().is_empty());
        if stored.is_some() {
            self.mutated = stored.clone();
        }
        Ok(stored)
    }

    async fn ask(&self, request: ResponderRequest) -> Option<String> {
        let responder = self.responder.as_deref()?;
        call_with_timeout(responder, request, self.timeout).await
    }

    fn random_template(&self, avoid: Option<&str>) -> String {
        let start = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .gen_range(0..MUTATION_TEMPLATE_COUNT);
        (0..MUTATION_TEMPLATE_COUNT)
            .map(|offset| mutation_fallback(&self.idea, start + offset))
            .find(|text| Some(text.as_str()) != avoid)
            .unwrap_or_else(|| mutation_fallback(&self.idea, start))
    }

    /// AI-enhanced mutation of the idea.
    pub async fn enhance(&mut self) -> String {
        let request = ResponderRequest::EnhanceIdea { idea: self.idea.trim().to_string() };
        let text = match self.ask(request).await {
            Some(text) => text,
            None => {
                info!("enhance falling back to local template");
                self.random_template(None)
            }
        };
        self.mutated = Some(text.clone());
        text
    }

    /// A mutation different from the current one.
    pub async fn rethink(&mut self) -> String {
        let request = ResponderRequest::RethinkIdea {
            idea: self.idea.trim().to_string(),
            current: self.mutated.clone(),
        };
        let text = match self.ask(request).await {
            Some(text) if Some(text.as_str()) != self.mutated.as_deref() => text,
            _ => {
                info!("rethink falling back to local template");
                self.random_template(self.mutated.as_deref())
            }
        };
        self.mutated = Some(text.clone());
        text
    }

    /// Why the current mutation differs from the idea.
    pub async fn explain(&self) -> String {
        let mutated = self.mutated.clone().unwrap_or_default();
        let request = ResponderRequest::ExplainMutation {
            original: self.idea.trim().to_string(),
            mutated: mutated.clone(),
        };
        match self.ask(request).await {
            Some(text) => text,
            None => explanation_fallback(&self.idea, &mutated),
        }
    }

    /// Viability report for the idea.
    pub async fn validate(&self) -> String {
        let request = ResponderRequest::ValidateIdea { idea: self.idea.trim().to_string() };
        match self.ask(request).await {
            Some(text) => text,
            None => validation_fallback(&self.idea),
        }
    }

    /// Persist the mutation and the original idea for the build step.  The
    /// idea itself stands in when nothing was mutated yet.
    pub fn build(&self) -> Result<String, StoreError> {
        let mutated = self.mutated.clone().unwrap_or_else(|| self.idea.clone());
        self.store.set(MUTATED_IDEA_KEY, &mutated)?;
        self.store.set(IDEA_TEXT_KEY, &self.idea)?;
        debug!(chars = mutated.chars().count(), "mutation saved for build");
        Ok(mutated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FailingResponder, ScriptedResponder, StalledResponder};
    use crate::MemoryStore;

    fn store_with_idea(idea: &str) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.set(IDEA_TEXT_KEY, idea).unwrap();
        store
    }

    fn templates(idea: &str) -> Vec<String> {
        (0..MUTATION_TEMPLATE_COUNT).map(|i| mutation_fallback(idea, i)).collect()
    }

    #[tokio::test]
    async fn load_idea_reads_store() {
        let mut w = IdeaWorkshop::new(store_with_idea("dog bakery"));
        assert_eq!(w.load_idea().unwrap().as_deref(), Some("dog bakery"));
        assert_eq!(w.idea(), "dog bakery");

        let mut empty = IdeaWorkshop::new(Arc::new(MemoryStore::new()));
        assert_eq!(empty.load_idea().unwrap(), None);
        assert_eq!(empty.idea(), "");
    }

    #[tokio::test]
    async fn enhance_uses_backend_text() {
        let scripted = Arc::new(ScriptedResponder::once("Dog bakery with AI"));
        let mut w = IdeaWorkshop::new(store_with_idea("dog bakery")).with_responder(scripted.clone());
        w.load_idea().unwrap();
        assert_eq!(w.enhance().await, "Dog bakery with AI");
        assert_eq!(w.mutated(), Some("Dog bakery with AI"));
        assert_eq!(
            scripted.requests(),
            vec![ResponderRequest::EnhanceIdea { idea: "dog bakery".into() }]
        );
    }

    #[tokio::test]
    async fn failing_backend_yields_mutation_template() {
        let mut w = IdeaWorkshop::new(store_with_idea("dog bakery"))
            .with_responder(Arc::new(FailingResponder::default()))
            .seeded(5);
        w.load_idea().unwrap();
        let text = w.enhance().await;
        assert!(templates("dog bakery").contains(&text), "{text}");
    }

    #[tokio::test]
    async fn stalled_backend_times_out_to_template() {
        let mut w = IdeaWorkshop::new(store_with_idea("dog bakery"))
            .with_responder(Arc::new(StalledResponder))
            .with_timeout(Duration::from_millis(20));
        w.load_idea().unwrap();
        assert!(templates("dog bakery").contains(&w.enhance().await));
    }

    #[tokio::test]
    async fn rethink_never_repeats_current() {
        let mut w = IdeaWorkshop::new(store_with_idea("x")).seeded(11);
        w.load_idea().unwrap();
        let mut previous = w.enhance().await;
        for _ in 0..10 {
            let next = w.rethink().await;
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[tokio::test]
    async fn rethink_echo_from_backend_falls_back() {
        let scripted = Arc::new(ScriptedResponder::new(vec![Ok("same".into()), Ok("same".into())]));
        let mut w = IdeaWorkshop::new(store_with_idea("x")).with_responder(scripted.clone());
        w.load_idea().unwrap();
        assert_eq!(w.enhance().await, "same");
        let next = w.rethink().await;
        assert!(templates("x").contains(&next));
        assert!(matches!(
            &scripted.requests()[1],
            ResponderRequest::RethinkIdea { current: Some(c), .. } if c == "same"
        ));
    }

    #[tokio::test]
    async fn saved_mutation_resumes() {
        let store = store_with_idea("x");
        store.set(MUTATED_IDEA_KEY, "x, but better").unwrap();
        let mut w = IdeaWorkshop::new(store);
        w.load_idea().unwrap();
        assert_eq!(w.load_mutation().unwrap().as_deref(), Some("x, but better"));
        assert_eq!(w.mutated(), Some("x, but better"));
        assert_ne!(w.rethink().await, "x, but better");
    }

    #[tokio::test]
    async fn explain_and_validate_fall_back() {
        let mut w = IdeaWorkshop::new(Arc::new(MemoryStore::new()));
        w.set_idea("drone bakery");
        let explanation = w.explain().await;
        assert!(explanation.starts_with("Mutation Explanation"));
        assert!(w.validate().await.contains("drone bakery"));
    }

    #[tokio::test]
    async fn build_saves_both_keys() {
        let store = store_with_idea("x");
        let mut w = IdeaWorkshop::new(store.clone()).with_responder(Arc::new(ScriptedResponder::once("better x")));
        w.load_idea().unwrap();
        w.enhance().await;
        assert_eq!(w.build().unwrap(), "better x");
        assert_eq!(store.get(MUTATED_IDEA_KEY).unwrap().as_deref(), Some("better x"));
        assert_eq!(store.get(IDEA_TEXT_KEY).unwrap().as_deref(), Some("x"));
    }
}

use std::path::Path;
use std::sync::Arc;

use orator_config::EnginesConfig;

use crate::{CommandEngine, EngineChoice, EngineKind, ScratchEnv, SpeechEngine, SpeechRate};

/// The engines this server may dispatch to, in `auto` priority order
#[derive(Clone, Default)]
pub struct EngineSet {
    engines: Vec<Arc<dyn SpeechEngine>>,
}

impl EngineSet {
    /// Build a set from explicit engines, ordered by [`EngineKind::PRIORITY`]
    pub fn new(mut engines: Vec<Arc<dyn SpeechEngine>>) -> Self {
        engines.sort_by_key(|engine| engine.kind());
        Self { engines }
    }

    /// Build the command engines enabled in configuration
    pub fn from_config(config: &EnginesConfig, install_dir: &Path, scratch: &ScratchEnv) -> Self {
        let rate = SpeechRate::from_config(&config.rate);

        let mut engines: Vec<Arc<dyn SpeechEngine>> = Vec::new();

        if config.say.enabled {
            engines.push(Arc::new(
                CommandEngine::say(&config.say).with_rate(rate).with_scratch_env(scratch),
            ));
        }
        if config.swift.enabled {
            engines.push(Arc::new(
                CommandEngine::swift(&config.swift, install_dir)
                    .with_rate(rate)
                    .with_scratch_env(scratch),
            ));
        }
        if config.espeak.enabled {
            engines.push(Arc::new(
                CommandEngine::espeak(&config.espeak)
                    .with_rate(rate)
                    .with_scratch_env(scratch),
            ));
        }

        Self::new(engines)
    }

    /// Resolve a client choice to a usable engine
    ///
    /// `auto` picks the first available engine; an explicit choice is only
    /// returned when that engine is available.
    pub fn resolve(&self, choice: EngineChoice) -> Option<Arc<dyn SpeechEngine>> {
        match choice.kind() {
            None => self.engines.iter().find(|engine| engine.is_available()).cloned(),
            Some(kind) => self.get(kind).filter(|engine| engine.is_available()),
        }
    }

    /// Engine of the given kind, whether or not it is available
    pub fn get(&self, kind: EngineKind) -> Option<Arc<dyn SpeechEngine>> {
        self.engines.iter().find(|engine| engine.kind() == kind).cloned()
    }

    /// Kinds that can be started right now, in priority order
    pub fn list_available(&self) -> Vec<EngineKind> {
        self.engines
            .iter()
            .filter(|engine| engine.is_available())
            .map(|engine| engine.kind())
            .collect()
    }

    /// Every known kind with its availability; disabled engines report `false`
    pub fn describe(&self) -> Vec<(EngineKind, bool)> {
        EngineKind::PRIORITY
            .iter()
            .map(|&kind| (kind, self.get(kind).is_some_and(|engine| engine.is_available())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl std::fmt::Debug for EngineSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.engines.iter().map(|engine| engine.kind()))
            .finish()
    }
}

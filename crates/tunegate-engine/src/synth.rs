//! Synthesizer seam and the mode-keyed model cache.

use std::fmt;

use tracing::info;
use tunegate_spec::{AudioBuffer, GenerationParameters, Mode};

use crate::error::SynthError;

/// Produces audio for a prompt.
///
/// Calls are treated as atomic. Implementations may fail transiently; the
/// controller records the failure and moves on to the next attempt.
pub trait Synthesizer {
    /// Renders `duration_seconds` of audio.
    fn synthesize(
        &mut self,
        prompt: &str,
        parameters: &GenerationParameters,
        duration_seconds: u32,
    ) -> Result<AudioBuffer, SynthError>;
}

impl<S: Synthesizer + ?Sized> Synthesizer for &mut S {
    fn synthesize(
        &mut self,
        prompt: &str,
        parameters: &GenerationParameters,
        duration_seconds: u32,
    ) -> Result<AudioBuffer, SynthError> {
        (**self).synthesize(prompt, parameters, duration_seconds)
    }
}

impl<S: Synthesizer + ?Sized> Synthesizer for Box<S> {
    fn synthesize(
        &mut self,
        prompt: &str,
        parameters: &GenerationParameters,
        duration_seconds: u32,
    ) -> Result<AudioBuffer, SynthError> {
        (**self).synthesize(prompt, parameters, duration_seconds)
    }
}

/// Adapts a closure into a [`Synthesizer`].
pub struct FnSynthesizer<F> {
    render: F,
}

impl<F> FnSynthesizer<F>
where
    F: FnMut(&str, &GenerationParameters, u32) -> Result<AudioBuffer, SynthError>,
{
    /// Wraps `render`.
    pub fn new(render: F) -> Self {
        Self { render }
    }
}

impl<F> Synthesizer for FnSynthesizer<F>
where
    F: FnMut(&str, &GenerationParameters, u32) -> Result<AudioBuffer, SynthError>,
{
    fn synthesize(
        &mut self,
        prompt: &str,
        parameters: &GenerationParameters,
        duration_seconds: u32,
    ) -> Result<AudioBuffer, SynthError> {
        (self.render)(prompt, parameters, duration_seconds)
    }
}

/// Size of the generative model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelVariant {
    /// Lighter model used for classical material.
    Small,
    /// Larger model used for everything else.
    Large,
}

impl ModelVariant {
    /// Variant loaded for `mode`.
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Classical => ModelVariant::Small,
            Mode::Cinematic => ModelVariant::Large,
        }
    }

    /// Short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Small => "small",
            ModelVariant::Large => "large",
        }
    }

    /// Pretrained checkpoint identifier.
    pub fn model_id(&self) -> &'static str {
        match self {
            ModelVariant::Small => "facebook/musicgen-small",
            ModelVariant::Large => "facebook/musicgen-large",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loads a model for a variant.
pub trait ModelLoader {
    /// The loaded model.
    type Model: Synthesizer;

    /// Loads `variant`. Called only when the cache has to swap.
    fn load(&mut self, variant: ModelVariant) -> Result<Self::Model, SynthError>;
}

/// Holds at most one loaded model, keyed by [`ModelVariant`].
///
/// The cache is an ordinary value owned by the caller. Asking for the
/// variant already loaded is free; asking for the other one drops the
/// current model before loading the new one.
pub struct ModelCache<L: ModelLoader> {
    loader: L,
    loaded: Option<(ModelVariant, L::Model)>,
    loads: u32,
}

impl<L: ModelLoader> ModelCache<L> {
    /// Creates an empty cache.
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            loaded: None,
            loads: 0,
        }
    }

    /// Variant currently loaded.
    pub fn loaded_variant(&self) -> Option<ModelVariant> {
        self.loaded.as_ref().map(|(variant, _)| *variant)
    }

    /// Number of loads performed so far.
    pub fn load_count(&self) -> u32 {
        self.loads
    }

    /// Returns the model for `mode`, loading it if needed.
    pub fn model_for(&mut self, mode: Mode) -> Result<&mut L::Model, SynthError> {
        let variant = ModelVariant::for_mode(mode);
        let cached = matches!(&self.loaded, Some((loaded, _)) if *loaded == variant);
        if !cached {
            if let Some((previous, _)) = self.loaded.take() {
                info!(from = %previous, to = %variant, "swapping model");
            } else {
                info!(variant = %variant, model = variant.model_id(), "loading model");
            }
            let model = self.loader.load(variant)?;
            self.loads += 1;
            self.loaded = Some((variant, model));
        }
        match self.loaded.as_mut() {
            Some((_, model)) => Ok(model),
            None => Err(SynthError::ModelLoad {
                variant: variant.to_string(),
                message: "model missing after load".to_string(),
            }),
        }
    }

    /// Borrows the cache as a synthesizer bound to `mode`.
    pub fn synthesizer(&mut self, mode: Mode) -> CachedSynthesizer<'_, L> {
        CachedSynthesizer { cache: self, mode }
    }
}

/// A [`ModelCache`] viewed as a [`Synthesizer`] for one mode.
///
/// The model is resolved on every call, so a load failure surfaces as a
/// failed attempt rather than aborting the job.
pub struct CachedSynthesizer<'a, L: ModelLoader> {
    cache: &'a mut ModelCache<L>,
    mode: Mode,
}

impl<L: ModelLoader> Synthesizer for CachedSynthesizer<'_, L> {
    fn synthesize(
        &mut self,
        prompt: &str,
        parameters: &GenerationParameters,
        duration_seconds: u32,
    ) -> Result<AudioBuffer, SynthError> {
        self.cache
            .model_for(self.mode)?
            .synthesize(prompt, parameters, duration_seconds)
    }
}

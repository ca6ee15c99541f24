use std::collections::HashMap;
use std::sync::Arc;

use nafanya_common::models::ProviderKind;
use nafanya_common::traits::telemetry_traits::ErrorReporter;
use nafanya_common::Error;
use tracing::{debug, error};

use crate::provider::{ImageProvider, TextProvider};

/// A provider that either was configured at start-up or was not.
#[derive(Clone)]
pub enum ProviderSlot {
    Present(Arc<dyn TextProvider>),
    Absent,
}

impl ProviderSlot {
    pub fn from_option(provider: Option<Arc<dyn TextProvider>>) -> Self {
        match provider {
            Some(p) => ProviderSlot::Present(p),
            None => ProviderSlot::Absent,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ProviderSlot::Present(_))
    }
}

/// Dispatches a compiled prompt to exactly one provider, selected by name.
pub struct ResponseRouter {
    providers: HashMap<ProviderKind, ProviderSlot>,
    image_provider: Option<Arc<dyn ImageProvider>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ResponseRouter {
    /// Every provider kind starts out absent.
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        let providers = ProviderKind::ALL
            .iter()
            .map(|k| (*k, ProviderSlot::Absent))
            .collect();
        Self {
            providers,
            image_provider: None,
            reporter,
        }
    }

    pub fn with_provider(mut self, kind: ProviderKind, slot: ProviderSlot) -> Self {
        self.providers.insert(kind, slot);
        self
    }

    pub fn with_image_provider(mut self, provider: Option<Arc<dyn ImageProvider>>) -> Self {
        self.image_provider = provider;
        self
    }

    /// Kinds with a configured adapter.
    pub fn available(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .iter()
            .copied()
            .filter(|k| self.providers.get(k).is_some_and(ProviderSlot::is_present))
            .collect()
    }

    fn resolve(&self, provider_name: &str) -> Result<Arc<dyn TextProvider>, Error> {
        let kind: ProviderKind = provider_name.parse()?;
        match self.providers.get(&kind) {
            Some(ProviderSlot::Present(p)) => Ok(p.clone()),
            _ => Err(Error::ModelNotAvailable(kind.to_string())),
        }
    }

    /// Single round trip, never retried. Failures are logged and reported
    /// before being handed back to the caller.
    pub async fn get_response(
        &self,
        prompt: &str,
        user_input: &str,
        provider_name: &str,
        max_tokens: u32,
    ) -> Result<String, Error> {
        let result = match self.resolve(provider_name) {
            Ok(provider) => {
                debug!("routing prompt to provider '{}'", provider.name());
                provider
                    .generate_text(prompt, user_input, max_tokens)
                    .await
                    .map_err(Error::from)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            error!("ResponseRouter: provider '{}' failed: {}", provider_name, e);
            self.reporter.capture_error(e);
        }
        result
    }

    pub async fn get_image_from_prompt(&self, prompt: &str) -> Result<String, Error> {
        let result = match &self.image_provider {
            Some(provider) => provider.generate_image(prompt).await.map_err(Error::from),
            None => Err(Error::ModelNotAvailable("image".to_string())),
        };

        if let Err(e) = &result {
            error!("ResponseRouter: image generation failed: {}", e);
            self.reporter.capture_error(e);
        }
        result
    }
}

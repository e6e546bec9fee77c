//! Protocol source adapters. Each adapter turns one upstream API (or a
//! fixed set of calls against it) into a typed `SourcePayload`.

pub mod aave;
pub mod beefy;
pub mod defillama;
pub mod euler;
pub mod llama;
pub mod yieldyak;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::domain::model::{Source, SourcePayload};
use crate::infrastructure::http::HttpApi;
use crate::shared::errors::FetchError;

/// One upstream source. `fetch` either returns the full typed payload or a
/// descriptive error; it never substitutes defaults for a whole dataset.
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    fn source(&self) -> Source;
    async fn fetch(&self) -> Result<SourcePayload, FetchError>;
}

/// Build the enabled adapters in fixed `Source::ALL` order.
pub fn build_adapters(config: &Config, http: Arc<dyn HttpApi>) -> Vec<Box<dyn ProtocolAdapter>> {
    let mut adapters: Vec<Box<dyn ProtocolAdapter>> = Vec::new();

    if config.sources.aave {
        adapters.push(Box::new(aave::AaveAdapter::new(config, Arc::clone(&http))));
    }
    if config.sources.beefy {
        adapters.push(Box::new(beefy::BeefyAdapter::new(config, Arc::clone(&http))));
    }
    if config.sources.euler {
        adapters.push(Box::new(euler::EulerAdapter::new(config, Arc::clone(&http))));
    }
    if config.sources.defillama {
        adapters.push(Box::new(defillama::DefiLlamaAdapter::new(
            config,
            Arc::clone(&http),
        )));
    }
    if config.sources.yieldyak {
        adapters.push(Box::new(yieldyak::YieldYakAdapter::new(config, http)));
    }

    adapters
}

#[cfg(test)]
pub(crate) mod tests_support {
    use async_trait::async_trait;
    use serde_json::Value;

    use crate::infrastructure::http::HttpApi;
    use crate::shared::errors::FetchError;

    /// Canned-response `HttpApi` for adapter tests. Routes match on a URL
    /// substring; unmatched URLs fail as transport errors.
    pub struct StaticApi {
        routes: Vec<(String, Result<Value, u16>)>,
    }

    impl StaticApi {
        pub fn new() -> Self {
            Self { routes: Vec::new() }
        }

        /// Single response served for every URL.
        pub fn ok(value: Value) -> Self {
            Self {
                routes: vec![(String::new(), Ok(value))],
            }
        }

        pub fn route(mut self, url_part: &str, value: Value) -> Self {
            self.routes.push((url_part.to_string(), Ok(value)));
            self
        }

        pub fn fail(mut self, url_part: &str, status: u16) -> Self {
            self.routes.push((url_part.to_string(), Err(status)));
            self
        }
    }

    #[async_trait]
    impl HttpApi for StaticApi {
        async fn get_json(&self, call: &str, url: &str) -> Result<Value, FetchError> {
            for (part, outcome) in &self.routes {
                if url.contains(part.as_str()) {
                    return match outcome {
                        Ok(value) => Ok(value.clone()),
                        Err(status) => Err(FetchError::ApiStatus {
                            call: call.to_string(),
                            status: *status,
                        }),
                    };
                }
            }
            Err(FetchError::Transport {
                call: call.to_string(),
                reason: format!("no canned response for {url}"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    struct NeverApi;

    #[async_trait]
    impl HttpApi for NeverApi {
        async fn get_json(&self, call: &str, _url: &str) -> Result<Value, FetchError> {
            Err(FetchError::Transport {
                call: call.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[test]
    fn test_build_adapters_respects_toggles_and_order() {
        let mut config = Config::default();
        config.sources.euler = false;

        let adapters = build_adapters(&config, Arc::new(NeverApi));
        let sources: Vec<Source> = adapters.iter().map(|a| a.source()).collect();
        assert_eq!(
            sources,
            vec![Source::Aave, Source::Beefy, Source::DefiLlama, Source::YieldYak]
        );
    }
}
